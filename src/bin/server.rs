use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uptime::{
    analytics::{MachineOverview, MachineSummary},
    engine::DowntimeDistribution,
    error::UptimeError,
    machine::MachineKind,
    storage::{MemoryStore, Snapshot},
    window::{resolve_time_window_now, RangeDescriptor},
    MachineAnalytics, TimeRange, UptimeConfig,
};

type AppState = Arc<MachineAnalytics<MemoryStore>>;
type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug, Deserialize)]
struct WindowParams {
    from: Option<i64>,
    to: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OverviewParams {
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesRequest {
    tag_id: u32,
    #[serde(default)]
    field_index: usize,
    range: RangeDescriptor,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    samples: usize,
    machines: usize,
}

#[derive(Debug, Serialize)]
struct WeeklyHoursResponse {
    hours: [u64; 7],
}

#[derive(Debug, Serialize)]
struct UtilizationResponse {
    utilization: f64,
}

#[derive(Debug, Serialize)]
struct SeriesResponse {
    window: TimeRange,
    points: Vec<(i64, i64)>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting uptime analytics server");

    let config = UptimeConfig::from_env();
    info!("Bind address: {}", config.bind_address);
    info!("Bucket count: {}", config.bucket_count);
    info!("Clock offset: {} minutes", config.utc_offset_minutes);

    let store = match &config.snapshot_path {
        Some(path) => Snapshot::load(path).await?.into_store(&config.clock()).await,
        None => {
            warn!("SNAPSHOT_PATH not set, serving an empty store");
            MemoryStore::new()
        }
    };

    let bind_address = config.bind_address.clone();
    let app_state: AppState = Arc::new(MachineAnalytics::new(Arc::new(store), config));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/machines/:id/downtime", get(downtime_distribution))
        .route("/machines/:id/weekly-hours", get(weekly_running_hours))
        .route("/machines/:id/utilization", get(utilization))
        .route("/machines/:id/summary", get(machine_summary))
        .route("/machines/:id/overview", get(machine_overview))
        .route("/machines/:id/series", post(chart_series))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn error_response(context: &str, e: UptimeError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if matches!(e, UptimeError::MalformedSample { .. }) {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("{} failed: {}", context, e);
    } else {
        warn!("{} rejected: {}", context, e);
    }

    (status, Json(ErrorResponse { error: e.to_string() }))
}

fn window_from_params(state: &AppState, params: &WindowParams) -> Result<TimeRange, UptimeError> {
    let default = state.default_downtime_window(now());
    TimeRange::checked(params.from.unwrap_or(default.from), params.to.unwrap_or(default.to))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store();
    Json(HealthResponse {
        status: "healthy".to_string(),
        samples: store.sample_count().await,
        machines: store.machine_ids().await.len(),
    })
}

async fn downtime_distribution(
    Path(machine_id): Path<u64>,
    Query(params): Query<WindowParams>,
    State(state): State<AppState>,
) -> ApiResult<DowntimeDistribution> {
    let window = window_from_params(&state, &params).map_err(|e| error_response("Downtime query", e))?;

    state
        .downtime_distribution(machine_id, window)
        .await
        .map(Json)
        .map_err(|e| error_response("Downtime query", e))
}

async fn weekly_running_hours(
    Path(machine_id): Path<u64>,
    State(state): State<AppState>,
) -> ApiResult<WeeklyHoursResponse> {
    state
        .weekly_running_hours(machine_id, now())
        .await
        .map(|hours| Json(WeeklyHoursResponse { hours }))
        .map_err(|e| error_response("Weekly hours query", e))
}

async fn utilization(
    Path(machine_id): Path<u64>,
    State(state): State<AppState>,
) -> ApiResult<UtilizationResponse> {
    state
        .lifetime_running_hours(machine_id)
        .await
        .map(|hours| Json(UtilizationResponse { utilization: hours.ratio() }))
        .map_err(|e| error_response("Utilization query", e))
}

async fn machine_summary(
    Path(machine_id): Path<u64>,
    Query(params): Query<WindowParams>,
    State(state): State<AppState>,
) -> ApiResult<MachineSummary> {
    let window = window_from_params(&state, &params).map_err(|e| error_response("Summary query", e))?;

    state
        .summary(machine_id, window)
        .await
        .map(Json)
        .map_err(|e| error_response("Summary query", e))
}

async fn machine_overview(
    Path(machine_id): Path<u64>,
    Query(params): Query<OverviewParams>,
    State(state): State<AppState>,
) -> ApiResult<MachineOverview> {
    let kind = match params.kind.as_deref() {
        Some(kind) => kind.parse::<MachineKind>().map_err(|e| error_response("Overview query", e))?,
        None => MachineKind::Generic,
    };

    state
        .overview(machine_id, kind)
        .await
        .map(Json)
        .map_err(|e| error_response("Overview query", e))
}

async fn chart_series(
    Path(machine_id): Path<u64>,
    State(state): State<AppState>,
    Json(request): Json<SeriesRequest>,
) -> ApiResult<SeriesResponse> {
    let window = resolve_time_window_now(&request.range, &state.config().clock())
        .map_err(|e| error_response("Series query", e))?;

    state
        .chart_series(machine_id, request.tag_id, request.field_index, window)
        .await
        .map(|points| Json(SeriesResponse { window, points }))
        .map_err(|e| error_response("Series query", e))
}
