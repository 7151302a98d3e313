use std::sync::Arc;
use tempfile::TempDir;
use uptime::engine::{DowntimeDistribution, DowntimePlan, RunState};
use uptime::error::UptimeError;
use uptime::machine::MachineKind;
use uptime::storage::{MemoryStore, Snapshot};
use uptime::window::RangeDescriptor;
use uptime::{tags, MachineAnalytics, Sample, TimeRange, UptimeConfig};

// 2021-03-01T00:00:00Z, a Monday
const MONDAY: i64 = 1_614_556_800;

async fn analytics_with(samples: Vec<Sample>) -> MachineAnalytics<MemoryStore> {
    let store = MemoryStore::new();
    store.insert_batch(samples).await;
    MachineAnalytics::new(Arc::new(store), UptimeConfig::default())
}

#[tokio::test]
async fn test_downtime_against_snapshot_plans() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.json");

    let snapshot = Snapshot {
        samples: vec![
            Sample::run_state(5, MONDAY, true),
            Sample::run_state(5, MONDAY + 8 * 3600, false),
            Sample::run_state(5, MONDAY + 12 * 3600, true),
        ],
        downtime_plans: vec![DowntimePlan {
            machine_id: 5,
            date_from: "2021-03-01".to_string(),
            time_from: "09:00".to_string(),
            date_to: "2021-03-01".to_string(),
            time_to: "10:30".to_string(),
        }],
    };
    snapshot.save(&path).await.unwrap();

    let config = UptimeConfig::default();
    let store = Snapshot::load(&path).await.unwrap().into_store(&config.clock()).await;
    let analytics = MachineAnalytics::new(Arc::new(store), config);

    let window = TimeRange::new(MONDAY, MONDAY + 24 * 3600);
    let downtime = analytics.downtime_distribution(5, window).await.unwrap();

    assert_eq!(downtime, DowntimeDistribution { planned: 5400, unplanned: 4 * 3600 - 5400, idle: 0 });
    assert_eq!(serde_json::to_value(downtime).unwrap(), serde_json::json!([5400, 9000, 0]));
}

#[tokio::test]
async fn test_intervals_partition_window() {
    let analytics = analytics_with(vec![
        Sample::run_state(1, 100, false),
        Sample::run_state(1, 900, true),
        Sample::run_state(1, 1700, false),
        Sample::run_state(1, 2500, true),
    ])
    .await;

    for window in [TimeRange::new(0, 3000), TimeRange::new(500, 2000), TimeRange::new(1000, 1100)] {
        let intervals = analytics.run_intervals(1, window).await.unwrap();
        assert_eq!(intervals.first().unwrap().start, window.from);
        assert_eq!(intervals.last().unwrap().end, window.to);
        assert!(intervals.windows(2).all(|pair| pair[0].end == pair[1].start));
        assert_eq!(intervals.iter().map(|i| i.duration()).sum::<i64>(), window.duration());
    }

    // window between samples, state carried from the sample at 900
    let inner = analytics.run_intervals(1, TimeRange::new(1000, 1100)).await.unwrap();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].state, RunState::Running);
}

#[tokio::test]
async fn test_chart_series_over_resolved_window() {
    let now = MONDAY + 3600;
    let samples: Vec<Sample> = (0..60)
        .map(|i| Sample::new(2, 2, tags::ENERGY_CONSUMPTION, MONDAY + i * 60, vec![i as f64, 0.0]))
        .collect();
    let analytics = analytics_with(samples).await;

    let window = analytics.resolve_window(&RangeDescriptor::relative("lastHour"), now).unwrap();
    assert_eq!(window, TimeRange::new(MONDAY, now));

    let points = analytics.chart_series(2, tags::ENERGY_CONSUMPTION, 0, window).await.unwrap();
    // 60 samples over 12 buckets: width 6, ten buckets
    assert_eq!(points.len(), 10);
    assert_eq!(points[0], (MONDAY * 1000, 2)); // mean of 0..=5 is 2.5
    assert_eq!(points[1].0, (MONDAY + 300) * 1000);

    let missing_field = analytics.chart_series(2, tags::ENERGY_CONSUMPTION, 3, window).await;
    assert!(matches!(missing_field, Err(UptimeError::MalformedSample { .. })));
}

#[tokio::test]
async fn test_unknown_range_is_rejected() {
    let analytics = analytics_with(Vec::new()).await;
    let result = analytics.resolve_window(&RangeDescriptor::relative("lastDecade"), MONDAY);
    assert!(matches!(result, Err(UptimeError::UnknownRange(_))));
}

#[tokio::test]
async fn test_weekly_hours_end_at_now() {
    let analytics = analytics_with(vec![
        Sample::run_state(3, MONDAY + 22 * 3600, true),
        Sample::run_state(3, MONDAY + 23 * 3600, false),
    ])
    .await;

    // Monday 22:00 to Wednesday 02:00
    let hours = analytics.weekly_running_hours(3, MONDAY + 50 * 3600).await.unwrap();
    assert_eq!(hours, [2, 24, 2, 0, 0, 0, 0]);
}

#[tokio::test]
async fn test_batch_blender_overview() {
    let analytics = analytics_with(vec![
        Sample::new(1, 4, tags::WEIGHT_TARGETS, 10, vec![100.0, 200.0]),
        Sample::new(1, 4, tags::WEIGHT_TARGETS, 20, vec![110.0, 210.0]),
        Sample::new(1, 4, tags::WEIGHT_ACTUALS, 20, vec![109.5, 211.0]),
        Sample::run_state(4, 0, true),
        Sample::run_state(4, 3 * 3600, false),
        Sample::run_state(4, 4 * 3600, true),
    ])
    .await;

    let overview = analytics.overview(4, MachineKind::BatchBlender).await.unwrap();
    assert_eq!(overview.latest["targets"], vec![110.0, 210.0]);
    assert_eq!(overview.latest["actuals"], vec![109.5, 211.0]);
    assert!((overview.ratios["total_running_percentage"] - 0.75).abs() < 1e-9);
    assert!(overview.series.is_empty());
}

#[tokio::test]
async fn test_hopper_overview_bins_each_tag() {
    let mut samples = Vec::new();
    for i in 0..30 {
        for tag_id in [
            tags::ENERGY_CONSUMPTION,
            tags::HOPPER_INVENTORY,
            tags::HAULOFF_LENGTH,
            tags::ACTUAL_POINTS,
            tags::SET_POINTS,
        ] {
            samples.push(Sample::new(1, 6, tag_id, i * 60, vec![tag_id as f64]));
        }
    }
    let analytics = analytics_with(samples).await;

    let overview = analytics.overview(6, MachineKind::GravimetricHopper).await.unwrap();
    assert_eq!(overview.series.len(), 5);
    // 30 samples, width 3
    assert_eq!(overview.series["hopper_inventories"], vec![tags::HOPPER_INVENTORY as i64; 10]);

    let empty = analytics.overview(99, MachineKind::ContinuousBlender).await.unwrap();
    assert!(empty.series["energy_consumption"].is_empty());
}
