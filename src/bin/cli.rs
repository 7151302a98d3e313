use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use uptime::engine::{DowntimePlan, DowntimeWindow};
use uptime::machine::MachineKind;
use uptime::storage::{MemoryStore, Snapshot};
use uptime::window::RangeDescriptor;
use uptime::{tags, MachineAnalytics, Sample, UptimeConfig};

const MACHINES: [(u64, MachineKind); 3] = [
    (1, MachineKind::BatchBlender),
    (2, MachineKind::ContinuousBlender),
    (3, MachineKind::GravimetricHopper),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Uptime - Machine Telemetry Analytics");
    println!("====================================");

    let config = UptimeConfig::from_env();
    let now = Utc::now().timestamp();

    println!("Generating two weeks of synthetic telemetry...");
    let snapshot = generate_snapshot(now);
    println!(
        "Generated {} samples and {} downtime plans",
        snapshot.samples.len(),
        snapshot.downtime_plans.len()
    );

    // uptime-cli <path> also writes the snapshot for the server
    if let Some(path) = std::env::args().nth(1) {
        snapshot.save(&path).await?;
        println!("Snapshot written to {}", path);
    }

    let store = Arc::new(snapshot.into_store(&config.clock()).await);
    // a plan entered directly as a window, overlapping the generated one
    store.add_downtime_window(DowntimeWindow::new(1, now - 30 * 3600, now - 28 * 3600)).await;

    let analytics = MachineAnalytics::new(store, config);
    run_reports(&analytics, now).await?;

    println!("\nDemo completed successfully!");
    Ok(())
}

fn generate_snapshot(now: i64) -> Snapshot {
    let mut rng = rand::thread_rng();
    let start = now - 14 * 24 * 3600;
    let mut snapshot = Snapshot::default();

    for (machine_id, _) in MACHINES {
        // Run-state flips every 20 minutes to 6 hours, mostly running
        let mut timestamp = start;
        while timestamp < now {
            let running = rng.gen_bool(0.7);
            snapshot.samples.push(Sample::run_state(machine_id, timestamp, running));
            timestamp += rng.gen_range(1200..6 * 3600);
        }

        // Analog tags sampled every 10 minutes
        let mut level: f64 = rng.gen_range(100.0..500.0);
        for i in 0..(14 * 24 * 6) {
            let timestamp = start + i * 600;
            level = f64::max(level + rng.gen_range(-15.0..15.0), 0.0);
            for tag_id in [
                tags::ENERGY_CONSUMPTION,
                tags::HOPPER_INVENTORY,
                tags::HAULOFF_LENGTH,
                tags::ACTUAL_POINTS,
                tags::SET_POINTS,
            ] {
                snapshot.samples.push(Sample::new(machine_id, machine_id, tag_id, timestamp, vec![level]));
            }
        }

        let targets: Vec<f64> = (0..6).map(|_| rng.gen_range(0.0..1000.0)).collect();
        let actuals: Vec<f64> = targets.iter().map(|t| t + rng.gen_range(-5.0..5.0)).collect();
        snapshot.samples.push(Sample::new(machine_id, machine_id, tags::WEIGHT_TARGETS, now - 60, targets));
        snapshot.samples.push(Sample::new(machine_id, machine_id, tags::WEIGHT_ACTUALS, now - 60, actuals));
    }

    let yesterday = (Utc::now() - chrono::Duration::days(1)).format("%Y-%m-%d").to_string();
    snapshot.downtime_plans.push(DowntimePlan {
        machine_id: 1,
        date_from: yesterday.clone(),
        time_from: "06:00".to_string(),
        date_to: yesterday,
        time_to: "10:00".to_string(),
    });

    snapshot
}

async fn run_reports(analytics: &MachineAnalytics<MemoryStore>, now: i64) -> Result<(), Box<dyn std::error::Error>> {
    let last_week = analytics.resolve_window(&RangeDescriptor::relative("last7Days"), now)?;
    let last_day = analytics.resolve_window(&RangeDescriptor::relative("last24Hours"), now)?;

    for (machine_id, kind) in MACHINES {
        println!("\nMachine {} ({:?})", machine_id, kind);
        println!("--------------------------------");

        let summary = analytics.summary(machine_id, last_week).await?;
        println!("   Utilization (7d):    {:.1}%", summary.utilization * 100.0);
        println!(
            "   Running / stopped:   {}h / {}h",
            summary.running_hours.running, summary.running_hours.stopped
        );
        println!(
            "   Downtime (7d):       planned {}s, unplanned {}s, idle {}s",
            summary.downtime.planned, summary.downtime.unplanned, summary.downtime.idle
        );

        let weekly = analytics.weekly_running_hours(machine_id, now).await?;
        println!("   Hours by weekday:    {:?}", weekly);

        let series = analytics
            .chart_series(machine_id, tags::ENERGY_CONSUMPTION, 0, last_day)
            .await?;
        println!("   Energy (24h, {} buckets):", series.len());
        for (timestamp_ms, value) in series.iter().take(3) {
            println!("     {} -> {}", timestamp_ms, value);
        }
        if series.len() > 3 {
            println!("     ... and {} more buckets", series.len() - 3);
        }

        let overview = analytics.overview(machine_id, kind).await?;
        println!(
            "   Overview panels:     {} series, {} latest, {} ratios",
            overview.series.len(),
            overview.latest.len(),
            overview.ratios.len()
        );
    }

    Ok(())
}
