use std::{fs::OpenOptions, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use run_tracker_lib::Coordinate;
use run_tracker_session::{TrackSnapshot, TrackingConfig, TrackingSession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::simulator::{SimulatedProvider, SimulatorConfig};

mod simulator;

/// Tracks a simulated run and reports the path and distance as it grows.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON tracking config. Defaults are used for anything left out.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop tracking after this many seconds. Ctrl-C stops earlier.
    #[arg(long, default_value_t = 60)]
    duration_secs: u64,

    #[arg(long, default_value_t = 5)]
    report_every_secs: u64,

    #[arg(long, default_value_t = 56.175188)]
    start_latitude: f64,

    #[arg(long, default_value_t = 10.196123)]
    start_longitude: f64,

    #[arg(long, default_value_t = 3.)]
    step_meters: f64,

    #[arg(long, default_value_t = 5.)]
    accuracy_meters: f64,

    #[arg(long, default_value_t = 0.05)]
    invalid_rate: f64,

    #[arg(long, default_value_t = 0.02)]
    error_rate: f64,

    /// Simulate the user refusing background location.
    #[arg(long)]
    deny_background: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Also write the log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file_layer = match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {path:?}"))?;
            Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,run_tracker_session=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    let config = match &args.config {
        Some(path) => TrackingConfig::from_json_file(path)?,
        None => TrackingConfig::default(),
    };

    let provider = Arc::new(SimulatedProvider::new(SimulatorConfig {
        start: Coordinate {
            latitude: args.start_latitude,
            longitude: args.start_longitude,
        },
        step_meters: args.step_meters,
        accuracy_meters: args.accuracy_meters,
        invalid_rate: args.invalid_rate,
        error_rate: args.error_rate,
        grant_background: !args.deny_background,
        seed: args.seed,
    })?);

    tracing::info!("Starting session...");

    let mut session = TrackingSession::new(provider, config);
    session.start().await.context("Failed to start tracking")?;

    let handle = session.spawn()?;
    if let Some(center) = handle.snapshot().map_center {
        tracing::info!("Map centered on {:.6}, {:.6}", center.latitude, center.longitude);
    }

    let deadline = tokio::time::sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);
    let mut report = tokio::time::interval(Duration::from_secs(args.report_every_secs.max(1)));

    loop {
        tokio::select! {
            _ = &mut deadline => {
                tracing::info!("Tracking time is up");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for ctrl-c")?;
                tracing::info!("Interrupted");
                break;
            }
            _ = report.tick() => render(&handle.snapshot()),
        }
    }

    let snapshot = handle.stop().await?;
    render(&snapshot);

    Ok(())
}

fn render(snapshot: &TrackSnapshot) {
    tracing::info!("{}", describe(snapshot));
}

fn describe(snapshot: &TrackSnapshot) -> String {
    // Polyline points are x = longitude, y = latitude
    let polyline = snapshot.path.line_string();
    let last = polyline
        .points()
        .last()
        .map(|point| format!("{:.6}, {:.6}", point.y(), point.x()))
        .unwrap_or_else(|| "-".into());
    let last_time = snapshot
        .path
        .fixes()
        .last()
        .and_then(|fix| fix.time())
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".into());

    format!(
        "{:?} | DISTANCE : {:.3} km | {} points | last {} at {}",
        snapshot.state,
        snapshot.total_distance_meters() / 1000.,
        polyline.0.len(),
        last,
        last_time
    )
}
