//! Drowsiness Monitor - Main Entry Point

use anyhow::Context;
use clap::Parser;
use cloud_sync::Notifier;
use monitor::args::Args;
use monitor::replay::Trace;
use monitor::sound::{AlarmSound, CommandSound};
use monitor::{
    init_logging, install_metrics_exporter, run, AlarmDispatcher, Monitor, MonitorConfig, Pacing,
};
use position::{PositionProvider, SimulatedSource};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = MonitorConfig::load(args.config.as_deref()).context("loading configuration")?;
    init_logging(&config.logging);

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    config.validate().context("validating configuration")?;

    if let Some(addr) = config.metrics.listen {
        install_metrics_exporter(addr)?;
    }

    let trace = Trace::load(&args.trace)?;

    let mut position = if config.position.enabled {
        PositionProvider::spawn(SimulatedSource::new(), config.position.interval())
    } else {
        PositionProvider::disabled()
    };

    let notifier = if config.notification.enabled {
        Some(Notifier::new(&config.notification)?)
    } else {
        None
    };

    let sound: Option<Arc<dyn AlarmSound>> = if config.sound.enabled {
        Some(Arc::new(CommandSound::new(&config.sound)))
    } else {
        None
    };

    let dispatcher = AlarmDispatcher::new(sound, notifier, position.handle());
    let mut monitor = Monitor::new(&config, trace.landmarks(), dispatcher, Instant::now())?;

    let pacing = if args.realtime {
        Pacing::Realtime
    } else {
        Pacing::Simulated
    };
    let summary = run(
        &mut monitor,
        &mut trace.frames(),
        config.camera.frame_interval(),
        pacing,
    )
    .await?;

    info!(
        frames = summary.frames,
        alarm_frames = summary.alarm_frames,
        alarms = summary.alarms_fired,
        "Monitoring finished"
    );

    monitor
        .drain(Duration::from_secs(config.notification.timeout_secs + 1))
        .await;
    position.stop();

    Ok(())
}
