//! Drowsiness Monitor
//!
//! Wires the frame source, the DMS module, the alarm coordinator and the
//! alarm side effects into one per-frame loop.

pub mod args;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod replay;
pub mod sound;

pub use crate::config::MonitorConfig;
pub use dispatch::{AlarmDispatcher, Dispatch};
pub use logging::init_logging;

use alerting::{AlarmCoordinator, AlarmDecision, AlertError};
use camera_capture::{CameraError, FrameSource, VideoFrame};
use cloud_sync::{CloudError, NotificationEvent};
use dms::{DmsAnalysis, DmsError, DmsModule, LandmarkDetector};
use position::PositionError;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error(transparent)]
    Alert(#[from] AlertError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("Capture failed: {0}")]
    Camera(#[from] CameraError),

    #[error("Trace error: {0}")]
    Trace(String),

    #[error("Metrics exporter failed: {0}")]
    Metrics(String),
}

/// Outcome of one frame
#[derive(Debug)]
pub struct FrameOutcome {
    pub analysis: DmsAnalysis,
    pub decision: AlarmDecision,
    /// Set on a rising edge
    pub event: Option<NotificationEvent>,
}

/// Per-session monitoring state
pub struct Monitor<D> {
    dms: DmsModule<D>,
    coordinator: AlarmCoordinator,
    dispatcher: AlarmDispatcher,
    /// Deliveries still in flight
    pending: Vec<JoinHandle<()>>,
}

impl<D: LandmarkDetector> Monitor<D> {
    pub fn new(
        config: &MonitorConfig,
        landmarks: D,
        dispatcher: AlarmDispatcher,
        now: Instant,
    ) -> Result<Self, MonitorError> {
        Ok(Self {
            dms: DmsModule::new(config.dms.clone(), landmarks, now)?,
            coordinator: AlarmCoordinator::new(&config.alerting, now)?,
            dispatcher,
            pending: Vec::new(),
        })
    }

    /// Evaluate one frame; side effects are started, not awaited
    pub fn process_frame(&mut self, frame: &VideoFrame, now: Instant) -> FrameOutcome {
        let analysis = self.dms.analyze(frame, now);
        let decision = self.coordinator.update(analysis.emit_alarm, now);

        debug!(
            sequence = analysis.sequence,
            ear = ?analysis.ear,
            phase = ?analysis.phase,
            "{}",
            analysis.overlay_text()
        );

        let event = decision.should_fire().then(|| {
            let dispatch = self.dispatcher.dispatch();
            self.pending.retain(|task| !task.is_finished());
            self.pending.extend(dispatch.delivery);
            dispatch.event
        });

        FrameOutcome {
            analysis,
            decision,
            event,
        }
    }

    pub fn alarms_fired(&self) -> usize {
        self.coordinator.fire_count()
    }

    pub fn dms(&self) -> &DmsModule<D> {
        &self.dms
    }

    pub fn coordinator(&self) -> &AlarmCoordinator {
        &self.coordinator
    }

    /// Give in-flight notifications up to `timeout` to finish
    pub async fn drain(&mut self, timeout: Duration) {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return;
        }
        info!("Waiting for {} notification(s)", pending.len());
        let all = join_deliveries(pending);
        if tokio::time::timeout(timeout, all).await.is_err() {
            warn!("Notifications still pending after {:?}", timeout);
        }
    }
}

async fn join_deliveries(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        // Delivery tasks log their own failures; only panics surface here
        if let Err(e) = task.await {
            warn!("Notification task failed: {}", e);
        }
    }
}

/// How frame timestamps are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Wait one frame interval between frames, stamp with the wall clock
    Realtime,
    /// No waiting; frame `n` is stamped `start + n * interval`
    Simulated,
}

/// Produces the timestamp for each frame
struct FrameClock {
    pacing: Pacing,
    interval: Duration,
    next: Instant,
}

impl FrameClock {
    fn new(pacing: Pacing, interval: Duration, start: Instant) -> Self {
        Self {
            pacing,
            interval,
            next: start,
        }
    }

    fn stamp(&mut self) -> Instant {
        match self.pacing {
            Pacing::Realtime => Instant::now(),
            Pacing::Simulated => {
                let stamp = self.next;
                self.next += self.interval;
                stamp
            }
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub alarm_frames: u64,
    pub alarms_fired: usize,
}

/// Drive the monitor until the source ends or Ctrl-C
pub async fn run<S, D>(
    monitor: &mut Monitor<D>,
    source: &mut S,
    frame_interval: Duration,
    pacing: Pacing,
) -> Result<RunSummary, MonitorError>
where
    S: FrameSource,
    D: LandmarkDetector,
{
    let mut summary = RunSummary::default();
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut clock = FrameClock::new(pacing, frame_interval, Instant::now());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Monitoring started ({:?} per frame, {:?})", frame_interval, pacing);

    loop {
        if pacing == Pacing::Realtime {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Interrupted");
                    break;
                }
                _ = ticker.tick() => {}
            }
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Frame source ended");
                break;
            }
            Err(e) => {
                error!("Capture failed: {}", e);
                return Err(e.into());
            }
        };

        let outcome = monitor.process_frame(&frame, clock.stamp());
        summary.frames += 1;
        if outcome.analysis.emit_alarm {
            summary.alarm_frames += 1;
        }

        // Let spawned side effects make progress between replayed frames
        if pacing == Pacing::Simulated {
            tokio::task::yield_now().await;
        }
    }

    summary.alarms_fired = monitor.alarms_fired();
    Ok(summary)
}

/// Serve Prometheus metrics on `addr`
pub fn install_metrics_exporter(addr: SocketAddr) -> Result<(), MonitorError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MonitorError::Metrics(e.to_string()))?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}
