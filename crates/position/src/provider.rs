//! Background sampler and snapshot readers

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{GpsCoords, PositionSource};

/// Cheap, cloneable reader of the latest coordinates
#[derive(Debug, Clone)]
pub struct PositionHandle {
    rx: watch::Receiver<GpsCoords>,
}

impl PositionHandle {
    /// Latest published coordinates; never waits
    pub fn snapshot(&self) -> GpsCoords {
        *self.rx.borrow()
    }

    /// Handle that always reports unset coordinates
    pub fn unset() -> Self {
        let (_tx, rx) = watch::channel(GpsCoords::unset());
        Self { rx }
    }
}

/// Owns the sampler task; stopping or dropping it ends sampling
pub struct PositionProvider {
    handle: PositionHandle,
    task: Option<JoinHandle<()>>,
}

impl PositionProvider {
    /// Spawn the sampler on the current tokio runtime
    pub fn spawn<S>(mut source: S, interval: Duration) -> Self
    where
        S: PositionSource + Send + 'static,
    {
        let (tx, rx) = watch::channel(GpsCoords::unset());

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match source.sample() {
                    Ok(position) => {
                        debug!(lat = position.lat, long = position.long, "Position sampled");
                        tx.send_replace(position.into());
                    }
                    // Keep the previous fix; readers tolerate staleness
                    Err(e) => warn!("Position sample failed: {}", e),
                }
            }
        });

        info!("Position sampler started ({:?} interval)", interval);

        Self {
            handle: PositionHandle { rx },
            task: Some(task),
        }
    }

    /// Provider without a sampler; coordinates stay unset
    pub fn disabled() -> Self {
        Self {
            handle: PositionHandle::unset(),
            task: None,
        }
    }

    pub fn snapshot(&self) -> GpsCoords {
        self.handle.snapshot()
    }

    pub fn handle(&self) -> PositionHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop sampling; the last fix remains readable
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            info!("Stopping position sampler");
            task.abort();
        }
    }
}

impl Drop for PositionProvider {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
