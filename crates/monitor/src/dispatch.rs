//! Fire-and-forget alarm side effects

use cloud_sync::{NotificationEvent, Notifier};
use position::PositionHandle;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::sound::AlarmSound;

/// Result of one dispatch
#[derive(Debug)]
pub struct Dispatch {
    /// The notification built for this alarm
    pub event: NotificationEvent,
    /// Background delivery task, if a notifier is configured
    pub delivery: Option<JoinHandle<()>>,
}

/// Starts the sound and the notification for an alarm rising edge
///
/// Nothing here waits on the sound or the network; failures are logged
/// and counted, never reported back to the alarm state machine.
pub struct AlarmDispatcher {
    sound: Option<Arc<dyn AlarmSound>>,
    notifier: Option<Notifier>,
    position: PositionHandle,
}

impl AlarmDispatcher {
    pub fn new(
        sound: Option<Arc<dyn AlarmSound>>,
        notifier: Option<Notifier>,
        position: PositionHandle,
    ) -> Self {
        Self {
            sound,
            notifier,
            position,
        }
    }

    /// Dispatcher with no side effects
    pub fn silent() -> Self {
        Self::new(None, None, PositionHandle::unset())
    }

    /// Must be called from within a tokio runtime
    pub fn dispatch(&self) -> Dispatch {
        let event = NotificationEvent::now(self.position.snapshot());
        info!(
            instant = %event.drowsy_instant,
            lat = ?event.coordinates.lat,
            long = ?event.coordinates.long,
            "DROWSINESS"
        );

        if let Some(sound) = &self.sound {
            if let Err(e) = sound.play() {
                warn!("Error with alarm sound: {}", e);
                metrics::counter!("alarm_sound_failures_total").increment(1);
            }
        }

        let delivery = self.notifier.as_ref().map(|notifier| {
            let notifier = notifier.clone();
            let payload = event.clone();
            tokio::spawn(async move {
                match notifier.send(&payload).await {
                    Ok(body) => {
                        info!(response = %body, "Notification delivered");
                        metrics::counter!("alarm_notifications_total").increment(1);
                    }
                    Err(e) => {
                        warn!("Notification to {} failed: {}", notifier.endpoint(), e);
                        metrics::counter!("alarm_notification_failures_total").increment(1);
                    }
                }
            })
        });

        Dispatch { event, delivery }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::SoundError;
    use cloud_sync::CloudConfig;
    use position::{Position, PositionError, PositionProvider, PositionSource};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSound {
        plays: AtomicUsize,
        fail: bool,
    }

    impl AlarmSound for CountingSound {
        fn play(&self) -> Result<(), SoundError> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SoundError::Missing(PathBuf::from("alarm.mp3")));
            }
            Ok(())
        }
    }

    struct Fixed;

    impl PositionSource for Fixed {
        fn sample(&mut self) -> Result<Position, PositionError> {
            Ok(Position {
                lat: 40.0,
                long: -3.0,
            })
        }
    }

    #[tokio::test]
    async fn test_silent_dispatch_builds_event() {
        let dispatch = AlarmDispatcher::silent().dispatch();
        assert!(dispatch.delivery.is_none());
        assert!(!dispatch.event.coordinates.is_set());
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_carries_position_snapshot() {
        let provider = PositionProvider::spawn(Fixed, Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let dispatcher = AlarmDispatcher::new(None, None, provider.handle());
        let event = dispatcher.dispatch().event;
        assert_eq!(event.coordinates.lat, Some(40.0));
        assert_eq!(event.coordinates.long, Some(-3.0));
    }

    #[tokio::test]
    async fn test_sound_failure_is_swallowed() {
        let sound = Arc::new(CountingSound {
            fail: true,
            ..Default::default()
        });
        let dispatcher = AlarmDispatcher::new(Some(sound.clone()), None, PositionHandle::unset());

        dispatcher.dispatch();
        dispatcher.dispatch();
        assert_eq!(sound.plays.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_panic() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = Notifier::new(&CloudConfig {
            endpoint: format!("http://{}/api/v1/statistics", addr),
            timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();
        let dispatcher = AlarmDispatcher::new(None, Some(notifier), PositionHandle::unset());

        let delivery = dispatcher.dispatch().delivery.unwrap();
        delivery.await.unwrap();
    }
}
