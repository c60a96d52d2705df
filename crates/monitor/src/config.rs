//! Layered configuration: defaults, optional TOML file, `DROWSY__*` environment

use alerting::AlertConfig;
use camera_capture::CameraConfig;
use cloud_sync::CloudConfig;
use dms::DmsConfig;
use position::PositionConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::logging::LogConfig;
use crate::sound::SoundConfig;
use crate::MonitorError;

/// Used when no `--config` is given, if it exists
pub const DEFAULT_CONFIG_FILE: &str = "drowsiness.toml";

/// Environment prefix, e.g. `DROWSY__DMS__EAR_THRESHOLD=0.2`
pub const ENV_PREFIX: &str = "DROWSY";

/// Metrics exporter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus scrape address; exporter disabled when unset
    pub listen: Option<SocketAddr>,
}

/// Complete monitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub dms: DmsConfig,
    pub alerting: AlertConfig,
    pub camera: CameraConfig,
    pub position: PositionConfig,
    pub notification: CloudConfig,
    pub sound: SoundConfig,
    pub logging: LogConfig,
    pub metrics: MetricsConfig,
}

impl MonitorConfig {
    /// Load configuration; an explicit `path` must exist
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(file).required(path.is_some()))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Reject settings the monitor cannot run with
    pub fn validate(&self) -> Result<(), MonitorError> {
        self.dms.validate()?;
        self.alerting.alarm_threshold()?;
        self.position.validate()?;
        if self.camera.fps == 0 {
            return Err(MonitorError::Invalid("camera.fps must be positive".into()));
        }
        if self.notification.enabled && self.notification.timeout_secs == 0 {
            return Err(MonitorError::Invalid(
                "notification.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
