//! Alarm sound playback through an external player process

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tracing::{debug, warn};

/// Sound error types
#[derive(Error, Debug)]
pub enum SoundError {
    #[error("Alarm sound not found: {0}")]
    Missing(PathBuf),

    #[error("Failed to start player {player}: {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },
}

/// Sound configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled: bool,
    /// Player executable
    pub player: String,
    /// Arguments placed before the asset path
    pub args: Vec<String>,
    /// Alarm sound file
    pub asset: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player: "mpg123".to_string(),
            args: vec!["-q".to_string()],
            asset: PathBuf::from("sounds/alarm.mp3"),
        }
    }
}

/// Something that can start the alarm sound
///
/// `play` returns once playback has started; it must not wait for the
/// sound to finish.
pub trait AlarmSound: Send + Sync {
    fn play(&self) -> Result<(), SoundError>;
}

/// Plays the alarm by spawning a player process
#[derive(Debug, Clone)]
pub struct CommandSound {
    player: String,
    args: Vec<String>,
    asset: PathBuf,
}

impl CommandSound {
    pub fn new(config: &SoundConfig) -> Self {
        Self {
            player: config.player.clone(),
            args: config.args.clone(),
            asset: config.asset.clone(),
        }
    }
}

impl AlarmSound for CommandSound {
    fn play(&self) -> Result<(), SoundError> {
        if !self.asset.is_file() {
            return Err(SoundError::Missing(self.asset.clone()));
        }

        let mut child = tokio::process::Command::new(&self.player)
            .args(&self.args)
            .arg(&self.asset)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SoundError::Spawn {
                player: self.player.clone(),
                source,
            })?;

        // Reap the player in the background
        let player = self.player.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!("{} finished", player),
                Ok(status) => warn!("{} exited with {}", player, status),
                Err(e) => warn!("Waiting for {} failed: {}", player, e),
            }
        });

        Ok(())
    }
}
