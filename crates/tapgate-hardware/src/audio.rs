//! Audio playback through the ALSA command-line player.

use crate::{
    error::{HardwareError, Result},
    traits::AudioOutput,
};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Default ALSA player binary.
pub const DEFAULT_PLAYER: &str = "aplay";

/// Plays WAV clips by spawning `aplay` (or a compatible player).
#[derive(Debug, Clone)]
pub struct AplayAudio {
    player: String,
}

impl AplayAudio {
    pub fn new() -> Self {
        Self::with_player(DEFAULT_PLAYER)
    }

    /// Use another player binary that takes the clip path as its only argument.
    pub fn with_player(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
        }
    }
}

impl Default for AplayAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for AplayAudio {
    async fn play(&self, clip: &Path) -> Result<()> {
        if !tokio::fs::try_exists(clip).await? {
            return Err(HardwareError::audio(format!(
                "clip not found: {}",
                clip.display()
            )));
        }

        debug!(player = %self.player, clip = %clip.display(), "Starting playback");
        let status = Command::new(&self.player)
            .arg(clip)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| HardwareError::audio(format!("failed to run {}: {e}", self.player)))?;

        if !status.success() {
            return Err(HardwareError::audio(format!(
                "{} exited with {status}",
                self.player
            )));
        }
        info!(clip = %clip.display(), "Playback finished");
        Ok(())
    }
}
