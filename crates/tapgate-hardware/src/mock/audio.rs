//! Mock audio output.

use crate::{HardwareError, Result, traits::AudioOutput};
use parking_lot::Mutex;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

/// Records played clips instead of producing sound.
#[derive(Debug, Clone, Default)]
pub struct MockAudio {
    played: Arc<Mutex<Vec<PathBuf>>>,
    duration: Duration,
    failing: bool,
}

impl MockAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make each playback take `duration`.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Make every playback fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().len()
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.played.lock().clone()
    }
}

impl AudioOutput for MockAudio {
    async fn play(&self, clip: &Path) -> Result<()> {
        if self.failing {
            return Err(HardwareError::audio("simulated playback failure"));
        }
        tokio::time::sleep(self.duration).await;
        self.played.lock().push(clip.to_path_buf());
        Ok(())
    }
}
