//! Playback configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::speed::SpeedRange;

/// Configuration shared by every visualizer's controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Slider bounds for the speed setting.
    pub speed: SpeedRange,

    /// Speed setting on mount.
    pub initial_speed: u32,

    /// Whether the first sequence starts playing as soon as it is loaded.
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        let speed = SpeedRange::default();
        Self {
            speed,
            initial_speed: speed.midpoint(),
            autoplay: true,
        }
    }
}

impl PlaybackConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the range is well formed and the initial speed is inside it.
    pub fn validate(&self) -> Result<()> {
        self.speed.validate()?;
        if !self.speed.contains(self.initial_speed) {
            return Err(Error::InvalidConfig(format!(
                "initial speed {} outside {}..={}",
                self.initial_speed,
                self.speed.min(),
                self.speed.max()
            )));
        }
        Ok(())
    }

    /// Set the speed range, pulling the initial speed into it.
    #[must_use]
    pub fn with_speed_range(mut self, speed: SpeedRange) -> Self {
        self.speed = speed;
        self.initial_speed = speed.clamp(self.initial_speed);
        self
    }

    /// Set the initial speed (clamped to the range).
    #[must_use]
    pub fn with_initial_speed(mut self, speed: u32) -> Self {
        self.initial_speed = self.speed.clamp(speed);
        self
    }

    /// Enable or disable autoplay on mount.
    #[must_use]
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }
}
