//! Speed setting to tick delay mapping.
//!
//! The learner picks a speed on a slider; a higher setting means a shorter
//! wait between steps:
//!
//! ```text
//! delay = max - speed + min
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Slowest slider position (and longest delay) by default.
pub const DEFAULT_MIN_SPEED: u32 = 10;

/// Fastest slider position (and shortest delay) by default.
pub const DEFAULT_MAX_SPEED: u32 = 1000;

/// Milliseconds to wait before the next step at `speed`.
///
/// Pure affine inverse of the slider position. Callers keep `speed` inside
/// `[min, max]`; outside it the result saturates at 0 instead of wrapping.
///
/// # Examples
///
/// ```
/// use stepwise_playback::delay_ms;
///
/// assert_eq!(delay_ms(10, 10, 1000), 1000);  // slowest
/// assert_eq!(delay_ms(1000, 10, 1000), 10);  // fastest
/// assert_eq!(delay_ms(500, 10, 1000), 510);
/// ```
pub const fn delay_ms(speed: u32, min: u32, max: u32) -> u32 {
    max.saturating_add(min).saturating_sub(speed)
}

/// Inclusive range of valid speed settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedRange {
    min: u32,
    max: u32,
}

impl Default for SpeedRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_SPEED,
            max: DEFAULT_MAX_SPEED,
        }
    }
}

impl SpeedRange {
    /// Create a range; `min` must not exceed `max`.
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidSpeedRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Check the bounds of a range that was built without [`new`](Self::new).
    pub fn validate(&self) -> Result<()> {
        Self::new(self.min, self.max).map(|_| ())
    }

    /// Whether `speed` lies inside the range.
    pub fn contains(&self, speed: u32) -> bool {
        (self.min..=self.max).contains(&speed)
    }

    /// Pull `speed` into the range.
    pub fn clamp(&self, speed: u32) -> u32 {
        speed.clamp(self.min, self.max)
    }

    /// Wait before the next step at `speed`.
    pub fn delay(&self, speed: u32) -> Duration {
        Duration::from_millis(u64::from(delay_ms(self.clamp(speed), self.min, self.max)))
    }

    /// Slider midpoint.
    pub fn midpoint(&self) -> u32 {
        self.min + (self.max - self.min) / 2
    }
}
