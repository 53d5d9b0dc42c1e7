//! Error types for stepwise-playback.

use thiserror::Error;

/// Result type for stepwise-playback operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or driving playback.
///
/// Playback itself never fails: bad producer input degrades to the idle
/// step upstream. These cover configuration and a player whose task has
/// gone away.
#[derive(Debug, Error)]
pub enum Error {
    /// Speed range with its bounds the wrong way round.
    #[error("invalid speed range: min {min} exceeds max {max}")]
    InvalidSpeedRange { min: u32, max: u32 },

    /// Configuration failed validation.
    #[error("invalid playback config: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The player task is no longer running.
    #[error("player has shut down")]
    Closed,
}
