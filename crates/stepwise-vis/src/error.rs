//! Error types for stepwise-vis.

use axum::http::StatusCode;
use thiserror::Error;

/// Result type for stepwise-vis operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown visualizer '{0}' (expected one of: minmax, subset-sum, hamiltonian, wal)")]
    UnknownVisualizer(String),

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Playback(#[from] stepwise_playback::Error),
}

/// Status code for a failed player request.
///
/// The player only fails once its task has gone away, which a client
/// should treat as the service being unavailable.
pub(crate) fn status_code(err: stepwise_playback::Error) -> StatusCode {
    tracing::warn!(%err, "player request failed");
    match err {
        stepwise_playback::Error::Closed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
