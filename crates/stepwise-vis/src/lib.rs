//! Stepwise Visualization Server
//!
//! Serves one sample producer over HTTP and WebSocket so a browser front
//! end can render its steps and drive playback.
//!
//! # Endpoints
//!
//! - `GET /api/info`, `/api/status`, `/api/frame`, `/api/sequence`
//! - `POST /api/playback/{toggle,speed,reset,seek,step}`
//! - `POST /api/params`, `/api/operation` (the producer's own JSON shapes)
//! - `GET /ws`: pushes a frame on every change and accepts tagged commands

mod error;
mod server;
mod visualizer;

pub use error::{Error, Result};
pub use server::{AppState, FrameView, VisServer};
pub use visualizer::{Visualizer, VisualizerKind};
