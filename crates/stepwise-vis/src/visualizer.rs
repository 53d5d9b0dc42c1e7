//! Producers the server knows how to expose.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stepwise_playback::PlaybackConfig;
use stepwise_producers::{Hamiltonian, MinMax, SubsetSum, Wal};
use stepwise_step::Producer;

use crate::error::{Error, Result};
use crate::server::VisServer;

/// A producer whose params, operations and steps travel as JSON.
pub trait Visualizer:
    Producer<
        Params: Serialize + DeserializeOwned + Default,
        Op: DeserializeOwned,
        Snapshot: Serialize,
        Role: Serialize,
    > + Default
{
    /// Name used on the command line and reported to clients.
    const NAME: &'static str;
}

impl Visualizer for MinMax {
    const NAME: &'static str = "minmax";
}

impl Visualizer for SubsetSum {
    const NAME: &'static str = "subset-sum";
}

impl Visualizer for Hamiltonian {
    const NAME: &'static str = "hamiltonian";
}

impl Visualizer for Wal {
    const NAME: &'static str = "wal";
}

/// Command-line choice of visualizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizerKind {
    MinMax,
    SubsetSum,
    Hamiltonian,
    Wal,
}

impl VisualizerKind {
    pub const ALL: [VisualizerKind; 4] = [
        Self::MinMax,
        Self::SubsetSum,
        Self::Hamiltonian,
        Self::Wal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::MinMax => MinMax::NAME,
            Self::SubsetSum => SubsetSum::NAME,
            Self::Hamiltonian => Hamiltonian::NAME,
            Self::Wal => Wal::NAME,
        }
    }

    /// Mount this visualizer with default params and serve it until the
    /// listener fails.
    pub async fn serve(self, port: u16, config: PlaybackConfig) -> Result<()> {
        config.validate()?;
        match self {
            Self::MinMax => VisServer::<MinMax>::new(config).serve(port).await,
            Self::SubsetSum => VisServer::<SubsetSum>::new(config).serve(port).await,
            Self::Hamiltonian => VisServer::<Hamiltonian>::new(config).serve(port).await,
            Self::Wal => VisServer::<Wal>::new(config).serve(port).await,
        }
    }
}

impl FromStr for VisualizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownVisualizer(s.to_string()))
    }
}

impl fmt::Display for VisualizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
