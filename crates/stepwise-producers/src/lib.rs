//! Sample step producers.
//!
//! Each module pairs an algorithm with its own snapshot type and closed
//! role enum:
//!
//! - [`minmax`]: simultaneous min and max by pairwise comparison
//! - [`subset_sum`]: include-first backtracking with overshoot pruning
//! - [`hamiltonian`]: depth-first Hamiltonian path search
//! - [`wal`]: a write-ahead log whose operations mutate a persistent store
//!
//! The first three are pure functions of their parameters. The log keeps
//! state between operations and clears it on reset.

pub mod hamiltonian;
pub mod minmax;
pub mod subset_sum;
pub mod wal;

/// Most steps a backtracking search records before it stops and reports
/// a truncated run.
pub const STEP_BUDGET: usize = 10_000;

pub use hamiltonian::{Hamiltonian, HamiltonianParams, HamiltonianRole, HamiltonianSnapshot};
pub use minmax::{MinMax, MinMaxParams, MinMaxRole, MinMaxSnapshot};
pub use subset_sum::{SearchMode, SubsetSum, SubsetSumParams, SubsetSumRole, SubsetSumSnapshot};
pub use wal::{Lookup, LogRecord, Wal, WalOp, WalRole, WalSnapshot, WalStore};
