//! Per-run id generation.

use serde::{Deserialize, Serialize};

/// Monotonic id source owned by one producer run or one store.
///
/// Two sequences never share state, so repeated runs in the same process
/// hand out the same ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    /// Start at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Take the next id.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}
