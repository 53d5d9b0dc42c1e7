//! The step producer contract.

use serde::{Deserialize, Serialize};

use crate::step::Step;

/// What a reset does to a producer's external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetPolicy {
    /// Keep the store, re-derive the display from it
    Rederive,
    /// Replace the store with its default before regenerating
    ClearStore,
}

/// Operation type of a producer that has no store to operate on.
///
/// Uninhabited, but unlike `Infallible` it (de)serializes, so generic
/// transports can still name it. Any attempt to deserialize one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoOperation {}

/// Runs one algorithm to completion and records its steps.
///
/// Implementations are pure: no timers, no I/O, no state shared between
/// calls. Every run yields at least one step: malformed but well-typed
/// input yields the single idle step ([`Step::idle`]) rather than a panic.
///
/// Stateless visualizers use `Store = ()` and `Op = NoOperation`.
pub trait Producer: Send + Sync + 'static {
    /// Parameters chosen by the learner.
    type Params: Clone + Send + Sync + 'static;
    /// Persistent structure carried across operations.
    type Store: Clone + Default + PartialEq + Send + Sync + 'static;
    /// Operation requested against the store.
    type Op: Send + 'static;
    /// Per-step snapshot.
    type Snapshot: Clone + Default + Send + Sync + 'static;
    /// Highlight vocabulary.
    type Role: Clone + Send + Sync + 'static;

    /// What a reset does to the store.
    const RESET: ResetPolicy = ResetPolicy::Rederive;

    /// Run the algorithm for `params` against the current store.
    fn produce(
        &self,
        params: &Self::Params,
        store: &Self::Store,
    ) -> Vec<Step<Self::Snapshot, Self::Role>>;

    /// Apply `op` to `store`, returning the new store and the steps that
    /// explain how it came to be.
    fn operate(&self, params: &Self::Params, store: &Self::Store, op: Self::Op) -> Transition<Self>;
}

/// Result of [`Producer::operate`].
pub struct Transition<P: Producer + ?Sized> {
    pub steps: Vec<Step<P::Snapshot, P::Role>>,
    pub store: P::Store,
}

impl<P: Producer + ?Sized> Transition<P> {
    pub fn new(steps: Vec<Step<P::Snapshot, P::Role>>, store: P::Store) -> Self {
        Self { steps, store }
    }
}

impl<P: Producer + ?Sized> std::fmt::Debug for Transition<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_operation_never_deserializes() {
        assert!(serde_json::from_str::<NoOperation>(r#""Anything""#).is_err());
        assert!(serde_json::from_str::<NoOperation>("{}").is_err());
    }
}
