//! Immutable steps and the sequences built from them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::highlight::Highlights;

/// Narration carried by the synthetic idle step.
pub const IDLE_MESSAGE: &str = "Nothing to show";

/// One observable instant of an algorithm run.
///
/// The snapshot is complete: a step can be rendered without looking at
/// any other step in its sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step<S, R> {
    message: String,
    highlights: Highlights<R>,
    state: S,
}

impl<S, R> Step<S, R> {
    /// Create a step from its narration, annotations and snapshot.
    pub fn new(message: impl Into<String>, highlights: impl Into<Highlights<R>>, state: S) -> Self {
        Self {
            message: message.into(),
            highlights: highlights.into(),
            state,
        }
    }

    /// Human-readable narration of this instant.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Elements that matter at this instant, and in which role.
    pub fn highlights(&self) -> &Highlights<R> {
        &self.highlights
    }

    /// Full algorithm-specific snapshot.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Whether this is the synthetic "nothing to animate" step.
    pub fn is_idle(&self) -> bool {
        self.message == IDLE_MESSAGE && self.highlights.is_empty()
    }
}

impl<S: Default, R> Step<S, R> {
    /// The placeholder step shown when a run produced nothing.
    pub fn idle() -> Self {
        Self::new(IDLE_MESSAGE, Highlights::default(), S::default())
    }
}

/// An ordered, non-empty, read-only list of steps.
///
/// Index 0 is the least-progressed state; the last index is the terminal
/// state of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Sequence<S, R> {
    steps: Vec<Step<S, R>>,
}

#[allow(clippy::len_without_is_empty)]
impl<S: Default, R> Sequence<S, R> {
    /// Freeze a producer's output. Zero steps become a single idle step.
    pub fn from_steps(steps: Vec<Step<S, R>>) -> Self {
        if steps.is_empty() {
            return Self::idle();
        }
        Self { steps }
    }

    /// A sequence consisting only of the idle step.
    pub fn idle() -> Self {
        Self {
            steps: vec![Step::idle()],
        }
    }
}

#[allow(clippy::len_without_is_empty)]
impl<S, R> Sequence<S, R> {
    /// Number of steps (always at least 1).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Index of the terminal step.
    pub fn terminal_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// Step at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<&Step<S, R>> {
        self.steps.get(index)
    }

    /// Initial step.
    pub fn first(&self) -> &Step<S, R> {
        &self.steps[0]
    }

    /// Terminal step.
    pub fn last(&self) -> &Step<S, R> {
        &self.steps[self.steps.len() - 1]
    }

    /// Iterate steps in playback order.
    pub fn iter(&self) -> std::slice::Iter<'_, Step<S, R>> {
        self.steps.iter()
    }

    /// All steps as a slice.
    pub fn as_slice(&self) -> &[Step<S, R>] {
        &self.steps
    }
}

impl<'de, S, R> Deserialize<'de> for Sequence<S, R>
where
    S: Deserialize<'de> + Default,
    R: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Step<S, R>>::deserialize(deserializer).map(Self::from_steps)
    }
}

impl<'a, S, R> IntoIterator for &'a Sequence<S, R> {
    type Item = &'a Step<S, R>;
    type IntoIter = std::slice::Iter<'a, Step<S, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{Highlight, Target};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    enum Role {
        Pivot,
    }

    fn step(message: &str, value: i32) -> Step<Vec<i32>, Role> {
        Step::new(
            message,
            vec![Highlight::new(Target::Index(0), Role::Pivot)],
            vec![value],
        )
    }

    #[test]
    fn empty_output_becomes_idle_step() {
        let sequence: Sequence<Vec<i32>, Role> = Sequence::from_steps(Vec::new());
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.terminal_index(), 0);
        assert!(sequence.first().is_idle());
        assert_eq!(sequence.first().message(), IDLE_MESSAGE);
        assert!(sequence.first().state().is_empty());
    }

    #[test]
    fn steps_keep_their_order() {
        let sequence = Sequence::from_steps(vec![step("a", 1), step("b", 2), step("c", 3)]);
        let messages: Vec<_> = sequence.iter().map(Step::message).collect();
        assert_eq!(messages, ["a", "b", "c"]);
        assert_eq!(sequence.last().state(), &vec![3]);
        assert!(sequence.get(3).is_none());
    }

    #[test]
    fn real_step_is_not_idle() {
        assert!(!step("compare", 4).is_idle());
    }

    #[test]
    fn step_serialization() {
        let original = step("swap", 7);
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("swap"));
        assert!(json.contains("Pivot"));

        let parsed: Step<Vec<i32>, Role> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn sequence_serializes_as_plain_list() {
        let sequence = Sequence::from_steps(vec![step("a", 1), step("b", 2)]);
        let value = serde_json::to_value(&sequence).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    proptest::proptest! {
        #[test]
        fn sequence_is_never_empty(values in proptest::collection::vec(-100i32..100, 0..20)) {
            let steps: Vec<_> = values.iter().map(|v| step("value", *v)).collect();
            let count = steps.len();
            let sequence = Sequence::from_steps(steps);
            proptest::prop_assert!(sequence.len() >= 1);
            proptest::prop_assert_eq!(sequence.len(), count.max(1));
            proptest::prop_assert_eq!(sequence.terminal_index(), sequence.len() - 1);
        }
    }

    #[test]
    fn deserializing_empty_list_yields_idle_step() {
        let sequence: Sequence<Vec<i32>, Role> = serde_json::from_str("[]").unwrap();
        assert_eq!(sequence.len(), 1);
        assert!(sequence.first().is_idle());
    }
}
