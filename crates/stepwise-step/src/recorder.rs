//! Step accumulator threaded through a producer's recursion.

use crate::highlight::Highlights;
use crate::step::Step;

/// Collects steps in the order they are recorded.
///
/// Pass it down recursive calls as `&mut StepRecorder` so each call only
/// depends on its arguments and the accumulator it was handed.
#[derive(Debug)]
pub struct StepRecorder<S, R> {
    steps: Vec<Step<S, R>>,
}

impl<S, R> Default for StepRecorder<S, R> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<S, R> StepRecorder<S, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step.
    pub fn record(
        &mut self,
        message: impl Into<String>,
        highlights: impl Into<Highlights<R>>,
        state: S,
    ) {
        self.steps.push(Step::new(message, highlights, state));
    }

    /// Append a step carrying no highlights.
    pub fn narrate(&mut self, message: impl Into<String>, state: S) {
        self.record(message, Highlights::default(), state);
    }

    /// Steps recorded so far.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Most recently recorded step.
    pub fn last(&self) -> Option<&Step<S, R>> {
        self.steps.last()
    }

    /// Hand the recorded steps over.
    pub fn finish(self) -> Vec<Step<S, R>> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{Highlight, Target};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Role {
        Visiting,
    }

    fn walk(depth: usize, limit: usize, recorder: &mut StepRecorder<usize, Role>) {
        recorder.record(
            format!("enter depth {depth}"),
            vec![Highlight::new(Target::Node(depth as u64), Role::Visiting)],
            depth,
        );
        if depth < limit {
            walk(depth + 1, limit, recorder);
        }
        recorder.narrate(format!("leave depth {depth}"), depth);
    }

    #[test]
    fn recursion_records_in_call_order() {
        let mut recorder = StepRecorder::new();
        walk(0, 2, &mut recorder);

        let steps = recorder.finish();
        let messages: Vec<_> = steps.iter().map(Step::message).collect();
        assert_eq!(
            messages,
            [
                "enter depth 0",
                "enter depth 1",
                "enter depth 2",
                "leave depth 2",
                "leave depth 1",
                "leave depth 0",
            ]
        );
    }

    #[test]
    fn narrate_has_no_highlights() {
        let mut recorder: StepRecorder<(), Role> = StepRecorder::new();
        recorder.narrate("done", ());
        assert_eq!(recorder.len(), 1);
        assert!(recorder.last().map(|s| s.highlights().is_empty()).unwrap_or(false));
    }
}
