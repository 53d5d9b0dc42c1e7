//! Subset sum by include-first backtracking.
//!
//! Numbers are sorted descending. At each position the search first tries
//! to include the number, skipping that branch when it would push the
//! running sum past the target, then tries leaving it out. Each recursive
//! call is numbered from a per-run [`IdSequence`] so its steps can be
//! traced back to the call that recorded them.
//!
//! Exhaustive mode counts a subset when the search reaches the end of the
//! input with the target met, so a hit that can still be extended by zeros
//! is counted once per extension. Runs stop after [`STEP_BUDGET`] steps.

use serde::{Deserialize, Serialize};
use stepwise_step::{
    Highlight, Highlights, IdSequence, NoOperation, Producer, Step, StepRecorder, Target,
    Transition,
};

use crate::STEP_BUDGET;

/// Longest input the search accepts; longer inputs yield the idle step.
pub const MAX_NUMBERS: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Stop at the first subset that hits the target.
    #[default]
    FirstSolution,
    /// Visit the whole (pruned) tree, counting every solution.
    Exhaustive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetSumParams {
    pub numbers: Vec<u64>,
    pub target: u64,
    pub mode: SearchMode,
}

impl Default for SubsetSumParams {
    fn default() -> Self {
        Self {
            numbers: vec![2, 3, 7, 8, 10],
            target: 17,
            mode: SearchMode::FirstSolution,
        }
    }
}

impl SubsetSumParams {
    pub fn new(numbers: impl IntoIterator<Item = u64>, target: u64) -> Self {
        Self {
            numbers: numbers.into_iter().collect(),
            target,
            mode: SearchMode::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetSumSnapshot {
    /// Input, sorted descending
    pub numbers: Vec<u64>,
    pub target: u64,
    /// Positions in `numbers` currently included
    pub chosen: Vec<usize>,
    pub current_sum: u64,
    /// Recursive call that recorded this step
    pub call_id: Option<u64>,
    pub depth: usize,
    /// First subset found, as values
    pub found_solution: Option<Vec<u64>>,
    pub solutions_found: usize,
    /// The search hit the step budget before finishing
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubsetSumRole {
    /// Number the call is deciding on
    Considering,
    /// Part of the current subset
    Included,
    /// Left out of the current subset
    Excluded,
    /// Including it would overshoot the target
    Pruned,
    /// Member of a subset that hits the target
    Solution,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubsetSum;

struct Search<'a> {
    numbers: &'a [u64],
    target: u64,
    mode: SearchMode,
    ids: IdSequence,
    found: Option<Vec<u64>>,
    solutions: usize,
    truncated: bool,
}

impl Search<'_> {
    fn snapshot(&self, chosen: &[usize], sum: u64, call_id: u64, depth: usize) -> SubsetSumSnapshot {
        SubsetSumSnapshot {
            numbers: self.numbers.to_vec(),
            target: self.target,
            chosen: chosen.to_vec(),
            current_sum: sum,
            call_id: Some(call_id),
            depth,
            found_solution: self.found.clone(),
            solutions_found: self.solutions,
            truncated: self.truncated,
        }
    }

    fn values_of(&self, chosen: &[usize]) -> Vec<u64> {
        chosen.iter().map(|&i| self.numbers[i]).collect()
    }

    /// Returns `true` once the search should unwind.
    fn explore(
        &mut self,
        index: usize,
        chosen: &mut Vec<usize>,
        sum: u64,
        recorder: &mut StepRecorder<SubsetSumSnapshot, SubsetSumRole>,
    ) -> bool {
        if recorder.len() >= STEP_BUDGET {
            self.truncated = true;
            return true;
        }
        let call = self.ids.next_id();

        let exhausted = index >= self.numbers.len();
        if sum == self.target && (self.mode == SearchMode::FirstSolution || exhausted) {
            let subset = self.values_of(chosen);
            self.solutions += 1;
            if self.found.is_none() {
                self.found = Some(subset.clone());
            }
            recorder.record(
                format!("Call #{call}: {subset:?} sums to {}", self.target),
                marked(chosen, SubsetSumRole::Solution),
                self.snapshot(chosen, sum, call, index),
            );
            return self.mode == SearchMode::FirstSolution;
        }

        let Some(&value) = self.numbers.get(index) else {
            recorder.record(
                format!("Call #{call}: no numbers left at sum {sum}, backtrack"),
                marked(chosen, SubsetSumRole::Included),
                self.snapshot(chosen, sum, call, index),
            );
            return false;
        };

        let here = Target::Index(index);
        let with_value = sum.saturating_add(value);
        if with_value > self.target {
            recorder.record(
                format!(
                    "Call #{call}: including {value} would reach {with_value} > {}, skip it",
                    self.target
                ),
                marked(chosen, SubsetSumRole::Included).with(here.clone(), SubsetSumRole::Pruned),
                self.snapshot(chosen, sum, call, index),
            );
        } else {
            chosen.push(index);
            recorder.record(
                format!("Call #{call}: include {value}, sum becomes {with_value}"),
                marked(chosen, SubsetSumRole::Included).with(here.clone(), SubsetSumRole::Considering),
                self.snapshot(chosen, with_value, call, index),
            );
            if self.explore(index + 1, chosen, with_value, recorder) {
                return true;
            }
            chosen.pop();
        }

        recorder.record(
            format!("Call #{call}: leave out {value}, sum stays {sum}"),
            marked(chosen, SubsetSumRole::Included).with(here, SubsetSumRole::Excluded),
            self.snapshot(chosen, sum, call, index),
        );
        self.explore(index + 1, chosen, sum, recorder)
    }
}

/// Positions in the sorted input that make up `subset`.
fn solution_highlights(numbers: &[u64], subset: &[u64]) -> Highlights<SubsetSumRole> {
    let mut highlights = Highlights::new();
    let mut remaining = subset.to_vec();
    for (i, value) in numbers.iter().enumerate() {
        if let Some(at) = remaining.iter().position(|v| v == value) {
            remaining.swap_remove(at);
            highlights.push(Target::Index(i), SubsetSumRole::Solution);
        }
    }
    highlights
}

fn marked(chosen: &[usize], role: SubsetSumRole) -> Highlights<SubsetSumRole> {
    chosen
        .iter()
        .map(|&i| Highlight::new(Target::Index(i), role))
        .collect()
}

impl Producer for SubsetSum {
    type Params = SubsetSumParams;
    type Store = ();
    type Op = NoOperation;
    type Snapshot = SubsetSumSnapshot;
    type Role = SubsetSumRole;

    fn produce(
        &self,
        params: &SubsetSumParams,
        _store: &(),
    ) -> Vec<Step<SubsetSumSnapshot, SubsetSumRole>> {
        if params.numbers.is_empty() || params.numbers.len() > MAX_NUMBERS {
            return vec![Step::idle()];
        }
        let mut numbers = params.numbers.clone();
        numbers.sort_unstable_by(|a, b| b.cmp(a));

        let mut recorder = StepRecorder::new();
        recorder.narrate(
            format!(
                "Sorted descending: {numbers:?}. Looking for a subset summing to {}",
                params.target
            ),
            SubsetSumSnapshot {
                numbers: numbers.clone(),
                target: params.target,
                ..SubsetSumSnapshot::default()
            },
        );

        let mut search = Search {
            numbers: &numbers,
            target: params.target,
            mode: params.mode,
            ids: IdSequence::new(),
            found: None,
            solutions: 0,
            truncated: false,
        };
        let mut chosen = Vec::new();
        search.explore(0, &mut chosen, 0, &mut recorder);

        let summary = SubsetSumSnapshot {
            numbers: numbers.clone(),
            target: params.target,
            chosen: Vec::new(),
            current_sum: 0,
            call_id: None,
            depth: 0,
            found_solution: search.found.clone(),
            solutions_found: search.solutions,
            truncated: search.truncated,
        };
        let target = params.target;
        let highlights = search
            .found
            .as_deref()
            .map(|subset| solution_highlights(&numbers, subset))
            .unwrap_or_default();
        let message = match (&search.found, params.mode, search.truncated) {
            (Some(subset), SearchMode::FirstSolution, _) => {
                format!("Success: {subset:?} sums to {target}")
            }
            (Some(subset), SearchMode::Exhaustive, false) => format!(
                "Success: {} subsets sum to {target}, first found {subset:?}",
                search.solutions
            ),
            (Some(subset), SearchMode::Exhaustive, true) => format!(
                "Search stopped after {STEP_BUDGET} steps: {} subsets so far sum to {target}, first found {subset:?}",
                search.solutions
            ),
            (None, _, false) => format!("No subset of {numbers:?} sums to {target}"),
            (None, _, true) => format!(
                "Search stopped after {STEP_BUDGET} steps without a subset summing to {target}"
            ),
        };
        recorder.record(message, highlights, summary);
        recorder.finish()
    }

    fn operate(&self, _params: &SubsetSumParams, _store: &(), op: NoOperation) -> Transition<Self> {
        match op {}
    }
}
