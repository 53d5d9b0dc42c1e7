//! Simultaneous minimum and maximum by pairwise comparison.
//!
//! Elements are taken two at a time: one comparison round orders the pair,
//! a second checks the smaller one against the running minimum and the
//! larger one against the running maximum. An odd-length array seeds both
//! extremes with its first element; an even-length one orders its first
//! pair.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use stepwise_step::{
    Highlights, NoOperation, Producer, Step, StepRecorder, Target, Transition,
};

/// Largest array a random run will generate.
pub const MAX_RANDOM_SIZE: usize = 64;

/// Where the input array comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MinMaxParams {
    /// Values typed by the learner
    Values { values: Vec<i64> },
    /// Seeded random values in `1..=99`
    Random { size: usize, seed: u64 },
}

impl Default for MinMaxParams {
    fn default() -> Self {
        Self::values([7, 2, 9, 4, 1, 8, 5])
    }
}

impl MinMaxParams {
    pub fn values(values: impl IntoIterator<Item = i64>) -> Self {
        Self::Values {
            values: values.into_iter().collect(),
        }
    }

    /// The concrete array to run on. A seed always yields the same array.
    pub fn resolve(&self) -> Vec<i64> {
        match self {
            Self::Values { values } => values.clone(),
            Self::Random { size, seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                (0..(*size).min(MAX_RANDOM_SIZE))
                    .map(|_| rng.gen_range(1..=99))
                    .collect()
            }
        }
    }
}

/// State of the scan at one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMaxSnapshot {
    pub values: Vec<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub min_index: Option<usize>,
    pub max_index: Option<usize>,
    pub comparison_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinMaxRole {
    /// Pair being ordered
    Comparing,
    /// Smaller element of the pair, checked against the minimum
    Smaller,
    /// Larger element of the pair, checked against the maximum
    Larger,
    /// Running minimum
    CurrentMin,
    /// Running maximum
    CurrentMax,
    /// Final minimum
    Minimum,
    /// Final maximum
    Maximum,
}

/// Pairwise min/max producer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMax;

struct Scan {
    snapshot: MinMaxSnapshot,
}

impl Scan {
    fn extremes(&self) -> Highlights<MinMaxRole> {
        let mut highlights = Highlights::new();
        if let Some(i) = self.snapshot.min_index {
            highlights.push(Target::Index(i), MinMaxRole::CurrentMin);
        }
        if let Some(i) = self.snapshot.max_index {
            highlights.push(Target::Index(i), MinMaxRole::CurrentMax);
        }
        highlights
    }

    fn set_min(&mut self, index: usize) {
        self.snapshot.min_index = Some(index);
        self.snapshot.min_value = Some(self.snapshot.values[index]);
    }

    fn set_max(&mut self, index: usize) {
        self.snapshot.max_index = Some(index);
        self.snapshot.max_value = Some(self.snapshot.values[index]);
    }

    /// Order the pair at `(a, b)`; returns `(smaller, larger)` indices.
    fn order_pair(
        &mut self,
        a: usize,
        b: usize,
        recorder: &mut StepRecorder<MinMaxSnapshot, MinMaxRole>,
    ) -> (usize, usize) {
        let values = &self.snapshot.values;
        let (smaller, larger) = if values[a] <= values[b] { (a, b) } else { (b, a) };
        self.snapshot.comparison_count += 1;
        recorder.record(
            format!(
                "Compare arr[{a}] = {} with arr[{b}] = {}: {} is smaller",
                values[a], values[b], values[smaller]
            ),
            self.extremes()
                .with(Target::Index(a), MinMaxRole::Comparing)
                .with(Target::Index(b), MinMaxRole::Comparing),
            self.snapshot.clone(),
        );
        (smaller, larger)
    }
}

impl Producer for MinMax {
    type Params = MinMaxParams;
    type Store = ();
    type Op = NoOperation;
    type Snapshot = MinMaxSnapshot;
    type Role = MinMaxRole;

    fn produce(&self, params: &MinMaxParams, _store: &()) -> Vec<Step<MinMaxSnapshot, MinMaxRole>> {
        let values = params.resolve();
        let n = values.len();
        if n == 0 {
            return vec![Step::idle()];
        }

        let mut recorder = StepRecorder::new();
        let mut scan = Scan {
            snapshot: MinMaxSnapshot {
                values,
                ..MinMaxSnapshot::default()
            },
        };

        let mut next = if n % 2 == 1 {
            scan.set_min(0);
            scan.set_max(0);
            recorder.record(
                format!(
                    "Odd length {n}: min and max both start at arr[0] = {}",
                    scan.snapshot.values[0]
                ),
                scan.extremes(),
                scan.snapshot.clone(),
            );
            1
        } else {
            let (smaller, larger) = scan.order_pair(0, 1, &mut recorder);
            scan.set_min(smaller);
            scan.set_max(larger);
            recorder.record(
                format!(
                    "Even length {n}: min starts at {}, max at {}",
                    scan.snapshot.values[smaller], scan.snapshot.values[larger]
                ),
                scan.extremes(),
                scan.snapshot.clone(),
            );
            2
        };

        while next + 1 < n {
            let (smaller, larger) = scan.order_pair(next, next + 1, &mut recorder);

            let (min_before, max_before) = (scan.snapshot.min_value, scan.snapshot.max_value);
            let small = scan.snapshot.values[smaller];
            let large = scan.snapshot.values[larger];
            let new_min = min_before.map_or(true, |m| small < m);
            let new_max = max_before.map_or(true, |m| large > m);
            if new_min {
                scan.set_min(smaller);
            }
            if new_max {
                scan.set_max(larger);
            }
            scan.snapshot.comparison_count += 1;

            let verdict = match (new_min, new_max) {
                (true, true) => "both extremes move",
                (true, false) => "new minimum",
                (false, true) => "new maximum",
                (false, false) => "extremes unchanged",
            };
            recorder.record(
                format!("Check {small} against the minimum and {large} against the maximum: {verdict}"),
                scan.extremes()
                    .with(Target::Index(smaller), MinMaxRole::Smaller)
                    .with(Target::Index(larger), MinMaxRole::Larger),
                scan.snapshot.clone(),
            );
            next += 2;
        }

        let snapshot = scan.snapshot;
        let mut highlights = Highlights::new();
        if let (Some(min_index), Some(max_index)) = (snapshot.min_index, snapshot.max_index) {
            highlights.push(Target::Index(min_index), MinMaxRole::Minimum);
            highlights.push(Target::Index(max_index), MinMaxRole::Maximum);
        }
        recorder.record(
            format!(
                "Done: min = {} at index {}, max = {} at index {} after {} comparisons",
                snapshot.min_value.unwrap_or_default(),
                snapshot.min_index.unwrap_or_default(),
                snapshot.max_value.unwrap_or_default(),
                snapshot.max_index.unwrap_or_default(),
                snapshot.comparison_count
            ),
            highlights,
            snapshot,
        );
        recorder.finish()
    }

    fn operate(&self, _params: &MinMaxParams, _store: &(), op: NoOperation) -> Transition<Self> {
        match op {}
    }
}
