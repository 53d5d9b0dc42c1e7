//! Hamiltonian path search by depth-first backtracking.
//!
//! Graphs without a path can force the search through every ordering of
//! their vertices, so a run stops after [`STEP_BUDGET`] steps.

use serde::{Deserialize, Serialize};
use stepwise_step::{
    Highlight, Highlights, NoOperation, Producer, Step, StepRecorder, Target, Transition,
};

use crate::STEP_BUDGET;

/// Largest graph the search accepts.
pub const MAX_VERTICES: usize = 12;

/// Undirected graph and starting vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HamiltonianParams {
    pub vertex_count: usize,
    pub edges: Vec<(usize, usize)>,
    pub start: usize,
}

impl Default for HamiltonianParams {
    fn default() -> Self {
        Self {
            vertex_count: 5,
            edges: vec![(0, 1), (0, 3), (1, 2), (1, 3), (1, 4), (2, 4), (3, 4)],
            start: 0,
        }
    }
}

impl HamiltonianParams {
    fn is_valid(&self) -> bool {
        let n = self.vertex_count;
        (1..=MAX_VERTICES).contains(&n)
            && self.start < n
            && self.edges.iter().all(|&(a, b)| a < n && b < n)
    }

    /// Sorted, deduplicated neighbours of every vertex. Self-loops dropped.
    fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.vertex_count];
        for &(a, b) in &self.edges {
            if a != b {
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }
        for neighbours in &mut adjacency {
            neighbours.sort_unstable();
            neighbours.dedup();
        }
        adjacency
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HamiltonianSnapshot {
    pub vertex_count: usize,
    pub edges: Vec<(usize, usize)>,
    pub path: Vec<usize>,
    pub visited: Vec<bool>,
    pub backtracks: usize,
    pub found: bool,
    /// The search hit the step budget before finishing
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HamiltonianRole {
    /// Vertex at the end of the path
    Current,
    /// Neighbour about to be tried
    Candidate,
    /// Vertex already on the path
    OnPath,
    /// Neighbour skipped because it is already on the path
    Rejected,
    /// Vertex just removed from the path
    Backtracked,
    /// Vertex of the finished path
    Solution,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hamiltonian;

struct Walk {
    adjacency: Vec<Vec<usize>>,
    snapshot: HamiltonianSnapshot,
}

impl Walk {
    fn path_highlights(&self) -> Highlights<HamiltonianRole> {
        let path = &self.snapshot.path;
        let mut highlights: Highlights<HamiltonianRole> = path
            .iter()
            .take(path.len().saturating_sub(1))
            .map(|&v| Highlight::new(Target::Vertex(v), HamiltonianRole::OnPath))
            .collect();
        if let Some(&end) = path.last() {
            highlights.push(Target::Vertex(end), HamiltonianRole::Current);
        }
        highlights
    }

    fn enter(&mut self, vertex: usize) {
        self.snapshot.path.push(vertex);
        self.snapshot.visited[vertex] = true;
    }

    fn leave(&mut self, vertex: usize) {
        self.snapshot.path.pop();
        self.snapshot.visited[vertex] = false;
        self.snapshot.backtracks += 1;
    }

    fn out_of_budget(
        &mut self,
        recorder: &StepRecorder<HamiltonianSnapshot, HamiltonianRole>,
    ) -> bool {
        if recorder.len() >= STEP_BUDGET {
            self.snapshot.truncated = true;
        }
        self.snapshot.truncated
    }

    /// Extend the path from its last vertex; `true` once every vertex is on
    /// it or the step budget is spent.
    fn extend(
        &mut self,
        vertex: usize,
        recorder: &mut StepRecorder<HamiltonianSnapshot, HamiltonianRole>,
    ) -> bool {
        if self.out_of_budget(recorder) {
            return true;
        }
        let total = self.snapshot.vertex_count;
        recorder.record(
            format!(
                "At vertex {vertex}, path length {} of {total}",
                self.snapshot.path.len()
            ),
            self.path_highlights(),
            self.snapshot.clone(),
        );
        if self.snapshot.path.len() == total {
            self.snapshot.found = true;
            return true;
        }

        for next in self.adjacency[vertex].clone() {
            if self.out_of_budget(recorder) {
                return true;
            }
            if self.snapshot.visited[next] {
                recorder.record(
                    format!("Vertex {next} is already on the path"),
                    self.path_highlights()
                        .with(Target::Vertex(next), HamiltonianRole::Rejected),
                    self.snapshot.clone(),
                );
                continue;
            }
            recorder.record(
                format!("Try edge {vertex} - {next}"),
                self.path_highlights()
                    .with(Target::Vertex(next), HamiltonianRole::Candidate),
                self.snapshot.clone(),
            );
            self.enter(next);
            if self.extend(next, recorder) {
                return true;
            }
            self.leave(next);
            if self.out_of_budget(recorder) {
                return true;
            }
            recorder.record(
                format!("Dead end through {next}, back to {vertex}"),
                self.path_highlights()
                    .with(Target::Vertex(next), HamiltonianRole::Backtracked),
                self.snapshot.clone(),
            );
        }
        false
    }
}

impl Producer for Hamiltonian {
    type Params = HamiltonianParams;
    type Store = ();
    type Op = NoOperation;
    type Snapshot = HamiltonianSnapshot;
    type Role = HamiltonianRole;

    fn produce(
        &self,
        params: &HamiltonianParams,
        _store: &(),
    ) -> Vec<Step<HamiltonianSnapshot, HamiltonianRole>> {
        if !params.is_valid() {
            return vec![Step::idle()];
        }

        let mut walk = Walk {
            adjacency: params.adjacency(),
            snapshot: HamiltonianSnapshot {
                vertex_count: params.vertex_count,
                edges: params.edges.clone(),
                visited: vec![false; params.vertex_count],
                ..HamiltonianSnapshot::default()
            },
        };
        let mut recorder = StepRecorder::new();
        walk.enter(params.start);
        walk.extend(params.start, &mut recorder);

        let snapshot = walk.snapshot;
        if snapshot.found {
            let route = snapshot
                .path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            let highlights: Highlights<HamiltonianRole> = snapshot
                .path
                .iter()
                .map(|&v| Highlight::new(Target::Vertex(v), HamiltonianRole::Solution))
                .collect();
            recorder.record(format!("Hamiltonian path found: {route}"), highlights, snapshot);
        } else if snapshot.truncated {
            recorder.narrate(
                format!(
                    "Search stopped after {STEP_BUDGET} steps without a path from vertex {}",
                    params.start
                ),
                snapshot,
            );
        } else {
            recorder.narrate(
                format!("No Hamiltonian path starts at vertex {}", params.start),
                snapshot,
            );
        }
        recorder.finish()
    }

    fn operate(&self, _params: &HamiltonianParams, _store: &(), op: NoOperation) -> Transition<Self> {
        match op {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_path_in_default_graph() {
        let steps = Hamiltonian.produce(&HamiltonianParams::default(), &());
        let last = steps.last().unwrap();

        assert!(last.state().found);
        assert_eq!(last.state().path, vec![0, 1, 2, 4, 3]);
        assert_eq!(
            last.highlights()
                .targets_with(&HamiltonianRole::Solution)
                .count(),
            5
        );
        assert!(last.message().contains("0 -> 1 -> 2 -> 4 -> 3"));
    }

    #[test]
    fn stops_after_first_success() {
        // Complete graph on four vertices: the first path tried succeeds.
        let params = HamiltonianParams {
            vertex_count: 4,
            edges: vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)],
            start: 0,
        };
        let steps = Hamiltonian.produce(&params, &());
        let last = steps.last().unwrap().state();
        assert_eq!(last.path, vec![0, 1, 2, 3]);
        assert_eq!(last.backtracks, 0);
        assert!(steps
            .iter()
            .all(|s| s.highlights().targets_with(&HamiltonianRole::Backtracked).count() == 0));
    }

    #[test]
    fn reports_missing_path() {
        // Star: the centre is needed twice.
        let params = HamiltonianParams {
            vertex_count: 4,
            edges: vec![(0, 1), (0, 2), (0, 3)],
            start: 1,
        };
        let steps = Hamiltonian.produce(&params, &());
        let last = steps.last().unwrap();
        assert!(!last.state().found);
        assert!(last.state().backtracks > 0);
        assert!(last.message().starts_with("No Hamiltonian path"));
        assert_eq!(last.state().path, vec![1]);
    }

    #[test]
    fn pathless_graph_at_the_size_cap_is_truncated() {
        // Complete graph on all but one vertex; the last vertex is isolated.
        let n = MAX_VERTICES;
        let edges = (0..n - 1)
            .flat_map(|a| (a + 1..n - 1).map(move |b| (a, b)))
            .collect();
        let params = HamiltonianParams {
            vertex_count: n,
            edges,
            start: 0,
        };
        let steps = Hamiltonian.produce(&params, &());
        let last = steps.last().unwrap();

        assert!(steps.len() <= STEP_BUDGET + 2);
        assert!(last.state().truncated);
        assert!(!last.state().found);
        assert!(last.message().starts_with("Search stopped"));
    }

    #[test]
    fn single_vertex_is_its_own_path() {
        let params = HamiltonianParams {
            vertex_count: 1,
            edges: vec![],
            start: 0,
        };
        let last = Hamiltonian.produce(&params, &()).pop().unwrap();
        assert!(last.state().found);
        assert_eq!(last.state().path, vec![0]);
    }

    #[test]
    fn invalid_graphs_produce_idle_step() {
        let bad_edge = HamiltonianParams {
            edges: vec![(0, 9)],
            ..HamiltonianParams::default()
        };
        let bad_start = HamiltonianParams {
            start: 5,
            ..HamiltonianParams::default()
        };
        let empty = HamiltonianParams {
            vertex_count: 0,
            edges: vec![],
            start: 0,
        };
        let huge = HamiltonianParams {
            vertex_count: MAX_VERTICES + 1,
            ..HamiltonianParams::default()
        };
        for params in [bad_edge, bad_start, empty, huge] {
            let steps = Hamiltonian.produce(&params, &());
            assert_eq!(steps.len(), 1, "{params:?}");
            assert!(steps[0].is_idle(), "{params:?}");
        }
    }

    #[test]
    fn duplicate_edges_and_self_loops_are_ignored() {
        let params = HamiltonianParams {
            vertex_count: 3,
            edges: vec![(0, 1), (1, 0), (1, 1), (1, 2)],
            start: 0,
        };
        let adjacency = params.adjacency();
        assert_eq!(adjacency[1], vec![0, 2]);
        let last = Hamiltonian.produce(&params, &()).pop().unwrap();
        assert_eq!(last.state().path, vec![0, 1, 2]);
    }
}
