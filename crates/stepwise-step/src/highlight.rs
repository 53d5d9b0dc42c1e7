//! Highlight annotations attached to a step.
//!
//! The role vocabulary is a closed enum chosen by each visualizer, so a
//! renderer matches on it exhaustively instead of comparing strings.

use serde::{Deserialize, Serialize};

/// Address of an element in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at")]
pub enum Target {
    /// Array position
    Index(usize),
    /// Tree or list node id
    Node(u64),
    /// Table cell
    Cell { row: usize, col: usize },
    /// Graph vertex
    Vertex(usize),
    /// Key in a map or log
    Key(String),
}

/// A single `(target, role)` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight<R> {
    pub target: Target,
    pub role: R,
}

impl<R> Highlight<R> {
    pub fn new(target: Target, role: R) -> Self {
        Self { target, role }
    }
}

/// The annotations of one step, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Highlights<R>(Vec<Highlight<R>>);

impl<R> Default for Highlights<R> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<R> Highlights<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation.
    pub fn push(&mut self, target: Target, role: R) {
        self.0.push(Highlight::new(target, role));
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, target: Target, role: R) -> Self {
        self.push(target, role);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Highlight<R>> {
        self.0.iter()
    }

    /// Roles assigned to `target`, in insertion order.
    pub fn roles_of<'a>(&'a self, target: &'a Target) -> impl Iterator<Item = &'a R> + 'a {
        self.0
            .iter()
            .filter(move |h| &h.target == target)
            .map(|h| &h.role)
    }

    /// Targets carrying `role`.
    pub fn targets_with<'a>(&'a self, role: &'a R) -> impl Iterator<Item = &'a Target> + 'a
    where
        R: PartialEq,
    {
        self.0
            .iter()
            .filter(move |h| &h.role == role)
            .map(|h| &h.target)
    }
}

impl<R> From<Vec<Highlight<R>>> for Highlights<R> {
    fn from(highlights: Vec<Highlight<R>>) -> Self {
        Self(highlights)
    }
}

impl<R> FromIterator<Highlight<R>> for Highlights<R> {
    fn from_iter<I: IntoIterator<Item = Highlight<R>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a, R> IntoIterator for &'a Highlights<R> {
    type Item = &'a Highlight<R>;
    type IntoIter = std::slice::Iter<'a, Highlight<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    enum Role {
        Comparing,
        Pivot,
    }

    #[test]
    fn roles_are_looked_up_by_target() {
        let highlights = Highlights::new()
            .with(Target::Index(2), Role::Pivot)
            .with(Target::Index(4), Role::Comparing)
            .with(Target::Index(2), Role::Comparing);

        let roles: Vec<_> = highlights.roles_of(&Target::Index(2)).copied().collect();
        assert_eq!(roles, [Role::Pivot, Role::Comparing]);
        assert_eq!(highlights.roles_of(&Target::Index(9)).count(), 0);
    }

    #[test]
    fn targets_are_looked_up_by_role() {
        let highlights = Highlights::new()
            .with(Target::Vertex(1), Role::Comparing)
            .with(Target::Vertex(3), Role::Comparing)
            .with(Target::Vertex(2), Role::Pivot);

        let comparing: Vec<_> = highlights.targets_with(&Role::Comparing).cloned().collect();
        assert_eq!(comparing, [Target::Vertex(1), Target::Vertex(3)]);
    }

    #[test]
    fn target_serialization() {
        let json = serde_json::to_string(&Target::Cell { row: 1, col: 2 }).unwrap();
        assert!(json.contains("Cell"));
        let parsed: Target = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Target::Cell { row: 1, col: 2 });
    }
}
