//! Edge visitation record.
//!
//! Remembers which `(root, from, to)` edges have already been expanded during
//! one run. Keys are scoped per root, so a shared sub-module is expanded in
//! full under every root that reaches it.

use std::collections::HashSet;

/// Edge keys borrow their ids from the adjacency map being expanded.
#[derive(Debug, Default)]
pub struct EdgeVisitationRecord<'a> {
    visited: HashSet<(&'a str, &'a str, &'a str)>,
}

impl<'a> EdgeVisitationRecord<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_visited(&self, root: &'a str, from: &'a str, to: &'a str) -> bool {
        self.visited.contains(&(root, from, to))
    }

    /// Stores the edge. Marking an edge twice is a no-op.
    pub fn mark_visited(&mut self, root: &'a str, from: &'a str, to: &'a str) {
        self.visited.insert((root, from, to));
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
