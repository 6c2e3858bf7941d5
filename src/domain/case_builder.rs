//! Case building: expands the flat adjacency map into one nested tree per
//! root.
//!
//! Every `(root, from, to)` edge is expanded at most once. An edge is marked
//! before its target is descended into, so a cycle reached further down
//! cannot re-enter it. Depth is bounded by the number of distinct edges
//! reachable from the root, and the walk keeps its frontier on the heap.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::adjacency::AdjacencyAccumulator;
use crate::domain::case_file::{CaseFile, DependencyTree};
use crate::domain::record::NodeId;
use crate::domain::visitation::EdgeVisitationRecord;
use crate::ports::CycleReporter;

/// What to do after reporting a module that depends on itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelfLoopPolicy {
    /// Drop the self edge and keep expanding the remaining leads.
    #[default]
    SkipEdge,
    /// Stop expanding the module, discarding any leads after the self edge.
    /// Matches the output of older tracer versions.
    AbortNode,
}

/// A node being expanded, with its position in its dependency list.
struct Frame<'a> {
    node: &'a str,
    deps: &'a [NodeId],
    next: usize,
    tree: DependencyTree,
}

impl<'a> Frame<'a> {
    fn new(node: &'a str, deps: &'a [NodeId]) -> Self {
        Self {
            node,
            deps,
            next: 0,
            tree: DependencyTree::new(),
        }
    }
}

pub struct CaseBuilder<'a> {
    adjacency: &'a AdjacencyAccumulator,
    visited: EdgeVisitationRecord<'a>,
    reporter: &'a dyn CycleReporter,
    policy: SelfLoopPolicy,
}

impl<'a> CaseBuilder<'a> {
    pub fn new(adjacency: &'a AdjacencyAccumulator, reporter: &'a dyn CycleReporter) -> Self {
        Self {
            adjacency,
            visited: EdgeVisitationRecord::new(),
            reporter,
            policy: SelfLoopPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelfLoopPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn visited(&self) -> &EdgeVisitationRecord<'a> {
        &self.visited
    }

    /// Builds one tree per root, in the given order.
    pub fn build_case_file(&mut self, roots: &'a [NodeId]) -> CaseFile {
        let mut case_file = CaseFile::new();
        for root in roots {
            let tree = self.build_tree(root, root);
            debug!(
                root = %root,
                entries = tree.node_count(),
                visited_edges = self.visited.len(),
                "built dependency tree"
            );
            case_file.insert(root.clone(), tree);
        }
        case_file
    }

    /// Expands `node` under `root`. The top-level call is
    /// `build_tree(root, root)`.
    pub fn build_tree(&mut self, node: &str, root: &'a str) -> DependencyTree {
        let adjacency = self.adjacency;
        let Some((node, deps)) = adjacency.flat_map().get_key_value(node) else {
            return DependencyTree::new();
        };

        let mut stack = vec![Frame::new(node, deps)];
        loop {
            let Some(frame) = stack.last_mut() else {
                return DependencyTree::new();
            };

            if frame.next >= frame.deps.len() {
                let Some(finished) = stack.pop() else {
                    return DependencyTree::new();
                };
                match stack.last_mut() {
                    // Dependency lists are duplicate-free, so a child is
                    // attached to its parent at most once.
                    Some(parent) => parent.tree.attach(finished.node.to_string(), finished.tree),
                    None => return finished.tree,
                }
                continue;
            }

            let from = frame.node;
            let deps = frame.deps;
            let dep: &'a str = deps[frame.next].as_str();
            frame.next += 1;

            if self.visited.has_visited(root, from, dep) {
                continue;
            }
            self.visited.mark_visited(root, from, dep);

            if dep == from {
                self.reporter.self_reference(from, dep);
                if self.policy == SelfLoopPolicy::AbortNode {
                    frame.next = frame.deps.len();
                }
                continue;
            }

            stack.push(Frame::new(dep, adjacency.dependencies(dep)));
        }
    }
}
