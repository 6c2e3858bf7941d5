//! Nested dependency trees and the aggregate case file.
//!
//! Both types keep insertion order and serialise as JSON objects:
//!
//! ```text
//! {
//!   "/path/to/src/main.js": {
//!     "/path/to/src/deferred.js": {}
//!   }
//! }
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::record::NodeId;

/// Ordered mapping from a dependency to its expanded sub-tree. Leaves and
/// cut-off cycle points are empty trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTree {
    children: Vec<(NodeId, DependencyTree)>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `subtree` under `dep`, replacing an existing entry in place.
    pub fn insert(&mut self, dep: NodeId, subtree: DependencyTree) {
        match self.children.iter_mut().find(|(id, _)| *id == dep) {
            Some((_, existing)) => *existing = subtree,
            None => self.children.push((dep, subtree)),
        }
    }

    /// Appends `subtree` under `dep` without looking for an existing entry.
    /// The caller guarantees `dep` is not already a child.
    pub(crate) fn attach(&mut self, dep: NodeId, subtree: DependencyTree) {
        self.children.push((dep, subtree));
    }

    pub fn get(&self, dep: &str) -> Option<&DependencyTree> {
        self.children
            .iter()
            .find(|(id, _)| id == dep)
            .map(|(_, tree)| tree)
    }

    pub fn contains(&self, dep: &str) -> bool {
        self.get(dep).is_some()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &DependencyTree)> {
        self.children.iter().map(|(id, tree)| (id, tree))
    }

    /// Longest chain of nested entries below this tree.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(&DependencyTree, usize)> = vec![(self, 0)];
        while let Some((tree, depth)) = stack.pop() {
            max = max.max(depth);
            for (_, child) in &tree.children {
                stack.push((child, depth + 1));
            }
        }
        max
    }

    /// Total number of entries at every level.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&DependencyTree> = vec![self];
        while let Some(tree) = stack.pop() {
            count += tree.children.len();
            stack.extend(tree.children.iter().map(|(_, child)| child));
        }
        count
    }
}

// Long dependency chains nest thousands of levels deep; the derived drop
// would recurse once per level.
impl Drop for DependencyTree {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some((_, mut child)) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

// Serializers call back into this impl once per level. Each level checks the
// remaining stack and moves onto a fresh heap segment when it runs low.
const SERIALIZE_RED_ZONE: usize = 64 * 1024;
const SERIALIZE_STACK_SEGMENT: usize = 1024 * 1024;

impl Serialize for DependencyTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        stacker::maybe_grow(SERIALIZE_RED_ZONE, SERIALIZE_STACK_SEGMENT, || {
            let mut map = serializer.serialize_map(Some(self.children.len()))?;
            for (id, tree) in &self.children {
                map.serialize_entry(id, tree)?;
            }
            map.end()
        })
    }
}

/// One dependency tree per root, in root order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFile {
    trees: Vec<(NodeId, DependencyTree)>,
}

impl CaseFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, root: NodeId, tree: DependencyTree) {
        match self.trees.iter_mut().find(|(id, _)| *id == root) {
            Some((_, existing)) => *existing = tree,
            None => self.trees.push((root, tree)),
        }
    }

    pub fn get(&self, root: &str) -> Option<&DependencyTree> {
        self.trees
            .iter()
            .find(|(id, _)| id == root)
            .map(|(_, tree)| tree)
    }

    pub fn roots(&self) -> impl Iterator<Item = &NodeId> {
        self.trees.iter().map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &DependencyTree)> {
        self.trees.iter().map(|(id, tree)| (id, tree))
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl Serialize for CaseFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.trees.len()))?;
        for (root, tree) in &self.trees {
            map.serialize_entry(root, tree)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain(ids: &[&str]) -> DependencyTree {
        let mut tree = DependencyTree::new();
        for id in ids.iter().rev() {
            let mut parent = DependencyTree::new();
            parent.insert(id.to_string(), tree);
            tree = parent;
        }
        tree
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let mut tree = DependencyTree::new();
        tree.insert("z".to_string(), DependencyTree::new());
        tree.insert("a".to_string(), chain(&["b"]));

        let text = serde_json::to_string(&tree).unwrap();
        assert_eq!(text, r#"{"z":{},"a":{"b":{}}}"#);
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let mut tree = DependencyTree::new();
        tree.insert("a".to_string(), DependencyTree::new());
        tree.insert("a".to_string(), chain(&["b"]));

        assert_eq!(tree.len(), 1);
        assert!(tree.get("a").unwrap().contains("b"));
    }

    #[test]
    fn test_depth_and_count() {
        let tree = chain(&["a", "b", "c"]);
        assert!(tree.get("a").unwrap().get("b").unwrap().contains("c"));
        assert!(tree.get("a").unwrap().get("c").is_none());
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_attach_appends_in_order() {
        let mut tree = DependencyTree::new();
        tree.attach("b".to_string(), DependencyTree::new());
        tree.attach("a".to_string(), chain(&["c"]));
        assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"b":{},"a":{"c":{}}}"#);
    }

    #[test]
    fn test_deep_tree_drops_without_overflow() {
        let mut tree = DependencyTree::new();
        for i in 0..200_000 {
            let mut parent = DependencyTree::new();
            parent.insert(format!("n{}", i), tree);
            tree = parent;
        }
        assert_eq!(tree.depth(), 200_000);
        drop(tree);
    }

    #[test]
    fn test_deep_tree_serializes_without_overflow() {
        let n = 50_000;
        let mut tree = DependencyTree::new();
        for _ in 0..n {
            let mut parent = DependencyTree::new();
            parent.insert("n".to_string(), tree);
            tree = parent;
        }

        let compact = serde_json::to_string(&tree).unwrap();
        assert!(compact.starts_with(r#"{"n":{"n":"#));
        assert_eq!(compact.matches('{').count(), n + 1);
        assert_eq!(compact.matches('}').count(), n + 1);
    }

    #[test]
    fn test_case_file_serializes_per_root() {
        let mut case_file = CaseFile::new();
        case_file.insert("main".to_string(), chain(&["util"]));
        case_file.insert("worker".to_string(), DependencyTree::new());

        assert_eq!(
            serde_json::to_value(&case_file).unwrap(),
            json!({ "main": { "util": {} }, "worker": {} })
        );
        assert_eq!(case_file.roots().count(), 2);
    }

    #[test]
    fn test_empty_case_file_is_empty_object() {
        let case_file = CaseFile::new();
        assert!(case_file.is_empty());
        assert_eq!(serde_json::to_string(&case_file).unwrap(), "{}");
    }
}
