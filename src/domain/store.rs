//! In-memory tree store: the sole source of truth for the event tree.
//!
//! Holds the id→node mapping plus an incrementally maintained
//! parent→children index so that children lookups during recompute and
//! cascade delete are O(1) instead of a scan over all nodes. The store
//! performs existence bookkeeping only; all structural policy lives in
//! [`crate::domain::engine`].

use std::collections::{BTreeMap, HashMap};

use tracing::instrument;

use crate::domain::entities::{Node, NodeId, NodeKind};

#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    /// All nodes by id; BTreeMap for deterministic iteration order
    nodes: BTreeMap<NodeId, Node>,
    /// Parent id → child ids, kept in sync by insert/remove
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a plain collection of nodes, identifiers
    /// preserved exactly. Derived fields may be stale; the caller is
    /// expected to recompute before the tree is displayed.
    #[instrument(level = "debug", skip(nodes))]
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            store.insert(node);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Insert a node, indexing it under its parent. A node with an id that
    /// is already present replaces the previous entry.
    #[instrument(level = "trace", skip(self, node), fields(id = %node.id))]
    pub fn insert(&mut self, node: Node) {
        if let Some(previous) = self.nodes.get(&node.id) {
            let stale_parent = previous.parent.clone();
            self.unindex(&node.id, stale_parent.as_ref());
        }
        if let Some(parent) = &node.parent {
            self.children.entry(parent.clone()).or_default().push(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
    }

    /// Remove a node, unlinking it from the children index.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, id: &NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        self.unindex(id, node.parent.as_ref());
        self.children.remove(id);
        Some(node)
    }

    fn unindex(&mut self, id: &NodeId, parent: Option<&NodeId>) {
        if let Some(parent) = parent {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|c| c != id);
                if siblings.is_empty() {
                    self.children.remove(parent);
                }
            }
        }
    }

    /// Ids of the direct children of `id`, in insertion order.
    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All nodes whose kind is [`NodeKind::Root`]. A well-formed tree has
    /// exactly one; the engine turns other counts into an error.
    pub fn root_ids(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.kind == NodeKind::Root)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Iterate nodes in deterministic (id-sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Branch, Node, NodeId, NodeKind};

    fn child(id: &str, parent: &NodeId, branch: Branch) -> Node {
        Node {
            id: NodeId::from(id),
            name: id.to_string(),
            kind: NodeKind::Outcome,
            success_probability: 1.0,
            initiating_frequency: 0.0,
            cost: 0.0,
            parent: Some(parent.clone()),
            branch: Some(branch),
            path_probability: 0.0,
            path_frequency: 0.0,
            risk: 0.0,
        }
    }

    #[test]
    fn given_inserted_children_when_querying_index_then_both_are_listed() {
        let root = Node::new_root("root", 1.0);
        let root_id = root.id.clone();
        let mut store = TreeStore::new();
        store.insert(root);
        store.insert(child("aaaaaaaa", &root_id, Branch::Success));
        store.insert(child("bbbbbbbb", &root_id, Branch::Failure));

        let kids = store.children_of(&root_id);
        assert_eq!(kids.len(), 2);
        assert!(kids.contains(&NodeId::from("aaaaaaaa")));
        assert!(kids.contains(&NodeId::from("bbbbbbbb")));
    }

    #[test]
    fn given_removed_child_when_querying_index_then_it_is_unlinked() {
        let root = Node::new_root("root", 1.0);
        let root_id = root.id.clone();
        let mut store = TreeStore::new();
        store.insert(root);
        store.insert(child("aaaaaaaa", &root_id, Branch::Success));

        assert!(store.remove(&NodeId::from("aaaaaaaa")).is_some());
        assert!(store.children_of(&root_id).is_empty());
        assert!(!store.contains(&NodeId::from("aaaaaaaa")));
    }

    #[test]
    fn given_reinserted_node_when_indexing_then_no_duplicate_entry() {
        let root = Node::new_root("root", 1.0);
        let root_id = root.id.clone();
        let mut store = TreeStore::new();
        store.insert(root);
        let c = child("aaaaaaaa", &root_id, Branch::Success);
        store.insert(c.clone());
        store.insert(c);

        assert_eq!(store.children_of(&root_id).len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn given_rebuilt_store_when_querying_then_structure_matches() {
        let root = Node::new_root("root", 1.0);
        let root_id = root.id.clone();
        let nodes = vec![root, child("aaaaaaaa", &root_id, Branch::Success)];

        let store = TreeStore::from_nodes(nodes);
        assert_eq!(store.len(), 2);
        assert_eq!(store.root_ids(), vec![root_id.clone()]);
        assert_eq!(store.children_of(&root_id).len(), 1);
    }
}
