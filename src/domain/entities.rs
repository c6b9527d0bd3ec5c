//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque node identifier, assigned at creation and immutable.
///
/// Eight hex characters of a v4 UUID: short enough to type on the command
/// line, unique enough for trees of tens of nodes, and stable across
/// export/import (identifiers are preserved exactly on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role of a node in the event tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The single entry node: the initiating event and its occurrence frequency.
    Root,
    /// Intermediate node: a protective system with a probability of succeeding.
    Barrier,
    /// Terminal node: a consequence, carrying a cost.
    Outcome,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Root => write!(f, "root"),
            NodeKind::Barrier => write!(f, "barrier"),
            NodeKind::Outcome => write!(f, "outcome"),
        }
    }
}

/// Which of the parent's two outgoing edges a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Success,
    Failure,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Success => write!(f, "success"),
            Branch::Failure => write!(f, "failure"),
        }
    }
}

/// A node of the event tree.
///
/// The parameter fields are meaningful per kind: `success_probability` for
/// barriers, `initiating_frequency` for the root, `cost` for outcomes. The
/// remaining parameters stay at their defaults and do not participate in
/// recompute. The `path_*` and `risk` fields are derived: they are owned by
/// the recompute pass and never set directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Display label, mutable, non-unique
    pub name: String,
    pub kind: NodeKind,
    /// Probability that this barrier succeeds, in [0, 1] (barriers only)
    pub success_probability: f64,
    /// Occurrences of the initiating event per year, >= 0 (root only)
    pub initiating_frequency: f64,
    /// Consequence severity in money units, >= 0 (outcomes only)
    pub cost: f64,
    /// Ownership link to the parent node, `None` only for the root
    pub parent: Option<NodeId>,
    /// Edge occupied on the parent, `None` only for the root
    pub branch: Option<Branch>,
    /// Derived: probability of reaching this node from the root
    pub path_probability: f64,
    /// Derived: rate of reaching this node per year
    pub path_frequency: f64,
    /// Derived: `path_frequency * cost`
    pub risk: f64,
}

impl Node {
    /// Create the root node of a fresh tree with derived values already
    /// consistent (path probability 1, path frequency = initiating frequency).
    pub fn new_root(name: impl Into<String>, initiating_frequency: f64) -> Self {
        Self {
            id: NodeId::generate(),
            name: name.into(),
            kind: NodeKind::Root,
            success_probability: 1.0,
            initiating_frequency,
            cost: 0.0,
            parent: None,
            branch: None,
            path_probability: 1.0,
            path_frequency: initiating_frequency,
            risk: 0.0,
        }
    }
}

/// Payload for inserting a new node under an existing parent.
///
/// There is deliberately no root variant: a second root is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum NewNode {
    Barrier { name: String, success_probability: f64 },
    Outcome { name: String, cost: f64 },
}

impl NewNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            NewNode::Barrier { .. } => NodeKind::Barrier,
            NewNode::Outcome { .. } => NodeKind::Outcome,
        }
    }
}

/// Editable fields for an update; `None` leaves the field untouched.
///
/// `id`, `kind`, `parent`, and `branch` are not editable. Changing a
/// barrier into an outcome is delete + recreate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub name: Option<String>,
    pub success_probability: Option<f64>,
    pub initiating_frequency: Option<f64>,
    pub cost: Option<f64>,
}

impl NodeUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.success_probability.is_none()
            && self.initiating_frequency.is_none()
            && self.cost.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_short_and_unique() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_eq!(a.as_str().len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn new_root_is_self_consistent() {
        let root = Node::new_root("Fire Ignition", 2.0);
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.path_probability, 1.0);
        assert_eq!(root.path_frequency, 2.0);
        assert!(root.parent.is_none());
        assert!(root.branch.is_none());
    }
}
