//! Consistency engine: the operations that keep derived values in step with
//! the tree structure.
//!
//! All operations take the store by reference; there is no ambient session
//! state. Each operation validates fully before mutating, so a failed call
//! leaves the store exactly as it was, and each mutating operation ends with
//! a full recompute so no caller ever observes a partially updated tree.

use std::collections::VecDeque;

use tracing::{debug, instrument};

use crate::domain::entities::{Branch, NewNode, Node, NodeId, NodeKind, NodeUpdate};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::store::TreeStore;

/// Name given to the root of a freshly initialized tree.
pub const DEFAULT_ROOT_NAME: &str = "Initiating Event";

/// Create a fresh store containing exactly one root node with
/// `initiating_frequency = 1` and consistent derived values.
#[instrument(level = "debug")]
pub fn initialize() -> TreeStore {
    let mut store = TreeStore::new();
    store.insert(Node::new_root(DEFAULT_ROOT_NAME, 1.0));
    store
}

/// Probability of the edge leading from `parent` to a child on `branch`.
///
/// Edges out of the root carry probability 1 regardless of branch. For a
/// barrier, the success branch carries the barrier's success probability and
/// the failure branch its complement; a missing branch (possible only in
/// imported data) is treated as failure.
pub fn edge_probability(parent: &Node, branch: Option<Branch>) -> f64 {
    match (parent.kind, branch) {
        (NodeKind::Root, _) => 1.0,
        (_, Some(Branch::Success)) => parent.success_probability,
        (_, Some(Branch::Failure)) | (_, None) => 1.0 - parent.success_probability,
    }
}

/// Insert a new node as a leaf under `parent_id` on `branch`, then recompute.
///
/// Returns the identifier of the new node.
#[instrument(level = "debug", skip(store))]
pub fn insert(
    store: &mut TreeStore,
    parent_id: &NodeId,
    branch: Branch,
    new: NewNode,
) -> DomainResult<NodeId> {
    let parent = store
        .get(parent_id)
        .ok_or_else(|| DomainError::NotFound(parent_id.clone()))?;

    match parent.kind {
        NodeKind::Outcome => return Err(DomainError::OutcomeAsParent(parent_id.clone())),
        NodeKind::Root if !store.children_of(parent_id).is_empty() => {
            return Err(DomainError::RootAlreadyBranched);
        }
        _ => {}
    }

    let occupied = store
        .children_of(parent_id)
        .iter()
        .filter_map(|c| store.get(c))
        .any(|sibling| sibling.branch == Some(branch));
    if occupied {
        return Err(DomainError::BranchOccupied {
            parent: parent_id.clone(),
            branch,
        });
    }

    let node = match new {
        NewNode::Barrier {
            name,
            success_probability,
        } => {
            if !(0.0..=1.0).contains(&success_probability) {
                return Err(DomainError::probability(
                    "success_probability",
                    success_probability,
                ));
            }
            Node {
                id: NodeId::generate(),
                name,
                kind: NodeKind::Barrier,
                success_probability,
                initiating_frequency: 0.0,
                cost: 0.0,
                parent: Some(parent_id.clone()),
                branch: Some(branch),
                path_probability: 0.0,
                path_frequency: 0.0,
                risk: 0.0,
            }
        }
        NewNode::Outcome { name, cost } => {
            if !cost.is_finite() || cost < 0.0 {
                return Err(DomainError::non_negative("cost", cost));
            }
            Node {
                id: NodeId::generate(),
                name,
                kind: NodeKind::Outcome,
                success_probability: 1.0,
                initiating_frequency: 0.0,
                cost,
                parent: Some(parent_id.clone()),
                branch: Some(branch),
                path_probability: 0.0,
                path_frequency: 0.0,
                risk: 0.0,
            }
        }
    };

    let id = node.id.clone();
    debug!("insert: {} {} under {} on {}", node.kind, id, parent_id, branch);
    store.insert(node);
    recompute(store)?;
    Ok(id)
}

/// Mutate editable fields of an existing node, then recompute.
///
/// Structural links (`id`, `kind`, `parent`, `branch`) are not editable.
/// Fields that do not apply to the node's kind are rejected before anything
/// is written.
#[instrument(level = "debug", skip(store))]
pub fn update(store: &mut TreeStore, id: &NodeId, update: NodeUpdate) -> DomainResult<()> {
    let node = store.get(id).ok_or_else(|| DomainError::NotFound(id.clone()))?;

    if let Some(p) = update.success_probability {
        if node.kind != NodeKind::Barrier {
            return Err(DomainError::InvalidOperation {
                id: id.clone(),
                reason: "success probability applies to barriers only",
            });
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(DomainError::probability("success_probability", p));
        }
    }
    if let Some(f) = update.initiating_frequency {
        if node.kind != NodeKind::Root {
            return Err(DomainError::InvalidOperation {
                id: id.clone(),
                reason: "initiating frequency applies to the root only",
            });
        }
        if !f.is_finite() || f < 0.0 {
            return Err(DomainError::non_negative("initiating_frequency", f));
        }
    }
    if let Some(c) = update.cost {
        if node.kind != NodeKind::Outcome {
            return Err(DomainError::InvalidOperation {
                id: id.clone(),
                reason: "cost applies to outcomes only",
            });
        }
        if !c.is_finite() || c < 0.0 {
            return Err(DomainError::non_negative("cost", c));
        }
    }

    // Validation done; apply all fields.
    let node = store
        .get_mut(id)
        .ok_or_else(|| DomainError::NotFound(id.clone()))?;
    if let Some(name) = update.name {
        node.name = name;
    }
    if let Some(p) = update.success_probability {
        node.success_probability = p;
    }
    if let Some(f) = update.initiating_frequency {
        node.initiating_frequency = f;
    }
    if let Some(c) = update.cost {
        node.cost = c;
    }

    recompute(store)
}

/// Remove `id` and every descendant, then recompute.
///
/// Returns the number of nodes removed. The root cannot be deleted.
#[instrument(level = "debug", skip(store))]
pub fn delete_subtree(store: &mut TreeStore, id: &NodeId) -> DomainResult<usize> {
    let node = store.get(id).ok_or_else(|| DomainError::NotFound(id.clone()))?;
    if node.kind == NodeKind::Root {
        return Err(DomainError::InvalidOperation {
            id: id.clone(),
            reason: "the initiating event cannot be deleted",
        });
    }

    // Descendant closure of id (inclusive), breadth-first.
    let mut doomed = Vec::new();
    let mut queue = VecDeque::from([id.clone()]);
    while let Some(current) = queue.pop_front() {
        queue.extend(store.children_of(&current).iter().cloned());
        doomed.push(current);
    }

    debug!("delete_subtree: removing {} nodes under {}", doomed.len(), id);
    for target in &doomed {
        store.remove(target);
    }

    recompute(store)?;
    Ok(doomed.len())
}

/// Re-derive `path_probability`, `path_frequency`, and `risk` for every
/// reachable node, breadth-first from the unique root.
///
/// Idempotent: with no intervening mutation a second call reproduces
/// bit-identical derived values. Sibling order is irrelevant since each
/// child's values depend only on its parent.
#[instrument(level = "debug", skip(store))]
pub fn recompute(store: &mut TreeStore) -> DomainResult<()> {
    let roots = store.root_ids();
    let root_id = match roots.as_slice() {
        [only] => only.clone(),
        [] => return Err(DomainError::NoRoot),
        many => return Err(DomainError::MultipleRoots(many.len())),
    };

    let Some(root) = store.get_mut(&root_id) else {
        return Err(DomainError::NoRoot);
    };
    root.path_probability = 1.0;
    root.path_frequency = root.initiating_frequency;
    root.risk = 0.0;

    let mut queue = VecDeque::from([root_id]);
    while let Some(current_id) = queue.pop_front() {
        let Some(current) = store.get(&current_id) else {
            continue;
        };
        // Snapshot of the fields a child's computation depends on; the
        // parent relation is acyclic, so each node is visited exactly once.
        let parent = current.clone();
        let child_ids: Vec<NodeId> = store.children_of(&current_id).to_vec();

        for child_id in child_ids {
            if let Some(child) = store.get_mut(&child_id) {
                let edge = edge_probability(&parent, child.branch);
                child.path_probability = parent.path_probability * edge;
                child.path_frequency = parent.path_frequency * edge;
                child.risk = child.path_frequency * child.cost;
                queue.push_back(child_id);
            }
        }
    }

    Ok(())
}
