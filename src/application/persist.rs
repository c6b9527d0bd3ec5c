//! Persistence wire format: a JSON mapping from node identifier to record.
//!
//! The wire spellings are fixed: `type` is one of `"root" | "event" |
//! "outcome"` (`"event"` being the wire name of a barrier) and `branch` is
//! `"Success (Yes)" | "Failure (No)"` or null. Derived fields (`path_prob`,
//! `path_freq`, `risk`) travel on the wire for the benefit of external
//! readers but are ignored and overwritten by the recompute that follows
//! every import.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::{engine, Branch, Node, NodeId, NodeKind, TreeStore};

/// Node kind as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "root")]
    Root,
    #[serde(rename = "event")]
    Event,
    #[serde(rename = "outcome")]
    Outcome,
}

/// Branch label as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordBranch {
    #[serde(rename = "Success (Yes)")]
    Success,
    #[serde(rename = "Failure (No)")]
    Failure,
}

impl From<RecordBranch> for Branch {
    fn from(rb: RecordBranch) -> Self {
        match rb {
            RecordBranch::Success => Branch::Success,
            RecordBranch::Failure => Branch::Failure,
        }
    }
}

impl From<Branch> for RecordBranch {
    fn from(b: Branch) -> Self {
        match b {
            Branch::Success => RecordBranch::Success,
            Branch::Failure => RecordBranch::Failure,
        }
    }
}

fn default_one() -> f64 {
    1.0
}

/// One node as it appears on the wire. Missing numeric fields fall back to
/// the historical defaults (probability and frequency 1, everything else 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(default = "default_one")]
    pub prob: f64,
    #[serde(default = "default_one")]
    pub freq: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub path_prob: f64,
    #[serde(default)]
    pub path_freq: f64,
    #[serde(default)]
    pub risk: f64,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub branch: Option<RecordBranch>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            kind: match node.kind {
                NodeKind::Root => RecordKind::Root,
                NodeKind::Barrier => RecordKind::Event,
                NodeKind::Outcome => RecordKind::Outcome,
            },
            prob: node.success_probability,
            freq: node.initiating_frequency,
            cost: node.cost,
            path_prob: node.path_probability,
            path_freq: node.path_frequency,
            risk: node.risk,
            parent_id: node.parent.as_ref().map(|p| p.as_str().to_string()),
            branch: node.branch.map(RecordBranch::from),
        }
    }
}

impl NodeRecord {
    /// Materialize the record as a node under the given identifier.
    /// Derived fields are carried over as-is; they are stale until recompute.
    pub fn into_node(self, id: NodeId) -> Node {
        Node {
            id,
            name: self.name,
            kind: match self.kind {
                RecordKind::Root => NodeKind::Root,
                RecordKind::Event => NodeKind::Barrier,
                RecordKind::Outcome => NodeKind::Outcome,
            },
            success_probability: self.prob,
            initiating_frequency: self.freq,
            cost: self.cost,
            parent: self.parent_id.map(NodeId::from),
            branch: self.branch.map(Branch::from),
            path_probability: self.path_prob,
            path_frequency: self.path_freq,
            risk: self.risk,
        }
    }
}

/// Snapshot the store as an id→record mapping with stable key order.
pub fn to_records(store: &TreeStore) -> BTreeMap<String, NodeRecord> {
    store
        .iter()
        .map(|node| (node.id.as_str().to_string(), NodeRecord::from(node)))
        .collect()
}

/// Serialize the store to the canonical wire JSON.
#[instrument(level = "debug", skip(store))]
pub fn export_string(store: &TreeStore) -> ApplicationResult<String> {
    serde_json::to_string_pretty(&to_records(store))
        .map_err(|e| ApplicationError::malformed(format!("serialize: {e}")))
}

/// Parse wire JSON into a fully recomputed store.
///
/// Rejects payloads that are not a JSON object, records that do not parse,
/// mappings without exactly one root, and roots that carry a parent or
/// branch (a parented root would put a cycle in front of the recompute
/// traversal). On success the previous tree is
/// simply dropped by the caller; identifiers are preserved exactly.
#[instrument(level = "debug", skip(data))]
pub fn import_str(data: &str) -> ApplicationResult<TreeStore> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| ApplicationError::malformed(format!("{e}")))?;
    let Value::Object(map) = value else {
        return Err(ApplicationError::malformed(
            "payload is not a mapping of node records",
        ));
    };

    let mut nodes = Vec::with_capacity(map.len());
    for (id, record) in map {
        let record: NodeRecord = serde_json::from_value(record)
            .map_err(|e| ApplicationError::malformed(format!("node {id}: {e}")))?;
        if record.kind == RecordKind::Root && (record.parent_id.is_some() || record.branch.is_some())
        {
            return Err(ApplicationError::malformed(format!(
                "node {id}: root node must not carry a parent or branch"
            )));
        }
        nodes.push(record.into_node(NodeId::from(id)));
    }

    let roots = nodes.iter().filter(|n| n.kind == NodeKind::Root).count();
    match roots {
        1 => {}
        0 => return Err(ApplicationError::malformed("no root node in payload")),
        n => {
            return Err(ApplicationError::malformed(format!(
                "{n} root nodes in payload, expected exactly one"
            )))
        }
    }

    debug!("import: {} nodes", nodes.len());
    let mut store = TreeStore::from_nodes(nodes);
    engine::recompute(&mut store)?;
    Ok(store)
}
