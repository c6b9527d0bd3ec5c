//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{Branch, NodeId};

/// Domain errors represent business logic violations.
///
/// Every failing engine operation rejects the mutation and leaves the store
/// unchanged; none of these conditions is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NotFound(NodeId),

    #[error("invalid operation on {id}: {reason}")]
    InvalidOperation { id: NodeId, reason: &'static str },

    #[error("structural violation: an outcome cannot be a parent ({0})")]
    OutcomeAsParent(NodeId),

    #[error("structural violation: the initiating event already has a child")]
    RootAlreadyBranched,

    #[error("structural violation: {branch} branch of {parent} is already occupied")]
    BranchOccupied { parent: NodeId, branch: Branch },

    #[error("invalid tree state: no root node present")]
    NoRoot,

    #[error("invalid tree state: {0} root nodes present")]
    MultipleRoots(usize),

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl DomainError {
    pub(crate) fn probability(field: &'static str, value: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        }
    }

    pub(crate) fn non_negative(field: &'static str, value: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min: 0.0,
            max: f64::INFINITY,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
