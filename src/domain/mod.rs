//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod engine;
pub mod entities;
pub mod error;
pub mod store;

pub use entities::{Branch, NewNode, Node, NodeId, NodeKind, NodeUpdate};
pub use error::{DomainError, DomainResult};
pub use store::TreeStore;
