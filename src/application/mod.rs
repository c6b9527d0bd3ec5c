//! Application layer: persistence, session file handling, rendering
//!
//! Wraps the domain layer for the CLI; all file and wire-format concerns
//! live here, never in `domain`.

pub mod error;
pub mod persist;
pub mod render;
pub mod session;

pub use error::{ApplicationError, ApplicationResult};
pub use render::DisplayMode;
