//! `evtree`: incremental event tree builder with a consistency engine.
//!
//! An event tree starts at a single initiating event (the root), passes
//! through success/failure barriers, and terminates in outcomes. After every
//! structural or parameter edit the engine re-derives cumulative path
//! probability, path frequency, and monetary risk for the whole tree, so the
//! derived values are never out of step with the structure.
//!
//! Layering, outermost first: `cli` (arguments, dispatch, terminal output)
//! → `application` (persistence wire format, session file, rendering) →
//! `domain` (tree store and consistency engine, no I/O).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
