//! Session file handling
//!
//! The CLI keeps the tree between invocations in a single JSON file in the
//! wire format. Every command loads it, applies one engine operation, and
//! saves it back; there is no other session state.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, instrument};

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::persist;
use crate::domain::TreeStore;

/// Load and recompute the tree from `path`.
///
/// A missing file gets a dedicated message pointing at `init` instead of a
/// bare ENOENT.
#[instrument(level = "debug")]
pub fn load(path: &Path) -> ApplicationResult<TreeStore> {
    let data = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ApplicationError::io(
                format!(
                    "no tree file at {} (run `evtree init` to create one)",
                    path.display()
                ),
                e,
            )
        } else {
            ApplicationError::io(format!("reading {}", path.display()), e)
        }
    })?;
    let store = persist::import_str(&data)?;
    debug!("loaded {} nodes from {}", store.len(), path.display());
    Ok(store)
}

/// Write the tree to `path` in the canonical wire JSON.
#[instrument(level = "debug", skip(store))]
pub fn save(path: &Path, store: &TreeStore) -> ApplicationResult<()> {
    let data = persist::export_string(store)?;
    fs::write(path, data).map_err(|e| ApplicationError::io(format!("writing {}", path.display()), e))
}
