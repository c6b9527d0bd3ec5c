//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/evtree/evtree.toml`
//! 3. Environment variables: `EVTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationResult;

/// User-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Session tree file used when `--file` is not given
    pub tree_file: PathBuf,
    /// Default display mode for `show` and `dot` (`--risk` also selects it)
    pub risk_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tree_file: PathBuf::from("eventtree.json"),
            risk_mode: false,
        }
    }
}

/// Path of the global config file, if a home directory can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "evtree").map(|dirs| dirs.config_dir().join("evtree.toml"))
}

impl Settings {
    /// Load settings with the standard layering.
    pub fn load() -> ApplicationResult<Self> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings with an explicit global config path (testable form).
    pub fn load_from(global: Option<&Path>) -> ApplicationResult<Self> {
        let mut builder = Config::builder()
            .set_default("tree_file", "eventtree.json")?
            .set_default("risk_mode", false)?;

        if let Some(path) = global {
            if path.exists() {
                builder = builder.add_source(File::from(path.to_path_buf()).required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("EVTREE").try_parsing(true));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Annotated template for `config init`.
    pub fn template() -> &'static str {
        r#"# evtree configuration
# Global location: $XDG_CONFIG_HOME/evtree/evtree.toml
# Every key can also be set via environment, e.g. EVTREE_TREE_FILE=...

# Session tree file used when --file is not given
tree_file = "eventtree.json"

# Show frequency/cost/risk labels by default instead of probabilities
risk_mode = false
"#
    }
}
