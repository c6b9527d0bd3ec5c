//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::Branch;

/// Event tree builder: barriers, outcomes, and consistent path probability, frequency, and risk
#[derive(Parser, Debug)]
#[command(name = "evtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Session tree file (default from config)
    #[arg(short = 'f', long, global = true, env = "EVTREE_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which of the parent's edges the new node occupies.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BranchArg {
    Success,
    Failure,
}

impl From<BranchArg> for Branch {
    fn from(b: BranchArg) -> Self {
        match b {
            BranchArg::Success => Branch::Success,
            BranchArg::Failure => Branch::Failure,
        }
    }
}

/// Kind of node to insert. The root exists from `init` on and cannot be added.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Barrier,
    Outcome,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new tree file with a fresh initiating event
    Init {
        /// Name of the initiating event
        name: Option<String>,

        /// Occurrences of the initiating event per year
        #[arg(long, default_value_t = 1.0)]
        freq: f64,

        /// Overwrite an existing tree file
        #[arg(long)]
        force: bool,
    },

    /// Add a barrier or outcome under an existing node
    Add {
        /// Display name of the new node
        name: String,

        /// Parent node id
        #[arg(short, long)]
        parent: String,

        /// Branch of the parent to occupy
        #[arg(short, long, value_enum)]
        branch: BranchArg,

        /// What to insert
        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Success probability in [0, 1] (barriers; default 0.9)
        #[arg(long)]
        prob: Option<f64>,

        /// Consequence cost (outcomes; default 0)
        #[arg(long)]
        cost: Option<f64>,
    },

    /// Edit fields of an existing node
    Set {
        /// Node id
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New success probability (barriers only)
        #[arg(long)]
        prob: Option<f64>,

        /// New initiating frequency (root only)
        #[arg(long)]
        freq: Option<f64>,

        /// New consequence cost (outcomes only)
        #[arg(long)]
        cost: Option<f64>,
    },

    /// Delete a node and its whole subtree
    Rm {
        /// Node id
        id: String,
    },

    /// Show the tree in the terminal
    Show {
        /// Show frequency, cost, and risk instead of probabilities
        #[arg(long)]
        risk: bool,
    },

    /// Emit Graphviz DOT source for the tree
    Dot {
        /// Show frequency, cost, and risk instead of probabilities
        #[arg(long)]
        risk: bool,

        /// Write to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// List all nodes with parameters and derived values
    Nodes,

    /// Write the tree as wire JSON
    Export {
        /// Write to a file instead of stdout
        output: Option<PathBuf>,
    },

    /// Replace the session tree from a wire JSON file
    Import {
        /// File to import
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init,

    /// Show config path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
