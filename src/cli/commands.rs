use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::render::{format_money, to_dot, to_text_tree};
use crate::application::{persist, session, ApplicationError, DisplayMode};
use crate::cli::args::{Cli, Commands, ConfigCommands, KindArg};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{engine, Branch, DomainError, NewNode, NodeId, NodeKind, NodeUpdate, TreeStore};

/// Slider default of the original builder; used when `add --kind barrier`
/// is called without `--prob`.
const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.9;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load()?;
    let file = cli.file.clone().unwrap_or_else(|| settings.tree_file.clone());
    debug!("session file: {}", file.display());

    match &cli.command {
        Commands::Init { name, freq, force } => _init(&file, name.as_deref(), *freq, *force, &settings),
        Commands::Add {
            name,
            parent,
            branch,
            kind,
            prob,
            cost,
        } => _add(&file, name, parent, (*branch).into(), *kind, *prob, *cost, &settings),
        Commands::Set {
            id,
            name,
            prob,
            freq,
            cost,
        } => _set(&file, id, name.clone(), *prob, *freq, *cost, &settings),
        Commands::Rm { id } => _rm(&file, id, &settings),
        Commands::Show { risk } => _show(&file, mode(*risk, &settings)),
        Commands::Dot { risk, output } => _dot(&file, mode(*risk, &settings), output.as_deref()),
        Commands::Nodes => _nodes(&file),
        Commands::Export { output } => _export(&file, output.as_deref()),
        Commands::Import { input } => _import(&file, input, &settings),
        Commands::Config { command } => _config(command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "evtree", &mut io::stdout());
            Ok(())
        }
    }
}

fn mode(risk_flag: bool, settings: &Settings) -> DisplayMode {
    if risk_flag || settings.risk_mode {
        DisplayMode::Risk
    } else {
        DisplayMode::Probability
    }
}

fn refresh(store: &TreeStore, settings: &Settings) {
    output::info(&to_text_tree(store, mode(false, settings)));
}

#[instrument(level = "debug", skip(settings))]
fn _init(
    file: &Path,
    name: Option<&str>,
    freq: f64,
    force: bool,
    settings: &Settings,
) -> CliResult<()> {
    if file.exists() && !force {
        return Err(CliError::InvalidArgs(format!(
            "{} already exists (use --force to overwrite)",
            file.display()
        )));
    }

    let mut store = engine::initialize();
    let root_id = store
        .root_ids()
        .into_iter()
        .next()
        .ok_or(DomainError::NoRoot)?;
    engine::update(
        &mut store,
        &root_id,
        NodeUpdate {
            name: name.map(str::to_string),
            initiating_frequency: Some(freq),
            ..NodeUpdate::default()
        },
    )?;

    session::save(file, &store)?;
    output::action("Initialized", &format!("{} (root {})", file.display(), root_id));
    refresh(&store, settings);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
#[instrument(level = "debug", skip(settings))]
fn _add(
    file: &Path,
    name: &str,
    parent: &str,
    branch: Branch,
    kind: KindArg,
    prob: Option<f64>,
    cost: Option<f64>,
    settings: &Settings,
) -> CliResult<()> {
    let new = match kind {
        KindArg::Barrier => {
            if cost.is_some() {
                return Err(CliError::InvalidArgs(
                    "--cost applies to outcomes, not barriers".into(),
                ));
            }
            NewNode::Barrier {
                name: name.to_string(),
                success_probability: prob.unwrap_or(DEFAULT_SUCCESS_PROBABILITY),
            }
        }
        KindArg::Outcome => {
            if prob.is_some() {
                return Err(CliError::InvalidArgs(
                    "--prob applies to barriers, not outcomes".into(),
                ));
            }
            NewNode::Outcome {
                name: name.to_string(),
                cost: cost.unwrap_or(0.0),
            }
        }
    };

    let mut store = session::load(file)?;
    let id = engine::insert(&mut store, &NodeId::from(parent), branch, new)?;
    session::save(file, &store)?;

    output::action("Added", &format!("{} ({})", name, id));
    refresh(&store, settings);
    Ok(())
}

#[instrument(level = "debug", skip(settings))]
fn _set(
    file: &Path,
    id: &str,
    name: Option<String>,
    prob: Option<f64>,
    freq: Option<f64>,
    cost: Option<f64>,
    settings: &Settings,
) -> CliResult<()> {
    let update = NodeUpdate {
        name,
        success_probability: prob,
        initiating_frequency: freq,
        cost,
    };
    if update.is_empty() {
        return Err(CliError::InvalidArgs(
            "nothing to set: pass --name, --prob, --freq, or --cost".into(),
        ));
    }

    let mut store = session::load(file)?;
    engine::update(&mut store, &NodeId::from(id), update)?;
    session::save(file, &store)?;

    output::action("Updated", id);
    refresh(&store, settings);
    Ok(())
}

#[instrument(level = "debug", skip(settings))]
fn _rm(file: &Path, id: &str, settings: &Settings) -> CliResult<()> {
    let mut store = session::load(file)?;
    let removed = engine::delete_subtree(&mut store, &NodeId::from(id))?;
    session::save(file, &store)?;

    output::action("Removed", &format!("{} node(s) under {}", removed, id));
    refresh(&store, settings);
    Ok(())
}

#[instrument(level = "debug")]
fn _show(file: &Path, mode: DisplayMode) -> CliResult<()> {
    let store = session::load(file)?;
    output::info(&to_text_tree(&store, mode));
    Ok(())
}

#[instrument(level = "debug")]
fn _dot(file: &Path, mode: DisplayMode, output_path: Option<&Path>) -> CliResult<()> {
    let store = session::load(file)?;
    let dot = to_dot(&store, mode);
    match output_path {
        Some(path) => {
            fs::write(path, &dot)
                .map_err(|e| ApplicationError::io(format!("writing {}", path.display()), e))?;
            output::action("Wrote", &path.display());
        }
        None => output::info(&dot),
    }
    Ok(())
}

#[instrument(level = "debug")]
fn _nodes(file: &Path) -> CliResult<()> {
    let store = session::load(file)?;

    output::header(&format!(
        "{:<10} {:<8} {:<8} {:<24} {:<16} {:>10} {:>12} {:>14}",
        "ID", "KIND", "BRANCH", "NAME", "PARAM", "PATH_PROB", "PATH_FREQ", "RISK"
    ));
    for node in store.iter() {
        let branch = node
            .branch
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        let param = match node.kind {
            NodeKind::Root => format!("freq={}", node.initiating_frequency),
            NodeKind::Barrier => format!("P={}", node.success_probability),
            NodeKind::Outcome => format!("cost={}", format_money(node.cost, 0)),
        };
        output::info(&format!(
            "{:<10} {:<8} {:<8} {:<24} {:<16} {:>10.4} {:>12.4} {:>14}",
            node.id.as_str(),
            node.kind.to_string(),
            branch,
            node.name,
            param,
            node.path_probability,
            node.path_frequency,
            format_money(node.risk, 2),
        ));
    }
    Ok(())
}

#[instrument(level = "debug")]
fn _export(file: &Path, output_path: Option<&Path>) -> CliResult<()> {
    let store = session::load(file)?;
    let data = persist::export_string(&store)?;
    match output_path {
        Some(path) => {
            fs::write(path, &data)
                .map_err(|e| ApplicationError::io(format!("writing {}", path.display()), e))?;
            output::action("Exported", &format!("{} nodes to {}", store.len(), path.display()));
        }
        None => output::info(&data),
    }
    Ok(())
}

#[instrument(level = "debug", skip(settings))]
fn _import(file: &Path, input: &Path, settings: &Settings) -> CliResult<()> {
    let data = fs::read_to_string(input)
        .map_err(|e| ApplicationError::io(format!("reading {}", input.display()), e))?;
    let store = persist::import_str(&data)?;
    session::save(file, &store)?;

    output::action(
        "Imported",
        &format!("{} nodes from {}", store.len(), input.display()),
    );
    refresh(&store, settings);
    Ok(())
}

fn _config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::header("Configuration");
            output::detail(&format!("tree_file = {}", settings.tree_file.display()));
            output::detail(&format!("risk_mode = {}", settings.risk_mode));
            Ok(())
        }
        ConfigCommands::Init => {
            let path = config_path()?;
            if path.exists() {
                return Err(CliError::InvalidArgs(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .map_err(|e| ApplicationError::io(format!("creating {}", dir.display()), e))?;
            }
            fs::write(&path, Settings::template())
                .map_err(|e| ApplicationError::io(format!("writing {}", path.display()), e))?;
            output::action("Created", &path.display());
            Ok(())
        }
        ConfigCommands::Path => {
            let path = config_path()?;
            let marker = if path.exists() { "exists" } else { "absent" };
            output::info(&format!("{} ({})", path.display(), marker));
            Ok(())
        }
    }
}

fn config_path() -> CliResult<PathBuf> {
    global_config_path()
        .ok_or_else(|| CliError::InvalidArgs("cannot determine config directory".into()))
}
