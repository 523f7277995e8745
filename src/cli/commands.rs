//! Command dispatch
//!
//! Every command mounts a fresh editor session, performs one gesture and
//! prints the outcome.

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::render::{forest_tree, pane_tree};
use crate::application::services::{DropResolution, DropTarget, DropVerdict, HierarchyEditor};
use crate::cli::args::{Cli, Commands, ConfigCommands, DropOn};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{Forest, NodeId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::SelectionItem;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => cmd_config(cli, command),
        other => {
            let container = ServiceContainer::new(load_settings(cli)?, cli.yes)?;
            dispatch(&container, other)
        }
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config_file.as_deref())?;
    if let Some(api) = &cli.api {
        debug!("api.base_url overridden from command line");
        settings.api.base_url = api.clone();
    }
    Ok(settings)
}

/// Run a backend-facing command against `container`.
pub fn dispatch(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    let mut editor = container.editor();
    match command {
        Commands::Tree => {
            editor.mount(None)?;
            print_forest(&editor);
        }
        Commands::Show { root, expand_all } => {
            let root = NodeId(*root);
            editor.mount(None)?;
            editor.toggle_root(root)?;
            if *expand_all {
                editor.expand_all_in(root);
            }
            print_pane(&editor, root, *expand_all);
        }
        Commands::AddRoot { name } => {
            editor.mount(None)?;
            editor.add_root(name)?;
            output::success(&format!("main category '{}' added", name.trim()));
        }
        Commands::AddChild { parent, name } => {
            editor.mount(Some(NodeId(*parent)))?;
            editor.add_child(NodeId(*parent), name)?;
            output::success(&format!("'{}' added under {}", name.trim(), parent));
        }
        Commands::Rename { id, name } => {
            editor.mount(Some(NodeId(*id)))?;
            editor.rename(NodeId(*id), name)?;
            output::success(&format!("{} renamed to '{}'", id, name.trim()));
        }
        Commands::Delete { id } => {
            editor.mount(Some(NodeId(*id)))?;
            editor.delete(NodeId(*id))?;
            output::success(&format!("{} deleted with its sub-industries", id));
        }
        Commands::Move { id, parent } => {
            editor.mount(Some(NodeId(*id)))?;
            editor.reparent(NodeId(*id), NodeId(*parent))?;
            output::success(&format!("{} moved under {}", id, parent));
        }
        Commands::Promote { id } => {
            editor.mount(Some(NodeId(*id)))?;
            editor.promote(NodeId(*id))?;
            output::success(&format!("{} is now a main category", id));
        }
        Commands::Drag { id, target, on } => {
            editor.mount(Some(NodeId(*id)))?;
            cmd_drag(&mut editor, NodeId(*id), NodeId(*target), *on)?;
        }
        Commands::Pick => cmd_pick(container, &mut editor)?,
        Commands::Config { .. } | Commands::Completion { .. } => {
            return Err(CliError::Usage(
                "command does not talk to the backend".to_string(),
            ))
        }
    }
    warn_orphans(editor.forest());
    Ok(())
}

#[instrument(level = "debug", skip(editor))]
fn cmd_drag(editor: &mut HierarchyEditor, id: NodeId, target: NodeId, on: DropOn) -> CliResult<()> {
    let raw = editor.drag_start(id).ok_or_else(|| {
        CliError::InvalidArgs(format!("industry {} cannot be dragged", id))
    })?;
    let target = match on {
        DropOn::Row => DropTarget::Row(target),
        DropOn::Header => DropTarget::PaneHeader(target),
        DropOn::Track => DropTarget::RootSlot(target),
    };
    if let DropVerdict::Reject(reason) = editor.drag_over(&raw, target) {
        debug!("hover rejected: {:?}", reason);
    }
    match editor.drop(Some(&raw), target)? {
        DropResolution::NoOp => output::info(&"nothing to do"),
        DropResolution::ReorderRoots { .. } => {
            output::action("Reordered", &"main categories");
            print_forest(editor);
        }
        DropResolution::Reparent(plan) => match plan.new_parent {
            Some(parent) => output::success(&format!("{} moved under {}", plan.child, parent)),
            None => output::success(&format!("{} is now a main category", plan.child)),
        },
    }
    Ok(())
}

fn cmd_pick(container: &ServiceContainer, editor: &mut HierarchyEditor) -> CliResult<()> {
    editor.mount(None)?;
    let items: Vec<SelectionItem> = editor
        .forest()
        .iter()
        .map(|(_, node)| SelectionItem {
            display: breadcrumb(editor.forest(), node.id()),
            value: node.id(),
        })
        .collect();

    let picked = container
        .selector
        .select_one(&items, "industry> ")
        .map_err(|message| InfraError::Selector { message })?;
    let Some(picked) = picked else {
        output::info(&"nothing selected");
        return Ok(());
    };

    editor.mount(Some(picked.value))?;
    let root = editor
        .forest()
        .root_of(picked.value)
        .unwrap_or(picked.value);
    print_pane(editor, root, false);
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning(&"no home directory, global config unavailable"),
            }
            if let Some(path) = &cli.config_file {
                output::action("explicit", &path.display());
            }
        }
    }
    Ok(())
}

/// `Manufacturing / Automotive / Electric Vehicles [7]`
fn breadcrumb(forest: &Forest, id: NodeId) -> String {
    let mut chain = forest.ancestors_of(id);
    chain.reverse();
    chain.push(id);
    let path = chain
        .iter()
        .filter_map(|&n| forest.find_by_id(n))
        .map(|n| n.name.as_str())
        .join(" / ");
    format!("{} [{}]", path, id)
}

fn print_forest(editor: &HierarchyEditor) {
    for tree in forest_tree(editor.forest(), editor.order()) {
        print!("{}", tree);
    }
}

fn print_pane(editor: &HierarchyEditor, root: NodeId, as_tree: bool) {
    if as_tree {
        print!(
            "{}",
            pane_tree(editor.forest(), root, editor.panes().expanded(root))
        );
        return;
    }
    let title = editor
        .forest()
        .find_by_id(root)
        .map(|n| n.name.clone())
        .unwrap_or_default();
    output::header(&format!("{} [{}]", title, root));
    for row in editor.rows(root) {
        output::info(&output::row_line(&row, editor.selected() == Some(row.id)));
    }
}

fn warn_orphans(forest: &Forest) {
    if forest.orphans().is_empty() {
        return;
    }
    output::warning(&format!(
        "parent missing for {}, shown as main categories",
        forest.orphans().iter().join(", ")
    ));
}
