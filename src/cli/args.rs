//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Industry hierarchy editor: build, compare and restructure industry trees
#[derive(Parser, Debug)]
#[command(name = "industree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(long = "config", global = true, value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    /// Override api.base_url
    #[arg(long, global = true)]
    pub api: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every main category with its subtree
    Tree,

    /// Show one main category as a pane
    Show {
        /// Main category id
        root: i64,
        /// Expand every node in the pane
        #[arg(short, long)]
        expand_all: bool,
    },

    /// Create a main category
    AddRoot {
        name: String,
    },

    /// Create a sub-industry
    AddChild {
        /// Parent industry id
        parent: i64,
        name: String,
    },

    /// Rename an industry
    Rename {
        id: i64,
        name: String,
    },

    /// Delete an industry and everything below it
    Delete {
        id: i64,
    },

    /// Move an industry under a new parent
    Move {
        id: i64,
        /// New parent id
        parent: i64,
    },

    /// Make an industry a main category
    Promote {
        id: i64,
    },

    /// Drag an industry and drop it on a target
    Drag {
        id: i64,
        /// Target industry id
        target: i64,
        /// How the target is hit
        #[arg(long, value_enum, default_value_t = DropOn::Row)]
        on: DropOn,
    },

    /// Pick an industry interactively (fzf) and show where it lives
    Pick,

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

/// Drop surface for `drag`.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOn {
    /// A row inside a pane
    Row,
    /// A pane header (main category)
    Header,
    /// The main category reordering track
    Track,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
