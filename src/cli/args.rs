//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::application::Operation;

/// Tri-state checkbox trees over JSON records: cascade selections and show the result
#[derive(Parser, Debug)]
#[command(name = "checktree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Additional config file (layered over the global config)
    #[arg(
        short,
        long,
        global = true,
        env = "CHECKTREE_CONFIG",
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply operations and print the tree with state markers
    Show {
        #[command(flatten)]
        tree: TreeArgs,

        /// Print each state change event before the tree
        #[arg(long)]
        events: bool,
    },

    /// Apply operations and print the ids of checked nodes
    Checked {
        #[command(flatten)]
        tree: TreeArgs,
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

/// Source and operations shared by tree commands.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// JSON file with an array of records (or a single root record)
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Records form one flat list linked by parent id
    #[arg(long)]
    pub flat: bool,

    /// Do not propagate check/uncheck to descendants
    #[arg(long)]
    pub no_cascade: bool,

    /// Record field holding the initial checked state
    #[arg(long, value_name = "FIELD")]
    pub checked_field: Option<String>,

    /// Operation to apply in order: check:<id>, uncheck:<id>, check-all, uncheck-all
    #[arg(short = 'o', long = "op", value_name = "OP")]
    pub ops: Vec<Operation>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Show config file locations
    Path,
}
