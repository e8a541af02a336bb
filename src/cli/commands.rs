//! Command dispatch: loads settings, builds the tree and writes results to stdout

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::RecordLayout;
use crate::application::{ApplicationError, CheckTree, Checkable};
use crate::cli::args::{Cli, Commands, ConfigCommands, TreeArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{CheckState, StateChanged};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

/// Run the parsed command. Completion generation is handled in `main`.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings);
    let mut out = io::stdout().lock();

    match &cli.command {
        Commands::Show { tree, events } => cmd_show(&container, tree, *events, &mut out),
        Commands::Checked { tree } => cmd_checked(&container, tree, &mut out),
        Commands::Config { command } => cmd_config(&container, command, cli, &mut out),
        Commands::Completion { .. } => Err(CliError::InvalidArgs(
            "completion is generated before dispatch".to_string(),
        )),
    }
}

/// Settings for one invocation: loaded layers plus command line flags.
pub fn effective_settings(base: &Settings, args: &TreeArgs) -> Settings {
    let mut settings = base.clone();
    if args.no_cascade {
        settings.cascade = false;
    }
    if let Some(field) = &args.checked_field {
        settings.checked_field = field.clone();
    }
    settings
}

/// Build the tree from `args.file` and apply `args.ops` in order.
///
/// `before_ops` runs once the tree is built, e.g. to subscribe listeners.
pub fn load_and_apply(
    container: &ServiceContainer,
    args: &TreeArgs,
    before_ops: impl FnOnce(&mut CheckTree),
) -> CliResult<CheckTree> {
    let settings = effective_settings(&container.settings, args);
    settings.validate()?;
    let layout = if args.flat {
        RecordLayout::Flat
    } else {
        RecordLayout::Nested
    };

    let mut check_tree = container.records.build(&args.file, layout, &settings)?;
    before_ops(&mut check_tree);
    for op in &args.ops {
        let changed = check_tree.apply(op).map_err(ApplicationError::from)?;
        debug!(%op, changed, "applied operation");
    }
    Ok(check_tree)
}

#[instrument(level = "debug", skip(container, out))]
fn cmd_show(
    container: &ServiceContainer,
    args: &TreeArgs,
    events: bool,
    out: &mut impl Write,
) -> CliResult<()> {
    let log: Rc<RefCell<Vec<(String, CheckState)>>> = Rc::default();
    let check_tree = load_and_apply(container, args, |check_tree| {
        if events {
            let sink = Rc::clone(&log);
            check_tree.subscribe(move |event: &StateChanged<'_>| {
                sink.borrow_mut().push((event.id.to_string(), event.state))
            });
        }
    })?;

    for (id, state) in log.borrow().iter() {
        writeln!(out, "{}", output::event(id, *state)).map_err(write_err)?;
    }
    for root in check_tree.to_tree_string() {
        write!(out, "{root}").map_err(write_err)?;
    }
    Ok(())
}

#[instrument(level = "debug", skip(container, out))]
fn cmd_checked(
    container: &ServiceContainer,
    args: &TreeArgs,
    out: &mut impl Write,
) -> CliResult<()> {
    let check_tree = load_and_apply(container, args, |_| {})?;
    let ids = check_tree.checked_ids().join("\n");
    if !ids.is_empty() {
        writeln!(out, "{ids}").map_err(write_err)?;
    }
    Ok(())
}

fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    cli: &Cli,
    out: &mut impl Write,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            writeln!(out, "{}", output::header("# Effective configuration"))
                .map_err(write_err)?;
            write!(out, "{}", container.settings.to_toml()?).map_err(write_err)?;
        }
        ConfigCommands::Template => {
            write!(out, "{}", Settings::template()).map_err(write_err)?;
        }
        ConfigCommands::Path => {
            let global = match global_config_path() {
                Some(path) => output::location("Global", &path.display(), path.exists()),
                None => "Global: (no config directory on this platform)".to_string(),
            };
            writeln!(out, "{global}").map_err(write_err)?;
            if let Some(local) = &cli.config {
                writeln!(
                    out,
                    "{}",
                    output::location("Local", &local.display(), local.exists())
                )
                .map_err(write_err)?;
            }
        }
    }
    Ok(())
}

fn write_err(e: io::Error) -> CliError {
    InfraError::io("write to stdout", e).into()
}
