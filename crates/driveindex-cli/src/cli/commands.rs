//! # CLI Layer
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Installs a log subscriber
//! - Writes to stdout and stderr
//! - Decides exit codes (through `main`)
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: clap turns the shell arguments into [`Commands`]
//! 2. **Context Setup**: `driveindex::init::initialize` wires the API to the data directory
//! 3. **Dispatch**: each command maps to one `IndexApi` method
//! 4. **Output Formatting**: `render` prints the returned `CmdResult`
//!
//! Error-level messages in a result are turned into an `Err`, so `main` prints
//! them as `Error: ...` and exits with 1.

use super::render::{render_json, render_text};
use super::setup::{Cli, Commands, RootArgs};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use driveindex::api::RootSelector;
use driveindex::commands::config::ConfigAction;
use driveindex::commands::{CmdResult, MessageLevel};
use driveindex::init::initialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = initialize(cli.data.clone()).context("could not initialize driveindex")?;
    debug!(data_dir = %ctx.data_dir.display(), "context ready");
    let api = &ctx.api;

    let result = match &cli.command {
        Commands::Sync { root } => api.sync(&selector(root))?,
        Commands::Rebuild { root } => api.rebuild(&selector(root))?,
        Commands::RebuildIndex => api.rebuild_index()?,
        Commands::Search { terms } => api.search(terms.as_slice())?,
        Commands::Stats => api.stats()?,
        Commands::Doctor => api.doctor()?,
        Commands::Config { key } => api.show_config(match key {
            Some(key) => ConfigAction::ShowKey(key.clone()),
            None => ConfigAction::ShowAll,
        })?,
    };

    print_result(result, cli.json, cli.verbose)
}

/// Logs go to stderr. `RUST_LOG` wins; otherwise warnings, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "driveindex=debug"
    } else {
        "driveindex=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests calling `run` twice) is harmless, so the error is ignored.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn selector(args: &RootArgs) -> RootSelector {
    RootSelector {
        root: args.root.clone(),
        name: args.root_name.clone(),
    }
}

fn print_result(mut result: CmdResult, json: bool, verbose: bool) -> Result<()> {
    let errors: Vec<String> = result
        .messages
        .iter()
        .filter(|m| m.level == MessageLevel::Error)
        .map(|m| m.content.clone())
        .collect();
    result.messages.retain(|m| m.level != MessageLevel::Error);

    if json {
        println!("{}", render_json(&result)?);
    } else {
        print!("{}", render_text(&result, verbose));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(errors.join("\n")))
    }
}
