//! # CLI Behavior
//!
//! This is **one possible UI client** for driveindex, not the application itself.
//! The CLI is the only place that knows about terminal I/O, log output, exit codes
//! and formatting.
//!
//! For the overall architecture, see the library crate documentation.
//!
//! ## Picking a Root
//!
//! `sync` and `rebuild` walk one root:
//!
//! 1. `--root <id-or-dir>` walks exactly that.
//! 2. `--root-name <name>` looks the name up in `root_aliases`. Unknown names use
//!    the configured `root`.
//! 3. With neither flag, the configured `root` is used.
//!
//! ## Output
//!
//! Results go to stdout, styled when stdout is a terminal. `--json` prints the
//! whole structured result instead. Logs go to stderr: warnings by default,
//! debug with `--verbose`, or whatever `RUST_LOG` asks for.
//!
//! ## Module Structure
//!
//! - `commands`: Logging setup and dispatch to the API
//! - `render`: Output formatting (hit tables, stats, messages, JSON)
//! - `setup`: Argument parsing via clap
//! - `styles`: Terminal styling

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
