//! # Driveindex CLI
//!
//! The binary is intentionally thin: everything lives in `src/cli/`, and this file
//! only calls `cli::run()` and turns an error into exit code 1.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (src/cli/)                                       │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Logging setup + dispatch (commands.rs)                   │
//! │  - Terminal rendering (render.rs, styles.rs)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  driveindex library                                         │
//! │  - IndexApi facade → commands → sync core                   │
//! │  - Returns structured `CmdResult` values                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything inside the library is UI agnostic. The CLI owns argument parsing,
//! context initialization, log output, rendering and exit codes.
//!
//! ## Testing Approach
//!
//! Command logic is tested in the library. Here, `render` has unit tests over
//! canned `CmdResult` values and `tests/` drives the real binary end to end.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
