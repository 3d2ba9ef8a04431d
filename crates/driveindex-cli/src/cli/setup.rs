use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format for releases: "v0.3.0"
/// Format for dev builds: "v0.3.0\ndev: abc1234 2024-01-15 14:30"
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "driveindex",
    bin_name = "driveindex",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "Keep a flat, tag-preserving index of a file tree in sync", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding driveindex.toml and the tables
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Log sync details to stderr
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,
}

/// Root selection shared by the commands that walk the tree.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RootArgs {
    /// Root folder id (listing source) or directory (local source)
    #[arg(long, conflicts_with = "root_name")]
    pub root: Option<String>,

    /// Named root from `root_aliases`; unknown names use the default root
    #[arg(long, value_name = "NAME")]
    pub root_name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk the tree and apply only what changed to both tables
    Sync {
        #[command(flatten)]
        root: RootArgs,
    },

    /// Clear both tables and re-create them from a fresh walk (tags are kept)
    Rebuild {
        #[command(flatten)]
        root: RootArgs,
    },

    /// Re-create the Index from the Cache
    RebuildIndex,

    /// Find items whose path contains any of the keywords
    #[command(alias = "s")]
    Search {
        /// Keywords, matched case-insensitively
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
    },

    /// Show table and content counts
    Stats,

    /// Check that every Cache row has exactly one matching Index row, and fix the Index
    Doctor,

    /// Show the effective configuration
    Config {
        /// Show a single key
        key: Option<String>,
    },
}
