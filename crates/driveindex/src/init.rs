//! # Context Initialization
//!
//! Everything driveindex stores lives in one **data directory**:
//!
//! ```text
//! <data>/
//!   driveindex.toml   # optional configuration
//!   cache.json        # the Cache table
//!   index.json        # the Index table
//! ```
//!
//! ## Data Directory Resolution
//!
//! 1. `data_override` (the CLI's `--data` flag), used as-is.
//! 2. The `DRIVEINDEX_DATA` environment variable. Tests use this for isolation.
//! 3. The OS data directory from the `directories` crate.
//!
//! ## Source Selection
//!
//! With `listing_file` configured, the tree comes from that Drive listing export
//! (a relative path is taken relative to the data directory). Otherwise the local
//! filesystem is walked and `root` is a directory path.

use crate::api::IndexApi;
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::source::listing::ListingSource;
use crate::source::local::LocalTreeSource;
use crate::source::TreeSource;
use crate::table::fs::FsTable;
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DATA_ENV: &str = "DRIVEINDEX_DATA";
pub const CONFIG_FILE: &str = "driveindex.toml";
pub const CACHE_FILE: &str = "cache.json";
pub const INDEX_FILE: &str = "index.json";

pub type FsApi = IndexApi<Box<dyn TreeSource>, FsTable, FsTable>;

pub struct IndexContext {
    pub api: FsApi,
    pub data_dir: PathBuf,
}

pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_ENV) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "driveindex", "driveindex")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| IndexError::Config("could not determine a data directory".to_string()))
}

/// Load `driveindex.toml` from the data directory plus `DRIVEINDEX__*` env vars.
///
/// A file that is present but cannot be parsed is an error. Running on the
/// defaults instead would apply the default allow-list and source, and the
/// next pass would delete every row the user's own settings admitted.
pub fn load_config(data_dir: &Path) -> Result<IndexConfig> {
    Clapfig::builder()
        .app_name("driveindex")
        .file_name(CONFIG_FILE)
        .search_paths(vec![SearchPath::Path(data_dir.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .load()
        .map_err(|e| {
            IndexError::Config(format!(
                "{}: {}",
                data_dir.join(CONFIG_FILE).display(),
                e
            ))
        })
}

pub fn build_source(config: &IndexConfig, data_dir: &Path) -> Result<Box<dyn TreeSource>> {
    match &config.listing_file {
        Some(file) => {
            let path = data_dir.join(file);
            debug!(path = %path.display(), "reading tree from listing export");
            Ok(Box::new(ListingSource::load(&path)?))
        }
        None => Ok(Box::new(LocalTreeSource::new())),
    }
}

/// Resolve the data directory, load the configuration and wire up the API.
pub fn initialize(data_override: Option<PathBuf>) -> Result<IndexContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let config = load_config(&data_dir)?;
    config.validate()?;
    debug!(data_dir = %data_dir.display(), ?config, "initialized");

    let source = build_source(&config, &data_dir)?;
    let cache = FsTable::new(data_dir.join(CACHE_FILE));
    let index = FsTable::new(data_dir.join(INDEX_FILE));
    Ok(IndexContext {
        api: IndexApi::new(source, cache, index, config),
        data_dir,
    })
}
