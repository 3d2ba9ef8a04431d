//! # Configuration
//!
//! Driveindex configuration is managed by [`clapfig`], which handles layered loading
//! from TOML files, environment variables, and programmatic overrides.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `DRIVEINDEX__ROOT`, `DRIVEINDEX__LISTING_FILE`, etc.
//! 2. **Data directory config**: `<data>/driveindex.toml`.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! The loaded [`IndexConfig`] is immutable and handed by reference to every
//! component that needs a layout or policy decision; nothing reads ambient state.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `root` | none | Default tree root (folder id or directory path) |
//! | `root_aliases` | none | Named roots, selected with `--root-name` |
//! | `listing_file` | none | Read the tree from a Drive listing export instead of disk |
//! | `cache_start_row` | `2` | First Cache data row |
//! | `index_start_row` | `5` | First Index data row |
//! | `allowed_mime_types` | office, PDF, Google native | File admission allow-list |
//! | `timestamp_format` | `%Y-%m-%d %H:%M:%S` | `cachedAt` format (UTC) |

use crate::error::{IndexError, Result};
use chrono::format::{Item, StrftimeItems};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const GOOGLE_SHEETS_MIME: &str = "application/vnd.google-apps.spreadsheet";
pub const GOOGLE_DOCS_MIME: &str = "application/vnd.google-apps.document";
pub const GOOGLE_SLIDES_MIME: &str = "application/vnd.google-apps.presentation";
pub const PDF_MIME: &str = "application/pdf";
pub const XLS_MIME: &str = "application/vnd.ms-excel";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const DOC_MIME: &str = "application/msword";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PPT_MIME: &str = "application/vnd.ms-powerpoint";
pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

pub const DEFAULT_ALLOWED_MIME_TYPES: [&str; 10] = [
    GOOGLE_SHEETS_MIME,
    GOOGLE_DOCS_MIME,
    GOOGLE_SLIDES_MIME,
    PDF_MIME,
    XLS_MIME,
    XLSX_MIME,
    DOC_MIME,
    DOCX_MIME,
    PPT_MIME,
    PPTX_MIME,
];

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration for driveindex, stored in `driveindex.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Default tree root: a folder id for listings, a directory for the local source.
    pub root: Option<String>,

    /// Named roots. `--root-name <name>` picks one; unknown names fall back to `root`.
    pub root_aliases: Option<HashMap<String, String>>,

    /// Path to a Drive listing export (JSON). When absent the local filesystem is walked.
    pub listing_file: Option<String>,

    /// First Cache data row. The row above it holds the header.
    #[config(default = 2)]
    pub cache_start_row: usize,

    /// First Index data row. Rows above it belong to the header and user controls.
    #[config(default = 5)]
    pub index_start_row: usize,

    /// Mime types admitted into the tables. When absent, office documents, PDF
    /// and Google native documents are admitted.
    pub allowed_mime_types: Option<Vec<String>>,

    /// `strftime` format for the Cache `cachedAt` column, rendered in UTC.
    #[config(default = "%Y-%m-%d %H:%M:%S")]
    pub timestamp_format: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root: None,
            root_aliases: None,
            listing_file: None,
            cache_start_row: 2,
            index_start_row: 5,
            allowed_mime_types: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cache_start_row < 2 {
            return Err(IndexError::Config(format!(
                "cache_start_row must be at least 2, got {}",
                self.cache_start_row
            )));
        }
        if self.index_start_row < 2 {
            return Err(IndexError::Config(format!(
                "index_start_row must be at least 2, got {}",
                self.index_start_row
            )));
        }
        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(IndexError::Config(format!(
                "timestamp_format {:?} is not a valid strftime format",
                self.timestamp_format
            )));
        }
        Ok(())
    }

    pub fn cache_header_row(&self) -> usize {
        self.cache_start_row - 1
    }

    pub fn index_header_row(&self) -> usize {
        self.index_start_row - 1
    }

    /// Get the admission allow-list, using defaults if not configured.
    pub fn allowed_mime_types(&self) -> Vec<String> {
        self.allowed_mime_types.clone().unwrap_or_else(|| {
            DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect()
        })
    }

    pub fn admits(&self, mime: &str) -> bool {
        match &self.allowed_mime_types {
            Some(list) => list.iter().any(|m| m == mime),
            None => DEFAULT_ALLOWED_MIME_TYPES.contains(&mime),
        }
    }

    /// Get a config value by key, rendered for display.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "root" => Some(self.root.clone().unwrap_or_default()),
            "root_aliases" => {
                let mut pairs: Vec<String> = self
                    .root_aliases
                    .iter()
                    .flatten()
                    .map(|(name, id)| format!("{}={}", name, id))
                    .collect();
                pairs.sort();
                Some(pairs.join(", "))
            }
            "listing_file" => Some(self.listing_file.clone().unwrap_or_default()),
            "cache_start_row" => Some(self.cache_start_row.to_string()),
            "index_start_row" => Some(self.index_start_row.to_string()),
            "allowed_mime_types" => Some(self.allowed_mime_types().join(", ")),
            "timestamp_format" => Some(self.timestamp_format.clone()),
            _ => None,
        }
    }

    /// Resolve the root to walk: a named alias if it exists, else the default root.
    pub fn resolve_root(&self, name: Option<&str>) -> Option<String> {
        name.and_then(|n| {
            self.root_aliases
                .as_ref()
                .and_then(|aliases| aliases.get(n.trim()))
                .cloned()
        })
        .or_else(|| self.root.clone())
    }
}
