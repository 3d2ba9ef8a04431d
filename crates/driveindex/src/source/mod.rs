//! # Tree Sources
//!
//! A [`TreeSource`] is the hierarchical file-storage provider the index mirrors.
//! The core only ever asks three questions: "what is this folder?", "what are its
//! subfolders?" and "what are its files?". Parent links are never queried; the
//! walker hands each child the id of the folder it was listed from.
//!
//! ## Implementations
//!
//! - [`listing::ListingSource`]: A Drive-API-style listing (export file or built in
//!   code). The production path for cloud trees, and the test double.
//! - [`local::LocalTreeSource`]: A directory on the local filesystem.
//!
//! ## Failure Semantics
//!
//! - Root lookups fail with [`IndexError::SourceUnavailable`](crate::error::IndexError).
//! - Listing failures fail with `IndexError::Source`.
//!
//! Either aborts the pass before any table is written.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod listing;
pub mod local;

/// A folder or file as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub url: String,
    pub trashed: bool,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Abstract interface for the tree provider.
pub trait TreeSource {
    /// Look up a folder by id. Used to resolve the root of a walk.
    fn folder(&self, id: &str) -> Result<SourceEntry>;

    /// Immediate subfolders of a folder, trashed ones included.
    fn child_folders(&self, folder_id: &str) -> Result<Vec<SourceEntry>>;

    /// Immediate files of a folder, trashed ones included.
    fn child_files(&self, folder_id: &str) -> Result<Vec<SourceEntry>>;
}

impl<T: TreeSource + ?Sized> TreeSource for Box<T> {
    fn folder(&self, id: &str) -> Result<SourceEntry> {
        (**self).folder(id)
    }

    fn child_folders(&self, folder_id: &str) -> Result<Vec<SourceEntry>> {
        (**self).child_folders(folder_id)
    }

    fn child_files(&self, folder_id: &str) -> Result<Vec<SourceEntry>> {
        (**self).child_files(folder_id)
    }
}
