//! # Command Layer
//!
//! One submodule per user operation. Commands take their collaborators and the
//! configuration as arguments, do the work, and describe the outcome in a
//! [`CmdResult`].
//!
//! ## What Commands Do NOT Do
//!
//! - **Any terminal I/O**: no stdout, stderr or formatting
//! - **Argument parsing**: that's the CLI layer's job
//! - **Exit codes**: return `Result`, let the caller decide
//! - **Root resolution**: the API facade turns names into root ids
//!
//! ## Structured Returns
//!
//! [`CmdResult`] carries leveled messages plus whichever payload the command
//! produces: a [`SyncSummary`], search hits, [`Stats`], a [`DoctorReport`] or
//! the effective configuration. The UI decides how to render them.
//!
//! ## Testing Strategy
//!
//! Most of the testing lives here. Command tests run against `MemTable` and
//! `ListingSource`, so no filesystem is involved.
//!
//! ## Command Modules
//!
//! - [`sync`]: Incremental pass
//! - [`rebuild`]: Full rebuild of both tables
//! - [`rebuild_index`]: Re-project the Index from the Cache
//! - [`search`]: Keyword search over full paths
//! - [`stats`]: Table and content counts
//! - [`doctor`]: Verify and repair the Cache↔Index binding
//! - [`config`]: Show the effective configuration
//! - [`helpers`]: Shared walk and read utilities

use crate::config::IndexConfig;
use crate::model::IndexRow;
use serde::Serialize;
use std::collections::BTreeMap;

pub mod config;
pub mod doctor;
pub mod helpers;
pub mod rebuild;
pub mod rebuild_index;
pub mod search;
pub mod stats;
pub mod sync;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Outcome of an incremental pass or a full rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub root_id: String,
    /// Items the walk yielded, admitted or not.
    pub walked: usize,
    /// Files left out by the mime allow-list.
    pub skipped: usize,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Rows re-created or rewritten to bring the Index back in line with the Cache.
    pub repaired: usize,
    pub write_calls: usize,
}

/// One Index row matched by a search, with its physical row number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub row: usize,
    #[serde(flatten)]
    pub entry: IndexRow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub cache_rows: usize,
    pub index_rows: usize,
    pub folders: usize,
    pub files: usize,
    pub tagged: usize,
    pub by_type: BTreeMap<String, usize>,
    pub last_cached_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoctorReport {
    /// Index rows whose id is not in the Cache.
    pub orphans_removed: usize,
    /// Index rows shadowed by a later row with the same id.
    pub duplicates_removed: usize,
    /// Cache ids that had no Index row.
    pub missing_added: usize,
    /// Index rows rewritten because they no longer matched their Cache row.
    pub drifted_rewritten: usize,
    /// Cache ids stored on more than one row. Reported, not fixed.
    pub cache_duplicates: usize,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        self.orphans_removed == 0
            && self.duplicates_removed == 0
            && self.missing_added == 0
            && self.drifted_rewritten == 0
            && self.cache_duplicates == 0
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub messages: Vec<CmdMessage>,
    pub summary: Option<SyncSummary>,
    pub hits: Vec<SearchHit>,
    pub stats: Option<Stats>,
    pub doctor: Option<DoctorReport>,
    pub config: Option<IndexConfig>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_summary(mut self, summary: SyncSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.hits = hits;
        self
    }

    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_doctor(mut self, report: DoctorReport) -> Self {
        self.doctor = Some(report);
        self
    }

    pub fn with_config(mut self, config: IndexConfig) -> Self {
        self.config = Some(config);
        self
    }
}
