//! # Data Model
//!
//! Two row shapes live in the tables, both keyed by the provider-assigned item id:
//!
//! | Cache (13)      | Index (10)     |
//! |-----------------|----------------|
//! | id              | id             |
//! | friendly type   | level 1..4     |
//! | name            | name           |
//! | mime / constant | friendly type  |
//! | url             | url            |
//! | parent id       | tag            |
//! | level 1..4      | full path      |
//! | tag             |                |
//! | cached at       |                |
//! | full path       |                |
//!
//! These column orders are a wire contract with the presentation layer.
//!
//! Levels are a fixed-depth truncation of the path: an item nested deeper than four
//! folders still gets a complete `full_path`, but only its first four ancestors are
//! represented as level columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical table row: one string per cell.
pub type Row = Vec<String>;

pub const LEVEL_COUNT: usize = 4;
pub const PATH_SEPARATOR: &str = "/";

pub const FOLDER_TYPE: &str = "Folder";
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

pub const CACHE_WIDTH: usize = 13;
pub const INDEX_WIDTH: usize = 10;

/// Both tables carry the id in their first column.
pub const ID_COLUMN: usize = 0;

pub const CACHE_HEADERS: [&str; CACHE_WIDTH] = [
    "ID",
    "Type",
    "Name",
    "MIME",
    "URL",
    "Parent ID",
    "Level 1",
    "Level 2",
    "Level 3",
    "Level 4",
    "TAG",
    "Cached At",
    "Full Path",
];

pub const INDEX_HEADERS: [&str; INDEX_WIDTH] = [
    "ID*",
    "Level 1",
    "Level 2",
    "Level 3",
    "Level 4",
    "Name",
    "Type",
    "URL",
    "TAG",
    "Full Path",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    File,
}

/// A live folder or file as reported by the tree source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    pub mime: String,
    pub url: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }
}

/// System-of-record snapshot of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRow {
    pub id: String,
    pub friendly_type: String,
    pub name: String,
    /// Raw mime for files, [`FOLDER_MIME`] for folders.
    pub mime: String,
    pub url: String,
    pub parent_id: String,
    pub levels: [String; LEVEL_COUNT],
    pub tag: String,
    pub cached_at: String,
    pub full_path: String,
}

impl CacheRow {
    pub fn is_folder(&self) -> bool {
        self.friendly_type == FOLDER_TYPE
    }

    pub fn to_values(&self) -> Row {
        let [l1, l2, l3, l4] = self.levels.clone();
        vec![
            self.id.clone(),
            self.friendly_type.clone(),
            self.name.clone(),
            self.mime.clone(),
            self.url.clone(),
            self.parent_id.clone(),
            l1,
            l2,
            l3,
            l4,
            self.tag.clone(),
            self.cached_at.clone(),
            self.full_path.clone(),
        ]
    }

    /// Parses a stored row. Returns `None` for rows without an id, which are
    /// treated as empty space rather than items.
    pub fn from_values(values: &[String]) -> Option<Self> {
        let cell = |i: usize| values.get(i).cloned().unwrap_or_default();
        let id = cell(0).trim().to_string();
        if id.is_empty() {
            return None;
        }
        Some(Self {
            id,
            friendly_type: cell(1),
            name: cell(2),
            mime: cell(3),
            url: cell(4),
            parent_id: cell(5),
            levels: [cell(6), cell(7), cell(8), cell(9)],
            tag: cell(10),
            cached_at: cell(11),
            full_path: cell(12),
        })
    }

    /// Names of the tracked fields that differ between two snapshots of the same
    /// item. `tag` and `cached_at` are never tracked.
    pub fn changed_fields(&self, other: &CacheRow) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.name != other.name {
            changed.push("name");
        }
        if self.friendly_type != other.friendly_type {
            changed.push("type");
        }
        if self.mime != other.mime {
            changed.push("mime");
        }
        if self.url != other.url {
            changed.push("url");
        }
        if self.parent_id != other.parent_id {
            changed.push("parent_id");
        }
        if self.levels != other.levels {
            changed.push("levels");
        }
        if self.full_path != other.full_path {
            changed.push("full_path");
        }
        changed
    }
}

/// Display projection of a [`CacheRow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub id: String,
    pub levels: [String; LEVEL_COUNT],
    pub name: String,
    pub friendly_type: String,
    pub url: String,
    pub tag: String,
    pub full_path: String,
}

impl IndexRow {
    pub fn to_values(&self) -> Row {
        let [l1, l2, l3, l4] = self.levels.clone();
        vec![
            self.id.clone(),
            l1,
            l2,
            l3,
            l4,
            self.name.clone(),
            self.friendly_type.clone(),
            self.url.clone(),
            self.tag.clone(),
            self.full_path.clone(),
        ]
    }

    pub fn from_values(values: &[String]) -> Option<Self> {
        let cell = |i: usize| values.get(i).cloned().unwrap_or_default();
        let id = cell(0).trim().to_string();
        if id.is_empty() {
            return None;
        }
        Some(Self {
            id,
            levels: [cell(1), cell(2), cell(3), cell(4)],
            name: cell(5),
            friendly_type: cell(6),
            url: cell(7),
            tag: cell(8),
            full_path: cell(9),
        })
    }
}
