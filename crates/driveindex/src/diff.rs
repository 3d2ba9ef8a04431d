//! # Cache Differ
//!
//! Classifies every freshly walked item against the prior Cache snapshot:
//!
//! - **NEW**: id not in the snapshot. The row gets an empty tag.
//! - **CHANGED**: id present and at least one tracked field differs. The row
//!   inherits the prior tag.
//! - **UNCHANGED**: dropped. Its `cached_at` is deliberately left alone, so an
//!   unchanged tree produces an empty diff.
//! - **DELETED**: id in the snapshot but never seen in this walk.
//!
//! Tracked fields are name, type, mime, url, parent id, the four levels and the
//! full path ([`CacheRow::changed_fields`]). Parent id is compared on its own
//! even though the path is derived from parentage: two folders with the same
//! name produce the same path, and only the parent id tells them apart.
//!
//! The three output sets are disjoint by construction: add and update come from
//! the walk, delete from the complement of the ids seen.

use crate::codec::to_cache_row;
use crate::model::CacheRow;
use crate::walker::WalkEntry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A changed row, with the names of the fields that moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheUpdate {
    pub id: String,
    pub new_row: CacheRow,
    pub changed: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDiff {
    pub to_add: Vec<CacheRow>,
    pub to_update: Vec<CacheUpdate>,
    pub to_delete: Vec<String>,
}

impl CacheDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Index Cache rows by id. A later row wins over an earlier duplicate.
pub fn snapshot_by_id(rows: impl IntoIterator<Item = CacheRow>) -> HashMap<String, CacheRow> {
    rows.into_iter().map(|r| (r.id.clone(), r)).collect()
}

/// One row per id, in first-seen order. Same rule as [`snapshot_by_id`]: a
/// later duplicate replaces the earlier row.
pub fn latest_by_id(rows: &[CacheRow]) -> Vec<&CacheRow> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<&CacheRow> = Vec::new();
    for row in rows {
        match slots.get(row.id.as_str()) {
            Some(&slot) => latest[slot] = row,
            None => {
                slots.insert(row.id.as_str(), latest.len());
                latest.push(row);
            }
        }
    }
    latest
}

/// Diff a walk against the prior snapshot. `cached_at` stamps new and changed
/// rows.
///
/// Items without an id are skipped. If the walk yields the same id twice, the
/// first sighting wins.
pub fn diff<I>(prior: &HashMap<String, CacheRow>, fresh: I, cached_at: &str) -> CacheDiff
where
    I: IntoIterator<Item = WalkEntry>,
{
    let mut out = CacheDiff::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut unchanged = 0usize;

    for entry in fresh {
        let prior_row = prior.get(entry.item.id.trim());
        let prior_tag = prior_row.map(|r| r.tag.as_str()).unwrap_or("");
        let Some(row) = to_cache_row(
            &entry.item,
            &entry.path,
            &entry.parent_id,
            prior_tag,
            cached_at,
        ) else {
            warn!(name = %entry.item.name, "skipping item without an id");
            continue;
        };

        if !seen.insert(row.id.clone()) {
            warn!(id = %row.id, "item seen twice in one walk, keeping the first");
            continue;
        }

        match prior_row {
            None => out.to_add.push(row),
            Some(before) => {
                let changed = before.changed_fields(&row);
                if changed.is_empty() {
                    unchanged += 1;
                } else {
                    debug!(id = %row.id, ?changed, "row changed");
                    out.to_update.push(CacheUpdate {
                        id: row.id.clone(),
                        new_row: row,
                        changed,
                    });
                }
            }
        }
    }

    let mut gone: Vec<String> = prior
        .keys()
        .filter(|id| !seen.contains(*id))
        .cloned()
        .collect();
    gone.sort();
    out.to_delete = gone;

    debug!(
        added = out.to_add.len(),
        updated = out.to_update.len(),
        deleted = out.to_delete.len(),
        unchanged,
        "diff computed"
    );
    out
}
