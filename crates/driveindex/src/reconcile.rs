//! # Reconciler
//!
//! Applies a [`CacheDiff`] to the Cache and Index tables.
//!
//! ## Order of Operations
//!
//! 1. **Delete** the rows of every deleted id from both tables. Row numbers come
//!    from the [`RowIndexes`] captured at pass start, sorted descending per table
//!    so no delete shifts a row that is still to be deleted.
//! 2. **Rebuild** both row indexes. Every row below a deleted one moved up; the
//!    pass-start numbers are stale from here on.
//! 3. **Append** added rows after the stored data of each table. Appends shift
//!    nothing, so the rebuilt indexes stay valid.
//! 4. **Update** changed rows in place, as coalesced batches. Before each
//!    table's batch, the id column under the target rows is read back once and
//!    checked; a mismatch is a [`IndexError::StaleRowIndex`].
//!
//! An update whose id has no row in a table (someone deleted it by hand) is
//! appended instead, which is what the next pass would do anyway.
//!
//! ## Index Alignment
//!
//! The diff only sees the Cache. If a pass dies after a Cache write but before
//! the matching Index write, the next diff is empty and the Index would stay
//! behind. [`align_index`] closes that gap: run after the Cache is settled, it
//! compares the Index with the Cache row by row and fixes what differs. The
//! `doctor` command is the same routine run on its own.
//!
//! ## Failure
//!
//! Nothing here is transactional. A failure leaves every call that already
//! succeeded in place and returns the error. Re-running the whole pass
//! recomputes the diff from what the tables now hold and converges.

use crate::batch::{write_batched, RowUpdate};
use crate::codec::index_row_from_cache;
use crate::config::IndexConfig;
use crate::diff::{latest_by_id, CacheDiff};
use crate::error::{IndexError, Result};
use crate::model::{CacheRow, Row, ID_COLUMN, INDEX_WIDTH};
use crate::row_index::RowIndex;
use crate::table::{append_after_data, read_data, TableStore};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Id → row snapshots for both tables.
#[derive(Debug, Clone, Default)]
pub struct RowIndexes {
    pub cache: RowIndex,
    pub index: RowIndex,
}

impl RowIndexes {
    pub fn build<C, I>(config: &IndexConfig, cache: &C, index: &I) -> Result<Self>
    where
        C: TableStore + ?Sized,
        I: TableStore + ?Sized,
    {
        Ok(Self {
            cache: RowIndex::build(cache, config.cache_start_row)?,
            index: RowIndex::build(index, config.index_start_row)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub cache_rows_deleted: usize,
    pub index_rows_deleted: usize,
    /// Updates that found no row to update and were appended.
    pub repaired: usize,
    pub write_calls: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.deleted == 0
    }
}

pub struct Reconciler<'a> {
    config: &'a IndexConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a IndexConfig) -> Self {
        Self { config }
    }

    pub fn apply<C, I>(
        &self,
        diff: &CacheDiff,
        cache: &C,
        index: &I,
        rows: RowIndexes,
    ) -> Result<ReconcileReport>
    where
        C: TableStore + ?Sized,
        I: TableStore + ?Sized,
    {
        let mut report = ReconcileReport {
            added: diff.to_add.len(),
            updated: diff.to_update.len(),
            deleted: diff.to_delete.len(),
            ..Default::default()
        };

        // 1. Delete
        let rows = if diff.to_delete.is_empty() {
            rows
        } else {
            let gone: HashSet<&str> = diff.to_delete.iter().map(String::as_str).collect();
            report.cache_rows_deleted = delete_descending(cache, &rows.cache, &gone)?;
            report.index_rows_deleted = delete_descending(index, &rows.index, &gone)?;
            // 2. Rebuild
            RowIndexes::build(self.config, cache, index)?
        };

        // Classify updates before appending so repairs join the single append call.
        let mut cache_appends: Vec<Row> = diff.to_add.iter().map(|r| r.to_values()).collect();
        let mut index_appends: Vec<Row> = diff
            .to_add
            .iter()
            .map(|r| index_row_from_cache(r).to_values())
            .collect();
        let mut cache_updates = Vec::new();
        let mut index_updates = Vec::new();

        for update in &diff.to_update {
            let row = &update.new_row;
            match rows.cache.get(&update.id) {
                Some(n) => cache_updates.push((update.id.clone(), RowUpdate::new(n, row.to_values()))),
                None => {
                    warn!(id = %update.id, "changed item has no Cache row, appending");
                    cache_appends.push(row.to_values());
                    report.repaired += 1;
                }
            }
            let projected = index_row_from_cache(row).to_values();
            match rows.index.get(&update.id) {
                Some(n) => index_updates.push((update.id.clone(), RowUpdate::new(n, projected))),
                None => {
                    warn!(id = %update.id, "changed item has no Index row, appending");
                    index_appends.push(projected);
                    report.repaired += 1;
                }
            }
        }

        // 3. Append
        if !cache_appends.is_empty() {
            append_after_data(cache, self.config.cache_start_row, &cache_appends)?;
            report.write_calls += 1;
        }
        if !index_appends.is_empty() {
            append_after_data(index, self.config.index_start_row, &index_appends)?;
            report.write_calls += 1;
        }

        // 4. Update
        report.write_calls += update_checked(cache, cache_updates)?;
        report.write_calls += update_checked(index, index_updates)?;

        info!(
            added = report.added,
            updated = report.updated,
            deleted = report.deleted,
            write_calls = report.write_calls,
            "reconciled"
        );
        Ok(report)
    }
}

/// What [`align_index`] had to fix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRepair {
    /// Index rows whose id is not in the Cache.
    pub orphans_removed: usize,
    /// Index rows shadowed by a later row with the same id.
    pub duplicates_removed: usize,
    pub missing_added: usize,
    pub drifted_rewritten: usize,
    pub write_calls: usize,
}

impl IndexRepair {
    pub fn total(&self) -> usize {
        self.orphans_removed + self.duplicates_removed + self.missing_added + self.drifted_rewritten
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Bring the Index in line with `cache_rows`: exactly one row per Cache id,
/// equal to that row's projection.
///
/// Orphans and duplicates are deleted bottom-up, missing rows go out in one
/// append, and drifted rows are rewritten in coalesced runs after a position
/// check. On a consistent Index this only reads.
pub fn align_index<I>(config: &IndexConfig, cache_rows: &[CacheRow], index: &I) -> Result<IndexRepair>
where
    I: TableStore + ?Sized,
{
    let mut repair = IndexRepair::default();
    let latest = latest_by_id(cache_rows);
    let expected: HashMap<&str, Row> = latest
        .iter()
        .map(|r| (r.id.as_str(), index_row_from_cache(r).to_values()))
        .collect();

    let rows = RowIndex::build(index, config.index_start_row)?;
    let mut doomed: Vec<usize> = Vec::new();
    for (id, row) in rows.iter() {
        if !expected.contains_key(id) {
            doomed.push(row);
            repair.orphans_removed += 1;
        }
    }
    for (id, row) in rows.duplicates() {
        doomed.push(*row);
        if expected.contains_key(id.as_str()) {
            repair.duplicates_removed += 1;
        } else {
            repair.orphans_removed += 1;
        }
    }
    doomed.sort_unstable_by(|a, b| b.cmp(a));
    doomed.dedup();
    for row in &doomed {
        index.delete_row(*row)?;
    }

    let rows = if doomed.is_empty() {
        rows
    } else {
        RowIndex::build(index, config.index_start_row)?
    };
    let stored = read_data(index, config.index_start_row, INDEX_WIDTH)?;
    let mut appends: Vec<Row> = Vec::new();
    let mut rewrites: Vec<(String, RowUpdate)> = Vec::new();
    for cached in latest {
        let id = cached.id.as_str();
        let Some(values) = expected.get(id) else {
            continue;
        };
        match rows.get(id) {
            None => {
                appends.push(values.clone());
                repair.missing_added += 1;
            }
            Some(row) => {
                if stored.get(row - config.index_start_row) != Some(values) {
                    rewrites.push((id.to_string(), RowUpdate::new(row, values.clone())));
                    repair.drifted_rewritten += 1;
                }
            }
        }
    }

    if !appends.is_empty() {
        append_after_data(index, config.index_start_row, &appends)?;
        repair.write_calls += 1;
    }
    repair.write_calls += update_checked(index, rewrites)?;

    if !repair.is_empty() {
        warn!(?repair, "index realigned with the cache");
    }
    Ok(repair)
}

/// Delete every row whose id is in `gone`, duplicates included, bottom-up.
fn delete_descending<T: TableStore + ?Sized>(
    table: &T,
    rows: &RowIndex,
    gone: &HashSet<&str>,
) -> Result<usize> {
    let mut targets: Vec<usize> = rows
        .iter()
        .chain(rows.duplicates().iter().map(|(id, row)| (id.as_str(), *row)))
        .filter(|(id, _)| gone.contains(id))
        .map(|(_, row)| row)
        .collect();
    targets.sort_unstable_by(|a, b| b.cmp(a));
    targets.dedup();

    debug!(rows = ?targets, "deleting rows");
    for row in &targets {
        table.delete_row(*row)?;
    }
    Ok(targets.len())
}

/// Verify the ids under the target rows, then write them as coalesced batches.
fn update_checked<T: TableStore + ?Sized>(
    table: &T,
    updates: Vec<(String, RowUpdate)>,
) -> Result<usize> {
    if updates.is_empty() {
        return Ok(0);
    }
    verify_positions(table, updates.iter().map(|(id, u)| (id.as_str(), u.row)))?;
    write_batched(table, updates.into_iter().map(|(_, u)| u).collect())
}

/// Read the id column spanning `expected` once and check each `(id, row)` pair.
pub fn verify_positions<'a, T, E>(table: &T, expected: E) -> Result<()>
where
    T: TableStore + ?Sized,
    E: IntoIterator<Item = (&'a str, usize)>,
{
    let expected: Vec<(&str, usize)> = expected.into_iter().collect();
    let (Some(first), Some(last)) = (
        expected.iter().map(|(_, r)| *r).min(),
        expected.iter().map(|(_, r)| *r).max(),
    ) else {
        return Ok(());
    };
    let ids = table.read_rows(first, last - first + 1, ID_COLUMN + 1)?;
    for (id, row) in expected {
        let found = ids
            .get(row - first)
            .and_then(|r| r.get(ID_COLUMN))
            .map(|c| c.trim())
            .unwrap_or_default();
        if found != id {
            return Err(IndexError::StaleRowIndex {
                id: id.to_string(),
                row,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::parse_cache;
    use crate::diff::CacheUpdate;
    use crate::fixtures::{cache_row, seeded_tables};
    use crate::model::CACHE_WIDTH;
    use crate::table::mem::MemTable;

    fn config() -> IndexConfig {
        IndexConfig::default()
    }

    fn cache_ids(cache: &MemTable) -> Vec<String> {
        cache.column(config().cache_start_row, ID_COLUMN)
    }

    fn index_ids(index: &MemTable) -> Vec<String> {
        index.column(config().index_start_row, ID_COLUMN)
    }

    fn apply(d: &CacheDiff, cache: &MemTable, index: &MemTable) -> Result<ReconcileReport> {
        let cfg = config();
        let rows = RowIndexes::build(&cfg, cache, index)?;
        Reconciler::new(&cfg).apply(d, cache, index, rows)
    }

    #[test]
    fn deletes_are_issued_bottom_up() {
        // Cache data starts at 2, so ids c..g sit at rows 4..8 and b,d,f at 3,5,7.
        // Index data starts at 5, so b,d,f sit at 6,8,10.
        let ids = ["a", "b", "c", "d", "e", "f", "g"];
        let (cache, index) = seeded_tables(&config(), &ids);
        let d = CacheDiff {
            to_delete: vec!["b".into(), "d".into(), "f".into()],
            ..Default::default()
        };
        apply(&d, &cache, &index).unwrap();

        assert_eq!(cache.delete_calls(), vec![7, 5, 3]);
        assert_eq!(index.delete_calls(), vec![10, 8, 6]);
        assert_eq!(cache_ids(&cache), vec!["a", "c", "e", "g"]);
        assert_eq!(index_ids(&index), vec!["a", "c", "e", "g"]);
    }

    #[test]
    fn updates_after_deletes_hit_the_shifted_rows() {
        let ids = ["a", "b", "c", "d"];
        let (cache, index) = seeded_tables(&config(), &ids);
        let mut moved = cache_row("d");
        moved.name = "d renamed".to_string();
        let d = CacheDiff {
            to_update: vec![CacheUpdate {
                id: "d".into(),
                new_row: moved,
                changed: vec!["name"],
            }],
            to_delete: vec!["a".into()],
            ..Default::default()
        };
        apply(&d, &cache, &index).unwrap();

        let stored = read_data(&cache, 2, CACHE_WIDTH).unwrap();
        let d_row = CacheRow::from_values(&stored[2]).unwrap();
        assert_eq!(d_row.id, "d");
        assert_eq!(d_row.name, "d renamed");
        // Neighbours untouched.
        assert_eq!(CacheRow::from_values(&stored[1]).unwrap().name, "c");
        assert_eq!(index_ids(&index), vec!["b", "c", "d"]);
    }

    #[test]
    fn adds_are_one_append_per_table() {
        let (cache, index) = seeded_tables(&config(), &["a"]);
        cache.clear_calls();
        index.clear_calls();
        let d = CacheDiff {
            to_add: vec![cache_row("x"), cache_row("y")],
            ..Default::default()
        };
        let report = apply(&d, &cache, &index).unwrap();
        assert_eq!(report.write_calls, 2);
        assert_eq!(cache.write_calls(), vec![(3, 2)]);
        assert_eq!(index.write_calls(), vec![(6, 2)]);
        assert_eq!(index_ids(&index), vec!["a", "x", "y"]);
    }

    #[test]
    fn first_pass_into_empty_index_respects_reserved_rows() {
        let cache = MemTable::new();
        let index = MemTable::new();
        let d = CacheDiff {
            to_add: vec![cache_row("x")],
            ..Default::default()
        };
        apply(&d, &cache, &index).unwrap();
        assert_eq!(index.write_calls(), vec![(5, 1)]);
        assert_eq!(cache.write_calls(), vec![(2, 1)]);
    }

    #[test]
    fn missing_index_row_is_appended() {
        let (cache, index) = seeded_tables(&config(), &["a", "b"]);
        index.delete_row(5).unwrap();
        let mut changed = cache_row("a");
        changed.url = "https://new".to_string();
        let d = CacheDiff {
            to_update: vec![CacheUpdate {
                id: "a".into(),
                new_row: changed,
                changed: vec!["url"],
            }],
            ..Default::default()
        };
        let report = apply(&d, &cache, &index).unwrap();
        assert_eq!(report.repaired, 1);
        assert_eq!(index_ids(&index), vec!["b", "a"]);
    }

    #[test]
    fn stale_positions_are_rejected() {
        let (cache, index) = seeded_tables(&config(), &["a", "b", "c"]);
        let cfg = config();
        let rows = RowIndexes::build(&cfg, &cache, &index).unwrap();
        // Shift rows behind the reconciler's back.
        cache.delete_row(2).unwrap();
        let d = CacheDiff {
            to_update: vec![CacheUpdate {
                id: "c".into(),
                new_row: cache_row("c"),
                changed: vec!["name"],
            }],
            ..Default::default()
        };
        let err = Reconciler::new(&cfg).apply(&d, &cache, &index, rows).unwrap_err();
        assert!(matches!(err, IndexError::StaleRowIndex { ref id, row: 4 } if id == "c"));
    }

    #[test]
    fn write_failure_surfaces_and_keeps_committed_deletes() {
        let (cache, index) = seeded_tables(&config(), &["a", "b"]);
        index.set_simulate_write_error(true);
        let d = CacheDiff {
            to_delete: vec!["a".into()],
            ..Default::default()
        };
        assert!(apply(&d, &cache, &index).is_err());
        assert_eq!(cache_ids(&cache), vec!["b"]);
        assert_eq!(index_ids(&index), vec!["a", "b"]);

        // The Cache no longer knows "a"; only alignment can clear it.
        index.set_simulate_write_error(false);
        let cached = parse_cache(&read_data(&cache, 2, CACHE_WIDTH).unwrap());
        let repair = align_index(&config(), &cached, &index).unwrap();
        assert_eq!(repair.orphans_removed, 1);
        assert_eq!(index_ids(&index), vec!["b"]);
    }

    #[test]
    fn align_index_fixes_every_kind_of_divergence() {
        let (cache, index) = seeded_tables(&config(), &["a", "b", "c"]);
        let mut stale = index_row_from_cache(&cache_row("c"));
        stale.name = "old name".to_string();
        index.clear_from(5).unwrap();
        index
            .write_rows(
                5,
                &[
                    index_row_from_cache(&cache_row("a")).to_values(),
                    index_row_from_cache(&cache_row("zombie")).to_values(),
                    index_row_from_cache(&cache_row("a")).to_values(),
                    stale.to_values(),
                ],
            )
            .unwrap();
        index.clear_calls();

        let cached = parse_cache(&read_data(&cache, 2, CACHE_WIDTH).unwrap());
        let repair = align_index(&config(), &cached, &index).unwrap();
        assert_eq!(repair.orphans_removed, 1);
        assert_eq!(repair.duplicates_removed, 1);
        assert_eq!(repair.missing_added, 1);
        assert_eq!(repair.drifted_rewritten, 1);
        assert_eq!(repair.write_calls, 2);
        // The earlier "a" at row 5 is shadowed by row 7.
        assert_eq!(index.delete_calls(), vec![6, 5]);
        assert_eq!(index_ids(&index), vec!["a", "c", "b"]);

        index.clear_calls();
        assert!(align_index(&config(), &cached, &index).unwrap().is_empty());
        assert!(index.write_calls().is_empty());
    }

    #[test]
    fn duplicate_rows_of_deleted_ids_go_too() {
        let (cache, index) = seeded_tables(&config(), &["a", "b", "a"]);
        let d = CacheDiff {
            to_delete: vec!["a".into()],
            ..Default::default()
        };
        let report = apply(&d, &cache, &index).unwrap();
        assert_eq!(report.cache_rows_deleted, 2);
        assert_eq!(cache_ids(&cache), vec!["b"]);
        assert_eq!(index_ids(&index), vec!["b"]);
    }
}
