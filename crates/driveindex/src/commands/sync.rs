//! Incremental pass: walk, admit, diff against the Cache, reconcile both tables,
//! then align the Index with the settled Cache so a pass that died halfway
//! through its Index writes is healed by the next one.

use crate::codec::format_timestamp;
use crate::commands::helpers::{parse_cache, plural, read_cache, read_cache_values, walk_admitted};
use crate::commands::{CmdMessage, CmdResult, SyncSummary};
use crate::config::IndexConfig;
use crate::diff::{diff, snapshot_by_id};
use crate::error::Result;
use crate::model::{CACHE_HEADERS, INDEX_HEADERS};
use crate::reconcile::{align_index, Reconciler, RowIndexes};
use crate::row_index::RowIndex;
use crate::source::TreeSource;
use crate::table::{ensure_header, TableStore};
use chrono::{DateTime, Utc};
use tracing::info;

pub fn run<S, C, I>(
    source: &S,
    cache: &C,
    index: &I,
    config: &IndexConfig,
    root_id: &str,
    now: DateTime<Utc>,
) -> Result<CmdResult>
where
    S: TreeSource + ?Sized,
    C: TableStore + ?Sized,
    I: TableStore + ?Sized,
{
    config.validate()?;
    info!(root = root_id, "incremental pass started");

    let walk = walk_admitted(source, root_id, config)?;

    ensure_header(cache, config.cache_header_row(), &CACHE_HEADERS)?;
    ensure_header(index, config.index_header_row(), &INDEX_HEADERS)?;

    let cache_values = read_cache_values(cache, config)?;
    let rows = RowIndexes {
        cache: RowIndex::from_rows(&cache_values, config.cache_start_row),
        index: RowIndex::build(index, config.index_start_row)?,
    };
    let prior = snapshot_by_id(parse_cache(&cache_values));

    let cached_at = format_timestamp(now, &config.timestamp_format)?;
    let changes = diff(&prior, walk.entries, &cached_at);
    let report = Reconciler::new(config).apply(&changes, cache, index, rows)?;
    let repair = align_index(config, &read_cache(cache, config)?, index)?;

    let summary = SyncSummary {
        root_id: walk.root_id,
        walked: walk.walked,
        skipped: walk.skipped,
        added: report.added,
        updated: report.updated,
        deleted: report.deleted,
        repaired: report.repaired + repair.total(),
        write_calls: report.write_calls + repair.write_calls,
    };
    info!(
        added = summary.added,
        updated = summary.updated,
        deleted = summary.deleted,
        "incremental pass finished"
    );

    let mut result = CmdResult::default();
    if report.is_noop() {
        result.add_message(CmdMessage::info("No changes."));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Added {}, updated {}, deleted {}.",
            summary.added, summary.updated, summary.deleted
        )));
    }
    if summary.repaired > 0 {
        result.add_message(CmdMessage::warning(format!(
            "Repaired {} that had gone missing or drifted from the Cache.",
            plural(summary.repaired, "row")
        )));
    }
    Ok(result.with_summary(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::index_row_from_cache;
    use crate::commands::helpers::read_index;
    use crate::config::PDF_MIME;
    use crate::error::IndexError;
    use crate::fixtures::sample_tree;
    use crate::model::{IndexRow, ID_COLUMN};
    use crate::source::listing::ListingSource;
    use crate::table::mem::MemTable;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    struct Env {
        source: ListingSource,
        cache: MemTable,
        index: MemTable,
        config: IndexConfig,
    }

    impl Env {
        fn new() -> Self {
            Self {
                source: sample_tree(),
                cache: MemTable::new(),
                index: MemTable::new(),
                config: IndexConfig::default(),
            }
        }

        fn sync_at(&self, day: u32) -> Result<CmdResult> {
            let now = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
            run(&self.source, &self.cache, &self.index, &self.config, "root", now)
        }

        fn sync(&self) -> SyncSummary {
            self.sync_at(1).unwrap().summary.unwrap()
        }

        fn cache_ids(&self) -> BTreeSet<String> {
            read_cache(&self.cache, &self.config)
                .unwrap()
                .into_iter()
                .map(|r| r.id)
                .collect()
        }

        fn index_ids(&self) -> BTreeSet<String> {
            read_index(&self.index, &self.config)
                .unwrap()
                .into_iter()
                .map(|(_, r)| r.id)
                .collect()
        }

        fn live_ids(&self) -> BTreeSet<String> {
            walk_admitted(&self.source, "root", &self.config)
                .unwrap()
                .entries
                .into_iter()
                .map(|e| e.item.id)
                .collect()
        }

        fn tag(&self, id: &str, tag: &str) {
            let rows = RowIndex::build(&self.cache, self.config.cache_start_row).unwrap();
            let row = rows.get(id).unwrap();
            let mut values = self.cache.read_rows(row, 1, 13).unwrap();
            values[0][10] = tag.to_string();
            self.cache.write_rows(row, &values).unwrap();
        }

        /// The Index holds exactly the projection of every Cache row.
        fn assert_index_mirrors_cache(&self) {
            let expected: Vec<(String, IndexRow)> = read_cache(&self.cache, &self.config)
                .unwrap()
                .iter()
                .map(|r| (r.id.clone(), index_row_from_cache(r)))
                .collect();
            let mut actual: Vec<(String, IndexRow)> = read_index(&self.index, &self.config)
                .unwrap()
                .into_iter()
                .map(|(_, r)| (r.id.clone(), r))
                .collect();
            let mut expected = expected;
            expected.sort_by(|a, b| a.0.cmp(&b.0));
            actual.sort_by(|a, b| a.0.cmp(&b.0));
            assert_eq!(actual, expected);
        }

        /// Apply `change` to the tree, sync with a failing Index, then sync again.
        fn sync_through_index_failure(&mut self, change: impl FnOnce(&mut ListingSource)) -> SyncSummary {
            self.sync();
            change(&mut self.source);
            self.index.set_simulate_write_error(true);
            assert!(matches!(self.sync_at(2), Err(IndexError::Table(_))));
            self.index.set_simulate_write_error(false);
            self.sync_at(3).unwrap().summary.unwrap()
        }

        fn cache_row(&self, id: &str) -> crate::model::CacheRow {
            read_cache(&self.cache, &self.config)
                .unwrap()
                .into_iter()
                .find(|r| r.id == id)
                .unwrap()
        }
    }

    #[test]
    fn first_pass_fills_both_tables() {
        let env = Env::new();
        let summary = env.sync();
        assert_eq!(summary.added, 6);
        assert_eq!(summary.skipped, 1);
        assert_eq!(env.cache_ids(), env.live_ids());
        assert_eq!(env.index_ids(), env.live_ids());

        let header = env.index.read_rows(4, 1, 1).unwrap();
        assert_eq!(header[0][0], "ID*");
        assert_eq!(env.cache.read_rows(1, 1, 1).unwrap()[0][0], "ID");
    }

    #[test]
    fn second_pass_is_a_noop() {
        let env = Env::new();
        env.sync();
        env.cache.clear_calls();
        env.index.clear_calls();

        let result = env.sync_at(2).unwrap();
        let summary = result.summary.unwrap();
        assert_eq!((summary.added, summary.updated, summary.deleted), (0, 0, 0));
        assert!(result.messages[0].content.contains("No changes"));
        assert!(env.cache.write_calls().is_empty());
        assert!(env.index.write_calls().is_empty());
        assert!(env.cache.delete_calls().is_empty());
        // Unchanged rows keep their original stamp.
        assert_eq!(env.cache_row("plan").cached_at, "2024-03-01 12:00:00");
    }

    #[test]
    fn converges_after_mixed_mutations() {
        let mut env = Env::new();
        env.sync();

        env.source.rename("plan", "plan-v2.docx");
        env.source.move_to("alpha", "archive");
        env.source.remove("budget");
        env.source.add("new", "new.pdf", PDF_MIME, "archive");
        env.source.set_trashed("projects", true);

        let summary = env.sync_at(2).unwrap().summary.unwrap();
        assert_eq!(env.cache_ids(), env.live_ids());
        assert_eq!(env.index_ids(), env.live_ids());
        assert!(summary.deleted >= 2);

        let report = env.cache_row("report");
        assert_eq!(report.full_path, "Archive/Alpha/report.pdf");
        assert_eq!(report.levels[0], "Archive");
        assert_eq!(report.cached_at, "2024-03-02 12:00:00");

        // Every index row still sits next to the right id after the shifts.
        for (row, entry) in read_index(&env.index, &env.config).unwrap() {
            let id = &env.index.read_rows(row, 1, 1).unwrap()[0][ID_COLUMN];
            assert_eq!(id, &entry.id);
            assert_eq!(entry.full_path, env.cache_row(&entry.id).full_path);
        }
    }

    #[test]
    fn tags_survive_rename_and_move() {
        let mut env = Env::new();
        env.sync();
        env.tag("report", "T");

        env.source.rename("report", "final.pdf");
        env.source.move_to("report", "root");
        env.sync_at(2).unwrap();

        let row = env.cache_row("report");
        assert_eq!(row.tag, "T");
        assert_eq!(row.full_path, "final.pdf");
        let (_, index_row) = read_index(&env.index, &env.config)
            .unwrap()
            .into_iter()
            .find(|(_, r)| r.id == "report")
            .unwrap();
        assert_eq!(index_row.tag, "T");
    }

    #[test]
    fn unadmitted_files_never_appear() {
        let env = Env::new();
        env.sync();
        env.sync_at(2).unwrap();
        assert!(!env.cache_ids().contains("png"));
        assert!(!env.index_ids().contains("png"));
    }

    #[test]
    fn rows_above_index_data_are_left_alone() {
        let env = Env::new();
        env.index
            .write_rows(1, &[vec!["Drive Index".to_string()], vec!["filter:".to_string()]])
            .unwrap();
        env.sync();
        assert_eq!(env.index.read_rows(1, 2, 1).unwrap()[1][0], "filter:");
        // Not a fresh table, so no header was forced into row 4.
        assert_eq!(env.index.read_rows(4, 1, 1).unwrap()[0][0], "");
        assert_eq!(env.index_ids(), env.live_ids());
    }

    #[test]
    fn unavailable_root_writes_nothing() {
        let env = Env::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let err = run(&env.source, &env.cache, &env.index, &env.config, "nope", now).unwrap_err();
        assert!(matches!(err, IndexError::SourceUnavailable(_)));
        assert!(env.cache.calls().is_empty());
        assert!(env.index.calls().is_empty());
    }

    #[test]
    fn listing_failure_mid_walk_writes_nothing() {
        let mut env = Env::new();
        env.source.fail_listing("alpha");
        assert!(matches!(env.sync_at(1), Err(IndexError::Source(_))));
        assert_eq!(env.cache.row_count().unwrap(), 0);
        assert_eq!(env.index.row_count().unwrap(), 0);
    }

    #[test]
    fn bad_timestamp_format_fails_before_any_write() {
        let mut env = Env::new();
        env.config.timestamp_format = "%Y-%Q".to_string();
        assert!(matches!(env.sync_at(1), Err(IndexError::Config(_))));
        assert!(env.cache.calls().is_empty());
        assert!(env.index.calls().is_empty());
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let mut env = Env::new();
        env.config.cache_start_row = 1;
        assert!(matches!(env.sync_at(1), Err(IndexError::Config(_))));
    }

    #[test]
    fn rename_lost_on_the_index_is_healed_by_the_next_pass() {
        let mut env = Env::new();
        let summary = env.sync_through_index_failure(|s| s.rename("plan", "plan-v2.docx"));
        assert_eq!((summary.added, summary.updated, summary.deleted), (0, 0, 0));
        assert_eq!(summary.repaired, 1);
        assert_eq!(env.cache_row("plan").name, "plan-v2.docx");
        env.assert_index_mirrors_cache();
    }

    #[test]
    fn delete_lost_on_the_index_is_healed_by_the_next_pass() {
        let mut env = Env::new();
        env.sync_through_index_failure(|s| s.remove("budget"));
        assert!(!env.cache_ids().contains("budget"));
        assert!(!env.index_ids().contains("budget"));
        env.assert_index_mirrors_cache();
    }

    #[test]
    fn add_lost_on_the_index_is_healed_by_the_next_pass() {
        let mut env = Env::new();
        env.sync_through_index_failure(|s| s.add("new", "new.pdf", PDF_MIME, "archive"));
        assert!(env.index_ids().contains("new"));
        assert_eq!(env.index_ids(), env.live_ids());
        env.assert_index_mirrors_cache();
    }

    #[test]
    fn consistent_tables_need_no_repair() {
        let env = Env::new();
        env.sync();
        let result = env.sync_at(2).unwrap();
        assert_eq!(result.summary.unwrap().repaired, 0);
        assert_eq!(result.messages.len(), 1);
        env.assert_index_mirrors_cache();
    }
}
