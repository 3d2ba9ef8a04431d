//! Verify the Cache↔Index binding and repair the Index.
//!
//! The Cache is the authority. Every Cache id must have exactly one Index row
//! equal to its projection; [`align_index`] fixes anything else, the same way
//! every incremental pass does after its Cache writes.

use crate::commands::helpers::{parse_cache, plural, read_cache_values};
use crate::commands::{CmdMessage, CmdResult, DoctorReport};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::reconcile::align_index;
use crate::row_index::RowIndex;
use crate::table::TableStore;
use tracing::info;

pub fn run<C, I>(cache: &C, index: &I, config: &IndexConfig) -> Result<CmdResult>
where
    C: TableStore + ?Sized,
    I: TableStore + ?Sized,
{
    config.validate()?;

    let cache_values = read_cache_values(cache, config)?;
    let cache_duplicates = RowIndex::from_rows(&cache_values, config.cache_start_row)
        .duplicates()
        .len();
    let repair = align_index(config, &parse_cache(&cache_values), index)?;
    let report = DoctorReport {
        orphans_removed: repair.orphans_removed,
        duplicates_removed: repair.duplicates_removed,
        missing_added: repair.missing_added,
        drifted_rewritten: repair.drifted_rewritten,
        cache_duplicates,
    };

    info!(?report, "doctor finished");
    let mut result = CmdResult::default();
    if report.is_clean() {
        result.add_message(CmdMessage::success("No inconsistencies found."));
    } else {
        result.add_message(CmdMessage::warning("Inconsistencies found and fixed:"));
        let lines = [
            (report.orphans_removed, "Removed", "Index row(s) with no Cache row."),
            (report.duplicates_removed, "Removed", "duplicate Index row(s)."),
            (report.missing_added, "Added", "missing Index row(s)."),
            (report.drifted_rewritten, "Rewrote", "Index row(s) that drifted from the Cache."),
        ];
        for (count, verb, what) in lines {
            if count > 0 {
                result.add_message(CmdMessage::info(format!("  - {} {} {}", verb, count, what)));
            }
        }
        if report.cache_duplicates > 0 {
            result.add_message(CmdMessage::warning(format!(
                "  - The Cache stores {} more than once. Run `driveindex rebuild` to clear them.",
                plural(report.cache_duplicates, "id")
            )));
        }
    }
    Ok(result.with_doctor(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::index_row_from_cache;
    use crate::commands::helpers::read_index;
    use crate::fixtures::{cache_row, seeded_from, seeded_tables};

    fn index_ids(index: &dyn TableStore, config: &IndexConfig) -> Vec<String> {
        read_index(index, config)
            .unwrap()
            .into_iter()
            .map(|(_, r)| r.id)
            .collect()
    }

    #[test]
    fn consistent_tables_are_clean() {
        let config = IndexConfig::default();
        let (cache, index) = seeded_tables(&config, &["a", "b"]);
        let result = run(&cache, &index, &config).unwrap();
        assert!(result.doctor.unwrap().is_clean());
        assert!(result.messages[0].content.contains("No inconsistencies"));
        assert!(index.write_calls().is_empty());
    }

    #[test]
    fn repairs_every_kind_of_drift() {
        let config = IndexConfig::default();
        let (cache, index) = seeded_tables(&config, &["a", "b", "c"]);
        // Index: a, zombie, a (dup), c with a stale name; b missing.
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

        let result = run(&cache, &index, &config).unwrap();
        let report = result.doctor.unwrap();
        assert_eq!(report.orphans_removed, 1);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.missing_added, 1);
        assert_eq!(report.drifted_rewritten, 1);

        assert_eq!(index_ids(&index, &config), vec!["a", "c", "b"]);
        let c = read_index(&index, &config).unwrap()[1].1.clone();
        assert_eq!(c.name, "c");

        // A second run finds nothing left to do.
        let again = run(&cache, &index, &config).unwrap();
        assert!(again.doctor.unwrap().is_clean());
    }

    #[test]
    fn reports_cache_duplicates() {
        let config = IndexConfig::default();
        let (cache, index) = seeded_tables(&config, &["a", "a"]);
        let result = run(&cache, &index, &config).unwrap();
        let report = result.doctor.unwrap();
        assert_eq!(report.cache_duplicates, 1);
        assert_eq!(report.duplicates_removed, 1);
        assert!(result.messages.iter().any(|m| m.content.contains("rebuild")));
    }

    #[test]
    fn agrees_with_rebuild_index_on_duplicate_cache_ids() {
        let config = IndexConfig::default();
        let mut newer = cache_row("a");
        newer.name = "a newer".to_string();
        let (cache, index) = seeded_from(&config, &[cache_row("a"), cache_row("b"), newer]);
        crate::commands::rebuild_index::run(&cache, &index, &config).unwrap();

        let report = run(&cache, &index, &config).unwrap().doctor.unwrap();
        assert_eq!(report.drifted_rewritten, 0);
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(report.cache_duplicates, 1);
        let (_, a) = read_index(&index, &config)
            .unwrap()
            .into_iter()
            .find(|(_, r)| r.id == "a")
            .unwrap();
        assert_eq!(a.name, "a newer");
    }
}
