use crate::commands::helpers::{read_cache, read_index};
use crate::commands::{CmdMessage, CmdResult, Stats};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::table::TableStore;

pub fn run<C, I>(cache: &C, index: &I, config: &IndexConfig) -> Result<CmdResult>
where
    C: TableStore + ?Sized,
    I: TableStore + ?Sized,
{
    let rows = read_cache(cache, config)?;
    let mut stats = Stats {
        cache_rows: rows.len(),
        index_rows: read_index(index, config)?.len(),
        ..Default::default()
    };
    for row in &rows {
        if row.is_folder() {
            stats.folders += 1;
        } else {
            stats.files += 1;
        }
        if !row.tag.is_empty() {
            stats.tagged += 1;
        }
        *stats.by_type.entry(row.friendly_type.clone()).or_default() += 1;
    }
    // The configured format sorts chronologically as text.
    stats.last_cached_at = rows
        .iter()
        .map(|r| r.cached_at.as_str())
        .filter(|s| !s.is_empty())
        .max()
        .map(str::to_string);

    let mut result = CmdResult::default();
    if stats.cache_rows != stats.index_rows {
        result.add_message(CmdMessage::warning(format!(
            "Cache has {} rows but Index has {}. Run `driveindex doctor`.",
            stats.cache_rows, stats.index_rows
        )));
    }
    Ok(result.with_stats(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sync;
    use crate::fixtures::{cache_row, sample_tree, seeded_from};
    use crate::table::mem::MemTable;
    use chrono::{TimeZone, Utc};

    #[test]
    fn counts_the_sample_tree() {
        let config = IndexConfig::default();
        let cache = MemTable::new();
        let index = MemTable::new();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        sync::run(&sample_tree(), &cache, &index, &config, "root", now).unwrap();

        let result = run(&cache, &index, &config).unwrap();
        let stats = result.stats.unwrap();
        assert_eq!(stats.cache_rows, 6);
        assert_eq!(stats.index_rows, 6);
        assert_eq!(stats.folders, 3);
        assert_eq!(stats.files, 3);
        assert_eq!(stats.by_type["Folder"], 3);
        assert_eq!(stats.by_type["Word"], 1);
        assert_eq!(stats.last_cached_at.as_deref(), Some("2024-01-02 03:04:05"));
        assert!(result.messages.is_empty());
    }

    #[test]
    fn warns_on_table_size_mismatch() {
        let config = IndexConfig::default();
        let mut tagged = cache_row("a");
        tagged.tag = "T".to_string();
        let (cache, index) = seeded_from(&config, &[tagged, cache_row("b")]);
        index.delete_row(6).unwrap();

        let result = run(&cache, &index, &config).unwrap();
        assert_eq!(result.stats.as_ref().unwrap().tagged, 1);
        assert!(result.messages[0].content.contains("doctor"));
    }
}
