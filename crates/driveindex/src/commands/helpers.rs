use crate::config::IndexConfig;
use crate::error::Result;
use crate::model::{CacheRow, IndexRow, Row, CACHE_WIDTH, INDEX_WIDTH};
use crate::source::TreeSource;
use crate::table::{read_data, TableStore};
use crate::walker::{WalkEntry, Walker};
use tracing::debug;

/// A fully materialized walk, already filtered by the allow-list.
#[derive(Debug, Clone, Default)]
pub struct AdmittedWalk {
    pub root_id: String,
    pub entries: Vec<WalkEntry>,
    pub walked: usize,
    pub skipped: usize,
}

/// Walk the whole tree and keep folders plus admitted files.
///
/// The walk is collected before returning, so a source failure surfaces here
/// and no table has been written yet.
pub fn walk_admitted<S: TreeSource + ?Sized>(
    source: &S,
    root_id: &str,
    config: &IndexConfig,
) -> Result<AdmittedWalk> {
    let walker = Walker::new(source, root_id)?;
    let mut walk = AdmittedWalk {
        root_id: walker.root_id().to_string(),
        ..Default::default()
    };
    for entry in walker {
        let entry = entry?;
        walk.walked += 1;
        if entry.item.is_folder() || config.admits(&entry.item.mime) {
            walk.entries.push(entry);
        } else {
            walk.skipped += 1;
        }
    }
    debug!(
        walked = walk.walked,
        admitted = walk.entries.len(),
        skipped = walk.skipped,
        "walk complete"
    );
    Ok(walk)
}

/// Raw Cache data rows, padded to the Cache width.
pub fn read_cache_values<T: TableStore + ?Sized>(
    cache: &T,
    config: &IndexConfig,
) -> Result<Vec<Row>> {
    read_data(cache, config.cache_start_row, CACHE_WIDTH)
}

/// Parsed Cache rows, blank-id rows dropped.
pub fn read_cache<T: TableStore + ?Sized>(cache: &T, config: &IndexConfig) -> Result<Vec<CacheRow>> {
    Ok(parse_cache(&read_cache_values(cache, config)?))
}

pub fn parse_cache(values: &[Row]) -> Vec<CacheRow> {
    values.iter().filter_map(|r| CacheRow::from_values(r)).collect()
}

/// Index data rows with their physical row numbers, blank-id rows dropped.
pub fn read_index<T: TableStore + ?Sized>(
    index: &T,
    config: &IndexConfig,
) -> Result<Vec<(usize, IndexRow)>> {
    let rows = read_data(index, config.index_start_row, INDEX_WIDTH)?;
    Ok(rows
        .iter()
        .enumerate()
        .filter_map(|(offset, values)| {
            IndexRow::from_values(values).map(|row| (config.index_start_row + offset, row))
        })
        .collect())
}

pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}
