//! Full rebuild: clear both data regions and append every admitted item.
//!
//! The walk runs to completion before anything is cleared, so a source failure
//! leaves the tables as they were. Tags in the old Cache are carried over by id.

use crate::codec::{format_timestamp, index_row_from_cache, to_cache_row};
use crate::commands::helpers::{plural, read_cache, walk_admitted};
use crate::commands::{CmdMessage, CmdResult, SyncSummary};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::model::{CacheRow, Row, CACHE_HEADERS, INDEX_HEADERS};
use crate::source::TreeSource;
use crate::table::{append_after_data, write_header, TableStore};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

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
    info!(root = root_id, "full rebuild started");

    let walk = walk_admitted(source, root_id, config)?;
    let tags: HashMap<String, String> = read_cache(cache, config)?
        .into_iter()
        .filter(|r| !r.tag.is_empty())
        .map(|r| (r.id, r.tag))
        .collect();

    let cached_at = format_timestamp(now, &config.timestamp_format)?;
    let mut seen = HashSet::new();
    let mut rows: Vec<CacheRow> = Vec::with_capacity(walk.entries.len());
    for entry in &walk.entries {
        let tag = tags.get(entry.item.id.trim()).map(String::as_str).unwrap_or("");
        let Some(row) = to_cache_row(&entry.item, &entry.path, &entry.parent_id, tag, &cached_at)
        else {
            warn!(name = %entry.item.name, "skipping item without an id");
            continue;
        };
        if seen.insert(row.id.clone()) {
            rows.push(row);
        }
    }

    cache.clear_from(config.cache_start_row)?;
    index.clear_from(config.index_start_row)?;
    write_header(cache, config.cache_header_row(), &CACHE_HEADERS)?;
    write_header(index, config.index_header_row(), &INDEX_HEADERS)?;

    let cache_values: Vec<Row> = rows.iter().map(CacheRow::to_values).collect();
    let index_values: Vec<Row> = rows
        .iter()
        .map(|r| index_row_from_cache(r).to_values())
        .collect();
    append_after_data(cache, config.cache_start_row, &cache_values)?;
    append_after_data(index, config.index_start_row, &index_values)?;

    let tagged = rows.iter().filter(|r| !r.tag.is_empty()).count();
    info!(rows = rows.len(), tagged, "full rebuild finished");

    let summary = SyncSummary {
        root_id: walk.root_id,
        walked: walk.walked,
        skipped: walk.skipped,
        added: rows.len(),
        write_calls: if rows.is_empty() { 0 } else { 2 },
        ..Default::default()
    };
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Rebuilt both tables with {}.",
        plural(rows.len(), "item")
    )));
    if tagged > 0 {
        result.add_message(CmdMessage::info(format!(
            "Kept tags on {}.",
            plural(tagged, "item")
        )));
    }
    Ok(result.with_summary(summary))
}
