//! Re-project the whole Index from the Cache. Tags come along from the Cache.
//! When the Cache holds an id twice, the later row is the one projected.

use crate::codec::index_row_from_cache;
use crate::commands::helpers::{plural, read_cache};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::IndexConfig;
use crate::diff::latest_by_id;
use crate::error::Result;
use crate::model::{Row, INDEX_HEADERS};
use crate::table::{append_after_data, write_header, TableStore};
use tracing::info;

pub fn run<C, I>(cache: &C, index: &I, config: &IndexConfig) -> Result<CmdResult>
where
    C: TableStore + ?Sized,
    I: TableStore + ?Sized,
{
    config.validate()?;
    let rows = read_cache(cache, config)?;

    let values: Vec<Row> = latest_by_id(&rows)
        .into_iter()
        .map(|r| index_row_from_cache(r).to_values())
        .collect();

    index.clear_from(config.index_start_row)?;
    write_header(index, config.index_header_row(), &INDEX_HEADERS)?;
    append_after_data(index, config.index_start_row, &values)?;
    info!(rows = values.len(), "index rebuilt from cache");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Rebuilt the Index from {}.",
        plural(values.len(), "Cache row")
    )));
    Ok(result)
}
