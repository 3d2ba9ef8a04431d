//! Coalesced row writes.
//!
//! Writing rows one at a time costs one round trip per row against a remote
//! table. Updates are sorted by row and every run of consecutive rows becomes a
//! single `write_rows` call. A run ends at the first gap.

use crate::error::Result;
use crate::model::Row;
use crate::table::TableStore;
use tracing::debug;

/// Full replacement values for one physical row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub row: usize,
    pub values: Row,
}

impl RowUpdate {
    pub fn new(row: usize, values: Row) -> Self {
        Self { row, values }
    }
}

/// Apply `updates` with one write per consecutive run. Returns the number of
/// write calls issued.
///
/// Two updates for the same row would make the outcome depend on sort
/// stability; callers guarantee each row appears at most once.
pub fn write_batched<T: TableStore + ?Sized>(table: &T, mut updates: Vec<RowUpdate>) -> Result<usize> {
    if updates.is_empty() {
        return Ok(0);
    }
    updates.sort_by_key(|u| u.row);

    let mut calls = 0;
    let mut run_start = updates[0].row;
    let mut run: Vec<Row> = Vec::new();

    for update in updates {
        if !run.is_empty() && update.row != run_start + run.len() {
            table.write_rows(run_start, &run)?;
            calls += 1;
            run.clear();
        }
        if run.is_empty() {
            run_start = update.row;
        }
        run.push(update.values);
    }
    table.write_rows(run_start, &run)?;
    calls += 1;

    debug!(calls, "batched row writes");
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::mem::MemTable;

    fn update(row: usize, value: &str) -> RowUpdate {
        RowUpdate::new(row, vec![value.to_string()])
    }

    #[test]
    fn coalesces_consecutive_rows() {
        let table = MemTable::new();
        let calls = write_batched(
            &table,
            vec![
                update(10, "d"),
                update(6, "b"),
                update(5, "a"),
                update(7, "c"),
            ],
        )
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(table.write_calls(), vec![(5, 3), (10, 1)]);
        assert_eq!(table.column(5, 0), vec!["a", "b", "c", "", "", "d"]);
    }

    #[test]
    fn nothing_to_write() {
        let table = MemTable::new();
        assert_eq!(write_batched(&table, Vec::new()).unwrap(), 0);
        assert!(table.calls().is_empty());
    }

    #[test]
    fn every_gap_splits() {
        let table = MemTable::new();
        let calls = write_batched(&table, vec![update(2, "a"), update(4, "b"), update(6, "c")])
            .unwrap();
        assert_eq!(calls, 3);
    }

    #[test]
    fn write_failure_propagates() {
        let table = MemTable::new();
        table.set_simulate_write_error(true);
        assert!(write_batched(&table, vec![update(2, "a")]).is_err());
    }
}
