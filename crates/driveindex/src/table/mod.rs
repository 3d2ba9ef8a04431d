//! # Tabular Store
//!
//! A [`TableStore`] is one sheet-like table addressed by physical, 1-based row
//! numbers. The core keeps two of them, Cache and Index, and only ever needs
//! row-addressed CRUD; styling, merges and filters belong to the presentation layer.
//!
//! ## Row Semantics
//!
//! - `row_count` is the last populated row (a row with at least one non-empty
//!   cell), not the number of data rows.
//! - `read_rows` always returns `count` rows of exactly `width` cells, padding
//!   with empty strings past the end of the data.
//! - `write_rows` overwrites only the cells it is given and grows the table
//!   when writing past the end.
//! - `delete_row` removes the row and shifts every later row up by one. This is
//!   what makes row numbers go stale.
//!
//! ## Implementations
//!
//! - [`mem::MemTable`]: For tests; records every call and can simulate failures.
//! - [`fs::FsTable`]: A JSON file per table, written atomically.

use crate::error::Result;
use crate::model::Row;

pub mod fs;
mod grid;
pub mod mem;

pub use grid::Grid;

/// Abstract interface for one table.
pub trait TableStore {
    /// Last populated row number, 0 for an empty table.
    fn row_count(&self) -> Result<usize>;

    /// Read `count` rows starting at `start_row`, each padded to `width` cells.
    fn read_rows(&self, start_row: usize, count: usize, width: usize) -> Result<Vec<Row>>;

    /// Overwrite consecutive rows starting at `start_row` in one call.
    fn write_rows(&self, start_row: usize, rows: &[Row]) -> Result<()>;

    /// Write rows directly after the last populated row.
    fn append_rows(&self, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let start = self.row_count()? + 1;
        self.write_rows(start, rows)
    }

    /// Delete one row, shifting later rows up.
    fn delete_row(&self, row: usize) -> Result<()>;

    /// Drop every row from `start_row` down. Only rebuild operations use this.
    fn clear_from(&self, start_row: usize) -> Result<()>;
}

/// Append rows after the stored data, but never above `data_start`.
///
/// On a table whose header area is not filled yet, plain `append_rows` would
/// land inside the reserved rows.
pub fn append_after_data<T: TableStore + ?Sized>(
    table: &T,
    data_start: usize,
    rows: &[Row],
) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    if table.row_count()? + 1 >= data_start {
        table.append_rows(rows)
    } else {
        table.write_rows(data_start, rows)
    }
}

/// Write the header row if the table has never been written to. Rows above
/// the data region are otherwise left alone.
pub fn ensure_header<T: TableStore + ?Sized>(
    table: &T,
    header_row: usize,
    headers: &[&str],
) -> Result<bool> {
    if table.row_count()? > 0 {
        return Ok(false);
    }
    write_header(table, header_row, headers)?;
    Ok(true)
}

/// Unconditionally (re)write the header row.
pub fn write_header<T: TableStore + ?Sized>(
    table: &T,
    header_row: usize,
    headers: &[&str],
) -> Result<()> {
    let row: Row = headers.iter().map(|h| h.to_string()).collect();
    table.write_rows(header_row, &[row])
}

/// Number of rows from `data_start` to the last populated row.
pub fn data_row_count<T: TableStore + ?Sized>(table: &T, data_start: usize) -> Result<usize> {
    let last = table.row_count()?;
    Ok(if last < data_start {
        0
    } else {
        last - data_start + 1
    })
}

/// Read every row of the data region.
pub fn read_data<T: TableStore + ?Sized>(
    table: &T,
    data_start: usize,
    width: usize,
) -> Result<Vec<Row>> {
    let count = data_row_count(table, data_start)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    table.read_rows(data_start, count, width)
}
