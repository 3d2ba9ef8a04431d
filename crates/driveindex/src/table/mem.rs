use super::{Grid, TableStore};
use crate::error::{IndexError, Result};
use crate::model::Row;
use std::cell::RefCell;

/// One observed call against a [`MemTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCall {
    Read { start_row: usize, count: usize },
    Write { start_row: usize, rows: usize },
    Delete { row: usize },
    Clear { start_row: usize },
}

/// In-memory table for testing.
///
/// Uses `RefCell` for interior mutability since a pass is single-threaded.
/// This lets the `TableStore` trait take `&self` everywhere. Deletes shift rows
/// exactly like a real sheet, so stale row numbers show up as wrong data.
pub struct MemTable {
    grid: RefCell<Grid>,
    calls: RefCell<Vec<TableCall>>,
    /// Mutating calls allowed before every further one fails. `None` = never fail.
    writes_before_failure: RefCell<Option<usize>>,
}

impl Default for MemTable {
    fn default() -> Self {
        Self {
            grid: RefCell::new(Grid::new()),
            calls: RefCell::new(Vec::new()),
            writes_before_failure: RefCell::new(None),
        }
    }
}

impl MemTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        let table = Self::new();
        *table.grid.borrow_mut() = Grid::from_rows(rows);
        table
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.writes_before_failure.borrow_mut() = if simulate { Some(0) } else { None };
    }

    /// Let `n` more mutating calls succeed, then fail the rest.
    pub fn fail_after_writes(&self, n: usize) {
        *self.writes_before_failure.borrow_mut() = Some(n);
    }

    pub fn calls(&self) -> Vec<TableCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Writes issued so far, as `(start_row, row_count)` pairs.
    pub fn write_calls(&self) -> Vec<(usize, usize)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                TableCall::Write { start_row, rows } => Some((*start_row, *rows)),
                _ => None,
            })
            .collect()
    }

    pub fn delete_calls(&self) -> Vec<usize> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                TableCall::Delete { row } => Some(*row),
                _ => None,
            })
            .collect()
    }

    /// Column `col` of every row from `start_row` to the last populated row.
    pub fn column(&self, start_row: usize, col: usize) -> Vec<String> {
        let grid = self.grid.borrow();
        let last = grid.last_row();
        if last < start_row {
            return Vec::new();
        }
        grid.read(start_row, last - start_row + 1, col + 1)
            .map(|rows| rows.into_iter().map(|mut r| r.swap_remove(col)).collect())
            .unwrap_or_default()
    }

    fn check_write(&self) -> Result<()> {
        let mut budget = self.writes_before_failure.borrow_mut();
        match *budget {
            Some(0) => Err(IndexError::Table("Simulated write error".to_string())),
            Some(n) => {
                *budget = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl TableStore for MemTable {
    fn row_count(&self) -> Result<usize> {
        Ok(self.grid.borrow().last_row())
    }

    fn read_rows(&self, start_row: usize, count: usize, width: usize) -> Result<Vec<Row>> {
        self.calls
            .borrow_mut()
            .push(TableCall::Read { start_row, count });
        self.grid.borrow().read(start_row, count, width)
    }

    fn write_rows(&self, start_row: usize, rows: &[Row]) -> Result<()> {
        self.check_write()?;
        self.calls.borrow_mut().push(TableCall::Write {
            start_row,
            rows: rows.len(),
        });
        self.grid.borrow_mut().write(start_row, rows)
    }

    fn delete_row(&self, row: usize) -> Result<()> {
        self.check_write()?;
        self.calls.borrow_mut().push(TableCall::Delete { row });
        self.grid.borrow_mut().delete(row)
    }

    fn clear_from(&self, start_row: usize) -> Result<()> {
        self.check_write()?;
        self.calls.borrow_mut().push(TableCall::Clear { start_row });
        self.grid.borrow_mut().truncate_from(start_row)
    }
}
