//! Id → physical row mapping for one table.
//!
//! A [`RowIndex`] is a snapshot: it is correct only until the next row is
//! deleted from (or inserted into) the table it was built from. Appends after
//! the last row do not shift anything and leave it valid. After a delete, build
//! a fresh one; the reconciler does exactly that between its delete and update
//! phases.

use crate::error::Result;
use crate::model::{Row, ID_COLUMN};
use crate::table::{data_row_count, TableStore};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndex {
    rows: HashMap<String, usize>,
    duplicates: Vec<(String, usize)>,
}

impl RowIndex {
    /// Scan the id column from `start_row` to the last populated row.
    ///
    /// Ids are trimmed; blank ids are skipped. If an id appears more than once
    /// the later row wins and the earlier one is remembered in
    /// [`RowIndex::duplicates`].
    pub fn build<T: TableStore + ?Sized>(table: &T, start_row: usize) -> Result<Self> {
        let count = data_row_count(table, start_row)?;
        if count == 0 {
            return Ok(Self::default());
        }
        let rows = table.read_rows(start_row, count, ID_COLUMN + 1)?;
        Ok(Self::from_rows(&rows, start_row))
    }

    /// Same as [`RowIndex::build`] over rows already read, `rows[0]` being `start_row`.
    pub fn from_rows(rows: &[Row], start_row: usize) -> Self {
        let mut index = Self::default();
        for (offset, row) in rows.iter().enumerate() {
            let id = row
                .get(ID_COLUMN)
                .map(|c| c.trim())
                .unwrap_or_default();
            if id.is_empty() {
                continue;
            }
            if let Some(earlier) = index.rows.insert(id.to_string(), start_row + offset) {
                index.duplicates.push((id.to_string(), earlier));
            }
        }
        index
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.rows.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows shadowed by a later row carrying the same id, as `(id, row)`.
    pub fn duplicates(&self) -> &[(String, usize)] {
        &self.duplicates
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.rows.iter().map(|(id, row)| (id.as_str(), *row))
    }
}
