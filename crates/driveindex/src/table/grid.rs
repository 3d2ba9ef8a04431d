use crate::error::{IndexError, Result};
use crate::model::Row;
use serde::{Deserialize, Serialize};

/// Plain row-major cell storage shared by the table backends.
///
/// `rows[0]` is physical row 1. Trailing empty rows may exist; they do not count
/// towards [`Grid::last_row`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Row>,
}

fn is_blank(row: &Row) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

fn check_row(row: usize) -> Result<()> {
    if row == 0 {
        return Err(IndexError::Table("row numbers start at 1".to_string()));
    }
    Ok(())
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|r| !is_blank(r))
            .map(|pos| pos + 1)
            .unwrap_or(0)
    }

    pub fn read(&self, start_row: usize, count: usize, width: usize) -> Result<Vec<Row>> {
        check_row(start_row)?;
        Ok((0..count)
            .map(|offset| {
                let stored = self.rows.get(start_row - 1 + offset);
                (0..width)
                    .map(|col| {
                        stored
                            .and_then(|r| r.get(col))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect())
    }

    pub fn write(&mut self, start_row: usize, rows: &[Row]) -> Result<()> {
        check_row(start_row)?;
        let needed = start_row - 1 + rows.len();
        if self.rows.len() < needed {
            self.rows.resize(needed, Vec::new());
        }
        for (offset, values) in rows.iter().enumerate() {
            let target = &mut self.rows[start_row - 1 + offset];
            if target.len() < values.len() {
                target.resize(values.len(), String::new());
            }
            for (col, value) in values.iter().enumerate() {
                target[col] = value.clone();
            }
        }
        Ok(())
    }

    pub fn delete(&mut self, row: usize) -> Result<()> {
        check_row(row)?;
        if row > self.rows.len() {
            return Err(IndexError::Table(format!(
                "cannot delete row {}: table has {} rows",
                row,
                self.rows.len()
            )));
        }
        self.rows.remove(row - 1);
        Ok(())
    }

    pub fn truncate_from(&mut self, start_row: usize) -> Result<()> {
        check_row(start_row)?;
        self.rows.truncate(start_row - 1);
        Ok(())
    }
}
