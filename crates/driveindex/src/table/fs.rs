use super::{Grid, TableStore};
use crate::error::{IndexError, Result};
use crate::model::Row;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A table persisted as a pretty-printed JSON array of rows.
///
/// Every call loads the file, applies the change and writes it back through a
/// temp file + rename, so a crash leaves either the old or the new table.
pub struct FsTable {
    path: PathBuf,
}

impl FsTable {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Grid> {
        if !self.path.exists() {
            return Ok(Grid::new());
        }
        let content = fs::read_to_string(&self.path).map_err(IndexError::Io)?;
        if content.trim().is_empty() {
            return Ok(Grid::new());
        }
        let grid: Grid = serde_json::from_str(&content).map_err(IndexError::Serialization)?;
        Ok(grid)
    }

    fn save(&self, grid: &Grid) -> Result<()> {
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(IndexError::Io)?;
        }
        let content = serde_json::to_string_pretty(grid).map_err(IndexError::Serialization)?;

        let tmp_file = dir.join(format!(".table-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(IndexError::Io)?;
        fs::rename(&tmp_file, &self.path).map_err(IndexError::Io)?;
        Ok(())
    }

    fn modify<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Grid) -> Result<()>,
    {
        let mut grid = self.load()?;
        f(&mut grid)?;
        self.save(&grid)
    }
}

impl TableStore for FsTable {
    fn row_count(&self) -> Result<usize> {
        Ok(self.load()?.last_row())
    }

    fn read_rows(&self, start_row: usize, count: usize, width: usize) -> Result<Vec<Row>> {
        self.load()?.read(start_row, count, width)
    }

    fn write_rows(&self, start_row: usize, rows: &[Row]) -> Result<()> {
        self.modify(|grid| grid.write(start_row, rows))
    }

    fn delete_row(&self, row: usize) -> Result<()> {
        self.modify(|grid| grid.delete(row))
    }

    fn clear_from(&self, start_row: usize) -> Result<()> {
        self.modify(|grid| grid.truncate_from(start_row))
    }
}
