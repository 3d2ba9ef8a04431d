//! Shared builders for tests: a small sample tree and pre-seeded tables.

use crate::codec::{full_path, index_row_from_cache};
use crate::config::{IndexConfig, DOCX_MIME, PDF_MIME, XLSX_MIME};
use crate::model::{CacheRow, Row, CACHE_HEADERS, INDEX_HEADERS};
use crate::source::listing::ListingSource;
use crate::table::mem::MemTable;
use crate::table::{write_header, TableStore};

/// ```text
/// root
/// ├── budget.xlsx
/// ├── notes.png          (not admitted)
/// ├── Projects/
/// │   ├── plan.docx
/// │   └── Alpha/
/// │       └── report.pdf
/// └── Archive/
/// ```
pub fn sample_tree() -> ListingSource {
    ListingSource::new()
        .with_file("budget", "budget.xlsx", XLSX_MIME, "root")
        .with_file("png", "notes.png", "image/png", "root")
        .with_folder("projects", "Projects", "root")
        .with_file("plan", "plan.docx", DOCX_MIME, "projects")
        .with_folder("alpha", "Alpha", "projects")
        .with_file("report", "report.pdf", PDF_MIME, "alpha")
        .with_folder("archive", "Archive", "root")
}

/// A PDF at the root whose name is its id.
pub fn cache_row(id: &str) -> CacheRow {
    CacheRow {
        id: id.to_string(),
        friendly_type: "PDF".to_string(),
        name: id.to_string(),
        mime: PDF_MIME.to_string(),
        url: format!("https://drive.google.com/file/d/{}/view", id),
        parent_id: "root".to_string(),
        levels: Default::default(),
        tag: String::new(),
        cached_at: "2024-01-01 00:00:00".to_string(),
        full_path: full_path(&[], Some(id), true),
    }
}

/// Cache and Index tables with headers and one [`cache_row`] per id, in order.
/// The call logs are cleared afterwards.
pub fn seeded_tables(config: &IndexConfig, ids: &[&str]) -> (MemTable, MemTable) {
    let rows: Vec<CacheRow> = ids.iter().map(|id| cache_row(id)).collect();
    seeded_from(config, &rows)
}

pub fn seeded_from(config: &IndexConfig, rows: &[CacheRow]) -> (MemTable, MemTable) {
    let cache = MemTable::new();
    let index = MemTable::new();
    let cache_values: Vec<Row> = rows.iter().map(CacheRow::to_values).collect();
    let index_values: Vec<Row> = rows
        .iter()
        .map(|r| index_row_from_cache(r).to_values())
        .collect();

    write_header(&cache, config.cache_header_row(), &CACHE_HEADERS).unwrap();
    write_header(&index, config.index_header_row(), &INDEX_HEADERS).unwrap();
    if !rows.is_empty() {
        cache.write_rows(config.cache_start_row, &cache_values).unwrap();
        index.write_rows(config.index_start_row, &index_values).unwrap();
    }
    cache.clear_calls();
    index.clear_calls();
    (cache, index)
}
