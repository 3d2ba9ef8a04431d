//! # Row Codec
//!
//! Pure mapping from a walked item to its Cache and Index rows. Nothing here
//! touches a table or a clock: timestamps come in as arguments.
//!
//! ## Path Columns
//!
//! - `full_path` joins every path segment with `/`, plus the name for files.
//!   A folder's own name is already the last segment of its path.
//! - The four level columns are the first four segments, padded with empty
//!   strings. Short paths leave trailing levels empty instead of shifting columns.
//!
//! ## Friendly Types
//!
//! Known office/PDF/Google mimes map to short labels. Anything else passes
//! through as the raw mime string. Folders are always `"Folder"`.

use crate::config::{
    DOCX_MIME, DOC_MIME, GOOGLE_DOCS_MIME, GOOGLE_SHEETS_MIME, GOOGLE_SLIDES_MIME, PDF_MIME,
    PPTX_MIME, PPT_MIME, XLSX_MIME, XLS_MIME,
};
use crate::model::{
    CacheRow, IndexRow, Item, ItemKind, FOLDER_MIME, FOLDER_TYPE, LEVEL_COUNT, PATH_SEPARATOR,
};
use crate::error::{IndexError, Result};
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub fn friendly_type(mime: &str) -> String {
    let label = match mime {
        GOOGLE_SHEETS_MIME => "Google Sheets",
        GOOGLE_DOCS_MIME => "Google Docs",
        GOOGLE_SLIDES_MIME => "Google Slides",
        PDF_MIME => "PDF",
        XLS_MIME | XLSX_MIME => "Excel",
        DOC_MIME | DOCX_MIME => "Word",
        PPT_MIME | PPTX_MIME => "PowerPoint",
        FOLDER_MIME => FOLDER_TYPE,
        other => other,
    };
    label.to_string()
}

fn item_type(item: &Item) -> String {
    match item.kind {
        ItemKind::Folder => FOLDER_TYPE.to_string(),
        ItemKind::File => friendly_type(&item.mime),
    }
}

pub fn fill_levels(path: &[String]) -> [String; LEVEL_COUNT] {
    std::array::from_fn(|i| path.get(i).cloned().unwrap_or_default())
}

pub fn full_path(path: &[String], name: Option<&str>, is_file: bool) -> String {
    let mut parts: Vec<&str> = path.iter().map(String::as_str).collect();
    if is_file {
        parts.push(name.unwrap_or_default());
    }
    parts.join(PATH_SEPARATOR)
}

/// Render `at` with a strftime `format`. An unknown specifier is a config error
/// rather than a formatting panic.
pub fn format_timestamp(at: DateTime<Utc>, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", at.format(format))
        .map_err(|_| IndexError::Config(format!("invalid timestamp_format {:?}", format)))?;
    Ok(out)
}

/// Build the Cache row for an item. Returns `None` for items without an id,
/// which must never reach a table.
pub fn to_cache_row(
    item: &Item,
    path: &[String],
    parent_id: &str,
    prior_tag: &str,
    cached_at: &str,
) -> Option<CacheRow> {
    if item.id.trim().is_empty() {
        return None;
    }
    let mime = match item.kind {
        ItemKind::Folder => FOLDER_MIME.to_string(),
        ItemKind::File => item.mime.clone(),
    };
    Some(CacheRow {
        id: item.id.trim().to_string(),
        friendly_type: item_type(item),
        name: item.name.clone(),
        mime,
        url: item.url.clone(),
        parent_id: parent_id.to_string(),
        levels: fill_levels(path),
        tag: prior_tag.to_string(),
        cached_at: cached_at.to_string(),
        full_path: full_path(path, Some(&item.name), !item.is_folder()),
    })
}

pub fn to_index_row(item: &Item, path: &[String], tag: &str) -> Option<IndexRow> {
    if item.id.trim().is_empty() {
        return None;
    }
    Some(IndexRow {
        id: item.id.trim().to_string(),
        levels: fill_levels(path),
        name: item.name.clone(),
        friendly_type: item_type(item),
        url: item.url.clone(),
        tag: tag.to_string(),
        full_path: full_path(path, Some(&item.name), !item.is_folder()),
    })
}

/// Project a Cache row onto the Index layout. The friendly type is re-derived
/// from the stored mime so a Cache written by an older label table still
/// projects current labels.
pub fn index_row_from_cache(row: &CacheRow) -> IndexRow {
    let friendly = if row.is_folder() {
        FOLDER_TYPE.to_string()
    } else {
        friendly_type(&row.mime)
    };
    IndexRow {
        id: row.id.clone(),
        levels: row.levels.clone(),
        name: row.name.clone(),
        friendly_type: friendly,
        url: row.url.clone(),
        tag: row.tag.clone(),
        full_path: row.full_path.clone(),
    }
}
