//! Local filesystem source.
//!
//! Mirrors a directory tree on disk (for example a synced Drive folder). Item ids
//! must survive renames and moves so that tags follow the item, so on unix an id is
//! the device and inode pair; elsewhere it falls back to the canonical path.
//!
//! Hidden entries (leading `.`) and symlinks are not surfaced.

use super::{SourceEntry, TreeSource};
use crate::config::{
    DOCX_MIME, DOC_MIME, GOOGLE_DOCS_MIME, GOOGLE_SHEETS_MIME, GOOGLE_SLIDES_MIME, PDF_MIME,
    PPTX_MIME, PPT_MIME, XLSX_MIME, XLS_MIME,
};
use crate::error::{IndexError, Result};
use crate::model::FOLDER_MIME;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

pub struct LocalTreeSource {
    /// Ids handed out so far, so listings can be requested by id.
    paths: RefCell<HashMap<String, PathBuf>>,
}

impl Default for LocalTreeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTreeSource {
    pub fn new() -> Self {
        Self {
            paths: RefCell::new(HashMap::new()),
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.paths
            .borrow()
            .get(id)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(id))
    }

    fn entry_for(&self, path: &Path, metadata: &Metadata) -> SourceEntry {
        let id = item_id(path, metadata);
        self.paths.borrow_mut().insert(id.clone(), path.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let mime_type = if metadata.is_dir() {
            FOLDER_MIME.to_string()
        } else {
            mime_for_path(path)
        };
        let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        SourceEntry {
            id,
            name,
            mime_type,
            url: format!("file://{}", absolute.to_string_lossy().replace('\\', "/")),
            trashed: false,
            last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        }
    }

    fn list(&self, folder_id: &str, want_dirs: bool) -> Result<Vec<SourceEntry>> {
        let dir = self.path_for(folder_id);
        let entries = fs::read_dir(&dir)
            .map_err(|e| IndexError::Source(format!("cannot list {}: {}", dir.display(), e)))?;

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IndexError::Source(e.to_string()))?;
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                continue;
            }
            let metadata = fs::symlink_metadata(&path)
                .map_err(|e| IndexError::Source(format!("{}: {}", path.display(), e)))?;
            if metadata.file_type().is_symlink() || metadata.is_dir() != want_dirs {
                continue;
            }
            out.push(self.entry_for(&path, &metadata));
        }
        // read_dir order is platform dependent
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

impl TreeSource for LocalTreeSource {
    fn folder(&self, id: &str) -> Result<SourceEntry> {
        let path = self.path_for(id);
        let metadata = fs::metadata(&path).map_err(|e| {
            IndexError::SourceUnavailable(format!("{}: {}", path.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(IndexError::SourceUnavailable(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        Ok(self.entry_for(&path, &metadata))
    }

    fn child_folders(&self, folder_id: &str) -> Result<Vec<SourceEntry>> {
        self.list(folder_id, true)
    }

    fn child_files(&self, folder_id: &str) -> Result<Vec<SourceEntry>> {
        self.list(folder_id, false)
    }
}

/// Device and inode, so the id survives renames and moves.
#[cfg(unix)]
fn item_id(_path: &Path, metadata: &Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    format!("unix:{}:{}", metadata.dev(), metadata.ino())
}

/// No stable file identity here, so the canonical path stands in.
#[cfg(not(unix))]
fn item_id(path: &Path, _metadata: &Metadata) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("path:{}", absolute.to_string_lossy().replace('\\', "/"))
}

/// Mime type inferred from the file extension. Drive desktop shortcut files
/// (`.gdoc`, `.gsheet`, `.gslides`) map to their Google native types.
pub fn mime_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "pdf" => PDF_MIME,
        "xls" => XLS_MIME,
        "xlsx" => XLSX_MIME,
        "doc" => DOC_MIME,
        "docx" => DOCX_MIME,
        "ppt" => PPT_MIME,
        "pptx" => PPTX_MIME,
        "gsheet" => GOOGLE_SHEETS_MIME,
        "gdoc" => GOOGLE_DOCS_MIME,
        "gslides" => GOOGLE_SLIDES_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    };
    mime.to_string()
}
