//! Drive listing source.
//!
//! Reads the shape returned by the Drive v3 `files.list` endpoint (either the raw
//! `{"files": [...]}` envelope or a bare array), with the fields
//! `id, name, mimeType, parents, trashed, webViewLink, modifiedTime`.
//!
//! Items with several parents are listed under each of them. A root id that only
//! appears as a parent (the usual case for "My Drive") resolves to a synthetic folder.

use super::{SourceEntry, TreeSource};
use crate::error::{IndexError, Result};
use crate::model::FOLDER_MIME;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

impl ListingRecord {
    fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    fn to_entry(&self) -> SourceEntry {
        let url = self.web_view_link.clone().unwrap_or_else(|| {
            if self.is_folder() {
                format!("https://drive.google.com/drive/folders/{}", self.id)
            } else {
                format!("https://drive.google.com/file/d/{}/view", self.id)
            }
        });
        SourceEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            url,
            trashed: self.trashed,
            last_modified: self.modified_time,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListingFile {
    Envelope { files: Vec<ListingRecord> },
    Bare(Vec<ListingRecord>),
}

#[derive(Debug, Default, Clone)]
pub struct ListingSource {
    records: Vec<ListingRecord>,
    by_id: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
    failing: HashSet<String>,
}

impl ListingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ListingRecord>) -> Self {
        let mut source = Self {
            records,
            ..Default::default()
        };
        source.relink();
        source
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: ListingFile = serde_json::from_str(json)?;
        let records = match parsed {
            ListingFile::Envelope { files } => files,
            ListingFile::Bare(files) => files,
        };
        Ok(Self::from_records(records))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            IndexError::SourceUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    fn relink(&mut self) {
        self.by_id.clear();
        self.children.clear();
        for (pos, record) in self.records.iter().enumerate() {
            self.by_id.insert(record.id.clone(), pos);
            for parent in &record.parents {
                self.children.entry(parent.clone()).or_default().push(pos);
            }
        }
    }

    fn record_mut(&mut self, id: &str) -> Option<&mut ListingRecord> {
        let pos = *self.by_id.get(id)?;
        self.records.get_mut(pos)
    }

    // --- Builders and mutations, used to script tree changes between passes ---

    pub fn with_folder(mut self, id: &str, name: &str, parent: &str) -> Self {
        self.add(id, name, FOLDER_MIME, parent);
        self
    }

    pub fn with_file(mut self, id: &str, name: &str, mime: &str, parent: &str) -> Self {
        self.add(id, name, mime, parent);
        self
    }

    pub fn add(&mut self, id: &str, name: &str, mime: &str, parent: &str) {
        self.records.push(ListingRecord {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: mime.to_string(),
            parents: vec![parent.to_string()],
            trashed: false,
            web_view_link: None,
            modified_time: None,
        });
        self.relink();
    }

    pub fn rename(&mut self, id: &str, name: &str) {
        if let Some(record) = self.record_mut(id) {
            record.name = name.to_string();
        }
    }

    pub fn move_to(&mut self, id: &str, parent: &str) {
        if let Some(record) = self.record_mut(id) {
            record.parents = vec![parent.to_string()];
        }
        self.relink();
    }

    pub fn set_trashed(&mut self, id: &str, trashed: bool) {
        if let Some(record) = self.record_mut(id) {
            record.trashed = trashed;
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.records.retain(|r| r.id != id);
        self.relink();
    }

    /// Make every listing call for `folder_id` fail, simulating a provider outage.
    pub fn fail_listing(&mut self, folder_id: &str) {
        self.failing.insert(folder_id.to_string());
    }

    fn children_of(&self, folder_id: &str, folders: bool) -> Result<Vec<SourceEntry>> {
        if self.failing.contains(folder_id) {
            return Err(IndexError::Source(format!(
                "listing {} failed",
                folder_id
            )));
        }
        Ok(self
            .children
            .get(folder_id)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| &self.records[pos])
                    .filter(|r| r.is_folder() == folders)
                    .map(ListingRecord::to_entry)
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl TreeSource for ListingSource {
    fn folder(&self, id: &str) -> Result<SourceEntry> {
        if let Some(&pos) = self.by_id.get(id) {
            let record = &self.records[pos];
            if !record.is_folder() {
                return Err(IndexError::SourceUnavailable(format!(
                    "{} is not a folder",
                    id
                )));
            }
            return Ok(record.to_entry());
        }
        if self.children.contains_key(id) {
            return Ok(SourceEntry {
                id: id.to_string(),
                name: id.to_string(),
                mime_type: FOLDER_MIME.to_string(),
                url: format!("https://drive.google.com/drive/folders/{}", id),
                trashed: false,
                last_modified: None,
            });
        }
        Err(IndexError::SourceUnavailable(format!(
            "folder {} not found in listing",
            id
        )))
    }

    fn child_folders(&self, folder_id: &str) -> Result<Vec<SourceEntry>> {
        self.children_of(folder_id, true)
    }

    fn child_files(&self, folder_id: &str) -> Result<Vec<SourceEntry>> {
        self.children_of(folder_id, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PDF_MIME;

    #[test]
    fn parses_drive_envelope() {
        let json = r#"{
            "files": [
                {"id": "d1", "name": "Docs", "mimeType": "application/vnd.google-apps.folder", "parents": ["root"]},
                {"id": "f1", "name": "a.pdf", "mimeType": "application/pdf", "parents": ["d1"],
                 "webViewLink": "https://x/f1", "modifiedTime": "2024-01-02T03:04:05Z"}
            ]
        }"#;
        let source = ListingSource::from_json(json).unwrap();
        assert_eq!(source.records().len(), 2);

        let folders = source.child_folders("root").unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Docs");

        let files = source.child_files("d1").unwrap();
        assert_eq!(files[0].url, "https://x/f1");
        assert!(files[0].last_modified.is_some());
    }

    #[test]
    fn parses_bare_array() {
        let json = r#"[{"id": "f1", "name": "a.pdf", "mimeType": "application/pdf", "parents": ["root"], "trashed": true}]"#;
        let source = ListingSource::from_json(json).unwrap();
        let files = source.child_files("root").unwrap();
        assert!(files[0].trashed);
        assert_eq!(files[0].url, "https://drive.google.com/file/d/f1/view");
    }

    #[test]
    fn root_only_referenced_as_parent_is_synthesized() {
        let source = ListingSource::new().with_file("f1", "a.pdf", PDF_MIME, "root");
        let root = source.folder("root").unwrap();
        assert_eq!(root.id, "root");
        assert_eq!(root.mime_type, FOLDER_MIME);
    }

    #[test]
    fn unknown_root_is_unavailable() {
        let source = ListingSource::new();
        assert!(matches!(
            source.folder("nope"),
            Err(IndexError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn file_is_not_a_root() {
        let source = ListingSource::new().with_file("f1", "a.pdf", PDF_MIME, "root");
        assert!(matches!(
            source.folder("f1"),
            Err(IndexError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn moves_relink_children() {
        let mut source = ListingSource::new()
            .with_folder("a", "A", "root")
            .with_folder("b", "B", "root")
            .with_file("f1", "x.pdf", PDF_MIME, "a");
        source.move_to("f1", "b");
        assert!(source.child_files("a").unwrap().is_empty());
        assert_eq!(source.child_files("b").unwrap()[0].id, "f1");
    }

    #[test]
    fn failing_listing_reports_source_error() {
        let mut source = ListingSource::new().with_folder("a", "A", "root");
        source.fail_listing("a");
        assert!(matches!(source.child_files("a"), Err(IndexError::Source(_))));
        assert!(source.child_folders("root").is_ok());
    }
}
