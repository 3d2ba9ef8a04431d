//! # Tree Walker
//!
//! Pre-order, depth-first traversal of a [`TreeSource`], exposed as a lazy
//! iterator of [`WalkEntry`] values.
//!
//! ## Order
//!
//! For every folder, starting at the root:
//! 1. The folder itself (never the root).
//! 2. Its live files, each with the folder's path and the folder's id as parent.
//! 3. Each live subfolder in turn, recursively, with the path extended by the
//!    subfolder's name and the current folder's id as parent.
//!
//! Trashed folders are skipped with their whole subtree; trashed files are
//! skipped. Order *within* a folder is whatever the provider returns; only the
//! `(id, path, parent_id)` triples are stable across walks.
//!
//! ## Laziness
//!
//! A folder is listed only when the iterator reaches it. The sequence is one-pass:
//! after the first error it yields `None`.
//!
//! No mime filtering happens here; admission is the caller's job.

use crate::error::{IndexError, Result};
use crate::model::{Item, ItemKind};
use crate::source::{SourceEntry, TreeSource};
use std::collections::VecDeque;

/// One live item together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub item: Item,
    /// Names of the ancestor folders below the root. For folders this ends with
    /// the folder's own name.
    pub path: Vec<String>,
    pub parent_id: String,
}

struct Frame {
    id: String,
    path: Vec<String>,
    /// The folder's own entry; `None` for the root.
    entry: Option<WalkEntry>,
}

pub struct Walker<'a, S: TreeSource + ?Sized> {
    source: &'a S,
    root_id: String,
    stack: Vec<Frame>,
    ready: VecDeque<WalkEntry>,
    failed: bool,
}

impl<'a, S: TreeSource + ?Sized> Walker<'a, S> {
    /// Resolve the root and prepare a walk. Fails with `SourceUnavailable` if the
    /// root is missing or trashed, before anything is listed.
    pub fn new(source: &'a S, root_id: &str) -> Result<Self> {
        let root = source.folder(root_id)?;
        if root.trashed {
            return Err(IndexError::SourceUnavailable(format!(
                "root {} is trashed",
                root_id
            )));
        }
        Ok(Self {
            source,
            root_id: root.id.clone(),
            stack: vec![Frame {
                id: root.id,
                path: Vec::new(),
                entry: None,
            }],
            ready: VecDeque::new(),
            failed: false,
        })
    }

    /// Id the walk started from, as reported by the source.
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    fn expand(&mut self, frame: Frame) -> Result<()> {
        let files = self.source.child_files(&frame.id)?;
        let folders = self.source.child_folders(&frame.id)?;

        if let Some(entry) = frame.entry {
            self.ready.push_back(entry);
        }
        for file in files.into_iter().filter(|f| !f.trashed) {
            self.ready.push_back(WalkEntry {
                item: to_item(file, ItemKind::File),
                path: frame.path.clone(),
                parent_id: frame.id.clone(),
            });
        }

        // Reverse so the first subfolder is popped first.
        for folder in folders.into_iter().filter(|f| !f.trashed).rev() {
            let mut path = frame.path.clone();
            path.push(folder.name.clone());
            let id = folder.id.clone();
            self.stack.push(Frame {
                id,
                path: path.clone(),
                entry: Some(WalkEntry {
                    item: to_item(folder, ItemKind::Folder),
                    path,
                    parent_id: frame.id.clone(),
                }),
            });
        }
        Ok(())
    }
}

impl<S: TreeSource + ?Sized> Iterator for Walker<'_, S> {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(entry) = self.ready.pop_front() {
                return Some(Ok(entry));
            }
            let frame = self.stack.pop()?;
            if let Err(e) = self.expand(frame) {
                self.failed = true;
                self.stack.clear();
                return Some(Err(e));
            }
        }
    }
}

fn to_item(entry: SourceEntry, kind: ItemKind) -> Item {
    Item {
        id: entry.id,
        kind,
        name: entry.name,
        mime: entry.mime_type,
        url: entry.url,
        last_modified: entry.last_modified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PDF_MIME, XLSX_MIME};
    use crate::source::listing::ListingSource;

    fn sample() -> ListingSource {
        ListingSource::new()
            .with_file("f0", "root.pdf", PDF_MIME, "root")
            .with_folder("a", "A", "root")
            .with_file("f1", "a1.pdf", PDF_MIME, "a")
            .with_folder("b", "B", "a")
            .with_file("f2", "b1.xlsx", XLSX_MIME, "b")
            .with_folder("c", "C", "root")
    }

    fn triples(source: &ListingSource) -> Vec<(String, Vec<String>, String)> {
        Walker::new(source, "root")
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                (e.item.id, e.path, e.parent_id)
            })
            .collect()
    }

    fn p(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pre_order_parent_first() {
        let ids: Vec<String> = triples(&sample()).into_iter().map(|t| t.0).collect();
        assert_eq!(ids, vec!["f0", "a", "f1", "b", "f2", "c"]);
    }

    #[test]
    fn paths_and_parents() {
        let walked = triples(&sample());
        assert_eq!(walked[0], ("f0".to_string(), p(&[]), "root".to_string()));
        assert_eq!(walked[1], ("a".to_string(), p(&["A"]), "root".to_string()));
        assert_eq!(walked[2], ("f1".to_string(), p(&["A"]), "a".to_string()));
        assert_eq!(walked[3], ("b".to_string(), p(&["A", "B"]), "a".to_string()));
        assert_eq!(walked[4], ("f2".to_string(), p(&["A", "B"]), "b".to_string()));
    }

    #[test]
    fn root_is_never_yielded() {
        assert!(triples(&sample()).iter().all(|t| t.0 != "root"));
    }

    #[test]
    fn trashed_items_and_subtrees_are_skipped() {
        let mut source = sample();
        source.set_trashed("a", true);
        source.set_trashed("f0", true);
        let ids: Vec<String> = triples(&source).into_iter().map(|t| t.0).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn no_mime_filtering() {
        let source = ListingSource::new().with_file("img", "x.png", "image/png", "root");
        assert_eq!(triples(&source).len(), 1);
    }

    #[test]
    fn two_walks_agree() {
        let source = sample();
        assert_eq!(triples(&source), triples(&source));
    }

    #[test]
    fn missing_root_fails_up_front() {
        let source = ListingSource::new();
        assert!(matches!(
            Walker::new(&source, "root"),
            Err(IndexError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn trashed_root_is_unavailable() {
        let mut source = ListingSource::new()
            .with_folder("top", "Top", "root")
            .with_file("f", "a.pdf", PDF_MIME, "top");
        source.set_trashed("top", true);
        assert!(matches!(
            Walker::new(&source, "top"),
            Err(IndexError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn listing_error_ends_the_walk() {
        let mut source = sample();
        source.fail_listing("b");
        let results: Vec<Result<WalkEntry>> = Walker::new(&source, "root").unwrap().collect();
        assert!(results.last().unwrap().is_err());
        assert!(results[..results.len() - 1].iter().all(|r| r.is_ok()));
    }

    #[test]
    fn works_through_a_boxed_source() {
        let boxed: Box<dyn TreeSource> = Box::new(sample());
        let count = Walker::new(&boxed, "root").unwrap().count();
        assert_eq!(count, 6);
    }
}
