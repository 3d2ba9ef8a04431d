//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single entry
//! point for every UI.
//!
//! It owns the collaborators (tree source, Cache table, Index table) and the
//! immutable configuration, resolves which root to walk, supplies the clock, and
//! dispatches to `commands/*.rs`. It holds no business logic and does no I/O of
//! its own.
//!
//! ## Root Resolution
//!
//! In priority order:
//! 1. An explicit root id or path (`--root`).
//! 2. A named root from `root_aliases` (`--root-name`). Unknown names fall back.
//! 3. The configured `root`.
//!
//! With none of these, the pass fails with `SourceUnavailable` before touching
//! any table.
//!
//! ## Generic Over Collaborators
//!
//! `IndexApi<S, C, I>` is generic over the source and both tables:
//! - Production: `IndexApi<Box<dyn TreeSource>, FsTable, FsTable>`
//! - Testing: `IndexApi<ListingSource, MemTable, MemTable>`

use crate::commands::{self, config::ConfigAction, CmdResult};
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::source::TreeSource;
use crate::table::TableStore;
use chrono::{DateTime, Utc};

/// Which root a pass should walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSelector {
    pub root: Option<String>,
    pub name: Option<String>,
}

impl RootSelector {
    pub fn configured() -> Self {
        Self::default()
    }

    pub fn id(root: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            name: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            root: None,
            name: Some(name.into()),
        }
    }
}

pub struct IndexApi<S: TreeSource, C: TableStore, I: TableStore> {
    source: S,
    cache: C,
    index: I,
    config: IndexConfig,
}

impl<S: TreeSource, C: TableStore, I: TableStore> IndexApi<S, C, I> {
    pub fn new(source: S, cache: C, index: I, config: IndexConfig) -> Self {
        Self {
            source,
            cache,
            index,
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn resolve_root(&self, selector: &RootSelector) -> Result<String> {
        selector
            .root
            .clone()
            .or_else(|| self.config.resolve_root(selector.name.as_deref()))
            .ok_or_else(|| {
                IndexError::SourceUnavailable(
                    "no root configured; pass --root or set `root` in driveindex.toml".to_string(),
                )
            })
    }

    pub fn sync(&self, selector: &RootSelector) -> Result<CmdResult> {
        self.sync_at(selector, Utc::now())
    }

    pub fn sync_at(&self, selector: &RootSelector, now: DateTime<Utc>) -> Result<CmdResult> {
        let root = self.resolve_root(selector)?;
        commands::sync::run(&self.source, &self.cache, &self.index, &self.config, &root, now)
    }

    pub fn rebuild(&self, selector: &RootSelector) -> Result<CmdResult> {
        self.rebuild_at(selector, Utc::now())
    }

    pub fn rebuild_at(&self, selector: &RootSelector, now: DateTime<Utc>) -> Result<CmdResult> {
        let root = self.resolve_root(selector)?;
        commands::rebuild::run(&self.source, &self.cache, &self.index, &self.config, &root, now)
    }

    pub fn rebuild_index(&self) -> Result<CmdResult> {
        commands::rebuild_index::run(&self.cache, &self.index, &self.config)
    }

    pub fn search<T: AsRef<str>>(&self, terms: &[T]) -> Result<CmdResult> {
        let terms: Vec<String> = terms.iter().map(|t| t.as_ref().to_string()).collect();
        commands::search::run(&self.cache, &self.index, &self.config, &terms)
    }

    pub fn stats(&self) -> Result<CmdResult> {
        commands::stats::run(&self.cache, &self.index, &self.config)
    }

    pub fn doctor(&self) -> Result<CmdResult> {
        commands::doctor::run(&self.cache, &self.index, &self.config)
    }

    pub fn show_config(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.config, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_tree;
    use crate::source::listing::ListingSource;
    use crate::table::mem::MemTable;
    use std::collections::HashMap;

    fn api(config: IndexConfig) -> IndexApi<ListingSource, MemTable, MemTable> {
        let source = sample_tree().with_folder("other", "Other", "shared");
        IndexApi::new(source, MemTable::new(), MemTable::new(), config)
    }

    fn configured() -> IndexConfig {
        let mut aliases = HashMap::new();
        aliases.insert("Shared".to_string(), "shared".to_string());
        IndexConfig {
            root: Some("root".to_string()),
            root_aliases: Some(aliases),
            ..Default::default()
        }
    }

    #[test]
    fn root_resolution_order() {
        let api = api(configured());
        assert_eq!(api.resolve_root(&RootSelector::configured()).unwrap(), "root");
        assert_eq!(api.resolve_root(&RootSelector::named("Shared")).unwrap(), "shared");
        assert_eq!(api.resolve_root(&RootSelector::named("Nope")).unwrap(), "root");
        assert_eq!(api.resolve_root(&RootSelector::id("x")).unwrap(), "x");
    }

    #[test]
    fn missing_root_is_source_unavailable() {
        let api = api(IndexConfig::default());
        assert!(matches!(
            api.sync(&RootSelector::configured()),
            Err(IndexError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn named_root_walks_that_tree() {
        let api = api(configured());
        let summary = api.sync(&RootSelector::named("Shared")).unwrap().summary.unwrap();
        assert_eq!(summary.root_id, "shared");
        assert_eq!(summary.added, 1);
    }

    #[test]
    fn dispatches_read_commands() {
        let api = api(configured());
        api.sync(&RootSelector::configured()).unwrap();
        assert_eq!(api.search(&["report"]).unwrap().hits.len(), 1);
        assert_eq!(api.stats().unwrap().stats.unwrap().cache_rows, 6);
        assert!(api.doctor().unwrap().doctor.unwrap().is_clean());
        assert!(api.rebuild_index().is_ok());
        assert!(api
            .show_config(ConfigAction::ShowAll)
            .unwrap()
            .config
            .is_some());
    }
}
