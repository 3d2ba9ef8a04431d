//! # Driveindex Architecture
//!
//! Driveindex keeps a flat, human-browsable mirror of a cloud file-storage tree in
//! two tables:
//!
//! - **Cache**: the system of record, one 13-column row per indexed item.
//! - **Index**: the display projection, one 10-column row per item, which a
//!   presentation layer is free to sort, merge and filter.
//!
//! The interesting part is the **incremental pass**: walk the live tree, diff it
//! against the cached snapshot, and apply the smallest set of deletes, appends and
//! in-place updates to both tables, without ever losing the user-owned `tag` column.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade, owns the collaborators and the config       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - sync, rebuild, rebuild-index, search, stats, doctor      │
//! │  - Returns structured `CmdResult`, never prints             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Sync Core                                                  │
//! │  walker → codec → diff → reconcile → batch / row_index      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Collaborators                                              │
//! │  - source/: TreeSource (listing export, local filesystem)   │
//! │  - table/: TableStore (in-memory grid, JSON file grid)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Execution Model
//!
//! One pass runs to completion before the next starts. Nothing in the core is
//! shared across threads, so the in-memory maps built during a pass need no
//! locking. The tables and the tree are external and may be edited concurrently;
//! the answer to that is re-running the pass, which converges.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade used by UI clients
//! - [`commands`]: One module per operation
//! - [`walker`]: Pre-order traversal of a [`source::TreeSource`]
//! - [`codec`]: Item → Cache/Index row mapping
//! - [`diff`]: NEW / CHANGED / DELETED classification
//! - [`reconcile`]: Applying a diff to both tables
//! - [`batch`]: Coalesced row writes
//! - [`row_index`]: Id → physical row mapping
//! - [`model`]: Rows, items and column layouts
//! - [`config`]: Configuration
//! - [`init`]: Context and data directory resolution
//! - [`error`]: Error types

pub mod api;
pub mod batch;
pub mod codec;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures;
pub mod init;
pub mod model;
pub mod reconcile;
pub mod row_index;
pub mod source;
pub mod table;
pub mod walker;
