//! Shoebox: keyed, schema-versioned JSON document storage for evolving
//! local state.
//!
//! A shoebox [`Store`] keeps one schema type's records as plain JSON files
//! under a directory, one file per key. Records carry an integer schema-
//! version tag, and an ordered chain of [`Migration`] functions upgrades
//! old records transparently at read time, so state written by last year's
//! release still loads today without a bulk rewrite step.
//!
//! The crate is layered: [`shoebox_store`] owns keys, schemas, and
//! migrations, while [`shoebox_filesystem`] owns storage and is pluggable,
//! with a disk backend for production and an in-memory backend for tests.
//! This crate re-exports the whole public surface of both.
//!
//! # Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use shoebox::{Store, StoreConfig};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Settings {
//!     theme: String,
//!     volume: u32,
//! }
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store: Store<Settings> =
//!     Store::create(dir.path().join("settings"), StoreConfig::new()).unwrap();
//!
//! let defaults = Settings {
//!     theme: "dark".to_string(),
//!     volume: 80,
//! };
//! let settings = store.ensure(defaults, Some("main")).unwrap();
//! assert_eq!(settings.theme, "dark");
//! ```

pub use shoebox_filesystem::{
    BoxError, DirectoryEntry, DiskFilesystem, Filesystem, FilesystemError, MemoryFilesystem,
};
pub use shoebox_store::{
    Document, Migration, ReadStore, Store, StoreConfig, StoreError, SCHEMA_VERSION_KEY,
};

#[cfg(feature = "async")]
pub use shoebox_filesystem::{AsyncFilesystem, SyncToAsyncFs};
