//! shoebox-store: a keyed, schema-versioned JSON document store.
//!
//! A [`Store`] maps string keys to records of one schema type inside a
//! single directory. Records carry a reserved `__schema_version__` field;
//! when the schema evolves, an ordered chain of [`Migration`] functions
//! upgrades old records transparently at read time, so nothing on storage
//! is ever rewritten in bulk.
//!
//! Every operation comes in a blocking form and an `*_async` twin (behind
//! the `async` feature, on by default). The storage backend is pluggable
//! through [`shoebox_filesystem::Filesystem`]; the default is the real
//! disk, with an in-memory backend available for tests. [`ReadStore`]
//! offers the read operations alone, for components that must never
//! mutate a shared directory.
//!
//! # Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use shoebox_store::{Store, StoreConfig};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Robot {
//!     name: String,
//!     battery: u32,
//! }
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store: Store<Robot> = Store::create(
//!     dir.path().join("robots"),
//!     StoreConfig {
//!         primary_key: Some("name".to_string()),
//!         ..StoreConfig::new()
//!     },
//! )
//! .unwrap();
//!
//! let robot = Robot {
//!     name: "r2d2".to_string(),
//!     battery: 100,
//! };
//! let key = store.put(&robot, None).unwrap();
//! assert_eq!(key.as_deref(), Some("r2d2"));
//! assert_eq!(store.get("r2d2").unwrap(), Some(robot));
//! ```

mod codec;
mod error;
mod read_store;
mod store;

#[cfg(feature = "async")]
mod async_ops;

pub use codec::{Document, Migration, SCHEMA_VERSION_KEY};
pub use error::StoreError;
pub use read_store::ReadStore;
pub use store::{Store, StoreConfig};
