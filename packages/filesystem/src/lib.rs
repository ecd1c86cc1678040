//! shoebox-filesystem: the storage capability behind a shoebox store.
//!
//! This crate translates an abstract "JSON documents by key under a
//! directory" model onto real storage. Documents are regular files with the
//! canonical `.json` extension; keys are extension-less, slash-joined path
//! segments, and nested directories are permitted. Hidden entries (names
//! prefixed with `.`) and non-document files are invisible to listings.
//!
//! Parse and encode functions are injected per call rather than hard-wired,
//! so a higher layer can own schema-aware (de)serialization while this layer
//! stays schema-agnostic: it only classifies *why* an I/O attempt failed.
//!
//! # Example
//!
//! ```rust
//! use shoebox_filesystem::{DiskFilesystem, Filesystem};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let fs = DiskFilesystem::new();
//! let doc = dir.path().join("users/alice");
//!
//! fs.write_json(&doc, &serde_json::json!({"name": "alice"}), |value| {
//!     serde_json::to_string(value).map_err(Into::into)
//! })
//! .unwrap();
//!
//! assert!(fs.file_exists(&doc));
//! assert_eq!(fs.read_dir(dir.path()).unwrap(), vec!["users/alice"]);
//! ```
//!
//! # Async Support
//!
//! The `async` feature (on by default) provides the [`AsyncFilesystem`]
//! trait and the [`SyncToAsyncFs`] bridge, which schedules the same blocking
//! logic on the Tokio blocking pool so an async caller never blocks on disk
//! latency.

use std::path::{Path, PathBuf};

mod disk;
mod error;
mod memory;
mod traits;

pub use disk::DiskFilesystem;
pub use error::{BoxError, FilesystemError};
pub use memory::MemoryFilesystem;
pub use traits::{DirectoryEntry, Filesystem};

#[cfg(feature = "async")]
mod async_fs;

#[cfg(feature = "async")]
pub use async_fs::{run_blocking, AsyncFilesystem, SyncToAsyncFs};

/// Canonical extension for stored documents.
pub const EXTENSION: &str = "json";

/// The on-storage file path for an extension-less document path.
pub fn canonical_path(path: &Path) -> PathBuf {
    let mut file_path = path.as_os_str().to_os_string();
    file_path.push(".");
    file_path.push(EXTENSION);
    PathBuf::from(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_path_appends_the_extension() {
        assert_eq!(
            canonical_path(Path::new("store/users/alice")),
            PathBuf::from("store/users/alice.json")
        );
    }

    #[test]
    fn canonical_path_never_replaces_dotted_key_segments() {
        // A key like "v1.2" is part of the name, not an extension.
        assert_eq!(
            canonical_path(Path::new("store/v1.2")),
            PathBuf::from("store/v1.2.json")
        );
    }
}
