//! Error types for the filesystem adapter layer.
//!
//! Errors at this level only classify *why* an I/O attempt failed. Deciding
//! whether a failure is user-visible belongs to the store layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by injected parse and encode functions.
///
/// The adapter is schema-agnostic: it runs whatever parse/encode function the
/// caller supplies and wraps any failure in [`FilesystemError::FileParse`] or
/// [`FilesystemError::FileEncode`] without inspecting it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by filesystem adapter operations.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// The addressed document does not exist.
    #[error("path not found: {}", path.display())]
    PathNotFound {
        /// Extension-less document path that was requested.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file or directory could not be written or created.
    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file or directory could not be removed.
    #[error("failed to remove {}: {source}", path.display())]
    FileRemove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The injected parse function rejected the file's contents.
    #[error("failed to parse {}: {source}", path.display())]
    FileParse {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The injected encode function failed; nothing was written.
    #[error("failed to encode value for {}: {source}", path.display())]
    FileEncode {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl FilesystemError {
    /// True if this error means the addressed document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FilesystemError::PathNotFound { .. })
    }

    /// The extension-less document path the failing operation addressed.
    pub fn path(&self) -> &PathBuf {
        match self {
            FilesystemError::PathNotFound { path }
            | FilesystemError::FileRead { path, .. }
            | FilesystemError::FileWrite { path, .. }
            | FilesystemError::FileRemove { path, .. }
            | FilesystemError::FileParse { path, .. }
            | FilesystemError::FileEncode { path, .. } => path,
        }
    }
}
