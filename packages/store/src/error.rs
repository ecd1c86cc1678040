//! Store-level error classification.
//!
//! The filesystem layer reports *why* an I/O attempt failed; this module is
//! the sole place that decides what a failure means to a store caller.

use shoebox_filesystem::FilesystemError;
use thiserror::Error;

/// Errors surfaced by store operations.
///
/// A missing document is never an error: operations report absence through
/// their return value. Contract violations (no derivable key, a primary-key
/// field missing from the item) are panics, not variants here, because they
/// are programming errors rather than storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing data of an item is invalid.
    ///
    /// Most likely the item's backing JSON file was edited outside the
    /// store and no longer parses or validates against the current schema.
    /// An improperly defined migration produces the same failure.
    #[error("invalid item data: {0}")]
    Decode(#[source] FilesystemError),

    /// The item could not be encoded for storage; nothing was written.
    #[error("unable to encode item: {0}")]
    Encode(#[source] FilesystemError),

    /// Storage could not be accessed (read, write, or removal failure).
    #[error("storage access failure: {0}")]
    Access(#[source] FilesystemError),
}

impl StoreError {
    /// Classify a filesystem failure into its store-level meaning.
    ///
    /// `PathNotFound` is deliberately not handled here: callers translate it
    /// into an absent result before classification.
    pub(crate) fn classify(error: FilesystemError) -> Self {
        match error {
            FilesystemError::FileParse { .. } => StoreError::Decode(error),
            FilesystemError::FileEncode { .. } => StoreError::Encode(error),
            FilesystemError::PathNotFound { .. }
            | FilesystemError::FileRead { .. }
            | FilesystemError::FileWrite { .. }
            | FilesystemError::FileRemove { .. } => StoreError::Access(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_failures_classify_as_decode() {
        let error = StoreError::classify(FilesystemError::FileParse {
            path: PathBuf::from("store/bad"),
            source: "unexpected token".into(),
        });

        assert!(matches!(error, StoreError::Decode(_)));
        assert!(format!("{error}").contains("invalid item data"));
    }

    #[test]
    fn encode_failures_classify_as_encode() {
        let error = StoreError::classify(FilesystemError::FileEncode {
            path: PathBuf::from("store/bad"),
            source: "not serializable".into(),
        });

        assert!(matches!(error, StoreError::Encode(_)));
    }

    #[test]
    fn io_failures_classify_as_access() {
        let error = StoreError::classify(FilesystemError::FileRead {
            path: PathBuf::from("store/bad"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no"),
        });

        assert!(matches!(error, StoreError::Access(_)));
    }
}
