//! The blocking filesystem capability trait.

use std::path::{Path, PathBuf};

use crate::error::{BoxError, FilesystemError};

/// Extension-less path and parsed contents from a full directory read.
///
/// Directory entries are ephemeral: they exist only while a scan result is
/// being consumed and are never persisted independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry<T> {
    /// Document path without the canonical extension.
    pub path: PathBuf,
    /// Parsed file contents.
    pub contents: T,
}

/// Blocking capability interface for "JSON documents by key under a directory".
///
/// All paths are extension-less; implementations append the canonical
/// extension wherever a file is addressed. Parse and encode functions are
/// injected by the caller so a higher layer can own schema-aware
/// (de)serialization while the adapter stays schema-agnostic and reusable.
///
/// This is the seam at which a test double can be substituted: the store
/// layer is generic over any `Filesystem`, and [`crate::MemoryFilesystem`]
/// implements the same contract as the disk backend.
pub trait Filesystem: Send + Sync {
    /// Ensure a directory at `path` exists, creating missing ancestors.
    ///
    /// Idempotent: an existing directory is a no-op, not an error.
    fn ensure_dir(&self, path: &Path) -> Result<PathBuf, FilesystemError>;

    /// List every document under `path`, recursively.
    ///
    /// Each result is a relative, extension-stripped, slash-joined key.
    /// Hidden entries (file name prefixed with `.`) and entries without the
    /// canonical extension are excluded. A missing or empty directory yields
    /// an empty list, not an error.
    fn read_dir(&self, path: &Path) -> Result<Vec<String>, FilesystemError>;

    /// True only if the canonical file exists and is a regular file.
    ///
    /// A directory with a matching name does not count.
    fn file_exists(&self, path: &Path) -> bool;

    /// Read the canonical file and feed its text through `parse`.
    ///
    /// Fails with [`FilesystemError::PathNotFound`] if the file is absent,
    /// [`FilesystemError::FileRead`] for other read failures, and
    /// [`FilesystemError::FileParse`] if `parse` rejects the contents.
    fn read_json<T, P>(&self, path: &Path, parse: P) -> Result<T, FilesystemError>
    where
        P: Fn(&str) -> Result<T, BoxError>;

    /// Discover keys under `path` and read each document sequentially.
    ///
    /// With `ignore_errors` false, the first failure aborts the whole
    /// operation and no partial list is returned. With `ignore_errors` true,
    /// failing entries are dropped silently and successes are returned.
    fn read_json_dir<T, P>(
        &self,
        path: &Path,
        parse: P,
        ignore_errors: bool,
    ) -> Result<Vec<DirectoryEntry<T>>, FilesystemError>
    where
        P: Fn(&str) -> Result<T, BoxError>;

    /// Encode `contents` and overwrite the canonical file with the result.
    ///
    /// Fails with [`FilesystemError::FileEncode`] if `encode` fails, in which
    /// case nothing reaches storage. Ensures the parent directory exists
    /// before writing; I/O failures are [`FilesystemError::FileWrite`].
    fn write_json<T, E>(&self, path: &Path, contents: &T, encode: E) -> Result<(), FilesystemError>
    where
        E: Fn(&T) -> Result<String, BoxError>;

    /// Write the canonical file only if it does not already exist.
    ///
    /// Returns `true` if the file was written, `false` if a file was already
    /// present. The provided implementation is a non-atomic exists-then-write
    /// sequence; backends with an exclusive-create primitive should override
    /// it (the disk backend does).
    fn write_json_if_absent<T, E>(
        &self,
        path: &Path,
        contents: &T,
        encode: E,
    ) -> Result<bool, FilesystemError>
    where
        E: Fn(&T) -> Result<String, BoxError>,
    {
        if self.file_exists(path) {
            return Ok(false);
        }

        self.write_json(path, contents, encode)?;
        Ok(true)
    }

    /// Delete the canonical file.
    ///
    /// Fails with [`FilesystemError::PathNotFound`] if it is absent and
    /// [`FilesystemError::FileRemove`] for other failures.
    fn remove(&self, path: &Path) -> Result<(), FilesystemError>;

    /// Recursively delete the directory at `path` and everything under it.
    ///
    /// There is no already-gone tolerance: a missing directory fails like any
    /// other removal error.
    fn remove_dir(&self, path: &Path) -> Result<(), FilesystemError>;
}

impl<F: Filesystem + ?Sized> Filesystem for &F {
    fn ensure_dir(&self, path: &Path) -> Result<PathBuf, FilesystemError> {
        (**self).ensure_dir(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<String>, FilesystemError> {
        (**self).read_dir(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        (**self).file_exists(path)
    }

    fn read_json<T, P>(&self, path: &Path, parse: P) -> Result<T, FilesystemError>
    where
        P: Fn(&str) -> Result<T, BoxError>,
    {
        (**self).read_json(path, parse)
    }

    fn read_json_dir<T, P>(
        &self,
        path: &Path,
        parse: P,
        ignore_errors: bool,
    ) -> Result<Vec<DirectoryEntry<T>>, FilesystemError>
    where
        P: Fn(&str) -> Result<T, BoxError>,
    {
        (**self).read_json_dir(path, parse, ignore_errors)
    }

    fn write_json<T, E>(&self, path: &Path, contents: &T, encode: E) -> Result<(), FilesystemError>
    where
        E: Fn(&T) -> Result<String, BoxError>,
    {
        (**self).write_json(path, contents, encode)
    }

    fn write_json_if_absent<T, E>(
        &self,
        path: &Path,
        contents: &T,
        encode: E,
    ) -> Result<bool, FilesystemError>
    where
        E: Fn(&T) -> Result<String, BoxError>,
    {
        (**self).write_json_if_absent(path, contents, encode)
    }

    fn remove(&self, path: &Path) -> Result<(), FilesystemError> {
        (**self).remove(path)
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FilesystemError> {
        (**self).remove_dir(path)
    }
}
