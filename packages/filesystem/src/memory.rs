//! In-memory filesystem adapter.
//!
//! A fake backend implementing the same [`Filesystem`] contract as the disk
//! adapter. Useful for store tests and for entirely in-memory collections.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{BoxError, FilesystemError};
use crate::traits::{DirectoryEntry, Filesystem};

/// Filesystem adapter holding encoded documents in memory.
///
/// Documents are stored as their encoded text, keyed by extension-less path,
/// so the injected parse/encode functions are exercised exactly as they are
/// against a real disk.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
    directories: Mutex<BTreeSet<PathBuf>>,
}

impl MemoryFilesystem {
    /// Create an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held.
    pub fn len(&self) -> usize {
        self.lock_files().len()
    }

    /// True if no documents are held.
    pub fn is_empty(&self) -> bool {
        self.lock_files().is_empty()
    }

    fn lock_files(&self) -> MutexGuard<'_, BTreeMap<PathBuf, String>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_directories(&self) -> MutexGuard<'_, BTreeSet<PathBuf>> {
        self.directories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn relative_key(root: &Path, document: &Path) -> Option<String> {
        let components: Vec<_> = document
            .strip_prefix(root)
            .ok()?
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();

        Some(components.join("/"))
    }
}

impl Filesystem for MemoryFilesystem {
    fn ensure_dir(&self, path: &Path) -> Result<PathBuf, FilesystemError> {
        self.lock_directories().insert(path.to_path_buf());
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<String>, FilesystemError> {
        let keys = self
            .lock_files()
            .keys()
            .filter(|document| document.starts_with(path))
            .filter_map(|document| Self::relative_key(path, document))
            .collect();

        Ok(keys)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.lock_files().contains_key(path)
    }

    fn read_json<T, P>(&self, path: &Path, parse: P) -> Result<T, FilesystemError>
    where
        P: Fn(&str) -> Result<T, BoxError>,
    {
        let text = self
            .lock_files()
            .get(path)
            .cloned()
            .ok_or_else(|| FilesystemError::PathNotFound {
                path: path.to_path_buf(),
            })?;

        parse(&text).map_err(|source| FilesystemError::FileParse {
            path: path.to_path_buf(),
            source,
        })
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
        let keys = self.read_dir(path)?;
        let mut entries = Vec::with_capacity(keys.len());

        for key in keys {
            let child_path = path.join(&key);

            match self.read_json(&child_path, &parse) {
                Ok(contents) => entries.push(DirectoryEntry {
                    path: child_path,
                    contents,
                }),
                Err(error) if ignore_errors => {
                    log::debug!("skipping unreadable entry {}: {error}", child_path.display());
                }
                Err(error) => return Err(error),
            }
        }

        Ok(entries)
    }

    fn write_json<T, E>(&self, path: &Path, contents: &T, encode: E) -> Result<(), FilesystemError>
    where
        E: Fn(&T) -> Result<String, BoxError>,
    {
        let encoded = encode(contents).map_err(|source| FilesystemError::FileEncode {
            path: path.to_path_buf(),
            source,
        })?;

        self.lock_files().insert(path.to_path_buf(), encoded);
        Ok(())
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
        let encoded = encode(contents).map_err(|source| FilesystemError::FileEncode {
            path: path.to_path_buf(),
            source,
        })?;

        // Checked and inserted under one lock, so this backend's
        // conditional create is atomic.
        let mut files = self.lock_files();
        if files.contains_key(path) {
            return Ok(false);
        }

        files.insert(path.to_path_buf(), encoded);
        Ok(true)
    }

    fn remove(&self, path: &Path) -> Result<(), FilesystemError> {
        self.lock_files()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FilesystemError::PathNotFound {
                path: path.to_path_buf(),
            })
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FilesystemError> {
        let mut files = self.lock_files();
        let known_dir = self.lock_directories().remove(path);

        let doomed: Vec<_> = files
            .keys()
            .filter(|document| document.starts_with(path))
            .cloned()
            .collect();

        if !known_dir && doomed.is_empty() {
            return Err(FilesystemError::FileRemove {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
            });
        }

        for document in doomed {
            files.remove(&document);
        }

        Ok(())
    }
}
