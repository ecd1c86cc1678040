//! Disk-backed filesystem adapter over `std::fs`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{BoxError, FilesystemError};
use crate::traits::{DirectoryEntry, Filesystem};
use crate::{canonical_path, EXTENSION};

/// The default, `std::fs`-backed filesystem adapter.
///
/// Stateless: every operation resolves paths and performs I/O directly, so
/// the same instance can be shared freely between stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFilesystem;

impl DiskFilesystem {
    /// Create a disk filesystem adapter.
    pub fn new() -> Self {
        DiskFilesystem
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn relative_key(root: &Path, file_path: &Path) -> Option<String> {
    let relative = file_path.strip_prefix(root).ok()?.with_extension("");
    let components: Vec<_> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();

    Some(components.join("/"))
}

impl Filesystem for DiskFilesystem {
    fn ensure_dir(&self, path: &Path) -> Result<PathBuf, FilesystemError> {
        fs::create_dir_all(path).map_err(|source| FilesystemError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<String>, FilesystemError> {
        // A directory that was never created holds no documents.
        if !path.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();

        for entry in WalkDir::new(path) {
            let entry = entry.map_err(|error| {
                let entry_path = error
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| path.to_path_buf());

                FilesystemError::FileRead {
                    path: entry_path,
                    source: error.into(),
                }
            })?;

            if !entry.file_type().is_file()
                || is_hidden(entry.path())
                || entry.path().extension() != Some(EXTENSION.as_ref())
            {
                continue;
            }

            if let Some(key) = relative_key(path, entry.path()) {
                keys.push(key);
            }
        }

        Ok(keys)
    }

    fn file_exists(&self, path: &Path) -> bool {
        canonical_path(path).is_file()
    }

    fn read_json<T, P>(&self, path: &Path, parse: P) -> Result<T, FilesystemError>
    where
        P: Fn(&str) -> Result<T, BoxError>,
    {
        let file_path = canonical_path(path);
        log::debug!("reading {}", file_path.display());

        let text = fs::read_to_string(&file_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                FilesystemError::PathNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                log::debug!("unexpected error reading {}: {source}", file_path.display());
                FilesystemError::FileRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        parse(&text).map_err(|source| {
            log::debug!("unable to parse {}: {source}", file_path.display());
            FilesystemError::FileParse {
                path: path.to_path_buf(),
                source,
            }
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
        let file_path = canonical_path(path);

        let encoded = encode(contents).map_err(|source| {
            log::debug!("unable to encode for {}: {source}", file_path.display());
            FilesystemError::FileEncode {
                path: path.to_path_buf(),
                source,
            }
        })?;

        if let Some(parent) = file_path.parent() {
            self.ensure_dir(parent)?;
        }

        log::debug!("writing {}", file_path.display());
        fs::write(&file_path, encoded).map_err(|source| FilesystemError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
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
        let file_path = canonical_path(path);

        let encoded = encode(contents).map_err(|source| FilesystemError::FileEncode {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = file_path.parent() {
            self.ensure_dir(parent)?;
        }

        // Exclusive create: losing a race to another writer is reported as
        // "already present" rather than overwriting their document.
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
        {
            Ok(mut file) => {
                log::debug!("writing {}", file_path.display());
                file.write_all(encoded.as_bytes())
                    .map_err(|source| FilesystemError::FileWrite {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Ok(true)
            }
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(source) => Err(FilesystemError::FileWrite {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn remove(&self, path: &Path) -> Result<(), FilesystemError> {
        let file_path = canonical_path(path);

        fs::remove_file(&file_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                FilesystemError::PathNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                log::debug!("unexpected error removing {}: {source}", file_path.display());
                FilesystemError::FileRemove {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FilesystemError> {
        fs::remove_dir_all(path).map_err(|source| FilesystemError::FileRemove {
            path: path.to_path_buf(),
            source,
        })
    }
}
