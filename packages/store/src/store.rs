//! The item store: keys to schema-validated records within one directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use shoebox_filesystem::{DiskFilesystem, Filesystem, FilesystemError};

use crate::codec::{ItemCodec, Migration};
use crate::error::StoreError;

/// Construction parameters for a [`Store`].
///
/// Collected in one value rather than global per-module defaults so every
/// policy is explicit at the construction site.
#[derive(Default)]
pub struct StoreConfig {
    /// Ordered chain of document migrations. The tag stamped on newly
    /// written records equals the chain length.
    pub migrations: Vec<Migration>,

    /// Schema field whose stringified value derives a record's key. When
    /// set, explicitly passed keys are ignored; when unset, an explicit key
    /// is mandatory on every write.
    pub primary_key: Option<String>,

    /// When true, decode and access failures degrade to absent results
    /// instead of errors. Fixed for the store's lifetime; never overridable
    /// per call.
    pub ignore_errors: bool,
}

impl StoreConfig {
    /// An empty configuration: no migrations, explicit keys, errors raised.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A keyed collection of schema-validated records under one directory.
///
/// `T` is the schema: any `Serialize + DeserializeOwned` type. `F` is the
/// storage capability; the default is the real disk backend, and
/// [`shoebox_filesystem::MemoryFilesystem`] or any other [`Filesystem`]
/// implementation can be substituted.
///
/// Records are stored one file per key with a reserved `__schema_version__`
/// field; records written under an older migration chain are transparently
/// upgraded at read time. See [`crate::codec`] for the pipeline.
///
/// The backing directory is treated as exclusively owned by one logical
/// store per process. Concurrent stores or external writers pointed at the
/// same directory are not coordinated.
pub struct Store<T, F = DiskFilesystem> {
    pub(crate) directory: PathBuf,
    pub(crate) codec: Arc<ItemCodec<T>>,
    pub(crate) primary_key: Option<String>,
    pub(crate) ignore_errors: bool,
    pub(crate) filesystem: Arc<F>,
}

impl<T, F> Clone for Store<T, F> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            codec: Arc::clone(&self.codec),
            primary_key: self.primary_key.clone(),
            ignore_errors: self.ignore_errors,
            filesystem: Arc::clone(&self.filesystem),
        }
    }
}

impl<T> Store<T, DiskFilesystem>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a disk-backed store, ensuring its directory exists.
    pub fn create(directory: impl Into<PathBuf>, config: StoreConfig) -> Result<Self, StoreError> {
        Self::with_filesystem(directory, DiskFilesystem::new(), config)
    }
}

impl<T, F> Store<T, F>
where
    T: Serialize + DeserializeOwned,
    F: Filesystem,
{
    /// Create a store over an explicit filesystem capability.
    ///
    /// The directory is created (with any missing ancestors) if it does not
    /// exist; repeating construction over an existing directory is a no-op.
    /// A directory that cannot be set up is an error regardless of the
    /// `ignore_errors` policy: there is no store to degrade to.
    pub fn with_filesystem(
        directory: impl Into<PathBuf>,
        filesystem: F,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        let directory = directory.into();
        filesystem
            .ensure_dir(&directory)
            .map_err(StoreError::classify)?;

        Ok(Self {
            directory,
            codec: Arc::new(ItemCodec::new(config.migrations)),
            primary_key: config.primary_key,
            ignore_errors: config.ignore_errors,
            filesystem: Arc::new(filesystem),
        })
    }

    /// The directory backing this store.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Check whether a key exists in the store.
    pub fn exists(&self, key: &str) -> bool {
        self.filesystem.file_exists(&self.key_path(key))
    }

    /// Get an item by key, if that key exists.
    ///
    /// An absent key is `Ok(None)`, never an error, for any `ignore_errors`
    /// setting. Unreadable or invalid records are errors, or `Ok(None)`
    /// when the policy suppresses them.
    pub fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        let codec = Arc::clone(&self.codec);
        let result = self
            .filesystem
            .read_json(&self.key_path(key), move |text| codec.parse(text));

        match result {
            Ok(item) => Ok(Some(item)),
            Err(error) => self.absorb(error),
        }
    }

    /// All keys in the store, nested keys included.
    pub fn get_all_keys(&self) -> Result<Vec<String>, StoreError> {
        match self.filesystem.read_dir(&self.directory) {
            Ok(keys) => Ok(keys),
            Err(error) => self.absorb(error).map(Option::unwrap_or_default),
        }
    }

    /// All `(key, item)` pairs in the store.
    ///
    /// The store's `ignore_errors` policy is forwarded to the directory
    /// read, so individual unreadable records are dropped silently when the
    /// policy allows; a directory-level failure is classified exactly like
    /// a single-record failure.
    pub fn get_all_entries(&self) -> Result<Vec<(String, T)>, StoreError> {
        let codec = Arc::clone(&self.codec);
        let result = self.filesystem.read_json_dir(
            &self.directory,
            move |text| codec.parse(text),
            self.ignore_errors,
        );

        match result {
            Ok(entries) => Ok(entries
                .into_iter()
                .map(|entry| (self.entry_key(&entry.path), entry.contents))
                .collect()),
            Err(error) => self.absorb(error).map(Option::unwrap_or_default),
        }
    }

    /// All items in the store.
    pub fn get_all_items(&self) -> Result<Vec<T>, StoreError> {
        let entries = self.get_all_entries()?;
        Ok(entries.into_iter().map(|(_key, item)| item).collect())
    }

    /// Put a single item to the store, returning its effective key.
    ///
    /// Returns `Ok(None)` if a write or encode failure was suppressed by
    /// the `ignore_errors` policy.
    ///
    /// # Panics
    ///
    /// Panics if no key is derivable: neither an explicit `key` nor a
    /// configured primary key, or a primary-key field missing from the
    /// item. See [`StoreConfig::primary_key`].
    pub fn put(&self, item: &T, key: Option<&str>) -> Result<Option<String>, StoreError> {
        let item_key = self.resolve_key(item, key);
        let codec = Arc::clone(&self.codec);
        let result = self
            .filesystem
            .write_json(&self.key_path(&item_key), item, move |value| {
                codec.encode(value)
            });

        match result {
            Ok(()) => Ok(Some(item_key)),
            Err(error) => self.absorb(error),
        }
    }

    /// Ensure an item exists at the given key, get-or-initialize style.
    ///
    /// Returns the existing item if the key is present, otherwise writes
    /// `default_item` and returns it. The write-if-absent step uses the
    /// adapter's conditional-create primitive: on the disk backend that
    /// step is atomic, while a backend relying on the default
    /// exists-then-write implementation leaves a window where a concurrent
    /// writer to the same key can be overwritten.
    ///
    /// # Panics
    ///
    /// Panics under the same key-resolution contract as [`Store::put`].
    pub fn ensure(&self, default_item: T, key: Option<&str>) -> Result<T, StoreError> {
        let item_key = self.resolve_key(&default_item, key);

        if let Some(existing) = self.get(&item_key)? {
            return Ok(existing);
        }

        let codec = Arc::clone(&self.codec);
        let result = self.filesystem.write_json_if_absent(
            &self.key_path(&item_key),
            &default_item,
            move |value| codec.encode(value),
        );

        match result {
            Ok(true) => Ok(default_item),
            // Lost a race to a concurrent writer: their item wins.
            Ok(false) => Ok(self.get(&item_key)?.unwrap_or(default_item)),
            Err(error) => {
                self.absorb::<()>(error)?;
                Ok(default_item)
            }
        }
    }

    /// Delete a single item, returning the deleted key.
    ///
    /// An absent key is `Ok(None)`, never an error. Other removal failures
    /// are classified per the `ignore_errors` policy.
    pub fn delete(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.filesystem.remove(&self.key_path(key)) {
            Ok(()) => Ok(Some(key.to_string())),
            Err(error) => self.absorb(error),
        }
    }

    /// Delete the store and every item in it. Irreversible.
    pub fn delete_store(&self) -> Result<(), StoreError> {
        match self.filesystem.remove_dir(&self.directory) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.absorb::<()>(error)?;
                Ok(())
            }
        }
    }

    pub(crate) fn key_path(&self, key: &str) -> PathBuf {
        self.directory.join(key)
    }

    pub(crate) fn entry_key(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.directory).unwrap_or(path);
        let components: Vec<_> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();

        components.join("/")
    }

    pub(crate) fn resolve_key(&self, item: &T, key: Option<&str>) -> String {
        match &self.primary_key {
            Some(field) => self.codec.primary_key_of(item, field),
            None => key
                .unwrap_or_else(|| {
                    panic!("an explicit key is required when no primary key is configured")
                })
                .to_string(),
        }
    }

    /// Apply the error policy: absence and suppressed failures become
    /// `Ok(None)`, everything else is classified and raised.
    pub(crate) fn absorb<R>(&self, error: FilesystemError) -> Result<Option<R>, StoreError> {
        if error.is_not_found() {
            return Ok(None);
        }

        if self.ignore_errors {
            log::debug!("suppressing storage failure: {error}");
            return Ok(None);
        }

        Err(StoreError::classify(error))
    }
}
