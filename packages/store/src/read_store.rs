//! Read-only view over a store directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use shoebox_filesystem::{DiskFilesystem, Filesystem};

use crate::codec::ItemCodec;
use crate::error::StoreError;
use crate::store::{Store, StoreConfig};

/// A store handle without the write surface.
///
/// Runs the same decode pipeline as [`Store`] — migrations, schema
/// validation, the `ignore_errors` policy — but exposes only the read
/// operations, so a component that must never mutate a shared directory
/// can be handed a `ReadStore` and the compiler enforces the rest.
///
/// Construction never touches storage: a directory that does not exist
/// yet simply reads as empty.
pub struct ReadStore<T, F = DiskFilesystem> {
    inner: Store<T, F>,
}

impl<T, F> Clone for ReadStore<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, F> From<Store<T, F>> for ReadStore<T, F> {
    fn from(store: Store<T, F>) -> Self {
        Self { inner: store }
    }
}

impl<T, F> Store<T, F> {
    /// A read-only view sharing this store's directory, policy, and
    /// migration chain.
    pub fn read_only(&self) -> ReadStore<T, F> {
        ReadStore {
            inner: self.clone(),
        }
    }
}

impl<T> ReadStore<T, DiskFilesystem>
where
    T: Serialize + DeserializeOwned,
{
    /// Open a read-only view of a disk-backed store directory.
    ///
    /// Unlike [`Store::create`] this cannot fail: nothing is created, and
    /// a missing directory behaves as an empty store.
    pub fn open(directory: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self::with_filesystem(directory, DiskFilesystem::new(), config)
    }
}

impl<T, F> ReadStore<T, F>
where
    T: Serialize + DeserializeOwned,
    F: Filesystem,
{
    /// Open a read-only view over an explicit filesystem capability.
    pub fn with_filesystem(
        directory: impl Into<PathBuf>,
        filesystem: F,
        config: StoreConfig,
    ) -> Self {
        Self {
            inner: Store {
                directory: directory.into(),
                codec: Arc::new(ItemCodec::new(config.migrations)),
                primary_key: config.primary_key,
                ignore_errors: config.ignore_errors,
                filesystem: Arc::new(filesystem),
            },
        }
    }

    /// The directory backing this view.
    pub fn directory(&self) -> &Path {
        self.inner.directory()
    }

    /// Check whether a key exists in the store.
    pub fn exists(&self, key: &str) -> bool {
        self.inner.exists(key)
    }

    /// Get an item by key, if that key exists.
    pub fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.inner.get(key)
    }

    /// All keys in the store, nested keys included.
    pub fn get_all_keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.get_all_keys()
    }

    /// All `(key, item)` pairs in the store.
    pub fn get_all_entries(&self) -> Result<Vec<(String, T)>, StoreError> {
        self.inner.get_all_entries()
    }

    /// All items in the store.
    pub fn get_all_items(&self) -> Result<Vec<T>, StoreError> {
        self.inner.get_all_items()
    }
}

#[cfg(feature = "async")]
impl<T, F> ReadStore<T, F>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: Filesystem + 'static,
{
    /// Async form of [`ReadStore::exists`].
    pub async fn exists_async(&self, key: &str) -> bool {
        self.inner.exists_async(key).await
    }

    /// Async form of [`ReadStore::get`].
    pub async fn get_async(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.inner.get_async(key).await
    }

    /// Async form of [`ReadStore::get_all_keys`].
    pub async fn get_all_keys_async(&self) -> Result<Vec<String>, StoreError> {
        self.inner.get_all_keys_async().await
    }

    /// Async form of [`ReadStore::get_all_entries`].
    pub async fn get_all_entries_async(&self) -> Result<Vec<(String, T)>, StoreError> {
        self.inner.get_all_entries_async().await
    }

    /// Async form of [`ReadStore::get_all_items`].
    pub async fn get_all_items_async(&self) -> Result<Vec<T>, StoreError> {
        self.inner.get_all_items_async().await
    }
}
