//! Non-blocking forms of every store operation.
//!
//! Each `*_async` method runs the corresponding blocking operation on the
//! Tokio blocking pool, so the two forms cannot drift apart. The directory
//! scans are the exception: they go through the adapter's concurrent
//! per-file reads instead of one long blocking call.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use shoebox_filesystem::{
    run_blocking, AsyncFilesystem, DiskFilesystem, Filesystem, SyncToAsyncFs,
};

use crate::error::StoreError;
use crate::store::{Store, StoreConfig};

impl<T> Store<T, DiskFilesystem>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Async form of [`Store::create`].
    pub async fn create_async(
        directory: impl Into<PathBuf>,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        Self::with_filesystem_async(directory, DiskFilesystem::new(), config).await
    }
}

impl<T, F> Store<T, F>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: Filesystem + 'static,
{
    /// Async form of [`Store::with_filesystem`].
    pub async fn with_filesystem_async(
        directory: impl Into<PathBuf>,
        filesystem: F,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        let directory = directory.into();
        let filesystem = Arc::new(filesystem);

        SyncToAsyncFs::from_arc(Arc::clone(&filesystem))
            .ensure_dir_async(&directory)
            .await
            .map_err(StoreError::classify)?;

        Ok(Self {
            directory,
            codec: Arc::new(crate::codec::ItemCodec::new(config.migrations)),
            primary_key: config.primary_key,
            ignore_errors: config.ignore_errors,
            filesystem,
        })
    }

    /// Async form of [`Store::exists`].
    pub async fn exists_async(&self, key: &str) -> bool {
        let store = self.clone();
        let key = key.to_string();
        run_blocking(move || store.exists(&key)).await
    }

    /// Async form of [`Store::get`].
    pub async fn get_async(&self, key: &str) -> Result<Option<T>, StoreError> {
        let store = self.clone();
        let key = key.to_string();
        run_blocking(move || store.get(&key)).await
    }

    /// Async form of [`Store::get_all_keys`].
    pub async fn get_all_keys_async(&self) -> Result<Vec<String>, StoreError> {
        let store = self.clone();
        run_blocking(move || store.get_all_keys()).await
    }

    /// Async form of [`Store::get_all_entries`].
    ///
    /// Individual records are read concurrently on the blocking pool, so
    /// entry order is not guaranteed to match [`Store::get_all_keys`].
    pub async fn get_all_entries_async(&self) -> Result<Vec<(String, T)>, StoreError> {
        let bridge = SyncToAsyncFs::from_arc(Arc::clone(&self.filesystem));
        let codec = Arc::clone(&self.codec);
        let result = bridge
            .read_json_dir_async(
                &self.directory,
                move |text| codec.parse(text),
                self.ignore_errors,
            )
            .await;

        match result {
            Ok(entries) => Ok(entries
                .into_iter()
                .map(|entry| (self.entry_key(&entry.path), entry.contents))
                .collect()),
            Err(error) => self.absorb(error).map(Option::unwrap_or_default),
        }
    }

    /// Async form of [`Store::get_all_items`].
    pub async fn get_all_items_async(&self) -> Result<Vec<T>, StoreError> {
        let entries = self.get_all_entries_async().await?;
        Ok(entries.into_iter().map(|(_key, item)| item).collect())
    }

    /// Async form of [`Store::put`]. Takes the item by value because the
    /// write happens off the caller's execution context.
    ///
    /// # Panics
    ///
    /// Panics under the same key-resolution contract as [`Store::put`].
    pub async fn put_async(&self, item: T, key: Option<&str>) -> Result<Option<String>, StoreError> {
        let store = self.clone();
        let key = key.map(str::to_string);
        run_blocking(move || store.put(&item, key.as_deref())).await
    }

    /// Async form of [`Store::ensure`].
    ///
    /// # Panics
    ///
    /// Panics under the same key-resolution contract as [`Store::put`].
    pub async fn ensure_async(&self, default_item: T, key: Option<&str>) -> Result<T, StoreError> {
        let store = self.clone();
        let key = key.map(str::to_string);
        run_blocking(move || store.ensure(default_item, key.as_deref())).await
    }

    /// Async form of [`Store::delete`].
    pub async fn delete_async(&self, key: &str) -> Result<Option<String>, StoreError> {
        let store = self.clone();
        let key = key.to_string();
        run_blocking(move || store.delete(&key)).await
    }

    /// Async form of [`Store::delete_store`].
    pub async fn delete_store_async(&self) -> Result<(), StoreError> {
        let store = self.clone();
        run_blocking(move || store.delete_store()).await
    }
}
