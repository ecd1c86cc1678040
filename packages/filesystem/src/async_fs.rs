//! Async variant of the filesystem capability.
//!
//! [`AsyncFilesystem`] mirrors the blocking [`Filesystem`] trait operation
//! for operation, with identical semantics. [`SyncToAsyncFs`] derives the
//! non-blocking form from any blocking backend by scheduling the same logic
//! on the Tokio blocking pool, so there is one core algorithm rather than
//! two drifting code paths.

use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::{self, JoinHandle};

use crate::disk::DiskFilesystem;
use crate::error::{BoxError, FilesystemError};
use crate::traits::{DirectoryEntry, Filesystem};

/// Non-blocking capability interface for "JSON documents by key under a
/// directory".
///
/// Semantics match [`Filesystem`] exactly; only scheduling differs. Injected
/// parse/encode functions carry `Send + Sync + 'static` bounds because they
/// may run on a worker thread.
#[async_trait]
pub trait AsyncFilesystem: Send + Sync {
    /// Async form of [`Filesystem::ensure_dir`].
    async fn ensure_dir_async(&self, path: &Path) -> Result<PathBuf, FilesystemError>;

    /// Async form of [`Filesystem::read_dir`].
    async fn read_dir_async(&self, path: &Path) -> Result<Vec<String>, FilesystemError>;

    /// Async form of [`Filesystem::file_exists`].
    async fn file_exists_async(&self, path: &Path) -> bool;

    /// Async form of [`Filesystem::read_json`].
    async fn read_json_async<T, P>(&self, path: &Path, parse: P) -> Result<T, FilesystemError>
    where
        T: Send + 'static,
        P: Fn(&str) -> Result<T, BoxError> + Send + Sync + 'static;

    /// Async form of [`Filesystem::read_json_dir`].
    ///
    /// Per-file reads may run concurrently; the order of returned entries is
    /// not guaranteed to match [`Filesystem::read_dir`] ordering. With
    /// `ignore_errors` false the first failure propagates and no partial
    /// list is returned.
    async fn read_json_dir_async<T, P>(
        &self,
        path: &Path,
        parse: P,
        ignore_errors: bool,
    ) -> Result<Vec<DirectoryEntry<T>>, FilesystemError>
    where
        T: Send + 'static,
        P: Fn(&str) -> Result<T, BoxError> + Send + Sync + 'static;

    /// Async form of [`Filesystem::write_json`].
    ///
    /// Takes `contents` by value because the write happens off the caller's
    /// execution context.
    async fn write_json_async<T, E>(
        &self,
        path: &Path,
        contents: T,
        encode: E,
    ) -> Result<(), FilesystemError>
    where
        T: Send + 'static,
        E: Fn(&T) -> Result<String, BoxError> + Send + Sync + 'static;

    /// Async form of [`Filesystem::write_json_if_absent`].
    async fn write_json_if_absent_async<T, E>(
        &self,
        path: &Path,
        contents: T,
        encode: E,
    ) -> Result<bool, FilesystemError>
    where
        T: Send + 'static,
        E: Fn(&T) -> Result<String, BoxError> + Send + Sync + 'static;

    /// Async form of [`Filesystem::remove`].
    async fn remove_async(&self, path: &Path) -> Result<(), FilesystemError>;

    /// Async form of [`Filesystem::remove_dir`].
    async fn remove_dir_async(&self, path: &Path) -> Result<(), FilesystemError>;
}

/// Adapter running a blocking [`Filesystem`] on the Tokio blocking pool.
///
/// Cloning is cheap: clones share the wrapped backend. The wrapped backend
/// stays reachable through [`SyncToAsyncFs::blocking`], so callers can mix
/// blocking and non-blocking calls against the same storage.
#[derive(Debug)]
pub struct SyncToAsyncFs<F = DiskFilesystem> {
    inner: Arc<F>,
}

impl<F> SyncToAsyncFs<F> {
    /// Wrap a blocking filesystem backend.
    pub fn new(inner: F) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Wrap an already-shared blocking backend.
    pub fn from_arc(inner: Arc<F>) -> Self {
        Self { inner }
    }

    /// The wrapped blocking filesystem.
    pub fn blocking(&self) -> &F {
        &self.inner
    }
}

impl<F> Clone for SyncToAsyncFs<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Await a blocking-pool task, resuming panics on the caller.
async fn join_task<R>(handle: JoinHandle<R>) -> R {
    match handle.await {
        Ok(result) => result,
        Err(error) => match error.try_into_panic() {
            Ok(payload) => panic::resume_unwind(payload),
            Err(error) => panic!("blocking filesystem task was cancelled: {error}"),
        },
    }
}

/// Run one blocking storage operation on the Tokio blocking pool and await
/// its result, resuming panics on the caller.
///
/// Higher layers derive their own non-blocking operations through this
/// entry point so scheduling semantics stay uniform across the stack.
pub async fn run_blocking<R, Task>(task: Task) -> R
where
    R: Send + 'static,
    Task: FnOnce() -> R + Send + 'static,
{
    join_task(task::spawn_blocking(task)).await
}

#[async_trait]
impl<F> AsyncFilesystem for SyncToAsyncFs<F>
where
    F: Filesystem + 'static,
{
    async fn ensure_dir_async(&self, path: &Path) -> Result<PathBuf, FilesystemError> {
        let fs = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        run_blocking(move || fs.ensure_dir(&path)).await
    }

    async fn read_dir_async(&self, path: &Path) -> Result<Vec<String>, FilesystemError> {
        let fs = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        run_blocking(move || fs.read_dir(&path)).await
    }

    async fn file_exists_async(&self, path: &Path) -> bool {
        let fs = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        run_blocking(move || fs.file_exists(&path)).await
    }

    async fn read_json_async<T, P>(&self, path: &Path, parse: P) -> Result<T, FilesystemError>
    where
        T: Send + 'static,
        P: Fn(&str) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let fs = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        run_blocking(move || fs.read_json(&path, parse)).await
    }

    async fn read_json_dir_async<T, P>(
        &self,
        path: &Path,
        parse: P,
        ignore_errors: bool,
    ) -> Result<Vec<DirectoryEntry<T>>, FilesystemError>
    where
        T: Send + 'static,
        P: Fn(&str) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let keys = self.read_dir_async(path).await?;
        let parse = Arc::new(parse);
        let mut handles = Vec::with_capacity(keys.len());

        for key in keys {
            let fs = Arc::clone(&self.inner);
            let parse = Arc::clone(&parse);
            let child_path = path.join(&key);

            handles.push(task::spawn_blocking(move || {
                let contents = fs.read_json(&child_path, |text| (*parse)(text))?;
                Ok(DirectoryEntry {
                    path: child_path,
                    contents,
                })
            }));
        }

        // Every task is awaited even after a failure so that no partial
        // result is returned while reads are still in flight.
        let mut entries = Vec::with_capacity(handles.len());
        let mut first_error: Option<FilesystemError> = None;

        for handle in handles {
            match join_task(handle).await {
                Ok(entry) => entries.push(entry),
                Err(error) if ignore_errors => {
                    log::debug!("skipping unreadable entry: {error}");
                }
                Err(error) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(entries),
        }
    }

    async fn write_json_async<T, E>(
        &self,
        path: &Path,
        contents: T,
        encode: E,
    ) -> Result<(), FilesystemError>
    where
        T: Send + 'static,
        E: Fn(&T) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        let fs = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        run_blocking(move || fs.write_json(&path, &contents, encode)).await
    }

    async fn write_json_if_absent_async<T, E>(
        &self,
        path: &Path,
        contents: T,
        encode: E,
    ) -> Result<bool, FilesystemError>
    where
        T: Send + 'static,
        E: Fn(&T) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        let fs = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        run_blocking(move || fs.write_json_if_absent(&path, &contents, encode)).await
    }

    async fn remove_async(&self, path: &Path) -> Result<(), FilesystemError> {
        let fs = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        run_blocking(move || fs.remove(&path)).await
    }

    async fn remove_dir_async(&self, path: &Path) -> Result<(), FilesystemError> {
        let fs = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        run_blocking(move || fs.remove_dir(&path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;

    fn parse_value(text: &str) -> Result<Value, BoxError> {
        serde_json::from_str(text).map_err(Into::into)
    }

    fn encode_value(value: &Value) -> Result<String, BoxError> {
        serde_json::to_string(value).map_err(Into::into)
    }

    #[tokio::test]
    async fn async_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let fs_adapter = SyncToAsyncFs::new(DiskFilesystem::new());
        let doc_path = dir.path().join("robots/r2d2");
        let value = json!({"name": "r2d2"});

        fs_adapter
            .write_json_async(&doc_path, value.clone(), encode_value)
            .await
            .unwrap();

        assert!(fs_adapter.file_exists_async(&doc_path).await);
        let result = fs_adapter
            .read_json_async(&doc_path, parse_value)
            .await
            .unwrap();
        assert_eq!(result, value);

        fs_adapter.remove_async(&doc_path).await.unwrap();
        assert!(!fs_adapter.file_exists_async(&doc_path).await);
    }

    #[tokio::test]
    async fn concurrent_dir_read_aborts_on_corrupt_entry() {
        let dir = tempfile::tempdir().unwrap();
        let fs_adapter = SyncToAsyncFs::new(DiskFilesystem::new());

        for n in 0..5 {
            fs_adapter
                .write_json_async(&dir.path().join(format!("doc-{n}")), json!({"n": n}), encode_value)
                .await
                .unwrap();
        }
        fs::write(dir.path().join("corrupt.json"), "{nope").unwrap();

        let error = fs_adapter
            .read_json_dir_async(dir.path(), parse_value, false)
            .await
            .unwrap_err();

        assert!(matches!(error, FilesystemError::FileParse { .. }));
    }

    #[tokio::test]
    async fn concurrent_dir_read_can_drop_corrupt_entries() {
        let dir = tempfile::tempdir().unwrap();
        let fs_adapter = SyncToAsyncFs::new(DiskFilesystem::new());

        for n in 0..3 {
            fs_adapter
                .write_json_async(&dir.path().join(format!("doc-{n}")), json!({"n": n}), encode_value)
                .await
                .unwrap();
        }
        fs::write(dir.path().join("corrupt.json"), "{nope").unwrap();

        let entries = fs_adapter
            .read_json_dir_async(dir.path(), parse_value, true)
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn ensure_dir_async_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let fs_adapter = SyncToAsyncFs::new(DiskFilesystem::new());
        let target = dir.path().join("a/b");

        fs_adapter.ensure_dir_async(&target).await.unwrap();
        fs_adapter.ensure_dir_async(&target).await.unwrap();

        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn blocking_accessor_shares_storage() {
        let dir = tempfile::tempdir().unwrap();
        let fs_adapter = SyncToAsyncFs::new(DiskFilesystem::new());
        let doc_path = dir.path().join("shared");

        fs_adapter
            .blocking()
            .write_json(&doc_path, &json!({"via": "blocking"}), encode_value)
            .unwrap();

        let result = fs_adapter
            .read_json_async(&doc_path, parse_value)
            .await
            .unwrap();
        assert_eq!(result, json!({"via": "blocking"}));
    }
}
