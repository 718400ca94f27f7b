//! Single-slot disk cache around a fallible refresh operation
//!
//! A `CacheCell` binds one on-disk JSON file to one refresh function and one
//! freshness policy. Reads return the best available value under a layered
//! degradation policy: a freshly refreshed value is preferred, a stale disk
//! copy is returned when the refresh fails, and an optional bootstrap file
//! seeds the cache on first use. Only when every layer fails does `read()`
//! return an error.
//!
//! State lives in the filesystem rather than in memory, so two cells pointed
//! at the same file observe each other's writes, and the cache survives
//! process restarts. Freshness is derived solely from the backing file's
//! modification time; there is no metadata envelope around the stored value.
//!
//! The cell performs no cross-process locking. Concurrent reads against the
//! same file may interleave and the last writer wins; callers that need
//! single-flight semantics must coordinate externally.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;

use super::dir;

/// Error type produced by a cell's refresh function.
///
/// Boxed so any caller error type can flow through the cell and into the
/// final [`CacheError::Refresh`] message.
pub type RefreshError = Box<dyn std::error::Error + Send + Sync>;

/// Stored refresh function: invoked whenever the backing file is stale.
type RefreshFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, RefreshError>> + Send + Sync>;

/// Errors surfaced by [`CacheCell::read`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache root could not be created. Without a writable root no
    /// degradation path is possible, so this is the one failure that is
    /// propagated immediately.
    #[error("failed to create cache directory '{}': {}", path.display(), source)]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The refresh function failed and no previously cached value could be
    /// loaded from disk.
    #[error("refresh failed for cache file '{}': {}", path.display(), source)]
    Refresh {
        /// Backing file of the cell
        path: PathBuf,
        /// Error returned by the refresh function
        source: RefreshError,
    },

    /// The backing file was missing or undecodable and no refresh was
    /// attempted (the file looked fresh) or possible.
    #[error("failed to load cache file '{}': {}", path.display(), source)]
    Load {
        /// Backing file of the cell
        path: PathBuf,
        /// Underlying read or decode error
        source: ReadError,
    },
}

/// Errors observed while reading and decoding the backing file
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file could not be read
    #[error("failed to read cache file: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents were not valid for the cached type
    #[error("failed to decode cache file: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors observed while persisting a value or clearing the backing file.
///
/// Never propagated: a failed persist does not invalidate the in-memory
/// value and a failed clear is advisory. Retained via
/// [`CacheCell::last_write_error`] for diagnostics.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The value could not be serialized
    #[error("failed to encode cached value: {0}")]
    Encode(#[from] serde_json::Error),

    /// The file could not be written or removed
    #[error("failed to write cache file: {0}")]
    Io(#[from] std::io::Error),
}

/// A single logical cache slot bound to one on-disk file.
///
/// Construct with [`CacheCell::new`] (platform cache root) or
/// [`CacheCell::with_dir`] (explicit root, useful for testing), then adjust
/// the freshness policy with [`CacheCell::with_ttl`] and optionally seed
/// cold starts with [`CacheCell::with_bootstrap`].
///
/// The default TTL is zero: every `read()` attempts a refresh and falls back
/// to the disk copy when it fails.
pub struct CacheCell<T> {
    refresher: RefreshFn<T>,
    cache_dir: PathBuf,
    file_path: PathBuf,
    ttl: Duration,
    bootstrap_file: Option<PathBuf>,
    last_read_error: Option<ReadError>,
    last_write_error: Option<WriteError>,
}

impl<T> fmt::Debug for CacheCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCell")
            .field("file_path", &self.file_path)
            .field("ttl", &self.ttl)
            .field("bootstrap_file", &self.bootstrap_file)
            .finish_non_exhaustive()
    }
}

impl<T> CacheCell<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a cell backed by `file_name` under the platform cache root.
    ///
    /// # Arguments
    /// * `file_name` - File name (with extension) joined to the cache root
    /// * `refresher` - Operation invoked to produce a fresh value when the
    ///   backing file is stale
    pub fn new<F, Fut>(file_name: impl AsRef<Path>, refresher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T, RefreshError>> + Send + 'static,
    {
        Self::with_dir(dir::cache_root(), file_name, refresher)
    }

    /// Creates a cell backed by `file_name` under an explicit cache root
    pub fn with_dir<F, Fut>(
        cache_dir: impl Into<PathBuf>,
        file_name: impl AsRef<Path>,
        refresher: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T, RefreshError>> + Send + 'static,
    {
        let cache_dir = cache_dir.into();
        let file_path = cache_dir.join(file_name.as_ref());
        Self {
            refresher: Box::new(move || refresher().boxed()),
            cache_dir,
            file_path,
            ttl: Duration::ZERO,
            bootstrap_file: None,
            last_read_error: None,
            last_write_error: None,
        }
    }

    /// Sets how long the backing file stays fresh after a write.
    ///
    /// A file exactly `ttl` old is still fresh; staleness requires the age
    /// to strictly exceed the TTL. The default of zero makes every `read()`
    /// attempt a refresh.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets a seed file whose raw bytes are imported when the backing file
    /// does not exist yet. The import is best-effort; failures are swallowed.
    pub fn with_bootstrap(mut self, seed: impl Into<PathBuf>) -> Self {
        self.bootstrap_file = Some(seed.into());
        self
    }

    /// Path of the backing file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Read or decode error swallowed during the most recent operation
    pub fn last_read_error(&self) -> Option<&ReadError> {
        self.last_read_error.as_ref()
    }

    /// Write or clear error swallowed during the most recent operation
    pub fn last_write_error(&self) -> Option<&WriteError> {
        self.last_write_error.as_ref()
    }

    /// Returns the best available value for this cell.
    ///
    /// The backing file's modification time decides staleness. A stale (or
    /// missing) file triggers the refresh function; a successful refresh is
    /// persisted and returned, and a persist failure is recorded without
    /// discarding the fresh value. When no fresh value was produced the disk
    /// copy is decoded and returned instead.
    ///
    /// # Returns
    /// * `Ok(T)` - A freshly refreshed value, or the last persisted one
    /// * `Err(CacheError)` - Only when the cache root cannot be created, or
    ///   when refresh, disk read, and bootstrap import all failed to produce
    ///   a usable value
    pub async fn read(&mut self) -> Result<T, CacheError> {
        self.last_read_error = None;
        self.last_write_error = None;

        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|source| CacheError::CreateDir {
                path: self.cache_dir.clone(),
                source,
            })?;

        let modified = self.modified_or_seed().await;
        let mut refresh_error = None;

        if is_stale(modified, SystemTime::now(), self.ttl) {
            match (self.refresher)().await {
                Ok(value) => {
                    if let Err(err) = self.persist(&value).await {
                        tracing::warn!(
                            path = %self.file_path.display(),
                            error = %err,
                            "failed to persist refreshed value; returning it uncached"
                        );
                        self.last_write_error = Some(err);
                    }
                    return Ok(value);
                }
                Err(err) => {
                    tracing::debug!(
                        path = %self.file_path.display(),
                        error = %err,
                        "refresh failed; falling back to cached copy"
                    );
                    refresh_error = Some(err);
                }
            }
        }

        match self.load().await {
            Ok(value) => Ok(value),
            Err(read_error) => match refresh_error {
                Some(source) => {
                    // The refresh failure is the primary error; the read
                    // failure stays queryable as a diagnostic.
                    self.last_read_error = Some(read_error);
                    Err(CacheError::Refresh {
                        path: self.file_path.clone(),
                        source,
                    })
                }
                None => Err(CacheError::Load {
                    path: self.file_path.clone(),
                    source: read_error,
                }),
            },
        }
    }

    /// Deletes the backing file.
    ///
    /// Never fails from the caller's perspective: a cache that was never
    /// populated is already cleared. A removal error is recorded and
    /// queryable via [`CacheCell::last_write_error`].
    pub async fn clear(&mut self) {
        self.last_write_error = None;
        if let Err(err) = fs::remove_file(&self.file_path).await {
            tracing::debug!(
                path = %self.file_path.display(),
                error = %err,
                "failed to remove cache file"
            );
            self.last_write_error = Some(WriteError::Io(err));
        }
    }

    /// Modification time of the backing file, importing the bootstrap seed
    /// first when the file does not exist.
    ///
    /// A missing or unreadable file reports `UNIX_EPOCH`, which is older
    /// than any TTL and therefore always stale.
    async fn modified_or_seed(&self) -> SystemTime {
        match fs::metadata(&self.file_path).await {
            Ok(meta) => meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            Err(_) => {
                if let Some(seed) = &self.bootstrap_file {
                    if let Err(err) = fs::copy(seed, &self.file_path).await {
                        tracing::debug!(
                            seed = %seed.display(),
                            error = %err,
                            "bootstrap import failed"
                        );
                    }
                }
                SystemTime::UNIX_EPOCH
            }
        }
    }

    async fn persist(&self, value: &T) -> Result<(), WriteError> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&self.file_path, json).await?;
        Ok(())
    }

    async fn load(&self) -> Result<T, ReadError> {
        let content = fs::read_to_string(&self.file_path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Returns true when a file last modified at `modified` has outlived `ttl`
/// at time `now`. A file exactly `ttl` old is not stale; a modification time
/// in the future counts as fresh.
fn is_stale(modified: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age > ttl,
        Err(_) => false,
    }
}
