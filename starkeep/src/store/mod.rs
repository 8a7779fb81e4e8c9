//! Pluggable storage backends.
//!
//! Objects are addressed by `<client-id>/<relative-path>` keys with `/`
//! separators. The backend is selected once at startup: the remote blob
//! store when a credential is configured, the local filesystem otherwise.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, instrument, warn};

pub mod blob;
pub mod local;

pub use blob::BlobStore;
pub use local::LocalStore;

/// The capability set shared by every backend.
#[async_trait]
pub trait ObjectStore {
    /// Store an object, overwriting any previous object at the same path.
    /// Remote backends may return a public URL for the stored object.
    async fn put(&self, path: &str, data: Bytes) -> crate::Result<Option<String>>;

    /// Fetch an object's bytes.
    async fn get(&self, path: &str) -> crate::Result<Bytes>;

    /// Remove an object. `Ok(false)` means there was nothing to remove.
    async fn delete(&self, path: &str) -> crate::Result<bool>;

    /// All object paths beginning with `prefix`.
    async fn list(&self, prefix: &str) -> crate::Result<Vec<String>>;
}

/// Configuration-selected storage strategy.
///
/// The local store is always kept around: a failed remote `put` falls back
/// to a local write within the same call, so a single object may end up in
/// either backend depending on transient failures. The retention sweeper
/// and the analytics aggregator only ever look at the local store.
#[derive(Debug)]
pub struct Storage {
    local: LocalStore,
    blob: Option<BlobStore>,
}

impl Storage {
    /// Combine a local store with an optional remote backend.
    #[must_use]
    pub fn new(local: LocalStore, blob: Option<BlobStore>) -> Self {
        Self { local, blob }
    }

    /// The local filesystem backend.
    #[must_use]
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// The remote blob backend, if active.
    #[must_use]
    pub fn blob(&self) -> Option<&BlobStore> {
        self.blob.as_ref()
    }

    /// Whether the remote backend is active.
    #[must_use]
    pub fn uses_blob(&self) -> bool {
        self.blob.is_some()
    }

    /// Store an object. The remote backend is tried first when active; on
    /// failure the write falls back to local storage. The storage ceiling is
    /// enforced for local-only operation (the remote service polices its own
    /// quota).
    ///
    /// # Errors
    ///
    /// Errors with [`crate::errors::Error::StorageFull`] if the write would
    /// exceed the local ceiling, or with an I/O error if the local write
    /// fails.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn put(&self, path: &str, data: Bytes) -> crate::Result<Option<String>> {
        if let Some(blob) = &self.blob {
            match blob.put(path, data.clone()).await {
                Ok(url) => return Ok(url),
                Err(e) => warn!("blob upload failed, falling back to local storage: {e}"),
            }
        } else {
            self.local.check_quota(data.len() as u64)?;
        }

        self.local.put(path, data).await?;

        Ok(None)
    }

    /// Fetch an object, preferring the remote backend when active.
    ///
    /// # Errors
    ///
    /// Errors with [`crate::errors::Error::NotFound`] if neither backend
    /// holds the object.
    pub async fn get(&self, path: &str) -> crate::Result<Bytes> {
        if let Some(blob) = &self.blob {
            match blob.get(path).await {
                Ok(data) => return Ok(data),
                Err(e) => debug!("blob read missed, trying local storage: {e}"),
            }
        }

        self.local.get(path).await
    }

    /// Remove an object from whichever backends hold it, best-effort.
    /// Returns whether anything was removed; backend failures are logged
    /// and swallowed.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> bool {
        let mut deleted = false;

        if let Some(blob) = &self.blob {
            match blob.delete(path).await {
                Ok(d) => deleted |= d,
                Err(e) => warn!("blob delete failed: {e}"),
            }
        }

        match self.local.delete(path).await {
            Ok(d) => deleted |= d,
            Err(e) => warn!("local delete failed: {e}"),
        }

        deleted
    }

    /// All object paths beginning with `prefix`, from the active backend.
    ///
    /// # Errors
    ///
    /// Errors if the active backend cannot be enumerated.
    pub async fn list(&self, prefix: &str) -> crate::Result<Vec<String>> {
        if let Some(blob) = &self.blob {
            return blob.list(prefix).await;
        }

        self.local.list(prefix).await
    }

    /// Ensure an empty folder placeholder exists. Meaningful for the local
    /// backend only; the remote store has no notion of directories.
    ///
    /// # Errors
    ///
    /// Errors if the directory cannot be created.
    pub fn create_dir(&self, path: &str) -> crate::Result<()> {
        self.local.create_dir(path)
    }
}
