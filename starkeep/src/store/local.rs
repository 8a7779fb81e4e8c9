//! Local filesystem backend.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{errors::Error, store::ObjectStore, MAX_STORAGE_BYTES};

/// Filesystem-backed object store rooted at the upload directory. Objects
/// live at `<root>/<client-id>/<relative-path>`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    limit: u64,
}

impl LocalStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Errors if the root directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> crate::Result<Self> {
        Self::with_limit(root, MAX_STORAGE_BYTES)
    }

    /// Create a store with a custom storage ceiling.
    ///
    /// # Errors
    ///
    /// Errors if the root directory cannot be created.
    pub fn with_limit(root: impl Into<PathBuf>, limit: u64) -> crate::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self { root, limit })
    }

    /// Upload root on disk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage ceiling in bytes.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Resolve an object key to a path on disk. Segments are joined as-is;
    /// traversal segments are not sanitized.
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Total bytes stored under the root.
    #[must_use]
    pub fn usage(&self) -> u64 {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|meta| meta.len())
            .sum()
    }

    /// Percentage of the ceiling currently in use.
    #[must_use]
    pub fn usage_percent(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let percent = self.usage() as f64 / self.limit as f64 * 100.0;
        percent
    }

    /// Reject an incoming write that would push usage past the ceiling.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::StorageFull`] carrying the current usage.
    pub fn check_quota(&self, incoming: u64) -> crate::Result<()> {
        let usage = self.usage();

        if usage + incoming > self.limit {
            return Err(Error::StorageFull { usage });
        }

        Ok(())
    }

    /// Create an empty directory placeholder at `path`. Idempotent.
    ///
    /// # Errors
    ///
    /// Errors if the directory cannot be created.
    pub fn create_dir(&self, path: &str) -> crate::Result<()> {
        fs::create_dir_all(self.resolve(path))?;

        Ok(())
    }

    /// Remove empty ancestor directories of `path`, stopping at (and never
    /// removing) the upload root. Deleting the last file of a date folder
    /// removes the date folder, and then the client folder if it too became
    /// empty.
    fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();

        while let Some(d) = dir {
            if d == self.root {
                break;
            }

            let is_empty = fs::read_dir(d)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);

            if !is_empty || fs::remove_dir(d).is_err() {
                break;
            }

            debug!("removed empty folder {}", d.display());
            dir = d.parent();
        }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, path: &str, data: Bytes) -> crate::Result<Option<String>> {
        let target = self.resolve(path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&target, &data)?;
        debug!("wrote {} bytes to {}", data.len(), target.display());

        Ok(None)
    }

    async fn get(&self, path: &str) -> crate::Result<Bytes> {
        match fs::read(self.resolve(path)) {
            Ok(data) => Ok(data.into()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> crate::Result<bool> {
        let target = self.resolve(path);

        if !target.is_file() {
            return Ok(false);
        }

        fs::remove_file(&target)?;
        self.prune_empty_parents(&target);

        Ok(true)
    }

    async fn list(&self, prefix: &str) -> crate::Result<Vec<String>> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("error walking {}: {e}", self.root.display());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };

            let rel = rel.to_string_lossy().replace('\\', "/");

            if rel.starts_with(prefix) {
                paths.push(rel);
            }
        }

        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::new(dir.path().join("uploads")).unwrap()
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .put("abc123/2024-01-01/report.pdf", Bytes::from_static(b"0123456789"))
            .await
            .unwrap();

        let data = store.get("abc123/2024-01-01/report.pdf").await.unwrap();
        assert_eq!(&data[..], b"0123456789");
    }

    #[tokio::test]
    async fn put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .put("abc/a.txt", Bytes::from_static(b"first"))
            .await
            .unwrap();
        store
            .put("abc/a.txt", Bytes::from_static(b"second"))
            .await
            .unwrap();

        assert_eq!(&store.get("abc/a.txt").await.unwrap()[..], b"second");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        assert!(matches!(
            store.get("nope/file").await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_prunes_empty_date_and_client_folders() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .put("abc/2024-01-01/report.pdf", Bytes::from_static(b"x"))
            .await
            .unwrap();

        assert!(store.delete("abc/2024-01-01/report.pdf").await.unwrap());

        assert!(!store.root().join("abc/2024-01-01").exists());
        assert!(!store.root().join("abc").exists());
        assert!(store.root().exists());
    }

    #[tokio::test]
    async fn delete_keeps_non_empty_folders() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .put("abc/2024-01-01/a.txt", Bytes::from_static(b"a"))
            .await
            .unwrap();
        store
            .put("abc/2024-01-01/b.txt", Bytes::from_static(b"b"))
            .await
            .unwrap();

        assert!(store.delete("abc/2024-01-01/a.txt").await.unwrap());
        assert!(store.root().join("abc/2024-01-01/b.txt").is_file());
    }

    #[tokio::test]
    async fn delete_missing_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        assert!(!store.delete("abc/none").await.unwrap());
    }

    #[tokio::test]
    async fn list_walks_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .put("abc/2024-01-01/a.txt", Bytes::from_static(b"a"))
            .await
            .unwrap();
        store
            .put("xyz/2024-01-02/b.txt", Bytes::from_static(b"b"))
            .await
            .unwrap();

        assert_eq!(
            store.list("").await.unwrap(),
            vec!["abc/2024-01-01/a.txt", "xyz/2024-01-02/b.txt"]
        );
        assert_eq!(store.list("abc/").await.unwrap(), vec!["abc/2024-01-01/a.txt"]);
    }

    #[tokio::test]
    async fn quota_rejects_oversized_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::with_limit(dir.path().join("uploads"), 16).unwrap();

        store
            .put("abc/a.bin", Bytes::from_static(b"0123456789"))
            .await
            .unwrap();

        match store.check_quota(10) {
            Err(Error::StorageFull { usage }) => assert_eq!(usage, 10),
            other => panic!("expected StorageFull, got {other:?}"),
        }

        assert!(store.check_quota(6).is_ok());
    }
}
