#![doc = include_str!("../README.md")]
#![warn(
    unreachable_pub,
    missing_debug_implementations,
    missing_docs,
    clippy::pedantic
)]

use std::path::PathBuf;

use tracing::info;

pub mod analytics;
pub mod clients;
pub mod errors;
pub mod retention;
pub mod settings;
pub mod store;
pub mod tree;

pub(crate) mod json;

pub(crate) type Result<T> = core::result::Result<T, errors::Error>;

use clients::ClientStore;
use settings::SettingsStore;
use store::{BlobStore, LocalStore, Storage};

/// Total storage ceiling for the local backend (5 GiB).
pub const MAX_STORAGE_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Name of the directory under the data root that holds the upload tree.
pub(crate) const UPLOAD_DIR: &str = "uploads";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the upload tree and the JSON metadata documents.
    pub data_dir: PathBuf,
    /// Bearer credential for the remote blob backend. Its presence selects
    /// the remote backend.
    pub blob_token: Option<String>,
}

impl Config {
    /// Create a config with no remote backend.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            blob_token: None,
        }
    }
}

/// The context is used for all starkeep operations. It is constructed once
/// at startup and injected into every handler.
#[derive(Debug)]
pub struct Context {
    /// Storage strategy selected at startup.
    pub storage: Storage,
    /// Client metadata store.
    pub clients: ClientStore,
    /// Global settings store.
    pub settings: SettingsStore,
}

impl Context {
    /// Initialize a new context: create the upload root and select the
    /// storage backend.
    ///
    /// # Errors
    ///
    /// Errors if the upload root cannot be created.
    pub fn initialize(config: &Config) -> crate::Result<Self> {
        let local = LocalStore::new(config.data_dir.join(UPLOAD_DIR))?;

        let blob = config
            .blob_token
            .clone()
            .map(|token| BlobStore::new(Some(token)));

        if blob.is_some() {
            info!("remote blob backend selected");
        } else {
            info!("local backend selected at {}", local.root().display());
        }

        Ok(Self {
            storage: Storage::new(local, blob),
            clients: ClientStore::new(config.data_dir.join("clients.json")),
            settings: SettingsStore::new(config.data_dir.join("settings.json")),
        })
    }
}

/// Format a byte count as a human-readable string.
///
/// ```
/// assert_eq!(starkeep::format_bytes(512), "512.0 B");
/// assert_eq!(starkeep::format_bytes(1536), "1.5 KB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;

    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }

    format!("{value:.1} TB")
}
