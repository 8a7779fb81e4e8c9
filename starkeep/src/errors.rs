//! Error types.

/// All of the possible errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Disk I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A request to the remote blob service failed.
    #[error("blob request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote blob backend has no credential configured.
    #[error("blob storage unavailable")]
    BlobUnavailable,

    /// No such file or folder.
    #[error("no such file or folder")]
    NotFound,

    /// The write would push local storage past its ceiling.
    #[error("storage limit exceeded ({usage} bytes in use)")]
    StorageFull {
        /// Current usage in bytes.
        usage: u64,
    },
}
