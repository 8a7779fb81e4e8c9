//! Load/save helpers for the JSON metadata documents.

use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Read a JSON document, falling back to `T::default()` if the file is
/// missing or malformed. A broken document is never a hard error.
pub(crate) fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!("malformed document at {}: {e}", path.display());
            T::default()
        }),
        Err(_) => T::default(),
    }
}

/// Write a JSON document, creating parent directories as needed.
pub(crate) fn save<T: Serialize>(path: &Path, value: &T) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, serde_json::to_vec_pretty(value)?)?;

    Ok(())
}
