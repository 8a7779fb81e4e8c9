//! Global settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::json;

/// Retention window applied to clients that have not overridden it, in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Global defaults. Created with built-in values on first access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Default retention window in days.
    #[serde(default = "default_retention")]
    pub default_retention_days: u32,
}

const fn default_retention() -> u32 {
    DEFAULT_RETENTION_DAYS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

/// JSON-document-backed store of the global settings.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store backed by the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current settings, or the built-in defaults if the document is missing
    /// or malformed.
    #[must_use]
    pub fn get(&self) -> Settings {
        json::load_or_default(&self.path)
    }

    /// Replace the settings document.
    ///
    /// # Errors
    ///
    /// Errors if the document cannot be written.
    pub fn set(&self, settings: &Settings) -> crate::Result<()> {
        json::save(&self.path, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_document_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        assert_eq!(store.get().default_retention_days, DEFAULT_RETENTION_DAYS);
    }

    #[test]
    fn updates_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        store
            .set(&Settings {
                default_retention_days: 10,
            })
            .unwrap();

        assert_eq!(store.get().default_retention_days, 10);
    }
}
