//! Client metadata store.
//!
//! Records live in a single `clients.json` document; every mutating call
//! performs a full read-modify-write of that document. Concurrent writers
//! race with last-writer-wins semantics, silently discarding the losing
//! update. There is no cross-request locking.

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::json;

/// A registered backup agent. Created implicitly on first heartbeat, never
/// deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    /// Display label shown on the dashboard. Empty until an admin sets one.
    #[serde(default)]
    pub label: String,

    /// Per-client retention window in days. Heartbeats snapshot the global
    /// default into new records; a missing field falls back to the live
    /// global default at sweep time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,

    /// Timestamp of the last heartbeat.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_seen: Option<OffsetDateTime>,

    /// Agent kind as declared by the client (e.g. `star_machine`).
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Network origin of the last heartbeat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl Client {
    /// Retention window in days: the client's own override if present, the
    /// global default otherwise.
    #[must_use]
    pub fn retention(&self, default_days: u32) -> u32 {
        self.retention_days.unwrap_or(default_days)
    }
}

/// Partial update applied by the admin settings endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ClientPatch {
    /// New display label, if any.
    pub label: Option<String>,
    /// New retention override in days, if any.
    pub retention_days: Option<u32>,
}

/// JSON-document-backed store of client records.
#[derive(Debug, Clone)]
pub struct ClientStore {
    path: PathBuf,
}

impl ClientStore {
    /// Create a store backed by the document at `path`. The document is not
    /// created until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All known clients, keyed by identifier.
    #[must_use]
    pub fn all(&self) -> BTreeMap<String, Client> {
        json::load_or_default(&self.path)
    }

    /// Record a heartbeat, creating the record with defaults if the client
    /// is unknown. `default_retention` is snapshotted into new records.
    ///
    /// # Errors
    ///
    /// Errors if the document cannot be written back.
    #[instrument(skip(self))]
    pub fn record_heartbeat(
        &self,
        client_id: &str,
        kind: &str,
        origin: Option<String>,
        default_retention: u32,
    ) -> crate::Result<()> {
        let mut clients = self.all();

        let client = clients.entry(client_id.to_owned()).or_insert_with(|| {
            debug!("registering new client {client_id}");

            Client {
                label: String::new(),
                retention_days: Some(default_retention),
                last_seen: None,
                kind: String::new(),
                ip_address: None,
            }
        });

        client.last_seen = Some(OffsetDateTime::now_utc());
        client.kind = kind.to_owned();
        client.ip_address = origin;

        json::save(&self.path, &clients)
    }

    /// Set a client's display label. Returns `false` if the client is
    /// unknown.
    ///
    /// # Errors
    ///
    /// Errors if the document cannot be written back.
    pub fn set_label(&self, client_id: &str, label: &str) -> crate::Result<bool> {
        self.update(
            client_id,
            &ClientPatch {
                label: Some(label.to_owned()),
                retention_days: None,
            },
        )
    }

    /// Apply a partial update to a client. Returns `false` if the client is
    /// unknown.
    ///
    /// # Errors
    ///
    /// Errors if the document cannot be written back.
    #[instrument(skip(self))]
    pub fn update(&self, client_id: &str, patch: &ClientPatch) -> crate::Result<bool> {
        let mut clients = self.all();

        let Some(client) = clients.get_mut(client_id) else {
            return Ok(false);
        };

        if let Some(label) = &patch.label {
            client.label = label.clone();
        }

        if let Some(days) = patch.retention_days {
            client.retention_days = Some(days);
        }

        json::save(&self.path, &clients)?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> ClientStore {
        ClientStore::new(dir.path().join("clients.json"))
    }

    #[test]
    fn heartbeat_registers_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .record_heartbeat("new1", "star_machine", Some("10.0.0.2".into()), 30)
            .unwrap();

        let clients = store.all();
        let client = &clients["new1"];

        assert_eq!(client.label, "");
        assert_eq!(client.retention_days, Some(30));
        assert_eq!(client.kind, "star_machine");
        assert_eq!(client.ip_address.as_deref(), Some("10.0.0.2"));
        assert!(client.last_seen.is_some());
    }

    #[test]
    fn heartbeat_keeps_label_and_retention() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store.record_heartbeat("abc", "pc", None, 30).unwrap();
        store.set_label("abc", "office").unwrap();
        store
            .update(
                "abc",
                &ClientPatch {
                    label: None,
                    retention_days: Some(14),
                },
            )
            .unwrap();

        store.record_heartbeat("abc", "pc", None, 30).unwrap();

        let client = &store.all()["abc"];
        assert_eq!(client.label, "office");
        assert_eq!(client.retention_days, Some(14));
    }

    #[test]
    fn update_unknown_client_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        assert!(!store.set_label("ghost", "anything").unwrap());
    }

    #[test]
    fn malformed_document_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = ClientStore::new(path);
        assert!(store.all().is_empty());

        // and it is writable again afterwards
        store.record_heartbeat("abc", "pc", None, 30).unwrap();
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn retention_falls_back_to_default() {
        let client = Client {
            label: String::new(),
            retention_days: None,
            last_seen: None,
            kind: String::new(),
            ip_address: None,
        };

        assert_eq!(client.retention(30), 30);

        let client = Client {
            retention_days: Some(7),
            ..client
        };

        assert_eq!(client.retention(30), 7);
    }
}
