//! Remote blob backend.
//!
//! Thin client for a bearer-token blob HTTP API. Every operation reports
//! [`Error::BlobUnavailable`] instead of crashing when no credential is
//! configured. Upload quota is delegated to the remote service.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{errors::Error, store::ObjectStore};

const BLOB_API_BASE: &str = "https://blob.vercel-storage.com";

/// Metadata returned by the remote service for a stored blob.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobInfo {
    /// Object key of the blob.
    pub pathname: String,
    /// Public URL, if the service assigned one.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    blobs: Vec<BlobInfo>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    #[serde(default)]
    url: Option<String>,
}

/// Remote blob store client.
#[derive(Debug, Clone)]
pub struct BlobStore {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl BlobStore {
    /// Create a client. A `None` credential disables every operation.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: BLOB_API_BASE.to_owned(),
            token,
        }
    }

    /// Whether a credential is configured.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn token(&self) -> crate::Result<&str> {
        self.token.as_deref().ok_or(Error::BlobUnavailable)
    }

    /// Probe the service with a list call. Used by the diagnostic endpoint.
    ///
    /// # Errors
    ///
    /// Errors if the credential is absent or the service is unreachable.
    pub async fn probe(&self) -> crate::Result<usize> {
        Ok(self.list("test/").await?.len())
    }

    /// Like [`ObjectStore::list`], but returns the full blob metadata.
    ///
    /// # Errors
    ///
    /// Errors if the credential is absent or the request fails.
    #[instrument(skip(self))]
    pub async fn list_blobs(&self, prefix: &str) -> crate::Result<Vec<BlobInfo>> {
        let token = self.token()?;

        let mut req = self.http.get(format!("{}/list", self.base)).bearer_auth(token);

        if !prefix.is_empty() {
            req = req.query(&[("prefix", prefix)]);
        }

        let res: ListResponse = req.send().await?.error_for_status()?.json().await?;

        debug!("listed {} blobs", res.blobs.len());

        Ok(res.blobs)
    }
}

#[async_trait]
impl ObjectStore for BlobStore {
    async fn put(&self, path: &str, data: Bytes) -> crate::Result<Option<String>> {
        let token = self.token()?;

        let filename = path.rsplit('/').next().unwrap_or(path).to_owned();

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(data.to_vec()).file_name(filename))
            .text("pathname", path.to_owned())
            .text("access", "public");

        let res: PutResponse = self
            .http
            .post(format!("{}/put", self.base))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(res.url)
    }

    async fn get(&self, path: &str) -> crate::Result<Bytes> {
        let token = self.token()?;

        let res = self
            .http
            .get(format!("{}/get", self.base))
            .bearer_auth(token)
            .query(&[("pathname", path)])
            .send()
            .await?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }

        Ok(res.error_for_status()?.bytes().await?)
    }

    async fn delete(&self, path: &str) -> crate::Result<bool> {
        let token = self.token()?;

        let res = self
            .http
            .post(format!("{}/delete", self.base))
            .bearer_auth(token)
            .json(&serde_json::json!({ "pathname": path }))
            .send()
            .await?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        res.error_for_status()?;

        Ok(true)
    }

    async fn list(&self, prefix: &str) -> crate::Result<Vec<String>> {
        Ok(self
            .list_blobs(prefix)
            .await?
            .into_iter()
            .map(|blob| blob.pathname)
            .collect())
    }
}
