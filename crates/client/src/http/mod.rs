//! HTTP-backed remote store.
//!
//! Speaks the registry's `/api/cves` surface:
//!
//! - `GET /api/cves` lists every record
//! - `POST /api/cves` stores one record
//! - `DELETE /api/cves/{id}` removes one record (200 even when absent)
//! - `PATCH /api/cves/{id}/status` changes a record's status
//!
//! Transport errors and timeouts become `Unreachable`, undecodable bodies
//! `Malformed`, `404` `NotFound`, `400`/`409`/`422` `Rejected`, and any other
//! non-success status `Unreachable`.

pub mod error;

pub use error::ClientError;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use cvetrack_core::{AppConfig, FieldUpdate, Record, RemoteStore, StoreFailure, StoreResult};
use reqwest::{RequestBuilder, header};
use serde::de::DeserializeOwned;
use url::Url;

use error::{status_failure, transport_failure};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = concat!("cvetrack/", env!("CARGO_PKG_VERSION"));

/// HTTP store configuration.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Server base URL, e.g. `http://127.0.0.1:3000`.
    pub base_url: String,
    /// Per-request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for HttpStoreConfig {
    fn from(config: &AppConfig) -> Self {
        Self { base_url: config.api_url.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// Remote store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    http: reqwest::Client,
    base: Url,
}

impl HttpStore {
    /// Create a store client for the given configuration.
    pub fn new(config: HttpStoreConfig) -> Result<Self, ClientError> {
        let base = Url::parse(config.base_url.trim()).map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl(config.base_url));
        }

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self { http, base })
    }

    /// `{base}/api/cves/{tail...}`, with each tail segment percent-encoded.
    fn endpoint(&self, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "cves"]).extend(tail);
        }
        url
    }

    /// Send a request and hand back the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> StoreResult<Vec<u8>> {
        let start = Instant::now();
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_failure)?;
        tracing::debug!(%status, elapsed = ?start.elapsed(), "registry API responded");

        if !status.is_success() {
            return Err(status_failure(status, &body));
        }
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|e| StoreFailure::Malformed(e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        let records: Vec<Record> = self.send_json(self.http.get(self.endpoint(&[]))).await?;
        tracing::debug!(count = records.len(), "listed records over HTTP");
        Ok(records)
    }

    async fn put(&self, record: &Record) -> StoreResult<Record> {
        self.send_json(self.http.post(self.endpoint(&[])).json(record)).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.send(self.http.delete(self.endpoint(&[id]))).await.map(drop)
    }

    async fn update_field(&self, id: &str, update: FieldUpdate) -> StoreResult<Record> {
        let request = match update {
            FieldUpdate::Status(status) => self
                .http
                .patch(self.endpoint(&[id, update.field_name()]))
                .json(&serde_json::json!({ "status": status })),
        };
        self.send_json(request).await
    }
}
