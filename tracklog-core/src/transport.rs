//! Network submission of entry batches
//!
//! A [`Transport`] makes exactly one delivery attempt per call. Retrying is
//! the collector's business: a failed batch goes back into the buffer and
//! rides along with the next flush.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::codec;
use crate::config::CollectorConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};

/// Header carrying the per-install identity
pub const IDENTITY_HEADER: &str = "tracking-identity";

/// Delivers a batch to the collection endpoint
///
/// `Ok(())` means delivered; `Err` carries the failure reason.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, identity: &str, batch: &[Entry]) -> Result<()>;
}

/// HTTP POST transport
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpTransport {
    /// Create a transport from configuration
    ///
    /// Returns an error if the endpoint is missing or invalid.
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let endpoint = config.validate_endpoint()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, identity: &str, batch: &[Entry]) -> Result<()> {
        let body = codec::encode(batch)
            .ok_or_else(|| Error::Transport("failed to encode batch".to_string()))?;

        let identity = HeaderValue::from_str(identity)
            .map_err(|e| Error::Transport(format!("invalid identity header: {}", e)))?;

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(IDENTITY_HEADER, identity)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        // Any response counts as delivery; only the status is worth noting.
        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = %status, count = batch.len(), "Batch delivered");
        } else {
            tracing::info!(status = %status, count = batch.len(), "Batch delivered with non-success status");
        }

        Ok(())
    }
}
