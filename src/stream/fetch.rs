//! Thumbnail downloads with per-attempt deadlines and retries.
//!
//! ERROR HANDLING
//! ==============
//! A download that fails every attempt yields `None`; the caller renders a
//! placeholder for it. Failures are logged here and never escalate.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected status {status}")]
    Status { status: u16 },
    #[error("empty response body")]
    Empty,
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Source of raw thumbnail bytes.
#[async_trait::async_trait]
pub trait ThumbnailFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// One finished download, keyed by its position in the URL list.
#[derive(Debug)]
pub struct DownloadResult {
    pub index: usize,
    /// `None` leaves the cell as a placeholder.
    pub bytes: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
}

// =============================================================================
// HTTP FETCHER
// =============================================================================

pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(connect_timeout: Duration) -> Result<Self, FetchError> {
        // Per-attempt deadlines are applied by the caller.
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| FetchError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl ThumbnailFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status { status });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// RETRY
// =============================================================================

/// Fetch `url`, giving each attempt its own deadline.
pub async fn fetch_with_retry(fetcher: &dyn ThumbnailFetcher, url: &str, policy: RetryPolicy) -> Option<Vec<u8>> {
    for attempt in 1..=policy.attempts {
        match tokio::time::timeout(policy.attempt_timeout, fetcher.fetch(url)).await {
            Ok(Ok(bytes)) => {
                debug!(url, attempt, len = bytes.len(), "stream: download ok");
                return Some(bytes);
            }
            Ok(Err(e)) => {
                warn!(error = %e, url, attempt, total = policy.attempts, "stream: download failed");
            }
            Err(_) => {
                let timeout_ms = policy.attempt_timeout.as_millis();
                warn!(url, attempt, total = policy.attempts, timeout_ms, "stream: download timed out");
            }
        }
        if attempt < policy.attempts {
            tokio::time::sleep(backoff_delay(policy.backoff, attempt)).await;
        }
    }
    None
}

/// Linear backoff plus up to 20% jitter so parallel retries spread out.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let linear = base.saturating_mul(attempt);
    let jitter_cap = u64::try_from(linear.as_millis() / 5).unwrap_or(0);
    if jitter_cap == 0 {
        return linear;
    }
    let jitter = rand::rng().random_range(0..=jitter_cap);
    linear + Duration::from_millis(jitter)
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
