//! HTTP client for upstream fetches and queue delivery.
//!
//! Wraps reqwest with the gateway's User-Agent, timeout, redirect cap, and
//! body size cap. Unlike a plain client, a non-2xx status is not an error
//! here: the strategies gate on status themselves, so `get` only fails on
//! network-level problems or oversized bodies.

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::{Client, StatusCode, Url, header};
use squall_core::{Error, ResponseSnapshot};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "squall/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "squall/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// Response from an upstream fetch.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchedResponse {
    /// Capture this response as a storable snapshot.
    ///
    /// Header values that are not valid UTF-8 are dropped.
    pub fn to_snapshot(&self) -> ResponseSnapshot {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        ResponseSnapshot::new(self.status.as_u16(), headers, self.bytes.clone())
    }
}

/// HTTP client for upstream requests.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Any HTTP status is returned as-is; only network failures and
    /// oversized bodies produce an error.
    pub async fn get(&self, url: &Url) -> Result<FetchedResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::HttpError(format!("network error: {}", e)))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes, status {})",
            url,
            final_url,
            fetch_ms,
            bytes.len(),
            status.as_u16()
        );

        Ok(FetchedResponse { url: url.clone(), final_url, status, headers, bytes, fetch_ms })
    }

    /// Deliver a JSON payload with POST.
    ///
    /// Any HTTP response counts as delivered; only a network-level failure
    /// is an error.
    pub async fn post_json(&self, url: &Url, payload: &serde_json::Value) -> Result<StatusCode, Error> {
        let response = self
            .http
            .post(url.as_str())
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::SubmitFailed(format!("network error: {}", e)))?;

        Ok(response.status())
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}
