//! HTTP fetch of catalog snapshots.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 64MB (configurable)
//! - Request timeout: 20s (configurable)

use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

use shelf_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "ebook-shelf/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 64MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "ebook-shelf/0.1".to_string(),
            max_bytes: 64 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// HTTP fetch client with size and time limits.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

fn network_error(context: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{context}: {err}"))
    } else {
        Error::HttpError(format!("{context}: {err}"))
    }
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
    /// Non-success statuses and bodies over `max_bytes` are errors.
    pub async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = url.clone();

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "application/zip, application/octet-stream;q=0.9, */*;q=0.8")
            .send()
            .await
            .map_err(|e| network_error("network error", e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_error("failed to read response", e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url, final_url, status, content_type, bytes, fetch_ms })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "ebook-shelf/0.1");
        assert_eq!(config.max_bytes, 64 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "shelf-test/1".into(), max_bytes: 1024, timeout_ms: 500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "shelf-test/1");
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let config = FetchConfig::default();
        let client = FetchClient::new(config);
        assert!(client.is_ok());
    }
}
