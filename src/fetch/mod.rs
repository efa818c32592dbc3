//! HTTP fetching for upstream JSON APIs.
//!
//! Thin wrapper around a shared `reqwest::Client` that applies the request
//! timeout and user agent, classifies non-success statuses and decodes JSON
//! bodies into typed responses.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::SyncSettings;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Extra headers sent with every request (e.g. API tokens)
    pub headers: Vec<(String, String)>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: format!("uic-sync/{}", env!("CARGO_PKG_VERSION")),
            headers: Vec::new(),
        }
    }
}

impl From<&SyncSettings> for FetcherConfig {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.request_timeout_secs),
            user_agent: settings.user_agent.clone(),
            headers: Vec::new(),
        }
    }
}

impl FetcherConfig {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// HTTP client for JSON endpoints.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("uic-sync")),
        );

        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FetchError::InvalidHeader(format!("bad name {}: {}", name, e)))?;
            let mut value = HeaderValue::from_str(value)
                .map_err(|e| FetchError::InvalidHeader(format!("bad value for {}: {}", name, e)))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// GET a URL and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        debug!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Join path segments onto a base URL, percent-encoding each segment.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = Url::parse(base).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(format!("{} cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let url = endpoint("https://primebot.me/api/v1", &["team", "116908"]).unwrap();
        assert_eq!(url.as_str(), "https://primebot.me/api/v1/team/116908");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let url = endpoint("https://primebot.me/api/v1/", &["team", "1"]).unwrap();
        assert_eq!(url.as_str(), "https://primebot.me/api/v1/team/1");
    }

    #[test]
    fn test_endpoint_encodes_riot_ids() {
        let url = endpoint(
            "https://europe.api.riotgames.com",
            &["riot", "account", "v1", "accounts", "by-riot-id", "UIC Speedy", "EUW"],
        )
        .unwrap();
        assert!(url.as_str().ends_with("/by-riot-id/UIC%20Speedy/EUW"));
    }

    #[test]
    fn test_endpoint_invalid_base() {
        assert!(matches!(
            endpoint("not a url", &["x"]),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_fetcher_config_default() {
        let config = FetcherConfig::default();

        assert_eq!(config.timeout, Duration::from_secs(20));
        assert!(config.user_agent.starts_with("uic-sync/"));
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_fetcher_rejects_bad_header() {
        let config = FetcherConfig::default().with_header("bad header", "x");
        assert!(matches!(Fetcher::new(config), Err(FetchError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let fetcher = Fetcher::new(FetcherConfig {
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();
        let url = Url::parse("http://127.0.0.1:9/unreachable").unwrap();

        let result: Result<serde_json::Value, _> = fetcher.get_json(&url).await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
