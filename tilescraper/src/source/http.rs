//! HTTP client abstraction for testability

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use super::types::SourceError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body, `None` if the server reports no content for the
    /// URL, or an error.
    fn get(&self, url: &str) -> Result<Option<Vec<u8>>, SourceError>;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn get(&self, url: &str) -> Result<Option<Vec<u8>>, SourceError> {
        (**self).get(url)
    }
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("tilescraper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

/// Map a response status to whether the body holds a tile.
///
/// 404 and 204 mean the server has no tile there; other non-success
/// statuses are errors.
fn has_tile(status: StatusCode, url: &str) -> Result<bool, SourceError> {
    if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
        return Ok(false);
    }
    if !status.is_success() {
        return Err(SourceError::HttpError(format!("HTTP {} from {}", status, url)));
    }
    Ok(true)
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SourceError::HttpError(format!("Request failed: {}", e)))?;

        if !has_tile(response.status(), url)? {
            return Ok(None);
        }

        response
            .bytes()
            .map(|b| Some(b.to_vec()))
            .map_err(|e| SourceError::HttpError(format!("Failed to read response: {}", e)))
    }
}
