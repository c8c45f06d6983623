// # HTTP Transport
//
// This crate provides the reqwest-backed `HttpClient` used by the daemon
// for both the account listing and the per-record update URLs.
//
// ## Behaviour
//
// - One request per call, no retries (the scheduler's next pass is the retry)
// - The caller's timeout bounds the whole exchange
// - Non-2xx statuses become transport errors; the body is not inspected

use afraid_core::traits::HttpClient;
use afraid_core::{Error, Result};

use std::time::Duration;
use tracing::debug;

/// User agent sent with every request
const USER_AGENT: &str = concat!("afraid/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed HTTP client
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client with default settings
    ///
    /// # Errors
    ///
    /// [`Error::Http`] when the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, query: &[(&str, &str)], timeout: Duration) -> Result<String> {
        debug!("GET {} (timeout {:?})", url, timeout);

        let mut request = self.client.get(url).timeout(timeout);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(describe(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("Unexpected status {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", describe(e))))
    }
}

/// Render a reqwest error without the URL (update URLs embed per-host secrets)
fn describe(err: reqwest::Error) -> String {
    if err.is_timeout() {
        "Request timed out".to_string()
    } else if err.is_connect() {
        format!("Connection failed: {}", err.without_url())
    } else {
        format!("Request failed: {}", err.without_url())
    }
}
