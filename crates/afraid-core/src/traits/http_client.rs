// # HTTP Client Trait
//
// The capability both network call sites (account listing and per-record
// refresh) are given explicitly, so each can be exercised with a fake.
//
// ## Implementations
//
// - reqwest: `afraid-http` crate
// - Tests: scripted fakes in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use afraid_core::HttpClient;
// use std::time::Duration;
//
// async fn probe(http: &dyn HttpClient) -> afraid_core::Result<String> {
//     http.get("http://freedns.afraid.org/api/", &[("action", "getdyndns")],
//              Duration::from_secs(2)).await
// }
// ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for issuing HTTP GET requests
///
/// # Contract
///
/// - Exactly one request per call; no retries, no caching
/// - The request must not outlive `timeout`
/// - Non-success statuses are failures, reported as [`crate::Error::Http`]
/// - On success the body is returned as text, untouched
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET request and return the response body
    ///
    /// # Parameters
    ///
    /// - `url`: Absolute URL to request
    /// - `query`: Query parameters appended to `url`
    /// - `timeout`: Upper bound for the whole exchange
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String, crate::Error>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String, crate::Error> {
        (**self).get(url, query, timeout).await
    }
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Box<T> {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String, crate::Error> {
        (**self).get(url, query, timeout).await
    }
}
