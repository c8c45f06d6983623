//! Test doubles and common utilities for contract tests
//!
//! `FakeHttpClient` replays canned replies per URL and records every
//! request it receives.

#![allow(dead_code)]

use afraid_core::error::{Error, Result};
use afraid_core::traits::HttpClient;
use afraid_core::{AgentConfig, DnsRecord, RecordSet};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// What the fake answers for a URL
#[derive(Debug, Clone)]
pub enum Reply {
    /// 2xx with this body
    Body(String),
    /// Transport failure with this message
    Fail(String),
}

impl Reply {
    pub fn body(body: &str) -> Self {
        Reply::Body(body.to_string())
    }

    pub fn fail(msg: &str) -> Self {
        Reply::Fail(msg.to_string())
    }
}

/// One request seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
}

/// A scripted HttpClient that tracks calls
#[derive(Default)]
pub struct FakeHttpClient {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<SeenRequest>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for a URL (replaces any earlier script)
    pub fn prime(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made to `url`
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url == url)
            .count()
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str, query: &[(&str, &str)], timeout: Duration) -> Result<String> {
        self.requests.lock().unwrap().push(SeenRequest {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timeout,
        });

        match self.replies.lock().unwrap().get(url) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Fail(msg)) => Err(Error::http(msg.clone())),
            None => Err(Error::http(format!("connection refused: {}", url))),
        }
    }
}

/// Update URL used for a hostname throughout the tests
pub fn update_url(hostname: &str) -> String {
    format!("http://freedns.afraid.org/dynamic/update.php?{}", hostname)
}

/// A record set with one record per hostname, all at 192.0.2.1
pub fn record_set(hostnames: &[&str]) -> RecordSet {
    hostnames
        .iter()
        .map(|hostname| DnsRecord::new(*hostname, "192.0.2.1", update_url(hostname)))
        .collect()
}

/// Listing body for the given hostnames, in the provider's format
pub fn listing_body(hostnames: &[&str]) -> String {
    hostnames
        .iter()
        .map(|hostname| format!("{}|192.0.2.1|{}", hostname, update_url(hostname)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Helper to create a config with a short interval for testing
pub fn fast_config() -> AgentConfig {
    AgentConfig::new("wintermute", "secret").with_interval(1)
}
