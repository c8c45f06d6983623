//! Configuration types for the update agent

use crate::listing::DEFAULT_API_URL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Agent configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Account login
    pub login: String,

    /// Account password
    /// ⚠️ NEVER log this value
    pub password: String,

    /// Hostnames to keep updated (empty = every host on the account)
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Seconds to sleep between passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound for each HTTP request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Bulk listing endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Capacity of the scheduler event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl AgentConfig {
    /// Create a configuration with defaults for everything but credentials
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            hosts: Vec::new(),
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            api_url: default_api_url(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Restrict updates to these hostnames
    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    /// Set the sleep between passes
    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout_secs: u64) -> Self {
        self.request_timeout_secs = timeout_secs;
        self
    }

    /// Point the listing request at another endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.login.is_empty() {
            return Err(crate::Error::config("Login cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("Password cannot be empty"));
        }
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Update interval must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "API URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_url
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the password
impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("login", &self.login)
            .field("password", &"<REDACTED>")
            .field("hosts", &self.hosts)
            .field("interval_secs", &self.interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_url", &self.api_url)
            .field("event_channel_capacity", &self.event_channel_capacity)
            .finish()
    }
}

fn default_interval_secs() -> u64 {
    6 * 60 * 60
}

fn default_request_timeout_secs() -> u64 {
    2
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_event_channel_capacity() -> usize {
    100
}
