//! Error types for the update agent
//!
//! Two kinds matter at runtime: transport failures ([`Error::Http`]) and
//! responses the agent could not make sense of ([`Error::UnparsableResponse`]).
//! Whether either is fatal depends on where it happens, not on the kind:
//! the scheduler swallows both per record, the startup phase lets both escape.

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the update agent
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP call could not complete (connect, timeout, error status)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body did not have the expected shape
    #[error("Couldn't parse the server's {context} response: {body:?}")]
    UnparsableResponse {
        /// Which exchange produced the body ("listing", "update")
        context: &'static str,
        /// The raw body as received
        body: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an HTTP (transport) error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an unparsable-response error carrying the raw body
    pub fn unparsable(context: &'static str, body: impl Into<String>) -> Self {
        Self::UnparsableResponse {
            context,
            body: body.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures of the underlying HTTP exchange
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// True for the API error kind (body did not match the expected shape)
    pub fn is_unparsable(&self) -> bool {
        matches!(self, Self::UnparsableResponse { .. })
    }

    /// The raw response body, for unparsable-response errors
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::UnparsableResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_keeps_raw_body() {
        let err = Error::unparsable("update", "<html>maintenance</html>");
        assert!(err.is_unparsable());
        assert!(!err.is_transport());
        assert_eq!(err.body(), Some("<html>maintenance</html>"));
        assert!(err.to_string().contains("update"));
    }

    #[test]
    fn transport_has_no_body() {
        let err = Error::http("connection refused");
        assert!(err.is_transport());
        assert_eq!(err.body(), None);
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn config_error_is_neither_transport_nor_unparsable() {
        let err = Error::config("No records to update");
        assert!(!err.is_transport());
        assert!(!err.is_unparsable());
        assert_eq!(err.to_string(), "Configuration error: No records to update");
    }
}
