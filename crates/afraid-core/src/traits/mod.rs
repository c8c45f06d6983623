//! Core traits for the update agent
//!
//! - [`HttpClient`]: Issue the GET requests the agent depends on

pub mod http_client;

pub use http_client::HttpClient;
