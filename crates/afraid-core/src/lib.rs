// # afraid-core
//
// Core library for the freedns.afraid.org dynamic DNS update agent.
//
// ## Architecture Overview
//
// - **derive_auth_key**: SHA-1 account key sent with the listing request
// - **fetch_records / parse_listing**: Account listing → set of DnsRecord
// - **DnsRecord**: One hostname; refreshes itself through its update URL
// - **UpdateScheduler**: Polls every record forever, swallowing per-record failures
// - **HttpClient**: Transport capability injected into both network call sites
//
// ## Control Flow
//
// 1. `load_records()` derives the key, fetches the listing, applies the host filter
// 2. `UpdateScheduler::run()` refreshes each record, sleeps, repeats

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod listing;
pub mod record;
pub mod startup;
pub mod traits;

// Re-export core types for convenience
pub use auth::derive_auth_key;
pub use config::AgentConfig;
pub use engine::{PassSummary, SchedulerEvent, SchedulerState, UpdateScheduler};
pub use error::{Error, Result};
pub use listing::{fetch_records, parse_listing};
pub use record::{DnsRecord, RecordSet, RefreshOutcome};
pub use startup::load_records;
pub use traits::HttpClient;
