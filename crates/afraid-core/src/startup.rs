//! One-time startup phase
//!
//! Everything here runs before the scheduler exists. Failures propagate
//! untouched: without a record set there is nothing to update.

use crate::config::AgentConfig;
use crate::error::Result;
use crate::listing::fetch_records;
use crate::record::RecordSet;
use crate::traits::HttpClient;
use tracing::{info, warn};

/// Fetch the account listing and apply the host filter once
pub async fn load_records(http: &dyn HttpClient, config: &AgentConfig) -> Result<RecordSet> {
    let mut records = fetch_records(
        http,
        &config.api_url,
        &config.login,
        &config.password,
        config.request_timeout(),
    )
    .await?;
    info!("Account lists {} record(s)", records.len());

    for host in records.retain_hosts(&config.hosts) {
        warn!("Requested host {} is not registered to this account", host);
    }

    for record in &records {
        info!("Managing record: {} ({})", record.hostname(), record.ip());
    }

    Ok(records)
}
