//! Account listing
//!
//! The bulk endpoint answers `action=getdyndns` with one record per line:
//!
//! ```text
//! my.hostname.com|203.0.113.7|http://freedns.afraid.org/dynamic/update.php?XXXX
//! another.host.io|203.0.113.9|http://freedns.afraid.org/dynamic/update.php?YYYY
//! ```

use crate::auth::derive_auth_key;
use crate::error::{Error, Result};
use crate::record::{DnsRecord, RecordSet};
use crate::traits::HttpClient;
use std::time::Duration;
use tracing::debug;

/// Default bulk API endpoint
pub const DEFAULT_API_URL: &str = "http://freedns.afraid.org/api/";

/// `action` value that requests the dynamic DNS listing
pub const LISTING_ACTION: &str = "getdyndns";

const FIELD_SEPARATOR: char = '|';

/// Parse a listing body into a record set
///
/// All or nothing: a single line without exactly three fields fails the
/// whole listing. An empty body is a valid, empty listing.
pub fn parse_listing(body: &str) -> Result<RecordSet> {
    let mut records = RecordSet::new();

    for line in body.split_whitespace() {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let [hostname, ip, update_url] = fields[..] else {
            return Err(Error::unparsable("listing", body));
        };

        if !records.insert(DnsRecord::new(hostname, ip, update_url)) {
            debug!("Duplicate listing entry for {}, keeping the first", hostname);
        }
    }

    Ok(records)
}

/// Fetch and parse the account's records
///
/// Issues exactly one GET to `api_url`.
pub async fn fetch_records(
    http: &dyn HttpClient,
    api_url: &str,
    login: &str,
    password: &str,
    timeout: Duration,
) -> Result<RecordSet> {
    let auth_key = derive_auth_key(login, password);
    let query = [("action", LISTING_ACTION), ("sha", auth_key.as_str())];

    let body = http.get(api_url, &query, timeout).await?;
    parse_listing(&body)
}
