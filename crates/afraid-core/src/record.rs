//! Dynamic DNS records and the working record set
//!
//! A [`DnsRecord`] is identified by its hostname alone. The IP address and
//! update URL ride along as mutable data and never take part in equality,
//! hashing or ordering, so a [`RecordSet`] deduplicates purely by hostname.

use crate::error::{Error, Result};
use crate::traits::HttpClient;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// Four dot-separated digit runs. Octet ranges are deliberately not checked.
static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]+(?:\.[0-9]+){3}").expect("IPv4 pattern is a valid regex")
});

/// Find the first IPv4-shaped substring in a response body
pub fn extract_ipv4(body: &str) -> Option<&str> {
    IPV4_PATTERN.find(body).map(|m| m.as_str())
}

/// One hostname registered to the account
#[derive(Debug, Clone)]
pub struct DnsRecord {
    hostname: String,
    ip: String,
    update_url: String,
}

/// What a successful refresh observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// The address held before the refresh
    pub previous_ip: String,
    /// The address reported by the provider
    pub ip: String,
}

impl RefreshOutcome {
    /// True when the provider reported a different address
    pub fn changed(&self) -> bool {
        self.previous_ip != self.ip
    }
}

impl DnsRecord {
    /// Create a record from its three listing fields
    pub fn new(
        hostname: impl Into<String>,
        ip: impl Into<String>,
        update_url: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            ip: ip.into(),
            update_url: update_url.into(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Last known address, in dotted-quad form
    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }

    /// Hit this record's update URL and adopt the address the provider reports
    ///
    /// The body is free-form text; the first IPv4-shaped substring wins.
    /// On any failure the stored address is left as it was.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] when the request itself fails
    /// - [`Error::UnparsableResponse`] when the body holds no address
    pub async fn refresh(
        &mut self,
        http: &dyn HttpClient,
        timeout: Duration,
    ) -> Result<RefreshOutcome> {
        let body = http.get(&self.update_url, &[], timeout).await?;

        let Some(ip) = extract_ipv4(&body) else {
            return Err(Error::unparsable("update", body));
        };

        debug!("{} reported address {}", self.hostname, ip);
        let previous_ip = std::mem::replace(&mut self.ip, ip.to_string());

        Ok(RefreshOutcome {
            previous_ip,
            ip: self.ip.clone(),
        })
    }
}

impl PartialEq for DnsRecord {
    fn eq(&self, other: &Self) -> bool {
        self.hostname == other.hostname
    }
}

impl Eq for DnsRecord {}

impl Hash for DnsRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hostname.hash(state);
    }
}

impl PartialOrd for DnsRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DnsRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hostname.cmp(&other.hostname)
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<DnsRecord: {}>", self.hostname)
    }
}

/// The working set of records, keyed by hostname
///
/// Iteration follows hostname order, so every pass visits records in the
/// same sequence.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: BTreeMap<String, DnsRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; returns `false` (and keeps the existing one) when the
    /// hostname is already present
    pub fn insert(&mut self, record: DnsRecord) -> bool {
        match self.records.entry(record.hostname.clone()) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.records.contains_key(hostname)
    }

    pub fn get(&self, hostname: &str) -> Option<&DnsRecord> {
        self.records.get(hostname)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DnsRecord> {
        self.records.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DnsRecord> {
        self.records.values_mut()
    }

    pub fn hostnames(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Narrow the set to the given hostnames
    ///
    /// An empty filter keeps every record. Returns the filter entries that
    /// matched no record, in the order given.
    pub fn retain_hosts(&mut self, hosts: &[String]) -> Vec<String> {
        if hosts.is_empty() {
            return Vec::new();
        }

        let unmatched = hosts
            .iter()
            .filter(|host| !self.records.contains_key(host.as_str()))
            .cloned()
            .collect();

        self.records
            .retain(|hostname, _| hosts.iter().any(|host| host == hostname));

        unmatched
    }
}

impl FromIterator<DnsRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = DnsRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a DnsRecord;
    type IntoIter = btree_map::Values<'a, String, DnsRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Replies to every request with a fixed outcome
    struct CannedHttp {
        reply: std::result::Result<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedHttp {
        fn body(body: &str) -> Self {
            Self {
                reply: Ok(body.to_string()),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for CannedHttp {
        async fn get(
            &self,
            url: &str,
            _query: &[(&str, &str)],
            _timeout: Duration,
        ) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.reply.clone().map_err(Error::http)
        }
    }

    fn record() -> DnsRecord {
        DnsRecord::new("localhost", "8.8.8.8", "http://update.me/?key=abc")
    }

    #[test]
    fn test_equality_uses_hostname_only() {
        let same_hostname = DnsRecord::new("localhost", "8.8.4.4", "http://other/");
        assert_eq!(record(), same_hostname);

        let other_hostname = DnsRecord::new("otherhost", "8.8.8.8", "http://update.me/?key=abc");
        assert_ne!(record(), other_hostname);
    }

    #[test]
    fn test_hash_uses_hostname_only() {
        let mut mapping = HashMap::new();
        mapping.insert(record(), "a record!");

        let lookup = DnsRecord::new("localhost", "1.1.1.1", "http://elsewhere/");
        assert_eq!(mapping.get(&lookup), Some(&"a record!"));

        let set: HashSet<_> = [record(), lookup].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(record().to_string(), "<DnsRecord: localhost>");
    }

    #[test]
    fn test_record_set_collapses_duplicates() {
        let set: RecordSet = [
            DnsRecord::new("a.com", "1.2.3.4", "http://u/1"),
            DnsRecord::new("a.com", "9.9.9.9", "http://u/9"),
            DnsRecord::new("b.com", "5.6.7.8", "http://u/2"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        // First occurrence wins
        assert_eq!(set.get("a.com").unwrap().ip(), "1.2.3.4");
        assert_eq!(set.hostnames().collect::<Vec<_>>(), vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_retain_hosts() {
        let mut set: RecordSet = ["a.com", "b.com", "c.com", "d.com", "e.com"]
            .iter()
            .enumerate()
            .map(|(i, host)| DnsRecord::new(*host, "10.0.0.1", format!("http://u/{i}")))
            .collect();

        let unmatched = set.retain_hosts(&["b.com".to_string(), "d.com".to_string()]);

        assert!(unmatched.is_empty());
        assert_eq!(set.hostnames().collect::<Vec<_>>(), vec!["b.com", "d.com"]);
    }

    #[test]
    fn test_retain_hosts_reports_unknown_and_empty_keeps_all() {
        let mut set: RecordSet = [DnsRecord::new("a.com", "1.2.3.4", "http://u/1")]
            .into_iter()
            .collect();

        assert!(set.retain_hosts(&[]).is_empty());
        assert_eq!(set.len(), 1);

        let unmatched = set.retain_hosts(&["a.com".to_string(), "ghost.net".to_string()]);
        assert_eq!(unmatched, vec!["ghost.net".to_string()]);
        assert!(set.contains("a.com"));
    }

    #[test]
    fn test_extract_ipv4() {
        assert_eq!(extract_ipv4("your ip is 203.0.113.7 now"), Some("203.0.113.7"));
        assert_eq!(extract_ipv4("Updated 1 host(s) to 10.0.0.1 and 10.0.0.2"), Some("10.0.0.1"));
        assert_eq!(extract_ipv4("no address here 1.2.3"), None);
        // Permissive: octet ranges are not validated
        assert_eq!(extract_ipv4("999.1.2.300"), Some("999.1.2.300"));
    }

    #[tokio::test]
    async fn test_refresh_adopts_reported_ip() {
        let http = CannedHttp::body("your ip is 203.0.113.7 now");
        let mut record = record();

        let outcome = record.refresh(&http, Duration::from_secs(2)).await.unwrap();

        assert_eq!(record.ip(), "203.0.113.7");
        assert_eq!(record.hostname(), "localhost");
        assert_eq!(record.update_url(), "http://update.me/?key=abc");
        assert_eq!(outcome.previous_ip, "8.8.8.8");
        assert!(outcome.changed());
        assert_eq!(
            *http.requested.lock().unwrap(),
            vec!["http://update.me/?key=abc".to_string()]
        );
    }

    #[tokio::test]
    async fn test_refresh_without_ip_is_unparsable() {
        let http = CannedHttp::body("ERROR: Invalid update URL");
        let mut record = record();

        let err = record.refresh(&http, Duration::from_secs(2)).await.unwrap_err();

        assert!(err.is_unparsable());
        assert_eq!(err.body(), Some("ERROR: Invalid update URL"));
        assert_eq!(record.ip(), "8.8.8.8");
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_keeps_ip() {
        let http = CannedHttp::failing("operation timed out");
        let mut record = record();

        let err = record.refresh(&http, Duration::from_secs(2)).await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(record.ip(), "8.8.8.8");
    }
}
