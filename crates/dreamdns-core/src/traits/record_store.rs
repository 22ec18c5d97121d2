// # Record Store Trait
//
// Defines the interface for listing and mutating address records held by a
// DNS provider.
//
// ## Implementations
//
// - DreamHost API: `dreamdns-provider-dreamhost` crate
//
// ## Usage
//
// ```rust,ignore
// use dreamdns_core::RecordStore;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     for record in store.list().await? {
//         println!("{} {} {}", record.record_type, record.hostname, record.value);
//     }
//
//     store.delete("home.example.com", "9.9.9.9").await?;
//     store.create("home.example.com", "1.2.3.4".parse()?).await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Record type string used by providers for address records
pub const ADDRESS_RECORD_TYPE: &str = "A";

/// A DNS record as listed by the provider
///
/// Providers list every record on the account, so `record_type` is kept
/// as the raw provider string. Only records for which
/// [`is_address`](Self::is_address) holds take part in reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Record type as reported by the provider ("A", "CNAME", "MX", ...)
    #[serde(rename = "type")]
    pub record_type: String,

    /// Fully qualified hostname of the record
    #[serde(rename = "record")]
    pub hostname: String,

    /// Record value; an IP address string for address records
    pub value: String,
}

impl DnsRecord {
    /// Create an address record
    pub fn address(hostname: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            record_type: ADDRESS_RECORD_TYPE.to_string(),
            hostname: hostname.into(),
            value: value.into(),
        }
    }

    /// Whether this is an address ("A") record
    pub fn is_address(&self) -> bool {
        self.record_type == ADDRESS_RECORD_TYPE
    }

    /// Whether this is the address record for `hostname`
    ///
    /// Hostnames compare case-insensitively.
    pub fn matches(&self, hostname: &str) -> bool {
        self.is_address() && self.hostname.eq_ignore_ascii_case(hostname)
    }

    /// Whether the record value denotes `ip`
    ///
    /// Values that do not parse as an address never match.
    pub fn points_at(&self, ip: IpAddr) -> bool {
        self.value.trim().parse::<IpAddr>().is_ok_and(|v| v == ip)
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.record_type, self.hostname, self.value)
    }
}

/// Trait for DNS provider record stores
///
/// Every method performs one provider request. Implementations must not
/// retry, cache the record list, or decide whether a mutation is needed;
/// those belong to the [`Reconciler`](crate::Reconciler) and
/// [`Scheduler`](crate::Scheduler).
///
/// # Dry-Run
///
/// In dry-run mode `create` and `delete` log the request they would have
/// sent and return `Ok(())` without touching the network. `list` always
/// executes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List every record on the account, in provider order
    ///
    /// # Errors
    ///
    /// - `Error::Provider` if the provider reports failure
    /// - `Error::Protocol` if the response does not have the expected shape
    /// - `Error::Http` on transport failure
    async fn list(&self) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create an address record `hostname -> value`
    ///
    /// Succeeds if the provider reports the record already exists with
    /// this exact value.
    async fn create(&self, hostname: &str, value: IpAddr) -> Result<(), crate::Error>;

    /// Remove the address record `hostname -> value`
    ///
    /// Fails with `Error::Provider` if the provider has no such record.
    async fn delete(&self, hostname: &str, value: &str) -> Result<(), crate::Error>;

    /// Whether mutations are simulated
    fn is_dry_run(&self) -> bool {
        false
    }

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
