//! Address record reconciler
//!
//! One call to [`Reconciler::reconcile`] is one cycle:
//!
//! ```text
//! ┌─────────────┐   resolve()   ┌──────────────┐   list()    ┌──────────────┐
//! │ IpResolver  │──────────────▶│  Reconciler  │◀────────────│ RecordStore  │
//! └─────────────┘               └──────────────┘             └──────────────┘
//!                                      │                            ▲
//!                                      │ delete(old) then create(new)
//!                                      └────────────────────────────┘
//! ```
//!
//! ## Decision
//!
//! The first address record for the hostname, in provider order, is the
//! match. No match creates; a match with the resolved IP does nothing; a
//! match with any other value is deleted and then recreated.
//!
//! Delete comes first because the provider refuses a second A record with a
//! different value for the same name. If the create then fails, the name
//! has no A record until a later cycle succeeds.

use std::fmt;
use std::net::IpAddr;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::traits::{DnsRecord, IpResolver, RecordStore};

/// Result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Record already pointed at the resolved IP
    NoOp {
        /// The current IP address
        ip: IpAddr,
    },
    /// A stale record was deleted and recreated
    Replaced {
        /// Value of the deleted record, as listed by the provider
        old_value: String,
        /// The new IP address
        new_ip: IpAddr,
    },
    /// No record existed and one was created
    Created {
        /// The created IP address
        new_ip: IpAddr,
    },
}

impl Outcome {
    /// Whether the cycle mutated provider state
    pub fn is_change(&self) -> bool {
        !matches!(self, Outcome::NoOp { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NoOp { ip } => write!(f, "unchanged ({ip})"),
            Outcome::Replaced { old_value, new_ip } => {
                write!(f, "replaced {old_value} with {new_ip}")
            }
            Outcome::Created { new_ip } => write!(f, "created {new_ip}"),
        }
    }
}

/// Desired state for one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    pub hostname: String,
    pub ip: IpAddr,
}

/// Action the reconciler decided on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Keep,
    Create,
    Replace { old_value: String },
}

impl DesiredRecord {
    /// Decide what to do given the provider's current records
    pub fn plan(&self, records: &[DnsRecord]) -> Plan {
        match records.iter().find(|r| r.matches(&self.hostname)) {
            None => Plan::Create,
            Some(existing) if existing.points_at(self.ip) => Plan::Keep,
            Some(existing) => Plan::Replace {
                old_value: existing.value.clone(),
            },
        }
    }
}

/// Converges one hostname's A record onto the host's public IP
pub struct Reconciler {
    /// Public IP lookup
    resolver: Box<dyn IpResolver>,

    /// DNS provider records
    store: Box<dyn RecordStore>,
}

impl Reconciler {
    /// Create a reconciler from its two collaborators
    pub fn new(resolver: Box<dyn IpResolver>, store: Box<dyn RecordStore>) -> Self {
        Self { resolver, store }
    }

    /// Run one reconciliation cycle for `hostname`
    ///
    /// # Errors
    ///
    /// - `Error::ResolveFailed`: the IP lookup failed; no provider calls made
    /// - `Error::ListFailed`: listing failed; no mutations made
    /// - `Error::DeleteFailed`: removing the stale record failed; create skipped
    /// - `Error::CreateFailed`: creating the record failed
    pub async fn reconcile(&self, hostname: &str) -> Result<Outcome> {
        let ip = self
            .resolver
            .resolve()
            .await
            .map_err(Error::resolve_failed)?;
        debug!("Resolved public IP {} via {}", ip, self.resolver.resolver_name());

        let desired = DesiredRecord {
            hostname: hostname.to_string(),
            ip,
        };

        let records = self.store.list().await.map_err(Error::list_failed)?;
        debug!(
            "Listed {} record(s) from {}",
            records.len(),
            self.store.provider_name()
        );

        match desired.plan(&records) {
            Plan::Keep => {
                info!("{} already points at {}", hostname, ip);
                Ok(Outcome::NoOp { ip })
            }
            Plan::Create => {
                info!("No A record for {}, creating -> {}", hostname, ip);
                self.create(&desired).await?;
                Ok(Outcome::Created { new_ip: ip })
            }
            Plan::Replace { old_value } => {
                info!("Replacing {} -> {} with {}", hostname, old_value, ip);
                self.store
                    .delete(hostname, &old_value)
                    .await
                    .map_err(|e| Error::delete_failed(hostname, old_value.as_str(), e))?;
                self.create(&desired).await?;
                Ok(Outcome::Replaced {
                    old_value,
                    new_ip: ip,
                })
            }
        }
    }

    async fn create(&self, desired: &DesiredRecord) -> Result<()> {
        self.store
            .create(&desired.hostname, desired.ip)
            .await
            .map_err(|e| Error::create_failed(&desired.hostname, desired.ip.to_string(), e))
    }

    /// Whether the underlying record store simulates mutations
    pub fn is_dry_run(&self) -> bool {
        self.store.is_dry_run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired(ip: &str) -> DesiredRecord {
        DesiredRecord {
            hostname: "h.example.com".to_string(),
            ip: ip.parse().unwrap(),
        }
    }

    #[test]
    fn plan_creates_when_no_address_record_matches() {
        let records = vec![
            DnsRecord::address("other.example.com", "1.2.3.4"),
            DnsRecord {
                record_type: "MX".to_string(),
                hostname: "h.example.com".to_string(),
                value: "10 mail.example.com".to_string(),
            },
        ];

        assert_eq!(desired("1.2.3.4").plan(&records), Plan::Create);
        assert_eq!(desired("1.2.3.4").plan(&[]), Plan::Create);
    }

    #[test]
    fn plan_keeps_matching_record() {
        let records = vec![DnsRecord::address("h.example.com", "1.2.3.4")];
        assert_eq!(desired("1.2.3.4").plan(&records), Plan::Keep);
    }

    #[test]
    fn plan_uses_first_match_in_provider_order() {
        let records = vec![
            DnsRecord::address("h.example.com", "9.9.9.9"),
            DnsRecord::address("h.example.com", "1.2.3.4"),
        ];

        assert_eq!(
            desired("1.2.3.4").plan(&records),
            Plan::Replace {
                old_value: "9.9.9.9".to_string()
            }
        );
    }

    #[test]
    fn outcome_display() {
        let outcome = Outcome::Replaced {
            old_value: "9.9.9.9".to_string(),
            new_ip: "1.2.3.4".parse().unwrap(),
        };
        assert_eq!(outcome.to_string(), "replaced 9.9.9.9 with 1.2.3.4");
        assert!(outcome.is_change());
    }
}
