//! Core traits for the dreamdns updater
//!
//! - [`IpResolver`]: Discover the host's public IP address
//! - [`RecordStore`]: List, create, and delete records at the DNS provider
//! - [`ReconcileObserver`]: Hear about completed and failed cycles

pub mod ip_resolver;
pub mod observer;
pub mod record_store;

pub use ip_resolver::IpResolver;
pub use observer::{LastSuccess, ReconcileObserver};
pub use record_store::{ADDRESS_RECORD_TYPE, DnsRecord, RecordStore};
