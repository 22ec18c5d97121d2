// # dreamdns-core
//
// Core library for keeping one DNS A record pointed at the host's public IP.
//
// ## Architecture Overview
//
// - **IpResolver**: Trait for discovering the current public IP
// - **RecordStore**: Trait for listing, creating, and deleting provider records
// - **Reconciler**: One cycle: resolve, list, then delete/create as needed
// - **Scheduler**: Runs cycles once or on a fixed interval
// - **ReconcileObserver**: Injected hook for cycle results (e.g. `LastSuccess`)
//
// ## Design Principles
//
// 1. **Provider is the source of truth**: records are re-listed every cycle,
//    nothing is persisted locally
// 2. **Clients are single-shot**: retry belongs to the scheduler, which
//    simply runs the next cycle
// 3. **Library-First**: the binary only parses input and wires components

pub mod config;
pub mod error;
pub mod reconciler;
pub mod scheduler;
pub mod traits;

// Re-export core types for convenience
pub use config::{IpLookupConfig, ProviderConfig, UpdaterConfig};
pub use error::{Error, Result};
pub use reconciler::{Outcome, Reconciler};
pub use scheduler::{RetryPolicy, RunSummary, Scheduler, interval_ticks};
pub use traits::{DnsRecord, IpResolver, LastSuccess, ReconcileObserver, RecordStore};
