// # Reconcile Observer
//
// Injected hook the scheduler calls after every cycle. It replaces a
// process-wide "last success" gauge: whatever exposes health information
// holds the same observer and reads through it.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::reconciler::Outcome;

/// Observer of reconciliation cycles
///
/// Called inline on the scheduler task, so implementations must be cheap
/// and must not block.
pub trait ReconcileObserver: Send + Sync {
    /// A cycle completed with `outcome` at time `at`
    fn on_success(&self, outcome: &Outcome, at: DateTime<Utc>);

    /// A cycle failed
    fn on_failure(&self, _error: &crate::Error) {}
}

/// Sentinel meaning "never succeeded"
const NEVER: i64 = i64::MIN;

/// Records the time of the last successful cycle
///
/// Writers store with `Release` and readers load with `Acquire`, so a
/// reader on another task sees a timestamp no older than the last
/// completed cycle that happened before its read.
#[derive(Debug)]
pub struct LastSuccess {
    epoch_secs: AtomicI64,
}

impl LastSuccess {
    /// Create a tracker that has not seen a success yet
    pub fn new() -> Self {
        Self {
            epoch_secs: AtomicI64::new(NEVER),
        }
    }

    /// Seconds since the Unix epoch of the last success, if any
    pub fn epoch_secs(&self) -> Option<i64> {
        match self.epoch_secs.load(Ordering::Acquire) {
            NEVER => None,
            secs => Some(secs),
        }
    }

    /// Time of the last success, if any
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.epoch_secs()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

impl Default for LastSuccess {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileObserver for LastSuccess {
    fn on_success(&self, _outcome: &Outcome, at: DateTime<Utc>) {
        self.epoch_secs.store(at.timestamp(), Ordering::Release);
    }
}
