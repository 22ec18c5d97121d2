//! Cycle scheduler
//!
//! Runs the [`Reconciler`] once, or once and then on every tick of a
//! fixed-period source, until the tick source ends or shutdown is signalled.
//!
//! ## Retry
//!
//! There is no backoff and no jitter. A failed cycle is retried by the next
//! tick. Whether the very first cycle may fail without ending the run is
//! controlled by [`RetryPolicy::fail_fast`].
//!
//! ## Overlap
//!
//! Each cycle runs inline on the scheduler task before the next tick is
//! awaited, so cycles never overlap. Ticks that fall due during a long cycle
//! are delayed, not queued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::reconciler::{Outcome, Reconciler};
use crate::traits::ReconcileObserver;

/// Retry policy for the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Period between cycles; `None` runs a single cycle
    pub interval: Option<Duration>,

    /// Whether a failure of the first cycle ends the run
    pub fail_fast: bool,
}

impl RetryPolicy {
    /// Run once; any error is fatal
    pub fn single_shot() -> Self {
        Self {
            interval: None,
            fail_fast: true,
        }
    }

    /// Run every `period`, failing fast on the first cycle
    ///
    /// A zero period means single-shot.
    pub fn every(period: Duration) -> Self {
        Self {
            interval: (!period.is_zero()).then_some(period),
            fail_fast: true,
        }
    }

    /// Set whether a first-cycle failure is fatal
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Whether this policy runs a single cycle
    pub fn is_single_shot(&self) -> bool {
        self.interval.is_none()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_shot()
    }
}

/// Counters returned when a run ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles run, including the first
    pub cycles: u64,
    /// Cycles that returned an error
    pub failures: u64,
    /// Cycles that created or replaced the record
    pub changes: u64,
}

/// Runs reconciliation cycles for one hostname
pub struct Scheduler {
    reconciler: Reconciler,
    hostname: String,
    policy: RetryPolicy,
    observers: Vec<Arc<dyn ReconcileObserver>>,
}

impl Scheduler {
    /// Create a scheduler
    pub fn new(reconciler: Reconciler, hostname: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            reconciler,
            hostname: hostname.into(),
            policy,
            observers: Vec::new(),
        }
    }

    /// Attach an observer notified after every cycle
    pub fn with_observer(mut self, observer: Arc<dyn ReconcileObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The policy this scheduler runs with
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run one cycle and notify observers
    pub async fn run_cycle(&self) -> Result<Outcome> {
        let result = self.reconciler.reconcile(&self.hostname).await;

        match &result {
            Ok(outcome) => {
                let now = Utc::now();
                for observer in &self.observers {
                    observer.on_success(outcome, now);
                }
            }
            Err(e) => {
                for observer in &self.observers {
                    observer.on_failure(e);
                }
            }
        }

        result
    }

    /// Run according to the policy
    ///
    /// The first cycle runs immediately. In single-shot mode its result is
    /// the run's result. In interval mode a cycle runs for every item
    /// `ticks` yields; errors are logged and the loop continues. The run
    /// ends when `ticks` ends or `shutdown` completes, whichever is first.
    ///
    /// # Errors
    ///
    /// Returns the first cycle's error in single-shot mode, or in interval
    /// mode when [`RetryPolicy::fail_fast`] is set. Later errors never end
    /// the run.
    pub async fn run<T, F>(&self, ticks: T, shutdown: F) -> Result<RunSummary>
    where
        T: Stream<Item = ()> + Unpin,
        F: Future<Output = ()>,
    {
        let mut ticks = ticks;
        let mut summary = RunSummary::default();

        summary.cycles += 1;
        match self.run_cycle().await {
            Ok(outcome) => {
                info!("Reconciled {}: {}", self.hostname, outcome);
                if outcome.is_change() {
                    summary.changes += 1;
                }
            }
            Err(e) if self.policy.is_single_shot() || self.policy.fail_fast => {
                error!("Reconciling {} failed: {}", self.hostname, e);
                return Err(e);
            }
            Err(e) => {
                summary.failures += 1;
                warn!("Reconciling {} failed, will retry: {}", self.hostname, e);
            }
        }

        let Some(period) = self.policy.interval else {
            return Ok(summary);
        };

        info!(
            "Reconciling {} every {:?}{}",
            self.hostname,
            period,
            if self.reconciler.is_dry_run() { " [DRY-RUN]" } else { "" }
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                tick = ticks.next() => {
                    if tick.is_none() {
                        info!("Tick source ended");
                        break;
                    }

                    summary.cycles += 1;
                    match self.run_cycle().await {
                        Ok(outcome) => {
                            info!("Reconciled {}: {}", self.hostname, outcome);
                            if outcome.is_change() {
                                summary.changes += 1;
                            }
                        }
                        Err(e) => {
                            // Continue running despite errors
                            summary.failures += 1;
                            warn!("Reconciling {} failed, will retry: {}", self.hostname, e);
                        }
                    }
                }
            }
        }

        Ok(summary)
    }
}

/// Fixed-period tick source
///
/// The first tick fires one `period` from now, since the scheduler runs the
/// first cycle itself. Ticks missed during a slow cycle are delayed.
pub fn interval_ticks(period: Duration) -> impl Stream<Item = ()> + Unpin + Send {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    IntervalStream::new(interval).map(|_| ())
}
