//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles record every call so tests can assert on exact ordering,
//! and keep their state behind `Arc` so a test can hold a clone while the
//! reconciler owns the boxed original.

#![allow(dead_code)]

use dreamdns_core::error::{Error, Result};
use dreamdns_core::traits::{DnsRecord, IpResolver, RecordStore};
use dreamdns_core::Reconciler;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOST: &str = "h.example.com";

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid test address")
}

/// What the fake resolver answers with
#[derive(Debug, Clone)]
pub enum Answer {
    Ip(IpAddr),
    Invalid(String),
    Unreachable,
}

/// An IpResolver whose answer can be changed between cycles
#[derive(Clone)]
pub struct FakeResolver {
    answer: Arc<Mutex<Answer>>,
    call_count: Arc<AtomicUsize>,
}

impl FakeResolver {
    pub fn new(answer: Answer) -> Self {
        Self {
            answer: Arc::new(Mutex::new(answer)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fixed(addr: &str) -> Self {
        Self::new(Answer::Ip(ip(addr)))
    }

    pub fn set(&self, answer: Answer) {
        *self.answer.lock().unwrap() = answer;
    }

    /// Get the number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for FakeResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.answer.lock().unwrap().clone() {
            Answer::Ip(addr) => Ok(addr),
            Answer::Invalid(text) => Err(Error::invalid_address(text)),
            Answer::Unreachable => Err(Error::unreachable("connection refused")),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "fake"
    }
}

/// A recorded RecordStore call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Delete(String, String),
    Create(String, IpAddr),
}

/// An in-memory RecordStore that applies mutations and records calls
#[derive(Clone)]
pub struct FakeStore {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    /// Number of upcoming list() calls that fail
    list_failures: Arc<AtomicUsize>,
    fail_delete: Arc<AtomicBool>,
    fail_create: Arc<AtomicBool>,
    /// Artificial latency for list(), to widen overlap windows
    list_delay: Arc<Mutex<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeStore {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            calls: Arc::new(Mutex::new(Vec::new())),
            list_failures: Arc::new(AtomicUsize::new(0)),
            fail_delete: Arc::new(AtomicBool::new(false)),
            fail_create: Arc::new(AtomicBool::new(false)),
            list_delay: Arc::new(Mutex::new(Duration::ZERO)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_a(value: &str) -> Self {
        Self::new(vec![DnsRecord::address(HOST, value)])
    }

    pub fn fail_next_lists(&self, n: usize) {
        self.list_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than list()
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| *c != Call::List)
            .collect()
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl RecordStore for FakeStore {
    async fn list(&self) -> Result<Vec<DnsRecord>> {
        self.record(Call::List);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = self
            .list_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::provider("error", "Invalid API key"));
        }

        Ok(self.records())
    }

    async fn create(&self, hostname: &str, value: IpAddr) -> Result<()> {
        self.record(Call::Create(hostname.to_string(), value));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::http("connection reset"));
        }
        self.records
            .lock()
            .unwrap()
            .push(DnsRecord::address(hostname, value.to_string()));
        Ok(())
    }

    async fn delete(&self, hostname: &str, value: &str) -> Result<()> {
        self.record(Call::Delete(hostname.to_string(), value.to_string()));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::provider("no_such_record", "no_such_record"));
        }
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !(r.matches(hostname) && r.value == value));
        if records.len() == before {
            return Err(Error::provider("no_such_record", "no_such_record"));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Build a reconciler around clones of the doubles
pub fn reconciler(resolver: &FakeResolver, store: &FakeStore) -> Reconciler {
    Reconciler::new(Box::new(resolver.clone()), Box::new(store.clone()))
}
