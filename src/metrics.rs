//! Metrics instrumentation for clusterset-dns.
//!
//! All metrics are prefixed with `clusterset_dns.`

use metrics::{counter, histogram, Counter};
use std::time::Instant;

/// Name of the authoritative request counter.
pub const REQUEST_COUNT: &str = "clusterset_dns.request.count";

/// Counts authoritative queries handled by one serving instance.
///
/// Created once at startup and shared by every query. Pass-through queries
/// are not counted.
#[derive(Clone)]
pub struct RequestCounter {
    counter: Counter,
}

impl RequestCounter {
    /// Register the counter with the installed recorder, labelled by `server`.
    pub fn new(server: impl Into<String>) -> Self {
        let server: String = server.into();
        Self {
            counter: counter!(REQUEST_COUNT, "server" => server),
        }
    }

    /// Wrap an existing counter handle.
    pub fn from_counter(counter: Counter) -> Self {
        Self { counter }
    }

    /// A counter that records nothing.
    pub fn noop() -> Self {
        Self {
            counter: Counter::noop(),
        }
    }

    /// Count one authoritative query.
    pub fn increment(&self) {
        self.counter.increment(1);
    }
}

impl std::fmt::Debug for RequestCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCounter").finish_non_exhaustive()
    }
}

/// Record an authoritative DNS query.
pub fn record_query(record_type: &str, result: QueryResult, duration: std::time::Duration) {
    let result_str = match result {
        QueryResult::Success => "success",
        QueryResult::NxDomain => "nxdomain",
        QueryResult::Unsupported => "unsupported",
        QueryResult::Error => "error",
    };

    counter!("clusterset_dns.query.count", "type" => record_type.to_string(), "result" => result_str)
        .increment(1);
    histogram!("clusterset_dns.query.duration.seconds", "type" => record_type.to_string())
        .record(duration.as_secs_f64());
}

/// Query result type for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResult {
    /// Query answered (possibly with zero records).
    Success,
    /// Name is not a valid clusterset service name.
    NxDomain,
    /// Record type not served; empty answer.
    Unsupported,
    /// Inventory lookup failed.
    Error,
}

/// Record how many inventory nodes matched a service.
pub fn record_endpoints_matched(count: usize) {
    histogram!("clusterset_dns.endpoints.matched").record(count as f64);
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
