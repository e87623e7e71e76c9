//! Metrics hooks for request lifecycle events
//!
//! Counts what happens to requests between `send()` and their terminal
//! event, plus the benign anomalies the sender resolves on its own
//! (unknown ids, undecodable responses).
//!
//! ## Usage
//!
//! ```ignore
//! use concurrent_sender::metrics::{MetricsRecorder, SenderMetrics};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(SenderMetrics::new());
//! let sender = ConcurrentSender::new(bridge, engine).with_metrics(metrics.clone());
//!
//! // ... later
//! let snapshot = metrics.snapshot();
//! println!("{} in flight", snapshot.in_flight());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collector for sender operations
///
/// Thread-safe counters; the sender itself only updates them from its
/// owner context, readers may snapshot from anywhere.
#[derive(Debug, Default)]
pub struct SenderMetrics {
    /// Requests handed to the engine
    pub sent: AtomicU64,
    /// Done events matched to a pending request
    pub completed: AtomicU64,
    /// Fail events matched to a pending request
    pub failed: AtomicU64,
    /// Pending requests cancelled by the caller
    pub cancelled: AtomicU64,
    /// Terminal events for ids with no pending entry
    pub unknown_ids: AtomicU64,
    /// Done events whose bytes did not decode
    pub decode_failures: AtomicU64,
    /// Pending requests cancelled because the sender was destroyed
    pub teardown_cancelled: AtomicU64,
    /// Cumulative time from registration to terminal event, in nanoseconds
    pub completion_time_ns: AtomicU64,
}

impl SenderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average time from registration to a matched done/fail event.
    pub fn avg_completion_time_ns(&self) -> u64 {
        let total = self.completion_time_ns.load(Ordering::Relaxed);
        let count = self.completed.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.sent.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.cancelled.store(0, Ordering::Relaxed);
        self.unknown_ids.store(0, Ordering::Relaxed);
        self.decode_failures.store(0, Ordering::Relaxed);
        self.teardown_cancelled.store(0, Ordering::Relaxed);
        self.completion_time_ns.store(0, Ordering::Relaxed);
    }

    fn add_latency(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.completion_time_ns.fetch_add(nanos, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub sent: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub unknown_ids: u64,
    pub decode_failures: u64,
    pub teardown_cancelled: u64,
    pub avg_completion_ns: u64,
}

impl MetricsSnapshot {
    /// Requests sent but not yet accounted for by any terminal event.
    pub fn in_flight(&self) -> u64 {
        self.sent.saturating_sub(
            self.completed + self.failed + self.cancelled + self.teardown_cancelled,
        )
    }
}

/// Trait for custom metrics recording implementations
///
/// Implement this to forward sender events to an external metrics system.
pub trait MetricsRecorder: Send + Sync {
    /// A request was registered and submitted.
    fn record_sent(&self);

    /// A done event matched a pending request.
    ///
    /// Counted even when the response then fails to decode.
    fn record_completed(&self, elapsed: Duration);

    /// A fail event matched a pending request.
    fn record_failed(&self, elapsed: Duration);

    /// A pending request was cancelled.
    fn record_cancelled(&self);

    /// A terminal event arrived for an id with no pending entry.
    fn record_unknown_id(&self);

    /// Response bytes did not decode into the declared type.
    fn record_decode_failure(&self);

    /// Pending requests cancelled by teardown.
    fn record_teardown(&self, cancelled: usize);

    /// Current counter values.
    fn snapshot(&self) -> MetricsSnapshot;
}

impl MetricsRecorder for SenderMetrics {
    fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    fn record_completed(&self, elapsed: Duration) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.add_latency(elapsed);
    }

    fn record_failed(&self, elapsed: Duration) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.add_latency(elapsed);
    }

    fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    fn record_unknown_id(&self) {
        self.unknown_ids.fetch_add(1, Ordering::Relaxed);
    }

    fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_teardown(&self, cancelled: usize) {
        self.teardown_cancelled
            .fetch_add(cancelled as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            unknown_ids: self.unknown_ids.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            teardown_cancelled: self.teardown_cancelled.load(Ordering::Relaxed),
            avg_completion_ns: self.avg_completion_time_ns(),
        }
    }
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Debug, Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_sent(&self) {}
    fn record_completed(&self, _elapsed: Duration) {}
    fn record_failed(&self, _elapsed: Duration) {}
    fn record_cancelled(&self) {}
    fn record_unknown_id(&self) {}
    fn record_decode_failure(&self) {}
    fn record_teardown(&self, _cancelled: usize) {}

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}
