//! Pending Registry - request id → handlers for requests still in flight.
//!
//! Owned by one `ConcurrentSender` and touched only on its owner context,
//! so it is a plain `HashMap` with `&mut self` methods.
//!
//! Flow:
//! 1. `send()` asks the engine for an id and calls `register()`
//! 2. The request is handed to the engine
//! 3. A terminal event calls `take()` (done/fail) or `remove()` (cancel)
//! 4. Teardown calls `drain()`

use crate::domain::handlers::Handlers;
use crate::error::SenderError;
use shared_types::RequestId;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::warn;

/// A request waiting for its terminal event.
struct PendingEntry {
    handlers: Handlers,
    /// Method name (for logging)
    method: &'static str,
    registered_at: Instant,
}

/// Entry removed by a done or fail event.
#[derive(Debug)]
pub struct CompletedEntry {
    pub handlers: Handlers,
    pub method: &'static str,
    /// Time between registration and the terminal event.
    pub elapsed: Duration,
}

/// Request id → handlers. An entry exists iff the request was submitted
/// and has not reached a terminal event.
#[derive(Default)]
pub struct PendingRegistry {
    entries: HashMap<RequestId, PendingEntry>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register handlers for a request about to be submitted.
    ///
    /// An id the engine reuses while still pending replaces the old entry;
    /// the old handlers are dropped without being invoked.
    pub fn register(&mut self, request_id: RequestId, method: &'static str, handlers: Handlers) {
        let entry = PendingEntry {
            handlers,
            method,
            registered_at: Instant::now(),
        };

        if let Some(previous) = self.entries.insert(request_id, entry) {
            warn!(
                request_id = %request_id,
                previous_method = previous.method,
                method = method,
                "Engine reused a request id that was still pending"
            );
        }
    }

    /// Remove the entry for a done or fail event.
    pub fn take(&mut self, request_id: RequestId) -> Result<CompletedEntry, SenderError> {
        let entry = self
            .entries
            .remove(&request_id)
            .ok_or(SenderError::UnknownRequestId(request_id))?;

        Ok(CompletedEntry {
            handlers: entry.handlers,
            method: entry.method,
            elapsed: entry.registered_at.elapsed(),
        })
    }

    /// Remove the entry for a cancellation, dropping its handlers uninvoked.
    ///
    /// Returns true if the request was pending.
    pub fn remove(&mut self, request_id: RequestId) -> bool {
        self.entries.remove(&request_id).is_some()
    }

    /// Remove every entry, dropping all handlers uninvoked.
    ///
    /// Returns the ids that were pending.
    pub fn drain(&mut self) -> Vec<RequestId> {
        self.entries.drain().map(|(request_id, _)| request_id).collect()
    }

    /// Check if a request is pending
    pub fn contains(&self, request_id: RequestId) -> bool {
        self.entries.contains_key(&request_id)
    }

    /// Get number of currently pending requests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
