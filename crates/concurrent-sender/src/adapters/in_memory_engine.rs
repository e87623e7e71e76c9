//! # In-Memory Engine
//!
//! A scripted `RpcEngine` with no network behind it. Submissions are
//! recorded; the test or host code decides when each request completes by
//! calling `respond` or `fail`, from any thread.
//!
//! What it models:
//! - ids allocated monotonically from 1, skipping 0 on wraparound
//! - held dispatch: while `hold_dispatch(true)` is in effect, new
//!   submissions stay off the wire until `release`d
//! - `after` ordering: a request only goes on the wire once its predecessor
//!   is no longer waiting (dispatched, finished, cancelled or unknown)
//! - fail-skip policies: injected failures the request's policy absorbs are
//!   recorded and not reported
//! - late delivery: responding to a cancelled or finished request still
//!   calls the completion sink, the way a real engine can race a cancel

use crate::ports::inbound::CompletionSink;
use crate::ports::outbound::{RpcEngine, Submission};
use bytes::Bytes;
use parking_lot::Mutex;
use shared_types::{FailSkipPolicy, RequestId, RoutingKey, RpcError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What the engine saw for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRequest {
    pub request_id: RequestId,
    pub method: &'static str,
    pub body: Bytes,
    pub route: RoutingKey,
    pub wait_budget: Duration,
    pub fail_skip: FailSkipPolicy,
    pub after: Option<RequestId>,
}

/// Outcome of `respond` / `fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Reported to the completion sink; the request is now finished.
    Delivered,
    /// Swallowed under the request's fail-skip policy; still in flight.
    Absorbed,
    /// Reported although the request was already cancelled or finished.
    Late,
    /// The engine never saw this id.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    /// Off the wire: held, or waiting for its `after` predecessor.
    Deferred,
    Dispatched,
    Cancelled,
    Finished,
}

struct Tracked {
    record: SubmittedRequest,
    reply: Arc<dyn CompletionSink>,
    state: RequestState,
    held: bool,
}

#[derive(Default)]
struct EngineState {
    requests: HashMap<RequestId, Tracked>,
    submitted: Vec<RequestId>,
    wire: Vec<RequestId>,
    cancelled: Vec<RequestId>,
    absorbed: Vec<(RequestId, RpcError)>,
    holding: bool,
}

impl EngineState {
    /// Whether `after` still holds back its dependents.
    fn blocks(&self, after: RequestId) -> bool {
        self.requests
            .get(&after)
            .is_some_and(|tracked| tracked.state == RequestState::Deferred)
    }

    fn ready(&self, request_id: RequestId) -> bool {
        self.requests.get(&request_id).is_some_and(|tracked| {
            tracked.state == RequestState::Deferred
                && !tracked.held
                && !tracked.record.after.is_some_and(|after| self.blocks(after))
        })
    }

    /// Put every ready request from `candidates` on the wire, then whatever
    /// waited on them.
    ///
    /// `candidates` is a stack: the last element is tried first.
    fn pump(&mut self, mut candidates: Vec<RequestId>) {
        while let Some(next) = candidates.pop() {
            if !self.ready(next) {
                continue;
            }
            if let Some(tracked) = self.requests.get_mut(&next) {
                tracked.state = RequestState::Dispatched;
            }
            self.wire.push(next);
            debug!(request_id = %next, "Dispatched");
            candidates.extend(self.dependents(next));
        }
    }

    /// Deferred requests waiting on `request_id`.
    ///
    /// Returned reversed so that popping yields submission order.
    fn dependents(&self, request_id: RequestId) -> Vec<RequestId> {
        let mut dependents: Vec<RequestId> = self
            .submitted
            .iter()
            .copied()
            .filter(|id| {
                self.requests.get(id).is_some_and(|tracked| {
                    tracked.state == RequestState::Deferred && tracked.record.after == Some(request_id)
                })
            })
            .collect();
        dependents.reverse();
        dependents
    }
}

/// Scripted protocol engine.
pub struct InMemoryEngine {
    next_id: AtomicU32,
    state: Mutex<EngineState>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Engine whose first allocated id is `first` (0 is never allocated).
    pub fn starting_at(first: u32) -> Self {
        Self {
            next_id: AtomicU32::new(first),
            state: Mutex::new(EngineState::default()),
        }
    }

    /// While `hold` is set, new submissions stay off the wire until
    /// `release` is called for them. Requests already submitted are not
    /// affected.
    pub fn hold_dispatch(&self, hold: bool) {
        self.state.lock().holding = hold;
    }

    /// Let a held request go on the wire.
    ///
    /// It is dispatched at once unless its own `after` predecessor is still
    /// waiting, in which case it follows that predecessor. Returns `false`
    /// if the request was not held or already finished or cancelled.
    pub fn release(&self, request_id: RequestId) -> bool {
        let mut state = self.state.lock();
        let Some(tracked) = state.requests.get_mut(&request_id) else {
            return false;
        };
        if !tracked.held || tracked.state != RequestState::Deferred {
            return false;
        }
        tracked.held = false;
        state.pump(vec![request_id]);
        true
    }

    /// Complete a request with raw result bytes.
    pub fn respond(&self, request_id: RequestId, result: impl Into<Bytes>) -> Delivery {
        let Some((reply, delivery)) = self.finish(request_id, None) else {
            debug!(request_id = %request_id, "Response for unknown request");
            return Delivery::Unknown;
        };
        reply.done(request_id, result.into());
        delivery
    }

    /// Fail a request, unless its fail-skip policy absorbs the error.
    pub fn fail(&self, request_id: RequestId, error: RpcError) -> Delivery {
        let Some((reply, delivery)) = self.finish(request_id, Some(&error)) else {
            debug!(request_id = %request_id, "Failure for unknown request");
            return Delivery::Unknown;
        };
        if delivery == Delivery::Absorbed {
            return delivery;
        }
        reply.fail(request_id, error);
        delivery
    }

    /// Mark a request finished and return its sink.
    ///
    /// Finishing a request that never reached the wire releases its
    /// dependents. The lock is released before the sink is called.
    fn finish(
        &self,
        request_id: RequestId,
        error: Option<&RpcError>,
    ) -> Option<(Arc<dyn CompletionSink>, Delivery)> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let tracked = state.requests.get_mut(&request_id)?;
        let reply = tracked.reply.clone();

        let delivery = match tracked.state {
            RequestState::Cancelled | RequestState::Finished => Delivery::Late,
            RequestState::Deferred | RequestState::Dispatched => {
                let policy = tracked.record.fail_skip;
                if let Some(error) = error.filter(|error| policy.absorbs(error)) {
                    debug!(
                        request_id = %request_id,
                        kind = %error.kind,
                        policy = ?policy,
                        "Absorbed failure under fail-skip policy"
                    );
                    state.absorbed.push((request_id, error.clone()));
                    return Some((reply, Delivery::Absorbed));
                }
                let was_deferred = tracked.state == RequestState::Deferred;
                tracked.state = RequestState::Finished;
                if was_deferred {
                    let dependents = state.dependents(request_id);
                    state.pump(dependents);
                }
                Delivery::Delivered
            }
        };

        Some((reply, delivery))
    }

    /// Every submission, in submission order.
    pub fn submissions(&self) -> Vec<SubmittedRequest> {
        let state = self.state.lock();
        state
            .submitted
            .iter()
            .filter_map(|id| state.requests.get(id))
            .map(|tracked| tracked.record.clone())
            .collect()
    }

    /// The submission recorded for `request_id`.
    pub fn submission(&self, request_id: RequestId) -> Option<SubmittedRequest> {
        self.state
            .lock()
            .requests
            .get(&request_id)
            .map(|tracked| tracked.record.clone())
    }

    /// Order in which requests were put on the wire.
    pub fn wire_order(&self) -> Vec<RequestId> {
        self.state.lock().wire.clone()
    }

    /// Requests not yet on the wire, held or waiting on a predecessor.
    pub fn deferred(&self) -> Vec<RequestId> {
        let state = self.state.lock();
        state
            .submitted
            .iter()
            .copied()
            .filter(|id| {
                state
                    .requests
                    .get(id)
                    .is_some_and(|tracked| tracked.state == RequestState::Deferred)
            })
            .collect()
    }

    /// Ids passed to `cancel`, including unknown ones, in call order.
    pub fn cancelled(&self) -> Vec<RequestId> {
        self.state.lock().cancelled.clone()
    }

    /// Failures swallowed by fail-skip policies.
    pub fn absorbed(&self) -> Vec<(RequestId, RpcError)> {
        self.state.lock().absorbed.clone()
    }

    /// Requests neither finished nor cancelled.
    pub fn in_flight_count(&self) -> usize {
        self.state
            .lock()
            .requests
            .values()
            .filter(|tracked| {
                matches!(tracked.state, RequestState::Deferred | RequestState::Dispatched)
            })
            .count()
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcEngine for InMemoryEngine {
    /// Ids wrap around after `u32::MAX`; 0 is skipped.
    fn allocate_id(&self) -> RequestId {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return RequestId(id);
            }
            warn!("Request id counter wrapped around");
        }
    }

    fn submit(&self, submission: Submission) {
        let Submission {
            request_id,
            payload,
            route,
            wait_budget,
            fail_skip,
            after,
            reply,
        } = submission;

        let record = SubmittedRequest {
            request_id,
            method: payload.method,
            body: payload.body,
            route,
            wait_budget,
            fail_skip,
            after,
        };

        let mut state = self.state.lock();
        let held = state.holding;
        state.requests.insert(
            request_id,
            Tracked {
                record,
                reply,
                state: RequestState::Deferred,
                held,
            },
        );
        state.submitted.push(request_id);
        state.pump(vec![request_id]);

        if state.blocks(request_id) {
            debug!(request_id = %request_id, route = %route, held, after = ?after, "Deferred");
        }
    }

    fn cancel(&self, request_id: RequestId) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.cancelled.push(request_id);

        let Some(tracked) = state.requests.get_mut(&request_id) else {
            return;
        };
        let was_deferred = tracked.state == RequestState::Deferred;
        if matches!(tracked.state, RequestState::Deferred | RequestState::Dispatched) {
            tracked.state = RequestState::Cancelled;
        }

        // A cancelled predecessor will never reach the wire; release its dependents.
        if was_deferred {
            let dependents = state.dependents(request_id);
            state.pump(dependents);
        }
        debug!(request_id = %request_id, "Cancelled");
    }
}
