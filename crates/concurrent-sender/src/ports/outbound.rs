//! Outbound Ports (Driven Ports)
//!
//! What the sender needs from the protocol engine. Connection management,
//! datacenter routing, retries and flood control all live behind this trait.

use crate::ports::inbound::CompletionSink;
use shared_types::{FailSkipPolicy, RequestId, RequestPayload, RoutingKey};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A finalized request handed to the engine.
pub struct Submission {
    /// Id obtained from `RpcEngine::allocate_id` for this request.
    pub request_id: RequestId,
    pub payload: RequestPayload,
    pub route: RoutingKey,
    /// How long the engine may delay the request to batch it with others.
    pub wait_budget: Duration,
    pub fail_skip: FailSkipPolicy,
    /// The engine must not put this request on the wire before `after`.
    pub after: Option<RequestId>,
    /// Where to report the outcome.
    pub reply: Arc<dyn CompletionSink>,
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("request_id", &self.request_id)
            .field("method", &self.payload.method)
            .field("bytes", &self.payload.len())
            .field("route", &self.route)
            .field("wait_budget", &self.wait_budget)
            .field("fail_skip", &self.fail_skip)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

/// Protocol engine (Driven Port).
///
/// All methods are synchronous and must not block on network I/O. They are
/// called from the sender's owner context; the engine reports outcomes
/// later, from whatever thread it likes, through `Submission::reply`.
pub trait RpcEngine: Send + Sync {
    /// Reserve the id for the next submission.
    ///
    /// Split from `submit` so the sender can register handlers under the
    /// id before the engine can possibly answer.
    fn allocate_id(&self) -> RequestId;

    /// Queue a request for dispatch.
    fn submit(&self, submission: Submission);

    /// Abort a request, best-effort. Unknown or finished ids are ignored.
    fn cancel(&self, request_id: RequestId);
}
