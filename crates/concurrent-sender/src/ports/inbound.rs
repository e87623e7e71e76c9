//! Inbound Ports (Driving Ports)
//!
//! Entry points the engine uses to report terminal events. Implementations
//! must accept calls from any thread and must not touch sender state
//! directly; they hop onto the owner context first.

use bytes::Bytes;
use shared_types::{RequestId, RpcError};

/// Where the engine reports the outcome of a submitted request.
pub trait CompletionSink: Send + Sync {
    /// The request produced a response; `result` holds the raw bytes.
    fn done(&self, request_id: RequestId, result: Bytes);

    /// The request failed and the failure was not absorbed by the engine.
    fn fail(&self, request_id: RequestId, error: RpcError);
}
