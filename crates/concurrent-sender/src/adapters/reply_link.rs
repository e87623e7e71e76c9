//! Engine-facing completion sink.
//!
//! The engine may call `done`/`fail` from any thread. Nothing here touches
//! the registry: both calls are marshaled to the owner context and applied
//! there by `ConcurrentSender::on_done` / `on_fail`.

use crate::bridge::OwnerBridge;
use crate::ports::inbound::CompletionSink;
use bytes::Bytes;
use shared_types::{RequestId, RpcError};
use tracing::trace;

/// `CompletionSink` bound to one sender's bridge.
#[derive(Debug, Clone)]
pub struct ReplyLink {
    bridge: OwnerBridge,
}

impl ReplyLink {
    pub fn new(bridge: OwnerBridge) -> Self {
        Self { bridge }
    }
}

impl CompletionSink for ReplyLink {
    fn done(&self, request_id: RequestId, result: Bytes) {
        trace!(request_id = %request_id, bytes = result.len(), "Marshaling response to owner");
        self.bridge
            .marshal(move |sender| sender.on_done(request_id, &result));
    }

    fn fail(&self, request_id: RequestId, error: RpcError) {
        trace!(request_id = %request_id, code = error.code, "Marshaling failure to owner");
        self.bridge
            .marshal(move |sender| sender.on_fail(request_id, error));
    }
}
