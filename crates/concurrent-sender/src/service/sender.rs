//! # Concurrent Sender
//!
//! Owner-side coordinator: builds requests, tracks them until their terminal
//! event and delivers completions to the handlers registered at `send()`.
//!
//! Every method takes `&self` or `&mut self` and therefore runs on the
//! owner context. Engine callbacks from other threads arrive through the
//! `ReplyLink` completion sink, which marshals them here via the bridge.
//!
//! ```text
//! caller ── begin_request ──► RequestBuilder ── send ──► registry.register
//!                                                          │
//!                                                          ▼
//!                                                    engine.submit
//!                                                          │ (any thread)
//!                                                          ▼
//!           on_done / on_fail ◄── bridge ◄── ReplyLink::done / fail
//! ```

use crate::adapters::reply_link::ReplyLink;
use crate::bridge::OwnerBridge;
use crate::domain::config::SenderConfig;
use crate::domain::handlers::Handlers;
use crate::domain::registry::PendingRegistry;
use crate::domain::request::{RequestConfiguration, RequestDescriptor};
use crate::error::SenderError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::inbound::CompletionSink;
use crate::ports::outbound::{RpcEngine, Submission};
use crate::service::builder::RequestBuilder;
use shared_types::{RequestId, RequestPayload, RpcError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Request front-end bound to one owner context.
pub struct ConcurrentSender {
    bridge: OwnerBridge,
    engine: Arc<dyn RpcEngine>,
    /// Handed to the engine with every submission.
    reply: Arc<dyn CompletionSink>,
    registry: PendingRegistry,
    config: SenderConfig,
    metrics: Arc<dyn MetricsRecorder>,
}

impl ConcurrentSender {
    /// Create a sender with default configuration.
    pub fn new(bridge: OwnerBridge, engine: Arc<dyn RpcEngine>) -> Self {
        Self::with_config(bridge, engine, SenderConfig::default())
    }

    /// Create a sender with explicit request defaults.
    pub fn with_config(bridge: OwnerBridge, engine: Arc<dyn RpcEngine>, config: SenderConfig) -> Self {
        let reply: Arc<dyn CompletionSink> = Arc::new(ReplyLink::new(bridge.clone()));
        debug!(owner = %config.owner_name, "Created concurrent sender");

        Self {
            bridge,
            engine,
            reply,
            registry: PendingRegistry::new(),
            config,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Replace the metrics recorder.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Start building a request. Nothing is registered until `send()`.
    pub fn begin_request<D: RequestDescriptor>(&mut self, descriptor: D) -> RequestBuilder<'_, D> {
        RequestBuilder::new(self, descriptor)
    }

    /// Handle to an already sent request.
    pub fn request(&mut self, request_id: RequestId) -> SentRequest<'_> {
        SentRequest {
            sender: self,
            request_id,
        }
    }

    /// A cancel function that can be stored and called from any thread.
    pub fn canceller(&self) -> RequestCanceller {
        RequestCanceller {
            bridge: self.bridge.clone(),
        }
    }

    /// Cancel a request.
    ///
    /// The engine is always asked to cancel; the pending entry, if any, is
    /// dropped without invoking either handler. Cancelling an unknown or
    /// finished id is a no-op for the registry.
    pub fn cancel(&mut self, request_id: RequestId) {
        self.engine.cancel(request_id);

        if self.registry.remove(request_id) {
            self.metrics.record_cancelled();
            debug!(request_id = %request_id, "Cancelled pending request");
        }
    }

    /// Deliver a response. Called on the owner context.
    ///
    /// The done handler, if registered, decodes `result` before it sees the
    /// response. An undecodable response is logged and counted; neither
    /// handler runs for it.
    pub fn on_done(&mut self, request_id: RequestId, result: &[u8]) {
        let entry = match self.registry.take(request_id) {
            Ok(entry) => entry,
            Err(error) => {
                self.metrics.record_unknown_id();
                debug!(error = %error, "Ignoring response");
                return;
            }
        };

        self.metrics.record_completed(entry.elapsed);
        debug!(
            request_id = %request_id,
            method = entry.method,
            elapsed_us = entry.elapsed.as_micros() as u64,
            "Request completed"
        );

        let Some(done) = entry.handlers.done else {
            return;
        };
        if let Err(source) = done(request_id, result) {
            self.metrics.record_decode_failure();
            let error = SenderError::Decode { request_id, source };
            warn!(method = entry.method, error = %error, "Dropping undecodable response");
        }
    }

    /// Deliver a failure. Called on the owner context.
    pub fn on_fail(&mut self, request_id: RequestId, error: RpcError) {
        let entry = match self.registry.take(request_id) {
            Ok(entry) => entry,
            Err(unknown) => {
                self.metrics.record_unknown_id();
                debug!(error = %unknown, code = error.code, "Ignoring failure");
                return;
            }
        };

        self.metrics.record_failed(entry.elapsed);
        debug!(
            request_id = %request_id,
            method = entry.method,
            code = error.code,
            kind = %error.kind,
            "Request failed"
        );

        if let Some(fail) = entry.handlers.fail {
            fail(request_id, error);
        }
    }

    /// Register `handlers` under a fresh id, then submit.
    ///
    /// Registration happens first so that a response the engine produces
    /// immediately still finds its entry.
    pub(crate) fn dispatch(
        &mut self,
        payload: RequestPayload,
        config: RequestConfiguration,
        handlers: Handlers,
    ) -> RequestId {
        let request_id = self.engine.allocate_id();
        self.registry.register(request_id, payload.method, handlers);
        self.metrics.record_sent();

        debug!(
            request_id = %request_id,
            method = payload.method,
            bytes = payload.len(),
            route = %config.route,
            after = ?config.after,
            "Sending request"
        );

        self.engine.submit(Submission {
            request_id,
            payload,
            route: config.route,
            wait_budget: config.wait_budget,
            fail_skip: config.fail_skip,
            after: config.after,
            reply: self.reply.clone(),
        });

        request_id
    }

    /// Number of requests awaiting a terminal event.
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_pending(&self, request_id: RequestId) -> bool {
        self.registry.contains(request_id)
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    pub fn metrics(&self) -> &dyn MetricsRecorder {
        self.metrics.as_ref()
    }

    /// The bridge onto this sender's owner context.
    ///
    /// Handlers that want to send follow-up requests capture a clone and
    /// marshal a job.
    pub fn bridge(&self) -> &OwnerBridge {
        &self.bridge
    }

    /// The completion sink handed to the engine with every submission.
    pub fn completion_sink(&self) -> Arc<dyn CompletionSink> {
        self.reply.clone()
    }
}

impl Drop for ConcurrentSender {
    fn drop(&mut self) {
        let pending = self.registry.drain();
        if pending.is_empty() {
            debug!(owner = %self.config.owner_name, "Sender destroyed");
            return;
        }

        for request_id in &pending {
            self.engine.cancel(*request_id);
        }
        self.metrics.record_teardown(pending.len());
        info!(
            owner = %self.config.owner_name,
            cancelled = pending.len(),
            "Sender destroyed, cancelled pending requests"
        );
    }
}

impl fmt::Debug for ConcurrentSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentSender")
            .field("owner", &self.config.owner_name)
            .field("pending", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Handle to a sent request, borrowed from its sender.
#[derive(Debug)]
pub struct SentRequest<'a> {
    sender: &'a mut ConcurrentSender,
    request_id: RequestId,
}

impl SentRequest<'_> {
    pub fn id(&self) -> RequestId {
        self.request_id
    }

    pub fn is_pending(&self) -> bool {
        self.sender.is_pending(self.request_id)
    }

    /// Same as `ConcurrentSender::cancel`.
    pub fn cancel(self) {
        self.sender.cancel(self.request_id);
    }
}

/// Reusable cancel function, usable from any thread.
///
/// Cancellation is marshaled to the owner context, so it takes effect after
/// any work already queued there, and is dropped if the owner is gone.
#[derive(Debug, Clone)]
pub struct RequestCanceller {
    bridge: OwnerBridge,
}

impl RequestCanceller {
    pub fn cancel(&self, request_id: RequestId) {
        self.bridge.marshal(move |sender| sender.cancel(request_id));
    }

    /// Convert into a plain closure.
    pub fn into_fn(self) -> impl Fn(RequestId) + Clone + Send + Sync + 'static {
        move |request_id| self.cancel(request_id)
    }
}
