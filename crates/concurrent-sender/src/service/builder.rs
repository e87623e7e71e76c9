//! Request builder.
//!
//! Borrowed mutably from the sender between `begin_request` and `send`, so
//! no other request can be built or sent on the same sender meanwhile.
//! Every method consumes the builder and returns it; `send` consumes it for
//! good. Setting the same option twice keeps the last value.

use crate::domain::handlers::{self, Handlers};
use crate::domain::request::{RequestConfiguration, RequestDescriptor};
use crate::service::sender::ConcurrentSender;
use shared_types::{FailSkipPolicy, RequestId, RoutingKey, RpcError};
use std::time::Duration;

/// Fluent configuration for one request.
#[must_use = "a request is only submitted by `send()`"]
pub struct RequestBuilder<'a, D: RequestDescriptor> {
    sender: &'a mut ConcurrentSender,
    descriptor: D,
    config: RequestConfiguration,
    handlers: Handlers,
}

impl<'a, D: RequestDescriptor> RequestBuilder<'a, D> {
    pub(crate) fn new(sender: &'a mut ConcurrentSender, descriptor: D) -> Self {
        let config = RequestConfiguration::from(sender.config());
        Self {
            sender,
            descriptor,
            config,
            handlers: Handlers::default(),
        }
    }

    /// Dispatch to a specific datacenter route instead of the default.
    pub fn to_route(mut self, route: RoutingKey) -> Self {
        self.config.route = route;
        self
    }

    /// Let the engine hold the request up to `budget` to batch it.
    ///
    /// Clamped to the sender's `max_wait_budget`.
    pub fn with_wait_budget(mut self, budget: Duration) -> Self {
        self.config.wait_budget = self.sender.config().clamp_wait_budget(budget);
        self
    }

    /// Do not put this request on the wire before `request_id`.
    pub fn after(mut self, request_id: RequestId) -> Self {
        self.config.after = Some(request_id);
        self
    }

    /// Let the engine absorb flood-wait errors.
    pub fn skip_flood_errors(mut self) -> Self {
        self.config.fail_skip = FailSkipPolicy::HandleFlood;
        self
    }

    /// Let the engine absorb every error it can handle on its own.
    pub fn skip_all_errors(mut self) -> Self {
        self.config.fail_skip = FailSkipPolicy::HandleAll;
        self
    }

    pub fn done<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(RequestId, D::Response) + Send + 'static,
    {
        self.handlers.done = Some(handlers::done_full(D::decode_response, handler));
        self
    }

    pub fn done_value<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(D::Response) + Send + 'static,
    {
        self.handlers.done = Some(handlers::done_value(D::decode_response, handler));
        self
    }

    pub fn done_id<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(RequestId) + Send + 'static,
    {
        self.handlers.done = Some(handlers::done_id(D::decode_response, handler));
        self
    }

    pub fn done_bare<F>(mut self, handler: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.handlers.done = Some(handlers::done_bare(D::decode_response, handler));
        self
    }

    pub fn fail<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(RequestId, RpcError) + Send + 'static,
    {
        self.handlers.fail = Some(handlers::fail_full(handler));
        self
    }

    pub fn fail_error<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(RpcError) + Send + 'static,
    {
        self.handlers.fail = Some(handlers::fail_error(handler));
        self
    }

    pub fn fail_id<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(RequestId) + Send + 'static,
    {
        self.handlers.fail = Some(handlers::fail_id(handler));
        self
    }

    pub fn fail_bare<F>(mut self, handler: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.handlers.fail = Some(handlers::fail_bare(handler));
        self
    }

    /// Register the handlers and submit the request.
    ///
    /// Returns the id the handlers will be called with. Never blocks.
    pub fn send(self) -> RequestId {
        let Self {
            sender,
            descriptor,
            config,
            handlers,
        } = self;
        sender.dispatch(descriptor.into_payload(), config, handlers)
    }
}
