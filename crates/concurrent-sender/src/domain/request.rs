//! Request descriptors and per-request configuration.

use crate::domain::config::SenderConfig;
use crate::error::DecodeError;
use shared_types::{FailSkipPolicy, RequestId, RequestPayload, RoutingKey};
use std::time::Duration;

/// A typed request: how to serialize it and how to read its response.
///
/// Implemented by the wire codec; the sender only calls these two methods.
pub trait RequestDescriptor: 'static {
    /// Type the raw result bytes decode into.
    type Response: Send + 'static;

    /// Serialize the request. Consumes the descriptor.
    fn into_payload(self) -> RequestPayload;

    /// Decode raw result bytes into `Self::Response`.
    fn decode_response(raw: &[u8]) -> Result<Self::Response, DecodeError>;
}

/// Settings a builder accumulates before `send()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestConfiguration {
    /// Where the engine should dispatch the request.
    pub route: RoutingKey,
    /// How long the engine may hold the request before putting it on the wire.
    pub wait_budget: Duration,
    /// Which failures the engine may absorb.
    pub fail_skip: FailSkipPolicy,
    /// Request that must reach the wire before this one.
    pub after: Option<RequestId>,
}

impl Default for RequestConfiguration {
    fn default() -> Self {
        Self {
            route: RoutingKey::MAIN,
            wait_budget: Duration::ZERO,
            fail_skip: FailSkipPolicy::Simple,
            after: None,
        }
    }
}

impl From<&SenderConfig> for RequestConfiguration {
    fn from(config: &SenderConfig) -> Self {
        Self {
            route: config.default_route,
            wait_budget: config.default_wait_budget,
            fail_skip: config.default_fail_skip,
            after: None,
        }
    }
}
