//! Error types for the concurrent sender.
//!
//! None of these reach a caller through `?`: engine failures are delivered
//! to fail handlers as `RpcError` values, and everything here is logged and
//! counted where it happens.

use crate::adapters::owner_queue::OwnerGone;
use shared_types::RequestId;
use thiserror::Error;

/// Failure to turn raw result bytes into the declared response type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Trailing bytes after response: {0} bytes left")]
    TrailingBytes(usize),

    #[error("Unexpected response type, expected {expected}")]
    UnexpectedType { expected: &'static str },
}

impl From<bincode::Error> for DecodeError {
    fn from(error: bincode::Error) -> Self {
        Self::Malformed(error.to_string())
    }
}

/// Failure to serialize a request descriptor or a response value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(pub String);

impl From<bincode::Error> for EncodeError {
    fn from(error: bincode::Error) -> Self {
        Self(error.to_string())
    }
}

/// Conditions the sender observes internally and resolves without a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SenderError {
    /// Terminal event for an id with no registry entry (already cancelled,
    /// already completed, or delivered twice).
    #[error("Unknown request id: {0}")]
    UnknownRequestId(RequestId),

    /// Response bytes did not match the declared response type.
    #[error("Failed to decode response for request {request_id}: {source}")]
    Decode {
        request_id: RequestId,
        #[source]
        source: DecodeError,
    },

    /// Marshaled work arrived after its owner was destroyed.
    #[error("Owner destroyed before marshaled work could run")]
    StaleOwner,
}

impl From<OwnerGone> for SenderError {
    fn from(_: OwnerGone) -> Self {
        Self::StaleOwner
    }
}
