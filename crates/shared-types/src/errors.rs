//! # Error Types
//!
//! The error value the engine reports for a failed request.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Prefix of flood-control error kinds; the suffix is the wait in seconds.
pub const FLOOD_WAIT_PREFIX: &str = "FLOOD_WAIT_";

/// Well-known error codes.
pub mod codes {
    /// Client-side failure that never reached the server.
    pub const LOCAL: i32 = -1;
    /// Request must be repeated on another datacenter.
    pub const SEE_OTHER: i32 = 303;
    /// Malformed request.
    pub const BAD_REQUEST: i32 = 400;
    /// Authorization missing or revoked.
    pub const UNAUTHORIZED: i32 = 401;
    /// Flood control triggered.
    pub const FLOOD: i32 = 420;
    /// Server-side failure.
    pub const INTERNAL: i32 = 500;
}

/// Failure reported by the engine for one request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("rpc error {code} {kind}: {description}")]
pub struct RpcError {
    /// Numeric error code.
    pub code: i32,
    /// Machine-readable error kind, e.g. `FLOOD_WAIT_30`.
    pub kind: String,
    /// Human-readable description.
    pub description: String,
}

impl RpcError {
    /// Create a new error value.
    pub fn new(code: i32, kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code,
            kind: kind.into(),
            description: description.into(),
        }
    }

    /// Error produced on the client side (e.g. response could not be read).
    pub fn local(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(codes::LOCAL, kind, description)
    }

    /// Flood-control error asking the client to wait `seconds`.
    pub fn flood_wait(seconds: u64) -> Self {
        Self::new(
            codes::FLOOD,
            format!("{FLOOD_WAIT_PREFIX}{seconds}"),
            "too many requests",
        )
    }

    /// Whether this is a flood-control error.
    #[must_use]
    pub fn is_flood(&self) -> bool {
        self.kind.starts_with(FLOOD_WAIT_PREFIX)
    }

    /// Wait requested by a flood-control error.
    #[must_use]
    pub fn flood_wait_duration(&self) -> Option<Duration> {
        self.kind
            .strip_prefix(FLOOD_WAIT_PREFIX)
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Whether the error was produced without a server round trip.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.code < 0
    }

    /// Errors an engine can recover from on its own: flood waits,
    /// datacenter migrations and internal server failures.
    #[must_use]
    pub fn is_generically_handled(&self) -> bool {
        self.is_flood() || self.code == codes::SEE_OTHER || self.code >= codes::INTERNAL
    }
}
