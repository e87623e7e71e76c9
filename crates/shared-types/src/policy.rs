//! # Fail-Skip Policy
//!
//! Controls which failures the engine may absorb (retry, wait out, migrate)
//! instead of reporting them to the caller's fail handler.

use crate::errors::RpcError;
use serde::{Deserialize, Serialize};

/// Which engine-level errors are absorbed before reaching the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailSkipPolicy {
    /// Every failure reaches the fail handler.
    #[default]
    Simple,
    /// Flood-control errors are waited out by the engine.
    HandleFlood,
    /// Every error the engine can handle generically is absorbed.
    HandleAll,
}

impl FailSkipPolicy {
    /// Whether an engine running under this policy keeps `error` to itself.
    #[must_use]
    pub fn absorbs(self, error: &RpcError) -> bool {
        match self {
            Self::Simple => false,
            Self::HandleFlood => error.is_flood(),
            Self::HandleAll => error.is_generically_handled(),
        }
    }
}
