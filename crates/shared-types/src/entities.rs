//! # Core Entities
//!
//! Identifiers and payload wrappers that travel between the sender and the
//! protocol engine.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the engine assigns to a submitted request.
///
/// Stable while the request is pending. The engine may hand the same value
/// out again once the request reached a terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u32);

impl RequestId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RequestId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Multiplier separating the datacenter id from the connection shift.
pub const ROUTE_SHIFT_MULTIPLIER: u32 = 10_000;

/// Engine-specific dispatch target ("shifted datacenter id").
///
/// Encoded as `dc_id + shift * ROUTE_SHIFT_MULTIPLIER`, so the same
/// datacenter can be reached over several independent connections
/// (downloads, uploads, ...). `RoutingKey::MAIN` lets the engine pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingKey(pub u32);

impl RoutingKey {
    /// Engine default: the main datacenter of the session.
    pub const MAIN: RoutingKey = RoutingKey(0);

    /// Route to a datacenter on its primary connection.
    #[must_use]
    pub const fn new(dc_id: u32) -> Self {
        Self(dc_id)
    }

    /// Route to a datacenter on a secondary connection.
    ///
    /// `None` when `dc_id` does not fit below `ROUTE_SHIFT_MULTIPLIER` or
    /// the encoded key overflows `u32`.
    #[must_use]
    pub const fn shifted(dc_id: u32, shift: u32) -> Option<Self> {
        if dc_id >= ROUTE_SHIFT_MULTIPLIER {
            return None;
        }
        match shift.checked_mul(ROUTE_SHIFT_MULTIPLIER) {
            Some(base) => match base.checked_add(dc_id) {
                Some(key) => Some(Self(key)),
                None => None,
            },
            None => None,
        }
    }

    /// Bare datacenter id without the shift.
    #[must_use]
    pub const fn dc_id(self) -> u32 {
        self.0 % ROUTE_SHIFT_MULTIPLIER
    }

    /// Connection shift.
    #[must_use]
    pub const fn shift(self) -> u32 {
        self.0 / ROUTE_SHIFT_MULTIPLIER
    }

    /// Whether the engine is free to choose the destination.
    #[must_use]
    pub const fn is_main(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shift() == 0 {
            write!(f, "dc{}", self.dc_id())
        } else {
            write!(f, "dc{}+{}", self.dc_id(), self.shift())
        }
    }
}

/// Serialized request as handed to the engine.
///
/// `method` is carried for logging only; the engine sends `body` verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    /// Method name of the request.
    pub method: &'static str,
    /// Serialized request body.
    pub body: Bytes,
}

impl RequestPayload {
    /// Wrap serialized bytes.
    pub fn new(method: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            body: body.into(),
        }
    }

    /// Size of the serialized body in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
