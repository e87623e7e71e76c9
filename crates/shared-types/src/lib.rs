//! # Shared Types Crate
//!
//! Value types shared by the sender, the code that calls it and the
//! protocol engine behind it.
//!
//! ## Design Principles
//!
//! - **Opaque identifiers**: `RequestId` is assigned by the engine and only
//!   compared, hashed and logged by everyone else.
//! - **Engine-owned semantics**: `RoutingKey` and `FailSkipPolicy` are hints
//!   forwarded to the engine; the sender never interprets them.
//! - **Plain error values**: `RpcError` is data delivered to a fail handler,
//!   not something propagated with `?`.

pub mod entities;
pub mod errors;
pub mod policy;

pub use entities::*;
pub use errors::*;
pub use policy::FailSkipPolicy;
