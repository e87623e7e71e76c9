//! Ports: the seams between the sender and the protocol engine.
//!
//! - `outbound::RpcEngine` is what the sender drives (submit, cancel)
//! - `inbound::CompletionSink` is what the engine calls back (done, fail)

pub mod inbound;
pub mod outbound;

pub use inbound::CompletionSink;
pub use outbound::{RpcEngine, Submission};
