//! # Integration Flows
//!
//! End-to-end tests over the real owner queue: requests are built on the
//! owner task, the in-memory engine answers from plain OS threads, and
//! completions travel back through `ReplyLink` and the weak bridge.

pub mod concurrency;
pub mod lifecycle;
