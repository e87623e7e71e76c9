//! # Concurrent Sender
//!
//! Request front-end for an RPC client whose protocol engine reports
//! completions from arbitrary threads, while callers expect their handlers
//! to run on one owner context.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure bookkeeping, no I/O
//!   - `PendingRegistry`: request id → handlers for requests in flight
//!   - `Handlers`: canonical done/fail callbacks and their four shapes
//!   - `RequestDescriptor`, `RequestConfiguration`: what is sent and how
//!   - `SenderConfig`: request defaults with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `RpcEngine`: Driven port (id allocation, submit, cancel)
//!   - `CompletionSink`: Driving port the engine reports through
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `ConcurrentSender`: owner-side coordinator
//!   - `RequestBuilder`: move-only fluent request configuration
//!
//! - **Bridge** (`bridge.rs`): marshals work onto the owner context
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `OwnerQueue` / `WeakOwner`: Tokio actor that owns the sender
//!   - `ReplyLink`: `CompletionSink` that hops onto the owner
//!   - `InMemoryEngine`: scripted engine for tests and local runs
//!   - `BincodeRequest`: serde-backed `RequestDescriptor`
//!
//! ## Guarantees
//!
//! - The registry is only touched on the owner context; it has no locks.
//! - Handlers are registered before the engine sees the request.
//! - Each request ends in exactly one terminal event (done, fail or
//!   cancel); at most one handler runs, none on cancel.
//! - Once the sender is destroyed, none of its handlers ever run.
//!
//! ## Usage Example
//!
//! ```ignore
//! use concurrent_sender::{BincodeRequest, ConcurrentSender, InMemoryEngine, OwnerBridge, OwnerQueue};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(InMemoryEngine::new());
//! let owner = OwnerQueue::spawn_with("main", |weak| {
//!     ConcurrentSender::new(OwnerBridge::on_queue(weak), engine.clone())
//! });
//!
//! let request = BincodeRequest::<String>::encode("help.getNearestDc", &())?;
//! let id = owner
//!     .call(move |sender| {
//!         sender
//!             .begin_request(request)
//!             .done_value(|dc| println!("nearest: {dc}"))
//!             .fail_error(|error| eprintln!("failed: {error}"))
//!             .send()
//!     })
//!     .await?;
//!
//! // From any thread:
//! engine.respond(id, concurrent_sender::encode_response(&"dc2")?);
//! ```

pub mod adapters;
pub mod bridge;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{
    encode_response, BincodeRequest, Delivery, InMemoryEngine, OwnerGone, OwnerQueue, ReplyLink,
    SubmittedRequest, WeakOwner,
};
pub use bridge::{ManualQueue, OwnerBridge, SenderJob, SenderOwner};
pub use domain::{
    ConfigError, Handlers, PendingRegistry, RequestConfiguration, RequestDescriptor, SenderConfig,
};
pub use error::{DecodeError, EncodeError, SenderError};
pub use metrics::{MetricsRecorder, MetricsSnapshot, NoOpMetrics, SenderMetrics};
pub use ports::{CompletionSink, RpcEngine, Submission};
pub use service::{ConcurrentSender, RequestBuilder, RequestCanceller, SentRequest};

pub use shared_types::{FailSkipPolicy, RequestId, RequestPayload, RoutingKey, RpcError};
