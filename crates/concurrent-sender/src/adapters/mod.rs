//! Adapters: concrete implementations around the ports.
//!
//! - `owner_queue`: Tokio actor that owns a value and runs jobs against it
//! - `reply_link`: `CompletionSink` that marshals onto the owner context
//! - `in_memory_engine`: scripted `RpcEngine` for tests and local runs
//! - `codec`: bincode-backed `RequestDescriptor`

pub mod codec;
pub mod in_memory_engine;
pub mod owner_queue;
pub mod reply_link;

pub use codec::{encode_response, BincodeRequest};
pub use in_memory_engine::{Delivery, InMemoryEngine, SubmittedRequest};
pub use owner_queue::{OwnerGone, OwnerQueue, WeakOwner};
pub use reply_link::ReplyLink;
