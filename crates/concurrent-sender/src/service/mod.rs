//! Service layer: the owner-side coordinator and its request builder.

pub mod builder;
pub mod sender;

pub use builder::RequestBuilder;
pub use sender::{ConcurrentSender, RequestCanceller, SentRequest};
