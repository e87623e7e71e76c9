//! Domain layer: pure bookkeeping, no I/O and no threads.
//!
//! - `request`: what a caller submits and how it is configured
//! - `handlers`: canonical completion callbacks and their adaptation
//! - `registry`: pending request id → handlers
//! - `config`: sender-wide defaults

pub mod config;
pub mod handlers;
pub mod registry;
pub mod request;

pub use config::{ConfigError, SenderConfig};
pub use handlers::{DoneHandler, FailHandler, Handlers};
pub use registry::{CompletedEntry, PendingRegistry};
pub use request::{RequestConfiguration, RequestDescriptor};
