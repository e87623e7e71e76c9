//! # Concurrent Sender Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Request types, replies, owner set-up
//! └── integration/      # End-to-end flows over the owner queue
//!     ├── scenarios.rs  # Single-request lifecycles
//!     ├── concurrency.rs# Many engine threads, shuffled completions
//!     └── lifecycle.rs  # Shutdown, late delivery, configuration
//!
//! tests/benches/
//! └── sender_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sender-tests
//!
//! # By category
//! cargo test -p sender-tests integration::scenarios::
//! cargo test -p sender-tests integration::concurrency::
//!
//! # Benchmarks
//! cargo bench -p sender-tests
//! ```

pub mod fixtures;
pub mod integration;
