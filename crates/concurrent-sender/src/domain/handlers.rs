//! Completion handlers in canonical form, plus the shims that adapt the
//! four caller-facing shapes into it.
//!
//! | Shape | Done | Fail |
//! |-------|------|------|
//! | id + value | [`done_full`] | [`fail_full`] |
//! | value only | [`done_value`] | [`fail_error`] |
//! | id only | [`done_id`] | [`fail_id`] |
//! | nothing | [`done_bare`] | [`fail_bare`] |
//!
//! Every done shape decodes the raw bytes first, so all four fire for
//! exactly the same completions.

use crate::error::DecodeError;
use shared_types::{RequestId, RpcError};

/// Canonical done handler: receives raw result bytes and decodes them.
pub type DoneHandler = Box<dyn FnOnce(RequestId, &[u8]) -> Result<(), DecodeError> + Send>;

/// Canonical fail handler.
pub type FailHandler = Box<dyn FnOnce(RequestId, RpcError) + Send>;

/// Response decoder of a request descriptor.
pub type Decoder<R> = fn(&[u8]) -> Result<R, DecodeError>;

/// The pair of handlers owned by one registry entry.
#[derive(Default)]
pub struct Handlers {
    pub done: Option<DoneHandler>,
    pub fail: Option<FailHandler>,
}

impl Handlers {
    /// Whether neither handler was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.done.is_none() && self.fail.is_none()
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("done", &self.done.is_some())
            .field("fail", &self.fail.is_some())
            .finish()
    }
}

pub fn done_full<R, F>(decode: Decoder<R>, handler: F) -> DoneHandler
where
    R: 'static,
    F: FnOnce(RequestId, R) + Send + 'static,
{
    Box::new(move |request_id, raw| {
        let value = decode(raw)?;
        handler(request_id, value);
        Ok(())
    })
}

pub fn done_value<R, F>(decode: Decoder<R>, handler: F) -> DoneHandler
where
    R: 'static,
    F: FnOnce(R) + Send + 'static,
{
    done_full(decode, move |_, value| handler(value))
}

pub fn done_id<R, F>(decode: Decoder<R>, handler: F) -> DoneHandler
where
    R: 'static,
    F: FnOnce(RequestId) + Send + 'static,
{
    done_full(decode, move |request_id, _: R| handler(request_id))
}

pub fn done_bare<R, F>(decode: Decoder<R>, handler: F) -> DoneHandler
where
    R: 'static,
    F: FnOnce() + Send + 'static,
{
    done_full(decode, move |_, _: R| handler())
}

pub fn fail_full<F>(handler: F) -> FailHandler
where
    F: FnOnce(RequestId, RpcError) + Send + 'static,
{
    Box::new(handler)
}

pub fn fail_error<F>(handler: F) -> FailHandler
where
    F: FnOnce(RpcError) + Send + 'static,
{
    Box::new(move |_, error| handler(error))
}

pub fn fail_id<F>(handler: F) -> FailHandler
where
    F: FnOnce(RequestId) + Send + 'static,
{
    Box::new(move |request_id, _| handler(request_id))
}

pub fn fail_bare<F>(handler: F) -> FailHandler
where
    F: FnOnce() + Send + 'static,
{
    Box::new(move |_, _| handler())
}
