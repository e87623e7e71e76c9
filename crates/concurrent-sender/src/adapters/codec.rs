//! Bincode-backed request descriptor.
//!
//! Lets any serde request/response pair be sent without writing a
//! `RequestDescriptor` impl by hand:
//!
//! ```ignore
//! let request = BincodeRequest::<Pong>::encode("ping", &Ping { seq: 1 })?;
//! sender.begin_request(request).done_value(|pong| { /* ... */ }).send();
//! ```

use crate::domain::request::RequestDescriptor;
use crate::error::{DecodeError, EncodeError};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::RequestPayload;
use std::marker::PhantomData;

/// A pre-serialized request whose response decodes into `Resp`.
pub struct BincodeRequest<Resp> {
    payload: RequestPayload,
    _response: PhantomData<fn() -> Resp>,
}

impl<Resp> BincodeRequest<Resp> {
    /// Serialize `request` under `method`.
    pub fn encode<Req: Serialize>(method: &'static str, request: &Req) -> Result<Self, EncodeError> {
        let body = bincode::serialize(request)?;
        Ok(Self {
            payload: RequestPayload::new(method, body),
            _response: PhantomData,
        })
    }

    pub fn method(&self) -> &'static str {
        self.payload.method
    }
}

impl<Resp> RequestDescriptor for BincodeRequest<Resp>
where
    Resp: DeserializeOwned + Send + 'static,
{
    type Response = Resp;

    fn into_payload(self) -> RequestPayload {
        self.payload
    }

    fn decode_response(raw: &[u8]) -> Result<Resp, DecodeError> {
        let mut cursor = raw;
        let value = bincode::deserialize_from(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(DecodeError::TrailingBytes(cursor.len()));
        }
        Ok(value)
    }
}

/// Serialize a response value the way `BincodeRequest` expects to read it.
pub fn encode_response<T: Serialize>(value: &T) -> Result<Bytes, EncodeError> {
    Ok(Bytes::from(bincode::serialize(value)?))
}
