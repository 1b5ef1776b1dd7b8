//! Value Codec
//!
//! JSON encoding for values crossing the remote-tier boundary. Integers stay
//! integers: `serde_json::Value` keeps i64/u64 numbers exact, so nothing is
//! funnelled through f64 on the way back.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Serialized form of a value: the dynamic tree kept by the local tier and the
/// bytes written to the remote tier.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub value: Value,
    pub bytes: Vec<u8>,
}

/// Encodes a value. Fails before anything is written anywhere.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Encoded> {
    let value = serde_json::to_value(value)?;
    let bytes = serde_json::to_vec(&value)?;
    Ok(Encoded { value, bytes })
}

/// Decodes remote bytes. A zero-length payload means "not found".
pub fn decode(bytes: &[u8]) -> Result<Option<Value>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(bytes)?))
}

/// Converts a dynamic value into the caller's target type.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T> {
    Ok(T::deserialize(value)?)
}
