//! Transport encoding.
//!
//! Envelopes, auth entries, Soroban data and contract values cross the RPC
//! boundary as base64 strings. The payload under the base64 is the canonical
//! `serde_json` encoding of the value: struct fields in declaration order, no
//! whitespace. The same canonical bytes feed transaction hashing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from encoding or decoding transport payloads.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The value could not be serialized or deserialized.
    #[error("{what} encoding error: {source}")]
    Json {
        /// The value being encoded or decoded.
        what: &'static str,
        /// The underlying cause.
        #[source]
        source: serde_json::Error,
    },

    /// The payload was not valid base64.
    #[error("{what} is not valid base64: {source}")]
    Base64 {
        /// The value being decoded.
        what: &'static str,
        /// The underlying cause.
        #[source]
        source: base64::DecodeError,
    },
}

/// Returns the canonical bytes of a value.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn to_bytes<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|source| CodecError::Json { what, source })
}

/// Encodes a value for transport.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<String, CodecError> {
    Ok(STANDARD.encode(to_bytes(what, value)?))
}

/// Decodes a transport payload.
///
/// # Errors
///
/// Returns an error if the payload is not base64 or does not describe a `T`.
pub fn decode<T: DeserializeOwned>(what: &'static str, payload: &str) -> Result<T, CodecError> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|source| CodecError::Base64 { what, source })?;
    serde_json::from_slice(&bytes).map_err(|source| CodecError::Json { what, source })
}
