//! Error types for encoding and decoding.
//!
//! Contract violations (pushing a second top-level value at an occupied
//! coding path, or finishing a deferred encoder with an over-full stack)
//! are bugs in caller-supplied [`Pack`](crate::Pack) code, not runtime
//! conditions, and panic instead of appearing here.

use thiserror::Error;

/// Errors that can occur while encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A string, binary blob, or collection is too large for any
    /// MessagePack length header (2^32 - 1 ceiling).
    #[error("{kind} of length {len} exceeds the MessagePack length limit at {path}")]
    LengthLimit {
        kind: &'static str,
        len: u64,
        path: String,
    },
}

/// Errors that can occur while decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The marker at the cursor does not match the requested shape.
    #[error("expected {expected} but found marker 0x{found:02x} at {path}")]
    TypeMismatch {
        expected: &'static str,
        found: u8,
        path: String,
    },
    /// The input ended before the value at the cursor was complete, or a
    /// sequence was read past its declared element count.
    #[error("unexpected end of input at {path}")]
    UnexpectedEof { path: String },
    /// A string payload is not valid UTF-8.
    #[error("invalid UTF-8 in string at {path}")]
    InvalidUtf8 { path: String },
    /// A requested record field is not present in the encoded map.
    #[error("missing key {key:?} at {path}")]
    MissingKey { key: String, path: String },
    /// A wire construct the codec intentionally does not decode.
    #[error("{what} is not supported at {path}")]
    Unsupported { what: &'static str, path: String },
}
