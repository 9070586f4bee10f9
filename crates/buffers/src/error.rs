//! Error type for buffer reads.

use std::fmt;

/// Errors that can occur while reading from a [`crate::Reader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// A read would run past the end of the buffer.
    EndOfBuffer,
    /// A byte range requested as a string is not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::EndOfBuffer => write!(f, "unexpected end of buffer"),
            BufferError::InvalidUtf8 => write!(f, "invalid UTF-8"),
        }
    }
}

impl std::error::Error for BufferError {}
