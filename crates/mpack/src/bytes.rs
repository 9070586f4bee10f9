//! Raw byte payloads.
//!
//! A `Vec<u8>` encodes through the generic sequence impl (one tagged
//! integer per byte). Wrapping it in [`Bytes`] routes it through the
//! byte-slice strategy instead, selecting the bin8/bin16/bin32 opcodes
//! by default.

use std::ops::Deref;

use crate::constants;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{DecodeError, EncodeError};
use crate::pack::Pack;
use crate::unpack::Unpack;

/// A binary blob, encoded per
/// [`ByteSliceStrategy`](crate::ByteSliceStrategy).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Pack for Bytes {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.encode_bytes(&self.0)
    }
}

/// Accepts either rendering regardless of the encode-side strategy: a
/// binary blob, or a sequence of 8-bit integers.
impl Unpack for Bytes {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let marker = decoder.peek_marker()?;
        if constants::is_bin(marker) {
            decoder.decode_bytes().map(Bytes)
        } else {
            Vec::<u8>::unpack(decoder).map(Bytes)
        }
    }
}
