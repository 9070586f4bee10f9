//! MessagePack codec for typed Rust values.
//!
//! A value that implements [`Pack`] serializes itself through an
//! [`Encoder`] (one scalar, or one record/sequence container whose
//! fields and elements are appended in declaration order), and the
//! mirror [`Unpack`] implementation reads the same shape back through a
//! [`Decoder`]. The wire format is standard MessagePack with
//! minimal-width numeric encoding; the only extension type in use is the
//! 32-bit seconds timestamp.
//!
//! ```
//! use mpack::{decode, encode, Decoder, DecodeError, Encoder, EncodeError, Pack, Unpack};
//!
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Pack for Point {
//!     fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
//!         encoder.encode_map(|m| {
//!             m.field("x", &self.x)?;
//!             m.field("y", &self.y)
//!         })
//!     }
//! }
//!
//! impl Unpack for Point {
//!     fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
//!         let mut map = decoder.map()?;
//!         Ok(Point {
//!             x: map.field("x")?,
//!             y: map.field("y")?,
//!         })
//!     }
//! }
//!
//! let bytes = encode(&Point { x: 1, y: -2 }).unwrap();
//! let point: Point = decode(&bytes).unwrap();
//! assert_eq!((point.x, point.y), (1, -2));
//! ```

pub mod constants;

mod bytes;
mod decoder;
mod encoder;
mod error;
mod node;
mod options;
mod pack;
mod path;
mod unpack;
mod wire;

pub use bytes::Bytes;
pub use decoder::{decode, decode_with, Decoder, MapDecoder, SeqDecoder, SubDecoder};
pub use encoder::{encode, encode_with, Encoder, MapEncoder, SeqEncoder, SubEncoder};
pub use error::{DecodeError, EncodeError};
pub use options::{ByteSliceStrategy, Context, DecodeOptions, EncodeOptions, TimestampStrategy};
pub use pack::Pack;
pub use path::PathSegment;
pub use unpack::Unpack;
