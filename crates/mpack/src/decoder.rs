//! The decoding engine: a forward-only cursor over an immutable byte
//! buffer, exposing typed read operations that per-type [`Unpack`] logic
//! calls in the order fields were declared.
//!
//! Sequence elements must be read strictly in encoded order. Record
//! fields are matched by name: opening a record pre-scans its entries
//! (keys plus the byte extent of each value, measured by skipping), so
//! fields can be requested in any order while the parent cursor moves
//! strictly forward past the whole record.

use std::ops::{Deref, DerefMut};
use std::time::SystemTime;

use mpack_buffers::Reader;

use crate::error::DecodeError;
use crate::options::DecodeOptions;
use crate::path::{self, PathSegment};
use crate::unpack::Unpack;
use crate::wire::{self, WireError};

/// Decodes a value from MessagePack bytes with default options.
pub fn decode<T: Unpack>(bytes: &[u8]) -> Result<T, DecodeError> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decodes a value from MessagePack bytes.
pub fn decode_with<T: Unpack>(bytes: &[u8], options: &DecodeOptions) -> Result<T, DecodeError> {
    let mut decoder = Decoder {
        reader: Reader::new(bytes),
        options: options.clone(),
        path: Vec::new(),
    };
    T::unpack(&mut decoder)
}

/// The decoding engine handed to [`Unpack::unpack`].
pub struct Decoder<'b> {
    reader: Reader<'b>,
    options: DecodeOptions,
    path: Vec<PathSegment>,
}

impl<'b> Decoder<'b> {
    /// The options this decode call runs under, including the caller
    /// context bag.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// The coding path of the value currently being decoded.
    pub fn coding_path(&self) -> &[PathSegment] {
        &self.path
    }

    fn path_string(&self) -> String {
        path::render(&self.path)
    }

    fn fail(&self, err: WireError) -> DecodeError {
        let path = self.path_string();
        match err {
            WireError::Eof => DecodeError::UnexpectedEof { path },
            WireError::Utf8 => DecodeError::InvalidUtf8 { path },
            WireError::Mismatch { expected, found } => DecodeError::TypeMismatch {
                expected,
                found,
                path,
            },
            WireError::Unsupported { what } => DecodeError::Unsupported { what, path },
        }
    }

    pub(crate) fn peek_marker(&self) -> Result<u8, DecodeError> {
        self.reader.peek().map_err(|e| self.fail(e.into()))
    }

    /// Consumes the nil marker if it is next; returns whether it did.
    pub fn decode_nil(&mut self) -> Result<bool, DecodeError> {
        wire::read_nil(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_bool(&mut self) -> Result<bool, DecodeError> {
        wire::read_bool(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_u8(&mut self) -> Result<u8, DecodeError> {
        wire::read_u8(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_u16(&mut self) -> Result<u16, DecodeError> {
        wire::read_u16(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_u32(&mut self) -> Result<u32, DecodeError> {
        wire::read_u32(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_u64(&mut self) -> Result<u64, DecodeError> {
        wire::read_u64(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_i8(&mut self) -> Result<i8, DecodeError> {
        wire::read_i8(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_i16(&mut self) -> Result<i16, DecodeError> {
        wire::read_i16(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_i32(&mut self) -> Result<i32, DecodeError> {
        wire::read_i32(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_i64(&mut self) -> Result<i64, DecodeError> {
        wire::read_i64(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_f32(&mut self) -> Result<f32, DecodeError> {
        wire::read_f32(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_f64(&mut self) -> Result<f64, DecodeError> {
        wire::read_f64(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_str(&mut self) -> Result<String, DecodeError> {
        wire::read_str(&mut self.reader).map_err(|e| self.fail(e))
    }

    /// Decodes a binary blob in the bin8/bin16/bin32 form.
    pub fn decode_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        wire::read_bin(&mut self.reader).map_err(|e| self.fail(e))
    }

    pub fn decode_timestamp(&mut self) -> Result<SystemTime, DecodeError> {
        wire::read_timestamp(&mut self.reader).map_err(|e| self.fail(e))
    }

    /// Decodes a nested value through its [`Unpack`] implementation.
    pub fn decode_value<T: Unpack>(&mut self) -> Result<T, DecodeError> {
        T::unpack(self)
    }

    /// Opens the sequence container at the cursor.
    pub fn seq(&mut self) -> Result<SeqDecoder<'_, 'b>, DecodeError> {
        let count = wire::read_array_header(&mut self.reader).map_err(|e| self.fail(e))?;
        Ok(SeqDecoder {
            decoder: self,
            count,
            index: 0,
        })
    }

    /// Opens the record container at the cursor.
    ///
    /// Pre-scans all entries: each key must be a string, each value is
    /// measured by skipping it. Afterwards the cursor sits past the whole
    /// record and fields can be requested by name in any order.
    pub fn map(&mut self) -> Result<MapDecoder<'_, 'b>, DecodeError> {
        let count = wire::read_map_header(&mut self.reader).map_err(|e| self.fail(e))?;
        let mut entries = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let key = wire::read_str(&mut self.reader).map_err(|e| self.fail(e))?;
            let start = self.reader.pos();
            wire::skip_value(&mut self.reader).map_err(|e| self.fail(e))?;
            entries.push((key, (start, self.reader.pos())));
        }
        Ok(MapDecoder {
            decoder: self,
            entries,
        })
    }
}

/// Reads the elements of one sequence container, strictly in encoded
/// order, yielding exactly the declared count.
pub struct SeqDecoder<'d, 'b> {
    decoder: &'d mut Decoder<'b>,
    count: usize,
    index: usize,
}

impl<'b> SeqDecoder<'_, 'b> {
    /// Element count declared by the header.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Index of the next element to decode.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once every declared element has been decoded.
    pub fn is_at_end(&self) -> bool {
        self.index == self.count
    }

    fn exhausted(&self) -> DecodeError {
        DecodeError::UnexpectedEof {
            path: path::render(&self.decoder.path),
        }
    }

    /// Decodes the next element.
    pub fn element<T: Unpack>(&mut self) -> Result<T, DecodeError> {
        if self.is_at_end() {
            return Err(self.exhausted());
        }
        self.decoder.path.push(PathSegment::Index(self.index));
        let value = T::unpack(self.decoder);
        self.decoder.path.pop();
        self.index += 1;
        value
    }

    /// Returns a decoder sharing the parent cursor for the element at the
    /// current index, for reading supertype-layered fields out of the same
    /// flat sequence.
    pub fn super_decoder(&mut self) -> Result<SubDecoder<'_, 'b>, DecodeError> {
        if self.is_at_end() {
            return Err(self.exhausted());
        }
        self.decoder.path.push(PathSegment::Index(self.index));
        self.index += 1;
        Ok(SubDecoder {
            decoder: &mut *self.decoder,
            window: None,
        })
    }
}

/// Reads the fields of one record container by name.
pub struct MapDecoder<'d, 'b> {
    decoder: &'d mut Decoder<'b>,
    /// Key and value byte extent of each entry, in encoded order.
    entries: Vec<(String, (usize, usize))>,
}

impl<'b> MapDecoder<'_, 'b> {
    /// Entry count declared by the header.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the record contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// The key of the entry at `index` in encoded order.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(key, _)| key.as_str())
    }

    /// First occurrence wins when a key is duplicated on the wire.
    fn lookup(&self, key: &str) -> Option<(usize, usize)> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, extent)| *extent)
    }

    fn missing(&self, key: &str) -> DecodeError {
        DecodeError::MissingKey {
            key: key.to_owned(),
            path: path::render(&self.decoder.path),
        }
    }

    fn decode_extent<T: Unpack>(
        &mut self,
        extent: (usize, usize),
        segment: PathSegment,
    ) -> Result<T, DecodeError> {
        let saved = (self.decoder.reader.pos(), self.decoder.reader.end());
        self.decoder.reader.seek(extent.0);
        self.decoder.reader.set_end(extent.1);
        self.decoder.path.push(segment);
        let value = T::unpack(self.decoder);
        self.decoder.path.pop();
        self.decoder.reader.seek(saved.0);
        self.decoder.reader.set_end(saved.1);
        value
    }

    /// Decodes the value stored under `key`.
    pub fn field<T: Unpack>(&mut self, key: &str) -> Result<T, DecodeError> {
        match self.lookup(key) {
            Some(extent) => self.decode_extent(extent, PathSegment::Key(key.to_owned())),
            None => Err(self.missing(key)),
        }
    }

    /// Decodes the value stored under `key`; an absent key or a nil value
    /// yields `None`.
    pub fn field_opt<T: Unpack>(&mut self, key: &str) -> Result<Option<T>, DecodeError> {
        match self.lookup(key) {
            Some(extent) => self.decode_extent(extent, PathSegment::Key(key.to_owned())),
            None => Ok(None),
        }
    }

    /// Decodes the entry at `index` in encoded order, returning its key
    /// and value.
    pub fn entry_at<T: Unpack>(&mut self, index: usize) -> Result<(String, T), DecodeError> {
        let Some((key, extent)) = self.entries.get(index).cloned() else {
            return Err(DecodeError::UnexpectedEof {
                path: path::render(&self.decoder.path),
            });
        };
        let value = self.decode_extent(extent, PathSegment::Key(key.clone()))?;
        Ok((key, value))
    }

    /// Returns a decoder positioned over the value stored under `key`,
    /// mirroring the deferred encoder on the decode side.
    pub fn super_decoder(&mut self, key: &str) -> Result<SubDecoder<'_, 'b>, DecodeError> {
        let Some(extent) = self.lookup(key) else {
            return Err(self.missing(key));
        };
        let saved = (self.decoder.reader.pos(), self.decoder.reader.end());
        self.decoder.reader.seek(extent.0);
        self.decoder.reader.set_end(extent.1);
        self.decoder.path.push(PathSegment::Key(key.to_owned()));
        Ok(SubDecoder {
            decoder: &mut *self.decoder,
            window: Some(saved),
        })
    }
}

/// A decoder scope created by `super_decoder`, sharing the parent cursor.
///
/// Dereferences to [`Decoder`]. When the scope drops, the coding path is
/// popped and, for record-keyed scopes, the parent cursor window is
/// restored.
pub struct SubDecoder<'d, 'b> {
    decoder: &'d mut Decoder<'b>,
    window: Option<(usize, usize)>,
}

impl Drop for SubDecoder<'_, '_> {
    fn drop(&mut self) {
        self.decoder.path.pop();
        if let Some((pos, end)) = self.window {
            self.decoder.reader.seek(pos);
            self.decoder.reader.set_end(end);
        }
    }
}

impl<'b> Deref for SubDecoder<'_, 'b> {
    type Target = Decoder<'b>;

    fn deref(&self) -> &Decoder<'b> {
        self.decoder
    }
}

impl<'b> DerefMut for SubDecoder<'_, 'b> {
    fn deref_mut(&mut self) -> &mut Decoder<'b> {
        self.decoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_decode() {
        assert!(decode::<bool>(&[0xc3]).unwrap());
        assert_eq!(decode::<u8>(&[0x7f]).unwrap(), 127);
        assert_eq!(decode::<i8>(&[0xff]).unwrap(), -1);
        assert_eq!(decode::<String>(&[0xa3, b'f', b'o', b'o']).unwrap(), "foo");
    }

    #[test]
    fn empty_sequence() {
        let v: Vec<bool> = decode(&[0x90]).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn sequence_read_past_declared_count() {
        #[derive(Debug)]
        struct Greedy;
        impl Unpack for Greedy {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let mut seq = dec.seq()?;
                let _: u8 = seq.element()?;
                let _: u8 = seq.element()?;
                Ok(Greedy)
            }
        }
        let err = decode::<Greedy>(&[0x91, 0x01]).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
    }

    #[test]
    fn map_fields_by_name_out_of_order() {
        struct Pair {
            a: u8,
            b: String,
        }
        impl Unpack for Pair {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let mut map = dec.map()?;
                // Requested in the opposite of wire order.
                let b = map.field("b")?;
                let a = map.field("a")?;
                Ok(Pair { a, b })
            }
        }
        // {"a": 1, "b": "x"}
        let data = [0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0xa1, b'x'];
        let pair = decode::<Pair>(&data).unwrap();
        assert_eq!(pair.a, 1);
        assert_eq!(pair.b, "x");
    }

    #[test]
    fn map_missing_key() {
        #[derive(Debug)]
        struct Needs;
        impl Unpack for Needs {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let mut map = dec.map()?;
                let _: u8 = map.field("absent")?;
                Ok(Needs)
            }
        }
        let err = decode::<Needs>(&[0x81, 0xa1, b'a', 0x01]).unwrap_err();
        assert!(matches!(err, DecodeError::MissingKey { key, .. } if key == "absent"));
    }

    #[test]
    fn map_field_opt_absent_and_nil() {
        struct Opt {
            present: Option<u8>,
            nil: Option<u8>,
            absent: Option<u8>,
        }
        impl Unpack for Opt {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let mut map = dec.map()?;
                Ok(Opt {
                    present: map.field_opt("present")?,
                    nil: map.field_opt("nil")?,
                    absent: map.field_opt("absent")?,
                })
            }
        }
        // {"present": 5, "nil": nil}
        let data = [
            0x82, 0xa7, b'p', b'r', b'e', b's', b'e', b'n', b't', 0x05, 0xa3, b'n', b'i', b'l',
            0xc0,
        ];
        let opt = decode::<Opt>(&data).unwrap();
        assert_eq!(opt.present, Some(5));
        assert_eq!(opt.nil, None);
        assert_eq!(opt.absent, None);
    }

    #[test]
    fn map_leaves_parent_cursor_past_record() {
        struct Pair {
            first: u8,
            second: u8,
        }
        impl Unpack for Pair {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let mut seq = dec.seq()?;
                struct Inner(u8);
                impl Unpack for Inner {
                    fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                        let mut map = dec.map()?;
                        Ok(Inner(map.field("v")?))
                    }
                }
                let first = seq.element::<Inner>()?.0;
                let second = seq.element()?;
                Ok(Pair { first, second })
            }
        }
        // [{"v": 9}, 4]
        let data = [0x92, 0x81, 0xa1, b'v', 0x09, 0x04];
        let pair = decode::<Pair>(&data).unwrap();
        assert_eq!(pair.first, 9);
        assert_eq!(pair.second, 4);
    }

    #[test]
    fn type_mismatch_carries_path() {
        #[derive(Debug)]
        struct Wrong;
        impl Unpack for Wrong {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let mut seq = dec.seq()?;
                let _: bool = seq.element()?;
                let _: bool = seq.element()?;
                Ok(Wrong)
            }
        }
        // [true, 7]: the second element is not a bool.
        let err = decode::<Wrong>(&[0x92, 0xc3, 0x07]).unwrap_err();
        match err {
            DecodeError::TypeMismatch {
                expected,
                found,
                path,
            } => {
                assert_eq!(expected, "bool");
                assert_eq!(found, 0x07);
                assert_eq!(path, "$[1]");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn seq_super_decoder_shares_cursor() {
        struct Layered {
            tag: u8,
            inner: u8,
        }
        impl Unpack for Layered {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let mut seq = dec.seq()?;
                let tag = seq.element()?;
                let inner = {
                    let mut sub = seq.super_decoder()?;
                    sub.decode_u8()?
                };
                Ok(Layered { tag, inner })
            }
        }
        let layered = decode::<Layered>(&[0x92, 0x01, 0x02]).unwrap();
        assert_eq!(layered.tag, 1);
        assert_eq!(layered.inner, 2);
    }

    #[test]
    fn map_super_decoder_restores_window() {
        struct Two {
            x: u8,
            y: u8,
        }
        impl Unpack for Two {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let mut map = dec.map()?;
                let x = {
                    let mut sub = map.super_decoder("x")?;
                    sub.decode_u8()?
                };
                let y = map.field("y")?;
                Ok(Two { x, y })
            }
        }
        let data = [0x82, 0xa1, b'x', 0x0a, 0xa1, b'y', 0x0b];
        let two = decode::<Two>(&data).unwrap();
        assert_eq!(two.x, 10);
        assert_eq!(two.y, 11);
    }

    #[test]
    fn truncated_input_is_typed_eof() {
        let err = decode::<String>(&[0xa5, b'h', b'i']).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
        let err = decode::<u32>(&[0xce, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
    }

    #[test]
    fn unsupported_extension_is_typed() {
        let err = decode::<std::time::SystemTime>(&[0xd7, 0x00, 0, 0, 0, 0, 0, 0, 0, 0])
            .unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported { .. }));
    }

    #[test]
    fn non_string_map_key_is_rejected() {
        #[derive(Debug)]
        struct Any;
        impl Unpack for Any {
            fn unpack(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                dec.map()?;
                Ok(Any)
            }
        }
        // {1: 2}, an integer key.
        let err = decode::<Any>(&[0x81, 0x01, 0x02]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TypeMismatch {
                expected: "string",
                ..
            }
        ));
    }
}
