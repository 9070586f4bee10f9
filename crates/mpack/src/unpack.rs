//! The decode half of the per-type serialization contract.

use std::collections::HashMap;
use std::time::SystemTime;

use indexmap::IndexMap;

use crate::decoder::Decoder;
use crate::error::DecodeError;

/// A type that can decode itself through a [`Decoder`].
///
/// An implementation reads its state in the exact order it was declared
/// for encoding: sequences are positional, record fields are requested by
/// name.
pub trait Unpack: Sized {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError>;
}

impl Unpack for bool {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        decoder.decode_bool()
    }
}

macro_rules! unpack_int {
    ($($ty:ty => $method:ident),* $(,)?) => {
        $(
            impl Unpack for $ty {
                fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                    decoder.$method()
                }
            }
        )*
    };
}

unpack_int! {
    u8 => decode_u8,
    u16 => decode_u16,
    u32 => decode_u32,
    u64 => decode_u64,
    i8 => decode_i8,
    i16 => decode_i16,
    i32 => decode_i32,
    i64 => decode_i64,
    f32 => decode_f32,
    f64 => decode_f64,
}

impl Unpack for String {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        decoder.decode_str()
    }
}

impl<T: Unpack> Unpack for Option<T> {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        if decoder.decode_nil()? {
            Ok(None)
        } else {
            T::unpack(decoder).map(Some)
        }
    }
}

impl<T: Unpack> Unpack for Vec<T> {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let mut seq = decoder.seq()?;
        let mut out = Vec::with_capacity(seq.len().min(4096));
        while !seq.is_at_end() {
            out.push(seq.element()?);
        }
        Ok(out)
    }
}

impl Unpack for SystemTime {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        decoder.decode_timestamp()
    }
}

impl<V: Unpack> Unpack for IndexMap<String, V> {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let mut map = decoder.map()?;
        let mut out = IndexMap::with_capacity(map.len());
        for index in 0..map.len() {
            let (key, value) = map.entry_at(index)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

impl<V: Unpack> Unpack for HashMap<String, V> {
    fn unpack(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let mut map = decoder.map()?;
        let mut out = HashMap::with_capacity(map.len());
        for index in 0..map.len() {
            let (key, value) = map.entry_at(index)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}
