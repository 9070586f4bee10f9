//! The encode half of the per-type serialization contract.

use std::collections::HashMap;
use std::time::SystemTime;

use indexmap::IndexMap;

use crate::encoder::Encoder;
use crate::error::EncodeError;

/// A type that can encode itself through an [`Encoder`].
///
/// An implementation enumerates its state in a fixed order: either one
/// scalar through an `encode_*` call, or one container whose fields and
/// elements are appended in declaration order. The engine consumes this
/// contract; it never inspects a type's layout.
pub trait Pack {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError>;
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        (**self).pack(encoder)
    }
}

impl Pack for bool {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.encode_bool(*self);
        Ok(())
    }
}

macro_rules! pack_int {
    ($($ty:ty => $method:ident),* $(,)?) => {
        $(
            impl Pack for $ty {
                fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
                    encoder.$method(*self);
                    Ok(())
                }
            }
        )*
    };
}

pack_int! {
    u8 => encode_u8,
    u16 => encode_u16,
    u32 => encode_u32,
    u64 => encode_u64,
    i8 => encode_i8,
    i16 => encode_i16,
    i32 => encode_i32,
    i64 => encode_i64,
    f32 => encode_f32,
    f64 => encode_f64,
}

impl Pack for str {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.encode_str(self)
    }
}

impl Pack for String {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.encode_str(self)
    }
}

impl<T: Pack> Pack for Option<T> {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            Some(value) => value.pack(encoder),
            None => {
                encoder.encode_nil();
                Ok(())
            }
        }
    }
}

impl<T: Pack> Pack for [T] {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.encode_seq(|seq| {
            for value in self {
                seq.element(value)?;
            }
            Ok(())
        })
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        self.as_slice().pack(encoder)
    }
}

impl Pack for SystemTime {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.encode_timestamp(*self);
        Ok(())
    }
}

/// Deterministic wire bytes: entries are encoded in insertion order, each
/// value committed through a deferred encoder bound to its key slot.
impl<V: Pack> Pack for IndexMap<String, V> {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.encode_map(|map| {
            for (key, value) in self {
                let mut sub = map.super_encoder(key);
                sub.encode_value(value)?;
                sub.finish();
            }
            Ok(())
        })
    }
}

/// Entry order on the wire is unspecified, following the backing map's
/// iteration order. Use [`IndexMap`] for byte-deterministic output.
impl<V: Pack> Pack for HashMap<String, V> {
    fn pack(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.encode_map(|map| {
            for (key, value) in self {
                map.field(key, value)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;

    #[test]
    fn option_encodes_nil_and_value() {
        assert_eq!(encode(&None::<u8>).unwrap(), vec![0xc0]);
        assert_eq!(encode(&Some(5u8)).unwrap(), vec![0x05]);
    }

    #[test]
    fn vec_of_u8_is_a_plain_sequence() {
        // A Vec<u8> goes through the generic sequence impl; only the
        // Bytes newtype selects the binary opcodes.
        assert_eq!(encode(&vec![1u8, 2, 3]).unwrap(), vec![0x93, 1, 2, 3]);
    }

    #[test]
    fn nested_vec() {
        let v = vec![vec![1u8], vec![2, 3]];
        assert_eq!(
            encode(&v).unwrap(),
            vec![0x92, 0x91, 0x01, 0x92, 0x02, 0x03]
        );
    }

    #[test]
    fn index_map_is_insertion_ordered() {
        let mut map = IndexMap::new();
        map.insert("z".to_string(), 1u8);
        map.insert("a".to_string(), 2u8);
        assert_eq!(
            encode(&map).unwrap(),
            vec![0x82, 0xa1, b'z', 0x01, 0xa1, b'a', 0x02]
        );
    }

    #[test]
    fn empty_maps() {
        let map: IndexMap<String, u8> = IndexMap::new();
        assert_eq!(encode(&map).unwrap(), vec![0x80]);
        let map: HashMap<String, u8> = HashMap::new();
        assert_eq!(encode(&map).unwrap(), vec![0x80]);
    }
}
