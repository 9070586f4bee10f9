//! MessagePack marker constants and shared width thresholds.
//!
//! Both directions of the codec consult this table: the wire writers pick
//! headers by the length thresholds below, and the wire readers classify
//! incoming bytes against the same markers, so the two can never disagree
//! about where a width boundary sits.

/// Nil.
pub const NIL: u8 = 0xc0;
/// Reserved by the format specification, never emitted.
pub const UNUSED: u8 = 0xc1;
/// Boolean false.
pub const FALSE: u8 = 0xc2;
/// Boolean true.
pub const TRUE: u8 = 0xc3;
/// Binary blob, 8-bit length.
pub const BIN8: u8 = 0xc4;
/// Binary blob, 16-bit length.
pub const BIN16: u8 = 0xc5;
/// Binary blob, 32-bit length.
pub const BIN32: u8 = 0xc6;
/// Extension, 8-bit length.
pub const EXT8: u8 = 0xc7;
/// Extension, 16-bit length.
pub const EXT16: u8 = 0xc8;
/// Extension, 32-bit length.
pub const EXT32: u8 = 0xc9;
/// IEEE-754 single precision float.
pub const FLOAT32: u8 = 0xca;
/// IEEE-754 double precision float.
pub const FLOAT64: u8 = 0xcb;
/// Unsigned 8-bit integer.
pub const UINT8: u8 = 0xcc;
/// Unsigned 16-bit integer.
pub const UINT16: u8 = 0xcd;
/// Unsigned 32-bit integer.
pub const UINT32: u8 = 0xce;
/// Unsigned 64-bit integer.
pub const UINT64: u8 = 0xcf;
/// Signed 8-bit integer.
pub const INT8: u8 = 0xd0;
/// Signed 16-bit integer.
pub const INT16: u8 = 0xd1;
/// Signed 32-bit integer.
pub const INT32: u8 = 0xd2;
/// Signed 64-bit integer.
pub const INT64: u8 = 0xd3;
/// Fixed 1-byte extension.
pub const FIXEXT1: u8 = 0xd4;
/// Fixed 2-byte extension.
pub const FIXEXT2: u8 = 0xd5;
/// Fixed 4-byte extension (carries the 32-bit timestamp).
pub const FIXEXT4: u8 = 0xd6;
/// Fixed 8-byte extension.
pub const FIXEXT8: u8 = 0xd7;
/// Fixed 16-byte extension.
pub const FIXEXT16: u8 = 0xd8;
/// String, 8-bit length.
pub const STR8: u8 = 0xd9;
/// String, 16-bit length.
pub const STR16: u8 = 0xda;
/// String, 32-bit length.
pub const STR32: u8 = 0xdb;
/// Array, 16-bit count.
pub const ARRAY16: u8 = 0xdc;
/// Array, 32-bit count.
pub const ARRAY32: u8 = 0xdd;
/// Map, 16-bit count.
pub const MAP16: u8 = 0xde;
/// Map, 32-bit count.
pub const MAP32: u8 = 0xdf;

/// Base marker for fixmap (`0x80 | count`).
pub const FIXMAP: u8 = 0x80;
/// Base marker for fixarray (`0x90 | count`).
pub const FIXARRAY: u8 = 0x90;
/// Base marker for fixstr (`0xa0 | length`).
pub const FIXSTR: u8 = 0xa0;
/// First negative fixint (`-32` in two's complement).
pub const NEG_FIXINT_MIN: u8 = 0xe0;

/// Extension type byte of the 32-bit timestamp (`-1`).
pub const TIMESTAMP_EXT_TYPE: u8 = 0xff;

/// Largest value encodable as a positive fixint.
pub const POS_FIXINT_MAX: u8 = 0x7f;
/// Smallest value encodable as a negative fixint.
pub const NEG_FIXINT_LOW: i64 = -0x20;
/// Largest UTF-8 byte length encodable as a fixstr.
pub const FIXSTR_MAX_LEN: usize = 0x1f;
/// Largest element count encodable as a fixarray or fixmap.
pub const FIX_COLLECTION_MAX: usize = 0xf;

/// True for the three binary blob markers.
pub fn is_bin(marker: u8) -> bool {
    matches!(marker, BIN8 | BIN16 | BIN32)
}

/// True for any array marker (fixarray or array16/array32).
pub fn is_array(marker: u8) -> bool {
    (FIXARRAY..=0x9f).contains(&marker) || matches!(marker, ARRAY16 | ARRAY32)
}

/// True for any map marker (fixmap or map16/map32).
pub fn is_map(marker: u8) -> bool {
    (FIXMAP..=0x8f).contains(&marker) || matches!(marker, MAP16 | MAP32)
}

/// True for any string marker (fixstr or str8/str16/str32).
pub fn is_str(marker: u8) -> bool {
    (FIXSTR..=0xbf).contains(&marker) || matches!(marker, STR8 | STR16 | STR32)
}
