//! The byte formatter: minimal-width MessagePack encoding of single
//! scalars and collection headers, and the exact-marker inverse.
//!
//! Everything here is a pure function over a [`Writer`] or [`Reader`];
//! the traversal engines own all state. Integer writers narrow
//! recursively, so an N-bit value is always emitted as the narrowest form
//! that round-trips it exactly. Integer readers accept the fixint
//! ranges plus the markers of the target width and every narrower width
//! of the same signedness. A wider marker, or one of the other
//! signedness, is a mismatch rather than an automatic widen-down.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mpack_buffers::{BufferError, Reader, Writer};

use crate::constants::*;

/// A length that no MessagePack header can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Oversize {
    pub kind: &'static str,
    pub len: u64,
}

/// Internal decode failure, mapped onto `DecodeError` (with the coding
/// path attached) by the decoding engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WireError {
    Eof,
    Utf8,
    Mismatch { expected: &'static str, found: u8 },
    Unsupported { what: &'static str },
}

impl From<BufferError> for WireError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => WireError::Eof,
            BufferError::InvalidUtf8 => WireError::Utf8,
        }
    }
}

// ---------------------------------------------------------------- encode

pub(crate) fn write_nil(w: &mut Writer) {
    w.u8(NIL);
}

pub(crate) fn write_bool(w: &mut Writer, val: bool) {
    w.u8(if val { TRUE } else { FALSE });
}

pub(crate) fn write_u8(w: &mut Writer, val: u8) {
    if val <= POS_FIXINT_MAX {
        w.u8(val);
    } else {
        w.u16(((UINT8 as u16) << 8) | val as u16);
    }
}

pub(crate) fn write_u16(w: &mut Writer, val: u16) {
    if val <= u8::MAX as u16 {
        write_u8(w, val as u8);
    } else {
        w.u8u16(UINT16, val);
    }
}

pub(crate) fn write_u32(w: &mut Writer, val: u32) {
    if val <= u16::MAX as u32 {
        write_u16(w, val as u16);
    } else {
        w.u8u32(UINT32, val);
    }
}

pub(crate) fn write_u64(w: &mut Writer, val: u64) {
    if val <= u32::MAX as u64 {
        write_u32(w, val as u32);
    } else {
        w.u8u64(UINT64, val);
    }
}

pub(crate) fn write_i8(w: &mut Writer, val: i8) {
    if val >= NEG_FIXINT_LOW as i8 {
        // Positive or negative fixint, the two's-complement byte itself.
        w.i8(val);
    } else {
        w.u8(INT8);
        w.i8(val);
    }
}

pub(crate) fn write_i16(w: &mut Writer, val: i16) {
    if val >= i8::MIN as i16 && val <= i8::MAX as i16 {
        write_i8(w, val as i8);
    } else {
        w.u8(INT16);
        w.i16(val);
    }
}

pub(crate) fn write_i32(w: &mut Writer, val: i32) {
    if val >= i16::MIN as i32 && val <= i16::MAX as i32 {
        write_i16(w, val as i16);
    } else {
        w.u8(INT32);
        w.i32(val);
    }
}

pub(crate) fn write_i64(w: &mut Writer, val: i64) {
    if val >= i32::MIN as i64 && val <= i32::MAX as i64 {
        write_i32(w, val as i32);
    } else {
        w.u8(INT64);
        w.i64(val);
    }
}

/// Floats are always full-width, bit-exact; NaN payloads pass through.
pub(crate) fn write_f32(w: &mut Writer, val: f32) {
    w.u8f32(FLOAT32, val);
}

pub(crate) fn write_f64(w: &mut Writer, val: f64) {
    w.u8f64(FLOAT64, val);
}

pub(crate) fn write_str(w: &mut Writer, val: &str) -> Result<(), Oversize> {
    let len = val.len();
    if len <= FIXSTR_MAX_LEN {
        w.u8(FIXSTR | len as u8);
    } else if len <= u8::MAX as usize {
        w.u16(((STR8 as u16) << 8) | len as u16);
    } else if len <= u16::MAX as usize {
        w.u8u16(STR16, len as u16);
    } else if len <= u32::MAX as usize {
        w.u8u32(STR32, len as u32);
    } else {
        return Err(Oversize {
            kind: "string",
            len: len as u64,
        });
    }
    w.utf8(val);
    Ok(())
}

pub(crate) fn write_bin(w: &mut Writer, val: &[u8]) -> Result<(), Oversize> {
    let len = val.len();
    if len <= u8::MAX as usize {
        w.u16(((BIN8 as u16) << 8) | len as u16);
    } else if len <= u16::MAX as usize {
        w.u8u16(BIN16, len as u16);
    } else if len <= u32::MAX as usize {
        w.u8u32(BIN32, len as u32);
    } else {
        return Err(Oversize {
            kind: "binary blob",
            len: len as u64,
        });
    }
    w.buf(val);
    Ok(())
}

pub(crate) fn write_array_header(w: &mut Writer, count: usize) -> Result<(), Oversize> {
    if count <= FIX_COLLECTION_MAX {
        w.u8(FIXARRAY | count as u8);
    } else if count <= u16::MAX as usize {
        w.u8u16(ARRAY16, count as u16);
    } else if count <= u32::MAX as usize {
        w.u8u32(ARRAY32, count as u32);
    } else {
        return Err(Oversize {
            kind: "sequence",
            len: count as u64,
        });
    }
    Ok(())
}

pub(crate) fn write_map_header(w: &mut Writer, count: usize) -> Result<(), Oversize> {
    if count <= FIX_COLLECTION_MAX {
        w.u8(FIXMAP | count as u8);
    } else if count <= u16::MAX as usize {
        w.u8u16(MAP16, count as u16);
    } else if count <= u32::MAX as usize {
        w.u8u32(MAP32, count as u32);
    } else {
        return Err(Oversize {
            kind: "record",
            len: count as u64,
        });
    }
    Ok(())
}

/// Writes a 32-bit timestamp extension, or nil when the instant has
/// fractional seconds or does not fit an unsigned 32-bit seconds count.
///
/// The nil fallback is deliberately lossy rather than an error; decoders
/// see the value as absent.
pub(crate) fn write_timestamp(w: &mut Writer, val: SystemTime) {
    match val.duration_since(UNIX_EPOCH) {
        Ok(d) if d.subsec_nanos() == 0 && d.as_secs() <= u32::MAX as u64 => {
            w.u16(((FIXEXT4 as u16) << 8) | TIMESTAMP_EXT_TYPE as u16);
            w.u32(d.as_secs() as u32);
        }
        _ => w.u8(NIL),
    }
}

// ---------------------------------------------------------------- decode

/// Consumes the nil marker if it is next; never advances otherwise.
pub(crate) fn read_nil(r: &mut Reader<'_>) -> Result<bool, WireError> {
    if r.peek()? == NIL {
        r.skip(1)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

pub(crate) fn read_bool(r: &mut Reader<'_>) -> Result<bool, WireError> {
    match r.u8()? {
        FALSE => Ok(false),
        TRUE => Ok(true),
        found => Err(WireError::Mismatch {
            expected: "bool",
            found,
        }),
    }
}

pub(crate) fn read_u8(r: &mut Reader<'_>) -> Result<u8, WireError> {
    match r.u8()? {
        val @ 0x00..=POS_FIXINT_MAX => Ok(val),
        UINT8 => Ok(r.u8()?),
        found => Err(WireError::Mismatch {
            expected: "u8",
            found,
        }),
    }
}

pub(crate) fn read_u16(r: &mut Reader<'_>) -> Result<u16, WireError> {
    match r.u8()? {
        val @ 0x00..=POS_FIXINT_MAX => Ok(val as u16),
        UINT8 => Ok(r.u8()? as u16),
        UINT16 => Ok(r.u16()?),
        found => Err(WireError::Mismatch {
            expected: "u16",
            found,
        }),
    }
}

pub(crate) fn read_u32(r: &mut Reader<'_>) -> Result<u32, WireError> {
    match r.u8()? {
        val @ 0x00..=POS_FIXINT_MAX => Ok(val as u32),
        UINT8 => Ok(r.u8()? as u32),
        UINT16 => Ok(r.u16()? as u32),
        UINT32 => Ok(r.u32()?),
        found => Err(WireError::Mismatch {
            expected: "u32",
            found,
        }),
    }
}

pub(crate) fn read_u64(r: &mut Reader<'_>) -> Result<u64, WireError> {
    match r.u8()? {
        val @ 0x00..=POS_FIXINT_MAX => Ok(val as u64),
        UINT8 => Ok(r.u8()? as u64),
        UINT16 => Ok(r.u16()? as u64),
        UINT32 => Ok(r.u32()? as u64),
        UINT64 => Ok(r.u64()?),
        found => Err(WireError::Mismatch {
            expected: "u64",
            found,
        }),
    }
}

pub(crate) fn read_i8(r: &mut Reader<'_>) -> Result<i8, WireError> {
    match r.u8()? {
        val @ 0x00..=POS_FIXINT_MAX => Ok(val as i8),
        val @ NEG_FIXINT_MIN..=0xff => Ok(val as i8),
        INT8 => Ok(r.i8()?),
        found => Err(WireError::Mismatch {
            expected: "i8",
            found,
        }),
    }
}

pub(crate) fn read_i16(r: &mut Reader<'_>) -> Result<i16, WireError> {
    match r.u8()? {
        val @ 0x00..=POS_FIXINT_MAX => Ok(val as i16),
        val @ NEG_FIXINT_MIN..=0xff => Ok(val as i8 as i16),
        INT8 => Ok(r.i8()? as i16),
        INT16 => Ok(r.i16()?),
        found => Err(WireError::Mismatch {
            expected: "i16",
            found,
        }),
    }
}

pub(crate) fn read_i32(r: &mut Reader<'_>) -> Result<i32, WireError> {
    match r.u8()? {
        val @ 0x00..=POS_FIXINT_MAX => Ok(val as i32),
        val @ NEG_FIXINT_MIN..=0xff => Ok(val as i8 as i32),
        INT8 => Ok(r.i8()? as i32),
        INT16 => Ok(r.i16()? as i32),
        INT32 => Ok(r.i32()?),
        found => Err(WireError::Mismatch {
            expected: "i32",
            found,
        }),
    }
}

pub(crate) fn read_i64(r: &mut Reader<'_>) -> Result<i64, WireError> {
    match r.u8()? {
        val @ 0x00..=POS_FIXINT_MAX => Ok(val as i64),
        val @ NEG_FIXINT_MIN..=0xff => Ok(val as i8 as i64),
        INT8 => Ok(r.i8()? as i64),
        INT16 => Ok(r.i16()? as i64),
        INT32 => Ok(r.i32()? as i64),
        INT64 => Ok(r.i64()?),
        found => Err(WireError::Mismatch {
            expected: "i64",
            found,
        }),
    }
}

pub(crate) fn read_f32(r: &mut Reader<'_>) -> Result<f32, WireError> {
    match r.u8()? {
        FLOAT32 => Ok(r.f32()?),
        found => Err(WireError::Mismatch {
            expected: "f32",
            found,
        }),
    }
}

pub(crate) fn read_f64(r: &mut Reader<'_>) -> Result<f64, WireError> {
    match r.u8()? {
        FLOAT64 => Ok(r.f64()?),
        found => Err(WireError::Mismatch {
            expected: "f64",
            found,
        }),
    }
}

pub(crate) fn read_str(r: &mut Reader<'_>) -> Result<String, WireError> {
    let len = match r.u8()? {
        marker @ FIXSTR..=0xbf => (marker & 0x1f) as usize,
        STR8 => r.u8()? as usize,
        STR16 => r.u16()? as usize,
        STR32 => r.u32()? as usize,
        found => {
            return Err(WireError::Mismatch {
                expected: "string",
                found,
            })
        }
    };
    Ok(r.utf8(len)?.to_owned())
}

pub(crate) fn read_bin(r: &mut Reader<'_>) -> Result<Vec<u8>, WireError> {
    let len = match r.u8()? {
        BIN8 => r.u8()? as usize,
        BIN16 => r.u16()? as usize,
        BIN32 => r.u32()? as usize,
        found => {
            return Err(WireError::Mismatch {
                expected: "binary blob",
                found,
            })
        }
    };
    Ok(r.buf(len)?.to_vec())
}

pub(crate) fn read_array_header(r: &mut Reader<'_>) -> Result<usize, WireError> {
    match r.u8()? {
        marker @ FIXARRAY..=0x9f => Ok((marker & 0xf) as usize),
        ARRAY16 => Ok(r.u16()? as usize),
        ARRAY32 => Ok(r.u32()? as usize),
        found => Err(WireError::Mismatch {
            expected: "sequence",
            found,
        }),
    }
}

pub(crate) fn read_map_header(r: &mut Reader<'_>) -> Result<usize, WireError> {
    match r.u8()? {
        marker @ FIXMAP..=0x8f => Ok((marker & 0xf) as usize),
        MAP16 => Ok(r.u16()? as usize),
        MAP32 => Ok(r.u32()? as usize),
        found => Err(WireError::Mismatch {
            expected: "record",
            found,
        }),
    }
}

pub(crate) fn read_timestamp(r: &mut Reader<'_>) -> Result<SystemTime, WireError> {
    match r.u8()? {
        FIXEXT4 => {}
        FIXEXT1 | FIXEXT2 | FIXEXT8 | FIXEXT16 | EXT8 | EXT16 | EXT32 => {
            return Err(WireError::Unsupported {
                what: "extension type other than the 32-bit timestamp",
            })
        }
        found => {
            return Err(WireError::Mismatch {
                expected: "timestamp",
                found,
            })
        }
    }
    let ext_type = r.u8()?;
    if ext_type != TIMESTAMP_EXT_TYPE {
        return Err(WireError::Mismatch {
            expected: "timestamp",
            found: ext_type,
        });
    }
    let secs = r.u32()?;
    Ok(UNIX_EPOCH + Duration::from_secs(secs as u64))
}

/// Skips one whole encoded value, including nested containers.
pub(crate) fn skip_value(r: &mut Reader<'_>) -> Result<(), WireError> {
    let marker = r.u8()?;
    match marker {
        0x00..=0x7f | NEG_FIXINT_MIN..=0xff | NIL | UNUSED | FALSE | TRUE => Ok(()),
        FIXMAP..=0x8f => skip_map_entries(r, (marker & 0xf) as usize),
        FIXARRAY..=0x9f => skip_values(r, (marker & 0xf) as usize),
        FIXSTR..=0xbf => Ok(r.skip((marker & 0x1f) as usize)?),
        BIN8 => {
            let n = r.u8()? as usize;
            Ok(r.skip(n)?)
        }
        BIN16 => {
            let n = r.u16()? as usize;
            Ok(r.skip(n)?)
        }
        BIN32 => {
            let n = r.u32()? as usize;
            Ok(r.skip(n)?)
        }
        EXT8 => {
            let n = r.u8()? as usize;
            Ok(r.skip(n + 1)?)
        }
        EXT16 => {
            let n = r.u16()? as usize;
            Ok(r.skip(n + 1)?)
        }
        EXT32 => {
            let n = r.u32()? as usize;
            Ok(r.skip(n + 1)?)
        }
        FLOAT32 => Ok(r.skip(4)?),
        FLOAT64 => Ok(r.skip(8)?),
        UINT8 | INT8 => Ok(r.skip(1)?),
        UINT16 | INT16 => Ok(r.skip(2)?),
        UINT32 | INT32 => Ok(r.skip(4)?),
        UINT64 | INT64 => Ok(r.skip(8)?),
        FIXEXT1 => Ok(r.skip(2)?),
        FIXEXT2 => Ok(r.skip(3)?),
        FIXEXT4 => Ok(r.skip(5)?),
        FIXEXT8 => Ok(r.skip(9)?),
        FIXEXT16 => Ok(r.skip(17)?),
        STR8 => {
            let n = r.u8()? as usize;
            Ok(r.skip(n)?)
        }
        STR16 => {
            let n = r.u16()? as usize;
            Ok(r.skip(n)?)
        }
        STR32 => {
            let n = r.u32()? as usize;
            Ok(r.skip(n)?)
        }
        ARRAY16 => {
            let n = r.u16()? as usize;
            skip_values(r, n)
        }
        ARRAY32 => {
            let n = r.u32()? as usize;
            skip_values(r, n)
        }
        MAP16 => {
            let n = r.u16()? as usize;
            skip_map_entries(r, n)
        }
        MAP32 => {
            let n = r.u32()? as usize;
            skip_map_entries(r, n)
        }
    }
}

fn skip_values(r: &mut Reader<'_>, count: usize) -> Result<(), WireError> {
    for _ in 0..count {
        skip_value(r)?;
    }
    Ok(())
}

fn skip_map_entries(r: &mut Reader<'_>, count: usize) -> Result<(), WireError> {
    for _ in 0..count {
        skip_value(r)?;
        skip_value(r)?;
    }
    Ok(())
}
