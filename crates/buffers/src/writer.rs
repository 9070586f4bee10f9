//! Growable binary buffer writer.

/// A binary buffer writer. All multi-byte quantities are written big-endian.
///
/// # Example
///
/// ```
/// use mpack_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// assert_eq!(writer.into_bytes(), [0x01, 0x02, 0x03]);
/// ```
#[derive(Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates a writer with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A view of the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the writer and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.bytes.push(val);
    }

    /// Writes a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.bytes.push(val as u8);
    }

    /// Writes an unsigned 16-bit integer.
    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 16-bit integer.
    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes an unsigned 32-bit integer.
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 32-bit integer.
    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes an unsigned 64-bit integer.
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 64-bit integer.
    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a 32-bit float.
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a 64-bit float.
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a u8 followed by a u16.
    pub fn u8u16(&mut self, u8_val: u8, u16_val: u16) {
        self.bytes.push(u8_val);
        self.bytes.extend_from_slice(&u16_val.to_be_bytes());
    }

    /// Writes a u8 followed by a u32.
    pub fn u8u32(&mut self, u8_val: u8, u32_val: u32) {
        self.bytes.push(u8_val);
        self.bytes.extend_from_slice(&u32_val.to_be_bytes());
    }

    /// Writes a u8 followed by a u64.
    pub fn u8u64(&mut self, u8_val: u8, u64_val: u64) {
        self.bytes.push(u8_val);
        self.bytes.extend_from_slice(&u64_val.to_be_bytes());
    }

    /// Writes a u8 followed by an f32.
    pub fn u8f32(&mut self, u8_val: u8, f32_val: f32) {
        self.bytes.push(u8_val);
        self.bytes.extend_from_slice(&f32_val.to_be_bytes());
    }

    /// Writes a u8 followed by an f64.
    pub fn u8f64(&mut self, u8_val: u8, f64_val: f64) {
        self.bytes.push(u8_val);
        self.bytes.extend_from_slice(&f64_val.to_be_bytes());
    }

    /// Writes a byte slice verbatim.
    pub fn buf(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        let bytes = s.as_bytes();
        self.bytes.extend_from_slice(bytes);
        bytes.len()
    }
}
