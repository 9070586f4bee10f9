//! The encoding engine: walks a value top-down by its declared shape,
//! building a container tree that the flattening pass serializes at the
//! end of the call.
//!
//! The engine enforces a stack discipline mirrored from the coding path:
//! at any path exactly one value (scalar fragment or container) may be
//! pushed. Violating this, by encoding two top-level values at one path,
//! is a bug in the caller's [`Pack`] implementation and panics rather
//! than returning an error.

use std::ops::{Deref, DerefMut};
use std::time::SystemTime;

use mpack_buffers::Writer;

use crate::error::EncodeError;
use crate::node::{self, Node};
use crate::options::{ByteSliceStrategy, EncodeOptions, TimestampStrategy};
use crate::pack::Pack;
use crate::path::{self, PathSegment};
use crate::wire;

/// Encodes a value to MessagePack bytes with default options.
pub fn encode<T: Pack + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    encode_with(value, &EncodeOptions::default())
}

/// Encodes a value to MessagePack bytes.
pub fn encode_with<T: Pack + ?Sized>(
    value: &T,
    options: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = Encoder::new(options.clone());
    let root = encoder.box_value(value)?;
    let mut writer = Writer::new();
    node::flatten(&root, &mut writer, &mut Vec::new())?;
    Ok(writer.into_bytes())
}

/// The encoding engine handed to [`Pack::pack`].
///
/// A `pack` implementation either pushes exactly one scalar through an
/// `encode_*` method, or opens exactly one container through
/// [`encode_map`](Encoder::encode_map) /
/// [`encode_seq`](Encoder::encode_seq). Opening a container of the same
/// kind a second time at the same path resumes the existing container,
/// which is how a subtype layers its fields onto a supertype's record.
pub struct Encoder {
    options: EncodeOptions,
    path: Vec<PathSegment>,
    /// Path length at which this engine's own stack starts; nonzero only
    /// for the engine inside a [`SubEncoder`].
    path_base: usize,
    stack: Vec<Node>,
}

impl Encoder {
    fn new(options: EncodeOptions) -> Self {
        Self {
            options,
            path: Vec::new(),
            path_base: 0,
            stack: Vec::new(),
        }
    }

    fn with_path(options: EncodeOptions, path: Vec<PathSegment>) -> Self {
        let path_base = path.len();
        Self {
            options,
            path,
            path_base,
            stack: Vec::new(),
        }
    }

    /// The options this encode call runs under, including the caller
    /// context bag.
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// The coding path of the value currently being encoded.
    pub fn coding_path(&self) -> &[PathSegment] {
        &self.path
    }

    fn path_string(&self) -> String {
        path::render(&self.path)
    }

    /// True while the slot at the current path is still empty.
    fn can_push(&self) -> bool {
        self.stack.len() == self.path.len() - self.path_base
    }

    fn push_scalar(&mut self, fragment: Vec<u8>) {
        assert!(
            self.can_push(),
            "attempt to encode a second value at already-encoded path {}",
            self.path_string()
        );
        self.stack.push(Node::Fragment(fragment));
    }

    /// Runs `value`'s encode logic one path level down and harvests the
    /// single node it produced; a value that encodes nothing becomes an
    /// empty record.
    fn box_value<T: Pack + ?Sized>(&mut self, value: &T) -> Result<Node, EncodeError> {
        let depth = self.stack.len();
        value.pack(self)?;
        Ok(if self.stack.len() > depth {
            self.stack.pop().expect("container stack underflow")
        } else {
            Node::Map(Vec::new())
        })
    }

    /// Encodes a nested value through its [`Pack`] implementation.
    pub fn encode_value<T: Pack + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.pack(self)
    }

    /// Pushes a nil scalar.
    pub fn encode_nil(&mut self) {
        self.push_scalar(fragment(wire::write_nil));
    }

    /// Pushes a boolean scalar.
    pub fn encode_bool(&mut self, value: bool) {
        self.push_scalar(fragment(|w| wire::write_bool(w, value)));
    }

    pub fn encode_u8(&mut self, value: u8) {
        self.push_scalar(fragment(|w| wire::write_u8(w, value)));
    }

    pub fn encode_u16(&mut self, value: u16) {
        self.push_scalar(fragment(|w| wire::write_u16(w, value)));
    }

    pub fn encode_u32(&mut self, value: u32) {
        self.push_scalar(fragment(|w| wire::write_u32(w, value)));
    }

    pub fn encode_u64(&mut self, value: u64) {
        self.push_scalar(fragment(|w| wire::write_u64(w, value)));
    }

    pub fn encode_i8(&mut self, value: i8) {
        self.push_scalar(fragment(|w| wire::write_i8(w, value)));
    }

    pub fn encode_i16(&mut self, value: i16) {
        self.push_scalar(fragment(|w| wire::write_i16(w, value)));
    }

    pub fn encode_i32(&mut self, value: i32) {
        self.push_scalar(fragment(|w| wire::write_i32(w, value)));
    }

    pub fn encode_i64(&mut self, value: i64) {
        self.push_scalar(fragment(|w| wire::write_i64(w, value)));
    }

    pub fn encode_f32(&mut self, value: f32) {
        self.push_scalar(fragment(|w| wire::write_f32(w, value)));
    }

    pub fn encode_f64(&mut self, value: f64) {
        self.push_scalar(fragment(|w| wire::write_f64(w, value)));
    }

    /// Pushes a string scalar.
    pub fn encode_str(&mut self, value: &str) -> Result<(), EncodeError> {
        let mut w = Writer::with_capacity(5 + value.len());
        wire::write_str(&mut w, value).map_err(|e| self.length_limit(e))?;
        self.push_scalar(w.into_bytes());
        Ok(())
    }

    /// Pushes a raw byte payload, rendered per the byte-slice strategy.
    pub fn encode_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        match self.options.byte_slices {
            ByteSliceStrategy::Binary => {
                let mut w = Writer::with_capacity(5 + value.len());
                wire::write_bin(&mut w, value).map_err(|e| self.length_limit(e))?;
                self.push_scalar(w.into_bytes());
                Ok(())
            }
            ByteSliceStrategy::Array => self.encode_seq(|seq| {
                for byte in value {
                    seq.element(byte)?;
                }
                Ok(())
            }),
        }
    }

    /// Pushes a timestamp scalar.
    ///
    /// Kept for wire compatibility: an instant with fractional seconds,
    /// before the epoch, or past `u32::MAX` seconds is encoded as nil
    /// rather than rejected.
    pub fn encode_timestamp(&mut self, value: SystemTime) {
        let frag = match self.options.timestamp {
            TimestampStrategy::SecondsSince1970 => fragment(|w| wire::write_timestamp(w, value)),
        };
        self.push_scalar(frag);
    }

    /// Opens (or resumes) the record container at the current path and
    /// runs `f` against it.
    pub fn encode_map<F>(&mut self, f: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut MapEncoder<'_>) -> Result<(), EncodeError>,
    {
        let at = self.open_map();
        f(&mut MapEncoder { encoder: self, at })
    }

    /// Opens (or resumes) the sequence container at the current path and
    /// runs `f` against it.
    pub fn encode_seq<F>(&mut self, f: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut SeqEncoder<'_>) -> Result<(), EncodeError>,
    {
        let at = self.open_seq();
        f(&mut SeqEncoder { encoder: self, at })
    }

    fn open_map(&mut self) -> usize {
        if self.can_push() {
            self.stack.push(Node::Map(Vec::new()));
        } else if !matches!(self.stack.last(), Some(Node::Map(_))) {
            panic!(
                "attempt to open a record container at already-encoded path {}",
                self.path_string()
            );
        }
        self.stack.len() - 1
    }

    fn open_seq(&mut self) -> usize {
        if self.can_push() {
            self.stack.push(Node::Seq(Vec::new()));
        } else if !matches!(self.stack.last(), Some(Node::Seq(_))) {
            panic!(
                "attempt to open a sequence container at already-encoded path {}",
                self.path_string()
            );
        }
        self.stack.len() - 1
    }

    fn length_limit(&self, err: wire::Oversize) -> EncodeError {
        EncodeError::LengthLimit {
            kind: err.kind,
            len: err.len,
            path: self.path_string(),
        }
    }
}

fn fragment(f: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut w = Writer::with_capacity(9);
    f(&mut w);
    w.into_bytes()
}

/// Appends named fields into one record container.
pub struct MapEncoder<'e> {
    encoder: &'e mut Encoder,
    at: usize,
}

impl MapEncoder<'_> {
    fn entries(&mut self) -> &mut Vec<(String, Node)> {
        match &mut self.encoder.stack[self.at] {
            Node::Map(entries) => entries,
            _ => unreachable!("record container slot holds a non-record node"),
        }
    }

    /// Number of fields appended so far.
    pub fn len(&self) -> usize {
        match &self.encoder.stack[self.at] {
            Node::Map(entries) => entries.len(),
            _ => unreachable!("record container slot holds a non-record node"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encodes `value` under `key`.
    pub fn field<T: Pack + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), EncodeError> {
        self.encoder.path.push(PathSegment::Key(key.to_owned()));
        let boxed = self.encoder.box_value(value);
        self.encoder.path.pop();
        self.entries().push((key.to_owned(), boxed?));
        Ok(())
    }

    /// Encodes an explicit nil under `key`.
    pub fn nil_field(&mut self, key: &str) {
        self.entries()
            .push((key.to_owned(), Node::Fragment(fragment(wire::write_nil))));
    }

    /// Encodes `value` under `key` when present; omits the key entirely
    /// when `None`.
    pub fn field_if_present<T: Pack>(
        &mut self,
        key: &str,
        value: &Option<T>,
    ) -> Result<(), EncodeError> {
        match value {
            Some(value) => self.field(key, value),
            None => Ok(()),
        }
    }

    /// Opens a nested record container bound to `key`.
    ///
    /// The partially-built child stays committed to the slot even when
    /// `f` fails, matching the eager slot binding of nested containers.
    pub fn map_field<F>(&mut self, key: &str, f: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut MapEncoder<'_>) -> Result<(), EncodeError>,
    {
        self.encoder.path.push(PathSegment::Key(key.to_owned()));
        self.encoder.stack.push(Node::Map(Vec::new()));
        let at = self.encoder.stack.len() - 1;
        let result = f(&mut MapEncoder {
            encoder: &mut *self.encoder,
            at,
        });
        let child = self.encoder.stack.pop().expect("container stack underflow");
        self.encoder.path.pop();
        self.entries().push((key.to_owned(), child));
        result
    }

    /// Opens a nested sequence container bound to `key`.
    pub fn seq_field<F>(&mut self, key: &str, f: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut SeqEncoder<'_>) -> Result<(), EncodeError>,
    {
        self.encoder.path.push(PathSegment::Key(key.to_owned()));
        self.encoder.stack.push(Node::Seq(Vec::new()));
        let at = self.encoder.stack.len() - 1;
        let result = f(&mut SeqEncoder {
            encoder: &mut *self.encoder,
            at,
        });
        let child = self.encoder.stack.pop().expect("container stack underflow");
        self.encoder.path.pop();
        self.entries().push((key.to_owned(), child));
        result
    }

    /// Returns a deferred encoder bound to `key`.
    ///
    /// The returned encoder commits whatever it built into this record's
    /// slot when it is finished or dropped, without this record knowing
    /// the shape of what will be written.
    pub fn super_encoder(&mut self, key: &str) -> SubEncoder<'_> {
        let options = self.encoder.options.clone();
        let mut path = self.encoder.path.clone();
        path.push(PathSegment::Key(key.to_owned()));
        let inner = Encoder::with_path(options, path);
        let entries = match &mut self.encoder.stack[self.at] {
            Node::Map(entries) => entries,
            _ => unreachable!("record container slot holds a non-record node"),
        };
        SubEncoder {
            inner,
            slot: Slot::Key {
                entries,
                key: key.to_owned(),
            },
            committed: false,
        }
    }
}

/// Appends ordered elements into one sequence container.
pub struct SeqEncoder<'e> {
    encoder: &'e mut Encoder,
    at: usize,
}

impl SeqEncoder<'_> {
    fn elements(&mut self) -> &mut Vec<Node> {
        match &mut self.encoder.stack[self.at] {
            Node::Seq(elements) => elements,
            _ => unreachable!("sequence container slot holds a non-sequence node"),
        }
    }

    /// Number of elements appended so far.
    pub fn len(&self) -> usize {
        match &self.encoder.stack[self.at] {
            Node::Seq(elements) => elements.len(),
            _ => unreachable!("sequence container slot holds a non-sequence node"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encodes the next element.
    pub fn element<T: Pack + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.encoder.path.push(PathSegment::Index(self.len()));
        let boxed = self.encoder.box_value(value);
        self.encoder.path.pop();
        self.elements().push(boxed?);
        Ok(())
    }

    /// Encodes an explicit nil element.
    pub fn nil_element(&mut self) {
        self.elements()
            .push(Node::Fragment(fragment(wire::write_nil)));
    }

    /// Opens a nested record container at the next index.
    pub fn map_element<F>(&mut self, f: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut MapEncoder<'_>) -> Result<(), EncodeError>,
    {
        self.encoder.path.push(PathSegment::Index(self.len()));
        self.encoder.stack.push(Node::Map(Vec::new()));
        let at = self.encoder.stack.len() - 1;
        let result = f(&mut MapEncoder {
            encoder: &mut *self.encoder,
            at,
        });
        let child = self.encoder.stack.pop().expect("container stack underflow");
        self.encoder.path.pop();
        self.elements().push(child);
        result
    }

    /// Opens a nested sequence container at the next index.
    pub fn seq_element<F>(&mut self, f: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut SeqEncoder<'_>) -> Result<(), EncodeError>,
    {
        self.encoder.path.push(PathSegment::Index(self.len()));
        self.encoder.stack.push(Node::Seq(Vec::new()));
        let at = self.encoder.stack.len() - 1;
        let result = f(&mut SeqEncoder {
            encoder: &mut *self.encoder,
            at,
        });
        let child = self.encoder.stack.pop().expect("container stack underflow");
        self.encoder.path.pop();
        self.elements().push(child);
        result
    }

    /// Returns a deferred encoder bound to the next index.
    pub fn super_encoder(&mut self) -> SubEncoder<'_> {
        let options = self.encoder.options.clone();
        let index = self.len();
        let mut path = self.encoder.path.clone();
        path.push(PathSegment::Index(index));
        let inner = Encoder::with_path(options, path);
        let elements = match &mut self.encoder.stack[self.at] {
            Node::Seq(elements) => elements,
            _ => unreachable!("sequence container slot holds a non-sequence node"),
        };
        SubEncoder {
            inner,
            slot: Slot::Index { elements, index },
            committed: false,
        }
    }
}

enum Slot<'p> {
    Key {
        entries: &'p mut Vec<(String, Node)>,
        key: String,
    },
    Index {
        elements: &'p mut Vec<Node>,
        index: usize,
    },
}

/// A deferred encoder bound to one slot of an ancestor container.
///
/// Dereferences to [`Encoder`], so a value can encode into it directly.
/// On every exit path, [`finish`](SubEncoder::finish) or drop, it
/// commits its built content into the parent slot: the single value it
/// built, or an empty record when nothing was written.
pub struct SubEncoder<'p> {
    inner: Encoder,
    slot: Slot<'p>,
    committed: bool,
}

impl SubEncoder<'_> {
    /// Commits the built content into the parent slot.
    pub fn finish(mut self) {
        self.commit();
    }

    fn commit(&mut self) {
        if self.committed {
            return;
        }
        self.committed = true;
        let node = match self.inner.stack.len() {
            0 => Node::Map(Vec::new()),
            1 => self.inner.stack.pop().expect("container stack underflow"),
            _ => panic!(
                "deferred encoder finished with multiple values at {}",
                self.inner.path_string()
            ),
        };
        match &mut self.slot {
            Slot::Key { entries, key } => entries.push((std::mem::take(key), node)),
            Slot::Index { elements, index } => elements.insert(*index, node),
        }
    }
}

impl Drop for SubEncoder<'_> {
    fn drop(&mut self) {
        self.commit();
    }
}

impl Deref for SubEncoder<'_> {
    type Target = Encoder;

    fn deref(&self) -> &Encoder {
        &self.inner
    }
}

impl DerefMut for SubEncoder<'_> {
    fn deref_mut(&mut self) -> &mut Encoder {
        &mut self.inner
    }
}
