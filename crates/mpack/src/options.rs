//! Per-call codec configuration.
//!
//! Options are plain immutable values handed to each `encode`/`decode`
//! call; the engines hold no process-wide mutable state.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How timestamps are written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampStrategy {
    /// Whole seconds since the Unix epoch in a fixext4 extension; values
    /// that do not fit a `u32` exactly are written as nil.
    // TODO: a seconds-and-nanoseconds variant once the 96-bit timestamp
    // extension is needed by a consumer.
    #[default]
    SecondsSince1970,
}

/// How a raw byte payload ([`Bytes`](crate::Bytes)) is written to the wire.
///
/// Both renderings are valid MessagePack; decoding accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteSliceStrategy {
    /// The bin8/bin16/bin32 family.
    #[default]
    Binary,
    /// An ordinary sequence of individually tagged integers.
    Array,
}

/// An opaque key/value bag passed through to per-type codec logic.
///
/// The engines never interpret the contents; types implementing
/// [`Pack`](crate::Pack) or [`Unpack`](crate::Unpack) can read it through
/// the encoder's or decoder's `options()`.
#[derive(Clone, Default)]
pub struct Context {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under `key`, replacing any previous entry.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// Looks up the value stored under `key`, if it has the requested type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref())
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Configuration consumed by one encode call.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    pub timestamp: TimestampStrategy,
    pub byte_slices: ByteSliceStrategy,
    pub context: Context,
}

/// Configuration consumed by one decode call.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub context: Context,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_roundtrip_by_type() {
        let mut ctx = Context::new();
        ctx.insert("limit", 42usize);
        ctx.insert("name", "abc".to_string());
        assert_eq!(ctx.get::<usize>("limit"), Some(&42));
        assert_eq!(ctx.get::<String>("name"), Some(&"abc".to_string()));
        // Wrong type for the key yields nothing.
        assert_eq!(ctx.get::<u32>("limit"), None);
        assert_eq!(ctx.len(), 2);
    }
}
