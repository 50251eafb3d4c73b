//! Byte View Module
//!
//! Immutable, cheaply clonable handle to cached bytes.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;

use crate::cache::Weigh;

// == Byte View ==
/// An immutable view of a cached value.
///
/// Cloning shares the underlying buffer; there is no way to mutate the bytes
/// through a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Creates a view holding its own copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    /// Returns the length of the value in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the value is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read-only slice of the value.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns an owned copy of the bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// The value as text, replacing invalid UTF-8 sequences.
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Returns the byte at offset `i`, or None if out of range.
    pub fn byte_at(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    /// Shared handle to the bytes, used for response bodies.
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(data),
        }
    }
}

impl From<&[u8]> for ByteView {
    fn from(data: &[u8]) -> Self {
        Self::copy_from_slice(data)
    }
}

impl From<&str> for ByteView {
    fn from(data: &str) -> Self {
        Self::copy_from_slice(data.as_bytes())
    }
}

impl From<String> for ByteView {
    fn from(data: String) -> Self {
        Self::from(data.into_bytes())
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str_lossy())
    }
}

impl Weigh for ByteView {
    fn weight(&self) -> usize {
        self.len()
    }
}
