//! In-memory parameter values.
//!
//! Decoded parameters borrow their buffer bytes from the record they were
//! parsed from; encoder-side parameters may borrow from the raw occurrence.

use std::borrow::Cow;

use serde::Serialize;

use crate::snaplen;

/// A single event parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Parameter<'a> {
    /// A fixed-width signed value: result code, descriptor, size, or offset.
    Numeric {
        /// Stored value. Failed results hold the negated errno.
        value: i64,
    },
    /// Captured bytes of a variable-length argument.
    ByteBuffer(ByteBuf<'a>),
    /// No payload, used when the syscall failed before producing data.
    Empty,
}

impl<'a> Parameter<'a> {
    /// Builds a numeric parameter.
    #[must_use]
    pub const fn numeric(value: i64) -> Self {
        Self::Numeric { value }
    }

    /// Builds a buffer parameter holding all of `data`.
    ///
    /// An empty slice yields [`Parameter::Empty`], which is the only
    /// representation a zero-length buffer has on the wire.
    #[must_use]
    pub fn buffer(data: &'a [u8]) -> Self {
        if data.is_empty() {
            Self::Empty
        } else {
            Self::ByteBuffer(ByteBuf::full(data))
        }
    }

    /// Returns the numeric value, if this is a numeric parameter.
    #[must_use]
    pub const fn as_numeric(&self) -> Option<i64> {
        match self {
            Self::Numeric { value } => Some(*value),
            _ => None,
        }
    }

    /// Returns the captured bytes, if this is a buffer parameter.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::ByteBuffer(buf) => Some(buf.bytes()),
            _ => None,
        }
    }

    /// Whether this is the [`Parameter::Empty`] state.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Numeric { .. } => "numeric",
            Self::ByteBuffer(_) => "bytebuf",
            Self::Empty => "empty",
        }
    }

    /// Detaches the parameter from the memory it borrows.
    #[must_use]
    pub fn into_owned(self) -> Parameter<'static> {
        match self {
            Self::Numeric { value } => Parameter::Numeric { value },
            Self::ByteBuffer(buf) => Parameter::ByteBuffer(buf.into_owned()),
            Self::Empty => Parameter::Empty,
        }
    }
}

/// Bytes captured from a buffer argument.
///
/// `captured_len()` never exceeds `original_len()`. Bytes past the captured
/// prefix are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteBuf<'a> {
    #[serde(serialize_with = "serialize_bytes")]
    data: Cow<'a, [u8]>,
    original_len: usize,
}

impl<'a> ByteBuf<'a> {
    /// Captures `data` in full.
    #[must_use]
    pub fn full(data: &'a [u8]) -> Self {
        Self {
            original_len: data.len(),
            data: Cow::Borrowed(data),
        }
    }

    /// Captures at most `limit` bytes of an argument that was `original_len`
    /// bytes long, of which `available` holds the leading part.
    #[must_use]
    pub fn captured(available: &'a [u8], original_len: usize, limit: usize) -> Self {
        let len = snaplen::capture_length(original_len, limit).min(available.len());
        Self {
            data: Cow::Borrowed(&available[..len]),
            original_len: original_len.max(len),
        }
    }

    /// The captured bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes actually captured.
    #[must_use]
    pub fn captured_len(&self) -> usize {
        self.data.len()
    }

    /// Length of the argument before capture.
    #[must_use]
    pub const fn original_len(&self) -> usize {
        self.original_len
    }

    /// Whether bytes were cut off by the snaplen.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.captured_len() < self.original_len
    }

    /// Detaches the buffer from the memory it borrows.
    #[must_use]
    pub fn into_owned(self) -> ByteBuf<'static> {
        ByteBuf {
            data: Cow::Owned(self.data.into_owned()),
            original_len: self.original_len,
        }
    }
}

fn serialize_bytes<S: serde::Serializer>(data: &Cow<'_, [u8]>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(data.iter())
}
