//! Event decoder.
//!
//! Parsing checks the fixed header first and fails fast on a corrupt one.
//! Only then are parameters decoded, strictly in schema order. Decoded
//! buffers borrow from the input slice.

use scap_common::constants::HEADER_SIZE;
use scap_common::types::{Direction, ParamType, SyscallId};
use serde::Serialize;

use crate::codec;
use crate::error::DecodeError;
use crate::param::Parameter;
use crate::record::EventHeader;
use crate::schema::{self, EventSchema};

/// A decoded event borrowing its buffers from the raw record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedEvent<'a> {
    header: EventHeader,
    #[serde(skip)]
    schema: &'static EventSchema,
    params: Vec<Parameter<'a>>,
}

/// Parses one complete record.
///
/// # Errors
///
/// - `DecodeError::BadHeader` if the header is malformed or names an event
///   with no schema.
/// - `DecodeError::ParamCountMismatch` if the header count or the parameters
///   present disagree with the schema.
/// - `DecodeError::Truncated`, `UnknownType`, or `TypeMismatch` for a
///   malformed parameter, tagged with its 1-based position.
pub fn parse(raw: &[u8]) -> Result<ParsedEvent<'_>, DecodeError> {
    let header = EventHeader::parse(raw)?;
    let schema = schema::lookup(header.syscall_id, header.direction).ok_or_else(|| {
        DecodeError::BadHeader {
            reason: format!(
                "no schema for {} {}",
                header.syscall_id, header.direction
            ),
        }
    })?;

    let expected = schema.num_params();
    if header.nparams as usize != expected {
        return Err(DecodeError::ParamCountMismatch {
            expected,
            found: header.nparams as usize,
        });
    }

    let mut rest = &raw[HEADER_SIZE..];
    let mut params = Vec::with_capacity(expected);
    for (i, slot) in schema.params.iter().enumerate() {
        if rest.is_empty() {
            return Err(DecodeError::ParamCountMismatch { expected, found: i });
        }
        let (param, used) = codec::decode(rest, slot.ty).map_err(|e| e.at(i + 1))?;
        params.push(param);
        rest = &rest[used..];
    }

    if !rest.is_empty() {
        return Err(DecodeError::ParamCountMismatch {
            expected,
            found: expected + count_trailing(rest),
        });
    }

    tracing::trace!(
        syscall = %header.syscall_id,
        direction = %header.direction,
        nparams = expected,
        "parsed event"
    );
    Ok(ParsedEvent {
        header,
        schema,
        params,
    })
}

/// Counts the parameters left over after the schema was satisfied.
///
/// Undecodable leftovers count as one.
fn count_trailing(mut rest: &[u8]) -> usize {
    let mut count = 0;
    while !rest.is_empty() {
        count += 1;
        match codec::decode_any(rest) {
            Ok((_, _, used)) => rest = &rest[used..],
            Err(_) => break,
        }
    }
    count
}

impl<'a> ParsedEvent<'a> {
    /// Decoded header.
    #[must_use]
    pub const fn header(&self) -> &EventHeader {
        &self.header
    }

    /// Traced syscall.
    #[must_use]
    pub const fn syscall_id(&self) -> SyscallId {
        self.header.syscall_id
    }

    /// Entry or exit.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.header.direction
    }

    /// Schema the event was decoded against.
    #[must_use]
    pub const fn schema(&self) -> &'static EventSchema {
        self.schema
    }

    /// Number of decoded parameters.
    #[must_use]
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// Decoded parameters in wire order.
    #[must_use]
    pub fn params(&self) -> &[Parameter<'a>] {
        &self.params
    }

    /// Parameter at a 1-based position.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::NoSuchParam` if the position is out of range.
    pub fn param(&self, index: usize) -> Result<&Parameter<'a>, DecodeError> {
        index
            .checked_sub(1)
            .and_then(|i| self.params.get(i))
            .ok_or(DecodeError::NoSuchParam {
                index,
                count: self.params.len(),
            })
    }

    /// Value of the numeric parameter at a 1-based position.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::NoSuchParam` for a bad position and
    /// `DecodeError::TypeMismatch` if the slot is a buffer.
    pub fn numeric_param(&self, index: usize) -> Result<i64, DecodeError> {
        match self.param(index)? {
            Parameter::Numeric { value } => Ok(*value),
            Parameter::ByteBuffer(_) | Parameter::Empty => Err(self.mismatch(index, "numeric")),
        }
    }

    /// Captured bytes of the buffer parameter at a 1-based position.
    ///
    /// An [`Parameter::Empty`] slot yields an empty slice.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::NoSuchParam` for a bad position and
    /// `DecodeError::TypeMismatch` if the slot is numeric.
    pub fn buffer_param(&self, index: usize) -> Result<&[u8], DecodeError> {
        match self.param(index)? {
            Parameter::ByteBuffer(buf) => Ok(buf.bytes()),
            Parameter::Empty => Ok(&[]),
            Parameter::Numeric { .. } => Err(self.mismatch(index, "bytebuf")),
        }
    }

    /// Whether the parameter at a 1-based position is [`Parameter::Empty`].
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::NoSuchParam` if the position is out of range.
    pub fn is_empty_param(&self, index: usize) -> Result<bool, DecodeError> {
        self.param(index).map(Parameter::is_empty)
    }

    /// Detaches the event from the record it was parsed from.
    #[must_use]
    pub fn into_owned(self) -> ParsedEvent<'static> {
        ParsedEvent {
            header: self.header,
            schema: self.schema,
            params: self.params.into_iter().map(Parameter::into_owned).collect(),
        }
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> DecodeError {
        let found = self
            .schema
            .slot(index)
            .map_or(ParamType::ByteBuf, |s| s.ty);
        DecodeError::TypeMismatch {
            index,
            expected,
            found,
        }
    }
}
