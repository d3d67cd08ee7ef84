//! Parameter codec.
//!
//! Wire form of a parameter is `tag u8 | payload`:
//! - numeric types: `i64` little-endian;
//! - `PT_BYTEBUF`: `size u32` little-endian followed by `size` bytes.
//!
//! [`Parameter::Empty`] is written as a `PT_BYTEBUF` of size zero, and a
//! size-zero `PT_BYTEBUF` always decodes as [`Parameter::Empty`]. The
//! original length of a truncated buffer is not persisted: decoded buffers
//! report `original_len() == captured_len()`.

use scap_common::constants::{BUFFER_LEN_SIZE, NUMERIC_SIZE, TAG_SIZE};
use scap_common::types::ParamType;

use crate::error::{DecodeError, EncodeError};
use crate::param::{ByteBuf, Parameter};

/// Number of bytes `param` occupies on the wire.
#[must_use]
pub fn encoded_len(param: &Parameter<'_>) -> usize {
    match param {
        Parameter::Numeric { .. } => TAG_SIZE + NUMERIC_SIZE,
        Parameter::ByteBuffer(buf) => TAG_SIZE + BUFFER_LEN_SIZE + buf.captured_len(),
        Parameter::Empty => TAG_SIZE + BUFFER_LEN_SIZE,
    }
}

/// Appends the wire form of `param`, declared as `ty`, to `out`.
///
/// # Errors
///
/// Returns `EncodeError::KindMismatch` if the value does not fit the declared
/// type, or `EncodeError::Oversized` if a buffer exceeds the `u32` size field.
pub fn encode(ty: ParamType, param: &Parameter<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (param, ty.is_numeric()) {
        (Parameter::Numeric { value }, true) => {
            out.push(ty.tag());
            out.extend_from_slice(&value.to_le_bytes());
        }
        (Parameter::ByteBuffer(buf), false) => {
            let len = u32::try_from(buf.captured_len()).map_err(|_| EncodeError::Oversized {
                len: buf.captured_len(),
            })?;
            out.push(ty.tag());
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(buf.bytes());
        }
        (Parameter::Empty, false) => {
            out.push(ty.tag());
            out.extend_from_slice(&0u32.to_le_bytes());
        }
        (other, _) => {
            return Err(EncodeError::KindMismatch {
                ty,
                value: other.kind_name(),
            });
        }
    }
    Ok(())
}

/// Decodes one parameter from the front of `input`, whatever its type.
///
/// Returns the declared type, the value, and the number of bytes consumed.
///
/// # Errors
///
/// Returns `DecodeError::UnknownType` for an unrecognised tag, and
/// `DecodeError::Truncated` if the payload or declared size runs past the
/// end of `input`.
pub fn decode_any(input: &[u8]) -> Result<(ParamType, Parameter<'_>, usize), DecodeError> {
    let Some((&tag, rest)) = input.split_first() else {
        return Err(truncated(TAG_SIZE, 0));
    };
    let ty = ParamType::from_tag(tag).ok_or(DecodeError::UnknownType { index: 0, tag })?;

    if ty.is_numeric() {
        let payload = rest
            .get(..NUMERIC_SIZE)
            .ok_or_else(|| truncated(NUMERIC_SIZE, rest.len()))?;
        let mut b = [0u8; NUMERIC_SIZE];
        b.copy_from_slice(payload);
        let value = i64::from_le_bytes(b);
        return Ok((ty, Parameter::Numeric { value }, TAG_SIZE + NUMERIC_SIZE));
    }

    let prefix = rest
        .get(..BUFFER_LEN_SIZE)
        .ok_or_else(|| truncated(BUFFER_LEN_SIZE, rest.len()))?;
    let mut b = [0u8; BUFFER_LEN_SIZE];
    b.copy_from_slice(prefix);
    let size = u32::from_le_bytes(b) as usize;
    let body = &rest[BUFFER_LEN_SIZE..];
    let data = body.get(..size).ok_or_else(|| truncated(size, body.len()))?;

    let param = if data.is_empty() {
        Parameter::Empty
    } else {
        Parameter::ByteBuffer(ByteBuf::full(data))
    };
    Ok((ty, param, TAG_SIZE + BUFFER_LEN_SIZE + size))
}

/// Decodes one parameter of the `expected` type from the front of `input`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// Same as [`decode_any`], plus `DecodeError::TypeMismatch` if the tag on
/// the wire is not `expected`.
pub fn decode(input: &[u8], expected: ParamType) -> Result<(Parameter<'_>, usize), DecodeError> {
    let (found, param, used) = decode_any(input)?;
    if found != expected {
        return Err(DecodeError::TypeMismatch {
            index: 0,
            expected: expected.name(),
            found,
        });
    }
    Ok((param, used))
}

/// Owned variant of [`decode`].
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_owned(input: &[u8], expected: ParamType) -> Result<Parameter<'static>, DecodeError> {
    decode(input, expected).map(|(p, _)| p.into_owned())
}

/// Encodes `param` into a fresh buffer.
///
/// # Errors
///
/// Same as [`encode`].
pub fn to_bytes(ty: ParamType, param: &Parameter<'_>) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(encoded_len(param));
    encode(ty, param, &mut out)?;
    Ok(out)
}

const fn truncated(needed: usize, available: usize) -> DecodeError {
    DecodeError::Truncated {
        index: 0,
        needed,
        available,
    }
}
