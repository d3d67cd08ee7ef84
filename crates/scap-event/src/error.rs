//! Error types for event encoding and decoding.

use scap_common::types::{Direction, ParamType, SyscallId};
use thiserror::Error;

/// Failure to decode a raw record or one of its parameters.
///
/// Parameter indices are 1-based. An index of `0` means the failure was
/// raised by the codec before the decoder attached a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The fixed-size header is missing, inconsistent, or names an unknown event.
    #[error("bad event header: {reason}")]
    BadHeader {
        /// What was wrong with the header.
        reason: String,
    },

    /// A parameter needs more bytes than the record holds.
    #[error("parameter {index} truncated: needs {needed} bytes, {available} available")]
    Truncated {
        /// Position of the parameter.
        index: usize,
        /// Bytes required to finish decoding the parameter.
        needed: usize,
        /// Bytes left in the record.
        available: usize,
    },

    /// A parameter carries a type tag that no schema uses.
    #[error("parameter {index} has unknown type tag {tag:#04x}")]
    UnknownType {
        /// Position of the parameter.
        index: usize,
        /// Raw tag byte.
        tag: u8,
    },

    /// The record holds a different number of parameters than its schema declares.
    #[error("parameter count mismatch: schema declares {expected}, record has {found}")]
    ParamCountMismatch {
        /// Count declared by the schema.
        expected: usize,
        /// Count present in the record.
        found: usize,
    },

    /// A parameter is not of the requested type.
    #[error("parameter {index}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Position of the parameter.
        index: usize,
        /// Type or kind that was requested.
        expected: &'static str,
        /// Type actually present.
        found: ParamType,
    },

    /// A positional accessor addressed a parameter that does not exist.
    #[error("no parameter {index}: event has {count} parameters")]
    NoSuchParam {
        /// Requested position.
        index: usize,
        /// Number of decoded parameters.
        count: usize,
    },
}

impl DecodeError {
    /// Attaches a parameter position to a codec-level error.
    #[must_use]
    pub fn at(self, position: usize) -> Self {
        match self {
            Self::Truncated {
                needed, available, ..
            } => Self::Truncated {
                index: position,
                needed,
                available,
            },
            Self::UnknownType { tag, .. } => Self::UnknownType {
                index: position,
                tag,
            },
            Self::TypeMismatch {
                expected, found, ..
            } => Self::TypeMismatch {
                index: position,
                expected,
                found,
            },
            other => other,
        }
    }

    pub(crate) fn bad_header(reason: impl Into<String>) -> Self {
        Self::BadHeader {
            reason: reason.into(),
        }
    }
}

/// Failure to turn a syscall occurrence into a record.
///
/// None of these are fatal to the tracer: the occurrence is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// No capture session is active; the occurrence was dropped.
    #[error("no active capture session")]
    NoActiveSession,

    /// The queue towards the encoder is full; the occurrence was dropped.
    #[error("capture queue is full")]
    QueueFull,

    /// No schema exists for this syscall and direction.
    #[error("no event schema for {syscall_id} {direction}")]
    UnknownSchema {
        /// Syscall of the occurrence.
        syscall_id: SyscallId,
        /// Direction of the occurrence.
        direction: Direction,
    },

    /// A raw argument required by the schema is absent or of the wrong shape.
    #[error("parameter {slot}: raw argument {arg} is missing or not a {wanted}")]
    MissingArgument {
        /// Name of the schema slot being filled.
        slot: &'static str,
        /// Raw argument index.
        arg: usize,
        /// Shape the slot needs.
        wanted: &'static str,
    },

    /// A parameter value does not fit the declared slot type.
    #[error("cannot encode {value} as {ty}")]
    KindMismatch {
        /// Declared slot type.
        ty: ParamType,
        /// Kind of value that was supplied.
        value: &'static str,
    },

    /// A buffer is too large for the `u32` size prefix.
    #[error("buffer of {len} bytes exceeds the wire size limit")]
    Oversized {
        /// Length of the buffer.
        len: usize,
    },
}
