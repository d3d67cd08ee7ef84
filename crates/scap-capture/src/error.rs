//! Session and assertion errors.

use scap_common::error::ScapError;
use scap_common::types::{Direction, SyscallId};
use scap_event::DecodeError;
use thiserror::Error;

/// Failure of a capture session lifecycle operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `enable` was called on an active session, or the snaplen was changed
    /// while capturing.
    #[error("capture session is already active")]
    AlreadyActive,

    /// `disable` was called on an idle session.
    #[error("capture session is not active")]
    NotActive,

    /// The configuration handed to the session is out of range.
    #[error("invalid capture configuration: {source}")]
    InvalidConfig {
        /// Underlying validation error.
        #[from]
        source: ScapError,
    },

    /// The encoder thread could not be started.
    #[error("failed to spawn encoder thread: {source}")]
    Spawn {
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The encoder thread panicked; records of the window are lost.
    #[error("encoder thread panicked")]
    WorkerPanicked,
}

/// A failed check on captured events.
#[derive(Debug, Error)]
pub enum CheckError {
    /// A session lifecycle call failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No record of the expected kind was captured.
    #[error("no {syscall_id} {direction} event among {captured} captured records")]
    EventMissing {
        /// Expected syscall.
        syscall_id: SyscallId,
        /// Expected direction.
        direction: Direction,
        /// Number of records captured in the window.
        captured: usize,
    },

    /// A parameter check ran before `parse_event`.
    #[error("no event has been parsed yet")]
    NotParsed,

    /// The captured record could not be decoded.
    #[error("event could not be decoded: {source}")]
    Decode {
        /// Underlying decoder error.
        #[from]
        source: DecodeError,
    },

    /// A header field holds an unexpected value.
    #[error("header field {field}: expected {expected}, found {found}")]
    Header {
        /// Name of the field.
        field: &'static str,
        /// Expected value.
        expected: String,
        /// Actual value.
        found: String,
    },

    /// A numeric parameter holds an unexpected value.
    #[error("parameter {index}: expected numeric {expected}, found {found}")]
    Numeric {
        /// 1-based position.
        index: usize,
        /// Expected value.
        expected: i64,
        /// Actual value.
        found: i64,
    },

    /// A buffer parameter holds unexpected bytes or length.
    #[error("parameter {index}: {detail}")]
    Buffer {
        /// 1-based position.
        index: usize,
        /// What differed.
        detail: String,
    },

    /// A parameter expected to be empty carries a payload.
    #[error("parameter {index}: expected empty, found {found}")]
    NotEmpty {
        /// 1-based position.
        index: usize,
        /// Variant actually present.
        found: &'static str,
    },

    /// The event carries an unexpected number of parameters.
    #[error("expected {expected} parameters pushed, found {found}")]
    ParamCount {
        /// Expected count.
        expected: usize,
        /// Actual count.
        found: usize,
    },
}
