//! # scap-capture
//!
//! Capture lifecycle for syscall events.
//!
//! - [`session::CaptureSession`] owns the `IDLE -> ACTIVE -> IDLE` lifecycle
//!   and the buffer of records produced while active.
//! - [`probe::Probe`] is the handle the interception layer reports syscall
//!   entries and exits through. Occurrences travel over a bounded queue to a
//!   single encoder thread, which is the only writer of the record buffer.
//! - [`trigger`] issues real syscalls and reports them to a probe.
//! - [`harness::EventTest`] checks captured events field by field.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod error;
pub mod harness;
pub mod probe;
pub mod session;
pub mod trigger;

pub use error::{CheckError, SessionError};
pub use harness::EventTest;
pub use probe::{Probe, UserArg};
pub use session::{CaptureSession, SessionStats};
