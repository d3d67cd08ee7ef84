//! # scap-event
//!
//! Encoding and decoding of syscall event records.
//!
//! A record is a fixed 28-byte header followed by the event's parameters in
//! schema order. Each parameter is a one-byte type tag and its payload:
//! - **Numeric** parameters (`PT_ERRNO`, `PT_FD`, `PT_UINT64`) carry a
//!   little-endian `i64`.
//! - **Buffer** parameters (`PT_BYTEBUF`) carry a `u32` size and exactly that
//!   many bytes, never more than the configured snaplen.
//!
//! The [`schema`] table fixes the parameter list of every supported
//! `(syscall, direction)` pair; [`encoder`] and [`decoder`] both follow it.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod buffer;
pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod param;
pub mod record;
pub mod schema;
pub mod snaplen;

pub use buffer::EventBuffer;
pub use decoder::{ParsedEvent, parse};
pub use encoder::Encoder;
pub use error::{DecodeError, EncodeError};
pub use param::{ByteBuf, Parameter};
pub use record::{EventHeader, EventRecord, RawArg, RawSyscall};
