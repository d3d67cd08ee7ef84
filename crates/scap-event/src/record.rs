//! Raw syscall occurrences and encoded event records.

use scap_common::constants::{
    HEADER_DIRECTION_OFFSET, HEADER_LEN_OFFSET, HEADER_NPARAMS_OFFSET, HEADER_RESERVED_OFFSET,
    HEADER_SIZE, HEADER_SYSCALL_OFFSET, HEADER_TID_OFFSET, HEADER_TS_OFFSET,
};
use scap_common::types::{Direction, SyscallId};
use serde::Serialize;

use crate::error::DecodeError;

/// A raw argument as delivered by the interception layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawArg {
    /// A register-sized scalar (descriptor, size, offset, pointer value).
    Scalar(u64),
    /// Bytes copied from the user buffer an argument points to.
    ///
    /// The interception layer may hand over only a snaplen-sized prefix.
    Buffer(Vec<u8>),
}

/// One syscall entry or exit observed by the interception layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSyscall {
    /// Syscall that was traced.
    pub syscall_id: SyscallId,
    /// Entry or exit.
    pub direction: Direction,
    /// Raw arguments, indexed like the syscall's C signature.
    pub args: Vec<RawArg>,
    /// Return value: non-negative on success, `-errno` on failure. Unused on entry.
    pub ret: i64,
    /// Timestamp in nanoseconds.
    pub timestamp_ns: u64,
    /// Thread that issued the syscall.
    pub tid: u64,
}

impl RawSyscall {
    /// Whether this is the exit of a failed syscall.
    #[must_use]
    pub const fn failed(&self) -> bool {
        matches!(self.direction, Direction::Exit) && self.ret < 0
    }
}

/// Fixed-size header at the start of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventHeader {
    /// Timestamp in nanoseconds.
    pub ts_ns: u64,
    /// Thread that issued the syscall.
    pub tid: u64,
    /// Total record length, header included.
    pub len: u32,
    /// Traced syscall.
    pub syscall_id: SyscallId,
    /// Entry or exit.
    pub direction: Direction,
    /// Number of parameters following the header.
    pub nparams: u32,
}

impl EventHeader {
    /// Appends the wire form of the header to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ts_ns.to_le_bytes());
        out.extend_from_slice(&self.tid.to_le_bytes());
        out.extend_from_slice(&self.len.to_le_bytes());
        out.extend_from_slice(&self.syscall_id.as_u16().to_le_bytes());
        out.push(self.direction.to_wire());
        out.push(0);
        out.extend_from_slice(&self.nparams.to_le_bytes());
    }

    /// Reads and validates the header at the start of `raw`.
    ///
    /// Only the header bytes are inspected; `len` must match the slice length.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::BadHeader` if the slice is shorter than a header,
    /// the length field disagrees with the slice, the reserved byte is set,
    /// or the direction byte is invalid.
    pub fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.len() < HEADER_SIZE {
            return Err(DecodeError::bad_header(format!(
                "record of {} bytes is shorter than the {HEADER_SIZE}-byte header",
                raw.len()
            )));
        }
        let len = read_u32(raw, HEADER_LEN_OFFSET);
        if len as usize != raw.len() {
            return Err(DecodeError::bad_header(format!(
                "length field {len} disagrees with record size {}",
                raw.len()
            )));
        }
        if raw[HEADER_RESERVED_OFFSET] != 0 {
            return Err(DecodeError::bad_header("reserved byte is not zero"));
        }
        let dir_raw = raw[HEADER_DIRECTION_OFFSET];
        let direction = Direction::from_wire(dir_raw)
            .ok_or_else(|| DecodeError::bad_header(format!("invalid direction byte {dir_raw}")))?;

        Ok(Self {
            ts_ns: read_u64(raw, HEADER_TS_OFFSET),
            tid: read_u64(raw, HEADER_TID_OFFSET),
            len,
            syscall_id: SyscallId::new(read_u16(raw, HEADER_SYSCALL_OFFSET)),
            direction,
            nparams: read_u32(raw, HEADER_NPARAMS_OFFSET),
        })
    }

    /// Reads the syscall and direction of a record without validating it.
    #[must_use]
    pub fn peek_kind(raw: &[u8]) -> Option<(SyscallId, Direction)> {
        if raw.len() < HEADER_SIZE {
            return None;
        }
        let direction = Direction::from_wire(raw[HEADER_DIRECTION_OFFSET])?;
        Some((SyscallId::new(read_u16(raw, HEADER_SYSCALL_OFFSET)), direction))
    }
}

/// An immutable, fully encoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    header: EventHeader,
    bytes: Vec<u8>,
}

impl EventRecord {
    pub(crate) const fn new(header: EventHeader, bytes: Vec<u8>) -> Self {
        Self { header, bytes }
    }

    /// Header of the record.
    #[must_use]
    pub const fn header(&self) -> &EventHeader {
        &self.header
    }

    /// Wire bytes of the record.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the record, returning its wire bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Total length of the record in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a record holds at least its header.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(b)
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> EventHeader {
        EventHeader {
            ts_ns: 1_700_000_000_000_000_000,
            tid: 4242,
            len: HEADER_SIZE as u32,
            syscall_id: SyscallId::WRITE,
            direction: Direction::Exit,
            nparams: 0,
        }
    }

    #[test]
    fn header_is_exactly_header_size() {
        let mut out = Vec::new();
        sample_header().write_to(&mut out);
        assert_eq!(out.len(), HEADER_SIZE);
        assert_eq!(EventHeader::parse(&out).unwrap(), sample_header());
    }

    #[test]
    fn short_slice_is_bad_header() {
        let err = EventHeader::parse(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, DecodeError::BadHeader { .. }));
    }

    #[test]
    fn length_field_must_match_slice() {
        let mut out = Vec::new();
        sample_header().write_to(&mut out);
        out.push(0);
        assert!(matches!(
            EventHeader::parse(&out),
            Err(DecodeError::BadHeader { .. })
        ));
    }

    #[test]
    fn invalid_direction_is_bad_header() {
        let mut out = Vec::new();
        sample_header().write_to(&mut out);
        out[HEADER_DIRECTION_OFFSET] = 7;
        let err = EventHeader::parse(&out).unwrap_err();
        assert!(err.to_string().contains("direction"));
    }

    #[test]
    fn reserved_byte_must_be_zero() {
        let mut out = Vec::new();
        sample_header().write_to(&mut out);
        out[HEADER_RESERVED_OFFSET] = 1;
        let err = EventHeader::parse(&out).unwrap_err();
        assert!(matches!(err, DecodeError::BadHeader { .. }));
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn peek_kind_reads_syscall_and_direction() {
        let mut out = Vec::new();
        sample_header().write_to(&mut out);
        assert_eq!(
            EventHeader::peek_kind(&out),
            Some((SyscallId::WRITE, Direction::Exit))
        );
        assert_eq!(EventHeader::peek_kind(&out[..4]), None);
    }

    #[test]
    fn failed_only_applies_to_exit() {
        let mut raw = RawSyscall {
            syscall_id: SyscallId::WRITE,
            direction: Direction::Enter,
            args: Vec::new(),
            ret: -9,
            timestamp_ns: 0,
            tid: 1,
        };
        assert!(!raw.failed());
        raw.direction = Direction::Exit;
        assert!(raw.failed());
    }
}
