//! Append-only arena of encoded records.

use scap_common::types::{Direction, SyscallId};

use crate::record::{EventHeader, EventRecord};

/// Contiguous storage for the records produced during one capture window.
///
/// Records are only ever appended whole; readers see complete records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBuffer {
    data: Vec<u8>,
    bounds: Vec<(usize, usize)>,
}

impl EventBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&mut self, record: &EventRecord) {
        let start = self.data.len();
        self.data.extend_from_slice(record.as_bytes());
        self.bounds.push((start, self.data.len()));
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether no record was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Total bytes held across all records.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Record at a 0-based position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        let &(start, end) = self.bounds.get(index)?;
        self.data.get(start..end)
    }

    /// Iterates over records in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.bounds.iter().map(|&(start, end)| &self.data[start..end])
    }

    /// Iterates over records of one syscall and direction.
    pub fn records_matching(
        &self,
        syscall_id: SyscallId,
        direction: Direction,
    ) -> impl Iterator<Item = &[u8]> {
        self.iter()
            .filter(move |raw| EventHeader::peek_kind(raw) == Some((syscall_id, direction)))
    }

    /// Drops every record, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
        self.bounds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::record::{RawArg, RawSyscall};

    fn close_event(direction: Direction, tid: u64) -> EventRecord {
        let raw = RawSyscall {
            syscall_id: SyscallId::CLOSE,
            direction,
            args: vec![RawArg::Scalar(4)],
            ret: 0,
            timestamp_ns: tid,
            tid,
        };
        Encoder::default().encode(&raw).unwrap()
    }

    #[test]
    fn records_keep_capture_order() {
        let mut buffer = EventBuffer::new();
        let first = close_event(Direction::Enter, 1);
        let second = close_event(Direction::Exit, 2);
        buffer.push(&first);
        buffer.push(&second);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.get(0), Some(first.as_bytes()));
        assert_eq!(buffer.get(1), Some(second.as_bytes()));
        assert_eq!(buffer.get(2), None);
        assert_eq!(buffer.byte_len(), first.len() + second.len());
    }

    #[test]
    fn matching_filters_by_kind() {
        let mut buffer = EventBuffer::new();
        buffer.push(&close_event(Direction::Enter, 1));
        buffer.push(&close_event(Direction::Exit, 2));
        buffer.push(&close_event(Direction::Exit, 3));

        assert_eq!(
            buffer
                .records_matching(SyscallId::CLOSE, Direction::Exit)
                .count(),
            2
        );
        assert_eq!(
            buffer
                .records_matching(SyscallId::WRITE, Direction::Exit)
                .count(),
            0
        );
    }

    #[test]
    fn clear_empties_buffer() {
        let mut buffer = EventBuffer::new();
        buffer.push(&close_event(Direction::Enter, 1));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.iter().count(), 0);
    }
}
