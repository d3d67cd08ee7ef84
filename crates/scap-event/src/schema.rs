//! Per-event parameter schemas.
//!
//! Every supported `(syscall, direction)` pair has a fixed, ordered list of
//! parameter slots. The encoder fills slots from raw arguments; the decoder
//! uses the same list to validate records.

use scap_common::types::{Direction, ParamType, SyscallId};

/// Where the value of a slot comes from in a raw occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The syscall return value.
    Return,
    /// A raw argument, by index.
    Arg(usize),
}

/// One parameter slot of an event schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlot {
    /// Parameter name, as shown to consumers.
    pub name: &'static str,
    /// Declared type.
    pub ty: ParamType,
    /// Raw source of the value (for buffers, the argument holding the bytes).
    pub source: Source,
    /// For buffers, the raw source of the argument's original length.
    pub len_source: Option<Source>,
}

impl ParamSlot {
    const fn numeric(name: &'static str, ty: ParamType, source: Source) -> Self {
        Self {
            name,
            ty,
            source,
            len_source: None,
        }
    }

    const fn buffer(name: &'static str, data: usize, len: Source) -> Self {
        Self {
            name,
            ty: ParamType::ByteBuf,
            source: Source::Arg(data),
            len_source: Some(len),
        }
    }
}

/// Ordered parameter list of one event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchema {
    /// Traced syscall.
    pub syscall_id: SyscallId,
    /// Entry or exit.
    pub direction: Direction,
    /// Slots in wire order.
    pub params: &'static [ParamSlot],
}

impl EventSchema {
    /// Number of parameters every record of this kind carries.
    #[must_use]
    pub const fn num_params(&self) -> usize {
        self.params.len()
    }

    /// Slot at a 1-based position.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&'static ParamSlot> {
        index.checked_sub(1).and_then(|i| self.params.get(i))
    }
}

const FD: ParamSlot = ParamSlot::numeric("fd", ParamType::Fd, Source::Arg(0));
const SIZE: ParamSlot = ParamSlot::numeric("size", ParamType::Uint64, Source::Arg(2));
const POS: ParamSlot = ParamSlot::numeric("pos", ParamType::Uint64, Source::Arg(3));
const RES: ParamSlot = ParamSlot::numeric("res", ParamType::Errno, Source::Return);

static SCHEMAS: &[EventSchema] = &[
    EventSchema {
        syscall_id: SyscallId::READ,
        direction: Direction::Enter,
        params: &[FD, SIZE],
    },
    EventSchema {
        syscall_id: SyscallId::READ,
        direction: Direction::Exit,
        params: &[RES, ParamSlot::buffer("data", 1, Source::Return)],
    },
    EventSchema {
        syscall_id: SyscallId::WRITE,
        direction: Direction::Enter,
        params: &[FD, SIZE],
    },
    EventSchema {
        syscall_id: SyscallId::WRITE,
        direction: Direction::Exit,
        params: &[RES, ParamSlot::buffer("data", 1, Source::Return)],
    },
    EventSchema {
        syscall_id: SyscallId::CLOSE,
        direction: Direction::Enter,
        params: &[FD],
    },
    EventSchema {
        syscall_id: SyscallId::CLOSE,
        direction: Direction::Exit,
        params: &[RES],
    },
    EventSchema {
        syscall_id: SyscallId::PREAD64,
        direction: Direction::Enter,
        params: &[FD, SIZE, POS],
    },
    EventSchema {
        syscall_id: SyscallId::PREAD64,
        direction: Direction::Exit,
        params: &[RES, ParamSlot::buffer("data", 1, Source::Return)],
    },
    EventSchema {
        syscall_id: SyscallId::PWRITE64,
        direction: Direction::Enter,
        params: &[FD, SIZE, POS],
    },
    EventSchema {
        syscall_id: SyscallId::PWRITE64,
        direction: Direction::Exit,
        params: &[RES, ParamSlot::buffer("data", 1, Source::Return)],
    },
];

/// Looks up the schema for a syscall and direction.
#[must_use]
pub fn lookup(syscall_id: SyscallId, direction: Direction) -> Option<&'static EventSchema> {
    SCHEMAS
        .iter()
        .find(|s| s.syscall_id == syscall_id && s.direction == direction)
}

/// Iterates over every known schema.
pub fn all() -> impl Iterator<Item = &'static EventSchema> {
    SCHEMAS.iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_exit_has_result_then_data() {
        let schema = lookup(SyscallId::WRITE, Direction::Exit).expect("write exit");
        assert_eq!(schema.num_params(), 2);
        assert_eq!(schema.slot(1).map(|s| s.ty), Some(ParamType::Errno));
        assert_eq!(schema.slot(2).map(|s| s.ty), Some(ParamType::ByteBuf));
        assert_eq!(schema.slot(0), None);
        assert_eq!(schema.slot(3), None);
    }

    #[test]
    fn every_pair_is_unique() {
        let schemas: Vec<_> = all().collect();
        for (i, a) in schemas.iter().enumerate() {
            for b in &schemas[i + 1..] {
                assert!(
                    a.syscall_id != b.syscall_id || a.direction != b.direction,
                    "duplicate schema for {} {}",
                    a.syscall_id,
                    a.direction
                );
            }
        }
    }

    #[test]
    fn buffer_slots_always_name_a_length() {
        for schema in all() {
            for slot in schema.params {
                assert_eq!(slot.ty == ParamType::ByteBuf, slot.len_source.is_some());
            }
        }
    }

    #[test]
    fn exit_buffers_are_sized_by_the_return_value() {
        for schema in all().filter(|s| s.direction == Direction::Exit) {
            for slot in schema.params.iter().filter(|s| s.ty == ParamType::ByteBuf) {
                assert_eq!(
                    slot.len_source,
                    Some(Source::Return),
                    "{} exit",
                    schema.syscall_id
                );
            }
        }
    }

    #[test]
    fn unknown_syscall_has_no_schema() {
        assert!(lookup(SyscallId::new(59), Direction::Enter).is_none());
    }
}
