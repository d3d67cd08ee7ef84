//! Domain primitive types shared by the encoder, decoder, and session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a traced syscall (Linux x86_64 numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SyscallId(u16);

impl SyscallId {
    /// `read(2)`.
    pub const READ: Self = Self(0);
    /// `write(2)`.
    pub const WRITE: Self = Self(1);
    /// `close(2)`.
    pub const CLOSE: Self = Self(3);
    /// `pread64(2)`.
    pub const PREAD64: Self = Self(17);
    /// `pwrite64(2)`.
    pub const PWRITE64: Self = Self(18);

    /// Creates a syscall id from its raw number.
    #[must_use]
    pub const fn new(nr: u16) -> Self {
        Self(nr)
    }

    /// Returns the raw syscall number.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the conventional name of the syscall, if it is one scap knows.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("read"),
            1 => Some("write"),
            3 => Some("close"),
            17 => Some("pread64"),
            18 => Some("pwrite64"),
            _ => None,
        }
    }
}

impl fmt::Display for SyscallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "syscall#{}", self.0),
        }
    }
}

/// Whether an event was emitted on syscall entry or exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Emitted before the syscall runs; carries input arguments.
    Enter,
    /// Emitted after the syscall returns; carries the result and output data.
    Exit,
}

impl Direction {
    /// Returns the wire byte for this direction.
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::Enter => 0,
            Self::Exit => 1,
        }
    }

    /// Parses a wire byte into a direction.
    #[must_use]
    pub const fn from_wire(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Enter),
            1 => Some(Self::Exit),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => write!(f, "enter"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// Declared type of a parameter slot, stored on the wire as a one-byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// Syscall result: non-negative value on success, negated errno on failure.
    Errno,
    /// File descriptor.
    Fd,
    /// Unsigned 64-bit quantity such as a size or an offset.
    Uint64,
    /// Length-prefixed byte buffer, bounded by the snaplen.
    ByteBuf,
}

impl ParamType {
    /// Returns the wire tag of this type.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Errno => 1,
            Self::Fd => 2,
            Self::Uint64 => 3,
            Self::ByteBuf => 4,
        }
    }

    /// Parses a wire tag into a parameter type.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Errno),
            2 => Some(Self::Fd),
            3 => Some(Self::Uint64),
            4 => Some(Self::ByteBuf),
            _ => None,
        }
    }

    /// Conventional name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Errno => "PT_ERRNO",
            Self::Fd => "PT_FD",
            Self::Uint64 => "PT_UINT64",
            Self::ByteBuf => "PT_BYTEBUF",
        }
    }

    /// Whether values of this type are encoded as fixed-width integers.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::ByteBuf)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
