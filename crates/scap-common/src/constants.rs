//! Wire-format constants and capture defaults.

/// Default number of bytes captured for a single variable-length parameter.
pub const DEFAULT_SNAPLEN: usize = 80;

/// Largest snaplen representable by the `u32` size field of a buffer parameter.
pub const MAX_SNAPLEN: usize = u32::MAX as usize;

/// Default bound of the queue between the interception probe and the encoder.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Size in bytes of the fixed event header.
///
/// Layout (little-endian): `ts_ns u64 | tid u64 | len u32 | syscall_id u16 |
/// direction u8 | reserved u8 | nparams u32`.
pub const HEADER_SIZE: usize = 28;

/// Byte offset of the timestamp field within the header.
pub const HEADER_TS_OFFSET: usize = 0;
/// Byte offset of the thread id field within the header.
pub const HEADER_TID_OFFSET: usize = 8;
/// Byte offset of the total record length field within the header.
pub const HEADER_LEN_OFFSET: usize = 16;
/// Byte offset of the syscall id field within the header.
pub const HEADER_SYSCALL_OFFSET: usize = 20;
/// Byte offset of the direction byte within the header.
pub const HEADER_DIRECTION_OFFSET: usize = 22;
/// Byte offset of the reserved byte within the header.
pub const HEADER_RESERVED_OFFSET: usize = 23;
/// Byte offset of the parameter count within the header.
pub const HEADER_NPARAMS_OFFSET: usize = 24;

/// Size of a parameter type tag.
pub const TAG_SIZE: usize = 1;

/// Size of the payload of a numeric parameter.
pub const NUMERIC_SIZE: usize = 8;

/// Size of the length prefix of a buffer parameter.
pub const BUFFER_LEN_SIZE: usize = 4;

/// Binary name for the CLI.
pub const BIN_NAME: &str = "scapctl";
