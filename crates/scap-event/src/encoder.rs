//! Event encoder.
//!
//! Turns one raw syscall occurrence into an [`EventRecord`] by walking the
//! schema of its `(syscall, direction)` pair. Buffer slots are capped by the
//! snaplen. On a failed exit, buffer slots are written as
//! [`Parameter::Empty`] whatever the raw memory holds.

use scap_common::constants::HEADER_SIZE;
use scap_common::types::ParamType;

use crate::codec;
use crate::error::EncodeError;
use crate::param::{ByteBuf, Parameter};
use crate::record::{EventHeader, EventRecord, RawArg, RawSyscall};
use crate::schema::{self, ParamSlot, Source};
use crate::snaplen::SnaplenPolicy;

/// Encodes raw occurrences under a fixed snaplen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    policy: SnaplenPolicy,
}

impl Encoder {
    /// Creates an encoder capping buffer parameters at `snaplen` bytes.
    #[must_use]
    pub const fn new(snaplen: usize) -> Self {
        Self {
            policy: SnaplenPolicy::new(snaplen),
        }
    }

    /// The snaplen policy in force.
    #[must_use]
    pub const fn policy(&self) -> SnaplenPolicy {
        self.policy
    }

    /// Encodes one occurrence.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::UnknownSchema` if the syscall and direction have
    /// no schema, `EncodeError::MissingArgument` if a raw argument the schema
    /// needs is absent, and `EncodeError::Oversized` if the record would not
    /// fit its length field.
    pub fn encode(&self, raw: &RawSyscall) -> Result<EventRecord, EncodeError> {
        let schema = schema::lookup(raw.syscall_id, raw.direction).ok_or(
            EncodeError::UnknownSchema {
                syscall_id: raw.syscall_id,
                direction: raw.direction,
            },
        )?;

        let params = schema
            .params
            .iter()
            .map(|slot| self.fill_slot(slot, raw))
            .collect::<Result<Vec<_>, _>>()?;

        let total = HEADER_SIZE + params.iter().map(codec::encoded_len).sum::<usize>();
        let header = EventHeader {
            ts_ns: raw.timestamp_ns,
            tid: raw.tid,
            len: u32::try_from(total).map_err(|_| EncodeError::Oversized { len: total })?,
            syscall_id: raw.syscall_id,
            direction: raw.direction,
            nparams: u32::try_from(params.len()).map_err(|_| EncodeError::Oversized {
                len: params.len(),
            })?,
        };

        let mut bytes = Vec::with_capacity(total);
        header.write_to(&mut bytes);
        for (slot, param) in schema.params.iter().zip(&params) {
            codec::encode(slot.ty, param, &mut bytes)?;
        }

        tracing::trace!(
            syscall = %raw.syscall_id,
            direction = %raw.direction,
            tid = raw.tid,
            len = total,
            "encoded event"
        );
        Ok(EventRecord::new(header, bytes))
    }

    fn fill_slot<'r>(
        &self,
        slot: &ParamSlot,
        raw: &'r RawSyscall,
    ) -> Result<Parameter<'r>, EncodeError> {
        if slot.ty.is_numeric() {
            let value = match slot.source {
                Source::Return => raw.ret,
                Source::Arg(i) => reinterpret(slot.ty, scalar_arg(slot, raw, i)?),
            };
            return Ok(Parameter::numeric(value));
        }

        // Output buffers of a failed call hold whatever was in user memory.
        if raw.failed() {
            return Ok(Parameter::Empty);
        }

        let Source::Arg(i) = slot.source else {
            return Err(missing(slot, 0, "buffer"));
        };
        let Some(RawArg::Buffer(data)) = raw.args.get(i) else {
            return Err(missing(slot, i, "buffer"));
        };
        let original_len = match slot.len_source {
            Some(Source::Return) => usize::try_from(raw.ret).unwrap_or(0),
            Some(Source::Arg(j)) => usize::try_from(scalar_arg(slot, raw, j)?).unwrap_or(usize::MAX),
            None => data.len(),
        };

        let buf = ByteBuf::captured(data, original_len, self.policy.limit());
        if buf.captured_len() == 0 {
            Ok(Parameter::Empty)
        } else {
            Ok(Parameter::ByteBuffer(buf))
        }
    }
}

fn scalar_arg(slot: &ParamSlot, raw: &RawSyscall, index: usize) -> Result<u64, EncodeError> {
    match raw.args.get(index) {
        Some(RawArg::Scalar(v)) => Ok(*v),
        _ => Err(missing(slot, index, "scalar")),
    }
}

const fn missing(slot: &ParamSlot, arg: usize, wanted: &'static str) -> EncodeError {
    EncodeError::MissingArgument {
        slot: slot.name,
        arg,
        wanted,
    }
}

/// Interprets a register value according to the slot type.
///
/// Descriptors are C `int`s: only the low 32 bits count, sign-extended.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn reinterpret(ty: ParamType, value: u64) -> i64 {
    match ty {
        ParamType::Fd => value as i32 as i64,
        _ => value as i64,
    }
}
