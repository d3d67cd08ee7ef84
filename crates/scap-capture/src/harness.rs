//! Field-level checks on captured events.
//!
//! [`EventTest`] drives a capture session for one `(syscall, direction)`
//! pair. Every check returns a [`CheckError`] that describes the mismatch;
//! decoder failures surface as [`CheckError::Decode`] instead of a panic.

use scap_common::config::CaptureConfig;
use scap_common::constants::HEADER_SIZE;
use scap_common::types::{Direction, SyscallId};
use scap_event::{ParsedEvent, Parameter, schema};

use crate::error::{CheckError, SessionError};
use crate::probe::Probe;
use crate::session::CaptureSession;

/// Capture-and-check driver for one event kind.
#[derive(Debug)]
pub struct EventTest {
    syscall_id: SyscallId,
    direction: Direction,
    session: CaptureSession,
    probe: Option<Probe>,
    event: Option<ParsedEvent<'static>>,
}

impl EventTest {
    /// Creates a driver with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails only if the default configuration is rejected.
    pub fn new(syscall_id: SyscallId, direction: Direction) -> Result<Self, CheckError> {
        Self::with_config(syscall_id, direction, CaptureConfig::default())
    }

    /// Creates a driver with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Session` if the configuration is invalid.
    pub fn with_config(
        syscall_id: SyscallId,
        direction: Direction,
        config: CaptureConfig,
    ) -> Result<Self, CheckError> {
        Ok(Self {
            syscall_id,
            direction,
            session: CaptureSession::new(config)?,
            probe: None,
            event: None,
        })
    }

    /// Snaplen of the underlying session.
    #[must_use]
    pub const fn snaplen(&self) -> usize {
        self.session.config().snaplen
    }

    /// Underlying capture session.
    #[must_use]
    pub const fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Starts capturing and returns the probe syscalls are reported through.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Session` if capture is already enabled.
    pub fn enable_capture(&mut self) -> Result<Probe, CheckError> {
        let probe = self.session.enable()?;
        self.event = None;
        self.probe = Some(probe.clone());
        Ok(probe)
    }

    /// Probe of the current window, if capture is enabled.
    #[must_use]
    pub const fn probe(&self) -> Option<&Probe> {
        self.probe.as_ref()
    }

    /// Stops capturing; records of the window become readable.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Session` if capture was not enabled.
    pub fn disable_capture(&mut self) -> Result<(), CheckError> {
        self.probe = None;
        let _ = self.session.disable()?;
        Ok(())
    }

    /// Checks that at least one record of the expected kind was captured.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::EventMissing` otherwise.
    pub fn assert_event_presence(&self) -> Result<(), CheckError> {
        self.first_matching().map(drop)
    }

    /// Decodes the first record of the expected kind.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::EventMissing` if there is none and
    /// `CheckError::Decode` if it is malformed.
    pub fn parse_event(&mut self) -> Result<&ParsedEvent<'static>, CheckError> {
        let raw = self.first_matching()?;
        let event = scap_event::parse(raw)?.into_owned();
        Ok(self.event.insert(event))
    }

    /// Checks header sanity: expected kind, schema-consistent count, and a
    /// length that covers at least the header.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Header` naming the first bad field.
    pub fn assert_header(&self) -> Result<(), CheckError> {
        let event = self.event()?;
        let header = event.header();

        if header.syscall_id != self.syscall_id {
            return Err(header_mismatch("syscall_id", self.syscall_id, header.syscall_id));
        }
        if header.direction != self.direction {
            return Err(header_mismatch("direction", self.direction, header.direction));
        }
        if header.syscall_id.name().is_none() {
            return Err(header_mismatch("syscall_id", "a known syscall", header.syscall_id));
        }
        let declared = schema::lookup(header.syscall_id, header.direction)
            .map_or(0, schema::EventSchema::num_params);
        if header.nparams as usize != declared {
            return Err(header_mismatch("nparams", declared, header.nparams));
        }
        if (header.len as usize) < HEADER_SIZE {
            return Err(header_mismatch(
                "len",
                format!(">= {HEADER_SIZE}"),
                header.len,
            ));
        }
        Ok(())
    }

    /// Checks the numeric parameter at a 1-based position.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Numeric` on a different value and
    /// `CheckError::Decode` if the slot is missing or not numeric.
    pub fn assert_numeric_param(&self, index: usize, expected: i64) -> Result<(), CheckError> {
        let found = self.event()?.numeric_param(index)?;
        if found != expected {
            return Err(CheckError::Numeric {
                index,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Checks that the buffer parameter at a 1-based position holds exactly
    /// `expected_captured_len` bytes, equal to the same-length prefix of
    /// `expected`.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Buffer` on a length or content difference and
    /// `CheckError::Decode` if the slot is missing or numeric.
    pub fn assert_bytebuf_param(
        &self,
        index: usize,
        expected: &[u8],
        expected_captured_len: usize,
    ) -> Result<(), CheckError> {
        let found = self.event()?.buffer_param(index)?;
        if found.len() != expected_captured_len {
            return Err(CheckError::Buffer {
                index,
                detail: format!(
                    "expected {expected_captured_len} captured bytes, found {}",
                    found.len()
                ),
            });
        }
        let Some(want) = expected.get(..expected_captured_len) else {
            return Err(CheckError::Buffer {
                index,
                detail: format!(
                    "expected data has {} bytes, fewer than the {expected_captured_len} to compare",
                    expected.len()
                ),
            });
        };
        if let Some(pos) = want.iter().zip(found).position(|(a, b)| a != b) {
            return Err(CheckError::Buffer {
                index,
                detail: format!(
                    "byte {pos} differs: expected {:#04x}, found {:#04x}",
                    want[pos], found[pos]
                ),
            });
        }
        Ok(())
    }

    /// Checks that the parameter at a 1-based position is empty.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::NotEmpty` if it carries a payload.
    pub fn assert_empty_param(&self, index: usize) -> Result<(), CheckError> {
        match self.event()?.param(index)? {
            Parameter::Empty => Ok(()),
            other => Err(CheckError::NotEmpty {
                index,
                found: other.kind_name(),
            }),
        }
    }

    /// Checks the number of parameters the encoder pushed.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::ParamCount` on a different count.
    pub fn assert_num_params_pushed(&self, expected: usize) -> Result<(), CheckError> {
        let found = self.event()?.num_params();
        if found != expected {
            return Err(CheckError::ParamCount { expected, found });
        }
        Ok(())
    }

    /// The parsed event, once [`EventTest::parse_event`] succeeded.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::NotParsed` before that.
    pub fn event(&self) -> Result<&ParsedEvent<'static>, CheckError> {
        self.event.as_ref().ok_or(CheckError::NotParsed)
    }

    fn first_matching(&self) -> Result<&[u8], CheckError> {
        if self.session.is_active() {
            return Err(SessionError::AlreadyActive.into());
        }
        let records = self.session.records();
        records
            .records_matching(self.syscall_id, self.direction)
            .next()
            .ok_or(CheckError::EventMissing {
                syscall_id: self.syscall_id,
                direction: self.direction,
                captured: records.len(),
            })
    }
}

fn header_mismatch(
    field: &'static str,
    expected: impl std::fmt::Display,
    found: impl std::fmt::Display,
) -> CheckError {
    CheckError::Header {
        field,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::UserArg;

    fn captured_write(data: &[u8], ret: i64) -> EventTest {
        let mut t = EventTest::with_config(
            SyscallId::WRITE,
            Direction::Exit,
            CaptureConfig::with_snaplen(16),
        )
        .unwrap();
        let probe = t.enable_capture().unwrap();
        probe
            .emit(
                SyscallId::WRITE,
                Direction::Exit,
                &[
                    UserArg::Scalar(3),
                    UserArg::Buffer(data),
                    UserArg::Scalar(data.len() as u64),
                ],
                ret,
            )
            .unwrap();
        t.disable_capture().unwrap();
        t
    }

    #[test]
    fn checks_pass_on_matching_event() {
        let mut t = captured_write(b"0123456789abcdefXYZ", 19);
        t.assert_event_presence().unwrap();
        let _ = t.parse_event().unwrap();
        t.assert_header().unwrap();
        t.assert_numeric_param(1, 19).unwrap();
        t.assert_bytebuf_param(2, b"0123456789abcdefXYZ", 16).unwrap();
        t.assert_num_params_pushed(2).unwrap();
    }

    #[test]
    fn checks_before_parse_report_not_parsed() {
        let t = captured_write(b"abc", 3);
        assert!(matches!(t.assert_header(), Err(CheckError::NotParsed)));
        assert!(matches!(
            t.assert_numeric_param(1, 3),
            Err(CheckError::NotParsed)
        ));
    }

    #[test]
    fn missing_event_is_described() {
        let mut t = EventTest::new(SyscallId::READ, Direction::Exit).unwrap();
        let _probe = t.enable_capture().unwrap();
        t.disable_capture().unwrap();
        let err = t.assert_event_presence().unwrap_err();
        assert_eq!(err.to_string(), "no read exit event among 0 captured records");
    }

    #[test]
    fn mismatches_are_descriptive() {
        let mut t = captured_write(b"abc", 3);
        let _ = t.parse_event().unwrap();

        let err = t.assert_numeric_param(1, 4).unwrap_err();
        assert_eq!(err.to_string(), "parameter 1: expected numeric 4, found 3");

        let err = t.assert_bytebuf_param(2, b"abd", 3).unwrap_err();
        assert!(err.to_string().contains("byte 2 differs"), "{err}");

        let err = t.assert_bytebuf_param(2, b"abc", 2).unwrap_err();
        assert!(err.to_string().contains("expected 2 captured bytes"), "{err}");

        let err = t.assert_empty_param(2).unwrap_err();
        assert!(matches!(err, CheckError::NotEmpty { index: 2, found: "bytebuf" }));

        let err = t.assert_num_params_pushed(3).unwrap_err();
        assert!(matches!(err, CheckError::ParamCount { expected: 3, found: 2 }));
    }

    #[test]
    fn decoder_errors_fail_the_check() {
        let mut t = captured_write(b"abc", 3);
        let _ = t.parse_event().unwrap();
        assert!(matches!(
            t.assert_numeric_param(2, 0),
            Err(CheckError::Decode { .. })
        ));
        assert!(matches!(
            t.assert_numeric_param(9, 0),
            Err(CheckError::Decode { .. })
        ));
    }

    #[test]
    fn failed_write_checks_empty() {
        let mut t = captured_write(&[0u8; 64], -9);
        let _ = t.parse_event().unwrap();
        t.assert_numeric_param(1, -9).unwrap();
        t.assert_empty_param(2).unwrap();
    }

    #[test]
    fn presence_requires_disabled_capture() {
        let mut t = EventTest::new(SyscallId::WRITE, Direction::Exit).unwrap();
        let _probe = t.enable_capture().unwrap();
        assert!(matches!(
            t.assert_event_presence(),
            Err(CheckError::Session(SessionError::AlreadyActive))
        ));
        t.disable_capture().unwrap();
    }
}
