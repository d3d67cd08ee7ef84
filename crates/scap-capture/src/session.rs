//! Capture session lifecycle.
//!
//! `IDLE -> ACTIVE -> IDLE`. While active, a single encoder thread drains
//! the probe queue and appends records to a private buffer. `disable` waits
//! for the thread to finish the window and then publishes the buffer, so a
//! reader only ever sees whole records from completed windows.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use flume::{Receiver, Sender};
use scap_common::config::CaptureConfig;
use scap_event::snaplen::SnaplenPolicy;
use scap_event::{Encoder, EventBuffer};
use serde::Serialize;

use crate::error::SessionError;
use crate::probe::{Counters, Message, Probe};

/// Counters for the current or last capture window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Records appended to the buffer.
    pub captured: u64,
    /// Occurrences dropped because the queue was full.
    pub dropped: u64,
    /// Occurrences the encoder rejected.
    pub encode_failures: u64,
}

struct Worker {
    active: Arc<AtomicBool>,
    tx: Sender<Message>,
    handle: JoinHandle<EventBuffer>,
}

enum State {
    Idle,
    Active(Worker),
}

/// Owns the capture lifecycle and the records of the last window.
pub struct CaptureSession {
    config: CaptureConfig,
    state: State,
    records: EventBuffer,
    counters: Arc<Counters>,
}

impl CaptureSession {
    /// Creates an idle session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidConfig` if the configuration is out of range.
    pub fn new(config: CaptureConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            config,
            state: State::Idle,
            records: EventBuffer::new(),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Configuration in force.
    #[must_use]
    pub const fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Whether the session is capturing.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// Changes the snaplen for the next capture window.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyActive` while capturing and
    /// `SessionError::InvalidConfig` for an out-of-range value.
    pub fn set_snaplen(&mut self, snaplen: usize) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::AlreadyActive);
        }
        let config = CaptureConfig {
            snaplen,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Starts a capture window and returns a probe for the interception layer.
    ///
    /// Records of the previous window are discarded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyActive` if already capturing and
    /// `SessionError::Spawn` if the encoder thread cannot start.
    pub fn enable(&mut self) -> Result<Probe, SessionError> {
        if self.is_active() {
            return Err(SessionError::AlreadyActive);
        }

        let (tx, rx) = flume::bounded(self.config.channel_capacity);
        let active = Arc::new(AtomicBool::new(true));
        self.counters = Arc::new(Counters::default());
        self.records.clear();

        let encoder = Encoder::new(self.config.snaplen);
        let counters = Arc::clone(&self.counters);
        let handle = std::thread::Builder::new()
            .name("scap-encoder".into())
            .spawn(move || run_encoder(&rx, encoder, &counters))
            .map_err(|source| SessionError::Spawn { source })?;

        let probe = Probe::new(
            Arc::clone(&active),
            tx.clone(),
            encoder.policy(),
            Arc::clone(&self.counters),
        );
        self.state = State::Active(Worker { active, tx, handle });
        tracing::info!(snaplen = self.config.snaplen, "capture enabled");
        Ok(probe)
    }

    /// A new probe for the active window, if any.
    #[must_use]
    pub fn probe(&self) -> Option<Probe> {
        match &self.state {
            State::Active(worker) => Some(Probe::new(
                Arc::clone(&worker.active),
                worker.tx.clone(),
                SnaplenPolicy::new(self.config.snaplen),
                Arc::clone(&self.counters),
            )),
            State::Idle => None,
        }
    }

    /// Ends the capture window and publishes its records.
    ///
    /// Every occurrence accepted by a probe before this call is encoded and
    /// visible in the returned buffer. Probes of the window stop accepting
    /// occurrences.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if the session is idle and
    /// `SessionError::WorkerPanicked` if the encoder thread died.
    pub fn disable(&mut self) -> Result<&EventBuffer, SessionError> {
        let State::Active(worker) = std::mem::replace(&mut self.state, State::Idle) else {
            return Err(SessionError::NotActive);
        };

        worker.active.store(false, Ordering::Release);
        // The encoder drains the queue, so this send cannot wait forever.
        if worker.tx.send(Message::Finish).is_err() {
            tracing::warn!("encoder thread exited before the end of the window");
        }
        drop(worker.tx);
        self.records = worker
            .handle
            .join()
            .map_err(|_| SessionError::WorkerPanicked)?;

        let stats = self.stats();
        tracing::info!(
            captured = stats.captured,
            dropped = stats.dropped,
            encode_failures = stats.encode_failures,
            "capture disabled"
        );
        Ok(&self.records)
    }

    /// Records of the last completed window.
    #[must_use]
    pub const fn records(&self) -> &EventBuffer {
        &self.records
    }

    /// Counters of the current or last window.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            captured: self.counters.captured.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            encode_failures: self.counters.encode_failures.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.is_active() {
            if let Err(e) = self.disable() {
                tracing::warn!(error = %e, "failed to stop capture on drop");
            }
        }
    }
}

/// Encoder thread body: the single writer of the window's buffer.
fn run_encoder(rx: &Receiver<Message>, encoder: Encoder, counters: &Counters) -> EventBuffer {
    let mut records = EventBuffer::new();
    for message in rx.iter() {
        let raw = match message {
            Message::Occurrence(raw) => raw,
            Message::Finish => break,
        };
        match encoder.encode(&raw) {
            Ok(record) => {
                records.push(&record);
                Counters::bump(&counters.captured);
            }
            Err(e) => {
                Counters::bump(&counters.encode_failures);
                tracing::warn!(
                    syscall = %raw.syscall_id,
                    direction = %raw.direction,
                    error = %e,
                    "dropping occurrence"
                );
            }
        }
    }
    tracing::debug!(records = records.len(), "encoder finished window");
    records
}

#[cfg(test)]
mod tests {
    use scap_common::types::{Direction, SyscallId};
    use scap_event::EncodeError;

    use super::*;
    use crate::probe::UserArg;

    fn session() -> CaptureSession {
        CaptureSession::new(CaptureConfig::default()).expect("session")
    }

    fn close_enter(probe: &Probe, fd: u64) -> Result<(), EncodeError> {
        probe.emit(SyscallId::CLOSE, Direction::Enter, &[UserArg::Scalar(fd)], 0)
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let s = session();
        assert!(!s.is_active());
        assert!(s.records().is_empty());
        assert!(s.probe().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = CaptureSession::new(CaptureConfig::with_snaplen(0)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig { .. }));
    }

    #[test]
    fn double_enable_is_an_error() {
        let mut s = session();
        let _probe = s.enable().unwrap();
        assert!(matches!(s.enable(), Err(SessionError::AlreadyActive)));
    }

    #[test]
    fn disable_while_idle_is_an_error() {
        let mut s = session();
        assert!(matches!(s.disable(), Err(SessionError::NotActive)));
    }

    #[test]
    fn records_become_visible_on_disable() {
        let mut s = session();
        let probe = s.enable().unwrap();
        for fd in 0..10 {
            close_enter(&probe, fd).unwrap();
        }
        let records = s.disable().unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(s.stats().captured, 10);
    }

    #[test]
    fn probe_is_inert_after_disable() {
        let mut s = session();
        let probe = s.enable().unwrap();
        let _ = s.disable().unwrap();
        assert_eq!(close_enter(&probe, 3), Err(EncodeError::NoActiveSession));
        assert!(s.records().is_empty());
    }

    #[test]
    fn stale_probe_does_not_leak_into_next_window() {
        let mut s = session();
        let stale = s.enable().unwrap();
        let _ = s.disable().unwrap();

        let fresh = s.enable().unwrap();
        assert!(close_enter(&stale, 1).is_err());
        close_enter(&fresh, 2).unwrap();
        assert_eq!(s.disable().unwrap().len(), 1);
    }

    #[test]
    fn snaplen_is_frozen_while_active() {
        let mut s = session();
        let _probe = s.enable().unwrap();
        assert!(matches!(s.set_snaplen(16), Err(SessionError::AlreadyActive)));
        let _ = s.disable().unwrap();
        s.set_snaplen(16).unwrap();
        assert_eq!(s.config().snaplen, 16);
        assert!(s.set_snaplen(0).is_err());
    }

    #[test]
    fn unencodable_occurrence_is_counted() {
        let mut s = session();
        let probe = s.enable().unwrap();
        probe
            .emit(SyscallId::new(59), Direction::Enter, &[], 0)
            .unwrap();
        let _ = s.disable().unwrap();
        assert_eq!(s.stats().encode_failures, 1);
        assert!(s.records().is_empty());
    }

    #[test]
    fn concurrent_probes_produce_whole_records() {
        let mut s = session();
        let probe = s.enable().unwrap();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let probe = probe.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let data = vec![t as u8; 200];
                        probe
                            .emit(
                                SyscallId::WRITE,
                                Direction::Exit,
                                &[
                                    UserArg::Scalar(i),
                                    UserArg::Buffer(&data),
                                    UserArg::Scalar(200),
                                ],
                                200,
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let records = s.disable().unwrap();
        assert_eq!(records.len(), 200);
        for raw in records.iter() {
            let event = scap_event::parse(raw).unwrap();
            let data = event.buffer_param(2).unwrap();
            assert_eq!(data.len(), scap_common::constants::DEFAULT_SNAPLEN);
            assert!(data.iter().all(|&b| b == data[0]));
        }
    }

    #[test]
    fn drop_stops_an_active_session() {
        let mut s = session();
        let probe = s.enable().unwrap();
        drop(s);
        assert!(!probe.is_active());
    }
}
