//! Interception-side handle of a capture session.
//!
//! A [`Probe`] never blocks: when the session is idle or the queue towards
//! the encoder is full, the occurrence is dropped and the caller gets an
//! [`EncodeError`] describing why.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use flume::{Sender, TrySendError};
use scap_common::types::{Direction, SyscallId};
use scap_event::snaplen::SnaplenPolicy;
use scap_event::{EncodeError, RawArg, RawSyscall};

/// Message travelling from probes to the encoder thread.
#[derive(Debug)]
pub(crate) enum Message {
    /// One traced syscall entry or exit.
    Occurrence(RawSyscall),
    /// End of the capture window; nothing after it is encoded.
    Finish,
}

/// Counters shared between probes, the encoder thread, and the session.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) captured: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) encode_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        let _ = counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Argument as seen at the interception point, before it is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserArg<'a> {
    /// A register-sized scalar.
    Scalar(u64),
    /// User memory an argument points to.
    Buffer(&'a [u8]),
}

/// Reports syscall occurrences to an active capture session.
#[derive(Debug, Clone)]
pub struct Probe {
    active: Arc<AtomicBool>,
    tx: Sender<Message>,
    policy: SnaplenPolicy,
    counters: Arc<Counters>,
}

impl Probe {
    pub(crate) const fn new(
        active: Arc<AtomicBool>,
        tx: Sender<Message>,
        policy: SnaplenPolicy,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            active,
            tx,
            policy,
            counters,
        }
    }

    /// Whether the session this probe belongs to is still capturing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Snaplen of the session this probe belongs to.
    #[must_use]
    pub const fn snaplen(&self) -> usize {
        self.policy.limit()
    }

    /// Queues a raw occurrence for encoding.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::NoActiveSession` if capture is disabled and
    /// `EncodeError::QueueFull` if the encoder is lagging. Either way the
    /// occurrence is dropped.
    pub fn submit(&self, raw: RawSyscall) -> Result<(), EncodeError> {
        if !self.is_active() {
            tracing::debug!(syscall = %raw.syscall_id, "capture disabled, dropping occurrence");
            return Err(EncodeError::NoActiveSession);
        }
        match self.tx.try_send(Message::Occurrence(raw)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Counters::bump(&self.counters.dropped);
                tracing::warn!("capture queue full, dropping occurrence");
                Err(EncodeError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(EncodeError::NoActiveSession),
        }
    }

    /// Builds an occurrence stamped with the current time and thread, and
    /// queues it.
    ///
    /// Buffer arguments are cut to the snaplen before being copied.
    ///
    /// # Errors
    ///
    /// Same as [`Probe::submit`].
    pub fn emit(
        &self,
        syscall_id: SyscallId,
        direction: Direction,
        args: &[UserArg<'_>],
        ret: i64,
    ) -> Result<(), EncodeError> {
        if !self.is_active() {
            return Err(EncodeError::NoActiveSession);
        }
        let args = args
            .iter()
            .map(|arg| match *arg {
                UserArg::Scalar(v) => RawArg::Scalar(v),
                UserArg::Buffer(data) => RawArg::Buffer(self.policy.truncate(data).to_vec()),
            })
            .collect();
        self.submit(RawSyscall {
            syscall_id,
            direction,
            args,
            ret,
            timestamp_ns: now_ns(),
            tid: current_tid(),
        })
    }
}

fn now_ns() -> u64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
        .unwrap_or_default()
}

fn current_tid() -> u64 {
    u64::try_from(nix::unistd::gettid().as_raw()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(capacity: usize, active: bool) -> (Probe, flume::Receiver<Message>) {
        let (tx, rx) = flume::bounded(capacity);
        let probe = Probe::new(
            Arc::new(AtomicBool::new(active)),
            tx,
            SnaplenPolicy::new(8),
            Arc::new(Counters::default()),
        );
        (probe, rx)
    }

    #[test]
    fn inactive_probe_drops_occurrence() {
        let (probe, rx) = probe(4, false);
        let err = probe
            .emit(SyscallId::CLOSE, Direction::Enter, &[UserArg::Scalar(3)], 0)
            .unwrap_err();
        assert_eq!(err, EncodeError::NoActiveSession);
        assert!(rx.is_empty());
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let (probe, _rx) = probe(1, true);
        probe
            .emit(SyscallId::CLOSE, Direction::Enter, &[UserArg::Scalar(3)], 0)
            .unwrap();
        let err = probe
            .emit(SyscallId::CLOSE, Direction::Enter, &[UserArg::Scalar(3)], 0)
            .unwrap_err();
        assert_eq!(err, EncodeError::QueueFull);
        assert_eq!(probe.counters.dropped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn buffers_are_cut_to_snaplen_before_queueing() {
        let (probe, rx) = probe(4, true);
        let data = [9u8; 100];
        probe
            .emit(
                SyscallId::WRITE,
                Direction::Exit,
                &[
                    UserArg::Scalar(3),
                    UserArg::Buffer(&data),
                    UserArg::Scalar(100),
                ],
                100,
            )
            .unwrap();

        let Ok(Message::Occurrence(raw)) = rx.try_recv() else {
            panic!("expected a queued occurrence");
        };
        assert_eq!(raw.args[1], RawArg::Buffer(vec![9u8; 8]));
        assert!(raw.tid > 0);
    }
}
