//! Real syscalls reported to a probe.
//!
//! Each function issues the syscall through `libc`, reporting its entry
//! before the call and its exit after it, the way a kernel hook would. The
//! exit carries the kernel-style return value: the result on success, the
//! negated errno on failure.
//!
//! Dropped reports never affect the syscall itself.

use std::os::fd::RawFd;

use nix::errno::Errno;
use scap_common::types::{Direction, SyscallId};

use crate::probe::{Probe, UserArg};

/// `write(2)` on `fd`, traced.
///
/// # Errors
///
/// Returns the errno of a failed write.
pub fn write(probe: &Probe, fd: RawFd, buf: &[u8]) -> Result<usize, Errno> {
    let count = len_arg(buf.len());
    report(
        probe,
        SyscallId::WRITE,
        Direction::Enter,
        &[fd_arg(fd), ptr_arg(buf.as_ptr()), count],
        0,
    );

    // SAFETY: `buf` is a live slice of `buf.len()` initialised bytes.
    let outcome = outcome(unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) });
    let ret = kernel_ret(&outcome);

    report(
        probe,
        SyscallId::WRITE,
        Direction::Exit,
        &[fd_arg(fd), UserArg::Buffer(buf), count],
        ret,
    );
    outcome
}

/// `read(2)` on `fd` into `buf`, traced.
///
/// # Errors
///
/// Returns the errno of a failed read.
pub fn read(probe: &Probe, fd: RawFd, buf: &mut [u8]) -> Result<usize, Errno> {
    let count = len_arg(buf.len());
    report(
        probe,
        SyscallId::READ,
        Direction::Enter,
        &[fd_arg(fd), ptr_arg(buf.as_ptr()), count],
        0,
    );

    // SAFETY: `buf` is a live, exclusively borrowed slice of `buf.len()` bytes.
    let outcome = outcome(unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) });
    let ret = kernel_ret(&outcome);

    report(
        probe,
        SyscallId::READ,
        Direction::Exit,
        &[fd_arg(fd), UserArg::Buffer(buf), count],
        ret,
    );
    outcome
}

/// `pwrite64(2)` on `fd` at `offset`, traced.
///
/// # Errors
///
/// Returns the errno of a failed write.
pub fn pwrite(probe: &Probe, fd: RawFd, buf: &[u8], offset: libc::off_t) -> Result<usize, Errno> {
    let count = len_arg(buf.len());
    let pos = offset_arg(offset);
    report(
        probe,
        SyscallId::PWRITE64,
        Direction::Enter,
        &[fd_arg(fd), ptr_arg(buf.as_ptr()), count, pos],
        0,
    );

    // SAFETY: `buf` is a live slice of `buf.len()` initialised bytes.
    let outcome = outcome(unsafe { libc::pwrite(fd, buf.as_ptr().cast(), buf.len(), offset) });
    let ret = kernel_ret(&outcome);

    report(
        probe,
        SyscallId::PWRITE64,
        Direction::Exit,
        &[fd_arg(fd), UserArg::Buffer(buf), count, pos],
        ret,
    );
    outcome
}

/// `pread64(2)` on `fd` at `offset` into `buf`, traced.
///
/// # Errors
///
/// Returns the errno of a failed read.
pub fn pread(probe: &Probe, fd: RawFd, buf: &mut [u8], offset: libc::off_t) -> Result<usize, Errno> {
    let count = len_arg(buf.len());
    let pos = offset_arg(offset);
    report(
        probe,
        SyscallId::PREAD64,
        Direction::Enter,
        &[fd_arg(fd), ptr_arg(buf.as_ptr()), count, pos],
        0,
    );

    // SAFETY: `buf` is a live, exclusively borrowed slice of `buf.len()` bytes.
    let outcome = outcome(unsafe { libc::pread(fd, buf.as_mut_ptr().cast(), buf.len(), offset) });
    let ret = kernel_ret(&outcome);

    report(
        probe,
        SyscallId::PREAD64,
        Direction::Exit,
        &[fd_arg(fd), UserArg::Buffer(buf), count, pos],
        ret,
    );
    outcome
}

/// `close(2)` on `fd`, traced.
///
/// The caller must own `fd` and not use it afterwards.
///
/// # Errors
///
/// Returns the errno of a failed close.
pub fn close(probe: &Probe, fd: RawFd) -> Result<(), Errno> {
    report(probe, SyscallId::CLOSE, Direction::Enter, &[fd_arg(fd)], 0);

    // SAFETY: closing an integer descriptor has no memory-safety requirements.
    let outcome = outcome(unsafe { libc::close(fd) } as isize);
    let ret = kernel_ret(&outcome);

    report(probe, SyscallId::CLOSE, Direction::Exit, &[fd_arg(fd)], ret);
    outcome.map(drop)
}

fn report(
    probe: &Probe,
    syscall_id: SyscallId,
    direction: Direction,
    args: &[UserArg<'_>],
    ret: i64,
) {
    if let Err(e) = probe.emit(syscall_id, direction, args, ret) {
        tracing::debug!(
            syscall = %syscall_id,
            direction = %direction,
            error = %e,
            "occurrence not captured"
        );
    }
}

/// Settles a raw libc return. Must run before anything else can touch `errno`.
fn outcome(res: isize) -> Result<usize, Errno> {
    Errno::result(res).map(isize::unsigned_abs)
}

/// Return value as the kernel reports it: `-errno` on failure.
fn kernel_ret(outcome: &Result<usize, Errno>) -> i64 {
    match outcome {
        Ok(n) => i64::try_from(*n).unwrap_or(i64::MAX),
        Err(errno) => -i64::from(*errno as i32),
    }
}

// Scalars are register images: negative values are sign-extended.
#[allow(clippy::cast_sign_loss)]
const fn fd_arg(fd: RawFd) -> UserArg<'static> {
    UserArg::Scalar(fd as u64)
}

fn ptr_arg(ptr: *const u8) -> UserArg<'static> {
    UserArg::Scalar(ptr as u64)
}

const fn len_arg(len: usize) -> UserArg<'static> {
    UserArg::Scalar(len as u64)
}

#[allow(clippy::cast_sign_loss)]
const fn offset_arg(offset: libc::off_t) -> UserArg<'static> {
    UserArg::Scalar(offset as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_errno(value: i32) {
        // SAFETY: the errno location is thread-local and always valid.
        unsafe { *libc::__errno_location() = value };
    }

    #[test]
    fn kernel_ret_passes_successes_through() {
        assert_eq!(kernel_ret(&outcome(42)), 42);
        assert_eq!(kernel_ret(&outcome(0)), 0);
    }

    #[test]
    fn failure_is_settled_before_errno_changes() {
        set_errno(libc::EBADF);
        let settled = outcome(-1);
        set_errno(libc::EINTR);

        assert_eq!(settled, Err(Errno::EBADF));
        assert_eq!(kernel_ret(&settled), -i64::from(libc::EBADF));
    }

    #[test]
    fn fd_arg_keeps_negative_descriptors() {
        assert_eq!(fd_arg(-1), UserArg::Scalar(u64::MAX));
    }
}
