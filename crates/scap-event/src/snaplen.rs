//! Snaplen truncation policy.
//!
//! The snaplen is the only truncation rule: every buffer parameter is capped
//! at the same limit, whatever the syscall or argument.

use scap_common::constants::DEFAULT_SNAPLEN;

/// Number of bytes captured from an argument `original_len` bytes long.
#[must_use]
pub const fn capture_length(original_len: usize, limit: usize) -> usize {
    if original_len < limit {
        original_len
    } else {
        limit
    }
}

/// A fixed snaplen, set before capture begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnaplenPolicy {
    limit: usize,
}

impl SnaplenPolicy {
    /// Creates a policy capping buffers at `limit` bytes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// The configured limit.
    #[must_use]
    pub const fn limit(self) -> usize {
        self.limit
    }

    /// Number of bytes captured from an argument `original_len` bytes long.
    #[must_use]
    pub const fn capture_length(self, original_len: usize) -> usize {
        capture_length(original_len, self.limit)
    }

    /// Returns the prefix of `data` that the policy keeps.
    #[must_use]
    pub fn truncate(self, data: &[u8]) -> &[u8] {
        data.get(..self.capture_length(data.len())).unwrap_or(data)
    }
}

impl Default for SnaplenPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPLEN)
    }
}
