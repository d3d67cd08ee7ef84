//! `scapctl write` — Run a traced write and show the captured events.

use std::os::fd::AsRawFd;

use anyhow::Context;
use clap::Args;
use scap_capture::trigger;

use super::Globals;

/// Arguments for the `write` command.
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Number of bytes to write.
    #[arg(long, default_value_t = 40)]
    pub size: usize,

    /// Write to descriptor -1 instead of a temporary file.
    #[arg(long)]
    pub invalid_fd: bool,
}

/// Executes the `write` command.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or the
/// captured records cannot be decoded.
pub fn execute(args: &WriteArgs, globals: Globals) -> anyhow::Result<()> {
    let data = crate::output::pattern(args.size);
    let file = tempfile::tempfile().context("creating temporary file")?;
    let fd = if args.invalid_fd { -1 } else { file.as_raw_fd() };

    let (result, records, stats) = super::capture(globals.config, |probe| {
        Ok(trigger::write(probe, fd, &data))
    })?;
    match result {
        Ok(n) => tracing::info!(fd, written = n, "write completed"),
        Err(errno) => tracing::info!(fd, %errno, "write failed"),
    }
    tracing::debug!(?stats, "capture statistics");

    super::print_records(&records, globals.json)
}
