//! `scapctl read` — Run a traced read and show the captured events.

use std::io::{Seek, SeekFrom, Write};
use std::os::fd::AsRawFd;

use anyhow::Context;
use clap::Args;
use scap_capture::trigger;

use super::Globals;

/// Arguments for the `read` command.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Number of bytes stored in the file that is read back.
    #[arg(long, default_value_t = 40)]
    pub size: usize,
}

/// Executes the `read` command.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be prepared or the
/// captured records cannot be decoded.
pub fn execute(args: &ReadArgs, globals: Globals) -> anyhow::Result<()> {
    let mut file = tempfile::tempfile().context("creating temporary file")?;
    file.write_all(&crate::output::pattern(args.size))
        .context("filling temporary file")?;
    let _ = file.seek(SeekFrom::Start(0)).context("rewinding temporary file")?;

    let mut buf = vec![0u8; args.size];
    let (n, records, _) = super::capture(globals.config, |probe| {
        trigger::read(probe, file.as_raw_fd(), &mut buf).context("traced read failed")
    })?;
    tracing::info!(read = n, "read completed");

    super::print_records(&records, globals.json)
}
