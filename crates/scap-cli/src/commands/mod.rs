//! CLI command definitions and dispatch.

pub mod read;
pub mod schema;
pub mod write;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scap_capture::CaptureSession;
use scap_common::config::CaptureConfig;
use scap_event::{EventBuffer, ParsedEvent};

/// scap — syscall event capture and inspection.
#[derive(Parser, Debug)]
#[command(name = scap_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON capture configuration file.
    #[arg(long, global = true, env = "SCAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the snaplen from the configuration.
    #[arg(long, global = true)]
    pub snaplen: Option<usize>,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the parameter schema of every supported event.
    Schema(schema::SchemaArgs),
    /// Run a traced write(2) and print the captured exit event.
    Write(write::WriteArgs),
    /// Run a traced read(2) and print the captured exit event.
    Read(read::ReadArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Globals {
    /// Effective capture configuration.
    pub config: CaptureConfig,
    /// JSON output requested.
    pub json: bool,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let globals = Globals {
        config: resolve_config(cli.config.as_deref(), cli.snaplen)?,
        json: cli.json,
    };
    match cli.command {
        Command::Schema(args) => schema::execute(&args, globals),
        Command::Write(args) => write::execute(&args, globals),
        Command::Read(args) => read::execute(&args, globals),
    }
}

fn resolve_config(
    path: Option<&std::path::Path>,
    snaplen: Option<usize>,
) -> anyhow::Result<CaptureConfig> {
    let mut config = match path {
        Some(path) => CaptureConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => CaptureConfig::default(),
    };
    if let Some(snaplen) = snaplen {
        config.snaplen = snaplen;
    }
    config.validate()?;
    tracing::debug!(?config, "effective configuration");
    Ok(config)
}

/// Runs `body` inside a capture window and returns the window's records.
pub(crate) fn capture<T>(
    config: CaptureConfig,
    body: impl FnOnce(&scap_capture::Probe) -> anyhow::Result<T>,
) -> anyhow::Result<(T, EventBuffer, scap_capture::SessionStats)> {
    let mut session = CaptureSession::new(config)?;
    let probe = session.enable()?;
    let outcome = body(&probe);
    let records = session.disable()?.clone();
    Ok((outcome?, records, session.stats()))
}

/// Decodes and prints every record of a window.
pub(crate) fn print_records(records: &EventBuffer, json: bool) -> anyhow::Result<()> {
    let events = records
        .iter()
        .map(scap_event::parse)
        .collect::<Result<Vec<ParsedEvent<'_>>, _>>()
        .context("decoding captured records")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else {
        for event in &events {
            println!("{}", crate::output::render_event(event));
        }
    }
    Ok(())
}
