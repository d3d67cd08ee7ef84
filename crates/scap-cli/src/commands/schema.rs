//! `scapctl schema` — List event schemas.

use clap::Args;
use scap_event::schema;
use serde::Serialize;

use super::Globals;

/// Arguments for the `schema` command.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Only show events of this syscall.
    #[arg(long)]
    pub syscall: Option<String>,
}

#[derive(Serialize)]
struct SchemaRow {
    syscall: String,
    direction: String,
    params: Vec<String>,
}

/// Executes the `schema` command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(args: &SchemaArgs, globals: Globals) -> anyhow::Result<()> {
    let rows: Vec<SchemaRow> = schema::all()
        .filter(|s| {
            args.syscall
                .as_deref()
                .is_none_or(|name| s.syscall_id.name() == Some(name))
        })
        .map(|s| SchemaRow {
            syscall: s.syscall_id.to_string(),
            direction: s.direction.to_string(),
            params: s
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect(),
        })
        .collect();

    if globals.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in &rows {
        println!(
            "{:<10} {:<6} {}",
            row.syscall,
            row.direction,
            row.params.join(", ")
        );
    }
    Ok(())
}
