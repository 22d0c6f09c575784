//! `list` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::app;
use crate::cli::ListArgs;

/// One line of the run listing
#[derive(Serialize)]
struct RunEntry {
    run_id: String,
    status: String,
    created_at: String,
    units: usize,
}

/// Execute the `list` command
pub async fn run_list(args: &ListArgs) -> Result<()> {
    let blueprint = app::load_blueprint(&args.config.config)?;
    let feeder = app::build(&blueprint, CancellationToken::new());
    let entries: Vec<RunEntry> = feeder
        .list()
        .await
        .context("Failed to list runs")?
        .into_iter()
        .map(|record| RunEntry {
            run_id: record.run_id,
            status: format!("{:?}", record.status),
            created_at: record.created_at.to_rfc3339(),
            units: record.units.len(),
        })
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&entries).context("Failed to serialize run list")?;
        println!("{}", json);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No runs recorded in {}", blueprint.ledger.dir.display());
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{}  {:<9}  {}  {} units",
            entry.run_id, entry.status, entry.created_at, entry.units
        );
    }
    Ok(())
}
