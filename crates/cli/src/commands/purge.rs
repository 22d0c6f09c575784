//! `purge` command implementation.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app;
use crate::cli::PurgeArgs;

/// Execute the `purge` command
pub async fn run_purge(args: &PurgeArgs) -> Result<()> {
    let blueprint = app::load_blueprint(&args.config.config)?;
    let feeder = app::build(&blueprint, CancellationToken::new());
    feeder
        .purge(&args.run_id)
        .await
        .with_context(|| format!("Failed to purge run '{}'", args.run_id))?;

    info!(run_id = %args.run_id, "Run history deleted");
    println!("Purged {}", args.run_id);
    Ok(())
}
