//! `status` command implementation.

use anyhow::{Context, Result};
use orchestrator::{RunOutput, RunRecord};
use tokio_util::sync::CancellationToken;

use crate::app;
use crate::cli::StatusArgs;

/// Execute the `status` command
pub async fn run_status(args: &StatusArgs) -> Result<()> {
    let blueprint = app::load_blueprint(&args.config.config)?;
    let feeder = app::build(&blueprint, CancellationToken::new());
    let record = feeder
        .status(&args.run_id)
        .await
        .with_context(|| format!("Failed to read run '{}'", args.run_id))?;

    if args.json {
        let json = serde_json::to_string_pretty(&record).context("Failed to serialize run record")?;
        println!("{}", json);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &RunRecord) {
    println!("Run {}", record.run_id);
    println!("  Status: {:?}", record.status);
    println!("  Dimensions: {}", record.request.dimensions.join(", "));
    println!("  Subjects: {}", record.request.subjects.join(", "));
    println!("  Created: {}", record.created_at.to_rfc3339());
    println!("  Updated: {}", record.updated_at.to_rfc3339());
    println!("  Units recorded: {}", record.units.len());

    if let Some(snapshot) = &record.last_snapshot {
        println!("\nLast progress:");
        println!("  {}", snapshot.to_payload());
    }

    match &record.output {
        Some(RunOutput::Results { results }) => {
            println!("\nResults:");
            for line in results {
                println!("  {}", line);
            }
        }
        Some(RunOutput::Failures { total, failures }) => {
            println!("\nFailures ({} of {}):", failures.len(), total);
            for unit in failures {
                println!("  {}", unit);
            }
        }
        Some(RunOutput::Rejected { message }) => println!("\nRejected: {}", message),
        None => {}
    }
}
