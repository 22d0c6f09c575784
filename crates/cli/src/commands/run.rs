//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{FeederBlueprint, SinkType};
use orchestrator::{FeederRequest, OrchestratorError, RunReport};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::{self, Feeder};
use crate::cli::{RunArgs, SinkKind};

/// Execute the `run` command
pub async fn run_feeder(args: &RunArgs) -> Result<()> {
    let mut blueprint = app::load_blueprint(&args.config.config)?;
    apply_overrides(&mut blueprint, args);

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let cancel = CancellationToken::new();
    let feeder = app::build(&blueprint, cancel.clone());

    // The token is canceled, not the future dropped, so every unit ends in a
    // recorded state and the run stays resumable.
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, canceling run...");
        signal_token.cancel();
    });

    let recorded = match &args.run_id {
        Some(run_id) => feeder.status(run_id).await.is_ok(),
        None => false,
    };

    let result = match (&args.run_id, &args.dimensions, &args.subjects) {
        (Some(run_id), _, _) if recorded => {
            println!("{run_id}");
            feeder.resume(run_id).await
        }
        (run_id, Some(dimensions), Some(subjects)) => {
            let run_id = run_id.clone().unwrap_or_else(Feeder::new_run_id);
            println!("{run_id}");
            let request = FeederRequest::parse(dimensions, subjects);
            feeder.start_with_id(&run_id, request).await
        }
        (Some(run_id), _, _) => {
            anyhow::bail!("Run '{run_id}' not found; pass --dimensions and --subjects to start it")
        }
        _ => anyhow::bail!("--dimensions and --subjects are required to start a run"),
    };

    report(result)
}

fn apply_overrides(blueprint: &mut FeederBlueprint, args: &RunArgs) {
    if let Some(max) = args.max_concurrent_units {
        info!(max_concurrent_units = max, "Overriding executor concurrency from CLI");
        blueprint.executor.max_concurrent_units = max.max(1);
    }
    if let Some(kind) = args.sink {
        info!(sink = ?kind, "Overriding sink type from CLI");
        blueprint.sink.sink_type = match kind {
            SinkKind::Log => SinkType::Log,
            SinkKind::File => SinkType::File,
            SinkKind::Network => SinkType::Network,
        };
    }
}

fn report(result: orchestrator::Result<RunReport>) -> Result<()> {
    match result {
        Ok(report) => {
            info!(run_id = %report.run_id, units = report.results.len(), "Run completed successfully");
            for line in &report.results {
                println!("{line}");
            }
            println!("\n{}", report.summary);
            Ok(())
        }
        Err(OrchestratorError::Aggregate(failure)) => {
            for unit in &failure.failures {
                println!("FAILED {unit}");
            }
            Err(failure).context("Run failed")
        }
        Err(e) => Err(e).context("Run failed"),
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
