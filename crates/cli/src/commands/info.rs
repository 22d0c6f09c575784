//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::FeederBlueprint;
use serde::Serialize;
use tracing::info;

use crate::app;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    dimensions: Vec<String>,
    subjects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cutoff_subject: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    aliases: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sink: Option<SinkInfo>,
    limits: LimitsInfo,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    params: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct LimitsInfo {
    batch_size: usize,
    max_concurrent_units: usize,
    status_ceiling_kib: usize,
    transport_ceiling_kib: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Loading configuration info");

    let blueprint = app::load_blueprint(&args.config.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &FeederBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sink = args.sinks.then(|| SinkInfo {
        name: blueprint.sink.name.clone(),
        sink_type: format!("{:?}", blueprint.sink.sink_type),
        params: blueprint
            .sink
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    });

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        dimensions: blueprint.catalog.dimensions.clone(),
        subjects: blueprint.catalog.subjects.clone(),
        cutoff_subject: blueprint.catalog.cutoff_subject.clone(),
        aliases: if args.aliases {
            blueprint.catalog.aliases.clone()
        } else {
            BTreeMap::new()
        },
        sink,
        limits: LimitsInfo {
            batch_size: blueprint.dispatch.batch_size,
            max_concurrent_units: blueprint.executor.max_concurrent_units,
            status_ceiling_kib: blueprint.tracker.status_ceiling_kib,
            transport_ceiling_kib: blueprint.tracker.transport_ceiling_kib,
        },
    }
}

fn print_config_info(blueprint: &FeederBlueprint, args: &InfoArgs) {
    let catalog = &blueprint.catalog;

    println!("Feeder configuration ({:?})\n", blueprint.version);

    println!("Catalog");
    println!("   ├─ Dimensions ({}): {}", catalog.dimensions.len(), catalog.dimensions.join(", "));
    println!("   ├─ Subjects ({}): {}", catalog.subjects.len(), catalog.subjects.join(", "));
    match &catalog.cutoff_subject {
        Some(cutoff) => println!("   └─ Cutoff subject: {} (12 monthly units)", cutoff),
        None => println!("   └─ Cutoff subject: none"),
    }

    if args.aliases && !catalog.aliases.is_empty() {
        println!("\nAliases ({})", catalog.aliases.len());
        for (i, (alias, members)) in catalog.aliases.iter().enumerate() {
            let prefix = if i == catalog.aliases.len() - 1 { "└─" } else { "├─" };
            println!("   {} {} -> {}", prefix, alias, members.join(", "));
        }
    }

    println!("\nSource");
    println!("   └─ Root: {}", blueprint.source.root.display());

    println!("\nLimits");
    println!("   ├─ Batch size: {}", blueprint.dispatch.batch_size);
    println!("   ├─ Max concurrent units: {}", blueprint.executor.max_concurrent_units);
    println!(
        "   └─ Status ceiling: {} KiB (transport {} KiB)",
        blueprint.tracker.status_ceiling_kib, blueprint.tracker.transport_ceiling_kib
    );

    if args.sinks {
        println!("\nSink");
        println!("   ├─ {} ({:?})", blueprint.sink.name, blueprint.sink.sink_type);
        let params: BTreeMap<_, _> = blueprint.sink.params.iter().collect();
        for (key, value) in params {
            println!("   │  {} = {}", key, value);
        }
    }

    println!("\nLedger");
    println!("   └─ Dir: {}", blueprint.ledger.dir.display());
    println!();
}
