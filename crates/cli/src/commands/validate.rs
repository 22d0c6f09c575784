//! `validate` command: load a blueprint and report problems without running it.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{FeederBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

#[derive(Serialize)]
struct ValidationReport {
    config_path: String,
    #[serde(flatten)]
    verdict: Verdict,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Verdict {
    Valid {
        summary: BlueprintSummary,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Invalid {
        error: String,
    },
}

impl ValidationReport {
    fn is_valid(&self) -> bool {
        matches!(self.verdict, Verdict::Valid { .. })
    }
}

#[derive(Serialize)]
struct BlueprintSummary {
    version: String,
    dimensions: usize,
    subjects: usize,
    aliases: usize,
    sink: String,
}

impl BlueprintSummary {
    fn of(blueprint: &FeederBlueprint) -> Self {
        Self {
            version: format!("{:?}", blueprint.version),
            dimensions: blueprint.catalog.dimensions.len(),
            subjects: blueprint.catalog.subjects.len(),
            aliases: blueprint.catalog.aliases.len(),
            sink: format!("{} ({:?})", blueprint.sink.name, blueprint.sink.sink_type),
        }
    }
}

pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let path = &args.config.config;
    info!(config = %path.display(), "Validating blueprint");

    let report = validate_config(path);

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize validation report")?;
        println!("{json}");
    } else {
        print_report(&report);
    }

    anyhow::ensure!(report.is_valid(), "Blueprint validation failed");
    Ok(())
}

fn validate_config(path: &Path) -> ValidationReport {
    let verdict = if path.exists() {
        match config_loader::ConfigLoader::load_from_path(path) {
            Ok(blueprint) => Verdict::Valid {
                summary: BlueprintSummary::of(&blueprint),
                warnings: collect_warnings(&blueprint),
            },
            Err(e) => Verdict::Invalid { error: e.to_string() },
        }
    } else {
        Verdict::Invalid {
            error: format!("no such file: {}", path.display()),
        }
    };

    ValidationReport {
        config_path: path.display().to_string(),
        verdict,
    }
}

/// Problems that still let a run start but will make units fail or no-op.
fn collect_warnings(blueprint: &FeederBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.source.root.exists() {
        warnings.push(format!(
            "source.root '{}' does not exist; every unit will report no data",
            blueprint.source.root.display()
        ));
    }

    let params = &blueprint.sink.params;
    match blueprint.sink.sink_type {
        SinkType::Network if !params.contains_key("addr") => {
            warnings.push("network sink has no 'addr' param; every batch will fail".to_string());
        }
        SinkType::File if !params.contains_key("path") => {
            warnings.push("file sink has no 'path' param; the default path is used".to_string());
        }
        _ => {}
    }

    let catalog = &blueprint.catalog;
    if catalog.subjects.len() == usize::from(catalog.cutoff_subject.is_some()) {
        warnings.push("only the cutoff subject is configured; 'all' matches nothing".to_string());
    }

    warnings
}

fn print_report(report: &ValidationReport) {
    match &report.verdict {
        Verdict::Valid { summary, warnings } => {
            println!("OK  {}", report.config_path);
            println!("    version    {}", summary.version);
            println!("    dimensions {}", summary.dimensions);
            println!("    subjects   {}", summary.subjects);
            println!("    aliases    {}", summary.aliases);
            println!("    sink       {}", summary.sink);
            for warning in warnings {
                println!("WARN {warning}");
            }
        }
        Verdict::Invalid { error } => {
            println!("ERR {}", report.config_path);
            println!("    {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = validate_config(&dir.path().join("missing.toml"));
        assert!(!missing.is_valid());

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[catalog]\ndimensions = []\nsubjects = []\n").unwrap();
        let invalid = validate_config(&path);
        assert!(matches!(invalid.verdict, Verdict::Invalid { .. }));
    }

    #[test]
    fn test_network_without_addr_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeder.toml");
        std::fs::write(
            &path,
            r#"
[catalog]
dimensions = ["SiteA"]
subjects = ["Tag"]

[sink]
name = "udp"
sink_type = "network"
"#,
        )
        .unwrap();

        let result = validate_config(&path);
        let Verdict::Valid { warnings, .. } = result.verdict else {
            panic!("expected a valid blueprint");
        };
        assert!(warnings.iter().any(|w| w.contains("addr")));
    }
}
