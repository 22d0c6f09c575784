//! Blueprint decoding and encoding for the supported file formats.

use std::path::Path;

use contracts::{ContractError, FeederBlueprint};

/// On-disk blueprint format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Picks the format from a path's extension, case-insensitively.
    pub fn detect(path: &Path) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                ContractError::config_parse(format!(
                    "'{}' has no extension; expected .toml or .json",
                    path.display()
                ))
            })?;

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(ContractError::config_parse(format!(
                "unsupported blueprint format: .{other}"
            ))),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    /// Decodes a blueprint without running the validation rules.
    pub fn decode(self, content: &str) -> Result<FeederBlueprint, ContractError> {
        let decoded: Result<FeederBlueprint, Box<dyn std::error::Error + Send + Sync>> = match self
        {
            Self::Toml => toml::from_str(content).map_err(Into::into),
            Self::Json => serde_json::from_str(content).map_err(Into::into),
        };
        decoded.map_err(|e| ContractError::ConfigParse {
            message: format!("{} parse error: {e}", self.label()),
            source: Some(e),
        })
    }

    pub fn encode(self, blueprint: &FeederBlueprint) -> Result<String, ContractError> {
        let encoded = match self {
            Self::Toml => toml::to_string_pretty(blueprint).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(blueprint).map_err(|e| e.to_string()),
        };
        encoded.map_err(|e| {
            ContractError::config_parse(format!("{} serialize error: {e}", self.label()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[catalog]
dimensions = ["SiteA"]
subjects = ["Tag", "WorkOrderCutoff"]
cutoff_subject = "WorkOrderCutoff"

[source]
root = "/var/feeder/events"

[sink]
name = "fam"
sink_type = "file"
[sink.params]
path = "/var/feeder/out.jsonl"

[dispatch]
batch_size = 100

[tracker]
status_ceiling_kib = 10
transport_ceiling_kib = 16

[executor]
max_concurrent_units = 4

[ledger]
dir = "/var/feeder/runs"
"#;
        let result = ConfigFormat::Toml.decode(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.sink.sink_type, SinkType::File);
        assert_eq!(bp.sink.params.get("path").map(String::as_str), Some("/var/feeder/out.jsonl"));
        assert_eq!(bp.dispatch.batch_size, 100);
        assert_eq!(bp.tracker.status_ceiling_kib, 10);
        assert_eq!(bp.executor.max_concurrent_units, 4);
        assert_eq!(bp.catalog.cutoff_subject.as_deref(), Some("WorkOrderCutoff"));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "catalog": { "dimensions": ["SiteA"], "subjects": ["Tag"] },
            "sink": { "name": "log", "sink_type": "log" }
        }"#;
        let result = ConfigFormat::Json.decode(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        assert_eq!(result.unwrap().executor.max_concurrent_units, 16);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = ConfigFormat::Toml.decode(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(ConfigFormat::detect(Path::new("feeder.TOML")).unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::detect(Path::new("a/b.json")).unwrap(), ConfigFormat::Json);
        assert!(ConfigFormat::detect(Path::new("feeder.yaml")).is_err());
        assert!(ConfigFormat::detect(Path::new("feeder")).is_err());
    }
}
