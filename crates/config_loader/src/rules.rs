//! Configuration validation
//!
//! Rules:
//! - field ranges (declared on the blueprint types)
//! - dimension / subject names unique, case-insensitive
//! - alias members name known dimensions, aliases never shadow a dimension
//! - cutoff subject is a known subject
//! - status ceiling strictly below transport ceiling
//! - sink name present

use std::collections::HashSet;

use contracts::{ContractError, FeederBlueprint};
use validator::Validate;

/// Validate a FeederBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &FeederBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))?;
    validate_unique("catalog.dimensions", &blueprint.catalog.dimensions)?;
    validate_unique("catalog.subjects", &blueprint.catalog.subjects)?;
    validate_aliases(blueprint)?;
    validate_cutoff_subject(blueprint)?;
    validate_tracker(blueprint)?;
    validate_sink(blueprint)?;
    Ok(())
}

fn validate_unique(field: &str, names: &[String]) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(field, "empty name"));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ContractError::config_validation(
                format!("{field}[{name}]"),
                "duplicate name",
            ));
        }
    }
    Ok(())
}

fn validate_aliases(blueprint: &FeederBlueprint) -> Result<(), ContractError> {
    let known: HashSet<String> = blueprint
        .catalog
        .dimensions
        .iter()
        .map(|d| d.to_lowercase())
        .collect();

    for (alias, members) in &blueprint.catalog.aliases {
        let field = format!("catalog.aliases.{alias}");
        if known.contains(&alias.to_lowercase()) {
            return Err(ContractError::config_validation(
                field,
                "alias shadows a known dimension",
            ));
        }
        if members.is_empty() {
            return Err(ContractError::config_validation(field, "alias has no members"));
        }
        if let Some(unknown) = members.iter().find(|m| !known.contains(&m.to_lowercase())) {
            return Err(ContractError::config_validation(
                field,
                format!("unknown dimension '{unknown}'"),
            ));
        }
    }
    Ok(())
}

fn validate_cutoff_subject(blueprint: &FeederBlueprint) -> Result<(), ContractError> {
    let Some(cutoff) = &blueprint.catalog.cutoff_subject else {
        return Ok(());
    };
    let listed = blueprint
        .catalog
        .subjects
        .iter()
        .any(|s| s.eq_ignore_ascii_case(cutoff));
    if !listed {
        return Err(ContractError::config_validation(
            "catalog.cutoff_subject",
            format!("cutoff subject '{cutoff}' not found in catalog.subjects"),
        ));
    }
    Ok(())
}

fn validate_tracker(blueprint: &FeederBlueprint) -> Result<(), ContractError> {
    let tracker = &blueprint.tracker;
    if tracker.status_ceiling_kib >= tracker.transport_ceiling_kib {
        return Err(ContractError::config_validation(
            "tracker.status_ceiling_kib / tracker.transport_ceiling_kib",
            format!(
                "status_ceiling_kib ({}) must be < transport_ceiling_kib ({})",
                tracker.status_ceiling_kib, tracker.transport_ceiling_kib
            ),
        ));
    }
    Ok(())
}

fn validate_sink(blueprint: &FeederBlueprint) -> Result<(), ContractError> {
    if blueprint.sink.name.is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }
    Ok(())
}
