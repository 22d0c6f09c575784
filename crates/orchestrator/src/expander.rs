//! UnitPlanner - expands a request into concrete work units
//!
//! Expansion is deterministic: dimension-major, then subject order, then
//! month order for the cutoff subject.

use std::collections::HashSet;
use std::sync::Arc;

use contracts::{Dimension, Subject, UnitSpec};
use registry::{Registry, SubjectHandler, ALL_SUBJECTS};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::ValidationError;

/// Dimensions and subjects as requested by the caller.
///
/// Values are raw: aliases, unknown names and the reserved `all` subject
/// are only interpreted by [`UnitPlanner::plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeederRequest {
    pub dimensions: Vec<String>,
    pub subjects: Vec<String>,
}

impl FeederRequest {
    pub fn new<D, S>(dimensions: D, subjects: S) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            subjects: subjects.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse comma-separated lists, e.g. `"SiteA, SiteB"` and `"Tag,all"`.
    pub fn parse(dimensions: &str, subjects: &str) -> Self {
        Self {
            dimensions: split_list(dimensions),
            subjects: split_list(subjects),
        }
    }
}

/// Split on commas, trimming entries and dropping empty ones.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Turns requests into unit specs using the registry.
#[derive(Debug, Clone)]
pub struct UnitPlanner {
    registry: Arc<Registry>,
}

impl UnitPlanner {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Expand `request` into every unit to submit.
    ///
    /// Unknown individual values are dropped. When no known dimension or no
    /// known subject remains the request is rejected and nothing is planned.
    #[instrument(name = "plan_units", skip(self, request), fields(
        dimensions = ?request.dimensions,
        subjects = ?request.subjects,
    ))]
    pub fn plan(&self, request: &FeederRequest) -> Result<Vec<UnitSpec>, ValidationError> {
        let dimensions = self.resolve_dimensions(&request.dimensions)?;
        let subjects = self.resolve_subjects(&request.subjects)?;

        let specs: Vec<UnitSpec> = dimensions
            .iter()
            .flat_map(|dimension| {
                subjects
                    .iter()
                    .flat_map(move |(subject, handler)| handler.expand(dimension, subject))
            })
            .collect();

        debug!(
            dimensions = dimensions.len(),
            subjects = subjects.len(),
            units = specs.len(),
            "Planned units"
        );
        Ok(specs)
    }

    /// Alias members are merged in place; duplicates keep their first position.
    fn resolve_dimensions(&self, requested: &[String]) -> Result<Vec<Dimension>, ValidationError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for input in requested {
            for candidate in self.registry.resolve_dimensions(input) {
                if !self.registry.is_valid_dimension(&candidate) {
                    warn!(dimension = %candidate, "Ignoring unknown dimension");
                    continue;
                }
                let Some(dimension) = self.registry.canonical_dimension(&candidate) else {
                    continue;
                };
                if seen.insert(dimension.clone()) {
                    resolved.push(dimension);
                }
            }
        }

        if resolved.is_empty() {
            return Err(ValidationError::NoKnownDimension {
                requested: requested.to_vec(),
            });
        }
        Ok(resolved)
    }

    fn resolve_subjects(
        &self,
        requested: &[String],
    ) -> Result<Vec<(Subject, SubjectHandler)>, ValidationError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for input in requested {
            let candidates = if input.eq_ignore_ascii_case(ALL_SUBJECTS) {
                self.registry.plain_subjects()
            } else if self.registry.is_valid_subject(input) {
                self.registry.canonical_subject(input).into_iter().collect()
            } else {
                warn!(subject = %input, "Ignoring unknown subject");
                continue;
            };

            for subject in candidates {
                let Some(handler) = self.registry.subject_handler(&subject) else {
                    continue;
                };
                if seen.insert(subject.clone()) {
                    resolved.push((subject, handler));
                }
            }
        }

        if resolved.is_empty() {
            return Err(ValidationError::NoKnownSubject {
                requested: requested.to_vec(),
            });
        }
        Ok(resolved)
    }
}
