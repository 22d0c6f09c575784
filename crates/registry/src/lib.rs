//! # Registry
//!
//! Pure catalog lookups:
//! - resolve multi-dimension aliases to their member lists
//! - validate dimensions and subjects (case-insensitive, canonical spelling)
//! - map each subject to the handler that decides how it expands

mod catalog;
mod handler;

pub use catalog::StaticCatalog;
pub use handler::SubjectHandler;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use contracts::{Catalog, Dimension, Subject};

/// Reserved subject selecting every known subject except the cutoff subject.
pub const ALL_SUBJECTS: &str = "all";

/// Catalog indexed for lookups.
///
/// Known dimensions and subjects are snapshotted at construction; alias
/// resolution is delegated to the catalog.
#[derive(Clone)]
pub struct Registry {
    catalog: Arc<dyn Catalog>,
    dimensions: HashMap<String, Dimension>,
    dimension_order: Vec<Dimension>,
    subjects: HashMap<String, (Subject, SubjectHandler)>,
    subject_order: Vec<Subject>,
}

impl Registry {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        let dimension_order = catalog.list_known_dimensions();
        let dimensions = dimension_order
            .iter()
            .map(|d| (d.to_lowercase(), d.clone()))
            .collect();

        let cutoff = catalog.cutoff_subject();
        let subject_order = catalog.list_known_subjects();
        let subjects = subject_order
            .iter()
            .map(|s| {
                let handler = match &cutoff {
                    Some(c) if c.eq_ignore_case(s) => SubjectHandler::MonthlyCutoff,
                    _ => SubjectHandler::Plain,
                };
                (s.to_lowercase(), (s.clone(), handler))
            })
            .collect();

        Self {
            catalog,
            dimensions,
            dimension_order,
            subjects,
            subject_order,
        }
    }

    /// Alias members when `input` is a registered alias, otherwise `[input]`.
    pub fn resolve_dimensions(&self, input: &str) -> Vec<Dimension> {
        self.catalog
            .resolve_alias(input)
            .unwrap_or_else(|| vec![Dimension::from(input)])
    }

    pub fn is_alias(&self, input: &str) -> bool {
        self.catalog.resolve_alias(input).is_some()
    }

    pub fn is_valid_dimension(&self, dimension: &str) -> bool {
        self.dimensions.contains_key(&dimension.to_lowercase())
    }

    pub fn is_valid_subject(&self, subject: &str) -> bool {
        self.subjects.contains_key(&subject.to_lowercase())
    }

    /// Catalog spelling of a known dimension.
    pub fn canonical_dimension(&self, dimension: &str) -> Option<Dimension> {
        self.dimensions.get(&dimension.to_lowercase()).cloned()
    }

    /// Catalog spelling of a known subject.
    pub fn canonical_subject(&self, subject: &str) -> Option<Subject> {
        self.subjects
            .get(&subject.to_lowercase())
            .map(|(s, _)| s.clone())
    }

    /// Expansion handler of a known subject.
    pub fn subject_handler(&self, subject: &str) -> Option<SubjectHandler> {
        self.subjects
            .get(&subject.to_lowercase())
            .map(|(_, handler)| *handler)
    }

    pub fn known_dimensions(&self) -> &[Dimension] {
        &self.dimension_order
    }

    pub fn known_subjects(&self) -> &[Subject] {
        &self.subject_order
    }

    /// Every known subject except the cutoff subject, in catalog order.
    pub fn plain_subjects(&self) -> Vec<Subject> {
        self.subject_order
            .iter()
            .filter(|s| self.subject_handler(s) == Some(SubjectHandler::Plain))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("dimensions", &self.dimension_order)
            .field("subjects", &self.subject_order)
            .finish()
    }
}
