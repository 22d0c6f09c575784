//! Catalog backed by the blueprint's `[catalog]` section

use std::collections::HashMap;

use contracts::{Catalog, CatalogConfig, Dimension, Subject};

/// Fixed catalog loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    dimensions: Vec<Dimension>,
    subjects: Vec<Subject>,
    cutoff_subject: Option<Subject>,
    aliases: HashMap<String, Vec<Dimension>>,
}

impl StaticCatalog {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            dimensions: config.dimensions.iter().map(|d| Dimension::new(d)).collect(),
            subjects: config.subjects.iter().map(|s| Subject::new(s)).collect(),
            cutoff_subject: config.cutoff_subject.as_deref().map(Subject::new),
            aliases: config
                .aliases
                .iter()
                .map(|(alias, members)| {
                    (
                        alias.to_lowercase(),
                        members.iter().map(|m| Dimension::new(m)).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl Catalog for StaticCatalog {
    fn resolve_alias(&self, dimension: &str) -> Option<Vec<Dimension>> {
        self.aliases.get(&dimension.to_lowercase()).cloned()
    }

    fn list_known_dimensions(&self) -> Vec<Dimension> {
        self.dimensions.clone()
    }

    fn list_known_subjects(&self) -> Vec<Subject> {
        self.subjects.clone()
    }

    fn cutoff_subject(&self) -> Option<Subject> {
        self.cutoff_subject.clone()
    }
}
