//! Catalog trait - externally supplied dimension / subject catalogs

use crate::{Dimension, Subject};

/// Source of known dimensions, subjects and multi-dimension aliases.
pub trait Catalog: Send + Sync {
    /// Member list of a multi-dimension alias, if `dimension` is one.
    fn resolve_alias(&self, dimension: &str) -> Option<Vec<Dimension>>;

    fn list_known_dimensions(&self) -> Vec<Dimension>;

    fn list_known_subjects(&self) -> Vec<Subject>;

    /// Subject that triggers the twelve-way monthly expansion.
    fn cutoff_subject(&self) -> Option<Subject>;
}
