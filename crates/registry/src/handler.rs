//! Subject handler table entries

use contracts::{Dimension, Subject, UnitSpec, CUTOFF_MONTHS};

/// How a (dimension, subject) pair turns into work units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectHandler {
    /// Exactly one unit
    Plain,
    /// Twelve units, one per month code `01`..`12`
    MonthlyCutoff,
}

impl SubjectHandler {
    /// Units for one (dimension, subject) pair, in month order for cutoffs.
    pub fn expand(self, dimension: &Dimension, subject: &Subject) -> Vec<UnitSpec> {
        match self {
            Self::Plain => vec![UnitSpec::new(dimension.clone(), subject.clone())],
            Self::MonthlyCutoff => CUTOFF_MONTHS
                .iter()
                .map(|month| UnitSpec::with_sub_key(dimension.clone(), subject.clone(), *month))
                .collect(),
        }
    }
}
