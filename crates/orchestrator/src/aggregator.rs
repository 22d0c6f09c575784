//! Fan-in of unit outcomes

use contracts::{UnitOutcome, UnitSpec};

use crate::error::{AggregateFailure, FailedUnit};

/// Collapse per-unit outcomes into the run result.
///
/// `specs` and `outcomes` are parallel, in submission order. Every failed or
/// canceled unit is reported, not just the first one.
pub fn aggregate(specs: &[UnitSpec], outcomes: &[UnitOutcome]) -> Result<Vec<String>, AggregateFailure> {
    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for (spec, outcome) in specs.iter().zip(outcomes) {
        match outcome {
            UnitOutcome::Finished { summary } => results.push(summary.clone()),
            other => {
                if let Some(failure) = other.failure() {
                    failures.push(FailedUnit {
                        unit: spec.to_string(),
                        failure,
                    });
                }
            }
        }
    }

    if failures.is_empty() {
        Ok(results)
    } else {
        Err(AggregateFailure {
            total: outcomes.len(),
            failures,
        })
    }
}
