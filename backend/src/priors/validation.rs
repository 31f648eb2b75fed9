// Priors validation
//
// Pre-batch safety checks so no run ever starts on a broken bundle:
// - Required probability keys present
// - Triplet ordering and range
// - Time semantics (positive window length)
// - Economic threshold ordering
// - Modifier multipliers finite and non-negative

use crate::priors::keys::ProbabilityKey;
use crate::priors::triplet::TimeBasis;
use crate::priors::{PriorsBundle, ProbabilityTriplet, Section};
use std::collections::BTreeMap;
use thiserror::Error;

/// A single problem found in the priors document
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PriorsIssue {
    #[error("missing section '{section}'")]
    MissingSection { section: String },

    #[error("missing required probability '{section}.{key}'")]
    MissingKey { section: String, key: String },

    #[error("malformed entry '{path}': {reason}")]
    MalformedEntry { path: String, reason: String },

    #[error("'{path}' must satisfy 0 <= low <= mode <= high <= 1 (got low={low}, mode={mode}, high={high})")]
    BadOrdering {
        path: String,
        low: f64,
        mode: f64,
        high: f64,
    },

    #[error("'{path}' uses time_basis=window but window_days is 0")]
    ZeroWindow { path: String },

    #[error("economic threshold '{field}' is invalid: {reason}")]
    BadThreshold { field: String, reason: String },

    #[error("modifier '{path}' must be a finite non-negative multiplier (got {value})")]
    BadModifier { path: String, value: f64 },
}

/// Priors loading/validation error
#[derive(Debug, Error)]
pub enum PriorsError {
    #[error("priors document is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("priors validation failed with {} issue(s): {}", .0.len(), join_issues(.0))]
    Invalid(Vec<PriorsIssue>),
}

impl PriorsError {
    /// Issues carried by an `Invalid` error (empty for parse errors)
    pub fn issues(&self) -> &[PriorsIssue] {
        match self {
            PriorsError::Invalid(issues) => issues,
            PriorsError::Parse(_) => &[],
        }
    }
}

fn join_issues(issues: &[PriorsIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a loaded bundle before any run executes.
///
/// Runs every check and returns all issues found.
///
/// # Example
///
/// ```rust,ignore
/// let bundle = PriorsBundle::from_json_str(json)?;
/// if let Err(e) = validate_priors(&bundle) {
///     for issue in e.issues() {
///         eprintln!("{}", issue);
///     }
/// }
/// ```
pub fn validate_priors(bundle: &PriorsBundle) -> Result<(), PriorsError> {
    let mut issues = Vec::new();

    issues.extend(validate_required_keys(bundle));
    for section in [
        Section::RegimeOutcomes,
        Section::TransitionProbabilities,
        Section::UsInterventionProbabilities,
        Section::RegionalCascadeProbabilities,
    ] {
        for (key, triplet) in bundle.section(section) {
            let path = format!("{}.{}", section.as_str(), key);
            issues.extend(validate_triplet(&path, triplet));
        }
    }
    issues.extend(validate_thresholds(bundle));
    issues.extend(validate_modifiers(bundle));

    if issues.is_empty() {
        Ok(())
    } else {
        Err(PriorsError::Invalid(issues))
    }
}

// ============================================================================
// Required keys
// ============================================================================

fn validate_required_keys(bundle: &PriorsBundle) -> Vec<PriorsIssue> {
    ProbabilityKey::ALL
        .iter()
        .filter(|key| key.is_required() && bundle.get(**key).is_none())
        .map(|key| PriorsIssue::MissingKey {
            section: key.section().as_str().to_string(),
            key: key.name().to_string(),
        })
        .collect()
}

// ============================================================================
// Triplets
// ============================================================================

/// Ordering, range and time-semantics checks for one triplet
pub fn validate_triplet(path: &str, triplet: &ProbabilityTriplet) -> Vec<PriorsIssue> {
    let mut issues = Vec::new();

    let ProbabilityTriplet {
        low, mode, high, ..
    } = *triplet;
    let finite = low.is_finite() && mode.is_finite() && high.is_finite();
    if !finite || low < 0.0 || high > 1.0 || low > mode || mode > high {
        issues.push(PriorsIssue::BadOrdering {
            path: path.to_string(),
            low,
            mode,
            high,
        });
    }

    if triplet.time_basis == TimeBasis::Window && triplet.window_days == 0 {
        issues.push(PriorsIssue::ZeroWindow {
            path: path.to_string(),
        });
    }

    issues
}

// ============================================================================
// Economic thresholds and modifiers
// ============================================================================

fn validate_thresholds(bundle: &PriorsBundle) -> Vec<PriorsIssue> {
    let t = &bundle.economic_thresholds;
    let mut issues = Vec::new();

    for (field, value) in [
        ("rial_pressured_threshold", t.rial_pressured_threshold),
        ("rial_critical_threshold", t.rial_critical_threshold),
        ("inflation_pressured_threshold", t.inflation_pressured_threshold),
        ("inflation_critical_threshold", t.inflation_critical_threshold),
    ] {
        if !value.is_finite() || value < 0.0 {
            issues.push(PriorsIssue::BadThreshold {
                field: field.to_string(),
                reason: format!("must be a finite non-negative number (got {})", value),
            });
        }
    }

    if t.rial_pressured_threshold > t.rial_critical_threshold {
        issues.push(PriorsIssue::BadThreshold {
            field: "rial_pressured_threshold".to_string(),
            reason: "must not exceed rial_critical_threshold".to_string(),
        });
    }
    if t.inflation_pressured_threshold > t.inflation_critical_threshold {
        issues.push(PriorsIssue::BadThreshold {
            field: "inflation_pressured_threshold".to_string(),
            reason: "must not exceed inflation_critical_threshold".to_string(),
        });
    }

    issues
}

fn validate_modifiers(bundle: &PriorsBundle) -> Vec<PriorsIssue> {
    let mut issues = Vec::new();
    let tables: [(&str, &BTreeMap<String, f64>); 4] = [
        ("economic_modifiers.pressured", &bundle.economic_modifiers.pressured),
        ("economic_modifiers.critical", &bundle.economic_modifiers.critical),
        ("us_intervention_modifiers.soft", &bundle.us_intervention_modifiers.soft),
        ("us_intervention_modifiers.hard", &bundle.us_intervention_modifiers.hard),
    ];

    for (prefix, table) in tables {
        for (event_type, &value) in table {
            if !value.is_finite() || value < 0.0 {
                issues.push(PriorsIssue::BadModifier {
                    path: format!("{}.{}", prefix, event_type),
                    value,
                });
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priors::Anchor;

    #[test]
    fn test_inverted_triplet_rejected() {
        let triplet = ProbabilityTriplet::window(0.5, 0.3, 0.6, Anchor::T0, 0, 10);
        let issues = validate_triplet("transition_probabilities.x", &triplet);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].to_string().contains("transition_probabilities.x"));
    }

    #[test]
    fn test_zero_window_rejected() {
        let triplet = ProbabilityTriplet::window(0.1, 0.2, 0.3, Anchor::T0, 0, 0);
        let issues = validate_triplet("p", &triplet);
        assert_eq!(issues, vec![PriorsIssue::ZeroWindow { path: "p".into() }]);
    }

    #[test]
    fn test_out_of_range_and_zero_window_both_reported() {
        let triplet = ProbabilityTriplet::window(0.1, 0.2, 1.3, Anchor::T0, 0, 0);
        assert_eq!(validate_triplet("p", &triplet).len(), 2);
    }

    #[test]
    fn test_daily_basis_needs_no_window() {
        let mut triplet = ProbabilityTriplet::window(0.1, 0.2, 0.3, Anchor::T0, 0, 0);
        triplet.time_basis = TimeBasis::Daily;
        assert!(validate_triplet("p", &triplet).is_empty());
    }
}
