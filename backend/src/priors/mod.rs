//! Resolved priors bundle
//!
//! The bundle is read-only and shared by every run of a batch. It is loaded
//! from the resolved-priors JSON document into strict structs; every
//! malformed entry is collected instead of stopping at the first one, so an
//! analyst fixing the file sees the whole list at once.
//!
//! # Example
//!
//! ```rust,ignore
//! use crisis_simulator_core_rs::priors::{validate_priors, PriorsBundle};
//!
//! let bundle = PriorsBundle::from_json_str(&std::fs::read_to_string("priors.json")?)?;
//! validate_priors(&bundle)?;
//! ```

pub mod keys;
pub mod triplet;
pub mod validation;

pub use keys::{ProbabilityKey, Section};
pub use triplet::{Anchor, Distribution, ProbabilityTriplet, TimeBasis};
pub use validation::{validate_priors, PriorsError, PriorsIssue};

use crate::economy::modifiers::{EconomicModifierTable, UsModifierTable};
use crate::economy::EconomicThresholds;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Map of probability key → triplet for one bundle section
pub type TripletSection = BTreeMap<String, ProbabilityTriplet>;

/// Complete priors bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorsBundle {
    /// Terminal-outcome priors; diagnostic only, never sampled
    pub regime_outcomes: TripletSection,
    pub transition_probabilities: TripletSection,
    pub us_intervention_probabilities: TripletSection,
    /// Parsed and validated, not consulted by either engine
    pub regional_cascade_probabilities: TripletSection,
    pub economic_thresholds: EconomicThresholds,
    pub economic_modifiers: EconomicModifierTable,
    pub us_intervention_modifiers: UsModifierTable,
}

impl PriorsBundle {
    /// Parse the resolved-priors document.
    ///
    /// Structural problems (missing sections, entries that do not match the
    /// triplet schema) are all reported together in `PriorsError::Invalid`,
    /// along with whatever [`validate_priors`] finds in the entries that did
    /// parse. A document that parses cleanly still needs `validate_priors`.
    pub fn from_json_str(json: &str) -> Result<Self, PriorsError> {
        let document: Value = serde_json::from_str(json).map_err(PriorsError::Parse)?;
        Self::from_value(&document)
    }

    pub fn from_value(document: &Value) -> Result<Self, PriorsError> {
        let mut issues = Vec::new();

        let Some(root) = document.as_object() else {
            return Err(PriorsError::Invalid(vec![PriorsIssue::MalformedEntry {
                path: "<root>".to_string(),
                reason: "priors document must be a JSON object".to_string(),
            }]));
        };

        let regime_outcomes = parse_triplet_section(root, Section::RegimeOutcomes, &mut issues);
        let transition_probabilities =
            parse_triplet_section(root, Section::TransitionProbabilities, &mut issues);
        let us_intervention_probabilities =
            parse_triplet_section(root, Section::UsInterventionProbabilities, &mut issues);
        let regional_cascade_probabilities =
            parse_triplet_section(root, Section::RegionalCascadeProbabilities, &mut issues);

        let economic_thresholds =
            parse_required::<EconomicThresholds>(root, "economic_thresholds", &mut issues);
        let economic_modifiers =
            parse_required::<EconomicModifierTable>(root, "economic_modifiers", &mut issues);
        let us_intervention_modifiers = match root.get("us_intervention_modifiers") {
            None | Some(Value::Null) => Some(UsModifierTable::default()),
            Some(value) => parse_value(value, "us_intervention_modifiers", &mut issues),
        };

        let complete = issues.is_empty()
            && economic_thresholds.is_some()
            && economic_modifiers.is_some()
            && us_intervention_modifiers.is_some();

        // Unparsed tables stand in as zero thresholds and empty modifier maps,
        // neither of which raises a validation issue of its own.
        let bundle = Self {
            regime_outcomes,
            transition_probabilities,
            us_intervention_probabilities,
            regional_cascade_probabilities,
            economic_thresholds: economic_thresholds.unwrap_or(EconomicThresholds {
                rial_pressured_threshold: 0.0,
                rial_critical_threshold: 0.0,
                inflation_pressured_threshold: 0.0,
                inflation_critical_threshold: 0.0,
            }),
            economic_modifiers: economic_modifiers.unwrap_or_default(),
            us_intervention_modifiers: us_intervention_modifiers.unwrap_or_default(),
        };

        if complete {
            return Ok(bundle);
        }

        // Report what the parsed part is missing in the same pass. Keys that
        // are present but malformed were reported above.
        if let Err(semantic) = validate_priors(&bundle) {
            issues.extend(semantic.issues().iter().filter(|issue| match issue {
                PriorsIssue::MissingKey { section, key } => root
                    .get(section.as_str())
                    .and_then(Value::as_object)
                    .is_some_and(|entries| !entries.contains_key(key.as_str())),
                _ => true,
            }).cloned());
        }
        Err(PriorsError::Invalid(issues))
    }

    /// Triplet section by name
    pub fn section(&self, section: Section) -> &TripletSection {
        match section {
            Section::RegimeOutcomes => &self.regime_outcomes,
            Section::TransitionProbabilities => &self.transition_probabilities,
            Section::UsInterventionProbabilities => &self.us_intervention_probabilities,
            Section::RegionalCascadeProbabilities => &self.regional_cascade_probabilities,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut TripletSection {
        match section {
            Section::RegimeOutcomes => &mut self.regime_outcomes,
            Section::TransitionProbabilities => &mut self.transition_probabilities,
            Section::UsInterventionProbabilities => &mut self.us_intervention_probabilities,
            Section::RegionalCascadeProbabilities => &mut self.regional_cascade_probabilities,
        }
    }

    /// Triplet for an engine key, if present
    pub fn get(&self, key: ProbabilityKey) -> Option<&ProbabilityTriplet> {
        self.section(key.section()).get(key.name())
    }

    /// Replace (or add) the triplet for an engine key
    pub fn set(&mut self, key: ProbabilityKey, triplet: ProbabilityTriplet) {
        self.section_mut(key.section())
            .insert(key.name().to_string(), triplet);
    }

    /// Drop the triplet for an engine key
    pub fn remove(&mut self, key: ProbabilityKey) -> Option<ProbabilityTriplet> {
        self.section_mut(key.section()).remove(key.name())
    }

    /// Total number of triplets across all sections
    pub fn triplet_count(&self) -> usize {
        self.regime_outcomes.len()
            + self.transition_probabilities.len()
            + self.us_intervention_probabilities.len()
            + self.regional_cascade_probabilities.len()
    }
}

/// Keys starting with `_` carry provenance notes, not probabilities
fn is_annotation(key: &str) -> bool {
    key.starts_with('_')
}

fn parse_triplet_section(
    root: &Map<String, Value>,
    section: Section,
    issues: &mut Vec<PriorsIssue>,
) -> TripletSection {
    let mut parsed = TripletSection::new();
    let name = section.as_str();

    let entries = match root.get(name) {
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            issues.push(PriorsIssue::MalformedEntry {
                path: name.to_string(),
                reason: "section must be an object of probability triplets".to_string(),
            });
            return parsed;
        }
        None => {
            issues.push(PriorsIssue::MissingSection {
                section: name.to_string(),
            });
            return parsed;
        }
    };

    for (key, value) in entries {
        if is_annotation(key) {
            continue;
        }
        let path = format!("{}.{}", name, key);
        if let Some(triplet) = parse_value::<ProbabilityTriplet>(value, &path, issues) {
            parsed.insert(key.clone(), triplet);
        }
    }

    parsed
}

fn parse_required<T: DeserializeOwned>(
    root: &Map<String, Value>,
    name: &str,
    issues: &mut Vec<PriorsIssue>,
) -> Option<T> {
    match root.get(name) {
        Some(value) => parse_value(value, name, issues),
        None => {
            issues.push(PriorsIssue::MissingSection {
                section: name.to_string(),
            });
            None
        }
    }
}

fn parse_value<T: DeserializeOwned>(
    value: &Value,
    path: &str,
    issues: &mut Vec<PriorsIssue>,
) -> Option<T> {
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            issues.push(PriorsIssue::MalformedEntry {
                path: path.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_document() -> Value {
        json!({
            "regime_outcomes": {},
            "transition_probabilities": {
                "_source": "analyst notes",
                "khamenei_death_90d": {
                    "low": 0.02, "mode": 0.04, "high": 0.08,
                    "time_basis": "window", "anchor": "t0", "window_days": 90
                }
            },
            "us_intervention_probabilities": {},
            "regional_cascade_probabilities": {},
            "economic_thresholds": {
                "rial_pressured_threshold": 800000.0,
                "rial_critical_threshold": 1200000.0,
                "inflation_pressured_threshold": 30.0,
                "inflation_critical_threshold": 50.0
            },
            "economic_modifiers": {
                "pressured": {"protest_escalation": 1.1},
                "critical": {"protest_escalation": 1.2}
            }
        })
    }

    #[test]
    fn test_annotations_are_skipped() {
        let bundle = PriorsBundle::from_value(&minimal_document()).unwrap();
        assert_eq!(bundle.transition_probabilities.len(), 1);
        assert!(bundle.get(ProbabilityKey::KhameneiDeath).is_some());
    }

    #[test]
    fn test_us_modifiers_default_when_absent() {
        let bundle = PriorsBundle::from_value(&minimal_document()).unwrap();
        assert_eq!(bundle.us_intervention_modifiers, UsModifierTable::default());
    }

    #[test]
    fn test_all_structural_issues_collected() {
        let mut doc = minimal_document();
        let root = doc.as_object_mut().unwrap();
        root.remove("economic_thresholds");
        root.remove("us_intervention_probabilities");
        root["transition_probabilities"]["khamenei_death_90d"]["time_basis"] = json!("weekly");

        let err = PriorsBundle::from_value(&doc).unwrap_err();
        match err {
            PriorsError::Invalid(issues) => assert_eq!(issues.len(), 3, "{:?}", issues),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
