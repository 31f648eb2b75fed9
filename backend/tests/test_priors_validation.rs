//! Tests for priors loading and validation

mod common;

use common::{fixture_priors, PRIORS_JSON};
use crisis_simulator_core_rs::priors::{
    validate_priors, Anchor, PriorsBundle, PriorsError, PriorsIssue, ProbabilityKey, TimeBasis,
};
use serde_json::Value;

fn fixture_value() -> Value {
    serde_json::from_str(PRIORS_JSON).unwrap()
}

#[test]
fn test_fixture_is_valid() {
    let bundle = fixture_priors();
    validate_priors(&bundle).unwrap();
    assert_eq!(bundle.regime_outcomes.len(), 5);
    assert_eq!(bundle.regional_cascade_probabilities.len(), 2);
}

#[test]
fn test_fixture_time_semantics_parsed() {
    let bundle = fixture_priors();
    let ethnic = bundle.get(ProbabilityKey::EthnicCoordination).unwrap();
    assert_eq!(ethnic.anchor, Anchor::T0Plus30);
    assert_eq!(ethnic.window_days, 60);

    let plateau = bundle.get(ProbabilityKey::ProtestPlateau).unwrap();
    assert_eq!(plateau.time_basis, TimeBasis::Daily);
}

#[test]
fn test_missing_required_key_is_named() {
    let mut bundle = fixture_priors();
    bundle.remove(ProbabilityKey::SecurityForceDefection);

    let err = validate_priors(&bundle).unwrap_err();
    assert!(err
        .to_string()
        .contains("transition_probabilities.security_force_defection_given_protests_30d"));
    assert_eq!(
        err.issues(),
        &[PriorsIssue::MissingKey {
            section: "transition_probabilities".to_string(),
            key: "security_force_defection_given_protests_30d".to_string(),
        }]
    );
}

#[test]
fn test_optional_keys_may_be_absent() {
    let mut bundle = fixture_priors();
    bundle.remove(ProbabilityKey::ProtestPlateau);
    bundle.remove(ProbabilityKey::ProtestReescalation);
    assert!(validate_priors(&bundle).is_ok());
}

#[test]
fn test_all_issues_are_collected() {
    let mut doc = fixture_value();
    let transitions = doc["transition_probabilities"].as_object_mut().unwrap();
    transitions.remove("khamenei_death_90d");
    transitions["protest_collapse_given_crackdown"]["low"] = Value::from(0.9);
    transitions["regime_collapse_given_defection"]["window_days"] = Value::from(0);
    doc["us_intervention_probabilities"]
        .as_object_mut()
        .unwrap()
        .remove("ground_intervention_given_collapse");

    let bundle = PriorsBundle::from_value(&doc).unwrap();
    let err = validate_priors(&bundle).unwrap_err();
    let issues = err.issues();
    assert_eq!(issues.len(), 4, "issues: {:?}", issues);

    let message = err.to_string();
    assert!(message.contains("khamenei_death_90d"));
    assert!(message.contains("ground_intervention_given_collapse"));
    assert!(message.contains("transition_probabilities.protest_collapse_given_crackdown"));
    assert!(message.contains("transition_probabilities.regime_collapse_given_defection"));
}

#[test]
fn test_malformed_triplet_reports_path() {
    let mut doc = fixture_value();
    doc["transition_probabilities"]["khamenei_death_90d"]["anchor"] = Value::from("next_tuesday");
    doc["transition_probabilities"]["orderly_succession_given_khamenei_death"]
        .as_object_mut()
        .unwrap()
        .remove("time_basis");

    let err = PriorsBundle::from_value(&doc).unwrap_err();
    let paths: Vec<String> = err
        .issues()
        .iter()
        .filter_map(|issue| match issue {
            PriorsIssue::MalformedEntry { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();
    assert!(paths.contains(&"transition_probabilities.khamenei_death_90d".to_string()));
    assert!(paths.contains(
        &"transition_probabilities.orderly_succession_given_khamenei_death".to_string()
    ));
}

#[test]
fn test_missing_sections_reported_together() {
    let mut doc = fixture_value();
    let root = doc.as_object_mut().unwrap();
    root.remove("economic_thresholds");
    root.remove("regime_outcomes");

    let err = PriorsBundle::from_value(&doc).unwrap_err();
    let sections: Vec<&str> = err
        .issues()
        .iter()
        .filter_map(|issue| match issue {
            PriorsIssue::MissingSection { section } => Some(section.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(sections.len(), 2);
    assert!(sections.contains(&"economic_thresholds"));
    assert!(sections.contains(&"regime_outcomes"));
}

#[test]
fn test_threshold_ordering_checked() {
    let mut bundle = fixture_priors();
    bundle.economic_thresholds.rial_pressured_threshold = 2_000_000.0;
    let err = validate_priors(&bundle).unwrap_err();
    assert!(err.to_string().contains("rial_pressured_threshold"));
}

#[test]
fn test_negative_modifier_rejected() {
    let mut bundle = fixture_priors();
    bundle
        .economic_modifiers
        .critical
        .insert("elite_fracture".to_string(), -1.0);
    let err = validate_priors(&bundle).unwrap_err();
    assert!(err.to_string().contains("economic_modifiers.critical.elite_fracture"));
}

#[test]
fn test_invalid_json_is_parse_error() {
    let err = PriorsBundle::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, PriorsError::Parse(_)));
    assert!(err.issues().is_empty());
}

#[test]
fn test_us_modifier_section_defaults_when_absent() {
    let bundle = fixture_priors();
    assert_eq!(bundle.us_intervention_modifiers.hard["regime_collapse"], 1.30);
    assert_eq!(bundle.us_intervention_modifiers.soft["protest_escalation"], 1.15);
}

#[test]
fn test_malformed_and_missing_reported_in_one_pass() {
    let mut doc = fixture_value();
    doc["transition_probabilities"]["khamenei_death_90d"]["time_basis"] = Value::from("weekly");
    doc["us_intervention_probabilities"]
        .as_object_mut()
        .unwrap()
        .remove("cyber_attack_given_crackdown");
    doc["economic_thresholds"]["rial_pressured_threshold"] = Value::from(5_000_000.0);

    let err = PriorsBundle::from_value(&doc).unwrap_err();
    let issues = err.issues();
    assert_eq!(issues.len(), 3, "issues: {:?}", issues);
    assert!(issues.contains(&PriorsIssue::MissingKey {
        section: "us_intervention_probabilities".to_string(),
        key: "cyber_attack_given_crackdown".to_string(),
    }));
    assert!(issues.iter().any(|issue| matches!(
        issue,
        PriorsIssue::MalformedEntry { path, .. }
            if path == "transition_probabilities.khamenei_death_90d"
    )));
    assert!(issues.iter().any(|issue| matches!(
        issue,
        PriorsIssue::BadThreshold { field, .. } if field == "rial_pressured_threshold"
    )));
}

#[test]
fn test_malformed_key_not_also_reported_missing() {
    let mut doc = fixture_value();
    doc["transition_probabilities"]["regime_collapse_given_defection"] = Value::from("likely");

    let err = PriorsBundle::from_value(&doc).unwrap_err();
    assert_eq!(err.issues().len(), 1, "issues: {:?}", err.issues());
    assert!(matches!(err.issues()[0], PriorsIssue::MalformedEntry { .. }));
}
