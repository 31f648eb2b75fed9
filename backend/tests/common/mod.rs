//! Shared fixtures for the integration tests

#![allow(dead_code)]

use crisis_simulator_core_rs::economy::{
    EconomicModifierTable, EconomicStress, EconomicThresholds, ModifierPipeline, UsModifierTable,
};
use crisis_simulator_core_rs::intel::CompiledIntel;
use crisis_simulator_core_rs::priors::{Anchor, PriorsBundle, ProbabilityKey, ProbabilityTriplet};
use std::collections::BTreeMap;

pub const PRIORS_JSON: &str = include_str!("../fixtures/priors.json");
pub const INTEL_JSON: &str = include_str!("../fixtures/intel.json");

pub fn fixture_priors() -> PriorsBundle {
    PriorsBundle::from_json_str(PRIORS_JSON).expect("fixture priors parse")
}

pub fn fixture_intel() -> CompiledIntel {
    CompiledIntel::from_json_str(INTEL_JSON).expect("fixture intel parses")
}

pub fn thresholds() -> EconomicThresholds {
    EconomicThresholds {
        rial_pressured_threshold: 800_000.0,
        rial_critical_threshold: 1_200_000.0,
        inflation_pressured_threshold: 30.0,
        inflation_critical_threshold: 50.0,
    }
}

/// Every required key present, none of them ever firing
pub fn inert_bundle() -> PriorsBundle {
    let mut bundle = PriorsBundle {
        regime_outcomes: BTreeMap::new(),
        transition_probabilities: BTreeMap::new(),
        us_intervention_probabilities: BTreeMap::new(),
        regional_cascade_probabilities: BTreeMap::new(),
        economic_thresholds: thresholds(),
        economic_modifiers: EconomicModifierTable::default(),
        us_intervention_modifiers: UsModifierTable::default(),
    };
    for key in ProbabilityKey::ALL {
        if key.is_required() {
            bundle.set(key, ProbabilityTriplet::fixed(0.0, Anchor::T0, 0, 90));
        }
    }
    bundle
}

pub fn pipeline(stress: EconomicStress) -> ModifierPipeline {
    ModifierPipeline::new(
        stress,
        EconomicModifierTable::default(),
        UsModifierTable::default(),
    )
}
