//! Scenario tests for the state-machine core
//!
//! Most scenarios force individual probabilities to 0 or 1 so the outcome is
//! fixed regardless of seed.

mod common;

use common::{fixture_intel, fixture_priors, inert_bundle, pipeline};
use crisis_simulator_core_rs::economy::{classify_stress, EconomicStress, ModifierPipeline};
use crisis_simulator_core_rs::models::{Outcome, ProtestState, RegimeState, UsPosture};
use crisis_simulator_core_rs::orchestrator::StateMachine;
use crisis_simulator_core_rs::priors::{Anchor, ProbabilityKey, ProbabilityTriplet, TimeBasis};
use crisis_simulator_core_rs::RngManager;

fn certain(anchor: Anchor, offset: u32, days: u32) -> ProbabilityTriplet {
    ProbabilityTriplet::fixed(1.0, anchor, offset, days)
}

fn never(anchor: Anchor, offset: u32, days: u32) -> ProbabilityTriplet {
    ProbabilityTriplet::fixed(0.0, anchor, offset, days)
}

#[test]
fn test_inert_bundle_survives_status_quo() {
    let priors = inert_bundle();
    let pipeline = pipeline(EconomicStress::Stable);
    for seed in 0..5 {
        let state = StateMachine::new(&priors, &pipeline, RngManager::for_run(42, seed)).run();
        assert_eq!(state.final_outcome(), Some(Outcome::RegimeSurvivesStatusQuo));
        assert_eq!(state.outcome_day(), Some(90));
        assert_eq!(state.protest_state(), ProtestState::Escalating);
    }
}

#[test]
fn test_declining_protests_block_defection() {
    let mut priors = inert_bundle();
    priors.set(ProbabilityKey::MassCasualtyCrackdown, certain(Anchor::T0, 0, 90));
    priors.set(
        ProbabilityKey::ProtestCollapseGivenCrackdown,
        certain(Anchor::CrackdownStart, 0, 90),
    );
    priors.set(ProbabilityKey::SecurityForceDefection, certain(Anchor::T0, 0, 90));
    let pipeline = pipeline(EconomicStress::Stable);

    for seed in 0..10 {
        let state = StateMachine::new(&priors, &pipeline, RngManager::new(seed + 1)).run();
        assert_eq!(state.crackdown_start_day(), Some(1));
        assert_eq!(state.protest_state(), ProtestState::Declining);
        assert!(!state.defection_occurred());
        assert_eq!(state.defection_day(), None);
        assert_eq!(state.final_outcome(), Some(Outcome::RegimeSurvivesStatusQuo));
    }
}

#[test]
fn test_concessions_survive_to_horizon() {
    let mut priors = inert_bundle();
    priors.set(ProbabilityKey::MeaningfulConcessions, certain(Anchor::T0, 30, 60));
    let pipeline = pipeline(EconomicStress::Stable);

    let state = StateMachine::new(&priors, &pipeline, RngManager::new(7)).run();
    assert_eq!(state.concessions_start_day(), Some(31));
    assert_eq!(state.regime_state(), RegimeState::Concessions);
    assert_eq!(
        state.final_outcome(),
        Some(Outcome::RegimeSurvivesWithConcessions)
    );
}

#[test]
fn test_collapse_waits_for_open_fragmentation_window() {
    let mut priors = inert_bundle();
    priors.set(ProbabilityKey::EthnicCoordination, certain(Anchor::T0, 0, 90));
    priors.set(
        ProbabilityKey::FragmentationGivenUprising,
        never(Anchor::EthnicUprising, 0, 10),
    );
    priors.set(ProbabilityKey::SecurityForceDefection, certain(Anchor::T0, 2, 1));
    priors.set(
        ProbabilityKey::RegimeCollapseGivenDefection,
        certain(Anchor::DefectionDay, 0, 1),
    );
    let pipeline = pipeline(EconomicStress::Stable);

    let state = StateMachine::new(&priors, &pipeline, RngManager::new(3)).run();
    assert_eq!(state.ethnic_uprising_day(), Some(1));
    assert_eq!(state.collapse_day(), Some(3));
    assert_eq!(state.final_outcome(), Some(Outcome::RegimeCollapseChaotic));
    assert_eq!(state.outcome_day(), Some(10));
}

#[test]
fn test_fragmentation_is_terminal() {
    let mut priors = inert_bundle();
    priors.set(ProbabilityKey::EthnicCoordination, certain(Anchor::T0Plus30, 0, 60));
    priors.set(
        ProbabilityKey::FragmentationGivenUprising,
        certain(Anchor::EthnicUprising, 0, 30),
    );
    let pipeline = pipeline(EconomicStress::Stable);

    let state = StateMachine::new(&priors, &pipeline, RngManager::new(3)).run();
    assert_eq!(state.ethnic_uprising_day(), Some(31));
    assert_eq!(state.final_outcome(), Some(Outcome::EthnicFragmentation));
    assert_eq!(state.outcome_day(), Some(31));
}

#[test]
fn test_hard_action_skipped_until_anchor_recorded() {
    let mut priors = inert_bundle();
    priors.set(ProbabilityKey::CyberAttack, certain(Anchor::CrackdownStart, 0, 30));
    priors.set(ProbabilityKey::KineticStrike, certain(Anchor::CrackdownStart, 0, 30));
    let pipeline = pipeline(EconomicStress::Stable);

    let state = StateMachine::new(&priors, &pipeline, RngManager::new(3)).run();
    assert!(!state.us_hard_intervened());
    assert_eq!(state.us_posture(), UsPosture::Rhetorical);
}

#[test]
fn test_posture_is_highest_action_taken() {
    let mut priors = inert_bundle();
    priors.set(ProbabilityKey::InformationOps, certain(Anchor::T0, 0, 90));
    priors.set(ProbabilityKey::MassCasualtyCrackdown, certain(Anchor::T0, 4, 1));
    priors.set(ProbabilityKey::CyberAttack, certain(Anchor::CrackdownStart, 0, 30));
    let pipeline = pipeline(EconomicStress::Stable);

    let state = StateMachine::new(&priors, &pipeline, RngManager::new(3)).run();
    assert!(state.us_soft_intervened());
    assert!(state.us_hard_intervened());
    assert_eq!(state.us_posture(), UsPosture::CyberAttack);
    assert_eq!(state.events().events_of_type("us_soft_intervention").len(), 1);
    assert_eq!(state.events().first_day_of("us_hard_intervention"), Some(5));
}

#[test]
fn test_instant_key_drawn_once() {
    let mut priors = inert_bundle();
    let mut death = never(Anchor::T0, 0, 0);
    death.time_basis = TimeBasis::Instant;
    priors.set(ProbabilityKey::KhameneiDeath, death);
    let pipeline = pipeline(EconomicStress::Stable);

    let mut machine = StateMachine::new(&priors, &pipeline, RngManager::new(3));
    machine.step_day();
    assert!(machine
        .state()
        .instant_consumed(ProbabilityKey::KhameneiDeath.name()));

    let state = machine.run();
    assert!(!state.khamenei_died());
}

#[test]
fn test_instant_key_fires_on_first_eligible_day() {
    let mut priors = inert_bundle();
    let mut death = certain(Anchor::T0, 5, 0);
    death.time_basis = TimeBasis::Instant;
    priors.set(ProbabilityKey::KhameneiDeath, death);
    let pipeline = pipeline(EconomicStress::Stable);

    let state = StateMachine::new(&priors, &pipeline, RngManager::new(3)).run();
    assert_eq!(state.khamenei_death_day(), Some(6));
}

#[test]
fn test_fixture_runs_respect_invariants() {
    let priors = fixture_priors();
    let (stress, _) = classify_stress(&fixture_intel(), &priors.economic_thresholds).unwrap();
    let pipeline = ModifierPipeline::new(
        stress,
        priors.economic_modifiers.clone(),
        priors.us_intervention_modifiers.clone(),
    );

    for run in 0..500 {
        let state = StateMachine::new(&priors, &pipeline, RngManager::for_run(42, run)).run();
        let outcome = state.final_outcome().expect("every run terminalizes");
        let day = state.outcome_day().unwrap();
        assert!((1..=90).contains(&day));

        match outcome {
            Outcome::ManagedTransition => {
                assert!(state.khamenei_died());
                assert_eq!(state.regime_state(), RegimeState::Transition);
            }
            Outcome::EthnicFragmentation => assert!(state.ethnic_uprising()),
            Outcome::RegimeCollapseChaotic => {
                assert_eq!(state.regime_state(), RegimeState::Collapsed)
            }
            Outcome::RegimeSurvivesWithConcessions => {
                assert_eq!(state.regime_state(), RegimeState::Concessions);
                assert_eq!(day, 90);
            }
            Outcome::RegimeSurvivesStatusQuo => assert_eq!(day, 90),
        }

        if let (Some(defection), Some(collapse)) = (state.defection_day(), state.collapse_day()) {
            assert!(collapse >= defection || state.khamenei_died());
        }
        assert_eq!(
            state.us_hard_intervened(),
            state.us_posture() >= UsPosture::CyberAttack
        );
        assert_eq!(state.events().events_of_type("terminal").len(), 1);
    }
}

#[test]
fn test_same_seed_same_trajectory() {
    let priors = fixture_priors();
    let pipeline = pipeline(EconomicStress::Critical);
    let a = StateMachine::new(&priors, &pipeline, RngManager::for_run(42, 9)).run();
    let b = StateMachine::new(&priors, &pipeline, RngManager::for_run(42, 9)).run();
    assert_eq!(a, b);
}
