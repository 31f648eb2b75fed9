//! State-machine core
//!
//! Advances one trajectory day by day. Within a day the checks run in a fixed
//! precedence order; a check that terminalizes the run ends the day and later
//! checks are not evaluated:
//!
//! ```text
//! For each day d:
//! 1. Crackdown           (protests ESCALATING, regime STATUS_QUO)
//! 2. Protest collapse    (under CRACKDOWN / CONCESSIONS), then protest momentum
//! 3. Concessions
//! 4. Security-force defection   (never while protests are DECLINING)
//! 5. Regime collapse given defection
//! 6. Ethnic coordination / uprising
//! 7. Fragmentation given uprising           → ETHNIC_FRAGMENTATION
//! 8. US posture update (soft then hard tier)
//! 9. Khamenei death, then orderly succession → MANAGED_TRANSITION;
//!    a failed succession collapses the regime
//! 10. End-of-day collapse resolution        → REGIME_COLLAPSE_CHAOTIC
//! 11. Horizon resolution on the last day
//! ```
//!
//! Steps 3 and 6-10 are shared with the ABM macro layer.

use crate::core::window::window_closed;
use crate::economy::ModifierPipeline;
use crate::models::state::{
    Outcome, ProtestEvent, ProtestState, RegimeState, SimulationState, UsPosture,
};
use crate::orchestrator::sampler::EventSampler;
use crate::priors::{PriorsBundle, ProbabilityKey};
use crate::rng::RngManager;

/// Intervention actions evaluated each day, soft tier first
pub const US_ACTIONS: [(ProbabilityKey, UsPosture); 6] = [
    (ProbabilityKey::InformationOps, UsPosture::InformationOps),
    (ProbabilityKey::EconomicEscalation, UsPosture::EconomicEscalation),
    (ProbabilityKey::CovertSupport, UsPosture::CovertSupport),
    (ProbabilityKey::CyberAttack, UsPosture::CyberAttack),
    (ProbabilityKey::KineticStrike, UsPosture::KineticStrike),
    (ProbabilityKey::GroundIntervention, UsPosture::GroundIntervention),
];

/// One Monte Carlo trajectory
pub struct StateMachine<'a> {
    sampler: EventSampler<'a>,
    state: SimulationState,
}

impl<'a> StateMachine<'a> {
    pub fn new(priors: &'a PriorsBundle, pipeline: &'a ModifierPipeline, rng: RngManager) -> Self {
        Self::with_state(priors, pipeline, rng, SimulationState::new())
    }

    /// Start from a prepared state (replays, forced-scenario tests)
    pub fn with_state(
        priors: &'a PriorsBundle,
        pipeline: &'a ModifierPipeline,
        rng: RngManager,
        state: SimulationState,
    ) -> Self {
        Self {
            sampler: EventSampler::new(priors, pipeline, rng),
            state,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn sampler(&self) -> &EventSampler<'a> {
        &self.sampler
    }

    /// Simulate the current day and move to the next one.
    ///
    /// Does nothing once the trajectory is terminal.
    pub fn step_day(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        let sampler = &mut self.sampler;
        let state = &mut self.state;

        crackdown_check(sampler, state);
        protest_check(sampler, state);
        concessions_check(sampler, state);
        defection_check(sampler, state);
        collapse_given_defection_check(sampler, state);
        ethnic_uprising_check(sampler, state);
        if fragmentation_check(sampler, state) {
            return;
        }
        us_posture_update(sampler, state);
        match khamenei_check(sampler, state) {
            Succession::Managed => return,
            Succession::Failed => {
                state.collapse_regime();
            }
            Succession::Pending => {}
        }
        end_of_day(sampler, state);
    }

    /// Run to a terminal outcome and hand back the final state
    pub fn run(mut self) -> SimulationState {
        while !self.state.is_terminal() {
            self.step_day();
        }
        tracing::trace!(
            outcome = ?self.state.final_outcome(),
            day = ?self.state.outcome_day(),
            "trajectory terminalized"
        );
        self.state
    }
}

// ============================================================================
// Steps
// ============================================================================

/// Step 1: mass-casualty crackdown while protests escalate
fn crackdown_check(sampler: &mut EventSampler<'_>, state: &mut SimulationState) {
    if state.protest_state() == ProtestState::Escalating
        && state.regime_state() == RegimeState::StatusQuo
        && sampler.check(ProbabilityKey::MassCasualtyCrackdown, state)
    {
        state.start_crackdown();
    }
}

/// Step 2: protest collapse under crackdown/concessions, otherwise momentum
fn protest_check(sampler: &mut EventSampler<'_>, state: &mut SimulationState) {
    if state.protest_state() != ProtestState::Declining {
        let collapse_key = match state.regime_state() {
            RegimeState::Crackdown => Some(ProbabilityKey::ProtestCollapseGivenCrackdown),
            RegimeState::Concessions => Some(ProbabilityKey::ProtestCollapseGivenConcessions),
            _ => None,
        };
        if let Some(key) = collapse_key {
            if sampler.check(key, state) {
                state.apply_protest_event(ProtestEvent::Collapse);
                return;
            }
        }
    }

    match state.protest_state() {
        ProtestState::Escalating => {
            if sampler.check(ProbabilityKey::ProtestPlateau, state) {
                state.apply_protest_event(ProtestEvent::Plateau);
            }
        }
        ProtestState::Plateaued | ProtestState::Declining => {
            if !state.regime_state().has_fallen()
                && sampler.check(ProbabilityKey::ProtestReescalation, state)
            {
                state.apply_protest_event(ProtestEvent::Reescalate);
            }
        }
    }
}

/// Step 3: meaningful concessions while protests are alive
pub(crate) fn concessions_check(sampler: &mut EventSampler<'_>, state: &mut SimulationState) {
    if state.protest_state() != ProtestState::Declining
        && matches!(
            state.regime_state(),
            RegimeState::StatusQuo | RegimeState::Crackdown
        )
        && sampler.check(ProbabilityKey::MeaningfulConcessions, state)
    {
        state.grant_concessions();
    }
}

/// Step 4: security-force defection; never while protests are DECLINING
fn defection_check(sampler: &mut EventSampler<'_>, state: &mut SimulationState) {
    if state.protest_state() != ProtestState::Declining
        && !state.defection_occurred()
        && sampler.check(ProbabilityKey::SecurityForceDefection, state)
    {
        state.record_defection();
    }
}

/// Step 5: regime collapse in the window after a defection
fn collapse_given_defection_check(sampler: &mut EventSampler<'_>, state: &mut SimulationState) {
    if state.defection_occurred()
        && !state.regime_state().has_fallen()
        && sampler.check(ProbabilityKey::RegimeCollapseGivenDefection, state)
    {
        state.collapse_regime();
    }
}

/// Step 6: ethnic periphery coordinates an uprising
pub(crate) fn ethnic_uprising_check(sampler: &mut EventSampler<'_>, state: &mut SimulationState) {
    if !state.ethnic_uprising() && sampler.check(ProbabilityKey::EthnicCoordination, state) {
        state.record_ethnic_uprising();
    }
}

/// Step 7: fragmentation after an uprising. Returns true when terminal.
pub(crate) fn fragmentation_check(
    sampler: &mut EventSampler<'_>,
    state: &mut SimulationState,
) -> bool {
    state.ethnic_uprising()
        && sampler.check(ProbabilityKey::FragmentationGivenUprising, state)
        && state.terminalize(Outcome::EthnicFragmentation)
}

/// Step 8: each intervention action fires at most once. Hard actions stay
/// ineligible until their anchor (e.g. crackdown start) is recorded.
pub(crate) fn us_posture_update(sampler: &mut EventSampler<'_>, state: &mut SimulationState) {
    for (key, posture) in US_ACTIONS {
        if !state.has_taken_action(posture) && sampler.check(key, state) {
            state.record_us_action(posture);
        }
    }
}

/// Outcome of the step 9 succession check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Succession {
    /// Nothing decided today
    Pending,
    /// Orderly handover; the trajectory is terminal
    Managed,
    /// The succession window ran out with protests still live
    Failed,
}

/// Step 9: supreme leader's death and the succession that follows.
///
/// The caller decides what a failed succession does to the regime.
pub(crate) fn khamenei_check(
    sampler: &mut EventSampler<'_>,
    state: &mut SimulationState,
) -> Succession {
    if !state.khamenei_died() {
        if sampler.check(ProbabilityKey::KhameneiDeath, state) {
            state.record_khamenei_death();
        }
        return Succession::Pending;
    }

    if state.regime_state().has_fallen() {
        return Succession::Pending;
    }

    match sampler.draw(ProbabilityKey::OrderlySuccession, state) {
        Some(true) => {
            if state.begin_orderly_transition() && state.terminalize(Outcome::ManagedTransition) {
                Succession::Managed
            } else {
                Succession::Pending
            }
        }
        Some(false) => {
            let closed = sampler
                .triplet(ProbabilityKey::OrderlySuccession)
                .is_some_and(|t| window_closed(t, state));
            if closed && state.protest_state() != ProtestState::Declining {
                Succession::Failed
            } else {
                Succession::Pending
            }
        }
        None => Succession::Pending,
    }
}

/// Steps 10-11: collapse resolution, horizon resolution, advance the clock
pub(crate) fn end_of_day(sampler: &EventSampler<'_>, state: &mut SimulationState) {
    if state.regime_state() == RegimeState::Collapsed {
        let fragmentation_open = state.ethnic_uprising()
            && sampler
                .triplet(ProbabilityKey::FragmentationGivenUprising)
                .is_some_and(|t| !window_closed(t, state));
        if !fragmentation_open {
            state.terminalize(Outcome::RegimeCollapseChaotic);
            return;
        }
    }

    if state.current_day() >= state.horizon_days() {
        let outcome = state.horizon_outcome();
        state.terminalize(outcome);
    } else {
        state.advance_day();
    }
}
