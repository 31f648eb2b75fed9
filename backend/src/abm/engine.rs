//! ABM daily loop
//!
//! ```text
//! For each day d:
//! 1. Environment: economic pressure (rial rate), crackdown intensity, mood
//! 2. Agent step on the day d-1 snapshot:
//!    density   = A · active / degree                 (CSR pass)
//!    drive     = (w_ρ·ρ + w_g·pressure·sensitivity + mood − fear·intensity)
//!                × (1 − suppression·hardliner_share), floored at 0
//!    threshold = θ + penalty·exhaustion (− ramp·pressure for merchants)
//!    p         = logistic((drive − threshold) / temperature)
//!    conscripts defect on (density ≥ cutoff ∧ crackdown) ∨ peers ≥ 4 of 8
//! 3. Macro layer: protest trend, gated crackdown, macro defection at 30%,
//!    then the shared concessions / ethnic / US / succession checks
//! 4. Perfect storm: (defection ∨ failed succession) ∧ fraction ≥ 0.20
//!    ∧ pressure ≥ 0.75 for 3 days
//! 5. End-of-day resolution and rial drift
//! ```

use crate::abm::{AbmConfig, ContactGraph, Population};
use crate::economy::{rial_pressure, EconomicStress, EconomicThresholds};
use crate::models::agent::AgentType;
use crate::models::state::{ProtestEvent, ProtestState, RegimeState, SimulationState};
use crate::orchestrator::sampler::EventSampler;
use crate::orchestrator::state_machine::{
    concessions_check, end_of_day, ethnic_uprising_check, fragmentation_check, khamenei_check,
    us_posture_update, Succession,
};
use crate::orchestrator::BatchContext;
use crate::priors::ProbabilityKey;
use crate::rng::RngManager;
use serde::Serialize;

/// Result of one ABM trajectory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbmTrajectory {
    pub state: SimulationState,
    /// Protesting share of the whole population, index 0 = day 1
    pub daily_protest_fraction: Vec<f64>,
    /// Defected share of conscripts, index 0 = day 1
    pub daily_defection_fraction: Vec<f64>,
    pub macro_defection_day: Option<u32>,
    /// Day the succession window closed without a handover
    pub succession_failed_day: Option<u32>,
}

/// One ABM run in progress
pub struct AbmRun<'a> {
    config: &'a AbmConfig,
    graph: &'a ContactGraph,
    thresholds: EconomicThresholds,
    stress: EconomicStress,
    sampler: EventSampler<'a>,
    population: Population,
    state: SimulationState,
    rial_rate: f64,
    previous_fraction: f64,
    storm_streak: u32,
    daily_protest_fraction: Vec<f64>,
    daily_defection_fraction: Vec<f64>,
    macro_defection_day: Option<u32>,
    succession_failed_day: Option<u32>,
}

impl<'a> AbmRun<'a> {
    /// The sampler draws its base probabilities before the population is
    /// built, so both engines consume the run's stream in the same order.
    pub fn new(
        context: &'a BatchContext,
        config: &'a AbmConfig,
        graph: &'a ContactGraph,
        rng: RngManager,
    ) -> Self {
        let mut sampler = EventSampler::new(context.priors(), context.pipeline(), rng);
        let population = Population::new(config, graph, sampler.rng_mut());
        let previous_fraction = population.protesting_fraction();
        Self {
            config,
            graph,
            thresholds: context.priors().economic_thresholds,
            stress: context.stress(),
            sampler,
            population,
            state: SimulationState::new(),
            rial_rate: context.inputs().rial_usd_rate,
            previous_fraction,
            storm_streak: 0,
            daily_protest_fraction: Vec::new(),
            daily_defection_fraction: Vec::new(),
            macro_defection_day: None,
            succession_failed_day: None,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Crackdown intensity in `[0, 1]`, ramping from the day after the
    /// crackdown starts. Zero once the regime has moved on (concessions).
    pub fn crackdown_intensity(&self) -> f64 {
        match self.state.crackdown_start_day() {
            Some(start)
                if self.state.regime_state() == RegimeState::Crackdown
                    && self.state.current_day() > start =>
            {
                let days = f64::from(self.state.current_day() - start);
                (self.config.crackdown_ramp * days).min(1.0)
            }
            _ => 0.0,
        }
    }

    pub fn step_day(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        let pressure = rial_pressure(self.rial_rate, &self.thresholds);
        let intensity = self.crackdown_intensity();
        self.agent_step(pressure, intensity);

        let fraction = self.population.protesting_fraction();
        let defection = self.population.conscript_defection_fraction();
        self.daily_protest_fraction.push(fraction);
        self.daily_defection_fraction.push(defection);

        if self.macro_step(fraction, defection, pressure) {
            return;
        }
        end_of_day(&self.sampler, &mut self.state);

        let drift = match self.stress {
            EconomicStress::Stable => 0.0,
            EconomicStress::Pressured => self.config.rial_drift_pressured,
            EconomicStress::Critical => self.config.rial_drift_critical,
        };
        self.rial_rate *= 1.0 + drift;
    }

    pub fn run(mut self) -> AbmTrajectory {
        while !self.state.is_terminal() {
            self.step_day();
        }
        tracing::trace!(
            outcome = ?self.state.final_outcome(),
            macro_defection_day = ?self.macro_defection_day,
            "abm trajectory terminalized"
        );
        AbmTrajectory {
            state: self.state,
            daily_protest_fraction: self.daily_protest_fraction,
            daily_defection_fraction: self.daily_defection_fraction,
            macro_defection_day: self.macro_defection_day,
            succession_failed_day: self.succession_failed_day,
        }
    }

    /// Agent updates for one day, all computed from yesterday's arrays
    fn agent_step(&mut self, pressure: f64, intensity: f64) {
        let cfg = self.config;
        let pop = &self.population;
        let n = pop.len();

        let mut density = vec![0.0; n];
        self.graph.neighbor_mean(pop.active(), &mut density);

        let mood = match self.state.protest_state() {
            ProtestState::Escalating => cfg.escalating_mood,
            ProtestState::Plateaued => 0.0,
            ProtestState::Declining => cfg.declining_mood,
        };

        let mut active = vec![0.0; n];
        let mut exhaustion = pop.exhaustion_levels().to_vec();
        let mut defected = pop.defected().to_vec();
        let rng = self.sampler.rng_mut();

        for agent in 0..n {
            let kind = pop.kind(agent);
            if !kind.can_protest() {
                continue;
            }

            let raw_drive = cfg.density_weight * density[agent]
                + cfg.grievance_weight * pressure * kind.economic_sensitivity()
                + mood
                - cfg.fear_weight * intensity;
            let suppression = 1.0 - cfg.hardliner_suppression * pop.hardliner_share(agent);
            let drive = (raw_drive * suppression).max(0.0);

            let mut threshold = pop.threshold(agent) + cfg.exhaustion_penalty * exhaustion[agent];
            if kind == AgentType::Merchant {
                threshold -= cfg.merchant_ramp * pressure;
            }

            if rng.bernoulli(logistic((drive - threshold) / cfg.temperature)) {
                active[agent] = 1.0;
                exhaustion[agent] = (exhaustion[agent] + cfg.exhaustion_gain).min(1.0);
            } else {
                exhaustion[agent] = (exhaustion[agent] - cfg.exhaustion_decay).max(0.0);
            }
        }

        let crackdown_active = intensity > 0.0;
        for (position, &agent) in pop.conscripts().iter().enumerate() {
            if pop.has_defected(agent) {
                continue;
            }
            let pressed = crackdown_active && density[agent] >= cfg.conscript_density_cutoff;
            let peers = pop.defected_peers(position, cfg.conscript_peer_span)
                >= cfg.conscript_peer_defections;
            if pressed || peers {
                defected[agent] = true;
            }
        }

        self.population.commit(active, exhaustion, defected);
    }

    /// Macro state updates. Returns true when the run terminalized.
    fn macro_step(&mut self, fraction: f64, defection: f64, pressure: f64) -> bool {
        let cfg = self.config;
        let sampler = &mut self.sampler;
        let state = &mut self.state;

        let delta = fraction - self.previous_fraction;
        self.previous_fraction = fraction;
        if delta > cfg.trend_epsilon {
            state.apply_protest_event(ProtestEvent::Reescalate);
        } else if delta < -cfg.trend_epsilon {
            state.apply_protest_event(ProtestEvent::Collapse);
        } else if state.protest_state() == ProtestState::Escalating {
            state.apply_protest_event(ProtestEvent::Plateau);
        }

        if state.regime_state() == RegimeState::StatusQuo
            && fraction >= cfg.crackdown_activation_gate
            && sampler.check(ProbabilityKey::MassCasualtyCrackdown, state)
        {
            state.start_crackdown();
        }

        if defection >= cfg.macro_defection_threshold && state.record_defection() {
            self.macro_defection_day = Some(state.current_day());
        }

        concessions_check(sampler, state);
        ethnic_uprising_check(sampler, state);
        if fragmentation_check(sampler, state) {
            return true;
        }
        us_posture_update(sampler, state);
        match khamenei_check(sampler, state) {
            Succession::Managed => return true,
            Succession::Failed => {
                self.succession_failed_day.get_or_insert(state.current_day());
            }
            Succession::Pending => {}
        }

        // A failed succession stands in for defection, never for the other terms
        let storm = (state.defection_occurred() || self.succession_failed_day.is_some())
            && fraction >= cfg.storm_protest_fraction
            && pressure >= cfg.storm_economic_pressure;
        self.storm_streak = if storm { self.storm_streak + 1 } else { 0 };
        if self.storm_streak >= cfg.storm_days {
            state.collapse_regime();
        }
        false
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
