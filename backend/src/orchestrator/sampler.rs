//! Per-trajectory event sampler
//!
//! Owns the trajectory's RNG and the base probabilities drawn for it. Every
//! triplet in the bundle is sampled once at construction, in canonical key
//! order, so parameter uncertainty varies across runs and the stream layout
//! is identical for every run.
//!
//! A daily draw then goes: window check → modifier pipeline → per-day hazard
//! → Bernoulli.

use crate::core::window::{daily_probability, is_window_active};
use crate::economy::ModifierPipeline;
use crate::models::state::SimulationState;
use crate::priors::{PriorsBundle, ProbabilityKey, ProbabilityTriplet, TimeBasis};
use crate::rng::RngManager;

const KEY_COUNT: usize = ProbabilityKey::ALL.len();

pub struct EventSampler<'a> {
    priors: &'a PriorsBundle,
    pipeline: &'a ModifierPipeline,
    base: [Option<f64>; KEY_COUNT],
    rng: RngManager,
}

impl<'a> EventSampler<'a> {
    pub fn new(priors: &'a PriorsBundle, pipeline: &'a ModifierPipeline, mut rng: RngManager) -> Self {
        let mut base = [None; KEY_COUNT];
        for key in ProbabilityKey::ALL {
            base[key.index()] = priors.get(key).map(|triplet| triplet.sample(&mut rng));
        }
        Self {
            priors,
            pipeline,
            base,
            rng,
        }
    }

    pub fn triplet(&self, key: ProbabilityKey) -> Option<&'a ProbabilityTriplet> {
        self.priors.get(key)
    }

    /// Base probability drawn for this run, before modifiers
    pub fn base_probability(&self, key: ProbabilityKey) -> Option<f64> {
        self.base[key.index()]
    }

    pub fn pipeline(&self) -> &'a ModifierPipeline {
        self.pipeline
    }

    pub fn rng_mut(&mut self) -> &mut RngManager {
        &mut self.rng
    }

    /// Draw `key` for the current day.
    ///
    /// Returns `None` when the key is absent from the bundle, its window is
    /// not active, or an instant key was already drawn. No randomness is
    /// consumed in those cases.
    pub fn draw(&mut self, key: ProbabilityKey, state: &mut SimulationState) -> Option<bool> {
        let triplet = self.priors.get(key)?;
        let base = self.base[key.index()]?;

        if !is_window_active(triplet, state) {
            return None;
        }
        if triplet.time_basis == TimeBasis::Instant {
            if state.instant_consumed(key.name()) {
                return None;
            }
            state.consume_instant(key.name());
        }

        let adjusted = self
            .pipeline
            .apply(base, key.economic_event(), key.us_event(), state);
        let p = daily_probability(triplet, adjusted);
        Some(self.rng.bernoulli(p))
    }

    /// `draw` that treats "not eligible" as "did not fire"
    pub fn check(&mut self, key: ProbabilityKey, state: &mut SimulationState) -> bool {
        self.draw(key, state) == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::{EconomicModifierTable, EconomicStress, EconomicThresholds, UsModifierTable};
    use crate::priors::{Anchor, ProbabilityTriplet};
    use std::collections::BTreeMap;

    fn bundle() -> PriorsBundle {
        let mut bundle = PriorsBundle {
            regime_outcomes: BTreeMap::new(),
            transition_probabilities: BTreeMap::new(),
            us_intervention_probabilities: BTreeMap::new(),
            regional_cascade_probabilities: BTreeMap::new(),
            economic_thresholds: EconomicThresholds {
                rial_pressured_threshold: 1.0,
                rial_critical_threshold: 2.0,
                inflation_pressured_threshold: 1.0,
                inflation_critical_threshold: 2.0,
            },
            economic_modifiers: EconomicModifierTable::default(),
            us_intervention_modifiers: UsModifierTable::default(),
        };
        bundle.set(
            ProbabilityKey::KhameneiDeath,
            ProbabilityTriplet::fixed(1.0, Anchor::T0, 0, 90),
        );
        let mut instant = ProbabilityTriplet::fixed(0.0, Anchor::T0, 0, 0);
        instant.time_basis = TimeBasis::Instant;
        bundle.set(ProbabilityKey::InformationOps, instant);
        bundle
    }

    #[test]
    fn test_absent_key_is_not_eligible() {
        let priors = bundle();
        let pipeline = ModifierPipeline::new(
            EconomicStress::Stable,
            EconomicModifierTable::default(),
            UsModifierTable::default(),
        );
        let mut sampler = EventSampler::new(&priors, &pipeline, RngManager::new(1));
        let mut state = SimulationState::new();
        assert_eq!(sampler.draw(ProbabilityKey::ProtestPlateau, &mut state), None);
        assert_eq!(sampler.draw(ProbabilityKey::KhameneiDeath, &mut state), Some(true));
    }

    #[test]
    fn test_instant_key_drawn_once() {
        let priors = bundle();
        let pipeline = ModifierPipeline::new(
            EconomicStress::Stable,
            EconomicModifierTable::default(),
            UsModifierTable::default(),
        );
        let mut sampler = EventSampler::new(&priors, &pipeline, RngManager::new(1));
        let mut state = SimulationState::new();
        assert_eq!(sampler.draw(ProbabilityKey::InformationOps, &mut state), Some(false));
        state.advance_day();
        assert_eq!(sampler.draw(ProbabilityKey::InformationOps, &mut state), None);
    }
}
