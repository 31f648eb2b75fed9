//! Modifier pipeline
//!
//! Two independent multiplicative adjustments applied to a sampled base
//! probability before its Bernoulli draw:
//!
//! ```text
//! adjusted = min(base × economic[tier][event], 0.95) × us[tier][event]
//! ```
//!
//! - The economic factor comes from the batch's stress tier. STABLE never
//!   adjusts. An applied economic factor is capped at 0.95.
//! - The US factor comes from the trajectory's intervention flags. HARD wins
//!   over SOFT when both are set. Unknown event types multiply by 1.0.
//!
//! There is no interaction term between the two families.

use crate::economy::EconomicStress;
use crate::models::state::SimulationState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound on a probability after the economic modifier is applied
pub const ECONOMIC_MODIFIER_CAP: f64 = 0.95;

/// Multipliers per stress tier, keyed by economic event type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomicModifierTable {
    #[serde(default, alias = "PRESSURED")]
    pub pressured: BTreeMap<String, f64>,
    #[serde(default, alias = "CRITICAL")]
    pub critical: BTreeMap<String, f64>,
}

impl EconomicModifierTable {
    /// Multipliers for a tier. STABLE has none.
    pub fn for_tier(&self, stress: EconomicStress) -> Option<&BTreeMap<String, f64>> {
        match stress {
            EconomicStress::Stable => None,
            EconomicStress::Pressured => Some(&self.pressured),
            EconomicStress::Critical => Some(&self.critical),
        }
    }
}

/// Multipliers per intervention tier, keyed by US event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsModifierTable {
    #[serde(default)]
    pub soft: BTreeMap<String, f64>,
    #[serde(default)]
    pub hard: BTreeMap<String, f64>,
}

impl Default for UsModifierTable {
    /// Built-in tables used when the bundle carries no
    /// `us_intervention_modifiers` section. Hard strikes feed a
    /// rally-round-the-flag effect on street protest but deepen elite and
    /// security-force fractures.
    fn default() -> Self {
        let soft = [
            ("protest_escalation", 1.15),
            ("security_defection", 1.10),
            ("regime_collapse", 1.05),
            ("ethnic_coordination", 1.10),
        ];
        let hard = [
            ("protest_escalation", 0.85),
            ("crackdown", 1.20),
            ("security_defection", 1.25),
            ("regime_collapse", 1.30),
            ("ethnic_coordination", 1.25),
        ];
        Self {
            soft: soft.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            hard: hard.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

/// Composes economic and intervention modifiers onto base probabilities.
///
/// Built once per batch and shared read-only by every run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierPipeline {
    stress: EconomicStress,
    economic: EconomicModifierTable,
    us: UsModifierTable,
}

impl ModifierPipeline {
    pub fn new(stress: EconomicStress, economic: EconomicModifierTable, us: UsModifierTable) -> Self {
        Self {
            stress,
            economic,
            us,
        }
    }

    pub fn stress(&self) -> EconomicStress {
        self.stress
    }

    /// Economic multiplier for an event type under the batch's tier.
    ///
    /// `None` when no modifier applies (STABLE, or no table entry).
    pub fn economic_multiplier(&self, event_type: &str) -> Option<f64> {
        self.economic
            .for_tier(self.stress)
            .and_then(|table| table.get(event_type).copied())
    }

    /// Apply the economic modifier.
    ///
    /// # Example
    /// ```
    /// use crisis_simulator_core_rs::economy::{EconomicModifierTable, EconomicStress, ModifierPipeline, UsModifierTable};
    ///
    /// let mut table = EconomicModifierTable::default();
    /// table.critical.insert("protest_escalation".into(), 1.3);
    /// let pipeline = ModifierPipeline::new(EconomicStress::Critical, table, UsModifierTable::default());
    /// assert_eq!(pipeline.apply_economic(0.9, Some("protest_escalation")), 0.95);
    /// ```
    pub fn apply_economic(&self, base: f64, event_type: Option<&str>) -> f64 {
        match event_type.and_then(|e| self.economic_multiplier(e)) {
            Some(multiplier) => (base * multiplier).min(ECONOMIC_MODIFIER_CAP),
            None => base,
        }
    }

    /// US multiplier given the trajectory's intervention flags.
    ///
    /// HARD always wins over SOFT; neither, or an unknown event type, is 1.0.
    pub fn us_multiplier(&self, event_type: &str, soft: bool, hard: bool) -> f64 {
        let table = if hard {
            &self.us.hard
        } else if soft {
            &self.us.soft
        } else {
            return 1.0;
        };
        table.get(event_type).copied().unwrap_or(1.0)
    }

    /// Full pipeline: economic, then US, clamped to `[0, 1]`.
    pub fn apply(
        &self,
        base: f64,
        economic_event: Option<&str>,
        us_event: Option<&str>,
        state: &SimulationState,
    ) -> f64 {
        let adjusted = self.apply_economic(base, economic_event);
        let us = us_event.map_or(1.0, |e| {
            self.us_multiplier(e, state.us_soft_intervened(), state.us_hard_intervened())
        });
        (adjusted * us).clamp(0.0, 1.0)
    }

    /// Economic multipliers in force for this batch's tier (empty for STABLE)
    pub fn applied_economic_modifiers(&self) -> BTreeMap<String, f64> {
        self.economic
            .for_tier(self.stress)
            .cloned()
            .unwrap_or_default()
    }

    pub fn us_table(&self) -> &UsModifierTable {
        &self.us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(stress: EconomicStress) -> ModifierPipeline {
        let mut economic = EconomicModifierTable::default();
        economic.pressured.insert("security_defection".into(), 1.1);
        economic.critical.insert("security_defection".into(), 1.2);
        ModifierPipeline::new(stress, economic, UsModifierTable::default())
    }

    #[test]
    fn test_unknown_economic_event_is_unmodified() {
        let p = pipeline(EconomicStress::Critical);
        assert_eq!(p.apply_economic(0.99, Some("no_such_event")), 0.99);
        assert_eq!(p.apply_economic(0.4, None), 0.4);
    }

    #[test]
    fn test_stable_reports_no_applied_modifiers() {
        assert!(pipeline(EconomicStress::Stable)
            .applied_economic_modifiers()
            .is_empty());
        assert_eq!(
            pipeline(EconomicStress::Pressured).applied_economic_modifiers()["security_defection"],
            1.1
        );
    }

    #[test]
    fn test_no_intervention_is_neutral() {
        let p = pipeline(EconomicStress::Stable);
        assert_eq!(p.us_multiplier("regime_collapse", false, false), 1.0);
        assert_eq!(p.us_multiplier("unknown", true, true), 1.0);
    }

    #[test]
    fn test_full_pipeline_clamps_to_one() {
        let p = pipeline(EconomicStress::Stable);
        let mut state = SimulationState::new();
        state.record_us_action(crate::models::state::UsPosture::GroundIntervention);
        let adjusted = p.apply(0.9, None, Some("regime_collapse"), &state);
        assert_eq!(adjusted, 1.0);
    }
}
