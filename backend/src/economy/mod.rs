//! Economic stress classification
//!
//! Derives a three-tier stress label from the rial market rate and annual
//! inflation. Either axis crossing a threshold is enough to raise the tier.
//! The label is computed once per batch and cached on the batch context.

pub mod modifiers;

pub use modifiers::{EconomicModifierTable, ModifierPipeline, UsModifierTable};

use crate::intel::{CompiledIntel, EconomicInputs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Economic stress tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EconomicStress {
    Stable,
    Pressured,
    Critical,
}

impl EconomicStress {
    pub fn as_str(self) -> &'static str {
        match self {
            EconomicStress::Stable => "STABLE",
            EconomicStress::Pressured => "PRESSURED",
            EconomicStress::Critical => "CRITICAL",
        }
    }
}

/// Classification thresholds from the priors bundle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicThresholds {
    pub rial_pressured_threshold: f64,
    pub rial_critical_threshold: f64,
    pub inflation_pressured_threshold: f64,
    pub inflation_critical_threshold: f64,
}

/// Classification failure. Never defaulted to a tier.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("compiled intel is missing 'current_state.economic_conditions'")]
    MissingEconomicConditions,

    #[error("compiled intel is missing 'economic_conditions.{field}'")]
    MissingField { field: &'static str },

    #[error("compiled intel field 'economic_conditions.{field}' has no usable value (checked: {candidates})")]
    NoUsableValue {
        field: &'static str,
        candidates: String,
    },
}

/// Classify stress from already-extracted inputs.
///
/// CRITICAL if either axis reaches its critical threshold, else PRESSURED if
/// either reaches its pressured threshold, else STABLE.
///
/// # Example
/// ```
/// use crisis_simulator_core_rs::economy::{classify, EconomicStress, EconomicThresholds};
/// use crisis_simulator_core_rs::intel::EconomicInputs;
///
/// let thresholds = EconomicThresholds {
///     rial_pressured_threshold: 800_000.0,
///     rial_critical_threshold: 1_200_000.0,
///     inflation_pressured_threshold: 30.0,
///     inflation_critical_threshold: 50.0,
/// };
/// let inputs = EconomicInputs { rial_usd_rate: 1_500_000.0, inflation_annual_percent: 25.0 };
/// assert_eq!(classify(&inputs, &thresholds), EconomicStress::Critical);
/// ```
pub fn classify(inputs: &EconomicInputs, thresholds: &EconomicThresholds) -> EconomicStress {
    let rate = inputs.rial_usd_rate;
    let inflation = inputs.inflation_annual_percent;

    if rate >= thresholds.rial_critical_threshold
        || inflation >= thresholds.inflation_critical_threshold
    {
        EconomicStress::Critical
    } else if rate >= thresholds.rial_pressured_threshold
        || inflation >= thresholds.inflation_pressured_threshold
    {
        EconomicStress::Pressured
    } else {
        EconomicStress::Stable
    }
}

/// Extract inputs from the intel snapshot and classify them.
pub fn classify_stress(
    intel: &CompiledIntel,
    thresholds: &EconomicThresholds,
) -> Result<(EconomicStress, EconomicInputs), ClassificationError> {
    let inputs = intel.economic_inputs()?;
    let stress = classify(&inputs, thresholds);
    tracing::debug!(
        rial_usd_rate = inputs.rial_usd_rate,
        inflation = inputs.inflation_annual_percent,
        stress = stress.as_str(),
        "classified economic stress"
    );
    Ok((stress, inputs))
}

/// Normalised economic pressure in `[0, 1]` from the rial rate.
///
/// Zero at half the pressured threshold, one at the critical threshold.
/// The ABM uses this as the grievance input.
pub fn rial_pressure(rial_usd_rate: f64, thresholds: &EconomicThresholds) -> f64 {
    let floor = thresholds.rial_pressured_threshold * 0.5;
    let span = thresholds.rial_critical_threshold - floor;
    if span <= 0.0 {
        return if rial_usd_rate >= thresholds.rial_critical_threshold {
            1.0
        } else {
            0.0
        };
    }
    ((rial_usd_rate - floor) / span).clamp(0.0, 1.0)
}
