//! Outcome aggregation and the result document
//!
//! Reduces the terminalized states of a batch into outcome probabilities with
//! Wilson intervals, event rates and timings, and the run metadata. The
//! document uses ordered maps only and carries no wall-clock values, so the
//! same batch always serializes to the same bytes.

pub mod digest;
pub mod stats;

pub use digest::{canonical_digest, sha256_hex};
pub use stats::{mean, wilson_interval, Z_95};

use crate::economy::{EconomicStress, EconomicThresholds, UsModifierTable};
use crate::intel::EconomicInputs;
use crate::models::state::{Outcome, SimulationState};
use crate::orchestrator::{Orchestrator, RunRecord, SimulationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Boolean milestones reported in `key_event_rates`
pub const KEY_EVENTS: [&str; 5] = [
    "us_soft_intervention",
    "us_hard_intervention",
    "security_force_defection",
    "khamenei_death",
    "ethnic_uprising",
];

/// Milestones whose mean day is reported in `event_timing`
pub const TIMED_EVENTS: [&str; 8] = [
    "crackdown",
    "concessions",
    "security_force_defection",
    "regime_collapse",
    "ethnic_uprising",
    "khamenei_death",
    "us_soft_intervention",
    "us_hard_intervention",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStats {
    pub count: usize,
    pub probability: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicAnalysis {
    pub stress_level: EconomicStress,
    pub inputs: EconomicInputs,
    pub thresholds: EconomicThresholds,
    /// Economic multipliers in force for the stress tier
    pub modifiers_applied: BTreeMap<String, f64>,
    pub us_intervention_modifiers: UsModifierTable,
}

/// Prior belief next to the simulated frequency for one outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorComparison {
    pub prior_mode: Option<f64>,
    pub simulated: f64,
    pub delta: Option<f64>,
}

/// Aggregate protesting fraction per day across ABM runs (index 0 = day 1).
/// Runs that terminalized earlier do not contribute to later days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtestTrajectory {
    pub mean: Vec<f64>,
    pub max: Vec<f64>,
    pub runs_reporting: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub engine: String,
    pub seed: u64,
    pub n_runs: usize,
    pub horizon_days: u32,
    pub crate_version: String,
    pub priors_sha256: String,
    pub intel_sha256: String,
}

/// Result document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub n_runs: usize,
    pub outcome_distribution: BTreeMap<Outcome, OutcomeStats>,
    pub key_event_rates: BTreeMap<String, f64>,
    pub event_timing: BTreeMap<String, Option<f64>>,
    pub outcome_timing: BTreeMap<Outcome, Option<f64>>,
    pub economic_analysis: EconomicAnalysis,
    pub prior_comparison: BTreeMap<Outcome, PriorComparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protest_trajectory: Option<ProtestTrajectory>,
    pub run_metadata: RunMetadata,
}

impl SimulationResult {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the document to a sibling temp file, then rename it over `path`
    pub fn write_atomic(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        let path = path.as_ref();
        let mut json = self.to_json_pretty()?;
        json.push('\n');

        let mut tmp_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "simulation_results.json".into());
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Sum of outcome probabilities (1.0 up to rounding)
    pub fn total_probability(&self) -> f64 {
        self.outcome_distribution.values().map(|s| s.probability).sum()
    }
}

/// Day a tracked milestone happened on, if it did
pub fn milestone_day(state: &SimulationState, event: &str) -> Option<u32> {
    match event {
        "crackdown" => state.crackdown_start_day(),
        "concessions" => state.concessions_start_day(),
        "security_force_defection" => state.defection_day(),
        "regime_collapse" => state.collapse_day(),
        "ethnic_uprising" => state.ethnic_uprising_day(),
        "khamenei_death" => state.khamenei_death_day(),
        "us_soft_intervention" | "us_hard_intervention" => state.events().first_day_of(event),
        _ => None,
    }
}

/// Whether a `key_event_rates` flag was set on this trajectory
pub fn flag_set(state: &SimulationState, event: &str) -> bool {
    match event {
        "us_soft_intervention" => state.us_soft_intervened(),
        "us_hard_intervention" => state.us_hard_intervened(),
        "security_force_defection" => state.defection_occurred(),
        "khamenei_death" => state.khamenei_died(),
        "ethnic_uprising" => state.ethnic_uprising(),
        _ => false,
    }
}

/// Reduce a batch of run records into the result document
pub fn aggregate(records: &[RunRecord], orchestrator: &Orchestrator) -> SimulationResult {
    let n = records.len();
    let states: Vec<&SimulationState> = records.iter().map(|r| &r.state).collect();
    let context = orchestrator.context();
    let config = orchestrator.config();

    let outcome_distribution = outcome_distribution(&states);

    let key_event_rates = KEY_EVENTS
        .iter()
        .map(|event| {
            let hits = states.iter().filter(|s| flag_set(s, event)).count();
            (event.to_string(), ratio(hits, n))
        })
        .collect();

    let event_timing = TIMED_EVENTS
        .iter()
        .map(|event| {
            let days = states
                .iter()
                .filter_map(|s| milestone_day(s, event))
                .map(f64::from);
            (event.to_string(), mean(days))
        })
        .collect();

    let outcome_timing = Outcome::ALL
        .iter()
        .map(|outcome| {
            let days = states
                .iter()
                .filter(|s| s.final_outcome() == Some(*outcome))
                .filter_map(|s| s.outcome_day())
                .map(f64::from);
            (*outcome, mean(days))
        })
        .collect();

    let prior_comparison = Outcome::ALL
        .iter()
        .map(|outcome| {
            let prior_mode = context
                .priors()
                .regime_outcomes
                .get(outcome.as_str())
                .map(|t| t.mode);
            let simulated = outcome_distribution
                .get(outcome)
                .map_or(0.0, |s| s.probability);
            let comparison = PriorComparison {
                prior_mode,
                simulated,
                delta: prior_mode.map(|p| simulated - p),
            };
            (*outcome, comparison)
        })
        .collect();

    let protest_trajectory = protest_trajectory(records);

    let economic_analysis = EconomicAnalysis {
        stress_level: context.stress(),
        inputs: *context.inputs(),
        thresholds: context.priors().economic_thresholds,
        modifiers_applied: context.pipeline().applied_economic_modifiers(),
        us_intervention_modifiers: context.pipeline().us_table().clone(),
    };

    let digests = orchestrator.digests();
    let run_metadata = RunMetadata {
        engine: config.engine.as_str().to_string(),
        seed: config.seed,
        n_runs: n,
        horizon_days: orchestrator.horizon_days(),
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
        priors_sha256: digests.priors_sha256.clone(),
        intel_sha256: digests.intel_sha256.clone(),
    };

    SimulationResult {
        n_runs: n,
        outcome_distribution,
        key_event_rates,
        event_timing,
        outcome_timing,
        economic_analysis,
        prior_comparison,
        protest_trajectory,
        run_metadata,
    }
}

/// Outcome counts with Wilson intervals. Every outcome is listed, and a run
/// that somehow never terminalized counts as status quo.
pub fn outcome_distribution(states: &[&SimulationState]) -> BTreeMap<Outcome, OutcomeStats> {
    let n = states.len();
    let mut counts: BTreeMap<Outcome, usize> = Outcome::ALL.iter().map(|o| (*o, 0)).collect();
    for state in states {
        let outcome = state
            .final_outcome()
            .unwrap_or(Outcome::RegimeSurvivesStatusQuo);
        *counts.entry(outcome).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(outcome, count)| {
            let (ci_low, ci_high) = wilson_interval(count, n, Z_95);
            let stats = OutcomeStats {
                count,
                probability: ratio(count, n),
                ci_low,
                ci_high,
            };
            (outcome, stats)
        })
        .collect()
}

fn protest_trajectory(records: &[RunRecord]) -> Option<ProtestTrajectory> {
    let series: Vec<&Vec<f64>> = records
        .iter()
        .filter_map(|r| r.protest_fraction.as_ref())
        .collect();
    if series.is_empty() {
        return None;
    }

    let days = series.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut trajectory = ProtestTrajectory {
        mean: Vec::with_capacity(days),
        max: Vec::with_capacity(days),
        runs_reporting: Vec::with_capacity(days),
    };
    for day in 0..days {
        let values: Vec<f64> = series.iter().filter_map(|s| s.get(day).copied()).collect();
        trajectory.mean.push(mean(values.iter().copied()).unwrap_or(0.0));
        trajectory
            .max
            .push(values.iter().copied().fold(0.0, f64::max));
        trajectory.runs_reporting.push(values.len());
    }
    Some(trajectory)
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_lists_every_outcome() {
        let mut a = SimulationState::new();
        a.terminalize(Outcome::ManagedTransition);
        let mut b = SimulationState::new();
        b.terminalize(Outcome::ManagedTransition);
        let mut c = SimulationState::new();
        c.terminalize(Outcome::EthnicFragmentation);

        let dist = outcome_distribution(&[&a, &b, &c]);
        assert_eq!(dist.len(), 5);
        assert_eq!(dist[&Outcome::ManagedTransition].count, 2);
        assert_eq!(dist[&Outcome::RegimeSurvivesStatusQuo].count, 0);
        let total: f64 = dist.values().map(|s| s.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_milestone_days() {
        let mut state = SimulationState::new();
        state.set_current_day(7);
        state.start_crackdown();
        assert_eq!(milestone_day(&state, "crackdown"), Some(7));
        assert_eq!(milestone_day(&state, "concessions"), None);
        assert!(!flag_set(&state, "security_force_defection"));
    }

    #[test]
    fn test_trajectory_skips_terminated_runs() {
        let record = |series: Vec<f64>| RunRecord {
            state: SimulationState::new(),
            protest_fraction: Some(series),
        };
        let t = protest_trajectory(&[record(vec![0.1, 0.3]), record(vec![0.3])]).unwrap();
        assert_eq!(t.runs_reporting, vec![2, 1]);
        assert!((t.mean[0] - 0.2).abs() < 1e-12);
        assert_eq!(t.max[1], 0.3);
    }
}
