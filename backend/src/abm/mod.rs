//! Agent-based engine
//!
//! Alternate execution path that drives the same macro state machine from a
//! population of heterogeneous agents connected by a sparse contact graph.
//!
//! - **graph**: CSR contact graph and the neighbour-aggregation pass
//! - **population**: per-agent arrays (type, threshold, activation, exhaustion)
//! - **engine**: daily agent step plus the macro layer
//!
//! # Critical Invariants
//!
//! 1. **Snapshot update**: day `d+1` activations read only day `d` arrays
//! 2. **Hardliners never protest**, conscripts never protest (they defect)
//! 3. **Defection is permanent**, and the macro event fires at most once
//! 4. **Perfect storm**: collapse needs defection (or a failed succession),
//!    mass protest and economic pressure held together, never a single trigger

pub mod engine;
pub mod graph;
pub mod population;

pub use engine::{AbmRun, AbmTrajectory};
pub use graph::ContactGraph;
pub use population::Population;

use serde::{Deserialize, Serialize};

/// ABM calibration constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbmConfig {
    /// Number of agents
    pub population: usize,

    /// Ring-lattice degree (neighbours on each side is `lattice_degree / 2`)
    pub lattice_degree: usize,

    /// Random long-range edges added per agent
    pub shortcut_edges_per_agent: usize,

    /// Fraction of students active on day 1
    pub initial_student_activation: f64,

    /// ± relative spread of individual thresholds around the type baseline
    pub threshold_jitter: f64,

    // Activation drive
    pub density_weight: f64,
    pub grievance_weight: f64,
    pub escalating_mood: f64,
    pub declining_mood: f64,
    pub fear_weight: f64,
    pub temperature: f64,

    /// Drive lost per unit of hardliner-neighbour fraction
    pub hardliner_suppression: f64,

    // Exhaustion
    pub exhaustion_gain: f64,
    pub exhaustion_decay: f64,
    pub exhaustion_penalty: f64,

    /// Merchant threshold reduction at full economic pressure
    pub merchant_ramp: f64,

    // Conscripts
    pub conscript_density_cutoff: f64,
    /// Conscripts on each side considered "nearest" for peer defection
    pub conscript_peer_span: usize,
    pub conscript_peer_defections: usize,

    /// Aggregate conscript-defection fraction that fires the macro event
    pub macro_defection_threshold: f64,

    // Macro environment
    pub crackdown_activation_gate: f64,
    pub crackdown_ramp: f64,
    pub trend_epsilon: f64,
    pub rial_drift_pressured: f64,
    pub rial_drift_critical: f64,

    // Perfect storm
    pub storm_protest_fraction: f64,
    pub storm_economic_pressure: f64,
    pub storm_days: u32,
}

impl Default for AbmConfig {
    fn default() -> Self {
        Self {
            population: 10_000,
            lattice_degree: 8,
            shortcut_edges_per_agent: 1,
            initial_student_activation: 0.20,
            threshold_jitter: 0.25,

            density_weight: 0.55,
            grievance_weight: 0.30,
            escalating_mood: 0.05,
            declining_mood: -0.05,
            fear_weight: 0.25,
            temperature: 0.06,

            hardliner_suppression: 0.60,

            exhaustion_gain: 0.12,
            exhaustion_decay: 0.08,
            exhaustion_penalty: 0.35,

            merchant_ramp: 0.20,

            conscript_density_cutoff: 0.5,
            conscript_peer_span: 4,
            conscript_peer_defections: 4,

            macro_defection_threshold: 0.30,

            crackdown_activation_gate: 0.10,
            crackdown_ramp: 0.25,
            trend_epsilon: 0.005,
            rial_drift_pressured: 0.001,
            rial_drift_critical: 0.003,

            storm_protest_fraction: 0.20,
            storm_economic_pressure: 0.75,
            storm_days: 3,
        }
    }
}

impl AbmConfig {
    /// Default calibration with a different population size
    pub fn with_population(population: usize) -> Self {
        Self {
            population,
            ..Self::default()
        }
    }

    /// Returns the first problem found, as a message naming the field
    pub fn validate(&self) -> Result<(), String> {
        if self.population == 0 {
            return Err("abm.population must be positive".to_string());
        }
        if self.lattice_degree == 0 || self.lattice_degree % 2 != 0 {
            return Err(format!(
                "abm.lattice_degree must be a positive even number, got {}",
                self.lattice_degree
            ));
        }
        if self.temperature <= 0.0 {
            return Err("abm.temperature must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.macro_defection_threshold) {
            return Err("abm.macro_defection_threshold must lie in [0, 1]".to_string());
        }
        Ok(())
    }
}
