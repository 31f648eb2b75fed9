//! Batch orchestrator
//!
//! Validates the inputs once, classifies economic stress once, then fans N
//! independent trajectories out over the rayon pool and aggregates them.
//!
//! # Architecture
//!
//! ```text
//! priors + intel
//!   → validate_priors            (fail fast, collect every issue)
//!   → classify_stress            (cached on the BatchContext)
//!   → (0..N).into_par_iter()     (run i seeded by RngManager::for_run(seed, i))
//!        → StateMachine::run  |  AbmRun::run
//!   → collect in index order
//!   → aggregate                  (SimulationResult)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use crisis_simulator_core_rs::orchestrator::{BatchConfig, Orchestrator};
//!
//! let orchestrator = Orchestrator::from_json(BatchConfig::default(), &priors_json, &intel_json)?;
//! let result = orchestrator.run();
//! result.write_atomic("simulation_results.json")?;
//! ```

use crate::abm::{AbmConfig, AbmRun, ContactGraph};
use crate::core::time::HORIZON_DAYS;
use crate::economy::{classify_stress, ClassificationError, EconomicStress, ModifierPipeline};
use crate::intel::{CompiledIntel, EconomicInputs};
use crate::models::state::SimulationState;
use crate::orchestrator::state_machine::StateMachine;
use crate::priors::{validate_priors, PriorsBundle, PriorsError};
use crate::results::{aggregate, canonical_digest, SimulationResult};
use crate::rng::RngManager;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Which engine executes the trajectories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    #[default]
    StateMachine,
    Abm,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::StateMachine => "state_machine",
            EngineKind::Abm => "abm",
        }
    }
}

/// Batch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of independent trajectories
    pub runs: usize,

    /// Seed base; run `i` uses `RngManager::for_run(seed, i)`
    pub seed: u64,

    pub engine: EngineKind,

    /// Calibration for the ABM engine (ignored by the state machine)
    #[serde(default)]
    pub abm: AbmConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            runs: 10_000,
            seed: 42,
            engine: EngineKind::StateMachine,
            abm: AbmConfig::default(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Batch-level failure. Raised before any run executes; runs themselves
/// cannot fail.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Priors(#[from] PriorsError),

    #[error("economic stress classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Batch context
// ============================================================================

/// Read-only inputs shared by every run of a batch
#[derive(Debug, Clone)]
pub struct BatchContext {
    priors: PriorsBundle,
    intel: CompiledIntel,
    stress: EconomicStress,
    inputs: EconomicInputs,
    pipeline: ModifierPipeline,
}

impl BatchContext {
    /// Validate the priors and classify the intel.
    ///
    /// # Errors
    ///
    /// Every priors issue at once, or the first missing economic field.
    pub fn new(priors: PriorsBundle, intel: CompiledIntel) -> Result<Self, SimulationError> {
        validate_priors(&priors)?;
        tracing::debug!(triplets = priors.triplet_count(), "priors validated");

        let (stress, inputs) = classify_stress(&intel, &priors.economic_thresholds)?;
        let pipeline = ModifierPipeline::new(
            stress,
            priors.economic_modifiers.clone(),
            priors.us_intervention_modifiers.clone(),
        );

        Ok(Self {
            priors,
            intel,
            stress,
            inputs,
            pipeline,
        })
    }

    pub fn priors(&self) -> &PriorsBundle {
        &self.priors
    }

    pub fn intel(&self) -> &CompiledIntel {
        &self.intel
    }

    pub fn stress(&self) -> EconomicStress {
        self.stress
    }

    pub fn inputs(&self) -> &EconomicInputs {
        &self.inputs
    }

    pub fn pipeline(&self) -> &ModifierPipeline {
        &self.pipeline
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Output of one trajectory, before aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub state: SimulationState,
    /// Daily protesting fraction (ABM only)
    pub protest_fraction: Option<Vec<f64>>,
}

/// Input digests recorded in the result metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDigests {
    pub priors_sha256: String,
    pub intel_sha256: String,
}

/// Engine resources built once per batch
enum Engine {
    StateMachine,
    Abm { graph: ContactGraph },
}

pub struct Orchestrator {
    config: BatchConfig,
    context: BatchContext,
    digests: InputDigests,
    engine: Engine,
}

impl Orchestrator {
    /// Create a batch orchestrator.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for zero runs or a bad ABM calibration, plus any
    /// priors or classification failure from [`BatchContext::new`].
    pub fn new(
        config: BatchConfig,
        priors: PriorsBundle,
        intel: CompiledIntel,
    ) -> Result<Self, SimulationError> {
        Self::validate_config(&config)?;

        let digests = InputDigests {
            priors_sha256: canonical_digest(&priors)?,
            intel_sha256: canonical_digest(intel.document())?,
        };
        let context = BatchContext::new(priors, intel)?;

        let engine = match config.engine {
            EngineKind::Abm => {
                let mut rng = RngManager::new(config.seed);
                let graph = ContactGraph::small_world(
                    config.abm.population,
                    config.abm.lattice_degree,
                    config.abm.shortcut_edges_per_agent,
                    &mut rng,
                );
                tracing::debug!(agents = graph.len(), edges = graph.nnz(), "contact graph built");
                Engine::Abm { graph }
            }
            EngineKind::StateMachine => Engine::StateMachine,
        };

        Ok(Self {
            config,
            context,
            digests,
            engine,
        })
    }

    /// Parse both documents and create the orchestrator
    pub fn from_json(
        config: BatchConfig,
        priors_json: &str,
        intel_json: &str,
    ) -> Result<Self, SimulationError> {
        let priors = PriorsBundle::from_json_str(priors_json)?;
        let intel = CompiledIntel::from_json_str(intel_json)?;
        Self::new(config, priors, intel)
    }

    fn validate_config(config: &BatchConfig) -> Result<(), SimulationError> {
        if config.runs == 0 {
            return Err(SimulationError::InvalidConfig(
                "runs must be positive".to_string(),
            ));
        }
        if config.engine == EngineKind::Abm {
            config.abm.validate().map_err(SimulationError::InvalidConfig)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn context(&self) -> &BatchContext {
        &self.context
    }

    pub fn digests(&self) -> &InputDigests {
        &self.digests
    }

    pub fn horizon_days(&self) -> u32 {
        HORIZON_DAYS
    }

    /// Execute one trajectory. A pure function of `(seed, run_index)`.
    pub fn run_trajectory(&self, run_index: u64) -> RunRecord {
        let rng = RngManager::for_run(self.config.seed, run_index);
        match &self.engine {
            Engine::Abm { graph } => {
                let trajectory = AbmRun::new(&self.context, &self.config.abm, graph, rng).run();
                RunRecord {
                    state: trajectory.state,
                    protest_fraction: Some(trajectory.daily_protest_fraction),
                }
            }
            Engine::StateMachine => {
                let state =
                    StateMachine::new(self.context.priors(), self.context.pipeline(), rng).run();
                RunRecord {
                    state,
                    protest_fraction: None,
                }
            }
        }
    }

    /// Run every trajectory in parallel, collected in index order
    pub fn run_all(&self) -> Vec<RunRecord> {
        (0..self.config.runs as u64)
            .into_par_iter()
            .map(|i| self.run_trajectory(i))
            .collect()
    }

    /// Run the batch and aggregate it
    pub fn run(&self) -> SimulationResult {
        tracing::info!(
            engine = self.config.engine.as_str(),
            runs = self.config.runs,
            seed = self.config.seed,
            stress = self.context.stress().as_str(),
            "starting batch"
        );

        let records = self.run_all();
        let result = aggregate(&records, self);

        tracing::info!(runs = result.n_runs, "batch complete");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_names() {
        assert_eq!(EngineKind::StateMachine.as_str(), "state_machine");
        assert_eq!(EngineKind::Abm.as_str(), "abm");
        assert_eq!(EngineKind::default(), EngineKind::StateMachine);
    }

    #[test]
    fn test_default_batch_config() {
        let config = BatchConfig::default();
        assert_eq!(config.runs, 10_000);
        assert_eq!(config.seed, 42);
        assert_eq!(config.abm.population, 10_000);
    }

    #[test]
    fn test_zero_runs_rejected() {
        let config = BatchConfig {
            runs: 0,
            ..BatchConfig::default()
        };
        assert!(matches!(
            Orchestrator::validate_config(&config),
            Err(SimulationError::InvalidConfig(_))
        ));
    }
}
