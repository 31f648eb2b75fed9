//! Crisis Simulator Core - Rust Engine
//!
//! Monte Carlo forecaster for a 90-day political crisis, with deterministic
//! execution and two interchangeable engines.
//!
//! # Architecture
//!
//! - **core**: Day clock and time-window resolution
//! - **priors**: Probability triplets, the priors bundle and its validation
//! - **intel**: Compiled intel snapshot (economic inputs)
//! - **economy**: Stress classification and the modifier pipeline
//! - **models**: Domain types (SimulationState, events, agent classes)
//! - **orchestrator**: State-machine trajectories and batch execution
//! - **abm**: Agent-based engine over a CSR contact graph
//! - **results**: Aggregation into the result document
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic (one seeded RNG per run)
//! 2. Inputs are validated once, before any run executes
//! 3. Same seed, inputs and run count give byte-identical output

// Module declarations
pub mod abm;
pub mod core;
pub mod economy;
pub mod intel;
pub mod models;
pub mod orchestrator;
pub mod priors;
pub mod results;
pub mod rng;

// Re-exports for convenience
pub use abm::{AbmConfig, ContactGraph};
pub use core::time::{DayClock, HORIZON_DAYS};
pub use economy::{classify_stress, ClassificationError, EconomicStress, ModifierPipeline};
pub use intel::CompiledIntel;
pub use models::{
    event::{Event, EventLog},
    state::{Outcome, ProtestState, RegimeState, SimulationState, UsPosture},
};
pub use orchestrator::{BatchConfig, EngineKind, Orchestrator, SimulationError};
pub use priors::{validate_priors, PriorsBundle, PriorsError, ProbabilityTriplet};
pub use results::SimulationResult;
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn crisis_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::run_simulation, m)?)?;
    Ok(())
}
