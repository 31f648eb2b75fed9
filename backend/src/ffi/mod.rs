//! Python binding
//!
//! Exposes the batch runner to the external Python orchestrator. Inputs and
//! the result cross the boundary as JSON strings; the Python side owns file
//! handling.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::abm::AbmConfig;
use crate::orchestrator::{BatchConfig, EngineKind, Orchestrator};

/// Run a batch and return the result document as JSON.
///
/// # Errors
///
/// Raises ValueError for invalid priors, unusable intel, or zero runs. The
/// message names the offending key or field.
///
/// # Example (from Python)
///
/// ```python
/// from crisis_simulator_core_rs import run_simulation
///
/// result = json.loads(run_simulation(intel_json, priors_json, 10_000, 42, False))
/// print(result["outcome_distribution"]["REGIME_SURVIVES_STATUS_QUO"])
/// ```
#[pyfunction]
#[pyo3(signature = (intel_json, priors_json, runs = 10_000, seed = 42, abm = false))]
pub fn run_simulation(
    py: Python<'_>,
    intel_json: &str,
    priors_json: &str,
    runs: usize,
    seed: u64,
    abm: bool,
) -> PyResult<String> {
    let config = BatchConfig {
        runs,
        seed,
        engine: if abm { EngineKind::Abm } else { EngineKind::StateMachine },
        abm: AbmConfig::default(),
    };
    let orchestrator = Orchestrator::from_json(config, priors_json, intel_json)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let result = py.allow_threads(|| orchestrator.run());
    result
        .to_json_pretty()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}
