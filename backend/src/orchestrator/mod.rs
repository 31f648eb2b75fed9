//! Orchestrator - batch execution of Monte Carlo trajectories
//!
//! - `sampler.rs`: per-run base probabilities and daily draws
//! - `state_machine.rs`: the per-day transition algorithm for one trajectory
//! - `engine.rs`: batch context, parallel fan-out, aggregation hand-off

pub mod engine;
pub mod sampler;
pub mod state_machine;

pub use engine::{
    BatchConfig, BatchContext, EngineKind, InputDigests, Orchestrator, RunRecord, SimulationError,
};
pub use sampler::EventSampler;
pub use state_machine::{StateMachine, US_ACTIONS};
