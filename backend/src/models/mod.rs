//! Domain models for the crisis simulator

pub mod agent;
pub mod event;
pub mod state;

// Re-exports
pub use agent::AgentType;
pub use event::{Event, EventLog};
pub use state::{
    InterventionTier, Outcome, ProtestEvent, ProtestState, RegimeEvent, RegimeState,
    SimulationState, UsPosture,
};
