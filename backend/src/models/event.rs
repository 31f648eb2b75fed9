//! Event logging for trajectory replay and auditing.
//!
//! Every state change a trajectory makes is recorded with the day it happened.
//! Events enable:
//! - Debugging (understand why a run terminalized the way it did)
//! - Timing statistics (mean day of defection, uprising, ...)
//! - Cross-engine comparison (the ABM logs the same event kinds)
//!
//! # Example
//!
//! ```rust
//! use crisis_simulator_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::SecurityForceDefection { day: 34 });
//! assert_eq!(log.first_day_of("security_force_defection"), Some(34));
//! ```

use crate::models::state::{Outcome, ProtestState, RegimeState, UsPosture};
use serde::{Deserialize, Serialize};

/// Trajectory event capturing a state change.
///
/// Events are logged in the order they occur within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Protest movement changed phase
    ProtestTransition {
        day: u32,
        from: ProtestState,
        to: ProtestState,
    },

    /// Regime changed posture
    RegimeTransition {
        day: u32,
        from: RegimeState,
        to: RegimeState,
    },

    /// Security forces defected (state machine) or the aggregate conscript
    /// defection fraction crossed the macro threshold (ABM)
    SecurityForceDefection { day: u32 },

    /// Ethnic periphery coordinated an uprising
    EthnicUprising { day: u32 },

    /// Supreme leader died
    KhameneiDeath { day: u32 },

    /// Foreign power took a new intervention action
    UsAction { day: u32, posture: UsPosture },

    /// Trajectory reached its terminal outcome
    Terminal { day: u32, outcome: Outcome },
}

impl Event {
    /// Day the event occurred on
    pub fn day(&self) -> u32 {
        match self {
            Event::ProtestTransition { day, .. } => *day,
            Event::RegimeTransition { day, .. } => *day,
            Event::SecurityForceDefection { day } => *day,
            Event::EthnicUprising { day } => *day,
            Event::KhameneiDeath { day } => *day,
            Event::UsAction { day, .. } => *day,
            Event::Terminal { day, .. } => *day,
        }
    }

    /// Tracked-event name, matching the `key_event_rates` keys where one exists
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ProtestTransition { .. } => "protest_transition",
            Event::RegimeTransition { .. } => "regime_transition",
            Event::SecurityForceDefection { .. } => "security_force_defection",
            Event::EthnicUprising { .. } => "ethnic_uprising",
            Event::KhameneiDeath { .. } => "khamenei_death",
            Event::UsAction { posture, .. } => match posture.tier() {
                crate::models::state::InterventionTier::Soft => "us_soft_intervention",
                crate::models::state::InterventionTier::Hard => "us_hard_intervention",
                crate::models::state::InterventionTier::Rhetorical => "us_rhetorical",
            },
            Event::Terminal { .. } => "terminal",
        }
    }
}

/// Append-only log of events for a single trajectory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific day
    pub fn events_on_day(&self, day: u32) -> Vec<&Event> {
        self.events.iter().filter(|e| e.day() == day).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Day of the first event of the given type
    pub fn first_day_of(&self, event_type: &str) -> Option<u32> {
        self.events
            .iter()
            .find(|e| e.event_type() == event_type)
            .map(Event::day)
    }
}
