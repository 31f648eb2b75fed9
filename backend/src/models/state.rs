//! Simulation State
//!
//! Per-trajectory mutable state. One `SimulationState` is exclusively owned by
//! one run and only changed through the transition methods below, which refuse
//! illegal moves instead of silently overwriting fields.
//!
//! # Critical Invariants
//!
//! 1. **Anchors are write-once**: a milestone day, once recorded, never moves
//! 2. **Closed states**: protest, regime and posture values are enums, never strings
//! 3. **Terminal is final**: after `terminalize`, no further transition applies
//! 4. **Posture is monotone**: `us_posture` only ever rises in rank

use crate::core::time::{DayClock, HORIZON_DAYS};
use crate::models::event::{Event, EventLog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// Protest movement
// ============================================================================

/// Phase of the street protest movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtestState {
    Escalating,
    Plateaued,
    Declining,
}

/// Input to the protest transition function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtestEvent {
    /// Growth stalls
    Plateau,
    /// Movement regains momentum
    Reescalate,
    /// Movement breaks under crackdown or is bought off by concessions
    Collapse,
}

impl ProtestState {
    /// Next state for `event`, or `None` when the move is not legal from here
    ///
    /// # Example
    /// ```
    /// use crisis_simulator_core_rs::models::state::{ProtestEvent, ProtestState};
    ///
    /// assert_eq!(
    ///     ProtestState::Escalating.transition(ProtestEvent::Collapse),
    ///     Some(ProtestState::Declining)
    /// );
    /// assert_eq!(ProtestState::Declining.transition(ProtestEvent::Collapse), None);
    /// ```
    pub fn transition(self, event: ProtestEvent) -> Option<ProtestState> {
        use ProtestEvent as E;
        use ProtestState as S;
        match (self, event) {
            (S::Escalating, E::Plateau) => Some(S::Plateaued),
            (S::Plateaued | S::Declining, E::Reescalate) => Some(S::Escalating),
            (S::Escalating | S::Plateaued, E::Collapse) => Some(S::Declining),
            _ => None,
        }
    }
}

// ============================================================================
// Regime
// ============================================================================

/// Posture of the ruling regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeState {
    StatusQuo,
    Crackdown,
    Concessions,
    Collapsed,
    /// Orderly leadership handover under way
    Transition,
}

/// Input to the regime transition function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimeEvent {
    Crackdown,
    Concede,
    Collapse,
    OrderlySuccession,
}

impl RegimeState {
    /// Next state for `event`, or `None` when the move is not legal from here
    pub fn transition(self, event: RegimeEvent) -> Option<RegimeState> {
        use RegimeEvent as E;
        use RegimeState as S;
        match (self, event) {
            (S::StatusQuo, E::Crackdown) => Some(S::Crackdown),
            (S::StatusQuo | S::Crackdown, E::Concede) => Some(S::Concessions),
            (S::StatusQuo | S::Crackdown | S::Concessions, E::Collapse) => Some(S::Collapsed),
            (S::StatusQuo | S::Crackdown | S::Concessions, E::OrderlySuccession) => {
                Some(S::Transition)
            }
            _ => None,
        }
    }

    /// Whether the regime has lost control (collapsed or handing over)
    pub fn has_fallen(self) -> bool {
        matches!(self, RegimeState::Collapsed | RegimeState::Transition)
    }
}

// ============================================================================
// Foreign intervention posture
// ============================================================================

/// Intervention tier. SOFT and HARD are disjoint; with RHETORICAL they cover
/// every posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterventionTier {
    Rhetorical,
    Soft,
    Hard,
}

/// US posture, ordered by escalation rank
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsPosture {
    Rhetorical,
    InformationOps,
    EconomicEscalation,
    CovertSupport,
    CyberAttack,
    KineticStrike,
    GroundIntervention,
}

impl UsPosture {
    /// Every posture, lowest rank first
    pub const ALL: [UsPosture; 7] = [
        UsPosture::Rhetorical,
        UsPosture::InformationOps,
        UsPosture::EconomicEscalation,
        UsPosture::CovertSupport,
        UsPosture::CyberAttack,
        UsPosture::KineticStrike,
        UsPosture::GroundIntervention,
    ];

    pub fn tier(self) -> InterventionTier {
        match self {
            UsPosture::Rhetorical => InterventionTier::Rhetorical,
            UsPosture::InformationOps
            | UsPosture::EconomicEscalation
            | UsPosture::CovertSupport => InterventionTier::Soft,
            UsPosture::CyberAttack | UsPosture::KineticStrike | UsPosture::GroundIntervention => {
                InterventionTier::Hard
            }
        }
    }
}

// ============================================================================
// Terminal outcomes
// ============================================================================

/// The five mutually exclusive end states of a trajectory
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    RegimeSurvivesStatusQuo,
    RegimeSurvivesWithConcessions,
    ManagedTransition,
    RegimeCollapseChaotic,
    EthnicFragmentation,
}

impl Outcome {
    pub const ALL: [Outcome; 5] = [
        Outcome::RegimeSurvivesStatusQuo,
        Outcome::RegimeSurvivesWithConcessions,
        Outcome::ManagedTransition,
        Outcome::RegimeCollapseChaotic,
        Outcome::EthnicFragmentation,
    ];

    /// Key used in the result document and in `regime_outcomes` priors
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::RegimeSurvivesStatusQuo => "REGIME_SURVIVES_STATUS_QUO",
            Outcome::RegimeSurvivesWithConcessions => "REGIME_SURVIVES_WITH_CONCESSIONS",
            Outcome::ManagedTransition => "MANAGED_TRANSITION",
            Outcome::RegimeCollapseChaotic => "REGIME_COLLAPSE_CHAOTIC",
            Outcome::EthnicFragmentation => "ETHNIC_FRAGMENTATION",
        }
    }
}

// ============================================================================
// SimulationState
// ============================================================================

/// Complete state of one trajectory
///
/// # Example
///
/// ```rust
/// use crisis_simulator_core_rs::models::state::{ProtestState, RegimeState, SimulationState};
///
/// let mut state = SimulationState::new();
/// assert_eq!(state.current_day(), 1);
/// assert_eq!(state.protest_state(), ProtestState::Escalating);
/// assert_eq!(state.escalation_start_day(), Some(1));
///
/// assert!(state.start_crackdown());
/// assert_eq!(state.regime_state(), RegimeState::Crackdown);
/// assert_eq!(state.crackdown_start_day(), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    clock: DayClock,

    protest_state: ProtestState,
    regime_state: RegimeState,
    us_posture: UsPosture,

    escalation_start_day: Option<u32>,
    crackdown_start_day: Option<u32>,
    concessions_start_day: Option<u32>,
    defection_day: Option<u32>,
    ethnic_uprising_day: Option<u32>,
    khamenei_death_day: Option<u32>,
    collapse_day: Option<u32>,

    defection_occurred: bool,
    ethnic_uprising: bool,
    us_soft_intervened: bool,
    us_hard_intervened: bool,

    /// Intervention actions already taken (each fires at most once)
    us_actions: BTreeSet<UsPosture>,

    /// Instant-basis probability keys already drawn this run
    consumed_instants: BTreeSet<String>,

    final_outcome: Option<Outcome>,
    outcome_day: Option<u32>,

    events: EventLog,
}

impl SimulationState {
    /// Fresh trajectory on day 1 of the standard horizon.
    ///
    /// The crisis is already under way at `t0`, so protests start ESCALATING
    /// and `escalation_start_day` is day 1.
    pub fn new() -> Self {
        Self::with_horizon(HORIZON_DAYS)
    }

    pub fn with_horizon(horizon_days: u32) -> Self {
        Self {
            clock: DayClock::new(horizon_days),
            protest_state: ProtestState::Escalating,
            regime_state: RegimeState::StatusQuo,
            us_posture: UsPosture::Rhetorical,
            escalation_start_day: Some(1),
            crackdown_start_day: None,
            concessions_start_day: None,
            defection_day: None,
            ethnic_uprising_day: None,
            khamenei_death_day: None,
            collapse_day: None,
            defection_occurred: false,
            ethnic_uprising: false,
            us_soft_intervened: false,
            us_hard_intervened: false,
            us_actions: BTreeSet::new(),
            consumed_instants: BTreeSet::new(),
            final_outcome: None,
            outcome_day: None,
            events: EventLog::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn current_day(&self) -> u32 {
        self.clock.current_day()
    }

    pub fn horizon_days(&self) -> u32 {
        self.clock.horizon_days()
    }

    pub fn protest_state(&self) -> ProtestState {
        self.protest_state
    }

    pub fn regime_state(&self) -> RegimeState {
        self.regime_state
    }

    pub fn us_posture(&self) -> UsPosture {
        self.us_posture
    }

    pub fn escalation_start_day(&self) -> Option<u32> {
        self.escalation_start_day
    }

    pub fn crackdown_start_day(&self) -> Option<u32> {
        self.crackdown_start_day
    }

    pub fn concessions_start_day(&self) -> Option<u32> {
        self.concessions_start_day
    }

    pub fn defection_day(&self) -> Option<u32> {
        self.defection_day
    }

    pub fn ethnic_uprising_day(&self) -> Option<u32> {
        self.ethnic_uprising_day
    }

    pub fn khamenei_death_day(&self) -> Option<u32> {
        self.khamenei_death_day
    }

    pub fn collapse_day(&self) -> Option<u32> {
        self.collapse_day
    }

    pub fn defection_occurred(&self) -> bool {
        self.defection_occurred
    }

    pub fn ethnic_uprising(&self) -> bool {
        self.ethnic_uprising
    }

    pub fn us_soft_intervened(&self) -> bool {
        self.us_soft_intervened
    }

    pub fn us_hard_intervened(&self) -> bool {
        self.us_hard_intervened
    }

    pub fn khamenei_died(&self) -> bool {
        self.khamenei_death_day.is_some()
    }

    pub fn has_taken_action(&self, posture: UsPosture) -> bool {
        self.us_actions.contains(&posture)
    }

    pub fn instant_consumed(&self, key: &str) -> bool {
        self.consumed_instants.contains(key)
    }

    pub fn final_outcome(&self) -> Option<Outcome> {
        self.final_outcome
    }

    pub fn outcome_day(&self) -> Option<u32> {
        self.outcome_day
    }

    pub fn is_terminal(&self) -> bool {
        self.final_outcome.is_some()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // ------------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------------

    /// Move to the next day. No-op once terminal.
    pub fn advance_day(&mut self) {
        if !self.is_terminal() {
            self.clock.advance_day();
        }
    }

    /// Jump the clock to `day`. Used by replays and window tests.
    pub fn set_current_day(&mut self, day: u32) {
        let mut clock = DayClock::new(self.clock.horizon_days());
        while clock.current_day() < day {
            clock.advance_day();
        }
        self.clock = clock;
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Apply a protest transition on the current day. Returns whether it applied.
    pub fn apply_protest_event(&mut self, event: ProtestEvent) -> bool {
        if self.is_terminal() {
            return false;
        }
        let Some(next) = self.protest_state.transition(event) else {
            return false;
        };
        let day = self.current_day();
        self.events.log(Event::ProtestTransition {
            day,
            from: self.protest_state,
            to: next,
        });
        self.protest_state = next;
        if next == ProtestState::Escalating && self.escalation_start_day.is_none() {
            self.escalation_start_day = Some(day);
        }
        true
    }

    fn apply_regime_event(&mut self, event: RegimeEvent) -> bool {
        if self.is_terminal() {
            return false;
        }
        let Some(next) = self.regime_state.transition(event) else {
            return false;
        };
        self.events.log(Event::RegimeTransition {
            day: self.current_day(),
            from: self.regime_state,
            to: next,
        });
        self.regime_state = next;
        true
    }

    /// STATUS_QUO → CRACKDOWN, recording `crackdown_start_day`
    pub fn start_crackdown(&mut self) -> bool {
        if !self.apply_regime_event(RegimeEvent::Crackdown) {
            return false;
        }
        self.crackdown_start_day.get_or_insert(self.clock.current_day());
        true
    }

    /// → CONCESSIONS, recording `concessions_start_day`
    pub fn grant_concessions(&mut self) -> bool {
        if !self.apply_regime_event(RegimeEvent::Concede) {
            return false;
        }
        self.concessions_start_day
            .get_or_insert(self.clock.current_day());
        true
    }

    /// → COLLAPSED, recording `collapse_day`
    pub fn collapse_regime(&mut self) -> bool {
        if !self.apply_regime_event(RegimeEvent::Collapse) {
            return false;
        }
        self.collapse_day.get_or_insert(self.clock.current_day());
        true
    }

    /// → TRANSITION after an orderly succession
    pub fn begin_orderly_transition(&mut self) -> bool {
        self.apply_regime_event(RegimeEvent::OrderlySuccession)
    }

    /// Record security-force defection (once per run)
    pub fn record_defection(&mut self) -> bool {
        if self.is_terminal() || self.defection_occurred {
            return false;
        }
        let day = self.current_day();
        self.defection_occurred = true;
        self.defection_day = Some(day);
        self.events.log(Event::SecurityForceDefection { day });
        true
    }

    /// Record an ethnic uprising (once per run)
    pub fn record_ethnic_uprising(&mut self) -> bool {
        if self.is_terminal() || self.ethnic_uprising {
            return false;
        }
        let day = self.current_day();
        self.ethnic_uprising = true;
        self.ethnic_uprising_day = Some(day);
        self.events.log(Event::EthnicUprising { day });
        true
    }

    /// Record the supreme leader's death (once per run)
    pub fn record_khamenei_death(&mut self) -> bool {
        if self.is_terminal() || self.khamenei_death_day.is_some() {
            return false;
        }
        let day = self.current_day();
        self.khamenei_death_day = Some(day);
        self.events.log(Event::KhameneiDeath { day });
        true
    }

    /// Record a foreign intervention action. Sets the soft/hard flag for the
    /// action's tier and raises `us_posture` if the action outranks it.
    pub fn record_us_action(&mut self, posture: UsPosture) -> bool {
        if self.is_terminal() || !self.us_actions.insert(posture) {
            return false;
        }
        match posture.tier() {
            InterventionTier::Soft => self.us_soft_intervened = true,
            InterventionTier::Hard => self.us_hard_intervened = true,
            InterventionTier::Rhetorical => {}
        }
        self.us_posture = self.us_posture.max(posture);
        self.events.log(Event::UsAction {
            day: self.current_day(),
            posture,
        });
        true
    }

    /// Mark an instant-basis key as drawn
    pub fn consume_instant(&mut self, key: &str) {
        self.consumed_instants.insert(key.to_string());
    }

    /// Assign the terminal outcome on the current day. First call wins.
    pub fn terminalize(&mut self, outcome: Outcome) -> bool {
        if self.is_terminal() {
            return false;
        }
        let day = self.current_day();
        self.final_outcome = Some(outcome);
        self.outcome_day = Some(day);
        self.events.log(Event::Terminal { day, outcome });
        true
    }

    /// Outcome implied by the regime state when the horizon runs out
    pub fn horizon_outcome(&self) -> Outcome {
        match self.regime_state {
            RegimeState::Collapsed => Outcome::RegimeCollapseChaotic,
            RegimeState::Transition => Outcome::ManagedTransition,
            RegimeState::Concessions => Outcome::RegimeSurvivesWithConcessions,
            RegimeState::StatusQuo | RegimeState::Crackdown => Outcome::RegimeSurvivesStatusQuo,
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}
