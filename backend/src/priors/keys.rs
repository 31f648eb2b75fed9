//! Probability keys consulted by the engines
//!
//! The set of keys is closed: every probability the state machine or the ABM
//! macro layer samples is a variant here, with its bundle section, whether the
//! bundle must provide it, and which modifier event types apply to it.

use serde::{Deserialize, Serialize};

/// Bundle section a key lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    RegimeOutcomes,
    TransitionProbabilities,
    UsInterventionProbabilities,
    RegionalCascadeProbabilities,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::RegimeOutcomes => "regime_outcomes",
            Section::TransitionProbabilities => "transition_probabilities",
            Section::UsInterventionProbabilities => "us_intervention_probabilities",
            Section::RegionalCascadeProbabilities => "regional_cascade_probabilities",
        }
    }
}

/// Economic-modifier event types
pub mod economic_event {
    pub const PROTEST_ESCALATION: &str = "protest_escalation";
    pub const ELITE_FRACTURE: &str = "elite_fracture";
    pub const SECURITY_DEFECTION: &str = "security_defection";
}

/// US-intervention-modifier event types
pub mod us_event {
    pub const PROTEST_ESCALATION: &str = "protest_escalation";
    pub const CRACKDOWN: &str = "crackdown";
    pub const SECURITY_DEFECTION: &str = "security_defection";
    pub const REGIME_COLLAPSE: &str = "regime_collapse";
    pub const ETHNIC_COORDINATION: &str = "ethnic_coordination";
}

/// Every sampled probability, in canonical (sampling) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProbabilityKey {
    MassCasualtyCrackdown,
    ProtestCollapseGivenCrackdown,
    ProtestCollapseGivenConcessions,
    ProtestPlateau,
    ProtestReescalation,
    MeaningfulConcessions,
    SecurityForceDefection,
    RegimeCollapseGivenDefection,
    EthnicCoordination,
    FragmentationGivenUprising,
    KhameneiDeath,
    OrderlySuccession,
    InformationOps,
    EconomicEscalation,
    CovertSupport,
    CyberAttack,
    KineticStrike,
    GroundIntervention,
}

impl ProbabilityKey {
    pub const ALL: [ProbabilityKey; 18] = [
        ProbabilityKey::MassCasualtyCrackdown,
        ProbabilityKey::ProtestCollapseGivenCrackdown,
        ProbabilityKey::ProtestCollapseGivenConcessions,
        ProbabilityKey::ProtestPlateau,
        ProbabilityKey::ProtestReescalation,
        ProbabilityKey::MeaningfulConcessions,
        ProbabilityKey::SecurityForceDefection,
        ProbabilityKey::RegimeCollapseGivenDefection,
        ProbabilityKey::EthnicCoordination,
        ProbabilityKey::FragmentationGivenUprising,
        ProbabilityKey::KhameneiDeath,
        ProbabilityKey::OrderlySuccession,
        ProbabilityKey::InformationOps,
        ProbabilityKey::EconomicEscalation,
        ProbabilityKey::CovertSupport,
        ProbabilityKey::CyberAttack,
        ProbabilityKey::KineticStrike,
        ProbabilityKey::GroundIntervention,
    ];

    /// Key name inside its section
    pub fn name(self) -> &'static str {
        match self {
            ProbabilityKey::MassCasualtyCrackdown => "mass_casualty_crackdown_given_escalation",
            ProbabilityKey::ProtestCollapseGivenCrackdown => "protest_collapse_given_crackdown",
            ProbabilityKey::ProtestCollapseGivenConcessions => "protest_collapse_given_concessions",
            ProbabilityKey::ProtestPlateau => "protest_plateau_given_escalation",
            ProbabilityKey::ProtestReescalation => "protest_reescalation_given_plateau",
            ProbabilityKey::MeaningfulConcessions => "meaningful_concessions_given_protests_30d",
            ProbabilityKey::SecurityForceDefection => "security_force_defection_given_protests_30d",
            ProbabilityKey::RegimeCollapseGivenDefection => "regime_collapse_given_defection",
            ProbabilityKey::EthnicCoordination => "ethnic_coordination_given_protests_30d",
            ProbabilityKey::FragmentationGivenUprising => {
                "fragmentation_outcome_given_ethnic_uprising"
            }
            ProbabilityKey::KhameneiDeath => "khamenei_death_90d",
            ProbabilityKey::OrderlySuccession => "orderly_succession_given_khamenei_death",
            ProbabilityKey::InformationOps => "information_ops",
            ProbabilityKey::EconomicEscalation => "economic_escalation",
            ProbabilityKey::CovertSupport => "covert_support_given_protests_30d",
            ProbabilityKey::CyberAttack => "cyber_attack_given_crackdown",
            ProbabilityKey::KineticStrike => "kinetic_strike_given_crackdown",
            ProbabilityKey::GroundIntervention => "ground_intervention_given_collapse",
        }
    }

    pub fn section(self) -> Section {
        match self {
            ProbabilityKey::InformationOps
            | ProbabilityKey::EconomicEscalation
            | ProbabilityKey::CovertSupport
            | ProbabilityKey::CyberAttack
            | ProbabilityKey::KineticStrike
            | ProbabilityKey::GroundIntervention => Section::UsInterventionProbabilities,
            _ => Section::TransitionProbabilities,
        }
    }

    /// Whether `validate_priors` rejects a bundle without this key
    pub fn is_required(self) -> bool {
        !matches!(
            self,
            ProbabilityKey::ProtestPlateau | ProbabilityKey::ProtestReescalation
        )
    }

    /// Economic-modifier event type, if the economic pipeline applies
    pub fn economic_event(self) -> Option<&'static str> {
        match self {
            ProbabilityKey::ProtestReescalation => Some(economic_event::PROTEST_ESCALATION),
            ProbabilityKey::SecurityForceDefection => Some(economic_event::SECURITY_DEFECTION),
            ProbabilityKey::RegimeCollapseGivenDefection => Some(economic_event::ELITE_FRACTURE),
            _ => None,
        }
    }

    /// US-modifier event type, if the intervention pipeline applies
    pub fn us_event(self) -> Option<&'static str> {
        match self {
            ProbabilityKey::ProtestReescalation => Some(us_event::PROTEST_ESCALATION),
            ProbabilityKey::MassCasualtyCrackdown => Some(us_event::CRACKDOWN),
            ProbabilityKey::SecurityForceDefection => Some(us_event::SECURITY_DEFECTION),
            ProbabilityKey::RegimeCollapseGivenDefection => Some(us_event::REGIME_COLLAPSE),
            ProbabilityKey::EthnicCoordination => Some(us_event::ETHNIC_COORDINATION),
            _ => None,
        }
    }

    /// `section.key` path used in diagnostics
    pub fn path(self) -> String {
        format!("{}.{}", self.section().as_str(), self.name())
    }

    /// Position in `ALL`, used to index per-run sample tables
    pub fn index(self) -> usize {
        self as usize
    }
}
