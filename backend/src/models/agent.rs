//! Agent classes for the agent-based engine
//!
//! The population is split into five fixed classes. Each class carries its
//! share of the population and its behavioural parameters; per-agent state
//! lives in the ABM population arrays, not here.

use serde::{Deserialize, Serialize};

/// Agent class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentType {
    /// Lowest threshold; initiates protest waves
    Student,
    /// Threshold ramps down as economic stress rises
    Merchant,
    /// Security sub-population that can defect
    Conscript,
    /// Loyal security; suppresses neighbours, never protests
    Hardliner,
    /// Bulk population with exhaustion dynamics
    Civilian,
}

impl AgentType {
    pub const ALL: [AgentType; 5] = [
        AgentType::Student,
        AgentType::Merchant,
        AgentType::Conscript,
        AgentType::Hardliner,
        AgentType::Civilian,
    ];

    /// Fixed share of the population
    pub fn population_share(self) -> f64 {
        match self {
            AgentType::Student => 0.15,
            AgentType::Merchant => 0.20,
            AgentType::Conscript => 0.10,
            AgentType::Hardliner => 0.05,
            AgentType::Civilian => 0.50,
        }
    }

    /// Mean activation threshold before individual noise
    pub fn base_threshold(self) -> f64 {
        match self {
            AgentType::Student => 0.12,
            AgentType::Merchant => 0.38,
            AgentType::Conscript => 0.70,
            AgentType::Hardliner => f64::INFINITY,
            AgentType::Civilian => 0.30,
        }
    }

    /// How strongly economic pressure translates into grievance
    pub fn economic_sensitivity(self) -> f64 {
        match self {
            AgentType::Student => 0.6,
            AgentType::Merchant => 1.0,
            AgentType::Conscript => 0.3,
            AgentType::Hardliner => 0.0,
            AgentType::Civilian => 0.8,
        }
    }

    /// Whether agents of this class can join street protests
    pub fn can_protest(self) -> bool {
        !matches!(self, AgentType::Hardliner | AgentType::Conscript)
    }

    /// Exact head-count for this class in a population of `population`.
    ///
    /// Civilians absorb rounding so the counts always sum to `population`.
    pub fn head_count(self, population: usize) -> usize {
        match self {
            AgentType::Civilian => {
                let others: usize = AgentType::ALL
                    .iter()
                    .filter(|t| **t != AgentType::Civilian)
                    .map(|t| t.head_count(population))
                    .sum();
                population.saturating_sub(others)
            }
            other => (population as f64 * other.population_share()).round() as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shares_sum_to_one() {
        let total: f64 = AgentType::ALL.iter().map(|t| t.population_share()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_head_counts_for_standard_population() {
        assert_eq!(AgentType::Student.head_count(10_000), 1_500);
        assert_eq!(AgentType::Merchant.head_count(10_000), 2_000);
        assert_eq!(AgentType::Conscript.head_count(10_000), 1_000);
        assert_eq!(AgentType::Hardliner.head_count(10_000), 500);
        assert_eq!(AgentType::Civilian.head_count(10_000), 5_000);
    }

    #[test]
    fn test_head_counts_sum_for_odd_population() {
        let total: usize = AgentType::ALL.iter().map(|t| t.head_count(997)).sum();
        assert_eq!(total, 997);
    }

    #[test]
    fn test_student_threshold_is_lowest() {
        let student = AgentType::Student.base_threshold();
        for t in AgentType::ALL {
            assert!(t.base_threshold() >= student);
        }
    }
}
