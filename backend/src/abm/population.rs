//! Agent population as parallel arrays
//!
//! One slot per agent, indexed by graph node. Types are assigned by an exact
//! head-count per class followed by a seeded shuffle, so every run sees the
//! documented shares while the placement on the graph varies.

use crate::abm::{AbmConfig, ContactGraph};
use crate::models::agent::AgentType;
use crate::rng::RngManager;

#[derive(Debug, Clone)]
pub struct Population {
    kinds: Vec<AgentType>,
    thresholds: Vec<f64>,
    /// 1.0 while protesting; kept as f64 for the neighbour pass
    active: Vec<f64>,
    exhaustion: Vec<f64>,
    defected: Vec<bool>,
    /// Share of each agent's neighbours that are hardliners (static)
    hardliner_share: Vec<f64>,
    /// Conscript node indices, ascending
    conscripts: Vec<usize>,
}

impl Population {
    /// Assign classes, thresholds and the day-1 seed activation.
    ///
    /// `rng` is consumed in a fixed order: shuffle, thresholds, seed activation.
    pub fn new(config: &AbmConfig, graph: &ContactGraph, rng: &mut RngManager) -> Self {
        let n = config.population;

        let mut kinds = Vec::with_capacity(n);
        for kind in AgentType::ALL {
            kinds.extend(std::iter::repeat(kind).take(kind.head_count(n)));
        }
        kinds.truncate(n);
        rng.shuffle(&mut kinds);

        let thresholds: Vec<f64> = kinds
            .iter()
            .map(|kind| {
                let base = kind.base_threshold();
                let noise = (rng.next_f64() * 2.0 - 1.0) * config.threshold_jitter;
                if base.is_finite() {
                    (base * (1.0 + noise)).max(0.0)
                } else {
                    base
                }
            })
            .collect();

        let active: Vec<f64> = kinds
            .iter()
            .map(|kind| {
                let seeded = rng.bernoulli(config.initial_student_activation);
                if *kind == AgentType::Student && seeded {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        let is_hardliner: Vec<f64> = kinds
            .iter()
            .map(|kind| if *kind == AgentType::Hardliner { 1.0 } else { 0.0 })
            .collect();
        let mut hardliner_share = vec![0.0; n];
        graph.neighbor_mean(&is_hardliner, &mut hardliner_share);

        let conscripts = kinds
            .iter()
            .enumerate()
            .filter(|(_, kind)| **kind == AgentType::Conscript)
            .map(|(i, _)| i)
            .collect();

        Self {
            kinds,
            thresholds,
            active,
            exhaustion: vec![0.0; n],
            defected: vec![false; n],
            hardliner_share,
            conscripts,
        }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kind(&self, agent: usize) -> AgentType {
        self.kinds[agent]
    }

    pub fn threshold(&self, agent: usize) -> f64 {
        self.thresholds[agent]
    }

    pub fn is_active(&self, agent: usize) -> bool {
        self.active[agent] > 0.0
    }

    pub fn exhaustion(&self, agent: usize) -> f64 {
        self.exhaustion[agent]
    }

    pub fn has_defected(&self, agent: usize) -> bool {
        self.defected[agent]
    }

    pub fn hardliner_share(&self, agent: usize) -> f64 {
        self.hardliner_share[agent]
    }

    pub fn active(&self) -> &[f64] {
        &self.active
    }

    pub fn conscripts(&self) -> &[usize] {
        &self.conscripts
    }

    pub fn count_of(&self, kind: AgentType) -> usize {
        self.kinds.iter().filter(|k| **k == kind).count()
    }

    /// Fraction of the whole population protesting today
    pub fn protesting_fraction(&self) -> f64 {
        if self.kinds.is_empty() {
            return 0.0;
        }
        let active = self.active.iter().filter(|a| **a > 0.0).count();
        active as f64 / self.kinds.len() as f64
    }

    /// Fraction of conscripts that have defected
    pub fn conscript_defection_fraction(&self) -> f64 {
        if self.conscripts.is_empty() {
            return 0.0;
        }
        let defected = self.conscripts.iter().filter(|&&i| self.defected[i]).count();
        defected as f64 / self.conscripts.len() as f64
    }

    /// Defected conscripts among the `span` conscripts either side of the
    /// conscript at `position` in `conscripts()`, wrapping around.
    pub fn defected_peers(&self, position: usize, span: usize) -> usize {
        let m = self.conscripts.len();
        if m < 2 {
            return 0;
        }
        let span = span.min((m - 1) / 2);
        if span == 0 {
            let other = (position + 1) % m;
            return usize::from(self.defected[self.conscripts[other]]);
        }
        (1..=span)
            .flat_map(|step| [(position + step) % m, (position + m - step) % m])
            .filter(|&p| self.defected[self.conscripts[p]])
            .count()
    }

    /// Replace today's activation and defection arrays with the next day's
    pub(crate) fn commit(&mut self, active: Vec<f64>, exhaustion: Vec<f64>, defected: Vec<bool>) {
        self.active = active;
        self.exhaustion = exhaustion;
        self.defected = defected;
    }

    pub(crate) fn defected(&self) -> &[bool] {
        &self.defected
    }

    pub(crate) fn exhaustion_levels(&self) -> &[f64] {
        &self.exhaustion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(n: usize, seed: u64) -> Population {
        let config = AbmConfig::with_population(n);
        let mut rng = RngManager::new(seed);
        let graph = ContactGraph::small_world(n, 8, 1, &mut rng);
        Population::new(&config, &graph, &mut rng)
    }

    #[test]
    fn test_exact_class_counts() {
        let pop = build(2_000, 3);
        assert_eq!(pop.count_of(AgentType::Student), 300);
        assert_eq!(pop.count_of(AgentType::Merchant), 400);
        assert_eq!(pop.count_of(AgentType::Conscript), 200);
        assert_eq!(pop.count_of(AgentType::Hardliner), 100);
        assert_eq!(pop.count_of(AgentType::Civilian), 1_000);
        assert_eq!(pop.conscripts().len(), 200);
    }

    #[test]
    fn test_only_students_seeded() {
        let pop = build(2_000, 8);
        for i in 0..pop.len() {
            if pop.is_active(i) {
                assert_eq!(pop.kind(i), AgentType::Student);
            }
        }
        assert!(pop.protesting_fraction() > 0.0);
    }

    #[test]
    fn test_hardliners_have_infinite_threshold() {
        let pop = build(500, 1);
        for i in 0..pop.len() {
            if pop.kind(i) == AgentType::Hardliner {
                assert!(pop.threshold(i).is_infinite());
            } else {
                assert!(pop.threshold(i).is_finite());
            }
        }
    }

    #[test]
    fn test_no_defections_at_start() {
        let pop = build(500, 2);
        assert_eq!(pop.conscript_defection_fraction(), 0.0);
        assert_eq!(pop.defected_peers(0, 4), 0);
    }
}
