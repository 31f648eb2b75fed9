//! Probability triplets with explicit time semantics
//!
//! A triplet is a `{low, mode, high}` belief about a probability plus the
//! window of simulated days during which the event it describes may occur.

use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

/// Below this spread a triplet is treated as a point estimate.
const DEGENERATE_SPREAD: f64 = 1e-12;

/// PERT shape parameter (weight of the mode).
const PERT_LAMBDA: f64 = 4.0;

/// How the triplet's probability is spread over simulated days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    /// Probability that the event happens at some point within the window
    Window,
    /// Single draw on the first eligible day
    Instant,
    /// Independent per-day probability
    Daily,
}

/// Named simulation milestone a triplet's window hangs off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    T0,
    #[serde(rename = "t0_plus_30", alias = "t0+30")]
    T0Plus30,
    #[serde(alias = "escalation_start_day")]
    EscalationStart,
    #[serde(alias = "crackdown_start_day")]
    CrackdownStart,
    #[serde(alias = "concessions_start_day")]
    ConcessionsStart,
    #[serde(alias = "defection")]
    DefectionDay,
    #[serde(alias = "ethnic_uprising_day")]
    EthnicUprising,
    #[serde(alias = "khamenei_death_day")]
    KhameneiDeath,
    #[serde(alias = "collapse_day")]
    Collapse,
}

impl Anchor {
    /// Anchors pinned to a calendar day rather than a recorded milestone
    pub fn fixed_day(self) -> Option<u32> {
        match self {
            Anchor::T0 => Some(1),
            Anchor::T0Plus30 => Some(31),
            _ => None,
        }
    }
}

/// Sampling distribution over `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// Beta-PERT peaked at `mode`
    #[default]
    #[serde(alias = "beta_pert")]
    Pert,
    Triangular,
    Uniform,
    /// Always `mode`
    Point,
}

/// `{low, mode, high}` probability belief with time semantics
///
/// # Example
///
/// ```rust
/// use crisis_simulator_core_rs::priors::{Anchor, ProbabilityTriplet, TimeBasis};
///
/// let json = r#"{
///     "low": 0.05, "mode": 0.10, "high": 0.20,
///     "time_basis": "window",
///     "anchor": "crackdown_start",
///     "start_offset_days": 0,
///     "window_days": 30
/// }"#;
/// let triplet: ProbabilityTriplet = serde_json::from_str(json).unwrap();
/// assert_eq!(triplet.anchor, Anchor::CrackdownStart);
/// assert_eq!(triplet.time_basis, TimeBasis::Window);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityTriplet {
    pub low: f64,
    pub mode: f64,
    pub high: f64,

    #[serde(default, alias = "distribution")]
    pub dist: Distribution,

    pub time_basis: TimeBasis,

    #[serde(default = "default_anchor")]
    pub anchor: Anchor,

    #[serde(default)]
    pub start_offset_days: u32,

    /// Length of the window in days; must be positive for `window` basis
    #[serde(default)]
    pub window_days: u32,
}

fn default_anchor() -> Anchor {
    Anchor::T0
}

impl ProbabilityTriplet {
    /// Window-basis triplet. Mostly useful for tests and fixtures.
    pub fn window(low: f64, mode: f64, high: f64, anchor: Anchor, offset: u32, days: u32) -> Self {
        Self {
            low,
            mode,
            high,
            dist: Distribution::Pert,
            time_basis: TimeBasis::Window,
            anchor,
            start_offset_days: offset,
            window_days: days,
        }
    }

    /// Certain-or-never point triplet over a window.
    pub fn fixed(p: f64, anchor: Anchor, offset: u32, days: u32) -> Self {
        let mut triplet = Self::window(p, p, p, anchor, offset, days);
        triplet.dist = Distribution::Point;
        triplet
    }

    /// PERT mean `(low + 4·mode + high) / 6`
    pub fn pert_mean(&self) -> f64 {
        (self.low + PERT_LAMBDA * self.mode + self.high) / (PERT_LAMBDA + 2.0)
    }

    /// Draw a probability from the configured distribution.
    ///
    /// The result always lies in `[low, high]`.
    pub fn sample(&self, rng: &mut RngManager) -> f64 {
        let spread = self.high - self.low;
        if spread <= DEGENERATE_SPREAD || self.dist == Distribution::Point {
            return self.mode;
        }

        let raw = match self.dist {
            Distribution::Pert => {
                let alpha = 1.0 + PERT_LAMBDA * (self.mode - self.low) / spread;
                let beta = 1.0 + PERT_LAMBDA * (self.high - self.mode) / spread;
                self.low + spread * rng.beta(alpha, beta)
            }
            Distribution::Triangular => {
                let u = rng.next_f64();
                let split = (self.mode - self.low) / spread;
                if u < split {
                    self.low + (u * spread * (self.mode - self.low)).sqrt()
                } else {
                    self.high - ((1.0 - u) * spread * (self.high - self.mode)).sqrt()
                }
            }
            Distribution::Uniform => self.low + spread * rng.next_f64(),
            Distribution::Point => self.mode,
        };

        raw.clamp(self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_triplet_returns_mode() {
        let triplet = ProbabilityTriplet::window(1.0, 1.0, 1.0, Anchor::T0, 0, 90);
        let mut rng = RngManager::new(1);
        for _ in 0..10 {
            assert_eq!(triplet.sample(&mut rng), 1.0);
        }
    }

    #[test]
    fn test_pert_samples_stay_in_support() {
        let triplet = ProbabilityTriplet::window(0.1, 0.3, 0.7, Anchor::T0, 0, 30);
        let mut rng = RngManager::new(77);
        for _ in 0..5_000 {
            let p = triplet.sample(&mut rng);
            assert!((0.1..=0.7).contains(&p), "sample {} outside support", p);
        }
    }

    #[test]
    fn test_pert_sample_mean_matches_pert_mean() {
        let triplet = ProbabilityTriplet::window(0.1, 0.3, 0.7, Anchor::T0, 0, 30);
        let mut rng = RngManager::new(4242);
        let n = 20_000;
        let mean = (0..n).map(|_| triplet.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - triplet.pert_mean()).abs() < 0.01);
    }

    #[test]
    fn test_triangular_samples_stay_in_support() {
        let mut triplet = ProbabilityTriplet::window(0.2, 0.25, 0.9, Anchor::T0, 0, 30);
        triplet.dist = Distribution::Triangular;
        let mut rng = RngManager::new(3);
        for _ in 0..2_000 {
            let p = triplet.sample(&mut rng);
            assert!((0.2..=0.9).contains(&p));
        }
    }

    #[test]
    fn test_anchor_aliases_deserialize() {
        let a: Anchor = serde_json::from_str("\"defection\"").unwrap();
        assert_eq!(a, Anchor::DefectionDay);
        let b: Anchor = serde_json::from_str("\"t0_plus_30\"").unwrap();
        assert_eq!(b, Anchor::T0Plus30);
        assert_eq!(b.fixed_day(), Some(31));
        let c: Anchor = serde_json::from_str("\"t0+30\"").unwrap();
        assert_eq!(c, Anchor::T0Plus30);
        assert_eq!(serde_json::to_string(&Anchor::T0Plus30).unwrap(), "\"t0_plus_30\"");
    }

    #[test]
    fn test_missing_distribution_defaults_to_pert() {
        let json = r#"{"low":0.1,"mode":0.2,"high":0.3,"time_basis":"daily"}"#;
        let triplet: ProbabilityTriplet = serde_json::from_str(json).unwrap();
        assert_eq!(triplet.dist, Distribution::Pert);
        assert_eq!(triplet.anchor, Anchor::T0);
    }
}
