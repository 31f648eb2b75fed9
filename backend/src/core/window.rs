//! Time-window resolution
//!
//! Decides whether a probability entry may be sampled on the current day.
//!
//! ```text
//! anchor_day   = fixed day (t0, t0_plus_30) or the milestone recorded on the state
//! window_start = anchor_day + start_offset_days
//! window_end   = window_start + window_days - 1          (window basis only)
//! active       ⇔ window_start ≤ day ≤ window_end          (inclusive both ends)
//! ```
//!
//! An anchor that has not been recorded yet keeps the entry inactive.

use crate::models::state::SimulationState;
use crate::priors::{Anchor, ProbabilityTriplet, TimeBasis};

/// Day an anchor resolves to on this trajectory, if it has happened
pub fn anchor_day(anchor: Anchor, state: &SimulationState) -> Option<u32> {
    if let Some(day) = anchor.fixed_day() {
        return Some(day);
    }
    match anchor {
        Anchor::EscalationStart => state.escalation_start_day(),
        Anchor::CrackdownStart => state.crackdown_start_day(),
        Anchor::ConcessionsStart => state.concessions_start_day(),
        Anchor::DefectionDay => state.defection_day(),
        Anchor::EthnicUprising => state.ethnic_uprising_day(),
        Anchor::KhameneiDeath => state.khamenei_death_day(),
        Anchor::Collapse => state.collapse_day(),
        Anchor::T0 | Anchor::T0Plus30 => None,
    }
}

/// Inclusive `(start, end)` of the eligibility range; `end` is `None` for
/// open-ended (daily/instant) entries. `None` while the anchor is unset, or
/// when the offset pushes the start past `u32::MAX` (never eligible).
pub fn window_bounds(triplet: &ProbabilityTriplet, state: &SimulationState) -> Option<(u32, Option<u32>)> {
    let start = anchor_day(triplet.anchor, state)?.checked_add(triplet.start_offset_days)?;
    match triplet.time_basis {
        TimeBasis::Window => {
            let end = start.saturating_add(triplet.window_days).checked_sub(1)?;
            Some((start, Some(end)))
        }
        TimeBasis::Instant | TimeBasis::Daily => Some((start, None)),
    }
}

/// Whether the entry may be sampled on the state's current day
///
/// # Example
/// ```
/// use crisis_simulator_core_rs::core::window::is_window_active;
/// use crisis_simulator_core_rs::models::SimulationState;
/// use crisis_simulator_core_rs::priors::{Anchor, ProbabilityTriplet};
///
/// let triplet = ProbabilityTriplet::window(0.1, 0.2, 0.3, Anchor::CrackdownStart, 2, 5);
/// let mut state = SimulationState::new();
/// assert!(!is_window_active(&triplet, &state)); // no crackdown yet
///
/// state.set_current_day(10);
/// state.start_crackdown();
/// state.set_current_day(12);
/// assert!(is_window_active(&triplet, &state)); // 10 + 2 = 12
/// state.set_current_day(17);
/// assert!(!is_window_active(&triplet, &state)); // window is 12..=16
/// ```
pub fn is_window_active(triplet: &ProbabilityTriplet, state: &SimulationState) -> bool {
    let day = state.current_day();
    match window_bounds(triplet, state) {
        Some((start, Some(end))) => start <= day && day <= end,
        Some((start, None)) => start <= day,
        None => false,
    }
}

/// Whether a window-basis entry's window has already run its last day.
///
/// Open-ended entries and unset anchors never close.
pub fn window_closed(triplet: &ProbabilityTriplet, state: &SimulationState) -> bool {
    matches!(window_bounds(triplet, state), Some((_, Some(end))) if state.current_day() >= end)
}

/// Convert an adjusted probability into the chance of firing today.
///
/// A window probability `p` covers the whole window, so the daily hazard is
/// `1 - (1 - p)^(1/W)`; over `W` independent days the event then fires with
/// probability `p`. Daily and instant entries use `p` as is.
pub fn daily_probability(triplet: &ProbabilityTriplet, p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    match triplet.time_basis {
        TimeBasis::Window if triplet.window_days > 1 => {
            if p >= 1.0 {
                1.0
            } else {
                1.0 - (1.0 - p).powf(1.0 / triplet.window_days as f64)
            }
        }
        _ => p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t0_plus_30_resolves_to_day_31() {
        let triplet = ProbabilityTriplet::window(0.1, 0.2, 0.3, Anchor::T0Plus30, 0, 10);
        let mut state = SimulationState::new();
        state.set_current_day(30);
        assert!(!is_window_active(&triplet, &state));
        state.set_current_day(31);
        assert!(is_window_active(&triplet, &state));
        state.set_current_day(40);
        assert!(is_window_active(&triplet, &state));
        state.set_current_day(41);
        assert!(!is_window_active(&triplet, &state));
    }

    #[test]
    fn test_daily_basis_is_open_ended() {
        let mut triplet = ProbabilityTriplet::window(0.1, 0.2, 0.3, Anchor::T0, 5, 0);
        triplet.time_basis = TimeBasis::Daily;
        let mut state = SimulationState::new();
        state.set_current_day(4);
        assert!(!is_window_active(&triplet, &state));
        state.set_current_day(90);
        assert!(is_window_active(&triplet, &state));
        assert!(!window_closed(&triplet, &state));
    }

    #[test]
    fn test_window_hazard_compounds_back_to_window_probability() {
        let triplet = ProbabilityTriplet::window(0.3, 0.3, 0.3, Anchor::T0, 0, 30);
        let daily = daily_probability(&triplet, 0.3);
        let over_window = 1.0 - (1.0 - daily).powi(30);
        assert!((over_window - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_certain_window_is_certain_every_day() {
        let triplet = ProbabilityTriplet::fixed(1.0, Anchor::T0, 0, 90);
        assert_eq!(daily_probability(&triplet, 1.0), 1.0);
    }
}
