//! Tests for DayClock and day bookkeeping on SimulationState

use crisis_simulator_core_rs::{DayClock, SimulationState, HORIZON_DAYS};

#[test]
fn test_clock_starts_on_day_one() {
    let clock = DayClock::new(HORIZON_DAYS);
    assert_eq!(clock.current_day(), 1);
    assert_eq!(clock.horizon_days(), 90);
    assert!(!clock.is_final_day());
}

#[test]
fn test_advance_to_final_day() {
    let mut clock = DayClock::new(90);
    for _ in 0..89 {
        clock.advance_day();
    }
    assert_eq!(clock.current_day(), 90);
    assert!(clock.is_final_day());
    assert!(!clock.is_finished());

    clock.advance_day();
    assert!(clock.is_finished());
}

#[test]
fn test_days_iterates_whole_horizon() {
    let clock = DayClock::new(5);
    assert_eq!(clock.days().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_state_clock_stops_once_terminal() {
    let mut state = SimulationState::new();
    state.advance_day();
    assert_eq!(state.current_day(), 2);

    state.terminalize(crisis_simulator_core_rs::Outcome::RegimeSurvivesStatusQuo);
    state.advance_day();
    assert_eq!(state.current_day(), 2);
    assert_eq!(state.outcome_day(), Some(2));
}

#[test]
fn test_set_current_day_jumps_forward_and_back() {
    let mut state = SimulationState::new();
    state.set_current_day(45);
    assert_eq!(state.current_day(), 45);
    state.set_current_day(3);
    assert_eq!(state.current_day(), 3);
}
