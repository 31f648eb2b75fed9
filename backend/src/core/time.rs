//! Time management for the simulation
//!
//! A trajectory advances in whole days over a fixed forecast horizon.
//! Days are 1-indexed: day 1 is `t0`, the last day equals the horizon.

use serde::{Deserialize, Serialize};

/// Fixed forecast horizon in days.
pub const HORIZON_DAYS: u32 = 90;

/// Manages simulation time in discrete days
///
/// # Example
/// ```
/// use crisis_simulator_core_rs::DayClock;
///
/// let mut clock = DayClock::new(90);
/// assert_eq!(clock.current_day(), 1);
///
/// clock.advance_day();
/// assert_eq!(clock.current_day(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayClock {
    /// Current simulated day (1-indexed)
    current_day: u32,
    /// Last simulated day
    horizon_days: u32,
}

impl DayClock {
    /// Create a new clock positioned on day 1
    ///
    /// # Panics
    /// Panics if `horizon_days` is zero
    pub fn new(horizon_days: u32) -> Self {
        assert!(horizon_days > 0, "horizon_days must be positive");
        Self {
            current_day: 1,
            horizon_days,
        }
    }

    /// Advance time by one day
    pub fn advance_day(&mut self) {
        self.current_day += 1;
    }

    /// Get the current day
    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    /// Get the forecast horizon
    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Check if the current day is the final day of the horizon
    ///
    /// # Example
    /// ```
    /// use crisis_simulator_core_rs::DayClock;
    ///
    /// let mut clock = DayClock::new(3);
    /// clock.advance_day();
    /// clock.advance_day();
    /// assert!(clock.is_final_day());
    /// ```
    pub fn is_final_day(&self) -> bool {
        self.current_day == self.horizon_days
    }

    /// Whether the clock has run past the horizon
    pub fn is_finished(&self) -> bool {
        self.current_day > self.horizon_days
    }

    /// Iterate over every day of the horizon
    pub fn days(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.horizon_days
    }
}

impl Default for DayClock {
    fn default() -> Self {
        Self::new(HORIZON_DAYS)
    }
}
