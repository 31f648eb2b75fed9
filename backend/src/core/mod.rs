//! Core simulation primitives: the day clock and the time-window resolver

pub mod time;
pub mod window;
