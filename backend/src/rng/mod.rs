//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in the simulator MUST go through this module.
//!
//! Every trajectory owns its own generator derived from `(seed_base, run_index)`,
//! so parallel batches reproduce regardless of scheduling order.

mod xorshift;

pub use xorshift::RngManager;
