//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples device logic from system resources
//! (wall clock, timers, randomness). This enables:
//!
//! - Deterministic Simulation: Turmoil provides a virtual clock and the
//!   harness a seeded RNG, so a failing run can be replayed exactly.
//!
//! - Production Runtime: The agent's `SystemEnv` uses the local clock, Tokio
//!   timers and the thread RNG without any change to the protocol logic.
//!
//! # Invariants
//!
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use std::{future::Future, time::Duration};

use chrono::NaiveDateTime;

/// Abstract environment providing time, randomness, and async sleep.
///
/// # Implementations
///
/// - Simulation (`loam-harness::SimEnv`): Virtual time that advances
///   instantly, seeded RNG for reproducibility.
///
/// - Production (`loam-agent::SystemEnv`): Local wall clock, Tokio timers,
///   thread RNG.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current local wall-clock time.
    ///
    /// Used for auth and measurement timestamps, which the server parses as
    /// ISO-8601 without a zone offset.
    fn wall_clock(&self) -> NaiveDateTime;

    /// Sleeps for the specified duration.
    ///
    /// - Simulation: Advances Turmoil's virtual time (no wall-clock delay)
    /// - Production: Yields to the Tokio scheduler
    ///
    /// Only driver code may call this. The session state machine never
    /// sleeps.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Draws a synthetic moisture level, uniformly in `0..=100`.
    fn moisture_level(&self) -> u8 {
        // modulo bias over 2^64 is below 1e-17
        (self.random_u64() % 101) as u8
    }
}
