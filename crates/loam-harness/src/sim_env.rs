//! Turmoil-based Environment implementation for deterministic testing.

use std::{
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use chrono::{NaiveDate, NaiveDateTime};
use loam_core::env::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Simulation environment using Turmoil's virtual time and seeded RNG.
///
/// This implementation provides:
///
/// - **Virtual Time**: `sleep()` is tokio's sleep, which Turmoil advances
///   instantly. `wall_clock()` is a fixed start date plus the virtual time
///   elapsed since the first call, so auth timestamps are reproducible.
///
/// - **Seeded RNG**: `random_bytes()` (and therefore every moisture level)
///   comes from a ChaCha20Rng with a fixed seed.
///
/// # Determinism
///
/// Two runs with the same seed and the same script produce the same
/// timestamps, signatures and readings.
///
/// # Usage
///
/// `SimEnv` must be used inside a Turmoil simulation context (created by
/// `turmoil::Builder`) for its clock to be virtual.
#[derive(Clone)]
pub struct SimEnv {
    /// Shared across clones so all users draw from one sequence.
    /// Turmoil is single-threaded, so this Mutex never blocks.
    rng: Arc<Mutex<ChaCha20Rng>>,
    epoch: Arc<OnceLock<tokio::time::Instant>>,
}

impl SimEnv {
    /// Wall-clock time reported at the first `wall_clock()` call.
    pub fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .unwrap_or_default()
    }

    /// Create a new SimEnv with default seed (0)
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create a new SimEnv with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            epoch: Arc::new(OnceLock::new()),
        }
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn wall_clock(&self) -> NaiveDateTime {
        let epoch = *self.epoch.get_or_init(tokio::time::Instant::now);
        let elapsed = tokio::time::Instant::now().duration_since(epoch);

        chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|elapsed| Self::start().checked_add_signed(elapsed))
            .unwrap_or(NaiveDateTime::MAX)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng
            .lock()
            .unwrap_or_else(|e| {
                // Turmoil is single threaded; poisoning needs a panic while
                // the lock is held.
                unreachable!("RNG mutex poisoned in single-threaded context: {}", e)
            })
            .fill_bytes(buffer);
    }
}
