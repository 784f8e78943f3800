//! Production environment backed by the system clock and thread RNG.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use loam_core::env::Environment;
use rand::RngCore;

/// Real clock, real sleeps, OS-seeded randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn wall_clock(&self) -> NaiveDateTime {
        // The server compares timestamps in the device's local time
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        rand::thread_rng().fill_bytes(buffer);
    }
}
