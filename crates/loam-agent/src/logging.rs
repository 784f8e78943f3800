//! Process-wide tracing setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when neither `RUST_LOG` nor `--log-level` is given.
pub const DEFAULT_FILTER: &str = "info";

/// Build the event filter. `RUST_LOG` wins over `fallback`; an invalid
/// `fallback` degrades to [`DEFAULT_FILTER`].
pub fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(fallback).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    })
}

/// Install the fmt subscriber. Returns `false` if a global subscriber was
/// already set.
pub fn init(fallback: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(fallback))
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_fallback_degrades_to_default() {
        // Only meaningful when RUST_LOG is unset, which is the CI default
        if std::env::var_os("RUST_LOG").is_none() {
            let expected = EnvFilter::new(DEFAULT_FILTER).to_string();
            assert_eq!(filter("loam=bogus").to_string(), expected);
            assert_ne!(filter("debug").to_string(), expected);
        }
    }

    #[test]
    fn second_init_is_rejected() {
        init("warn");
        assert!(!init("warn"));
    }
}
