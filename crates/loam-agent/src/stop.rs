//! Process-wide cooperative cancellation.

use std::sync::Arc;

use tokio::sync::watch;

/// Idempotent stop flag shared by the supervisor, receive loop and report
/// loop.
///
/// Cloning is cheap; all clones observe the same flag. Once raised it stays
/// raised.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    /// Create a signal in the lowered state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the signal. Raising more than once has no further effect.
    pub fn raise(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the signal has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal is raised (immediately if it already is).
    pub async fn raised(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|raised| *raised).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
