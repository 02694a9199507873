//! Shutdown coordination for the node.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Single-fire shutdown signal shared by every background task.
///
/// Cloning yields another handle to the same signal. Firing is idempotent:
/// only the first call to [`ShutdownSignal::fire`] has an effect, later calls
/// are no-ops and report `false`.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    fired: Arc<AtomicBool>,
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Create a new, unfired signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Shutdown signal already fired");
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Resolves once the signal fires (immediately if it already has).
    pub fn fired(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
