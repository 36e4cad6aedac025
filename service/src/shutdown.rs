//! Shutdown signalling shared by the service's background tasks.

use tokio::sync::watch;

/// Latches a single "stop now" flag and fans it out to every task.
///
/// Built on a `watch` channel rather than a broadcast: the flag stays
/// readable after it fires, so a task that subscribes late (or checks
/// between awaits) still observes the shutdown. OS signal handling lives in
/// `GateService::wait_for_signal`; this type only owns the flag.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Receiver for one task. `wait_for(|stop| *stop)` resolves once
    /// [`shutdown`](Self::shutdown) has been called, including when it was
    /// called before the subscription.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Latch the flag. Idempotent; safe to call from any task.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
