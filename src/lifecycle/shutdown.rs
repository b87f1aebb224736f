//! Graceful shutdown signal.
//!
//! # Responsibilities
//! - Fan one stop signal out to the HTTP server and the ctrl-c watcher
//!
//! # Design Decisions
//! - A unit broadcast channel: subscribers only care that the signal fired,
//!   and late subscribers after `trigger` still observe closure via the
//!   dropped sender side

use tokio::sync::broadcast;

/// Hands out receivers that resolve when shutdown is triggered.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for one task; the server loop awaits this to stop accepting.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Safe to call with no subscribers and safe to call
    /// more than once.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
