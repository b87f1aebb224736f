//! Non-blocking diagnostics for observability and tests.
//!
//! # Responsibilities
//! - Publish per-request before/after sanitization snapshots
//! - Never block or fail the request path
//!
//! # Design Decisions
//! - Broadcast channel: any number of subscribers, none required
//! - Events dropped on the floor when nobody listens; the hot path only pays
//!   for a clone when a subscriber exists

use tokio::sync::broadcast;
use uuid::Uuid;

/// Snapshot of what the proxy changed on one request: the query, headers and
/// body both as received and as forwarded upstream. Snapshots are owned
/// values so events outlive the request they describe.
#[derive(Debug, Clone)]
pub struct ProxyDiagnostic {
    pub id: Uuid,
    pub vendor: String,
    pub target_url: String,
    pub original_query: Vec<(String, String)>,
    pub sanitized_query: Vec<(String, String)>,
    pub original_headers: Vec<(String, String)>,
    pub sanitized_headers: Vec<(String, String)>,
    /// Header names dropped or transformed on the way upstream.
    pub touched_headers: Vec<String>,
    /// Body as received; `None` when the request carried none.
    pub original_body: Option<Vec<u8>>,
    /// Body as forwarded; `None` when it left unchanged.
    pub sanitized_body: Option<Vec<u8>>,
    pub status: u16,
}

/// Publisher handle; cheap to clone into the request handler.
#[derive(Clone)]
pub struct DiagnosticsSink {
    tx: broadcast::Sender<ProxyDiagnostic>,
}

impl DiagnosticsSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to diagnostic events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProxyDiagnostic> {
        self.tx.subscribe()
    }

    /// Emit an event. Never blocks; send failure just means no subscribers.
    pub fn emit(&self, event: ProxyDiagnostic) {
        let _ = self.tx.send(event);
    }
}

impl Default for DiagnosticsSink {
    fn default() -> Self {
        Self::new(64)
    }
}
