//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request under the collect prefix
//!     → server.rs (Axum setup, middleware, request ID)
//!     → handler.rs (route match, policy, sanitize, forward, relay)
//!     → headers.rs (request/response header sanitization)
//!     → diagnostics.rs (non-blocking before/after events)
//! ```

pub mod diagnostics;
pub mod handler;
pub mod headers;
pub mod server;

pub use diagnostics::{DiagnosticsSink, ProxyDiagnostic};
pub use handler::AppState;
pub use server::HttpServer;
