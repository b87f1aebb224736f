//! Observability subsystem: metrics exposition.
//!
//! Structured logging is initialized in `main` via `tracing-subscriber`;
//! this module owns the Prometheus metrics endpoint and the recording
//! helpers used on the request path.

pub mod metrics;
