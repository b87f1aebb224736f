//! First-party collection proxy library.
//!
//! Serves third-party analytics traffic from the site's own origin while
//! anonymizing fingerprinting data, and rewrites vendor scripts so their
//! collection calls target the local proxy.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod privacy;
pub mod registry;
pub mod rewrite;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::VendorRegistry;
