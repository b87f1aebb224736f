//! Vendor route table and proxy config registry.
//!
//! # Data Flow
//! ```text
//! collect prefix (from config)
//!     → vendors.rs (substitute prefix into the static vendor template)
//!     → table.rs (flatten routes, sort longest-prefix-first, validate)
//!     → VendorRegistry (immutable, shared via Arc)
//!
//! Request path → match_route → { vendor, upstream origin, local prefix }
//! ```
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards; no locks on the hot path
//! - Longest prefix wins, with a segment-boundary check so `/ga` never
//!   swallows `/ga-legacy`
//! - Every rewrite target must land under some route prefix; validated at
//!   startup and pinned by tests

pub mod table;
pub mod vendors;

pub use table::{InterceptRule, RouteMatch, VendorRegistry};
pub use vendors::{ProxyRoute, VendorProxyConfig};
