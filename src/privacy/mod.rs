//! Privacy subsystem.
//!
//! # Data Flow
//! ```text
//! Vendor privacy defaults + global override
//!     → policy.rs (resolve + merge into a full 6-flag policy)
//!     → strip.rs (query/body sanitization, driven by catalog.rs)
//!     → normalize.rs (IP / UA / language / screen transforms)
//! ```
//!
//! # Design Decisions
//! - Policies are always fully resolved before use; no Option flags downstream
//! - A missing vendor entry fails closed (all flags on), never open
//! - The parameter catalog is immutable and built once per process

pub mod catalog;
pub mod normalize;
pub mod policy;
pub mod strip;

pub use policy::{PolicyFlags, PrivacyPolicy, PrivacySetting};
