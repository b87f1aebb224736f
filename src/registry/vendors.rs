//! Built-in vendor proxy configurations.
//!
//! # Responsibilities
//! - Define per-vendor routes, rewrite rules and privacy defaults
//! - Substitute the configured collect prefix into the static template
//!
//! # Design Decisions
//! - The template is code, not config: adding a vendor is a reviewed change
//! - Upstream origins are always absolute https in the built-in table
//! - Rule order matters: exact-host rules come before suffix rules

use crate::privacy::{PolicyFlags, PrivacySetting};
use crate::rewrite::RewriteRule;

/// A local route and the upstream origin it forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    /// Local path prefix, e.g. `/_scripts/c/ga`. Unique across all vendors.
    pub local_prefix: String,
    /// Absolute upstream origin, e.g. `https://www.google-analytics.com`.
    pub upstream_origin: String,
}

/// Everything the proxy knows about one vendor.
#[derive(Debug, Clone)]
pub struct VendorProxyConfig {
    /// Stable vendor key, e.g. `google-analytics`.
    pub vendor: String,
    /// Ordered URL rewrite rules applied to this vendor's scripts.
    pub rewrite: Vec<RewriteRule>,
    /// Local routes owned by this vendor.
    pub routes: Vec<ProxyRoute>,
    /// Privacy defaults. `None` means the entry is missing and resolution
    /// fails closed.
    pub privacy_defaults: Option<PrivacySetting>,
}

fn route(local_prefix: String, upstream_origin: &str) -> ProxyRoute {
    ProxyRoute {
        local_prefix,
        upstream_origin: upstream_origin.to_string(),
    }
}

/// Build the vendor table for a given collect prefix (no trailing slash).
pub fn builtin_vendors(collect_prefix: &str) -> Vec<VendorProxyConfig> {
    let p = collect_prefix.trim_end_matches('/');
    vec![
        VendorProxyConfig {
            vendor: "google-analytics".to_string(),
            rewrite: vec![
                RewriteRule::new("ssl.google-analytics.com", format!("{p}/ga-legacy")),
                RewriteRule::new("www.google-analytics.com", format!("{p}/ga")),
                RewriteRule::new(".google-analytics.com", format!("{p}/ga")),
                RewriteRule::new(".analytics.google.com", format!("{p}/ga")),
            ],
            routes: vec![
                route(format!("{p}/ga"), "https://www.google-analytics.com"),
                route(format!("{p}/ga-legacy"), "https://ssl.google-analytics.com"),
            ],
            privacy_defaults: Some(PrivacySetting::All(true)),
        },
        VendorProxyConfig {
            vendor: "google-tag-manager".to_string(),
            rewrite: vec![
                RewriteRule::new("www.googletagmanager.com", format!("{p}/gtm")),
                RewriteRule::new("www.google-analytics.com", format!("{p}/ga")),
                RewriteRule::new(".google-analytics.com", format!("{p}/ga")),
            ],
            routes: vec![route(format!("{p}/gtm"), "https://www.googletagmanager.com")],
            privacy_defaults: Some(PrivacySetting::All(true)),
        },
        VendorProxyConfig {
            vendor: "meta-pixel".to_string(),
            rewrite: vec![
                RewriteRule::new("connect.facebook.net", format!("{p}/meta")),
                RewriteRule::new("www.facebook.com/tr", format!("{p}/meta-collect/tr")),
            ],
            routes: vec![
                route(format!("{p}/meta"), "https://connect.facebook.net"),
                route(format!("{p}/meta-collect"), "https://www.facebook.com"),
            ],
            privacy_defaults: Some(PrivacySetting::All(true)),
        },
        VendorProxyConfig {
            vendor: "tiktok-pixel".to_string(),
            rewrite: vec![RewriteRule::new(
                "analytics.tiktok.com",
                format!("{p}/tiktok"),
            )],
            routes: vec![route(format!("{p}/tiktok"), "https://analytics.tiktok.com")],
            privacy_defaults: Some(PrivacySetting::All(true)),
        },
        // Plausible collects no fingerprint parameters itself; only the IP
        // flag is on by default.
        VendorProxyConfig {
            vendor: "plausible".to_string(),
            rewrite: vec![RewriteRule::new("plausible.io", format!("{p}/plausible"))],
            routes: vec![route(format!("{p}/plausible"), "https://plausible.io")],
            privacy_defaults: Some(PrivacySetting::Flags(PolicyFlags {
                ip: Some(true),
                ..Default::default()
            })),
        },
    ]
}
