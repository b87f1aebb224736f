//! Route table construction, validation and lookup.
//!
//! # Responsibilities
//! - Flatten per-vendor routes into a longest-prefix-first table
//! - Validate structural invariants at startup
//! - Answer route lookups and derive client-side intercept rules
//!
//! # Design Decisions
//! - O(n) prefix scan over the flattened table; vendor route counts are tiny
//! - Validation returns all violations, not just the first
//! - A test-only constructor lets integration tests target http mock
//!   upstreams; the https invariant binds the built-in table

use crate::registry::vendors::{builtin_vendors, ProxyRoute, VendorProxyConfig};

/// Immutable registry of vendor proxy configs, built once at startup.
pub struct VendorRegistry {
    vendors: Vec<VendorProxyConfig>,
    /// (local_prefix, upstream_origin, vendor index), longest prefix first.
    routes: Vec<(String, String, usize)>,
}

/// Result of a route lookup. Carries the vendor key rather than the config
/// itself; the handler resolves the config separately and treats a miss as a
/// hard configuration error.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    pub vendor_key: &'a str,
    pub local_prefix: &'a str,
    pub upstream_origin: &'a str,
}

/// Rule for pre-emptive client-side interception (service worker and the
/// offline bundling transform consume these).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptRule {
    /// Host or `.host` suffix pattern the client should intercept.
    pub domain_pattern: String,
    /// Path prefix under that host; `/` when the rule covers the whole host.
    pub path_prefix: String,
    /// Local proxy path the intercepted request is redirected to.
    pub target: String,
}

impl VendorRegistry {
    /// Build the registry from the built-in vendor template.
    pub fn new(collect_prefix: &str) -> Self {
        Self::from_vendors(builtin_vendors(collect_prefix))
    }

    /// Build from an explicit vendor list. Used by tests to point routes at
    /// local mock upstreams.
    pub fn from_vendors(vendors: Vec<VendorProxyConfig>) -> Self {
        let mut routes = Vec::new();
        for (idx, vendor) in vendors.iter().enumerate() {
            for ProxyRoute {
                local_prefix,
                upstream_origin,
            } in &vendor.routes
            {
                routes.push((local_prefix.clone(), upstream_origin.clone(), idx));
            }
        }
        routes.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { vendors, routes }
    }

    /// Check structural invariants: unique prefixes, absolute https origins,
    /// and a matching route under every rewrite target. Returns every
    /// violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mut seen = std::collections::HashSet::new();
        for (prefix, origin, _) in &self.routes {
            if !seen.insert(prefix.as_str()) {
                errors.push(format!("duplicate local prefix {prefix}"));
            }
            if !origin.starts_with("https://") {
                errors.push(format!("upstream origin {origin} is not absolute https"));
            }
        }

        for vendor in &self.vendors {
            for rule in &vendor.rewrite {
                let covered = self
                    .routes
                    .iter()
                    .any(|(prefix, _, _)| prefix_matches(&rule.to, prefix));
                if !covered {
                    errors.push(format!(
                        "vendor {} rewrite target {} has no matching route",
                        vendor.vendor, rule.to
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Look up a vendor config by key.
    pub fn get_config(&self, vendor_key: &str) -> Option<&VendorProxyConfig> {
        self.vendors.iter().find(|v| v.vendor == vendor_key)
    }

    /// All vendor configs.
    pub fn all_configs(&self) -> impl Iterator<Item = &VendorProxyConfig> {
        self.vendors.iter()
    }

    /// Longest-prefix route match for a request path.
    pub fn match_route(&self, path: &str) -> Option<RouteMatch<'_>> {
        for (prefix, origin, idx) in &self.routes {
            if prefix_matches(path, prefix) {
                return Some(RouteMatch {
                    vendor_key: &self.vendors[*idx].vendor,
                    local_prefix: prefix,
                    upstream_origin: origin,
                });
            }
        }
        None
    }

    /// Derive client-side intercept rules from the rewrite table.
    pub fn intercept_rules(&self) -> Vec<InterceptRule> {
        let mut rules = Vec::new();
        for vendor in &self.vendors {
            for rule in &vendor.rewrite {
                let (domain, path) = match rule.from.find('/') {
                    Some(idx) => (&rule.from[..idx], &rule.from[idx..]),
                    None => (rule.from.as_str(), "/"),
                };
                rules.push(InterceptRule {
                    domain_pattern: domain.to_string(),
                    path_prefix: path.to_string(),
                    target: rule.to.clone(),
                });
            }
        }
        rules
    }
}

/// Prefix match on a path segment boundary: `/ga` matches `/ga` and
/// `/ga/collect` but never `/ga-legacy/collect`.
fn prefix_matches(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}
