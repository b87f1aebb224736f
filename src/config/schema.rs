//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::privacy::PrivacySetting;
use crate::rewrite::RewriterKind;

/// Root configuration for the collection proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Proxy engine settings.
    pub proxy: ProxySettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 1024 * 1024,
        }
    }
}

/// Proxy engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Local path prefix all vendor routes live under.
    pub collect_prefix: String,

    /// Upstream fetch timeout in seconds.
    pub upstream_timeout_secs: u64,

    /// TTL for cached rewritten scripts, in seconds.
    pub rewrite_cache_ttl_secs: u64,

    /// Script rewriting strategy.
    pub rewriter: RewriterKind,

    /// Optional global privacy override, merged on top of vendor defaults.
    pub privacy_override: Option<PrivacySetting>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            collect_prefix: "/_scripts/c".to_string(),
            upstream_timeout_secs: 15,
            rewrite_cache_ttl_secs: 300,
            rewriter: RewriterKind::default(),
            privacy_override: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
