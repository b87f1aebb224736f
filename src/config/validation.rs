//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, prefix shape)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::ProxyConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(err("listener.bind_address", "not a valid socket address"));
    }
    if config.listener.max_body_size == 0 {
        errors.push(err("listener.max_body_size", "must be greater than zero"));
    }

    let prefix = &config.proxy.collect_prefix;
    if !prefix.starts_with('/') {
        errors.push(err("proxy.collect_prefix", "must start with '/'"));
    }
    if prefix.len() > 1 && prefix.ends_with('/') {
        errors.push(err("proxy.collect_prefix", "must not end with '/'"));
    }
    if config.proxy.upstream_timeout_secs == 0 {
        errors.push(err("proxy.upstream_timeout_secs", "must be greater than zero"));
    }
    if config.proxy.rewrite_cache_ttl_secs == 0 {
        errors.push(err("proxy.rewrite_cache_ttl_secs", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(err("observability.metrics_address", "not a valid socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
