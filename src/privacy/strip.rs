//! Payload fingerprint stripping.
//!
//! # Responsibilities
//! - Sanitize query-string pairs and structured (JSON/form) bodies
//! - Apply the catalog categories under the active policy
//! - Recurse through nested objects and arrays without mutating the input
//!
//! # Design Decisions
//! - Pure functions: callers keep the original payload for diagnostics
//! - Normalize-only categories (language, user agent) rewrite unconditionally;
//!   everything else is gated by its policy flag
//! - `UserId`/`UserData` keys pass through byte-identical under any policy

use serde_json::Value;

use crate::privacy::catalog::{self, ParamCategory};
use crate::privacy::normalize;
use crate::privacy::policy::PrivacyPolicy;

/// What to do with a single key/value, decided from category + policy.
enum Action {
    Keep,
    Drop,
    RewriteString(fn(&str) -> String),
}

fn action_for(key: &str, policy: &PrivacyPolicy) -> Action {
    let Some(category) = catalog::lookup(key) else {
        return Action::Keep;
    };
    if category.preserved() {
        return Action::Keep;
    }
    match category {
        ParamCategory::Language => Action::RewriteString(normalize::normalize_language),
        ParamCategory::UserAgent => Action::RewriteString(normalize::normalize_user_agent),
        ParamCategory::Ip if policy.ip => Action::RewriteString(normalize::anonymize_ip),
        ParamCategory::Screen if policy.screen => {
            Action::RewriteString(normalize::generalize_screen)
        }
        ParamCategory::Platform
        | ParamCategory::BrowserFingerprint
        | ParamCategory::CanvasWebgl
        | ParamCategory::DeviceInfo
            if policy.hardware =>
        {
            Action::Drop
        }
        ParamCategory::LocationTimezone if policy.timezone => Action::Drop,
        _ => Action::Keep,
    }
}

/// Sanitize a structured payload. Returns a new value; the input is untouched.
pub fn strip_value(payload: &Value, policy: &PrivacyPolicy) -> Value {
    match payload {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                match action_for(key, policy) {
                    Action::Drop => continue,
                    Action::RewriteString(f) => {
                        if let Value::String(s) = value {
                            out.insert(key.clone(), Value::String(f(s)));
                        } else {
                            out.insert(key.clone(), strip_value(value, policy));
                        }
                    }
                    Action::Keep => {
                        out.insert(key.clone(), strip_value(value, policy));
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| strip_value(v, policy)).collect())
        }
        other => other.clone(),
    }
}

/// Sanitize query or form pairs with the same per-key rules as [`strip_value`].
pub fn strip_pairs(pairs: &[(String, String)], policy: &PrivacyPolicy) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        match action_for(key, policy) {
            Action::Drop => continue,
            Action::RewriteString(f) => out.push((key.clone(), f(value))),
            Action::Keep => out.push((key.clone(), value.clone())),
        }
    }
    out
}
