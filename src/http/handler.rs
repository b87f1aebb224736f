//! Proxy request handling.
//!
//! # Responsibilities
//! - Match the request to a vendor route and resolve the effective policy
//! - Sanitize query, headers and body before anything leaves the origin
//! - Forward upstream with a bounded timeout
//! - Rewrite and cache textual JavaScript responses
//! - Relay a sanitized response; swallow beacon failures
//!
//! # Design Decisions
//! - Each request is handled independently; the only shared mutable state is
//!   the rewrite cache, whose writes are idempotent
//! - Fire-and-forget analytics paths degrade to 204 on upstream failure so
//!   the page never observes a transient vendor outage
//! - Upstream error details are logged, never relayed

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use url::form_urlencoded;
use uuid::Uuid;

use crate::cache::{rewrite_cache_key, ScriptCache};
use crate::config::schema::ProxySettings;
use crate::error::ProxyError;
use crate::http::diagnostics::{DiagnosticsSink, ProxyDiagnostic};
use crate::http::headers::{header_pairs, sanitize_request_headers, sanitize_response_headers};
use crate::observability::metrics;
use crate::privacy::{strip, PrivacyPolicy};
use crate::registry::VendorRegistry;
use crate::rewrite::{RewriteRule, ScriptRewriter};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<VendorRegistry>,
    pub client: reqwest::Client,
    pub cache: Arc<dyn ScriptCache>,
    pub rewriter: Arc<dyn ScriptRewriter>,
    pub settings: ProxySettings,
    pub max_body_size: usize,
    pub diagnostics: DiagnosticsSink,
}

/// Path substrings recognized as fire-and-forget collection endpoints.
/// Failures on these paths are swallowed as 204; extend deliberately.
const FIRE_AND_FORGET: &[&str] = &["/collect", "/tr", "/events"];

fn is_fire_and_forget(path: &str) -> bool {
    FIRE_AND_FORGET.iter().any(|p| path.contains(p))
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Decode, sanitize and re-encode a request body in its original family.
/// JSON first, then single-line form data; anything else is opaque and
/// passes through untouched.
fn sanitize_body(bytes: &[u8], policy: &PrivacyPolicy) -> (Vec<u8>, bool) {
    if bytes.is_empty() {
        return (Vec::new(), false);
    }
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
        if value.is_object() || value.is_array() {
            let stripped = strip::strip_value(&value, policy);
            if let Ok(encoded) = serde_json::to_vec(&stripped) {
                return (encoded, true);
            }
        }
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        if looks_like_form(text) {
            let pairs = parse_query(text);
            let stripped = strip::strip_pairs(&pairs, policy);
            return (encode_pairs(&stripped).into_bytes(), true);
        }
    }
    (bytes.to_vec(), false)
}

fn looks_like_form(text: &str) -> bool {
    text.contains('=') && !text.contains(char::is_whitespace)
}

/// Terminal response for an upstream failure, per path class.
fn upstream_failure(vendor: &str, path: &str, timed_out: bool, timeout_secs: u64) -> Response {
    if is_fire_and_forget(path) {
        tracing::debug!(vendor, path, timed_out, "swallowing beacon failure");
        return StatusCode::NO_CONTENT.into_response();
    }
    let error = if timed_out {
        ProxyError::UpstreamTimeout(timeout_secs)
    } else {
        ProxyError::Upstream(format!("vendor {vendor} unreachable"))
    };
    error.into_response()
}

fn relay_response(status: StatusCode, headers: axum::http::HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Main proxy handler: sanitize, forward, rewrite, relay.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    // 1. Route match, longest prefix first.
    let Some(route) = state.registry.match_route(&path) else {
        tracing::debug!(path = %path, "no collection route matched");
        metrics::record_request("none", 404, start);
        return ProxyError::RouteMiss(path).into_response();
    };
    let local_prefix = route.local_prefix.to_string();
    let upstream_origin = route.upstream_origin.to_string();
    let vendor_key = route.vendor_key.to_string();

    let Some(vendor) = state.registry.get_config(&vendor_key) else {
        tracing::error!(vendor = %vendor_key, "route matched but vendor config is missing");
        metrics::record_request(&vendor_key, 500, start);
        return ProxyError::MissingConfig(vendor_key).into_response();
    };

    // 2. Effective policy; a missing vendor entry fails closed inside.
    let policy = PrivacyPolicy::effective(
        &vendor_key,
        vendor.privacy_defaults.as_ref(),
        state.settings.privacy_override.as_ref(),
    );

    // 3. Upstream target with sanitized query.
    let suffix = path[local_prefix.len()..].to_string();
    let mut target = format!("{upstream_origin}{suffix}");
    let original_query = parts.uri.query().map(parse_query).unwrap_or_default();
    let sanitized_query = if policy.any() {
        strip::strip_pairs(&original_query, &policy)
    } else {
        original_query.clone()
    };
    if let Some(raw) = parts.uri.query() {
        if policy.any() {
            let encoded = encode_pairs(&sanitized_query);
            if !encoded.is_empty() {
                target.push('?');
                target.push_str(&encoded);
            }
        } else {
            target.push('?');
            target.push_str(raw);
        }
    }

    // 4. Request headers, with before/after snapshots for diagnostics.
    let original_headers = header_pairs(&parts.headers);
    let (out_headers, touched_headers) = sanitize_request_headers(&parts.headers, &policy);
    let sanitized_headers = header_pairs(&out_headers);

    // 5. Request body.
    let method = parts.method.clone();
    let forwards_body = matches!(method, Method::POST | Method::PUT | Method::PATCH);
    let (out_body, original_body, sanitized_body) = if forwards_body {
        match axum::body::to_bytes(body, state.max_body_size).await {
            Ok(bytes) => {
                let original = bytes.to_vec();
                if policy.any() {
                    let (out, changed) = sanitize_body(&original, &policy);
                    let snapshot = changed.then(|| out.clone());
                    (out, Some(original), snapshot)
                } else {
                    (original.clone(), Some(original), None)
                }
            }
            Err(e) => {
                tracing::debug!(vendor = %vendor_key, error = %e, "request body unreadable, forwarding empty");
                (Vec::new(), None, None)
            }
        }
    } else {
        (Vec::new(), None, None)
    };

    // 6. Upstream fetch with a bounded, abortable timeout.
    let timeout = Duration::from_secs(state.settings.upstream_timeout_secs);
    let mut upstream = state
        .client
        .request(method, target.as_str())
        .headers(out_headers)
        .timeout(timeout);
    if forwards_body {
        upstream = upstream.body(out_body);
    }

    let response = match upstream.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(vendor = %vendor_key, target = %target, error = %e, "upstream request failed");
            let failure = upstream_failure(&vendor_key, &suffix, e.is_timeout(), state.settings.upstream_timeout_secs);
            let status = failure.status().as_u16();
            metrics::record_request(&vendor_key, status, start);
            state.diagnostics.emit(ProxyDiagnostic {
                id: Uuid::new_v4(),
                vendor: vendor_key.clone(),
                target_url: target.clone(),
                original_query,
                sanitized_query,
                original_headers,
                sanitized_headers,
                touched_headers,
                original_body,
                sanitized_body,
                status,
            });
            return failure;
        }
    };

    // 7. Relay with response-header sanitization.
    let status = response.status();
    let resp_headers = sanitize_response_headers(response.headers());
    let content_type = resp_headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    let is_js = content_type.contains("javascript") || content_type.contains("ecmascript");

    metrics::record_request(&vendor_key, status.as_u16(), start);
    state.diagnostics.emit(ProxyDiagnostic {
        id: Uuid::new_v4(),
        vendor: vendor_key.clone(),
        target_url: target.clone(),
        original_query,
        sanitized_query,
        original_headers,
        sanitized_headers,
        touched_headers,
        original_body,
        sanitized_body,
        status: status.as_u16(),
    });

    // 8. Rewrite and cache textual JavaScript.
    if is_js && !vendor.rewrite.is_empty() {
        return match response.text().await {
            Ok(text) => {
                let rewritten =
                    rewrite_with_cache(&state, &vendor_key, &target, &vendor.rewrite, text);
                let mut headers = resp_headers;
                let ttl = state.settings.rewrite_cache_ttl_secs;
                if let Ok(value) = HeaderValue::try_from(format!(
                    "public, max-age={ttl}, stale-while-revalidate={ttl}"
                )) {
                    headers.insert(CACHE_CONTROL, value);
                }
                relay_response(status, headers, Body::from(rewritten))
            }
            Err(e) => {
                tracing::warn!(vendor = %vendor_key, error = %e, "upstream body unreadable");
                upstream_failure(&vendor_key, &suffix, e.is_timeout(), state.settings.upstream_timeout_secs)
            }
        };
    }

    match response.bytes().await {
        Ok(bytes) => relay_response(status, resp_headers, Body::from(bytes)),
        Err(e) => {
            tracing::warn!(vendor = %vendor_key, error = %e, "upstream body unreadable");
            upstream_failure(&vendor_key, &suffix, e.is_timeout(), state.settings.upstream_timeout_secs)
        }
    }
}

/// Rewrite a script, consulting the TTL cache first. Writes are idempotent,
/// so a concurrent miss on the same key is harmless.
fn rewrite_with_cache(
    state: &AppState,
    vendor_key: &str,
    target: &str,
    rules: &[RewriteRule],
    script: String,
) -> String {
    let key = rewrite_cache_key(target, rules);
    if let Some(hit) = state.cache.get(&key) {
        metrics::record_cache_hit();
        return hit;
    }
    let rewritten = state.rewriter.rewrite(&script, rules);
    metrics::record_rewrite(vendor_key);
    state.cache.set(
        &key,
        rewritten.clone(),
        Duration::from_secs(state.settings.rewrite_cache_ttl_secs),
    );
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_and_forget_paths() {
        assert!(is_fire_and_forget("/g/collect"));
        assert!(is_fire_and_forget("/tr?id=1"));
        assert!(is_fire_and_forget("/api/events"));
        assert!(!is_fire_and_forget("/gtag/js"));
    }

    #[test]
    fn test_sanitize_body_json() {
        let policy = PrivacyPolicy {
            ip: true,
            ..Default::default()
        };
        let (out, sanitized) = sanitize_body(br#"{"uip":"203.0.113.9","dt":"Title"}"#, &policy);
        assert!(sanitized);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["uip"], "203.0.113.0");
        assert_eq!(value["dt"], "Title");
    }

    #[test]
    fn test_sanitize_body_form() {
        let policy = PrivacyPolicy::STRICT;
        let (out, sanitized) = sanitize_body(b"uip=203.0.113.9&tz=UTC&cid=1.2", &policy);
        assert!(sanitized);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("uip=203.0.113.0"));
        assert!(!text.contains("tz="));
        assert!(text.contains("cid=1.2"));
    }

    #[test]
    fn test_sanitize_body_opaque_passthrough() {
        let policy = PrivacyPolicy::STRICT;
        let blob = b"\x00\x01binary blob";
        let (out, sanitized) = sanitize_body(blob, &policy);
        assert!(!sanitized);
        assert_eq!(out, blob);
    }

    #[test]
    fn test_encode_pairs_roundtrip() {
        let pairs = vec![
            ("a b".to_string(), "c&d".to_string()),
            ("x".to_string(), "1".to_string()),
        ];
        let encoded = encode_pairs(&pairs);
        assert_eq!(parse_query(&encoded), pairs);
    }
}
