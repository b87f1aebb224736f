//! Request and response header sanitization.
//!
//! # Responsibilities
//! - Drop credential and CSRF headers before anything reaches upstream
//! - Anonymize/normalize IP, UA and Accept-Language headers per policy
//! - Drop client-hint headers under their governing flags
//! - Strip cookie-setting and framing headers from upstream responses
//!
//! # Design Decisions
//! - Deny-list for credentials is unconditional; policy flags only govern
//!   fingerprint headers
//! - Hop-by-hop and framing headers are dropped because the proxy re-frames
//!   the body (and may rewrite it)
//! - Everything not named here is forwarded unmodified

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::privacy::normalize;
use crate::privacy::PrivacyPolicy;

/// Headers that never reach upstream, regardless of policy.
const SENSITIVE: &[&str] = &[
    "cookie",
    "authorization",
    "proxy-authorization",
    "csrf-token",
    "x-csrf-token",
    "www-authenticate",
];

/// Hop-by-hop and framing headers the proxy owns itself.
const HOP_BY_HOP: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "expect",
    "content-length",
    // Dropped so upstream responds identity-encoded and the body stays
    // rewritable.
    "accept-encoding",
];

/// Headers carrying the client IP; anonymized under `policy.ip`, except
/// `forwarded`, whose structured syntax is dropped outright.
const IP_HEADERS: &[&str] = &[
    "x-forwarded-for",
    "x-real-ip",
    "x-client-ip",
    "cf-connecting-ip",
    "true-client-ip",
];

/// Client hints describing the browser build; governed by `user_agent`.
const UA_HINTS: &[&str] = &[
    "sec-ch-ua",
    "sec-ch-ua-mobile",
    "sec-ch-ua-full-version",
    "sec-ch-ua-full-version-list",
];

/// Client hints describing hardware and platform; governed by `hardware`.
const HARDWARE_HINTS: &[&str] = &[
    "sec-ch-ua-platform",
    "sec-ch-ua-platform-version",
    "sec-ch-ua-arch",
    "sec-ch-ua-model",
    "sec-ch-ua-bitness",
    "sec-ch-device-memory",
    "device-memory",
];

/// Client hints describing the viewport; governed by `screen`.
const SCREEN_HINTS: &[&str] = &["sec-ch-viewport-width", "sec-ch-viewport-height", "viewport-width", "dpr", "sec-ch-dpr"];

/// Response headers the proxy never relays back to the page.
const RESPONSE_DROPS: &[&str] = &[
    "set-cookie",
    "transfer-encoding",
    "content-encoding",
    "content-length",
];

fn in_list(name: &HeaderName, list: &[&str]) -> bool {
    list.iter().any(|h| name.as_str() == *h)
}

/// Anonymize a comma-separated IP list header value.
fn anonymize_ip_list(value: &str) -> String {
    value
        .split(',')
        .map(|part| normalize::anonymize_ip(part.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sanitize inbound request headers for forwarding. Returns the forwardable
/// map plus the names that were dropped or transformed, for diagnostics.
pub fn sanitize_request_headers(
    headers: &HeaderMap,
    policy: &PrivacyPolicy,
) -> (HeaderMap, Vec<String>) {
    let mut out = HeaderMap::with_capacity(headers.len());
    let mut touched = Vec::new();

    for (name, value) in headers {
        if in_list(name, SENSITIVE) || in_list(name, HOP_BY_HOP) {
            touched.push(name.to_string());
            continue;
        }

        if policy.ip && (in_list(name, IP_HEADERS) || name.as_str() == "forwarded") {
            touched.push(name.to_string());
            if name.as_str() == "forwarded" {
                continue;
            }
            if let Ok(text) = value.to_str() {
                if let Ok(v) = HeaderValue::from_str(&anonymize_ip_list(text)) {
                    out.insert(name.clone(), v);
                }
            }
            continue;
        }

        if policy.user_agent {
            if name.as_str() == "user-agent" {
                touched.push(name.to_string());
                let normalized = value
                    .to_str()
                    .map(normalize::normalize_user_agent)
                    .unwrap_or_else(|_| normalize::normalize_user_agent(""));
                if let Ok(v) = HeaderValue::from_str(&normalized) {
                    out.insert(name.clone(), v);
                }
                continue;
            }
            if in_list(name, UA_HINTS) {
                touched.push(name.to_string());
                continue;
            }
        }

        if policy.language && name.as_str() == "accept-language" {
            touched.push(name.to_string());
            if let Ok(text) = value.to_str() {
                if let Ok(v) = HeaderValue::from_str(&normalize::normalize_language(text)) {
                    out.insert(name.clone(), v);
                }
            }
            continue;
        }

        if policy.hardware && in_list(name, HARDWARE_HINTS) {
            touched.push(name.to_string());
            continue;
        }

        if policy.screen && in_list(name, SCREEN_HINTS) {
            touched.push(name.to_string());
            continue;
        }

        out.append(name.clone(), value.clone());
    }

    (out, touched)
}

/// Flatten a header map into name/value pairs for diagnostics snapshots.
/// Values that are not valid UTF-8 are lossily escaped.
pub fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Sanitize upstream response headers before relaying to the page.
pub fn sanitize_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if in_list(name, RESPONSE_DROPS) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_credentials_always_dropped() {
        let input = headers(&[
            ("cookie", "sid=secret"),
            ("authorization", "Bearer tok"),
            ("x-csrf-token", "abc"),
            ("accept", "*/*"),
        ]);
        let (out, touched) = sanitize_request_headers(&input, &PrivacyPolicy::default());
        assert!(out.get(header::COOKIE).is_none());
        assert!(out.get(header::AUTHORIZATION).is_none());
        assert!(out.get("x-csrf-token").is_none());
        assert_eq!(out.get(header::ACCEPT).unwrap(), "*/*");
        assert_eq!(touched.len(), 3);
    }

    #[test]
    fn test_ip_headers_anonymized_when_flag_set() {
        let policy = PrivacyPolicy {
            ip: true,
            ..Default::default()
        };
        let input = headers(&[("x-forwarded-for", "203.0.113.9, 198.51.100.7")]);
        let (out, _) = sanitize_request_headers(&input, &policy);
        assert_eq!(
            out.get("x-forwarded-for").unwrap(),
            "203.0.113.0, 198.51.100.0"
        );
    }

    #[test]
    fn test_ip_headers_untouched_when_flag_unset() {
        let input = headers(&[("x-forwarded-for", "203.0.113.9")]);
        let (out, _) = sanitize_request_headers(&input, &PrivacyPolicy::default());
        assert_eq!(out.get("x-forwarded-for").unwrap(), "203.0.113.9");
    }

    #[test]
    fn test_forwarded_header_dropped_not_rewritten() {
        let policy = PrivacyPolicy {
            ip: true,
            ..Default::default()
        };
        let input = headers(&[("forwarded", "for=203.0.113.9;proto=https")]);
        let (out, _) = sanitize_request_headers(&input, &policy);
        assert!(out.get("forwarded").is_none());
    }

    #[test]
    fn test_user_agent_normalized_and_hints_dropped() {
        let policy = PrivacyPolicy {
            user_agent: true,
            ..Default::default()
        };
        let input = headers(&[
            ("user-agent", "Mozilla/5.0 Chrome/131.0.0.0 Safari/537.36"),
            ("sec-ch-ua", "\"Chromium\";v=\"131\""),
        ]);
        let (out, _) = sanitize_request_headers(&input, &policy);
        assert_eq!(
            out.get(header::USER_AGENT).unwrap(),
            "Mozilla/5.0 (compatible; Chrome/131.0)"
        );
        assert!(out.get("sec-ch-ua").is_none());
    }

    #[test]
    fn test_accept_language_reduced() {
        let policy = PrivacyPolicy {
            language: true,
            ..Default::default()
        };
        let input = headers(&[("accept-language", "en-US,en;q=0.9,fr;q=0.8")]);
        let (out, _) = sanitize_request_headers(&input, &policy);
        assert_eq!(out.get(header::ACCEPT_LANGUAGE).unwrap(), "en");
    }

    #[test]
    fn test_hardware_hints_dropped() {
        let policy = PrivacyPolicy {
            hardware: true,
            ..Default::default()
        };
        let input = headers(&[
            ("sec-ch-ua-platform", "\"Windows\""),
            ("device-memory", "8"),
            ("accept", "*/*"),
        ]);
        let (out, _) = sanitize_request_headers(&input, &policy);
        assert!(out.get("sec-ch-ua-platform").is_none());
        assert!(out.get("device-memory").is_none());
        assert!(out.get(header::ACCEPT).is_some());
    }

    #[test]
    fn test_framing_headers_always_dropped() {
        let input = headers(&[
            ("host", "example.com"),
            ("content-length", "42"),
            ("accept-encoding", "gzip, br"),
        ]);
        let (out, _) = sanitize_request_headers(&input, &PrivacyPolicy::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_header_pairs_flattens_every_entry() {
        let input = headers(&[
            ("cookie", "sid=secret"),
            ("accept", "*/*"),
            ("accept", "text/html"),
        ]);
        let pairs = header_pairs(&input);
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&("cookie".to_string(), "sid=secret".to_string())));
        assert!(pairs.contains(&("accept".to_string(), "text/html".to_string())));
    }

    #[test]
    fn test_response_sanitization() {
        let input = headers(&[
            ("set-cookie", "sid=abc"),
            ("content-encoding", "gzip"),
            ("content-type", "application/javascript"),
            ("x-vendor-trace", "1"),
        ]);
        let out = sanitize_response_headers(&input);
        assert!(out.get(header::SET_COOKIE).is_none());
        assert!(out.get(header::CONTENT_ENCODING).is_none());
        assert_eq!(out.get(header::CONTENT_TYPE).unwrap(), "application/javascript");
        assert_eq!(out.get("x-vendor-trace").unwrap(), "1");
    }
}
