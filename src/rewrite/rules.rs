//! Rewrite rules and URL-literal matching.
//!
//! # Responsibilities
//! - Represent per-vendor rewrite rules (host or host+path → local path)
//! - Match candidate URL literals found in vendor scripts
//! - Produce the rewritten local target, preserving the path remainder
//!
//! # Design Decisions
//! - Manual string parsing instead of full URL parsing: a matched literal must
//!   be rewritten without any normalization of its path, query or escapes, and
//!   an unmatched literal must come back byte-identical
//! - Rules are ordered; the first matching rule wins

use serde::{Deserialize, Serialize};

/// A single rewrite rule. `from` is a host (`www.example.com`), a
/// suffix-matched host (`.example.com`), or a host plus path prefix
/// (`www.example.com/tr`). `to` is the local proxy path the match maps to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
}

impl RewriteRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// The host and remainder of a parsed candidate literal.
struct Candidate<'a> {
    host: &'a str,
    /// Path + query + fragment, beginning with `/`, `?` or `#`; may be empty.
    rest: &'a str,
}

/// Parse a literal as an absolute URL, a protocol-relative URL, or a bare
/// host+path. Returns `None` for anything that cannot be a collection URL.
fn parse_candidate(literal: &str) -> Option<Candidate<'_>> {
    let after_scheme = if let Some(rest) = literal.strip_prefix("https://") {
        rest
    } else if let Some(rest) = literal.strip_prefix("http://") {
        rest
    } else if let Some(rest) = literal.strip_prefix("//") {
        rest
    } else {
        literal
    };

    let split = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    let (host, rest) = after_scheme.split_at(split);

    if host.is_empty() || !host.contains('.') || host.starts_with('.') || host.ends_with('.') {
        return None;
    }
    // Hosts never contain whitespace or quoting characters; anything else in
    // the literal means it was not a URL to begin with.
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'))
    {
        return None;
    }
    Some(Candidate { host, rest })
}

/// Host portion of a rule `from`, before any path component.
fn rule_parts(from: &str) -> (&str, Option<&str>) {
    match from.find('/') {
        Some(idx) => (&from[..idx], Some(&from[idx..])),
        None => (from, None),
    }
}

fn host_matches(host: &str, pattern: &str) -> bool {
    if let Some(bare) = pattern.strip_prefix('.') {
        host == bare || host.ends_with(pattern)
    } else {
        host.eq_ignore_ascii_case(pattern)
    }
}

/// Join a local target path with the remainder of a matched literal, avoiding
/// a spurious separator when the remainder is empty or starts the query or
/// fragment.
fn join_target(to: &str, remainder: &str) -> String {
    if remainder.is_empty() || remainder.starts_with('?') || remainder.starts_with('#') {
        format!("{to}{remainder}")
    } else if remainder.starts_with('/') {
        format!("{}{}", to.trim_end_matches('/'), remainder)
    } else {
        format!("{}/{}", to.trim_end_matches('/'), remainder)
    }
}

/// Try to rewrite a single URL literal against an ordered rule set. Returns
/// `None` when no rule matches; the caller must leave the literal untouched.
pub fn rewrite_url_literal(literal: &str, rules: &[RewriteRule]) -> Option<String> {
    let candidate = parse_candidate(literal)?;
    for rule in rules {
        let (host_pat, path_pat) = rule_parts(&rule.from);
        if !host_matches(candidate.host, host_pat) {
            continue;
        }
        let remainder = match path_pat {
            Some(prefix) => match candidate.rest.strip_prefix(prefix) {
                Some(rest) => rest,
                None => continue,
            },
            None => candidate.rest,
        };
        return Some(join_target(&rule.to, remainder));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ga_rules() -> Vec<RewriteRule> {
        vec![
            RewriteRule::new("www.google-analytics.com", "/_scripts/c/ga"),
            RewriteRule::new(".google-analytics.com", "/_scripts/c/ga"),
        ]
    }

    #[test]
    fn test_absolute_url_rewritten() {
        let out = rewrite_url_literal("https://www.google-analytics.com/g/collect", &ga_rules());
        assert_eq!(out.as_deref(), Some("/_scripts/c/ga/g/collect"));
    }

    #[test]
    fn test_protocol_relative_rewritten() {
        let out = rewrite_url_literal("//www.google-analytics.com/analytics.js", &ga_rules());
        assert_eq!(out.as_deref(), Some("/_scripts/c/ga/analytics.js"));
    }

    #[test]
    fn test_bare_host_rewritten() {
        let out = rewrite_url_literal("www.google-analytics.com/g/collect", &ga_rules());
        assert_eq!(out.as_deref(), Some("/_scripts/c/ga/g/collect"));
    }

    #[test]
    fn test_suffix_rule_matches_subdomains() {
        let out = rewrite_url_literal("https://region1.google-analytics.com/g/collect", &ga_rules());
        assert_eq!(out.as_deref(), Some("/_scripts/c/ga/g/collect"));
    }

    #[test]
    fn test_query_only_remainder_has_no_spurious_separator() {
        let rules = vec![RewriteRule::new("www.example.com/pixel", "/_scripts/c/px")];
        let out = rewrite_url_literal("https://www.example.com/pixel?id=1", &rules);
        assert_eq!(out.as_deref(), Some("/_scripts/c/px?id=1"));
    }

    #[test]
    fn test_empty_remainder() {
        let out = rewrite_url_literal("https://www.google-analytics.com", &ga_rules());
        assert_eq!(out.as_deref(), Some("/_scripts/c/ga"));
    }

    #[test]
    fn test_path_prefix_rule_strips_matched_prefix() {
        let rules = vec![RewriteRule::new(
            "www.facebook.com/tr",
            "/_scripts/c/meta/tr",
        )];
        let out = rewrite_url_literal("https://www.facebook.com/tr?id=123&ev=PageView", &rules);
        assert_eq!(out.as_deref(), Some("/_scripts/c/meta/tr?id=123&ev=PageView"));
    }

    #[test]
    fn test_path_prefix_rule_requires_prefix() {
        let rules = vec![RewriteRule::new(
            "www.facebook.com/tr",
            "/_scripts/c/meta/tr",
        )];
        assert_eq!(
            rewrite_url_literal("https://www.facebook.com/other", &rules),
            None
        );
    }

    #[test]
    fn test_unrelated_host_unmatched() {
        assert_eq!(
            rewrite_url_literal("https://example.org/g/collect", &ga_rules()),
            None
        );
    }

    #[test]
    fn test_non_url_literals_unmatched() {
        for literal in ["hello world", "/local/path", "g/collect", "", "a+b"] {
            assert_eq!(rewrite_url_literal(literal, &ga_rules()), None, "{literal}");
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            RewriteRule::new(".google-analytics.com", "/_scripts/c/first"),
            RewriteRule::new("www.google-analytics.com", "/_scripts/c/second"),
        ];
        let out = rewrite_url_literal("https://www.google-analytics.com/x", &rules);
        assert_eq!(out.as_deref(), Some("/_scripts/c/first/x"));
    }
}
