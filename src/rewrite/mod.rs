//! Script URL rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! vendor JS response body + per-vendor RewriteRule[]
//!     → ScriptRewriter strategy (literal scan or syntax-aware scan)
//!     → rules.rs (per-literal URL matching and target join)
//!     → GA dynamic-idiom pass (string concatenation the scanners cannot see)
//!     → rewritten script, cached by the proxy core
//! ```
//!
//! # Design Decisions
//! - Two strategies behind one trait; the round-trip and idempotence laws in
//!   the integration suite pin their behavioral equivalence
//! - Rewriting never fails: worst case the script comes back unchanged
//! - Strategies are pure functions of (script, rules); safe to run in
//!   parallel and to cache by input hash

pub mod literal;
pub mod rules;
pub mod syntax;

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

pub use literal::LiteralScanRewriter;
pub use rules::{rewrite_url_literal, RewriteRule};
pub use syntax::SyntaxRewriter;

/// Common contract for both rewriting strategies.
///
/// Laws: `rewrite(s, &[]) == s`; unmatched literals are byte-identical in the
/// output; `rewrite(rewrite(s, r), r) == rewrite(s, r)`.
pub trait ScriptRewriter: Send + Sync {
    fn rewrite(&self, script: &str, rules: &[RewriteRule]) -> String;
}

/// Which strategy the proxy uses, selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriterKind {
    /// Regex scan over string/template literals.
    Literal,
    /// Syntax-aware scan with position filtering and call-site hooks.
    #[default]
    Syntax,
}

impl RewriterKind {
    pub fn build(self) -> Box<dyn ScriptRewriter> {
        match self {
            RewriterKind::Literal => Box::new(LiteralScanRewriter),
            RewriterKind::Syntax => Box::new(SyntaxRewriter),
        }
    }
}

/// GA builds its collection URL as `"https://"+(expr)+".google-analytics.com
/// /g/collect"`, which no literal-level scan can match. This regex finds the
/// concatenation and collapses it to the mapped local path.
static GA_DYNAMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""https://"\s*\+\s*(?:\([^)]*\)|[A-Za-z_$][\w$]*(?:\.[\w$]+)*)\s*\+\s*"\.(google-analytics\.com|analytics\.google\.com)(/g/collect)""#,
    )
    .expect("valid GA dynamic regex")
});

/// Collapse the known GA dynamic-URL idiom when a rule covers the GA hosts.
/// Scripts without the idiom, and rule sets without a GA mapping, pass
/// through unchanged.
pub(crate) fn ga_dynamic_pass(script: &str, rules: &[RewriteRule]) -> String {
    if !script.contains("google-analytics.com") && !script.contains("analytics.google.com") {
        return script.to_string();
    }
    GA_DYNAMIC
        .replace_all(script, |caps: &Captures<'_>| {
            let synthetic = format!("https://region1.{}{}", &caps[1], &caps[2]);
            match rewrite_url_literal(&synthetic, rules) {
                Some(target) => format!("\"{target}\""),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<RewriteRule> {
        vec![RewriteRule::new(".google-analytics.com", "/_scripts/c/ga")]
    }

    #[test]
    fn test_ga_dynamic_pass_parenthesized_expr() {
        let script = r#"var u="https://"+(r||"www")+".google-analytics.com/g/collect";"#;
        let out = ga_dynamic_pass(script, &rules());
        assert_eq!(out, r#"var u="/_scripts/c/ga/g/collect";"#);
    }

    #[test]
    fn test_ga_dynamic_pass_identifier_expr() {
        let script = r#"send("https://" + region + ".google-analytics.com/g/collect");"#;
        let out = ga_dynamic_pass(script, &rules());
        assert_eq!(out, r#"send("/_scripts/c/ga/g/collect");"#);
    }

    #[test]
    fn test_ga_dynamic_pass_analytics_google_variant() {
        let script = r#"var u="https://"+(h)+".analytics.google.com/g/collect";"#;
        let rules = vec![RewriteRule::new(".analytics.google.com", "/_scripts/c/ga")];
        assert_eq!(
            ga_dynamic_pass(script, &rules),
            r#"var u="/_scripts/c/ga/g/collect";"#
        );
    }

    #[test]
    fn test_ga_dynamic_pass_without_matching_rule() {
        let script = r#"var u="https://"+(r)+".google-analytics.com/g/collect";"#;
        let rules = vec![RewriteRule::new("www.example.com", "/_scripts/c/x")];
        assert_eq!(ga_dynamic_pass(script, &rules), script);
    }

    #[test]
    fn test_strategies_agree_on_target_path() {
        let script = r#"var u = "https://region1.google-analytics.com/g/collect";"#;
        let literal = LiteralScanRewriter.rewrite(script, &rules());
        let syntax = SyntaxRewriter.rewrite(script, &rules());
        assert!(literal.contains("/_scripts/c/ga/g/collect"));
        assert!(syntax.contains("/_scripts/c/ga/g/collect"));
        // Only the syntax strategy prefixes the runtime origin.
        assert!(!literal.contains("globalThis.location.origin"));
        assert!(syntax.contains("globalThis.location.origin"));
    }
}
