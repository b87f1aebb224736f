//! Literal-scan script rewriter.
//!
//! # Responsibilities
//! - Find string and template literals in vendor JavaScript with a regex scan
//! - Rewrite literal contents that match a rewrite rule
//!
//! # Design Decisions
//! - No syntax awareness: every literal is a candidate, including object keys.
//!   The syntax-aware strategy exists for scripts where that matters
//! - The output of a matched literal stays a plain literal; this strategy
//!   never splices expressions into the script

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rewrite::rules::{rewrite_url_literal, RewriteRule};
use crate::rewrite::{ga_dynamic_pass, ScriptRewriter};

/// Double/single-quoted strings and template literals without `${`
/// substitutions. Escapes are consumed so a quote inside a literal does not
/// terminate the match early.
static LITERALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        "(?:[^"\\]|\\.)*"
        | '(?:[^'\\]|\\.)*'
        | `(?:[^`\\$]|\\.|\$[^{`])*\$?`
        "#,
    )
    .expect("valid literal regex")
});

/// Rewriter that scans for quoted literals without parsing the script.
#[derive(Debug, Default)]
pub struct LiteralScanRewriter;

impl ScriptRewriter for LiteralScanRewriter {
    fn rewrite(&self, script: &str, rules: &[RewriteRule]) -> String {
        if rules.is_empty() {
            return script.to_string();
        }
        let rewritten = LITERALS.replace_all(script, |caps: &Captures<'_>| {
            let literal = &caps[0];
            let quote = &literal[..1];
            let inner = &literal[1..literal.len() - 1];
            match rewrite_url_literal(inner, rules) {
                Some(target) => format!("{quote}{target}{quote}"),
                None => literal.to_string(),
            }
        });
        let rewritten = match rewritten {
            Cow::Borrowed(s) => s.to_string(),
            Cow::Owned(s) => s,
        };
        ga_dynamic_pass(&rewritten, rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<RewriteRule> {
        vec![
            RewriteRule::new("www.google-analytics.com", "/_scripts/c/ga"),
            RewriteRule::new(".google-analytics.com", "/_scripts/c/ga"),
        ]
    }

    #[test]
    fn test_double_and_single_quoted_literals() {
        let script = r#"var a = "https://www.google-analytics.com/g/collect";
var b = 'https://www.google-analytics.com/analytics.js';"#;
        let out = LiteralScanRewriter.rewrite(script, &rules());
        assert!(out.contains(r#"var a = "/_scripts/c/ga/g/collect";"#));
        assert!(out.contains("var b = '/_scripts/c/ga/analytics.js';"));
    }

    #[test]
    fn test_template_literal_without_substitution() {
        let script = "fetch(`https://www.google-analytics.com/g/collect`)";
        let out = LiteralScanRewriter.rewrite(script, &rules());
        assert!(out.contains("`/_scripts/c/ga/g/collect`"));
    }

    #[test]
    fn test_template_literal_with_substitution_untouched() {
        let script = "fetch(`https://${host}.google-analytics.com/g/collect`)";
        let out = LiteralScanRewriter.rewrite(script, &rules());
        assert_eq!(out, script);
    }

    #[test]
    fn test_empty_rules_is_identity() {
        let script = r#"var a = "https://www.google-analytics.com/g/collect";"#;
        assert_eq!(LiteralScanRewriter.rewrite(script, &[]), script);
    }

    #[test]
    fn test_unmatched_literals_byte_identical() {
        let script = r#"var a = "https://example.org/x"; var b = 'plain text';"#;
        assert_eq!(LiteralScanRewriter.rewrite(script, &rules()), script);
    }

    #[test]
    fn test_idempotent() {
        let script = r#"navigator.sendBeacon("https://www.google-analytics.com/g/collect", data);"#;
        let once = LiteralScanRewriter.rewrite(script, &rules());
        let twice = LiteralScanRewriter.rewrite(&once, &rules());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_escaped_quote_inside_literal() {
        let script = r#"var s = "say \"hi\""; var u = "https://www.google-analytics.com/x";"#;
        let out = LiteralScanRewriter.rewrite(script, &rules());
        assert!(out.contains(r#"var s = "say \"hi\"";"#));
        assert!(out.contains(r#"var u = "/_scripts/c/ga/x";"#));
    }
}
