//! Syntax-aware script rewriter.
//!
//! # Responsibilities
//! - Scan vendor JavaScript with enough syntax context to identify string
//!   and single-quasi template literals and their position
//! - Skip literals used as object property keys or `case` tests
//! - Prefix rewritten literals with a runtime origin expression so relative
//!   paths resolve wherever the script executes
//! - Redirect `fetch` and `navigator.sendBeacon` call sites to local wrappers
//!   so dynamically built URLs stay interceptable
//!
//! # Design Decisions
//! - A single forward scan tracking comments, strings and the previous
//!   significant token; no full parse. The two positions that must not be
//!   rewritten (property key, case test) are decidable from one token of
//!   context on each side
//! - Call-site redirection runs inside the same scan, so string and comment
//!   contents are never touched; a bare `fetch` whose argument list is
//!   followed by `{` is a definition (method shorthand, `function fetch`)
//!   and is left alone
//! - Template literals containing `${` substitutions are never candidates
//! - The origin prefix is only emitted here: the literal-scan strategy cannot
//!   splice an expression without syntax context

use crate::rewrite::rules::{rewrite_url_literal, RewriteRule};
use crate::rewrite::{ga_dynamic_pass, ScriptRewriter};

/// Runtime expression prepended to rewritten literals.
const ORIGIN_EXPR: &str = "globalThis.location.origin+";

/// Local wrapper the page installs for intercepted fetch calls.
const FETCH_WRAPPER: &str = "globalThis.__fpFetch";

/// Local wrapper for intercepted sendBeacon calls.
const BEACON_WRAPPER: &str = "globalThis.__fpBeacon";

/// Receivers whose `.fetch` member lookup is redirected along with the
/// receiver itself.
const FETCH_SCOPES: &[&str] = &["window", "self", "globalThis"];

/// Rewriter that understands just enough JavaScript syntax to rewrite
/// literals by position and hook dynamic call sites.
#[derive(Debug, Default)]
pub struct SyntaxRewriter;

impl ScriptRewriter for SyntaxRewriter {
    fn rewrite(&self, script: &str, rules: &[RewriteRule]) -> String {
        if rules.is_empty() {
            return script.to_string();
        }
        let rewritten = rewrite_script(script, rules);
        ga_dynamic_pass(&rewritten, rules)
    }
}

/// A literal found by the scanner: byte range including quotes, plus the
/// delimiter character.
struct Literal {
    start: usize,
    end: usize,
    quote: char,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn rewrite_script(script: &str, rules: &[RewriteRule]) -> String {
    let bytes = script.as_bytes();
    let mut out = String::with_capacity(script.len());
    let mut copied = 0;

    let mut i = 0;
    // Last identifier token seen outside strings/comments, with its start
    // offset; detects `case` tests and member-access receivers.
    let mut last_word = String::new();
    let mut last_word_start = 0;
    // Receiver identifier left of the most recent `.`.
    let mut receiver: Option<(String, usize)> = None;
    // Last significant (non-whitespace, non-comment) character.
    let mut last_sig = '\0';

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            '/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                i = script[i..].find('\n').map(|n| i + n).unwrap_or(bytes.len());
            }
            '/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                i = script[i + 2..]
                    .find("*/")
                    .map(|n| i + 2 + n + 2)
                    .unwrap_or(bytes.len());
            }
            '"' | '\'' | '`' => {
                let Some(lit) = scan_literal(script, i, c) else {
                    // Unterminated literal: copy the tail verbatim and stop.
                    break;
                };
                let inner = &script[lit.start + 1..lit.end - 1];
                let candidate = lit.quote != '`' || !inner.contains("${");
                let skip = is_case_test(&last_word) || is_property_key(script, &lit, last_sig);
                if candidate && !skip {
                    if let Some(target) = rewrite_url_literal(inner, rules) {
                        out.push_str(&script[copied..lit.start]);
                        out.push_str(ORIGIN_EXPR);
                        out.push(lit.quote);
                        out.push_str(&target);
                        out.push(lit.quote);
                        copied = lit.end;
                    }
                }
                last_word.clear();
                last_sig = lit.quote;
                i = lit.end;
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < bytes.len() && is_ident_char(bytes[i] as char) {
                    i += 1;
                }
                let word = &script[start..i];
                let after_dot = last_sig == '.';

                if word == "fetch" {
                    if after_dot {
                        if let Some((name, name_start)) = receiver.take() {
                            if FETCH_SCOPES.contains(&name.as_str()) && name_start >= copied {
                                out.push_str(&script[copied..name_start]);
                                out.push_str(FETCH_WRAPPER);
                                copied = i;
                            }
                        }
                    } else if is_call_site(script, i) {
                        out.push_str(&script[copied..start]);
                        out.push_str(FETCH_WRAPPER);
                        copied = i;
                    }
                } else if word == "sendBeacon" && after_dot {
                    if let Some((name, name_start)) = receiver.take() {
                        if name == "navigator" && name_start >= copied {
                            out.push_str(&script[copied..name_start]);
                            out.push_str(BEACON_WRAPPER);
                            copied = i;
                        }
                    }
                }

                last_word.clear();
                last_word.push_str(word);
                last_word_start = start;
                last_sig = word.chars().last().unwrap_or('\0');
            }
            _ => {
                if c == '.' {
                    receiver = if last_word.is_empty() {
                        None
                    } else {
                        Some((last_word.clone(), last_word_start))
                    };
                    last_word.clear();
                } else if !c.is_whitespace() {
                    last_word.clear();
                }
                if !c.is_whitespace() {
                    last_sig = c;
                }
                i += c.len_utf8();
            }
        }
    }
    out.push_str(&script[copied..]);
    out
}

/// Scan a quoted literal starting at `start`, honoring backslash escapes.
/// Returns `None` when the literal never terminates.
fn scan_literal(script: &str, start: usize, quote: char) -> Option<Literal> {
    let bytes = script.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' {
            i += 2;
            continue;
        }
        if c == quote as u8 {
            return Some(Literal {
                start,
                end: i + 1,
                quote,
            });
        }
        // Plain strings do not span lines; templates do.
        if quote != '`' && (c == b'\n' || c == b'\r') {
            return None;
        }
        i += 1;
    }
    None
}

fn is_case_test(last_word: &str) -> bool {
    last_word == "case"
}

/// A literal is an object property key when it sits right after `{` or `,`
/// and is immediately followed by `:`. Ternary branches also precede `:` but
/// follow `?`, so the left-context check rules them out.
fn is_property_key(script: &str, lit: &Literal, last_sig: char) -> bool {
    if last_sig != '{' && last_sig != ',' {
        return false;
    }
    let next = next_significant(script, lit.end).map(|(_, c)| c);
    matches!(next, Some(':'))
}

/// A bare `fetch` token is a call when the next significant character opens
/// an argument list whose matching close paren is NOT followed by `{`. The
/// `(args) {` shape marks a definition instead: method shorthand or a
/// `function fetch` declaration.
fn is_call_site(script: &str, after: usize) -> bool {
    let Some((open, c)) = next_significant(script, after) else {
        return false;
    };
    if c != '(' {
        return false;
    }
    let bytes = script.as_bytes();
    let mut depth: i32 = 0;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] as char {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth <= 0 {
                    return !matches!(next_significant(script, i + 1), Some((_, '{')));
                }
            }
            q @ ('"' | '\'' | '`') => match scan_literal(script, i, q) {
                Some(lit) => {
                    i = lit.end;
                    continue;
                }
                None => return false,
            },
            _ => {}
        }
        i += 1;
    }
    false
}

fn next_significant(script: &str, from: usize) -> Option<(usize, char)> {
    script[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(idx, c)| (from + idx, c))
}
