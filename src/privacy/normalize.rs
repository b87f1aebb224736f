//! Fingerprint normalization transforms.
//!
//! # Responsibilities
//! - Truncate IP addresses (IPv4 last octet, IPv6 to /48)
//! - Reduce user-agent strings to family + major version
//! - Reduce Accept-Language values to their primary subtag
//! - Bucket screen/viewport sizes into common resolutions
//!
//! # Design Decisions
//! - All transforms are pure and total: unrecognized input passes through
//!   (or falls back to a generic value) rather than erroring
//! - Output must stay functional for vendor analytics while collapsing the
//!   long tail of values that makes a browser re-identifiable

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

/// Browser families recognized in user-agent strings, in match priority order.
/// Edge and Opera must be checked before Chrome/Safari because their UA
/// strings embed both tokens.
const UA_FAMILIES: &[(&str, &str)] = &[
    ("Firefox", "Firefox"),
    ("Edg", "Edge"),
    ("OPR", "Opera"),
    ("Opera", "Opera"),
    ("Chrome", "Chrome"),
    ("Safari", "Safari"),
];

static UA_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Firefox|Edg|OPR|Opera|Chrome|Safari)/(\d+)").expect("valid UA regex")
});

static SCREEN_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*[xX]\s*(\d+)\s*$").expect("valid screen regex"));

/// Truncate an IP address so it no longer identifies a single host.
///
/// IPv4 zeroes the last octet; IPv6 keeps the first three groups (the /48
/// routing prefix) and collapses the rest. Anything that does not parse as an
/// IP address is returned unchanged.
pub fn anonymize_ip(value: &str) -> String {
    match value.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let o = v4.octets();
            format!("{}.{}.{}.0", o[0], o[1], o[2])
        }
        Ok(IpAddr::V6(v6)) => {
            let s = v6.segments();
            format!("{:x}:{:x}:{:x}::", s[0], s[1], s[2])
        }
        Err(_) => value.to_string(),
    }
}

/// Reduce a user-agent string to `Mozilla/5.0 (compatible; <Family>/<major>.0)`.
///
/// Family priority follows [`UA_FAMILIES`]; an unrecognized UA yields a
/// generic compatible string rather than passing the original through.
pub fn normalize_user_agent(value: &str) -> String {
    let mut best: Option<(usize, &str, &str)> = None;
    for caps in UA_TOKEN.captures_iter(value) {
        let token = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let major = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        if let Some(priority) = UA_FAMILIES.iter().position(|(t, _)| *t == token) {
            match best {
                Some((current, _, _)) if current <= priority => {}
                _ => best = Some((priority, UA_FAMILIES[priority].1, major)),
            }
        }
    }
    match best {
        Some((_, family, major)) => format!("Mozilla/5.0 (compatible; {family}/{major}.0)"),
        None => "Mozilla/5.0 (compatible; Generic/1.0)".to_string(),
    }
}

/// Reduce an Accept-Language value to its primary subtag, e.g.
/// `"en-US,en;q=0.9"` → `"en"`. Empty input defaults to `"en"`.
pub fn normalize_language(value: &str) -> String {
    let primary = value
        .split([',', '-', ';'])
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if primary.is_empty() {
        "en".to_string()
    } else {
        primary
    }
}

/// Bucket a `WxH` screen size into a ladder of common resolutions, keyed by
/// width. Unparseable input lands in the smallest bucket.
pub fn generalize_screen(value: &str) -> String {
    let width = SCREEN_SIZE
        .captures(value)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0);

    let bucket = if width >= 2560 {
        "2560x1440"
    } else if width >= 1920 {
        "1920x1080"
    } else if width >= 1440 {
        "1440x900"
    } else if width >= 1366 {
        "1366x768"
    } else {
        "1280x720"
    };
    bucket.to_string()
}
