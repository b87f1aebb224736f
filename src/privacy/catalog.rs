//! Fingerprint parameter catalog.
//!
//! # Responsibilities
//! - Classify request parameter names into fingerprint categories
//! - Handle bracket-subscript names (`ud[em]` matches the `ud` entry)
//! - Keep user/session identifiers out of the strippable set
//!
//! # Design Decisions
//! - Built once at process start into a lowercase hash map; lookup is a
//!   membership test, not a scan
//! - Case-insensitive: vendors are not consistent about parameter casing
//! - `UserId`/`UserData` are cataloged so the stripper can assert they are
//!   preserved, not so they can be removed

use std::collections::HashMap;
use std::sync::LazyLock;

/// Category a request parameter belongs to. The first two are preserved
/// unconditionally; the rest are gated by a policy flag or normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamCategory {
    /// Client IP parameters; anonymized when `policy.ip` is set.
    Ip,
    /// Session/user identifiers. Never stripped: vendor analytics breaks
    /// without them.
    UserId,
    /// Hashed PII the page owner chose to send (enhanced conversions and the
    /// like). Never stripped.
    UserData,
    /// Screen/viewport dimensions; bucketed when `policy.screen` is set.
    Screen,
    /// OS/platform identity; dropped when `policy.hardware` is set.
    Platform,
    /// Plugin lists, fonts, automation markers; dropped under `hardware`.
    BrowserFingerprint,
    /// Timezone and coarse location; dropped when `policy.timezone` is set.
    LocationTimezone,
    /// Canvas/WebGL rendering signatures; dropped under `hardware`.
    CanvasWebgl,
    /// Device memory, core counts, pixel ratio; dropped under `hardware`.
    DeviceInfo,
    /// Language parameters; always normalized to the primary subtag.
    Language,
    /// User-agent parameters; always normalized to family/major.
    UserAgent,
}

impl ParamCategory {
    /// Categories that are never removed or altered by the stripper.
    pub fn preserved(self) -> bool {
        matches!(self, ParamCategory::UserId | ParamCategory::UserData)
    }
}

/// Parameter names per category. Names are matched case-insensitively and
/// after stripping a bracket subscript.
const CATALOG: &[(ParamCategory, &[&str])] = &[
    (
        ParamCategory::Ip,
        &["uip", "_uip", "ip", "ip_address", "ipaddress", "client_ip", "clientip"],
    ),
    (
        ParamCategory::UserId,
        &[
            "uid", "cid", "sid", "_ga", "_gid", "user_id", "userid", "client_id", "clientid",
            "session_id", "sessionid", "visitor_id", "external_id",
        ],
    ),
    (
        ParamCategory::UserData,
        &["ud", "us", "user_data", "em", "ph", "fn", "ln", "hashed_email", "hashed_phone"],
    ),
    (
        ParamCategory::Screen,
        &["sr", "vp", "sd", "screen", "screen_resolution", "viewport", "viewport_size", "res"],
    ),
    (
        ParamCategory::Platform,
        &["uap", "uapv", "uaa", "uab", "platform", "os", "os_version", "oscpu"],
    ),
    (
        ParamCategory::BrowserFingerprint,
        &["plugins", "fonts", "webdriver", "touch_support", "cookies_enabled", "do_not_track"],
    ),
    (
        ParamCategory::LocationTimezone,
        &["tz", "tzo", "timezone", "timezone_offset", "geo", "geoid", "latitude", "longitude"],
    ),
    (
        ParamCategory::CanvasWebgl,
        &["canvas", "canvas_fp", "webgl", "webgl_vendor", "webgl_renderer", "gpu", "renderer"],
    ),
    (
        ParamCategory::DeviceInfo,
        &[
            "uam", "uamb", "dm", "device", "device_model", "device_memory", "hardware_concurrency",
            "dpr", "pixel_ratio",
        ],
    ),
    (
        ParamCategory::Language,
        &["ul", "hl", "lang", "language", "accept_language", "browser_language"],
    ),
    (
        ParamCategory::UserAgent,
        &["ua", "user_agent", "useragent", "browser_ua"],
    ),
];

static LOOKUP: LazyLock<HashMap<&'static str, ParamCategory>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (category, names) in CATALOG {
        for name in *names {
            let prev = map.insert(*name, *category);
            debug_assert!(prev.is_none(), "duplicate catalog entry {name}");
        }
    }
    map
});

/// Classify a parameter name. Matching is case-insensitive and ignores a
/// bracket subscript, so `UD[em]` matches the `ud` entry.
pub fn lookup(key: &str) -> Option<ParamCategory> {
    let base = match key.find('[') {
        Some(idx) => &key[..idx],
        None => key,
    };
    LOOKUP.get(base.to_ascii_lowercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_exact() {
        assert_eq!(lookup("uip"), Some(ParamCategory::Ip));
        assert_eq!(lookup("sr"), Some(ParamCategory::Screen));
        assert_eq!(lookup("tz"), Some(ParamCategory::LocationTimezone));
        assert_eq!(lookup("dt"), None);
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("UIP"), Some(ParamCategory::Ip));
        assert_eq!(lookup("User_Agent"), Some(ParamCategory::UserAgent));
    }

    #[test]
    fn test_lookup_bracket_subscript() {
        assert_eq!(lookup("ud[em]"), Some(ParamCategory::UserData));
        assert_eq!(lookup("UD[ph]"), Some(ParamCategory::UserData));
        assert_eq!(lookup("uamb[0]"), Some(ParamCategory::DeviceInfo));
    }

    #[test]
    fn test_preserved_categories() {
        assert!(ParamCategory::UserId.preserved());
        assert!(ParamCategory::UserData.preserved());
        assert!(!ParamCategory::Ip.preserved());
        assert!(!ParamCategory::CanvasWebgl.preserved());
    }

    #[test]
    fn test_catalog_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for (_, names) in CATALOG {
            for name in *names {
                assert!(seen.insert(*name), "duplicate catalog entry {name}");
            }
        }
    }
}
