//! Anonymization policy resolution.
//!
//! # Responsibilities
//! - Resolve vendor defaults (bool, partial flags, or absent) into a full policy
//! - Merge a global override on top of the vendor policy
//! - Fail closed when a vendor has no privacy entry at all
//!
//! # Design Decisions
//! - Six independent flags; no flag implies another
//! - Direct resolution defaults unset flags to `false`
//! - A *missing vendor entry* is different: it resolves to all-true, because
//!   forwarding unknown vendor traffic unprotected is worse than over-stripping

use serde::{Deserialize, Serialize};

/// Fully resolved anonymization policy. Every flag has a definite value
/// before any request is sanitized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrivacyPolicy {
    /// Truncate client IP addresses.
    pub ip: bool,
    /// Reduce the user agent to family + major version.
    pub user_agent: bool,
    /// Reduce Accept-Language to its primary subtag.
    pub language: bool,
    /// Bucket screen/viewport sizes into common resolutions.
    pub screen: bool,
    /// Drop timezone and coarse-location parameters.
    pub timezone: bool,
    /// Drop hardware, platform, canvas/WebGL and device-info parameters.
    pub hardware: bool,
}

/// Partial flag set as it appears in vendor defaults or operator config.
/// Omitted flags stay unset and take the resolution default.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyFlags {
    pub ip: Option<bool>,
    pub user_agent: Option<bool>,
    pub language: Option<bool>,
    pub screen: Option<bool>,
    pub timezone: Option<bool>,
    pub hardware: Option<bool>,
}

/// A privacy setting as written by a vendor table entry or the operator:
/// either a blanket boolean or a partial set of named flags.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PrivacySetting {
    All(bool),
    Flags(PolicyFlags),
}

impl PrivacyPolicy {
    /// Policy with every flag enabled.
    pub const STRICT: PrivacyPolicy = PrivacyPolicy {
        ip: true,
        user_agent: true,
        language: true,
        screen: true,
        timezone: true,
        hardware: true,
    };

    /// Resolve a setting into a full policy. Absent and `false` both resolve
    /// to all-false; partial flags resolve with omitted flags off.
    pub fn resolve(setting: Option<&PrivacySetting>) -> PrivacyPolicy {
        match setting {
            None => PrivacyPolicy::default(),
            Some(PrivacySetting::All(true)) => PrivacyPolicy::STRICT,
            Some(PrivacySetting::All(false)) => PrivacyPolicy::default(),
            Some(PrivacySetting::Flags(f)) => PrivacyPolicy {
                ip: f.ip.unwrap_or(false),
                user_agent: f.user_agent.unwrap_or(false),
                language: f.language.unwrap_or(false),
                screen: f.screen.unwrap_or(false),
                timezone: f.timezone.unwrap_or(false),
                hardware: f.hardware.unwrap_or(false),
            },
        }
    }

    /// Merge an override on top of this policy. Absent leaves the policy
    /// unchanged; a boolean replaces all six flags; partial flags override
    /// only the named ones.
    pub fn merge(self, overrides: Option<&PrivacySetting>) -> PrivacyPolicy {
        match overrides {
            None => self,
            Some(PrivacySetting::All(b)) => PrivacyPolicy {
                ip: *b,
                user_agent: *b,
                language: *b,
                screen: *b,
                timezone: *b,
                hardware: *b,
            },
            Some(PrivacySetting::Flags(f)) => PrivacyPolicy {
                ip: f.ip.unwrap_or(self.ip),
                user_agent: f.user_agent.unwrap_or(self.user_agent),
                language: f.language.unwrap_or(self.language),
                screen: f.screen.unwrap_or(self.screen),
                timezone: f.timezone.unwrap_or(self.timezone),
                hardware: f.hardware.unwrap_or(self.hardware),
            },
        }
    }

    /// Effective runtime policy for a vendor. `vendor_default` is the entry
    /// from the registry; `None` means the vendor table has no privacy entry,
    /// which fails closed.
    pub fn effective(
        vendor_key: &str,
        vendor_default: Option<&PrivacySetting>,
        global_override: Option<&PrivacySetting>,
    ) -> PrivacyPolicy {
        let base = match vendor_default {
            Some(setting) => PrivacyPolicy::resolve(Some(setting)),
            None => {
                tracing::warn!(
                    vendor = vendor_key,
                    "no privacy defaults for vendor, failing closed to full anonymization"
                );
                PrivacyPolicy::STRICT
            }
        };
        base.merge(global_override)
    }

    /// True if any flag is active; gates query and body sanitization.
    pub fn any(&self) -> bool {
        self.ip || self.user_agent || self.language || self.screen || self.timezone || self.hardware
    }
}
