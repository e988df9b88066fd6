//! Core types for the content configuration engine
//!
//! Every record type here is produced by [`crate::sanitize`]; nothing in the
//! engine builds a record field by field outside of normalization and the
//! whole-record edits in [`crate::draft`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub mod banner;
pub mod popup;
pub mod slot;
pub mod tag;

pub use banner::{Banner, SEED_BANNER_ID};
pub use popup::{Popup, PopupConfig};
pub use slot::{ContentPick, PickKind, PickOutcome, PickSummary, Slot, MAX_CONTENT_PICKS};
pub use tag::{Tag, TagDisplayConfig};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// One day in milliseconds.
pub const DAY_MS: Timestamp = 86_400_000;

/// Generate a fresh opaque record id.
///
/// ULIDs sort by creation time, which keeps freshly seeded ids readable in
/// cache dumps.
pub fn new_record_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

/// The four configuration kinds, one remote resource and one cache key each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKind {
    Banners,
    Popups,
    Slots,
    TagDisplay,
}

impl ConfigKind {
    /// All kinds in load order
    pub const ALL: [ConfigKind; 4] = [
        ConfigKind::Banners,
        ConfigKind::Popups,
        ConfigKind::Slots,
        ConfigKind::TagDisplay,
    ];

    /// Stable name used in cache keys and remote resource paths
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Banners => "banners",
            ConfigKind::Popups => "popups",
            ConfigKind::Slots => "slots",
            ConfigKind::TagDisplay => "tag_display",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "banner" | "banners" => Ok(ConfigKind::Banners),
            "popup" | "popups" => Ok(ConfigKind::Popups),
            "slot" | "slots" => Ok(ConfigKind::Slots),
            "tag" | "tags" | "tag_display" => Ok(ConfigKind::TagDisplay),
            other => Err(format!("unknown configuration kind: {other}")),
        }
    }
}

/// Which devices a banner or popup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayOn {
    #[default]
    All,
    Pc,
    Mobile,
}

impl DisplayOn {
    /// Map a loose string onto the closed set, falling back to `All`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pc" | "desktop" => DisplayOn::Pc,
            "mobile" => DisplayOn::Mobile,
            _ => DisplayOn::All,
        }
    }
}

/// The device a consumer is rendering for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Pc,
    Mobile,
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pc" | "desktop" => Ok(Device::Pc),
            "mobile" => Ok(Device::Mobile),
            other => Err(format!("unknown device: {other}")),
        }
    }
}

/// Behaviour shared by banners, popups and slots.
///
/// Lets activation, validation and draft editing work over any list kind
/// without caring about the payload.
pub trait ConfigRecord {
    /// The kind a list of these records belongs to
    const KIND: ConfigKind;

    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn enabled(&self) -> bool;
    fn start_at(&self) -> Option<Timestamp>;
    fn end_at(&self) -> Option<Timestamp>;

    /// Device targeting; `None` for kinds that are not device scoped.
    fn display_on(&self) -> Option<DisplayOn> {
        None
    }

    fn created_at(&self) -> Timestamp;
    fn updated_at(&self) -> Timestamp;

    /// Overwrite both bookkeeping timestamps.
    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp);
}

/// A canonical configuration value of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalConfig {
    Banners(Vec<Banner>),
    Popups(PopupConfig),
    Slots(Vec<Slot>),
    TagDisplay(TagDisplayConfig),
}

impl CanonicalConfig {
    /// The kind this value belongs to
    pub fn kind(&self) -> ConfigKind {
        match self {
            CanonicalConfig::Banners(_) => ConfigKind::Banners,
            CanonicalConfig::Popups(_) => ConfigKind::Popups,
            CanonicalConfig::Slots(_) => ConfigKind::Slots,
            CanonicalConfig::TagDisplay(_) => ConfigKind::TagDisplay,
        }
    }

    /// Serialize to the JSON shape used on the wire and in the cache.
    pub fn to_value(&self) -> serde_json::Value {
        // Plain structs of strings, numbers and options always serialize.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn as_banners(&self) -> Option<&[Banner]> {
        match self {
            CanonicalConfig::Banners(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_popups(&self) -> Option<&PopupConfig> {
        match self {
            CanonicalConfig::Popups(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_slots(&self) -> Option<&[Slot]> {
        match self {
            CanonicalConfig::Slots(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tag_display(&self) -> Option<&TagDisplayConfig> {
        match self {
            CanonicalConfig::TagDisplay(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_kind_roundtrips_through_str() {
        for kind in ConfigKind::ALL {
            assert_eq!(kind.as_str().parse::<ConfigKind>().unwrap(), kind);
        }
        assert_eq!("tag-display".parse::<ConfigKind>().unwrap(), ConfigKind::TagDisplay);
        assert!("widgets".parse::<ConfigKind>().is_err());
    }

    #[test]
    fn test_display_on_lenient_fallback() {
        assert_eq!(DisplayOn::parse_lenient(" PC "), DisplayOn::Pc);
        assert_eq!(DisplayOn::parse_lenient("mobile"), DisplayOn::Mobile);
        assert_eq!(DisplayOn::parse_lenient("tablet"), DisplayOn::All);
    }

    #[test]
    fn test_new_record_ids_are_unique() {
        let a = new_record_id();
        let b = new_record_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 26);
    }
}
