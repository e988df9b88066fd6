//! Popup records and the popup configuration envelope

use serde::Serialize;

use super::{ConfigKind, ConfigRecord, DisplayOn, Timestamp};

/// Default number of popups shown per visit
pub const DEFAULT_MAX_DISPLAY_COUNT: u8 = 1;
/// Upper bound for `max_display_count`
pub const MAX_DISPLAY_COUNT_LIMIT: u8 = 10;
/// Default "do not show again for N days"
pub const DEFAULT_DISMISS_DAYS: u16 = 1;
/// Upper bound for `dismiss_days`
pub const MAX_DISMISS_DAYS: u16 = 365;

/// A home-page popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Popup {
    pub id: String,
    pub title: String,
    pub body: String,
    pub image_url: String,
    pub mobile_image_url: String,
    pub link_url: String,
    pub enabled: bool,
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    pub display_on: DisplayOn,
    /// Days a "do not show again" lasts; 0 suppresses for the session only
    pub dismiss_days: u16,
    /// Lower shows first
    pub priority: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// All popups plus how many may be shown at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupConfig {
    pub max_display_count: u8,
    pub items: Vec<Popup>,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            max_display_count: DEFAULT_MAX_DISPLAY_COUNT,
            items: Vec::new(),
        }
    }
}

impl PopupConfig {
    /// Whether this is the shipped initial state
    pub fn is_seed(&self) -> bool {
        self.max_display_count == DEFAULT_MAX_DISPLAY_COUNT && self.items.is_empty()
    }
}

impl ConfigRecord for Popup {
    const KIND: ConfigKind = ConfigKind::Popups;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn start_at(&self) -> Option<Timestamp> {
        self.start_at
    }

    fn end_at(&self) -> Option<Timestamp> {
        self.end_at
    }

    fn display_on(&self) -> Option<DisplayOn> {
        Some(self.display_on)
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp) {
        self.created_at = created_at;
        self.updated_at = updated_at;
    }
}
