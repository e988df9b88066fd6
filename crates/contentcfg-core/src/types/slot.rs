//! Curated content slots and their picks

use serde::Serialize;

use super::{ConfigKind, ConfigRecord, Timestamp};

/// Picks per slot; bounds both cache size and render cost
pub const MAX_CONTENT_PICKS: usize = 40;

/// What a pick points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PickKind {
    Character,
    Story,
}

impl PickKind {
    /// Closed-set parse; anything else is not a pick.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "character" => Some(PickKind::Character),
            "story" => Some(PickKind::Story),
            _ => None,
        }
    }
}

/// Display summary of an externally owned content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickSummary {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

/// A reference to a character or story embedded in a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentPick {
    #[serde(rename = "type")]
    pub kind: PickKind,
    pub item: PickSummary,
}

impl ContentPick {
    pub fn new(kind: PickKind, item: PickSummary) -> Self {
        Self { kind, item }
    }

    /// Identity used for de-duplication
    pub fn key(&self) -> (PickKind, &str) {
        (self.kind, self.item.id.as_str())
    }
}

/// Result of inserting a pick into a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Added,
    /// Same `(type, id)` is already in the slot; nothing changed
    Duplicate,
    /// Slot already holds `MAX_CONTENT_PICKS`; nothing changed
    Full,
}

/// A curated home-page row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub enabled: bool,
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    pub content_picks: Vec<ContentPick>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Slot {
    /// Whether a pick with this identity is already present
    pub fn contains_pick(&self, kind: PickKind, id: &str) -> bool {
        self.content_picks.iter().any(|p| p.key() == (kind, id))
    }

    /// Append a pick, rejecting duplicates and overflow.
    pub fn add_pick(&mut self, pick: ContentPick, now: Timestamp) -> PickOutcome {
        if self.contains_pick(pick.kind, &pick.item.id) {
            return PickOutcome::Duplicate;
        }
        if self.content_picks.len() >= MAX_CONTENT_PICKS {
            return PickOutcome::Full;
        }
        self.content_picks.push(pick);
        self.updated_at = now;
        PickOutcome::Added
    }

    /// Remove a pick; returns whether anything was removed.
    pub fn remove_pick(&mut self, kind: PickKind, id: &str, now: Timestamp) -> bool {
        let before = self.content_picks.len();
        self.content_picks.retain(|p| p.key() != (kind, id));
        let removed = self.content_picks.len() != before;
        if removed {
            self.updated_at = now;
        }
        removed
    }

    /// Move a pick to `index` (clamped to the end of the list).
    pub fn move_pick(&mut self, kind: PickKind, id: &str, index: usize, now: Timestamp) -> bool {
        let Some(from) = self.content_picks.iter().position(|p| p.key() == (kind, id)) else {
            return false;
        };
        let pick = self.content_picks.remove(from);
        let to = index.min(self.content_picks.len());
        self.content_picks.insert(to, pick);
        self.updated_at = now;
        true
    }
}

impl ConfigRecord for Slot {
    const KIND: ConfigKind = ConfigKind::Slots;

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
