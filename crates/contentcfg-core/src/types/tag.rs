//! Tag display configuration

use serde::Serialize;

use super::Timestamp;

/// A tag as the consumer lists it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub slug: String,
    pub name: String,
}

impl Tag {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }
}

/// Which tags go first and which are hidden.
///
/// The two lists never share a slug: every edit evicts the slug from the
/// opposite list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDisplayConfig {
    pub priority_slugs: Vec<String>,
    pub hidden_slugs: Vec<String>,
    pub updated_at: Option<Timestamp>,
}

impl TagDisplayConfig {
    /// Whether this is the shipped initial state
    pub fn is_seed(&self) -> bool {
        self.priority_slugs.is_empty() && self.hidden_slugs.is_empty() && self.updated_at.is_none()
    }

    pub fn is_hidden(&self, slug: &str) -> bool {
        self.hidden_slugs.iter().any(|s| s == slug)
    }

    pub fn is_prioritized(&self, slug: &str) -> bool {
        self.priority_slugs.iter().any(|s| s == slug)
    }

    /// Append `slug` to the priority list (no-op if already there).
    pub fn prioritize(&mut self, slug: &str, now: Timestamp) {
        let slug = slug.trim();
        if slug.is_empty() {
            return;
        }
        self.hidden_slugs.retain(|s| s != slug);
        if !self.is_prioritized(slug) {
            self.priority_slugs.push(slug.to_string());
        }
        self.updated_at = Some(now);
    }

    /// Drop `slug` from the priority list.
    pub fn deprioritize(&mut self, slug: &str, now: Timestamp) {
        let slug = slug.trim();
        self.priority_slugs.retain(|s| s != slug);
        self.updated_at = Some(now);
    }

    /// Hide `slug`, removing any priority it had.
    pub fn hide(&mut self, slug: &str, now: Timestamp) {
        let slug = slug.trim();
        if slug.is_empty() {
            return;
        }
        self.priority_slugs.retain(|s| s != slug);
        if !self.is_hidden(slug) {
            self.hidden_slugs.push(slug.to_string());
        }
        self.updated_at = Some(now);
    }

    pub fn unhide(&mut self, slug: &str, now: Timestamp) {
        let slug = slug.trim();
        self.hidden_slugs.retain(|s| s != slug);
        self.updated_at = Some(now);
    }
}
