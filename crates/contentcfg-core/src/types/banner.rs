//! Home-page banner records

use serde::Serialize;

use super::{ConfigKind, ConfigRecord, Device, DisplayOn, Timestamp};

/// Id of the notice banner every fresh deployment ships with
pub const SEED_BANNER_ID: &str = "notice-welcome";

/// A rotating home-page banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub image_url: String,
    /// Falls back to `image_url` when empty
    pub mobile_image_url: String,
    pub link_url: String,
    pub open_in_new_tab: bool,
    pub enabled: bool,
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    pub display_on: DisplayOn,
    /// Lower shows first
    pub order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Banner {
    /// The single notice banner the shipped configuration contains.
    pub fn seed_notice(now: Timestamp) -> Self {
        Self {
            id: SEED_BANNER_ID.to_string(),
            title: "Notice".to_string(),
            image_url: "/images/banners/notice.png".to_string(),
            mobile_image_url: String::new(),
            link_url: "/notice".to_string(),
            open_in_new_tab: false,
            enabled: true,
            start_at: None,
            end_at: None,
            display_on: DisplayOn::All,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Image to render on the given device
    pub fn image_for(&self, device: Device) -> &str {
        match device {
            Device::Mobile if !self.mobile_image_url.is_empty() => &self.mobile_image_url,
            _ => &self.image_url,
        }
    }

    /// Structural equality ignoring bookkeeping timestamps.
    pub fn same_content(&self, other: &Banner) -> bool {
        let mut a = self.clone();
        a.set_timestamps(other.created_at, other.updated_at);
        a == *other
    }
}

impl ConfigRecord for Banner {
    const KIND: ConfigKind = ConfigKind::Banners;

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_image_falls_back() {
        let mut banner = Banner::seed_notice(0);
        assert_eq!(banner.image_for(Device::Mobile), "/images/banners/notice.png");

        banner.mobile_image_url = "/m.png".to_string();
        assert_eq!(banner.image_for(Device::Mobile), "/m.png");
        assert_eq!(banner.image_for(Device::Pc), "/images/banners/notice.png");
    }

    #[test]
    fn test_same_content_ignores_timestamps() {
        let a = Banner::seed_notice(1);
        let b = Banner::seed_notice(99);
        assert!(a.same_content(&b));

        let mut c = Banner::seed_notice(1);
        c.title = "Changed".to_string();
        assert!(!a.same_content(&c));
    }
}
