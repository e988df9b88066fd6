//! Time-window and device activation
//!
//! A record is shown only when it is enabled, the instant falls inside its
//! inclusive `[startAt, endAt]` window, and (for banners and popups) its
//! device target admits the rendering device.

use crate::types::{ConfigRecord, Device, DisplayOn, Timestamp};

/// Whether `record` should be shown at `at_ms` on `device`.
///
/// An unknown device only passes records that target every device.
pub fn is_active<R: ConfigRecord>(record: &R, at_ms: Timestamp, device: Option<Device>) -> bool {
    if !record.enabled() {
        return false;
    }
    if !in_window(record.start_at(), record.end_at(), at_ms) {
        return false;
    }
    match record.display_on() {
        None | Some(DisplayOn::All) => true,
        Some(DisplayOn::Pc) => device == Some(Device::Pc),
        Some(DisplayOn::Mobile) => device == Some(Device::Mobile),
    }
}

/// Inclusive window check with open ends for `None`.
pub fn in_window(start_at: Option<Timestamp>, end_at: Option<Timestamp>, at_ms: Timestamp) -> bool {
    start_at.map_or(true, |start| at_ms >= start) && end_at.map_or(true, |end| at_ms <= end)
}

/// Filter a list down to its active records, keeping order.
pub fn active<'a, R: ConfigRecord>(
    records: &'a [R],
    at_ms: Timestamp,
    device: Option<Device>,
) -> impl Iterator<Item = &'a R> + 'a {
    records
        .iter()
        .filter(move |record| is_active(*record, at_ms, device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::{normalize_banner, normalize_slot};
    use crate::types::{Banner, Slot};
    use serde_json::json;

    fn banner(raw: serde_json::Value) -> Banner {
        normalize_banner(&raw, 0).unwrap()
    }

    #[test]
    fn test_point_window_is_inclusive() {
        let b = banner(json!({ "id": "b", "startAt": 1000, "endAt": 1000 }));
        assert!(is_active(&b, 1000, Some(Device::Pc)));
        assert!(!is_active(&b, 999, Some(Device::Pc)));
        assert!(!is_active(&b, 1001, Some(Device::Pc)));
    }

    #[test]
    fn test_open_ends() {
        let b = banner(json!({ "id": "b", "startAt": 500 }));
        assert!(!is_active(&b, 499, None));
        assert!(is_active(&b, i64::MAX, None));

        let b = banner(json!({ "id": "b", "endAt": 500 }));
        assert!(is_active(&b, 0, None));
        assert!(!is_active(&b, 501, None));
    }

    #[test]
    fn test_disabled_dominates_open_window() {
        let b = banner(json!({ "id": "b", "enabled": false, "startAt": 0, "endAt": 10_000 }));
        assert!(!is_active(&b, 5_000, Some(Device::Pc)));
        assert!(!is_active(&b, 5_000, Some(Device::Mobile)));
    }

    #[test]
    fn test_device_targeting() {
        let pc = banner(json!({ "id": "pc", "displayOn": "pc" }));
        assert!(is_active(&pc, 0, Some(Device::Pc)));
        assert!(!is_active(&pc, 0, Some(Device::Mobile)));
        assert!(!is_active(&pc, 0, None));

        let mobile = banner(json!({ "id": "m", "displayOn": "mobile" }));
        assert!(is_active(&mobile, 0, Some(Device::Mobile)));
        assert!(!is_active(&mobile, 0, Some(Device::Pc)));

        let all = banner(json!({ "id": "a" }));
        assert!(is_active(&all, 0, None));
    }

    #[test]
    fn test_slots_ignore_device() {
        let slot: Slot = normalize_slot(&json!({ "id": "s" }), 0).unwrap();
        assert!(is_active(&slot, 0, None));
        assert!(is_active(&slot, 0, Some(Device::Mobile)));
    }

    #[test]
    fn test_active_filter_keeps_order() {
        let list = vec![
            banner(json!({ "id": "1" })),
            banner(json!({ "id": "2", "enabled": false })),
            banner(json!({ "id": "3" })),
        ];
        let ids: Vec<_> = active(&list, 0, None).map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }
}
