//! What the home surface shows, derived from canonical records
//!
//! Every function here is a pure view over already-normalized data plus the
//! instant and device of the render. Re-run them whenever a
//! [`crate::notify::ChangeEvent`] arrives.

use std::hash::Hash;

use crate::activation::{active, is_active};
use crate::config::EngineConfig;
use crate::dismissal::DismissalTracker;
use crate::mixer::interleave_unique;
use crate::ordering::{resolve_with_prefix, Slugged};
use crate::types::{Banner, Device, Popup, PopupConfig, Slot, TagDisplayConfig, Timestamp};

/// Active banners, lowest `order` first; ties keep list order.
pub fn visible_banners(banners: &[Banner], at: Timestamp, device: Option<Device>) -> Vec<&Banner> {
    let mut visible: Vec<&Banner> = active(banners, at, device).collect();
    visible.sort_by_key(|banner| banner.order);
    visible
}

/// Popups to open on this render, at most `max_display_count` of them.
///
/// Dismissed popups are skipped before truncating, so a dismissed popup
/// frees its place for the next one.
pub fn popups_to_show<'a>(
    config: &'a PopupConfig,
    tracker: &DismissalTracker,
    at: Timestamp,
    device: Option<Device>,
) -> Vec<&'a Popup> {
    let mut candidates: Vec<&Popup> = config
        .items
        .iter()
        .filter(|popup| is_active(*popup, at, device))
        .filter(|popup| !tracker.is_dismissed_at(&popup.id, at))
        .collect();
    candidates.sort_by_key(|popup| popup.priority);
    candidates.truncate(config.max_display_count as usize);
    candidates
}

/// Active slots in configured order. Slots ignore device targeting.
pub fn active_slots(slots: &[Slot], at: Timestamp) -> Vec<&Slot> {
    active(slots, at, None).collect()
}

/// Tag strip order under `tag_config`, using the engine's fallback list
/// and reserved prefix.
pub fn ordered_tags<'a, T: Slugged>(
    all_tags: &'a [T],
    tag_config: &TagDisplayConfig,
    engine: &EngineConfig,
) -> Vec<&'a T> {
    resolve_with_prefix(
        all_tags,
        tag_config,
        &engine.fallback_tag_priority,
        &engine.reserved_slug_prefix,
    )
}

/// A recommendation row mixing `primary` and `secondary` with the
/// engine's pattern and limit. Items sharing a key show once.
pub fn mixed_feed<T, K, F>(primary: Vec<T>, secondary: Vec<T>, engine: &EngineConfig, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    interleave_unique(primary, secondary, &engine.mix_pattern, engine.mix_limit, key)
}
