//! Admin edits applied to a configuration before it is saved
//!
//! Edits only touch the in-memory list; nothing is persisted until the list
//! is handed to [`crate::reconcile::ReconciliationService::save`].

use crate::types::{CanonicalConfig, ConfigRecord, Timestamp};

/// Insert `record`, or replace the record with the same id.
///
/// A replaced record keeps its original `createdAt`. Returns `true` when the
/// record was new.
pub fn upsert<T: ConfigRecord>(list: &mut Vec<T>, mut record: T, now: Timestamp) -> bool {
    match list.iter().position(|r| r.id() == record.id()) {
        Some(index) => {
            let created_at = list[index].created_at();
            record.set_timestamps(created_at, now);
            list[index] = record;
            false
        }
        None => {
            record.set_timestamps(now, now);
            list.push(record);
            true
        }
    }
}

/// Remove the record with `id`; returns whether one was removed.
pub fn remove<T: ConfigRecord>(list: &mut Vec<T>, id: &str) -> bool {
    let before = list.len();
    list.retain(|r| r.id() != id);
    list.len() != before
}

/// Move the record with `id` to `index` (clamped to the end of the list).
pub fn move_to<T: ConfigRecord>(list: &mut Vec<T>, id: &str, index: usize) -> bool {
    let Some(from) = list.iter().position(|r| r.id() == id) else {
        return false;
    };
    let record = list.remove(from);
    let to = index.min(list.len());
    list.insert(to, record);
    true
}

/// Restamp `updatedAt` on every record whose content differs from `previous`.
///
/// Records matched by id and unchanged apart from timestamps keep the
/// previous `updatedAt`. Tag display is stamped whenever its lists differ.
pub fn stamp_changes(
    draft: &mut CanonicalConfig,
    previous: Option<&CanonicalConfig>,
    now: Timestamp,
) {
    match (draft, previous) {
        (CanonicalConfig::Banners(list), prev) => {
            stamp_records(list, prev.and_then(CanonicalConfig::as_banners), now)
        }
        (CanonicalConfig::Popups(popups), prev) => stamp_records(
            &mut popups.items,
            prev.and_then(CanonicalConfig::as_popups).map(|p| p.items.as_slice()),
            now,
        ),
        (CanonicalConfig::Slots(list), prev) => {
            stamp_records(list, prev.and_then(CanonicalConfig::as_slots), now)
        }
        (CanonicalConfig::TagDisplay(tags), prev) => {
            let unchanged = prev.and_then(CanonicalConfig::as_tag_display).filter(|p| {
                p.priority_slugs == tags.priority_slugs && p.hidden_slugs == tags.hidden_slugs
            });
            tags.updated_at = Some(unchanged.and_then(|p| p.updated_at).unwrap_or(now));
        }
    }
}

fn stamp_records<T: ConfigRecord + Clone + PartialEq>(
    list: &mut [T],
    previous: Option<&[T]>,
    now: Timestamp,
) {
    for record in list.iter_mut() {
        let unchanged = previous
            .and_then(|prev| prev.iter().find(|p| p.id() == record.id()))
            .filter(|p| same_content(&*record, p));
        let updated_at = unchanged.map_or(now, |p| p.updated_at());
        let created_at = record.created_at();
        record.set_timestamps(created_at, updated_at);
    }
}

fn same_content<T: ConfigRecord + Clone + PartialEq>(a: &T, b: &T) -> bool {
    let mut a = a.clone();
    a.set_timestamps(b.created_at(), b.updated_at());
    a == *b
}
