//! Normalization of untrusted input into canonical records
//!
//! Every value that enters the engine (remote payloads, cache entries, admin
//! drafts) passes through here. Normalization is total: malformed input is
//! coerced to type-correct defaults and never reported as an error. It is
//! also idempotent: feeding a canonical value back in yields the same value,
//! because every field the output carries is read back verbatim.
//!
//! ```text
//! raw JSON ──► RawShape ──┬── List(..)    ─► per-record normalize ─► dedupe by id
//!                         ├── Object(..)  ─► envelope fields (popups, tags)
//!                         └── Unknown     ─► kind default
//! ```

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use crate::types::banner::SEED_BANNER_ID;
use crate::types::popup::{
    DEFAULT_DISMISS_DAYS, DEFAULT_MAX_DISPLAY_COUNT, MAX_DISMISS_DAYS, MAX_DISPLAY_COUNT_LIMIT,
};
use crate::types::{
    new_record_id, Banner, CanonicalConfig, ConfigKind, ContentPick, DisplayOn, PickKind,
    PickSummary, Popup, PopupConfig, Slot, TagDisplayConfig, Timestamp, MAX_CONTENT_PICKS,
};

/// Range for banner `order` and popup `priority`
const RANK_MIN: i64 = -9_999;
const RANK_MAX: i64 = 9_999;

/// 9999-12-31T23:59:59.999Z; anything later is treated as garbage.
const MAX_TIMESTAMP: Timestamp = 253_402_300_799_999;

/// The structural shape of a raw value, decided once up front.
#[derive(Debug, Clone, Copy)]
pub enum RawShape<'a> {
    List(&'a [Value]),
    Object(&'a Map<String, Value>),
    Unknown,
}

impl<'a> RawShape<'a> {
    pub fn classify(raw: &'a Value) -> Self {
        match raw {
            Value::Array(items) => RawShape::List(items),
            Value::Object(map) => RawShape::Object(map),
            _ => RawShape::Unknown,
        }
    }
}

/// Normalize a raw value of the given kind.
pub fn normalize(kind: ConfigKind, raw: &Value, now: Timestamp) -> CanonicalConfig {
    match kind {
        ConfigKind::Banners => CanonicalConfig::Banners(normalize_banners(raw, now)),
        ConfigKind::Popups => CanonicalConfig::Popups(normalize_popups(raw, now)),
        ConfigKind::Slots => CanonicalConfig::Slots(normalize_slots(raw, now)),
        ConfigKind::TagDisplay => CanonicalConfig::TagDisplay(normalize_tag_display(raw)),
    }
}

/// Normalize a serialized value; text that is not JSON yields the kind default.
pub fn normalize_str(kind: ConfigKind, raw: &str, now: Timestamp) -> CanonicalConfig {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize(kind, &value, now),
        Err(_) => default_config(kind, now),
    }
}

/// The value a fresh deployment ships with.
pub fn default_config(kind: ConfigKind, now: Timestamp) -> CanonicalConfig {
    match kind {
        ConfigKind::Banners => CanonicalConfig::Banners(vec![Banner::seed_notice(now)]),
        ConfigKind::Popups => CanonicalConfig::Popups(PopupConfig::default()),
        ConfigKind::Slots => CanonicalConfig::Slots(Vec::new()),
        ConfigKind::TagDisplay => CanonicalConfig::TagDisplay(TagDisplayConfig::default()),
    }
}

/// Recognize the shipped initial state.
///
/// Structural only: an admin who edits a configuration back to exactly the
/// seed value is indistinguishable from an unconfigured deployment.
pub fn is_default_config(config: &CanonicalConfig) -> bool {
    match config {
        CanonicalConfig::Banners(banners) => match banners.as_slice() {
            [only] => only.id == SEED_BANNER_ID && only.same_content(&Banner::seed_notice(0)),
            _ => false,
        },
        CanonicalConfig::Popups(popups) => popups.is_seed(),
        CanonicalConfig::Slots(slots) => slots.is_empty(),
        CanonicalConfig::TagDisplay(tags) => tags.is_seed(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Per-kind normalization
// ═══════════════════════════════════════════════════════════════════════

pub fn normalize_banners(raw: &Value, now: Timestamp) -> Vec<Banner> {
    match RawShape::classify(raw) {
        RawShape::List(items) => normalize_list(items, |v| normalize_banner(v, now), |b| &b.id),
        RawShape::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => {
                normalize_list(items, |v| normalize_banner(v, now), |b| &b.id)
            }
            _ => vec![Banner::seed_notice(now)],
        },
        RawShape::Unknown => vec![Banner::seed_notice(now)],
    }
}

pub fn normalize_popups(raw: &Value, now: Timestamp) -> PopupConfig {
    match RawShape::classify(raw) {
        // Older payloads stored the popup array without the envelope.
        RawShape::List(items) => PopupConfig {
            max_display_count: DEFAULT_MAX_DISPLAY_COUNT,
            items: normalize_list(items, |v| normalize_popup(v, now), |p| &p.id),
        },
        RawShape::Object(map) => {
            let max_display_count = int_field(
                map,
                &["maxDisplayCount", "max_display_count"],
                DEFAULT_MAX_DISPLAY_COUNT as i64,
                1,
                MAX_DISPLAY_COUNT_LIMIT as i64,
            ) as u8;
            let items = match map.get("items") {
                Some(Value::Array(items)) => {
                    normalize_list(items, |v| normalize_popup(v, now), |p| &p.id)
                }
                _ => Vec::new(),
            };
            PopupConfig {
                max_display_count,
                items,
            }
        }
        RawShape::Unknown => PopupConfig::default(),
    }
}

pub fn normalize_slots(raw: &Value, now: Timestamp) -> Vec<Slot> {
    match RawShape::classify(raw) {
        RawShape::List(items) => normalize_list(items, |v| normalize_slot(v, now), |s| &s.id),
        RawShape::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => {
                normalize_list(items, |v| normalize_slot(v, now), |s| &s.id)
            }
            _ => Vec::new(),
        },
        RawShape::Unknown => Vec::new(),
    }
}

pub fn normalize_tag_display(raw: &Value) -> TagDisplayConfig {
    let RawShape::Object(map) = RawShape::classify(raw) else {
        return TagDisplayConfig::default();
    };

    let priority_slugs = slug_list(map, &["prioritySlugs", "priority_slugs"]);
    let hidden_slugs = slug_list(map, &["hiddenSlugs", "hidden_slugs"])
        .into_iter()
        .filter(|slug| !priority_slugs.contains(slug))
        .collect();

    TagDisplayConfig {
        priority_slugs,
        hidden_slugs,
        updated_at: ts_field(map, &["updatedAt", "updated_at"]),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Per-record normalization
// ═══════════════════════════════════════════════════════════════════════

/// Normalize one banner; `None` when the entry is not an object at all.
pub fn normalize_banner(raw: &Value, now: Timestamp) -> Option<Banner> {
    let map = raw.as_object()?;
    let (created_at, updated_at) = timestamps(map, now);
    Some(Banner {
        id: id_field(map),
        title: str_field(map, &["title"]),
        image_url: url_field(map, &["imageUrl", "image_url"]),
        mobile_image_url: url_field(map, &["mobileImageUrl", "mobile_image_url"]),
        link_url: url_field(map, &["linkUrl", "link_url"]),
        open_in_new_tab: bool_field(map, &["openInNewTab", "open_in_new_tab"], false),
        enabled: bool_field(map, &["enabled"], true),
        start_at: ts_field(map, &["startAt", "start_at"]),
        end_at: ts_field(map, &["endAt", "end_at"]),
        display_on: display_on_field(map),
        order: int_field(map, &["order"], 0, RANK_MIN, RANK_MAX) as i32,
        created_at,
        updated_at,
    })
}

pub fn normalize_popup(raw: &Value, now: Timestamp) -> Option<Popup> {
    let map = raw.as_object()?;
    let (created_at, updated_at) = timestamps(map, now);
    Some(Popup {
        id: id_field(map),
        title: str_field(map, &["title"]),
        body: str_field(map, &["body", "content"]),
        image_url: url_field(map, &["imageUrl", "image_url"]),
        mobile_image_url: url_field(map, &["mobileImageUrl", "mobile_image_url"]),
        link_url: url_field(map, &["linkUrl", "link_url"]),
        enabled: bool_field(map, &["enabled"], false),
        start_at: ts_field(map, &["startAt", "start_at"]),
        end_at: ts_field(map, &["endAt", "end_at"]),
        display_on: display_on_field(map),
        dismiss_days: int_field(
            map,
            &["dismissDays", "dismiss_days"],
            DEFAULT_DISMISS_DAYS as i64,
            0,
            MAX_DISMISS_DAYS as i64,
        ) as u16,
        priority: int_field(map, &["priority"], 0, RANK_MIN, RANK_MAX) as i32,
        created_at,
        updated_at,
    })
}

pub fn normalize_slot(raw: &Value, now: Timestamp) -> Option<Slot> {
    let map = raw.as_object()?;
    let (created_at, updated_at) = timestamps(map, now);
    Some(Slot {
        id: id_field(map),
        title: str_field(map, &["title"]),
        subtitle: str_field(map, &["subtitle"]),
        enabled: bool_field(map, &["enabled"], true),
        start_at: ts_field(map, &["startAt", "start_at"]),
        end_at: ts_field(map, &["endAt", "end_at"]),
        content_picks: content_picks(map),
        created_at,
        updated_at,
    })
}

fn content_picks(map: &Map<String, Value>) -> Vec<ContentPick> {
    let Some(Value::Array(raw_picks)) = first(map, &["contentPicks", "content_picks"]) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut picks = Vec::new();
    for raw in raw_picks {
        if picks.len() >= MAX_CONTENT_PICKS {
            break;
        }
        let Some(pick) = normalize_pick(raw) else {
            continue;
        };
        if seen.insert((pick.kind, pick.item.id.clone())) {
            picks.push(pick);
        }
    }
    picks
}

fn normalize_pick(raw: &Value) -> Option<ContentPick> {
    let map = raw.as_object()?;
    let kind = match map.get("type") {
        Some(Value::String(s)) => PickKind::parse(s)?,
        _ => return None,
    };
    // Flat picks (`{type, id, name}`) predate the nested `item` summary.
    let item = match map.get("item") {
        Some(Value::Object(item)) => item,
        _ => map,
    };
    let id = str_field(item, &["id"]);
    if id.is_empty() {
        return None;
    }
    Some(ContentPick {
        kind,
        item: PickSummary {
            id,
            name: str_field(item, &["name"]),
            image_url: url_field(item, &["imageUrl", "image_url"]),
        },
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Field coercion helpers
// ═══════════════════════════════════════════════════════════════════════

fn normalize_list<T>(
    items: &[Value],
    normalize_one: impl Fn(&Value) -> Option<T>,
    id_of: impl Fn(&T) -> &String,
) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items.iter().filter_map(normalize_one) {
        if seen.insert(id_of(&item).clone()) {
            out.push(item);
        }
    }
    out
}

fn first<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k).filter(|v| !v.is_null()))
}

fn str_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    match first(map, keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Like `str_field`, but inline binary payloads are refused: images must
/// already be uploaded and referenced by URL.
fn url_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    let s = str_field(map, keys);
    if s.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) {
        String::new()
    } else {
        s
    }
}

fn id_field(map: &Map<String, Value>) -> String {
    let id = str_field(map, &["id"]);
    if id.is_empty() {
        new_record_id()
    } else {
        id
    }
}

fn bool_field(map: &Map<String, Value>, keys: &[&str], default: bool) -> bool {
    match first(map, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => default,
        },
        _ => default,
    }
}

fn int_field(map: &Map<String, Value>, keys: &[&str], default: i64, min: i64, max: i64) -> i64 {
    let parsed = match first(map, keys) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.unwrap_or(default).clamp(min, max)
}

fn ts_field(map: &Map<String, Value>, keys: &[&str]) -> Option<Timestamp> {
    let ts = match first(map, keys)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => parse_timestamp(s.trim()),
        _ => None,
    }?;
    (0..=MAX_TIMESTAMP).contains(&ts).then_some(ts)
}

/// Integer milliseconds, RFC 3339, or a zone-less `datetime-local` value
/// (read as UTC).
fn parse_timestamp(s: &str) -> Option<Timestamp> {
    if s.is_empty() {
        return None;
    }
    if let Ok(ms) = s.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}

fn timestamps(map: &Map<String, Value>, now: Timestamp) -> (Timestamp, Timestamp) {
    let created_at = ts_field(map, &["createdAt", "created_at"]).unwrap_or(now);
    let updated_at = ts_field(map, &["updatedAt", "updated_at"]).unwrap_or(now);
    (created_at, updated_at)
}

fn display_on_field(map: &Map<String, Value>) -> DisplayOn {
    match first(map, &["displayOn", "display_on"]) {
        Some(Value::String(s)) => DisplayOn::parse_lenient(s),
        _ => DisplayOn::All,
    }
}

fn slug_list(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let Some(Value::Array(items)) = first(map, keys) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
