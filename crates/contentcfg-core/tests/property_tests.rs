//! Property-based tests for normalization, activation, ordering and mixing
//!
//! Uses proptest to check the invariants every consumer relies on.

use contentcfg_core::activation::in_window;
use contentcfg_core::mixer::interleave;
use contentcfg_core::ordering::resolve;
use contentcfg_core::sanitize::normalize;
use contentcfg_core::{CanonicalConfig, ConfigKind, MixPattern, Source};
use proptest::prelude::*;
use serde_json::{json, Value};

const NOW: i64 = 1_700_000_000_000;

// ============================================================================
// Strategy Generators
// ============================================================================

/// Arbitrary JSON, a few levels deep
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1e6f64..1e6).prop_map(|f| json!(f)),
        "[a-zA-Z0-9 :_\\-]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(field_name_strategy(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Keys the normalizer actually reads, plus noise
fn field_name_strategy() -> impl Strategy<Value = String> {
    const KNOWN: &[&str] = &[
        "id",
        "title",
        "enabled",
        "startAt",
        "endAt",
        "createdAt",
        "displayOn",
        "order",
        "priority",
        "items",
        "maxDisplayCount",
        "contentPicks",
        "type",
        "item",
        "prioritySlugs",
        "hiddenSlugs",
    ];
    prop_oneof![
        3 => prop::sample::select(KNOWN).prop_map(String::from),
        1 => "[a-z]{1,6}",
    ]
}

fn kind_strategy() -> impl Strategy<Value = ConfigKind> {
    prop::sample::select(ConfigKind::ALL.to_vec())
}

fn slug_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

fn pattern_strategy() -> impl Strategy<Value = MixPattern> {
    prop::collection::vec(
        prop_oneof![Just(Source::Primary), Just(Source::Secondary)],
        1..6,
    )
    .prop_map(|steps| MixPattern::new(steps).expect("non-empty"))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Normalizing canonical output changes nothing
    #[test]
    fn normalize_is_idempotent(kind in kind_strategy(), raw in json_strategy()) {
        let once = normalize(kind, &raw, NOW);
        let twice = normalize(kind, &once.to_value(), NOW + 1);
        prop_assert_eq!(once, twice);
    }

    /// Priority and hidden lists never share a slug after normalization
    #[test]
    fn tag_lists_are_disjoint(
        priority in prop::collection::vec(slug_strategy(), 0..8),
        hidden in prop::collection::vec(slug_strategy(), 0..8),
    ) {
        let raw = json!({ "prioritySlugs": priority, "hiddenSlugs": hidden });
        let CanonicalConfig::TagDisplay(tags) = normalize(ConfigKind::TagDisplay, &raw, NOW) else {
            panic!("wrong kind");
        };
        for slug in &tags.priority_slugs {
            prop_assert!(!tags.hidden_slugs.contains(slug));
        }
    }

    /// Resolved order never shows hidden slugs and never repeats an item
    #[test]
    fn resolve_drops_hidden_and_keeps_items_once(
        all in prop::collection::vec(slug_strategy(), 0..12),
        priority in prop::collection::vec(slug_strategy(), 0..6),
        hidden in prop::collection::vec(slug_strategy(), 0..6),
    ) {
        let raw = json!({ "prioritySlugs": priority, "hiddenSlugs": hidden });
        let CanonicalConfig::TagDisplay(tags) = normalize(ConfigKind::TagDisplay, &raw, NOW) else {
            panic!("wrong kind");
        };
        let ordered = resolve(&all, &tags, &[] as &[&str]);

        let visible = all.iter().filter(|s| !tags.hidden_slugs.contains(*s)).count();
        prop_assert_eq!(ordered.len(), visible);
        for item in &ordered {
            prop_assert!(!tags.hidden_slugs.contains(*item));
        }
    }

    /// Output length is min(limit, |primary| + |secondary|)
    #[test]
    fn mixer_length(
        primary in 0usize..20,
        secondary in 0usize..20,
        limit in 0usize..30,
        pattern in pattern_strategy(),
    ) {
        let a: Vec<usize> = (0..primary).collect();
        let b: Vec<usize> = (100..100 + secondary).collect();
        let out = interleave(a, b, &pattern, limit);
        prop_assert_eq!(out.len(), limit.min(primary + secondary));
    }

    /// Each source keeps its own relative order inside the mix
    #[test]
    fn mixer_preserves_source_order(
        primary in 0usize..15,
        secondary in 0usize..15,
        pattern in pattern_strategy(),
    ) {
        let a: Vec<usize> = (0..primary).collect();
        let b: Vec<usize> = (100..100 + secondary).collect();
        let out = interleave(a, b, &pattern, 100);
        let from_a: Vec<_> = out.iter().filter(|n| **n < 100).copied().collect();
        let from_b: Vec<_> = out.iter().filter(|n| **n >= 100).copied().collect();
        prop_assert_eq!(from_a, (0..primary).collect::<Vec<_>>());
        prop_assert_eq!(from_b, (100..100 + secondary).collect::<Vec<_>>());
    }

    /// [T, T] is active at T and nowhere else
    #[test]
    fn point_window_boundary(t in 1i64..4_000_000_000_000) {
        prop_assert!(in_window(Some(t), Some(t), t));
        prop_assert!(!in_window(Some(t), Some(t), t - 1));
        prop_assert!(!in_window(Some(t), Some(t), t + 1));
    }
}
