//! Priority ordering of tag-like items
//!
//! An empty priority list means "use the shipped default ordering", never
//! "alphabetical": an admin who only edits the hidden set must not see the
//! remaining tags reshuffle.

use std::collections::HashSet;

use crate::types::{Tag, TagDisplayConfig};

/// Slugs with this prefix are internal and never displayed
pub const RESERVED_SLUG_PREFIX: &str = "__";

/// Anything identified by a slug.
pub trait Slugged {
    fn slug(&self) -> &str;
}

impl Slugged for String {
    fn slug(&self) -> &str {
        self
    }
}

impl Slugged for &str {
    fn slug(&self) -> &str {
        self
    }
}

impl Slugged for Tag {
    fn slug(&self) -> &str {
        &self.slug
    }
}

/// Resolve display order with the default reserved prefix.
pub fn resolve<'a, T: Slugged, S: AsRef<str>>(
    all_items: &'a [T],
    config: &TagDisplayConfig,
    fallback_priority: &[S],
) -> Vec<&'a T> {
    resolve_with_prefix(all_items, config, fallback_priority, RESERVED_SLUG_PREFIX)
}

/// Prioritized items first (in priority order), then every other visible
/// item in its original relative order. Hidden and reserved items are
/// dropped.
pub fn resolve_with_prefix<'a, T: Slugged, S: AsRef<str>>(
    all_items: &'a [T],
    config: &TagDisplayConfig,
    fallback_priority: &[S],
    reserved_prefix: &str,
) -> Vec<&'a T> {
    let hidden: HashSet<&str> = config.hidden_slugs.iter().map(String::as_str).collect();
    let is_visible = |item: &T| {
        let slug = item.slug();
        !hidden.contains(slug) && (reserved_prefix.is_empty() || !slug.starts_with(reserved_prefix))
    };

    let priority: Vec<&str> = if config.priority_slugs.is_empty() {
        fallback_priority.iter().map(AsRef::as_ref).collect()
    } else {
        config.priority_slugs.iter().map(String::as_str).collect()
    };

    let mut placed = vec![false; all_items.len()];
    let mut out = Vec::with_capacity(all_items.len());

    for slug in priority {
        let hit = all_items
            .iter()
            .enumerate()
            .find(|(i, item)| !placed[*i] && item.slug() == slug && is_visible(item));
        if let Some((i, item)) = hit {
            placed[i] = true;
            out.push(item);
        }
    }

    for (i, item) in all_items.iter().enumerate() {
        if !placed[i] && is_visible(item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slugs<'a>(items: &[&&'a str]) -> Vec<&'a str> {
        items.iter().map(|s| **s).collect()
    }

    fn config(priority: &[&str], hidden: &[&str]) -> TagDisplayConfig {
        TagDisplayConfig {
            priority_slugs: priority.iter().map(|s| s.to_string()).collect(),
            hidden_slugs: hidden.iter().map(|s| s.to_string()).collect(),
            updated_at: Some(1),
        }
    }

    const ALL: [&str; 6] = ["action", "romance", "__internal", "horror", "comedy", "drama"];
    const FALLBACK: [&str; 2] = ["drama", "comedy"];

    #[test]
    fn test_priority_then_original_order() {
        let cfg = config(&["horror", "missing", "action", "horror"], &[]);
        let out = resolve(&ALL, &cfg, &FALLBACK);
        assert_eq!(slugs(&out), ["horror", "action", "romance", "comedy", "drama"]);
    }

    #[test]
    fn test_empty_priority_uses_fallback() {
        let cfg = config(&[], &["romance"]);
        let out = resolve(&ALL, &cfg, &FALLBACK);
        assert_eq!(slugs(&out), ["drama", "comedy", "action", "horror"]);
    }

    #[test]
    fn test_hidden_beats_fallback_priority() {
        let cfg = config(&[], &["drama"]);
        let out = resolve(&ALL, &cfg, &FALLBACK);
        assert_eq!(slugs(&out), ["comedy", "action", "romance", "horror"]);
    }

    #[test]
    fn test_reserved_prefix_never_shown() {
        let cfg = config(&["__internal"], &[]);
        let out = resolve(&ALL, &cfg, &FALLBACK);
        assert!(!slugs(&out).contains(&"__internal"));
    }

    #[test]
    fn test_works_with_tag_structs() {
        let tags = vec![Tag::new("a", "A"), Tag::new("b", "B"), Tag::new("c", "C")];
        let cfg = config(&["c"], &["a"]);
        let out: Vec<&str> = resolve(&tags, &cfg, &[] as &[&str])
            .into_iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(out, ["C", "B"]);
    }
}
