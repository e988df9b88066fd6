//! Save-boundary validation
//!
//! Normalization accepts inverted time windows so that nothing a user typed
//! is lost; saving refuses them so that nothing broken reaches other users.

use crate::error::ValidationError;
use crate::types::{CanonicalConfig, ConfigRecord};

/// Check a configuration before it is written anywhere.
pub fn validate(config: &CanonicalConfig) -> Result<(), ValidationError> {
    match config {
        CanonicalConfig::Banners(banners) => validate_records(banners),
        CanonicalConfig::Popups(popups) => validate_records(&popups.items),
        CanonicalConfig::Slots(slots) => validate_records(slots),
        CanonicalConfig::TagDisplay(_) => Ok(()),
    }
}

/// First record whose window ends before it starts, if any.
pub fn validate_records<R: ConfigRecord>(records: &[R]) -> Result<(), ValidationError> {
    for record in records {
        if let (Some(start_at), Some(end_at)) = (record.start_at(), record.end_at()) {
            if start_at > end_at {
                return Err(ValidationError::InvertedWindow {
                    kind: R::KIND,
                    id: record.id().to_string(),
                    title: record.title().to_string(),
                    start_at,
                    end_at,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::normalize;
    use crate::types::ConfigKind;
    use serde_json::json;

    #[test]
    fn test_point_window_is_valid() {
        let cfg = normalize(
            ConfigKind::Banners,
            &json!([{ "id": "a", "startAt": 5, "endAt": 5 }, { "id": "b", "startAt": 5 }]),
            0,
        );
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_inverted_window_names_the_record() {
        let cfg = normalize(
            ConfigKind::Popups,
            &json!({ "items": [
                { "id": "ok", "startAt": 1, "endAt": 2 },
                { "id": "bad", "title": "Summer sale", "startAt": 9, "endAt": 3 }
            ]}),
            0,
        );
        let err = validate(&cfg).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvertedWindow {
                kind: ConfigKind::Popups,
                id: "bad".to_string(),
                title: "Summer sale".to_string(),
                start_at: 9,
                end_at: 3,
            }
        );
    }

    #[test]
    fn test_tag_display_always_valid() {
        let cfg = normalize(ConfigKind::TagDisplay, &json!({ "prioritySlugs": ["x"] }), 0);
        assert!(validate(&cfg).is_ok());
    }
}
