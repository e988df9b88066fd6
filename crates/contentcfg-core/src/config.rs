//! Engine configuration
//!
//! ```
//! use contentcfg_core::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.mix_limit, 12);
//!
//! let config: EngineConfig =
//!     serde_json::from_str(r#"{ "user_scope": "u-42", "mix_pattern": ["primary", "secondary"] }"#)
//!         .unwrap();
//! assert_eq!(config.namespace, "contentcfg");
//! assert_eq!(config.mix_pattern.to_string(), "PS");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_NAMESPACE;
use crate::dismissal::ANONYMOUS_SCOPE;
use crate::error::CfgResult;
use crate::mixer::MixPattern;
use crate::notify::EVENT_CHANNEL_CAPACITY;
use crate::ordering::RESERVED_SLUG_PREFIX;

/// Settings for a [`crate::ContentEngine`]. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Prefix of every storage key
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Whose popup dismissals are read and written
    #[serde(default = "default_user_scope")]
    pub user_scope: String,

    /// Draw pattern for mixed recommendation rows
    #[serde(default)]
    pub mix_pattern: MixPattern,

    /// Length cap of a mixed row
    #[serde(default = "default_mix_limit")]
    pub mix_limit: usize,

    /// Tag order used while no priority list is configured
    #[serde(default)]
    pub fallback_tag_priority: Vec<String>,

    /// Tags whose slug starts with this are never shown
    #[serde(default = "default_reserved_slug_prefix")]
    pub reserved_slug_prefix: String,

    /// Buffered change events per broadcast receiver
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_user_scope() -> String {
    ANONYMOUS_SCOPE.to_string()
}

fn default_mix_limit() -> usize {
    12
}

fn default_reserved_slug_prefix() -> String {
    RESERVED_SLUG_PREFIX.to_string()
}

fn default_event_channel_capacity() -> usize {
    EVENT_CHANNEL_CAPACITY
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            user_scope: default_user_scope(),
            mix_pattern: MixPattern::default(),
            mix_limit: default_mix_limit(),
            fallback_tag_priority: Vec::new(),
            reserved_slug_prefix: default_reserved_slug_prefix(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> CfgResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_user_scope(mut self, user_scope: impl Into<String>) -> Self {
        self.user_scope = user_scope.into();
        self
    }
}
