//! Local configuration cache
//!
//! One namespaced key per configuration kind holds the canonical JSON value.
//! Stored text is treated as untrusted on every read and passed back through
//! [`crate::sanitize`], so values written by an older build still come out
//! canonical. Writes are whole-value replacements followed by a change
//! notification.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::StorageError;
use crate::notify::{ChangeOrigin, Notifier};
use crate::sanitize::{default_config, is_default_config, normalize_str};
use crate::storage::KvStore;
use crate::types::{CanonicalConfig, ConfigKind};

/// Default key namespace
pub const DEFAULT_NAMESPACE: &str = "contentcfg";

/// Read-through cache plus offline edit buffer for all configuration kinds.
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn KvStore>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    namespace: String,
}

impl LocalCache {
    pub fn new(store: Arc<dyn KvStore>, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Use a different key namespace (e.g. per environment).
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Storage key for a kind
    pub fn key(&self, kind: ConfigKind) -> String {
        format!("{}:config:{}", self.namespace, kind.as_str())
    }

    /// Reverse of [`LocalCache::key`]
    pub fn kind_for_key(&self, key: &str) -> Option<ConfigKind> {
        ConfigKind::ALL.into_iter().find(|kind| self.key(*kind) == key)
    }

    /// The stored text, exactly as written.
    pub fn read_raw(&self, kind: ConfigKind) -> Result<Option<String>, StorageError> {
        self.store.get(&self.key(kind))
    }

    /// The cached value, normalized; `None` when nothing is cached.
    pub fn read(&self, kind: ConfigKind) -> Result<Option<CanonicalConfig>, StorageError> {
        let now = self.clock.now_ms();
        Ok(self
            .read_raw(kind)?
            .map(|raw| normalize_str(kind, &raw, now)))
    }

    /// The cached value, or the shipped default when absent or unreadable.
    pub fn read_or_default(&self, kind: ConfigKind) -> CanonicalConfig {
        match self.read(kind) {
            Ok(Some(config)) => config,
            Ok(None) => default_config(kind, self.clock.now_ms()),
            Err(e) => {
                warn!(%kind, error = %e, "Failed to read cached config, using default");
                default_config(kind, self.clock.now_ms())
            }
        }
    }

    /// Whether the cache holds something other than the shipped default.
    pub fn has_local(&self, kind: ConfigKind) -> bool {
        match self.read(kind) {
            Ok(Some(config)) => !is_default_config(&config),
            Ok(None) => false,
            Err(e) => {
                warn!(%kind, error = %e, "Failed to read cached config");
                false
            }
        }
    }

    /// Replace the cached value for `config.kind()` and publish the change.
    pub fn write(&self, config: &CanonicalConfig) -> Result<(), StorageError> {
        let kind = config.kind();
        let text = config.to_value().to_string();
        self.store.set(&self.key(kind), &text)?;
        debug!(%kind, bytes = text.len(), "Cached config written");
        self.notifier.publish(kind, ChangeOrigin::Local);
        Ok(())
    }

    /// Forget the cached value for `kind` and publish the change.
    pub fn clear(&self, kind: ConfigKind) -> Result<(), StorageError> {
        self.store.remove(&self.key(kind))?;
        self.notifier.publish(kind, ChangeOrigin::Local);
        Ok(())
    }

    /// Forward a storage-change signal from another writer sharing the store.
    ///
    /// Returns the kind that changed, or `None` if `key` is not a config key.
    pub fn external_change(&self, key: &str) -> Option<ConfigKind> {
        let kind = self.kind_for_key(key)?;
        self.notifier.publish(kind, ChangeOrigin::External);
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sanitize::normalize;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_with(store: Arc<MemoryStore>) -> LocalCache {
        LocalCache::new(store, Notifier::new(), Arc::new(ManualClock::new(1_000)))
    }

    #[test]
    fn test_missing_value_reads_as_default() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        assert!(cache.read(ConfigKind::Banners).unwrap().is_none());
        assert!(is_default_config(&cache.read_or_default(ConfigKind::Banners)));
        assert!(!cache.has_local(ConfigKind::Banners));
    }

    #[test]
    fn test_write_publishes_once() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let _sub = cache.notifier().subscribe(ConfigKind::Slots, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let slots = normalize(ConfigKind::Slots, &json!([{ "id": "s", "title": "Picks" }]), 1);
        cache.write(&slots).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.read(ConfigKind::Slots).unwrap(), Some(slots));
        assert!(cache.has_local(ConfigKind::Slots));
    }

    #[test]
    fn test_stored_values_are_renormalized() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_with(store.clone());
        store
            .set(
                &cache.key(ConfigKind::TagDisplay),
                r#"{"prioritySlugs":["a","a"],"hiddenSlugs":["a","b"],"legacy":true}"#,
            )
            .unwrap();

        let tags = cache.read(ConfigKind::TagDisplay).unwrap().unwrap();
        let tags = tags.as_tag_display().unwrap();
        assert_eq!(tags.priority_slugs, ["a"]);
        assert_eq!(tags.hidden_slugs, ["b"]);
    }

    #[test]
    fn test_corrupt_value_reads_as_default() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_with(store.clone());
        store.set(&cache.key(ConfigKind::Popups), "{{{").unwrap();
        assert!(is_default_config(&cache.read_or_default(ConfigKind::Popups)));
    }

    #[test]
    fn test_quota_failure_does_not_publish() {
        let cache = cache_with(Arc::new(MemoryStore::with_quota(8)));
        let mut rx = cache.notifier().receiver();

        let err = cache
            .write(&default_config(ConfigKind::Banners, 0))
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_external_change_maps_key_to_kind() {
        let cache = cache_with(Arc::new(MemoryStore::new())).with_namespace("staging");
        let mut rx = cache.notifier().receiver();

        assert_eq!(cache.key(ConfigKind::TagDisplay), "staging:config:tag_display");
        assert_eq!(
            cache.external_change("staging:config:popups"),
            Some(ConfigKind::Popups)
        );
        assert_eq!(cache.external_change("contentcfg:config:popups"), None);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.origin, ChangeOrigin::External);
        assert!(rx.try_recv().is_err());
    }
}
