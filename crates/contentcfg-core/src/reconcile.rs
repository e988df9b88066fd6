//! Reconciliation between the local cache and the remote source of truth
//!
//! ## Load
//!
//! ```text
//! fetch(kind) ──Err──► FetchFailed            (cache untouched)
//!      │
//!      Ok(remote)
//!      ├── cache non-default && remote looks default ──► KeptLocal  (cache untouched)
//!      └── otherwise ──► normalize ──► cache.write ──► Applied      (one broadcast)
//! ```
//!
//! The "looks default" test is structural. It protects an administrator's
//! local edits from a freshly deployed, unconfigured server, and cannot tell
//! that server apart from one deliberately reset to the seed value.
//!
//! ## Save
//!
//! ```text
//! Unsynced ──► SyncingRemote ──┬── PUT ok   ──► cache ← echo  ──► SyncedRemote
//!                              └── PUT fail ──► cache ← draft ──► LocalOnly
//! ```
//!
//! `LocalOnly` is retried by calling `save` again; nothing retries on its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::LocalCache;
use crate::draft::stamp_changes;
use crate::error::{RemoteError, StorageError, ValidationError};
use crate::remote::{DedupRemote, RemoteStore};
use crate::sanitize::{is_default_config, normalize};
use crate::types::{CanonicalConfig, ConfigKind};
use crate::validation::validate;

/// Per-kind synchronization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Nothing confirmed by the remote yet in this session
    #[default]
    Unsynced,
    /// A save is waiting on the remote
    SyncingRemote,
    /// The cache matches what the remote confirmed
    SyncedRemote,
    /// The last save reached the cache only
    LocalOnly,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Unsynced => write!(f, "Unsynced"),
            SyncState::SyncingRemote => write!(f, "Syncing"),
            SyncState::SyncedRemote => write!(f, "Synced"),
            SyncState::LocalOnly => write!(f, "Local only"),
        }
    }
}

/// What a load did to the cache
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The remote value replaced the cache
    Applied(CanonicalConfig),
    /// The remote looked unconfigured; local edits were kept
    KeptLocal,
    /// The remote could not be read; the cache was left as is
    FetchFailed(RemoteError),
    /// The remote was read but the cache could not be written
    CacheWriteFailed(StorageError),
}

impl LoadOutcome {
    /// Whether the cache now reflects the remote
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied(_))
    }
}

/// What a save achieved
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Confirmed by the remote and cached
    Synced(CanonicalConfig),
    /// The remote failed; the draft is cached but other users cannot see it
    LocalOnly {
        config: CanonicalConfig,
        error: RemoteError,
    },
    /// Confirmed by the remote, but the local cache refused the write
    SyncedNotCached {
        config: CanonicalConfig,
        error: StorageError,
    },
    /// Neither the remote nor the cache took the draft; nothing is durable
    NotPersisted {
        remote: RemoteError,
        storage: StorageError,
    },
    /// Rejected before anything was written
    Invalid(ValidationError),
}

impl SaveOutcome {
    /// Whether the remote confirmed the write
    pub fn is_remote_confirmed(&self) -> bool {
        matches!(
            self,
            SaveOutcome::Synced(_) | SaveOutcome::SyncedNotCached { .. }
        )
    }

    /// A one-line message suitable for an admin UI
    pub fn describe(&self) -> String {
        match self {
            SaveOutcome::Synced(config) => format!("Saved {}", config.kind()),
            SaveOutcome::LocalOnly { config, error } => format!(
                "Saved {} locally only; other users will not see it yet ({error})",
                config.kind()
            ),
            SaveOutcome::SyncedNotCached { config, error } => format!(
                "Saved {} remotely, but this device could not cache it ({error})",
                config.kind()
            ),
            SaveOutcome::NotPersisted { remote, storage } => format!(
                "Not saved anywhere: remote failed ({remote}) and local storage failed ({storage})"
            ),
            SaveOutcome::Invalid(e) => format!("Not saved: {e}"),
        }
    }
}

/// Keeps the local cache and the remote store in step.
pub struct ReconciliationService {
    cache: LocalCache,
    remote: DedupRemote,
    states: Mutex<HashMap<ConfigKind, SyncState>>,
    save_locks: HashMap<ConfigKind, tokio::sync::Mutex<()>>,
}

impl ReconciliationService {
    pub fn new(cache: LocalCache, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            cache,
            remote: DedupRemote::new(remote),
            states: Mutex::new(HashMap::new()),
            save_locks: ConfigKind::ALL
                .into_iter()
                .map(|kind| (kind, tokio::sync::Mutex::new(())))
                .collect(),
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn state(&self, kind: ConfigKind) -> SyncState {
        self.states.lock().get(&kind).copied().unwrap_or_default()
    }

    fn set_state(&self, kind: ConfigKind, state: SyncState) {
        debug!(%kind, %state, "Sync state changed");
        self.states.lock().insert(kind, state);
    }

    /// Pull `kind` from the remote and decide whether to apply it.
    pub async fn load(&self, kind: ConfigKind) -> LoadOutcome {
        let raw = match self.remote.fetch(kind).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%kind, error = %e, "Remote fetch failed, keeping cached config");
                return LoadOutcome::FetchFailed(e);
            }
        };

        let now = self.cache.clock().now_ms();
        let remote = normalize(kind, &raw, now);

        if is_default_config(&remote) && self.cache.has_local(kind) {
            info!(%kind, "Remote config looks unconfigured, keeping local edits");
            return LoadOutcome::KeptLocal;
        }

        match self.cache.write(&remote) {
            Ok(()) => {
                self.set_state(kind, SyncState::SyncedRemote);
                debug!(%kind, "Applied remote config");
                LoadOutcome::Applied(remote)
            }
            Err(e) => {
                warn!(%kind, error = %e, "Failed to cache remote config");
                LoadOutcome::CacheWriteFailed(e)
            }
        }
    }

    /// Load every kind, one after another.
    pub async fn load_all(&self) -> Vec<(ConfigKind, LoadOutcome)> {
        let mut outcomes = Vec::with_capacity(ConfigKind::ALL.len());
        for kind in ConfigKind::ALL {
            outcomes.push((kind, self.load(kind).await));
        }
        outcomes
    }

    /// Push a draft to the remote and cache whatever ends up authoritative.
    pub async fn save(&self, draft: &CanonicalConfig) -> SaveOutcome {
        let kind = draft.kind();
        let now = self.cache.clock().now_ms();
        let mut draft = normalize(kind, &draft.to_value(), now);

        if let Err(e) = validate(&draft) {
            warn!(%kind, error = %e, "Rejected invalid config");
            return SaveOutcome::Invalid(e);
        }

        // Same-kind saves never overlap.
        let _guard = match self.save_locks.get(&kind) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let previous = self.cache.read(kind).ok().flatten();
        stamp_changes(&mut draft, previous.as_ref(), now);

        self.set_state(kind, SyncState::SyncingRemote);

        match self.remote.store(kind, draft.to_value()).await {
            Ok(echo) => {
                // An empty echo means the remote stored the payload verbatim.
                let config = if echo.is_null() {
                    draft
                } else {
                    normalize(kind, &echo, now)
                };
                self.set_state(kind, SyncState::SyncedRemote);
                match self.cache.write(&config) {
                    Ok(()) => {
                        info!(%kind, "Config saved");
                        SaveOutcome::Synced(config)
                    }
                    Err(error) => {
                        warn!(%kind, error = %error, "Config saved remotely but not cached");
                        SaveOutcome::SyncedNotCached { config, error }
                    }
                }
            }
            Err(remote) => {
                self.set_state(kind, SyncState::LocalOnly);
                match self.cache.write(&draft) {
                    Ok(()) => {
                        warn!(%kind, error = %remote, "Remote save failed, config kept locally");
                        SaveOutcome::LocalOnly {
                            config: draft,
                            error: remote,
                        }
                    }
                    Err(storage) => {
                        warn!(
                            %kind,
                            remote_error = %remote,
                            storage_error = %storage,
                            "Config not persisted"
                        );
                        SaveOutcome::NotPersisted { remote, storage }
                    }
                }
            }
        }
    }
}
