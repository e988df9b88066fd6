//! Per-user "do not show again" state for popups
//!
//! Durable suppressions store an expiry in the durable store; session
//! suppressions live in a volatile store that is wiped when the session ends.
//! Expired durable records are evicted the first time they are read.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::DEFAULT_NAMESPACE;
use crate::clock::Clock;
use crate::error::StorageError;
use crate::storage::KvStore;
use crate::types::popup::MAX_DISMISS_DAYS;
use crate::types::{Timestamp, DAY_MS};

/// Scope used when no user is signed in
pub const ANONYMOUS_SCOPE: &str = "anonymous";

/// How a dismissal was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    /// Suppressed until the session ends
    Session,
    /// Suppressed until this instant
    Until(Timestamp),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DismissalRecord {
    expires_at: Timestamp,
}

/// Tracks popup dismissals for one user.
#[derive(Clone)]
pub struct DismissalTracker {
    durable: Arc<dyn KvStore>,
    session: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
}

impl DismissalTracker {
    pub fn new(
        durable: Arc<dyn KvStore>,
        session: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        user_scope: &str,
    ) -> Self {
        Self::with_namespace(durable, session, clock, DEFAULT_NAMESPACE, user_scope)
    }

    pub fn with_namespace(
        durable: Arc<dyn KvStore>,
        session: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        namespace: &str,
        user_scope: &str,
    ) -> Self {
        let scope = match user_scope.trim() {
            "" => ANONYMOUS_SCOPE,
            s => s,
        };
        Self {
            durable,
            session,
            clock,
            prefix: format!("{namespace}:user:{scope}:dismissed:"),
        }
    }

    fn key(&self, popup_id: &str) -> String {
        format!("{}{}", self.prefix, popup_id)
    }

    /// Dismiss `popup_id` for `days` starting now.
    pub fn dismiss(&self, popup_id: &str, days: i64) -> Result<Dismissal, StorageError> {
        self.dismiss_at(popup_id, days, self.clock.now_ms())
    }

    /// `days <= 0` suppresses for the session; otherwise until
    /// `now + days` (at most a year).
    pub fn dismiss_at(
        &self,
        popup_id: &str,
        days: i64,
        now: Timestamp,
    ) -> Result<Dismissal, StorageError> {
        let key = self.key(popup_id);
        if days <= 0 {
            self.session.set(&key, "1")?;
            debug!(popup_id, "Popup dismissed for session");
            return Ok(Dismissal::Session);
        }

        let days = days.min(MAX_DISMISS_DAYS as i64);
        let expires_at = now.saturating_add(days * DAY_MS);
        let record = serde_json::to_string(&DismissalRecord { expires_at })
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        self.durable.set(&key, &record)?;
        debug!(popup_id, days, expires_at, "Popup dismissed");
        Ok(Dismissal::Until(expires_at))
    }

    pub fn is_dismissed(&self, popup_id: &str) -> bool {
        self.is_dismissed_at(popup_id, self.clock.now_ms())
    }

    /// Whether `popup_id` is suppressed at `at`.
    ///
    /// Storage failures read as "not dismissed": showing a popup again is
    /// preferable to hiding it forever.
    pub fn is_dismissed_at(&self, popup_id: &str, at: Timestamp) -> bool {
        let key = self.key(popup_id);

        match self.session.get(&key) {
            Ok(Some(_)) => return true,
            Ok(None) => {}
            Err(e) => warn!(popup_id, error = %e, "Failed to read session dismissal"),
        }

        let raw = match self.durable.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                warn!(popup_id, error = %e, "Failed to read dismissal");
                return false;
            }
        };

        match serde_json::from_str::<DismissalRecord>(&raw) {
            Ok(record) if at < record.expires_at => true,
            _ => {
                self.evict(&key);
                false
            }
        }
    }

    /// Forget any dismissal of `popup_id`.
    pub fn clear(&self, popup_id: &str) -> Result<(), StorageError> {
        let key = self.key(popup_id);
        self.session.remove(&key)?;
        self.durable.remove(&key)
    }

    /// Drop every session-scoped dismissal for this user.
    pub fn end_session(&self) -> Result<(), StorageError> {
        for key in self.session.keys_with_prefix(&self.prefix)? {
            self.session.remove(&key)?;
        }
        Ok(())
    }

    /// Evict every durable record that has expired by `now`; returns how many.
    pub fn purge_expired(&self, now: Timestamp) -> Result<usize, StorageError> {
        let mut purged = 0;
        for key in self.durable.keys_with_prefix(&self.prefix)? {
            let expired = match self.durable.get(&key)? {
                Some(raw) => serde_json::from_str::<DismissalRecord>(&raw)
                    .map_or(true, |record| now >= record.expires_at),
                None => false,
            };
            if expired {
                self.durable.remove(&key)?;
                purged += 1;
            }
        }
        if purged > 0 {
            debug!(purged, "Purged expired dismissals");
        }
        Ok(purged)
    }

    fn evict(&self, key: &str) {
        if let Err(e) = self.durable.remove(key) {
            warn!(key, error = %e, "Failed to evict stale dismissal");
        }
    }
}
