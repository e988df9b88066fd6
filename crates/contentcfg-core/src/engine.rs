//! ContentEngine - the primary entry point
//!
//! ContentEngine wires the pieces together for one user on one device:
//! - a durable store (redb) holding the config cache and dismissals
//! - a volatile store holding session-scoped dismissals
//! - the remote source of truth, behind [`RemoteStore`]
//! - a [`Notifier`] every cache write publishes to
//!
//! # Example
//!
//! ```ignore
//! use contentcfg_core::{ConfigKind, ContentEngine, EngineConfig, FsRemote};
//!
//! let remote = Arc::new(FsRemote::new("/srv/contentcfg"));
//! let engine = ContentEngine::open("~/.contentcfg/data", remote, EngineConfig::default())?;
//!
//! engine.load_all().await;
//! for banner in engine.visible_banners(Some(Device::Mobile)) {
//!     println!("{} -> {}", banner.title, banner.link_url);
//! }
//! ```

use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::cache::LocalCache;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::dismissal::{Dismissal, DismissalTracker};
use crate::error::{CfgError, CfgResult};
use crate::notify::{ChangeEvent, Notifier, Subscription};
use crate::ordering::Slugged;
use crate::reconcile::{LoadOutcome, ReconciliationService, SaveOutcome, SyncState};
use crate::remote::RemoteStore;
use crate::showcase;
use crate::storage::{KvStore, MemoryStore, RedbStore};
use crate::types::{
    Banner, CanonicalConfig, ConfigKind, Device, Popup, PopupConfig, Slot, TagDisplayConfig,
    Timestamp,
};

/// File name of the durable store inside the data directory
pub const DB_FILE_NAME: &str = "contentcfg.redb";

pub struct ContentEngine {
    config: EngineConfig,
    data_dir: Option<PathBuf>,
    reconciler: ReconciliationService,
    tracker: DismissalTracker,
}

impl ContentEngine {
    /// Open an engine whose durable state lives under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `CfgError::Io` if the directory cannot be created.
    /// Returns `CfgError::Database` if the store cannot be opened.
    pub fn open(
        data_dir: impl AsRef<Path>,
        remote: Arc<dyn RemoteStore>,
        config: EngineConfig,
    ) -> CfgResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        info!(?data_dir, "Opening ContentEngine");

        std::fs::create_dir_all(&data_dir)?;
        let durable = Arc::new(RedbStore::new(data_dir.join(DB_FILE_NAME))?);

        let mut engine = Self::with_stores(
            durable,
            Arc::new(MemoryStore::new()),
            remote,
            Arc::new(SystemClock),
            config,
        );
        engine.data_dir = Some(data_dir);
        Ok(engine)
    }

    /// Assemble an engine from explicit collaborators.
    pub fn with_stores(
        durable: Arc<dyn KvStore>,
        session: Arc<dyn KvStore>,
        remote: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let notifier = Notifier::with_capacity(config.event_channel_capacity);
        let cache = LocalCache::new(durable.clone(), notifier, clock.clone())
            .with_namespace(config.namespace.clone());
        let tracker = DismissalTracker::with_namespace(
            durable,
            session,
            clock,
            &config.namespace,
            &config.user_scope,
        );

        Self {
            config,
            data_dir: None,
            reconciler: ReconciliationService::new(cache, remote),
            tracker,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `None` for engines built with [`ContentEngine::with_stores`]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn cache(&self) -> &LocalCache {
        self.reconciler.cache()
    }

    pub fn reconciler(&self) -> &ReconciliationService {
        &self.reconciler
    }

    pub fn tracker(&self) -> &DismissalTracker {
        &self.tracker
    }

    pub fn now_ms(&self) -> Timestamp {
        self.cache().clock().now_ms()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Change notification
    // ═══════════════════════════════════════════════════════════════════════

    /// Subscribe to every change event.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ChangeEvent> {
        self.cache().notifier().receiver()
    }

    /// Run `handler` whenever `kind` changes, until the subscription drops.
    pub fn on_change<F>(&self, kind: ConfigKind, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.cache().notifier().subscribe(kind, handler)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reconciliation
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn load(&self, kind: ConfigKind) -> LoadOutcome {
        self.reconciler.load(kind).await
    }

    pub async fn load_all(&self) -> Vec<(ConfigKind, LoadOutcome)> {
        self.reconciler.load_all().await
    }

    pub async fn save(&self, draft: &CanonicalConfig) -> SaveOutcome {
        self.reconciler.save(draft).await
    }

    pub fn sync_state(&self, kind: ConfigKind) -> SyncState {
        self.reconciler.state(kind)
    }

    /// The cached value of `kind`, or its shipped default.
    pub fn current(&self, kind: ConfigKind) -> CanonicalConfig {
        self.cache().read_or_default(kind)
    }

    pub fn banners(&self) -> Vec<Banner> {
        match self.current(ConfigKind::Banners) {
            CanonicalConfig::Banners(banners) => banners,
            _ => Vec::new(),
        }
    }

    pub fn popup_config(&self) -> PopupConfig {
        match self.current(ConfigKind::Popups) {
            CanonicalConfig::Popups(popups) => popups,
            _ => PopupConfig::default(),
        }
    }

    pub fn slots(&self) -> Vec<Slot> {
        match self.current(ConfigKind::Slots) {
            CanonicalConfig::Slots(slots) => slots,
            _ => Vec::new(),
        }
    }

    pub fn tag_display(&self) -> TagDisplayConfig {
        match self.current(ConfigKind::TagDisplay) {
            CanonicalConfig::TagDisplay(tags) => tags,
            _ => TagDisplayConfig::default(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Home surface
    // ═══════════════════════════════════════════════════════════════════════

    pub fn visible_banners(&self, device: Option<Device>) -> Vec<Banner> {
        let banners = self.banners();
        showcase::visible_banners(&banners, self.now_ms(), device)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn popups_to_show(&self, device: Option<Device>) -> Vec<Popup> {
        let popups = self.popup_config();
        showcase::popups_to_show(&popups, &self.tracker, self.now_ms(), device)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn active_slots(&self) -> Vec<Slot> {
        let slots = self.slots();
        showcase::active_slots(&slots, self.now_ms())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn ordered_tags<'a, T: Slugged>(&self, all_tags: &'a [T]) -> Vec<&'a T> {
        showcase::ordered_tags(all_tags, &self.tag_display(), &self.config)
    }

    pub fn mixed_feed<T, K, F>(&self, primary: Vec<T>, secondary: Vec<T>, key: F) -> Vec<T>
    where
        K: Eq + Hash,
        F: Fn(&T) -> K,
    {
        showcase::mixed_feed(primary, secondary, &self.config, key)
    }

    /// "Do not show again" for a configured popup, for as long as that
    /// popup's `dismissDays` says.
    pub fn dismiss_popup(&self, popup_id: &str) -> CfgResult<Dismissal> {
        let popups = self.popup_config();
        let popup = popups
            .items
            .iter()
            .find(|p| p.id == popup_id)
            .ok_or_else(|| CfgError::InvalidArgument(format!("unknown popup '{popup_id}'")))?;
        Ok(self.tracker.dismiss(popup_id, popup.dismiss_days as i64)?)
    }
}
