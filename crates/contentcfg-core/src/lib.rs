//! Content Configuration Engine Core Library
//!
//! Banners, popups, curated content slots and tag ordering for a home
//! surface, kept in a local cache and reconciled against a remote source of
//! truth.
//!
//! ## Overview
//!
//! Configuration arrives from admins, from the remote store and from whatever
//! an older build left in the local cache. All of it passes through
//! [`sanitize`] and comes out canonical. [`reconcile`] decides what the
//! cache holds; [`showcase`] derives what a viewer actually sees at a given
//! instant on a given device.
//!
//! ## Core Principles
//!
//! - **Never lose an admin edit**: a remote that looks unconfigured does not
//!   overwrite local work, and a failed save still lands in the cache
//! - **Never crash on input**: unknown fields are dropped, bad fields take
//!   defaults, bad JSON reads as the shipped default
//! - **Explicit outcomes**: loads and saves report what happened instead of
//!   failing
//!
//! ## Quick Start
//!
//! ```ignore
//! use contentcfg_core::{ContentEngine, EngineConfig, FsRemote};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let remote = Arc::new(FsRemote::new("/srv/contentcfg"));
//!     let engine = ContentEngine::open("~/.contentcfg/data", remote, EngineConfig::default())?;
//!
//!     engine.load_all().await;
//!     for popup in engine.popups_to_show(None) {
//!         println!("{}", popup.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod activation;
pub mod cache;
pub mod clock;
pub mod config;
pub mod dismissal;
pub mod draft;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod notify;
pub mod ordering;
pub mod reconcile;
pub mod remote;
pub mod sanitize;
pub mod showcase;
pub mod storage;
pub mod types;
pub mod validation;

// Re-exports
pub use cache::LocalCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use dismissal::{Dismissal, DismissalTracker};
pub use engine::ContentEngine;
pub use error::{CfgError, CfgResult, RemoteError, StorageError, ValidationError};
pub use mixer::{MixPattern, Source};
pub use notify::{ChangeEvent, ChangeOrigin, Notifier, Subscription};
pub use reconcile::{LoadOutcome, ReconciliationService, SaveOutcome, SyncState};
pub use remote::{DedupRemote, FsRemote, MemoryRemote, RemoteStore};
pub use storage::{KvStore, MemoryStore, RedbStore};
pub use types::{
    Banner, CanonicalConfig, ConfigKind, ConfigRecord, Device, DisplayOn, Popup, PopupConfig,
    Slot, Tag, TagDisplayConfig, Timestamp,
};
