//! The remote source of truth
//!
//! One logical resource per configuration kind, each with `GET` (current
//! value) and `PUT` (replace, answering with the canonical echo) semantics.
//! The engine never looks behind this trait; transports live with the host
//! application.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::error::RemoteError;
use crate::types::ConfigKind;

/// Remote configuration store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Current value of `kind`
    async fn fetch(&self, kind: ConfigKind) -> Result<Value, RemoteError>;

    /// Replace `kind` with `payload`; returns the value as the remote stored it.
    async fn store(&self, kind: ConfigKind, payload: Value) -> Result<Value, RemoteError>;
}

type SharedFetch = Shared<BoxFuture<'static, Result<Value, RemoteError>>>;

/// Collapses concurrent fetches of the same kind into one request.
///
/// Callers that arrive while a fetch is in flight await the same future and
/// receive a clone of its result. The entry is cleared once it resolves, so
/// a later call always goes back to the remote.
pub struct DedupRemote {
    inner: Arc<dyn RemoteStore>,
    in_flight: Mutex<HashMap<ConfigKind, SharedFetch>>,
}

impl DedupRemote {
    pub fn new(inner: Arc<dyn RemoteStore>) -> Self {
        Self {
            inner,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &Arc<dyn RemoteStore> {
        &self.inner
    }

    pub async fn fetch(&self, kind: ConfigKind) -> Result<Value, RemoteError> {
        let fetch = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(&kind) {
                Some(existing) => {
                    debug!(%kind, "Joining in-flight fetch");
                    existing.clone()
                }
                None => {
                    let remote = self.inner.clone();
                    let fetch = async move { remote.fetch(kind).await }.boxed().shared();
                    in_flight.insert(kind, fetch.clone());
                    fetch
                }
            }
        };

        let result = fetch.clone().await;

        let mut in_flight = self.in_flight.lock();
        if in_flight
            .get(&kind)
            .is_some_and(|current| current.ptr_eq(&fetch))
        {
            in_flight.remove(&kind);
        }
        result
    }

    pub async fn store(&self, kind: ConfigKind, payload: Value) -> Result<Value, RemoteError> {
        self.inner.store(kind, payload).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
// In-memory remote
// ═══════════════════════════════════════════════════════════════════════

/// In-process remote with failure injection, for tests and offline use.
///
/// Unset kinds answer with JSON `null`, which normalizes to the kind's
/// shipped default, like a freshly deployed server.
#[derive(Default)]
pub struct MemoryRemote {
    values: Mutex<HashMap<ConfigKind, Value>>,
    fail_fetch: AtomicBool,
    fail_store: AtomicBool,
    reject_store: Mutex<Option<(u16, String)>>,
    fetch_count: AtomicUsize,
    store_count: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting as a store.
    pub fn seed(&self, kind: ConfigKind, value: Value) {
        self.values.lock().insert(kind, value);
    }

    pub fn value(&self, kind: ConfigKind) -> Option<Value> {
        self.values.lock().get(&kind).cloned()
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_store(&self, fail: bool) {
        self.fail_store.store(fail, Ordering::SeqCst);
    }

    /// Answer stores with a refusal, like a server returning an error status.
    pub fn set_reject_store(&self, rejection: Option<(u16, &str)>) {
        *self.reject_store.lock() = rejection.map(|(status, message)| (status, message.to_string()));
    }

    /// Delay every request, to keep fetches in flight.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn store_count(&self) -> usize {
        self.store_count.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch(&self, kind: ConfigKind) -> Result<Value, RemoteError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected fetch failure".to_string()));
        }
        Ok(self.value(kind).unwrap_or(Value::Null))
    }

    async fn store(&self, kind: ConfigKind, payload: Value) -> Result<Value, RemoteError> {
        self.store_count.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected store failure".to_string()));
        }
        let rejection = self.reject_store.lock().clone();
        if let Some((status, message)) = rejection {
            return Err(RemoteError::Rejected { status, message });
        }
        self.values.lock().insert(kind, payload.clone());
        Ok(payload)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Directory-backed remote
// ═══════════════════════════════════════════════════════════════════════

/// A remote kept as one `<kind>.json` file per kind in a directory.
///
/// Lets several CLI invocations share a source of truth without a server.
#[derive(Debug, Clone)]
pub struct FsRemote {
    dir: PathBuf,
}

impl FsRemote {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, kind: ConfigKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.as_str()))
    }
}

#[async_trait]
impl RemoteStore for FsRemote {
    async fn fetch(&self, kind: ConfigKind) -> Result<Value, RemoteError> {
        let path = self.path_for(kind);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                serde_json::from_str(&text).map_err(|e| RemoteError::Malformed(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Value::Null),
            Err(e) => Err(RemoteError::Unavailable(format!("{}: {e}", path.display()))),
        }
    }

    async fn store(&self, kind: ConfigKind, payload: Value) -> Result<Value, RemoteError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        let text = serde_json::to_string_pretty(&payload)
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        let path = self.path_for(kind);
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| RemoteError::Unavailable(format!("{}: {e}", path.display())))?;
        Ok(payload)
    }
}
