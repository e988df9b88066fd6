//! Change notification for cached configuration
//!
//! Every successful cache write publishes a [`ChangeEvent`]. Consumers either
//! register a synchronous handler for one kind (or all kinds), or take a
//! `tokio::sync::broadcast` receiver and await events.
//!
//! ```text
//! ┌──────────────┐ publish(kind, origin) ┌────────────────────────────┐
//! │  LocalCache  │──────────────────────►│  Notifier                   │
//! └──────────────┘                       │  ├── handlers (per kind)    │
//!   external_change(key) ───────────────►│  └── broadcast::Sender      │
//!                                        └────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::ConfigKind;

/// Default capacity for the event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Who wrote the value that changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A writer in this process
    Local,
    /// Another process or window sharing the same store
    External,
}

impl fmt::Display for ChangeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOrigin::Local => write!(f, "local"),
            ChangeOrigin::External => write!(f, "external"),
        }
    }
}

/// A cached configuration kind changed; readers should re-read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ConfigKind,
    pub origin: ChangeOrigin,
}

type Handler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

struct Registration {
    /// `None` listens to every kind
    kind: Option<ConfigKind>,
    handler: Handler,
}

struct Inner {
    next_id: AtomicU64,
    handlers: Mutex<BTreeMap<u64, Registration>>,
    event_tx: broadcast::Sender<ChangeEvent>,
}

/// Publish/subscribe hub for cache changes. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("handlers", &self.inner.handlers.lock().len())
            .field("receivers", &self.inner.event_tx.receiver_count())
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(0),
                handlers: Mutex::new(BTreeMap::new()),
                event_tx,
            }),
        }
    }

    /// Call `handler` whenever `kind` changes.
    pub fn subscribe<F>(&self, kind: ConfigKind, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(handler))
    }

    /// Call `handler` whenever any kind changes.
    pub fn subscribe_all<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(handler))
    }

    /// Receiver for async consumers; sees every event published after this call.
    pub fn receiver(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Notify every interested handler and receiver.
    pub fn publish(&self, kind: ConfigKind, origin: ChangeOrigin) {
        let event = ChangeEvent { kind, origin };

        // Handlers run outside the lock so they may subscribe or unsubscribe.
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .lock()
            .values()
            .filter(|r| r.kind.map_or(true, |k| k == kind))
            .map(|r| r.handler.clone())
            .collect();

        debug!(%kind, %origin, handlers = handlers.len(), "Publishing config change");
        for handler in handlers {
            handler(&event);
        }

        // No receivers is fine
        let _ = self.inner.event_tx.send(event);
    }

    /// Number of live handler subscriptions
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }

    fn register(&self, kind: Option<ConfigKind>, handler: Handler) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .insert(id, Registration { kind, handler });
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Keeps a handler registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    inner: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handlers.lock().remove(&self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move |_: &ChangeEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_handlers_filter_by_kind() {
        let notifier = Notifier::new();
        let (banners, on_banners) = counter();
        let (all, on_all) = counter();
        let _s1 = notifier.subscribe(ConfigKind::Banners, on_banners);
        let _s2 = notifier.subscribe_all(on_all);

        notifier.publish(ConfigKind::Banners, ChangeOrigin::Local);
        notifier.publish(ConfigKind::Popups, ChangeOrigin::External);

        assert_eq!(banners.load(Ordering::SeqCst), 1);
        assert_eq!(all.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let notifier = Notifier::new();
        let (count, handler) = counter();
        let sub = notifier.subscribe(ConfigKind::Slots, handler);
        assert_eq!(notifier.handler_count(), 1);

        sub.unsubscribe();
        assert_eq!(notifier.handler_count(), 0);

        notifier.publish(ConfigKind::Slots, ChangeOrigin::Local);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_subscribe_while_running() {
        let notifier = Notifier::new();
        let n = notifier.clone();
        let _sub = notifier.subscribe_all(move |_| {
            let _inner = n.subscribe(ConfigKind::Banners, |_| {});
        });
        notifier.publish(ConfigKind::TagDisplay, ChangeOrigin::Local);
        assert_eq!(notifier.handler_count(), 1);
    }

    #[tokio::test]
    async fn test_receiver_sees_events() {
        let notifier = Notifier::new();
        let mut rx = notifier.receiver();

        notifier.publish(ConfigKind::Popups, ChangeOrigin::External);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            ChangeEvent {
                kind: ConfigKind::Popups,
                origin: ChangeOrigin::External
            }
        );
    }
}
