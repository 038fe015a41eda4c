//! Handler subscriptions.
//!
//! The [`SubscriptionRegistry`] maps a [`SubscriptionKey`] to the handlers
//! registered under it. Registration returns a [`Subscription`] token that
//! cancels exactly that registration, even when the same handler was
//! registered several times.
//!
//! Dispatch never holds the registry lock while a handler runs: it takes a
//! [`snapshot`](SubscriptionRegistry::snapshot) under a read lock and works
//! from the copy. A subscription added or cancelled while an event is being
//! dispatched therefore takes effect from the next event on.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tflog_core::{Event, EventKind, FromEvent, SubscriptionKey};
use tracing::debug;

use crate::error::{SubscribeError, SubscribeResult};
use crate::handler::{BoxedHandler, Handler, into_handler};

/// Unique identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw identifier.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A handler as seen by dispatch.
#[derive(Clone)]
pub struct Subscriber {
    /// Registration this handler belongs to.
    pub id: SubscriptionId,
    /// Key it was registered under.
    pub key: SubscriptionKey,
    /// The handler itself.
    pub handler: BoxedHandler,
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

struct Entry {
    id: SubscriptionId,
    handler: BoxedHandler,
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    table: RwLock<HashMap<SubscriptionKey, Vec<Entry>>>,
}

impl RegistryInner {
    fn remove(&self, key: SubscriptionKey, id: SubscriptionId) -> bool {
        let mut table = self.table.write();
        let Some(entries) = table.get_mut(&key) else {
            return false;
        };
        let Some(position) = entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        entries.remove(position);
        if entries.is_empty() {
            table.remove(&key);
        }
        debug!(subscription = %id, key = %key, "Handler unsubscribed");
        true
    }
}

/// Thread-safe map from subscription key to handlers.
///
/// Cheap to clone; clones share the same table.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed handler under its event type's key.
    ///
    /// A handler taking [`Event`] is registered for every event.
    pub fn subscribe<E, H>(&self, handler: H) -> Subscription
    where
        E: FromEvent,
        H: Handler<E>,
    {
        self.insert(E::KEY, into_handler::<H, E>(handler))
    }

    /// Registers a handler receiving the whole [`Event`] under an event type
    /// name (`"*"` for every event).
    ///
    /// # Errors
    ///
    /// [`SubscribeError::UnknownEventType`] when `name` is neither the wildcard
    /// nor a known event kind. Nothing is registered in that case.
    pub fn subscribe_named<H>(&self, name: &str, handler: H) -> SubscribeResult<Subscription>
    where
        H: Handler<Event>,
    {
        let key = name
            .parse::<SubscriptionKey>()
            .map_err(|name| SubscribeError::UnknownEventType {
                name,
                known: EventKind::ALL.iter().map(|kind| kind.name()).collect(),
            })?;
        Ok(self.insert(key, into_handler::<H, Event>(handler)))
    }

    /// Registers an already erased handler under `key`.
    ///
    /// A handler taking [`Event`] may be registered under any key; a typed
    /// handler only under its own event kind.
    ///
    /// # Errors
    ///
    /// [`SubscribeError::KeyMismatch`] when the handler would never accept an
    /// event delivered under `key`. Nothing is registered in that case.
    pub fn subscribe_boxed(
        &self,
        key: SubscriptionKey,
        handler: BoxedHandler,
    ) -> SubscribeResult<Subscription> {
        let accepts = handler.key();
        if accepts != SubscriptionKey::Any && accepts != key {
            return Err(SubscribeError::KeyMismatch { key, accepts });
        }
        Ok(self.insert(key, handler))
    }

    fn insert(&self, key: SubscriptionKey, handler: BoxedHandler) -> Subscription {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.inner
            .table
            .write()
            .entry(key)
            .or_default()
            .push(Entry { id, handler });
        debug!(subscription = %id, key = %key, "Handler subscribed");

        Subscription {
            id,
            key,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Removes the registration identified by `subscription`.
    ///
    /// Returns `false` if it was already removed or was issued by another
    /// registry.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        if !std::ptr::eq(subscription.registry.as_ptr(), Arc::as_ptr(&self.inner)) {
            return false;
        }
        self.inner.remove(subscription.key, subscription.id)
    }

    /// Copies the handlers an event of `kind` is delivered to.
    ///
    /// Wildcard handlers come first, then handlers registered for `kind`,
    /// each group in registration order.
    pub fn snapshot(&self, kind: EventKind) -> Vec<Subscriber> {
        let guard = self.inner.table.read();
        let table: &HashMap<_, _> = &guard;
        [SubscriptionKey::Any, SubscriptionKey::Kind(kind)]
            .into_iter()
            .flat_map(move |key| {
                table.get(&key).into_iter().flatten().map(move |entry| Subscriber {
                    id: entry.id,
                    key,
                    handler: Arc::clone(&entry.handler),
                })
            })
            .collect()
    }

    /// Number of handlers registered under `key` alone.
    pub fn handler_count(&self, key: SubscriptionKey) -> usize {
        self.inner.table.read().get(&key).map_or(0, Vec::len)
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.inner.table.read().values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.inner.table.read();
        let counts: HashMap<String, usize> = table
            .iter()
            .map(|(key, entries)| (key.to_string(), entries.len()))
            .collect();
        f.debug_struct("SubscriptionRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

/// Token for one registration.
///
/// Dropping the token does not unsubscribe; call [`cancel`](Self::cancel).
#[must_use = "a subscription can only be cancelled through its token"]
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    key: SubscriptionKey,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    /// Identifier of this registration.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Key the handler was registered under.
    pub fn key(&self) -> SubscriptionKey {
        self.key
    }

    /// Removes the registration from the registry that issued this token.
    ///
    /// Idempotent: returns `true` only for the call that removed it.
    pub fn cancel(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.key, self.id))
    }

    /// Returns `true` while the registration is in place.
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            registry
                .table
                .read()
                .get(&self.key)
                .is_some_and(|entries| entries.iter().any(|entry| entry.id == self.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use tflog_core::{ConnectEvent, SayEvent};

    async fn on_say(_ctx: Context, _event: SayEvent) {}
    async fn on_connect(_ctx: Context, _event: ConnectEvent) {}
    async fn on_any(_ctx: Context, _event: Event) {}

    #[test]
    fn test_typed_subscribe_uses_event_key() {
        let registry = SubscriptionRegistry::new();
        let say = registry.subscribe(on_say);
        let any = registry.subscribe(on_any);

        assert_eq!(say.key(), SubscriptionKey::Kind(EventKind::Say));
        assert_eq!(any.key(), SubscriptionKey::Any);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_snapshot_orders_wildcard_first() {
        let registry = SubscriptionRegistry::new();
        let say = registry.subscribe(on_say);
        let any = registry.subscribe(on_any);
        let _connect = registry.subscribe(on_connect);

        let ids: Vec<_> = registry
            .snapshot(EventKind::Say)
            .into_iter()
            .map(|subscriber| subscriber.id)
            .collect();
        assert_eq!(ids, vec![any.id(), say.id()]);
        assert_eq!(registry.snapshot(EventKind::Disconnect).len(), 1);
    }

    #[test]
    fn test_same_handler_registered_twice() {
        let registry = SubscriptionRegistry::new();
        let first = registry.subscribe(on_say);
        let second = registry.subscribe(on_say);
        assert_ne!(first.id(), second.id());
        assert_eq!(registry.handler_count(first.key()), 2);

        assert!(first.cancel());
        assert!(!first.is_active());
        assert!(second.is_active());
        assert_eq!(registry.handler_count(second.key()), 1);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry.subscribe(on_connect);

        assert!(registry.unsubscribe(&subscription));
        assert!(!registry.unsubscribe(&subscription));
        assert!(!subscription.cancel());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_foreign_token_is_ignored() {
        let first = SubscriptionRegistry::new();
        let second = SubscriptionRegistry::new();
        let mine = first.subscribe(on_say);
        let theirs = second.subscribe(on_say);
        assert_eq!(mine.id(), theirs.id());

        assert!(!first.unsubscribe(&theirs));
        assert!(mine.is_active());
        assert!(theirs.is_active());
    }

    #[test]
    fn test_cancel_after_registry_dropped() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry.subscribe(on_connect);
        drop(registry);
        assert!(!subscription.cancel());
    }

    #[test]
    fn test_subscribe_named() {
        let registry = SubscriptionRegistry::new();
        let all = registry.subscribe_named("*", on_any).unwrap();
        let say = registry.subscribe_named("Say", on_any).unwrap();
        assert_eq!(all.key(), SubscriptionKey::Any);
        assert_eq!(say.key(), SubscriptionKey::Kind(EventKind::Say));

        let err = registry.subscribe_named("kill", on_any).unwrap_err();
        assert!(matches!(
            err,
            SubscribeError::UnknownEventType { ref name, .. } if name == "kill"
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_subscribe_boxed_checks_handler_key() {
        let registry = SubscriptionRegistry::new();
        let say = SubscriptionKey::Kind(EventKind::Say);

        let err = registry
            .subscribe_boxed(say, into_handler(on_connect))
            .unwrap_err();
        assert_eq!(
            err,
            SubscribeError::KeyMismatch {
                key: say,
                accepts: SubscriptionKey::Kind(EventKind::Connect),
            }
        );
        assert!(
            registry
                .subscribe_boxed(SubscriptionKey::Any, into_handler(on_say))
                .is_err()
        );
        assert!(registry.is_empty());

        let typed = registry.subscribe_boxed(say, into_handler(on_say)).unwrap();
        let any = registry.subscribe_boxed(say, into_handler(on_any)).unwrap();
        assert!(typed.is_active());
        assert_eq!(any.key(), say);
        assert_eq!(registry.snapshot(EventKind::Say).len(), 2);
    }

    #[test]
    fn test_concurrent_subscribe_and_cancel() {
        let registry = SubscriptionRegistry::new();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let subscription = registry.subscribe(on_say);
                        let _ = registry.snapshot(EventKind::Say);
                        assert!(subscription.cancel());
                    }
                    registry.subscribe(on_any)
                })
            })
            .collect();

        let kept: Vec<_> = threads
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(registry.len(), kept.len());
        assert_eq!(registry.handler_count(SubscriptionKey::Kind(EventKind::Say)), 0);
    }
}
