//! Concurrent event dispatch.
//!
//! Each handler an event is delivered to runs as its own Tokio task, so a
//! slow or blocked handler never holds up the others or the listener that
//! produced the event. A handler that panics is contained in its task: the
//! panic is logged and published as a [`HandlerFailure`] on the failure
//! channel, and every other handler still runs.
//!
//! [`Dispatcher::dispatch`] returns once the handlers are scheduled. It does
//! not wait for them to finish and makes no ordering promise between them.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tflog_core::{Event, EventKind, SubscriptionKey};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{Instrument, Level, debug, error, span, trace, warn};

use crate::context::Context;
use crate::handler::BoxFuture;
use crate::subscription::{SubscriptionId, SubscriptionRegistry};

/// Failures buffered per receiver before the oldest are dropped.
const FAILURE_CHANNEL_CAPACITY: usize = 64;

/// A handler panicked while processing an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Registration of the handler that failed.
    pub subscription: SubscriptionId,
    /// Key it was registered under.
    pub key: SubscriptionKey,
    /// Kind of the event being processed.
    pub event: EventKind,
    /// Panic message, when the payload was a string.
    pub message: String,
}

/// Spawns handler tasks and reports their failures.
#[derive(Clone)]
pub struct Dispatcher {
    failures: broadcast::Sender<HandlerFailure>,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty failure channel.
    pub fn new() -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self { failures }
    }

    /// Subscribes to handler failures reported from now on.
    pub fn failures(&self) -> broadcast::Receiver<HandlerFailure> {
        self.failures.subscribe()
    }

    /// Delivers `event` to every handler registered for its kind or for the
    /// wildcard, each on its own task.
    ///
    /// Returns the number of handler tasks scheduled. Called outside a Tokio
    /// runtime nothing is scheduled and 0 is returned.
    pub fn dispatch(&self, registry: &SubscriptionRegistry, ctx: Context, event: &Event) -> usize {
        let kind = event.kind();
        let span = span!(Level::DEBUG, "dispatch", event = %kind, peer = %ctx.peer());
        let _enter = span.enter();

        let subscribers = registry.snapshot(kind);
        if subscribers.is_empty() {
            trace!("No handlers subscribed");
            return 0;
        }

        let Ok(runtime) = Handle::try_current() else {
            error!(handlers = subscribers.len(), "Dispatch outside of a Tokio runtime, event dropped");
            return 0;
        };

        let mut scheduled = 0;
        for subscriber in subscribers {
            let Some(task) = subscriber.handler.call(ctx.clone(), event) else {
                warn!(
                    subscription = %subscriber.id,
                    key = %subscriber.key,
                    accepts = %subscriber.handler.key(),
                    "Handler does not accept this event, skipped"
                );
                continue;
            };
            let supervised = supervise(
                subscriber.id,
                subscriber.key,
                kind,
                task,
                self.failures.clone(),
            );
            runtime.spawn(supervised.instrument(span.clone()));
            scheduled += 1;
        }

        debug!(handlers = scheduled, "Event dispatched");
        scheduled
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("failure_receivers", &self.failures.receiver_count())
            .finish()
    }
}

async fn supervise(
    subscription: SubscriptionId,
    key: SubscriptionKey,
    event: EventKind,
    task: BoxFuture<'static, ()>,
    failures: broadcast::Sender<HandlerFailure>,
) {
    let Err(payload) = AssertUnwindSafe(task).catch_unwind().await else {
        return;
    };

    let message = panic_message(payload.as_ref());
    error!(
        subscription = %subscription,
        key = %key,
        panic = %message,
        "Handler panicked"
    );
    // No receivers is fine; the failure is already logged.
    let _ = failures.send(HandlerFailure {
        subscription,
        key,
        event,
        message,
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Origin;
    use crate::engine::LogHandler;
    use crate::handler::ErasedHandler;
    use std::sync::Arc;
    use tflog_core::{Identity, MalformedFieldPolicy, SayEvent, Team};

    /// Claims say events but accepts none of them.
    struct Refusing;

    impl ErasedHandler for Refusing {
        fn key(&self) -> SubscriptionKey {
            SubscriptionKey::Kind(EventKind::Say)
        }

        fn call(&self, _ctx: Context, _event: &Event) -> Option<BoxFuture<'static, ()>> {
            None
        }
    }

    fn say() -> Event {
        Event::Say(SayEvent {
            identity: Identity::new("Alice", 23, "STEAM_0:1:111", Team::Red),
            message: "gg".to_string(),
        })
    }

    #[tokio::test]
    async fn test_refused_event_is_not_scheduled() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry
            .subscribe_boxed(SubscriptionKey::Kind(EventKind::Say), Arc::new(Refusing))
            .unwrap();
        let ctx = Context::new(
            LogHandler::new(MalformedFieldPolicy::default()),
            Origin::new(([10, 0, 0, 7], 27015).into()),
        );

        assert_eq!(Dispatcher::new().dispatch(&registry, ctx, &say()), 0);
        assert!(subscription.is_active());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(format!("boom {}", 2));
        assert_eq!(panic_message(payload.as_ref()), "boom 2");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
