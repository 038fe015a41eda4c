//! Handler system for the tflog framework.
//!
//! A handler is an async function or closure taking a [`Context`] and one
//! event type:
//!
//! ```rust,ignore
//! use tflog_framework::Context;
//! use tflog_core::{Event, SayEvent};
//!
//! // Receives only say lines
//! async fn on_say(ctx: Context, event: SayEvent) {
//!     println!("[{}] {}: {}", ctx.peer(), event.identity.name(), event.message);
//! }
//!
//! // Receives every event (the wildcard)
//! async fn on_any(_ctx: Context, event: Event) {
//!     println!("{:?}", event.kind());
//! }
//! ```
//!
//! The event parameter's [`FromEvent`] implementation decides where the
//! handler is registered, so a handler for a type that is not an event does
//! not compile.
//!
//! Handlers are stored type-erased as [`BoxedHandler`] so handlers for
//! different event types can share one registry.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use tflog_core::{Event, FromEvent, SubscriptionKey};

use crate::context::Context;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for event handlers.
///
/// Automatically implemented for async functions and closures of shape
/// `Fn(Context, E) -> impl Future<Output = ()>` where `E: FromEvent`.
pub trait Handler<E>: Clone + Send + Sync + 'static {
    /// The type of future calling this handler returns.
    type Future: Future<Output = ()> + Send + 'static;

    /// Call the handler with the given context and event.
    fn call(self, ctx: Context, event: E) -> Self::Future;
}

impl<F, Fut, E> Handler<E> for F
where
    F: FnOnce(Context, E) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
    E: FromEvent,
{
    type Future = Fut;

    fn call(self, ctx: Context, event: E) -> Self::Future {
        (self)(ctx, event)
    }
}

// ============================================================================
// Type Erasure
// ============================================================================

/// A wrapper pairing a handler with the event type it accepts.
pub struct HandlerFn<F, E> {
    f: F,
    _marker: PhantomData<fn() -> E>,
}

impl<F, E> HandlerFn<F, E> {
    /// Creates a new handler function wrapper.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F: Clone, E> Clone for HandlerFn<F, E> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

/// Type-erased handler trait for dynamic dispatch.
pub trait ErasedHandler: Send + Sync {
    /// Key of the events this handler accepts.
    fn key(&self) -> SubscriptionKey;

    /// Prepares an invocation for `event`.
    ///
    /// Returns `None` when the event is not of the handler's type. The
    /// handler body does not run until the returned future is polled.
    fn call(&self, ctx: Context, event: &Event) -> Option<BoxFuture<'static, ()>>;
}

impl<F, E> ErasedHandler for HandlerFn<F, E>
where
    F: Handler<E>,
    E: FromEvent,
{
    fn key(&self) -> SubscriptionKey {
        E::KEY
    }

    fn call(&self, ctx: Context, event: &Event) -> Option<BoxFuture<'static, ()>> {
        let event = E::from_event(event)?;
        let f = self.f.clone();
        Some(Box::pin(async move {
            f.call(ctx, event).await;
        }))
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, E>(f: F) -> BoxedHandler
where
    F: Handler<E>,
    E: FromEvent,
{
    Arc::new(HandlerFn::new(f))
}
