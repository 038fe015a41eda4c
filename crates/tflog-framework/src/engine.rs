//! The log handler engine.
//!
//! [`LogHandler`] is the single entry point the listener feeds lines into.
//! It owns:
//!
//! - the ordered [`MatcherRegistry`] that turns a line into an [`Event`]
//! - the [`SubscriptionRegistry`] mapping event kinds to handlers
//! - the [`Dispatcher`] running handlers concurrently
//!
//! ```text
//! line ──▶ try_parse ──▶ Some(event) ──▶ dispatch ──▶ handler task
//!                                                 ├─▶ handler task
//!                                                 └─▶ handler task
//! ```
//!
//! The engine is cheap to clone and every clone drives the same state, so the
//! listener, handlers (through [`Context::log_handler`]) and the embedding
//! application can all hold one.
//!
//! A handler should reach the engine through its [`Context`] rather than
//! capture a clone: a captured clone is owned by the registry it lives in and
//! keeps the engine alive until the handler is unsubscribed.
//!
//! # Example
//!
//! ```rust,ignore
//! use tflog_framework::{Context, LogHandler, Origin};
//! use tflog_core::{MalformedFieldPolicy, SayEvent};
//!
//! let engine = LogHandler::with_catalog(MalformedFieldPolicy::default())?;
//! let chat = engine.subscribe(|_ctx: Context, say: SayEvent| async move {
//!     println!("{}: {}", say.identity.name(), say.message);
//! });
//!
//! engine.on_line(origin, r#""Alice<23><STEAM_0:1:111><Red>" say "gg""#)?;
//! chat.cancel();
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tflog_core::{
    Event, EventKind, FromEvent, MalformedFieldPolicy, Matcher, MatcherRegistry, MatcherResult,
    ParseResult,
};
use tokio::sync::broadcast;
use tracing::trace;

use crate::context::{Context, Origin};
use crate::dispatcher::{Dispatcher, HandlerFailure};
use crate::error::SubscribeResult;
use crate::handler::Handler;
use crate::subscription::{Subscription, SubscriptionRegistry};

struct LogHandlerInner {
    matchers: RwLock<MatcherRegistry>,
    subscriptions: SubscriptionRegistry,
    dispatcher: Dispatcher,
}

/// Parses log lines and delivers the resulting events to handlers.
#[derive(Clone)]
pub struct LogHandler {
    inner: Arc<LogHandlerInner>,
}

impl LogHandler {
    /// Creates an engine with no matchers.
    pub fn new(policy: MalformedFieldPolicy) -> Self {
        Self::from_registry(MatcherRegistry::new(policy))
    }

    /// Creates an engine with the built-in connect, disconnect and say matchers.
    pub fn with_catalog(policy: MalformedFieldPolicy) -> MatcherResult<Self> {
        MatcherRegistry::with_catalog(policy).map(Self::from_registry)
    }

    /// Creates an engine around an existing matcher registry.
    pub fn from_registry(matchers: MatcherRegistry) -> Self {
        Self {
            inner: Arc::new(LogHandlerInner {
                matchers: RwLock::new(matchers),
                subscriptions: SubscriptionRegistry::new(),
                dispatcher: Dispatcher::new(),
            }),
        }
    }

    // =========================================================================
    // Matching
    // =========================================================================

    /// Appends a matcher after every matcher already registered.
    pub fn register_matcher<M>(&self, matcher: M)
    where
        M: Matcher + 'static,
    {
        self.inner.matchers.write().register(matcher);
    }

    /// Number of registered matchers.
    pub fn matcher_count(&self) -> usize {
        self.inner.matchers.read().len()
    }

    /// Converts a line into an event without dispatching it.
    ///
    /// See [`MatcherRegistry::try_parse`].
    pub fn try_parse(&self, line: &str) -> ParseResult<Option<Event>> {
        self.inner.matchers.read().try_parse(line)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Delivers `event` to every handler subscribed to its kind and to every
    /// wildcard handler. Returns the number of handler tasks scheduled.
    ///
    /// Handlers run concurrently and are not awaited. Subscriptions changed
    /// while this call runs take effect from the next event on.
    pub fn dispatch(&self, origin: Origin, event: &Event) -> usize {
        let ctx = Context::new(self.clone(), origin);
        self.inner
            .dispatcher
            .dispatch(&self.inner.subscriptions, ctx, event)
    }

    /// Parses one line and dispatches the event it produces.
    ///
    /// Returns the kind of the dispatched event, or `None` when no matcher
    /// recognized the line. Unrecognized lines are dropped silently.
    ///
    /// # Errors
    ///
    /// Propagates [`ParseError`](tflog_core::ParseError) from
    /// [`try_parse`](Self::try_parse); nothing is dispatched in that case.
    pub fn on_line(&self, origin: Origin, line: &str) -> ParseResult<Option<EventKind>> {
        let Some(event) = self.try_parse(line)? else {
            trace!(peer = %origin, "Line not recognized");
            return Ok(None);
        };
        self.dispatch(origin, &event);
        Ok(Some(event.kind()))
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Registers a handler for the event type it takes.
    ///
    /// ```rust,ignore
    /// engine.subscribe(|ctx: Context, event: ConnectEvent| async move { /* ... */ });
    /// engine.subscribe(|ctx: Context, event: Event| async move { /* every event */ });
    /// ```
    pub fn subscribe<E, H>(&self, handler: H) -> Subscription
    where
        E: FromEvent,
        H: Handler<E>,
    {
        self.inner.subscriptions.subscribe::<E, H>(handler)
    }

    /// Registers a handler for the event type called `name`, or for every
    /// event when `name` is `"*"`.
    pub fn subscribe_named<H>(&self, name: &str, handler: H) -> SubscribeResult<Subscription>
    where
        H: Handler<Event>,
    {
        self.inner.subscriptions.subscribe_named(name, handler)
    }

    /// Cancels a registration. Returns `false` if it was already cancelled.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.inner.subscriptions.unsubscribe(subscription)
    }

    /// The subscription registry.
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.inner.subscriptions
    }

    /// Total number of registered handlers.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.len()
    }

    /// Subscribes to handler failures reported from now on.
    pub fn failures(&self) -> broadcast::Receiver<HandlerFailure> {
        self.inner.dispatcher.failures()
    }
}

impl std::fmt::Debug for LogHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandler")
            .field("matchers", &*self.inner.matchers.read())
            .field("subscriptions", &self.inner.subscriptions)
            .finish()
    }
}
