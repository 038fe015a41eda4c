//! # tflog Framework
//!
//! Delivers parsed events to user handlers.
//!
//! - **Handlers**: async functions of shape `(Context, E)` where `E` is an
//!   event variant or [`Event`](tflog_core::Event) for every event
//! - **Subscriptions**: cancellable registrations held in a
//!   [`SubscriptionRegistry`]
//! - **Dispatch**: one Tokio task per handler, panics contained and reported
//! - **Engine**: [`LogHandler`], combining matching and dispatch
//!
//! ## Example
//!
//! ```rust,ignore
//! use tflog_framework::{Context, LogHandler};
//! use tflog_core::{ConnectEvent, MalformedFieldPolicy};
//!
//! async fn on_connect(ctx: Context, event: ConnectEvent) {
//!     tracing::info!(peer = %ctx.peer(), address = %event.address, "Player connected");
//! }
//!
//! let engine = LogHandler::with_catalog(MalformedFieldPolicy::default())?;
//! let _subscription = engine.subscribe(on_connect);
//! ```

pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod handler;
pub mod subscription;

pub use context::{Context, Origin};
pub use dispatcher::{Dispatcher, HandlerFailure};
pub use engine::LogHandler;
pub use error::{SubscribeError, SubscribeResult};
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, HandlerFn, into_handler};
pub use subscription::{Subscriber, Subscription, SubscriptionId, SubscriptionRegistry};
