//! Handler context.
//!
//! Every handler invocation receives a [`Context`] next to its event. The
//! context carries the [`Origin`] of the datagram the event was parsed from
//! and a handle to the [`LogHandler`] that dispatched it, so a handler can
//! add or cancel subscriptions while it runs:
//!
//! ```rust,ignore
//! engine.subscribe(|ctx: Context, event: DisconnectEvent| async move {
//!     info!(peer = %ctx.peer(), player = event.identity.name(), "Player left");
//!     ctx.log_handler().subscription_count();
//! });
//! ```

use std::fmt;
use std::net::SocketAddr;

use crate::engine::LogHandler;

/// Where a log line came from.
///
/// The engine never inspects it; it is handed to handlers unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Origin {
    peer: SocketAddr,
}

impl Origin {
    /// Creates an origin for a datagram sent by `peer`.
    pub fn new(peer: SocketAddr) -> Self {
        Self { peer }
    }

    /// Address of the game server that sent the line.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl From<SocketAddr> for Origin {
    fn from(peer: SocketAddr) -> Self {
        Self::new(peer)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.peer.fmt(f)
    }
}

/// The context handed to every handler invocation.
#[derive(Clone)]
pub struct Context {
    log_handler: LogHandler,
    origin: Origin,
}

impl Context {
    pub(crate) fn new(log_handler: LogHandler, origin: Origin) -> Self {
        Self {
            log_handler,
            origin,
        }
    }

    /// The engine that dispatched this event.
    pub fn log_handler(&self) -> &LogHandler {
        &self.log_handler
    }

    /// Origin of the line this event was parsed from.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Shorthand for `self.origin().peer()`.
    pub fn peer(&self) -> SocketAddr {
        self.origin.peer
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
