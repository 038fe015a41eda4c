//! Error types for the tflog framework.

use thiserror::Error;
use tflog_core::SubscriptionKey;

/// Errors raised when registering a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    /// The requested event type is neither the wildcard nor a known kind.
    #[error("unknown event type '{name}', expected '*' or one of {known:?}")]
    UnknownEventType {
        /// The name that was requested.
        name: String,
        /// Known event kind names.
        known: Vec<&'static str>,
    },

    /// The handler never accepts events delivered under the requested key.
    #[error("handler for '{accepts}' events cannot be registered under '{key}'")]
    KeyMismatch {
        /// The key that was requested.
        key: SubscriptionKey,
        /// The key the handler accepts.
        accepts: SubscriptionKey,
    },
}

/// Result type for subscription operations.
pub type SubscribeResult<T> = Result<T, SubscribeError>;
