//! # tflog
//!
//! Typed, concurrent handlers for the log stream a game server sends over UDP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  line  ┌─────────────────┐ event ┌────────────┐──▶ handler (own task)
//! │ UdpListener │───────▶│ MatcherRegistry │──────▶│ Dispatcher │──▶ handler (own task)
//! └─────────────┘        └─────────────────┘       └────────────┘──▶ handler (own task)
//! ```
//!
//! - **Runtime**: configuration, logging, the UDP listener and shutdown
//! - **Matchers**: ordered line recognizers; the first match produces the event
//! - **Handlers**: async functions taking a [`Context`](prelude::Context) and
//!   one event type, or [`Event`](prelude::Event) for every event
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tflog::prelude::*;
//!
//! async fn on_say(ctx: Context, say: SayEvent) {
//!     info!(peer = %ctx.peer(), "{}: {}", say.identity.name(), say.message);
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = LogRuntime::new()?;
//!     let _chat = runtime.log_handler().subscribe(on_say);
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: load `tflog.toml`
//! - `yaml-config`: load `tflog.yaml`
//! - `json-log`: JSON log output

pub use tflog_core as core;
pub use tflog_framework as framework;
pub use tflog_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use tflog::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use tflog_runtime::{LogRuntime, RuntimeBuilder, TflogConfig};

    // Engine and handlers
    pub use tflog_framework::{Context, HandlerFailure, LogHandler, Origin, Subscription};

    // Events
    pub use tflog_core::{
        ConnectEvent, DisconnectEvent, Event, EventKind, Identity, MalformedFieldPolicy,
        SayEvent, SubscriptionKey, Team,
    };

    // Custom matchers
    pub use tflog_core::{MatchOutput, Matcher, RegexMatcher};

    // Logging macros
    pub use tflog_runtime::prelude::*;
}
