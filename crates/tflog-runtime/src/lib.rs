//! tflog Runtime - ingestion and orchestration for the tflog engine.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`, `TflogConfig`)
//! - Logging setup (`LoggingBuilder`)
//! - Log datagram decoding and the UDP receive loop (`UdpListener`)
//! - Runtime orchestration with signal-driven shutdown (`LogRuntime`)
//!
//! ```ignore
//! use tflog_runtime::LogRuntime;
//! use tflog_framework::Context;
//! use tflog_core::SayEvent;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = LogRuntime::new()?;
//!
//!     let _chat = runtime.log_handler().subscribe(|_ctx: Context, say: SayEvent| async move {
//!         println!("{}: {}", say.identity.name(), say.message);
//!     });
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod datagram;
pub mod error;
pub mod listener;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, TflogConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use listener::UdpListener;
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{LogRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports.
///
/// Provides the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `instrument`
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
