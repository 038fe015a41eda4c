//! Runtime orchestration.
//!
//! [`LogRuntime`] ties configuration, logging, the [`LogHandler`] engine and
//! the [`UdpListener`] together.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tflog_runtime::LogRuntime;
//!
//! // Auto-loads tflog.toml from the current directory
//! let runtime = LogRuntime::new()?;
//!
//! // Custom configuration path
//! let runtime = LogRuntime::builder()
//!     .config_file("config/tflog.toml")
//!     .build()?;
//!
//! runtime.log_handler().subscribe(on_say);
//! runtime.run().await?;
//! ```

use std::future::Future;

use tflog_framework::LogHandler;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{ConfigLoader, TflogConfig};
use crate::error::RuntimeResult;
use crate::listener::UdpListener;
use crate::logging;

/// The tflog runtime: one engine fed by one UDP listener.
pub struct LogRuntime {
    config: TflogConfig,
    engine: LogHandler,
    shutdown: CancellationToken,
}

impl LogRuntime {
    /// Creates a runtime from `tflog.toml` in the current directory and
    /// `TFLOG_*` variables.
    ///
    /// A configuration that fails to load is reported and replaced by the
    /// defaults.
    pub fn new() -> RuntimeResult<Self> {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                TflogConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration.
    ///
    /// Initializes logging (unless a subscriber is already installed) and
    /// builds the engine with the built-in matchers and the configured
    /// malformed-field policy.
    pub fn from_config(config: &TflogConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);

        let engine = LogHandler::with_catalog(config.parser.malformed_fields)?;

        info!(
            listen = %config.listener.bind_addr(),
            malformed_fields = ?config.parser.malformed_fields,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            engine,
            shutdown: CancellationToken::new(),
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &TflogConfig {
        &self.config
    }

    /// The engine. Subscribe handlers and register matchers through it.
    pub fn log_handler(&self) -> &LogHandler {
        &self.engine
    }

    /// Binds the configured UDP socket without starting to receive.
    pub async fn bind(&self) -> RuntimeResult<UdpListener> {
        UdpListener::bind(&self.config.listener).await
    }

    /// Runs until Ctrl+C, SIGTERM or [`shutdown`](Self::shutdown).
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("tflog runtime is now running. Press Ctrl+C to stop.");
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes or [`shutdown`](Self::shutdown) is
    /// called.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Receives on an already bound listener until `shutdown` completes or
    /// [`shutdown`](Self::shutdown) is called.
    pub async fn serve<F>(&self, listener: UdpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let token = self.shutdown.child_token();
        let receive = listener.run(self.engine.clone(), token.clone());
        let stop = async {
            tokio::select! {
                _ = shutdown => {}
                _ = token.cancelled() => {}
            }
            token.cancel();
        };

        tokio::join!(receive, stop);
        info!("Runtime stopped");
    }

    /// Stops every running listener of this runtime.
    ///
    /// Handler tasks already spawned run to completion. The runtime cannot be
    /// restarted afterwards; later runs return immediately.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for LogRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRuntime")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("stopped", &self.shutdown.is_cancelled())
            .finish()
    }
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`LogRuntime`] with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = LogRuntime::builder()
///     .config_file("config/tflog.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: TflogConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<LogRuntime> {
        let config = self.config_loader.load()?;
        LogRuntime::from_config(&config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
