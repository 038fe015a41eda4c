//! Configuration module for the tflog runtime.
//!
//! Settings for the UDP listener, the line parser and logging, loaded from
//! files and `TFLOG_*` environment variables by [`ConfigLoader`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ListenerConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, ParserConfig,
    SpanEventConfig, TflogConfig,
};
pub use validation::validate_config;
