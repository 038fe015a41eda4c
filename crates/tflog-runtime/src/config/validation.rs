//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ListenerConfig, LogOutput, LoggingConfig, TflogConfig};

/// Smallest receive buffer that can hold a header and a player block.
const MIN_BUFFER_SIZE: usize = 64;

/// Validates the entire configuration.
pub fn validate_config(config: &TflogConfig) -> ConfigResult<()> {
    validate_listener_config(&config.listener)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_listener_config(listener: &ListenerConfig) -> ConfigResult<()> {
    if listener.host.trim().is_empty() {
        return Err(ConfigError::validation("Listener host cannot be empty"));
    }

    if listener.buffer_size < MIN_BUFFER_SIZE {
        return Err(ConfigError::validation(format!(
            "Listener buffer size must be at least {MIN_BUFFER_SIZE} bytes, got {}",
            listener.buffer_size
        )));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module names cannot be empty"));
    }

    Ok(())
}
