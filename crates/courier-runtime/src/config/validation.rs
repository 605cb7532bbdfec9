//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{CourierConfig, LogOutput, LoggingConfig, MediatorConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &CourierConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_mediator_config(&config.mediator)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation(
            "logging.max_files must be greater than 0",
        ));
    }

    if logging.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation(
            "logging.filters contains an empty target",
        ));
    }

    Ok(())
}

fn validate_mediator_config(mediator: &MediatorConfig) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for name in &mediator.disabled_modules {
        if name.trim().is_empty() {
            return Err(ConfigError::validation(
                "mediator.disabled_modules contains an empty name",
            ));
        }
        if !seen.insert(name) {
            return Err(ConfigError::validation(format!(
                "mediator.disabled_modules lists `{name}` twice"
            )));
        }
    }

    Ok(())
}
