//! Layered configuration for the Courier runtime.
//!
//! Settings come from defaults, TOML/YAML files, `COURIER_*` environment
//! variables and programmatic overrides, merged with figment.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CourierConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, MediatorConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
