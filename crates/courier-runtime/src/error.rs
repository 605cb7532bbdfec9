//! Runtime error types.

use courier_core::RegistrationError;
use courier_framework::SkippedModule;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while assembling a [`CourierRuntime`](crate::CourierRuntime).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A registration made directly on the runtime builder failed.
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// Strict mode is on and at least one module was skipped.
    #[error("{} module(s) could not be loaded: {}", .skipped.len(), join(.skipped))]
    StrictScan { skipped: Vec<SkippedModule> },
}

fn join(skipped: &[SkippedModule]) -> String {
    skipped
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
