//! Courier Runtime - application assembly for the Courier mediator.
//!
//! This crate provides:
//! - Layered configuration (`courier.toml`, `COURIER_*` variables) via figment
//! - Logging setup on top of `tracing-subscriber`
//! - [`CourierRuntime`]: config, logging, module scan and mediator in one step,
//!   plus a root cancellation token for shutdown
//!
//! ```rust,ignore
//! use courier_runtime::CourierRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = CourierRuntime::builder()
//!         .module(PING_MODULE)
//!         .build()?;
//!
//!     println!("{}", runtime.send(Ping).await?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, CourierConfig, LoggingConfig, MediatorConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingError, SpanEvents};
pub use runtime::{CourierRuntime, RuntimeBuilder};

// Re-export tracing for use by applications
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for applications.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
