//! # Courier
//!
//! An in-process mediator. Callers send a message object to the mediator
//! instead of calling its handler; the mediator picks the handler from the
//! message's type.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐  send   ┌──────────┐     ┌──────────┐   ┌──────────┐   ┌─────────┐
//! │ Caller  │────────▶│ Mediator │────▶│ Behavior │──▶│ Behavior │──▶│ Handler │
//! └─────────┘         └──────────┘     └──────────┘   └──────────┘   └─────────┘
//!
//! ┌─────────┐ publish ┌──────────┐────▶ Handler
//! │ Caller  │────────▶│ Mediator │────▶ Handler      (zero or more)
//! └─────────┘         └──────────┘────▶ Handler
//! ```
//!
//! - **Requests**: exactly one handler, an optional response, ordered behaviors
//! - **Notifications**: any number of handlers, no response
//! - **Modules**: named groups of registrations, scanned at startup
//! - **Runtime**: configuration, logging, scan and shutdown in one builder
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[derive(Request)]
//! #[request(response = "String")]
//! struct Ping;
//!
//! #[derive(Default)]
//! struct PingHandler;
//!
//! #[async_trait]
//! impl RequestHandler<Ping> for PingHandler {
//!     async fn handle(&self, _: Ping, _: &CancellationToken) -> Result<String, BoxError> {
//!         Ok("pong".into())
//!     }
//! }
//!
//! static PING: ModuleDescriptor = define_module! {
//!     name: "ping",
//!     requests: [Ping => PingHandler],
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = CourierRuntime::builder().module(PING).build()?;
//!     assert_eq!(runtime.send(Ping).await?, "pong");
//!     Ok(())
//! }
//! ```
//!
//! The derives emit paths into `::courier_core`. Crates that depend on
//! `courier` alone pass `#[request(crate = "courier")]`.
//!
//! ## Features
//!
//! - `macros`: `Request` and `Notification` derives (default)
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log format

pub use courier_core as core;
pub use courier_framework as framework;
pub use courier_runtime as runtime;

pub use courier_core::{Notification, Request};

#[cfg(feature = "macros")]
pub use courier_macros::{Notification, Request};

pub use courier_framework::define_module;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use courier_runtime::{CourierRuntime, CourierConfig};

    // Messages and dispatch
    pub use courier_core::prelude::*;
    pub use courier_core::{BoxedValue, PublishStrategy};

    // Modules and built-in behaviors
    pub use courier_framework::{
        CancellationGuard, ModuleDescriptor, TracingBehavior, Validate, ValidationBehavior,
        ValidationError, define_module,
    };

    #[cfg(feature = "macros")]
    pub use courier_macros::{Notification, Request};
}
