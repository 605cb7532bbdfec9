//! # Courier Core
//!
//! The dispatch engine of the Courier in-process mediator.
//!
//! Callers hand a message to the [`Mediator`]; the mediator finds what
//! handles it by the message's exact runtime type. Requests pass through an
//! ordered chain of [`PipelineBehavior`]s on their way to a single
//! [`RequestHandler`]. Notifications fan out to every [`NotificationHandler`].
//!
//! ## Layers
//!
//! ### Foundation Layer
//!
//! - **Messages**: [`Request`], [`Notification`], [`MessageKind`]
//! - **Erased values**: [`BoxedValue`]
//! - **Errors**: [`MediatorError`], [`PublishError`], [`RegistrationError`]
//!
//! ### Dispatch Layer
//!
//! - **Handlers**: [`RequestHandler`], [`NotificationHandler`], [`handler_fn`]
//! - **Pipeline**: [`PipelineBehavior`], [`Next`]
//! - **Registry**: [`RegistryBuilder`], [`Registry`]
//! - **Mediator**: [`Mediator`], [`PublishStrategy`]
//!
//! ## Request Flow
//!
//! ```text
//! ┌────────┐  send   ┌──────────┐     ┌────┐   ┌────┐   ┌─────────┐
//! │ Caller │────────▶│ Mediator │────▶│ B1 │──▶│ B2 │──▶│ Handler │
//! └────────┘         └──────────┘     └────┘   └────┘   └─────────┘
//!
//! ┌────────┐ publish ┌──────────┐────▶ Handler
//! │ Caller │────────▶│ Mediator │────▶ Handler
//! └────────┘         └──────────┘────▶ Handler
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use courier_core::prelude::*;
//!
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl RequestHandler<Ping> for PingHandler {
//!     async fn handle(&self, _: Ping, _: &CancellationToken) -> Result<String, BoxError> {
//!         Ok("pong".into())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let mut builder = Registry::builder();
//!     builder.register_request_handler::<Ping, _>(PingHandler)?;
//!
//!     let mediator = Mediator::new(builder.build());
//!     assert_eq!(mediator.send(Ping).await?, "pong");
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod foundation;

pub use async_trait::async_trait;
pub use futures::future::BoxFuture;
pub use tokio_util::sync::CancellationToken;

pub use foundation::{
    BoxError, BoxedValue, HandlerFailure, MediatorError, MediatorResult, MessageInfo, MessageKind,
    Notification, PublishError, RegistrationError, Request, Unit,
};

pub use dispatch::{
    HandlerFn, Lifetime, Mediator, Next, NotificationFn, NotificationHandler, PipelineBehavior,
    PublishStrategy, Registry, RegistryBuilder, RegistryStats, RequestHandler, handler_fn,
    notification_fn,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::{
        CancellationToken, Mediator, Next, NotificationHandler, PipelineBehavior, Registry,
        RegistryBuilder, RequestHandler, async_trait, handler_fn, notification_fn,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    struct Ping;

    impl Request for Ping {
        type Response = String;
    }

    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(&self, _: Ping, _: &CancellationToken) -> Result<String, BoxError> {
            Ok("pong".into())
        }
    }

    // Registration and dispatch errors both convert into `BoxError`.
    async fn assemble_and_send() -> Result<String, BoxError> {
        let mut builder = Registry::builder();
        builder.register_request_handler::<Ping, _>(PingHandler)?;
        builder.register_request_handler::<Ping, _>(PingHandler)?;

        let mediator = Mediator::new(builder.build());
        Ok(mediator.send(Ping).await?)
    }

    #[tokio::test]
    async fn test_prelude_errors_propagate_as_box_error() {
        let error = assemble_and_send().await.unwrap_err();
        let error = error.downcast::<RegistrationError>().unwrap();
        assert!(matches!(*error, RegistrationError::AmbiguousHandler { .. }));
    }
}
