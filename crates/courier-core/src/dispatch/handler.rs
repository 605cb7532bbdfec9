//! Handler traits and closure adapters.
//!
//! - [`RequestHandler`] - the single handler for a request type
//! - [`NotificationHandler`] - one of many handlers for a notification type
//! - [`handler_fn`] / [`notification_fn`] - turn async closures into handlers
//!
//! Every handler receives the caller's [`CancellationToken`]. Honoring it is
//! up to the handler; the mediator only passes it along.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_core::{BoxError, RequestHandler};
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
//! ```

use std::any::type_name;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::foundation::error::BoxError;
use crate::foundation::message::{Notification, Request};

// ============================================================================
// Handler Traits
// ============================================================================

/// Handles one request type and produces its response.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    async fn handle(&self, request: R, cancel: &CancellationToken)
    -> Result<R::Response, BoxError>;

    /// A diagnostic name, used in spans.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Handles one notification type.
///
/// The notification is borrowed; all handlers of a publish call observe the
/// same value.
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), BoxError>;

    /// A diagnostic name, reported in [`PublishError`](crate::PublishError).
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

// ============================================================================
// Closure Adapters
// ============================================================================

/// A [`RequestHandler`] backed by an async closure. See [`handler_fn`].
pub struct HandlerFn<R, F> {
    f: F,
    name: &'static str,
    _marker: PhantomData<fn(R)>,
}

/// Wraps an async closure as a request handler.
///
/// The closure receives the request and a clone of the cancellation token.
///
/// ```rust,ignore
/// builder.register_request_handler(handler_fn(|_: Ping, _| async {
///     Ok::<_, BoxError>("pong".to_string())
/// }))?;
/// ```
pub fn handler_fn<R, F, Fut>(f: F) -> HandlerFn<R, F>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, BoxError>> + Send + 'static,
{
    HandlerFn {
        f,
        name: type_name::<F>(),
        _marker: PhantomData,
    }
}

impl<R, F> HandlerFn<R, F> {
    /// Replaces the closure's generated type name in diagnostics.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<R, F, Fut> RequestHandler<R> for HandlerFn<R, F>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, BoxError>> + Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        (self.f)(request, cancel.clone()).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A [`NotificationHandler`] backed by an async closure. See [`notification_fn`].
pub struct NotificationFn<N, F> {
    f: F,
    name: &'static str,
    _marker: PhantomData<fn(N)>,
}

/// Wraps an async closure as a notification handler.
///
/// Closures cannot return futures that borrow their arguments, so the
/// closure receives its own clone of the notification.
pub fn notification_fn<N, F, Fut>(f: F) -> NotificationFn<N, F>
where
    N: Notification + Clone,
    F: Fn(N, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    NotificationFn {
        f,
        name: type_name::<F>(),
        _marker: PhantomData,
    }
}

impl<N, F> NotificationFn<N, F> {
    /// Replaces the closure's generated type name in diagnostics.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<N, F, Fut> NotificationHandler<N> for NotificationFn<N, F>
where
    N: Notification + Clone,
    F: Fn(N, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), BoxError> {
        (self.f)(notification.clone(), cancel.clone()).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    struct Ping;

    impl Request for Ping {
        type Response = String;
    }

    #[derive(Clone)]
    struct Tick(u32);

    impl Notification for Tick {}

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|_: Ping, _| async { Ok::<_, BoxError>("pong".to_string()) });
        let response = assert_ok!(handler.handle(Ping, &CancellationToken::new()).await);
        assert_eq!(response, "pong");
    }

    #[tokio::test]
    async fn test_handler_fn_sees_cancellation() {
        let handler = handler_fn(|_: Ping, cancel: CancellationToken| async move {
            Ok::<_, BoxError>(cancel.is_cancelled().to_string())
        });
        let token = CancellationToken::new();
        token.cancel();
        let response = assert_ok!(handler.handle(Ping, &token).await);
        assert_eq!(response, "true");
    }

    #[tokio::test]
    async fn test_notification_fn_name() {
        let handler = notification_fn(|tick: Tick, _| async move {
            if tick.0 == 0 {
                return Err::<(), BoxError>("zero tick".into());
            }
            Ok(())
        })
        .named("ticker");
        assert_eq!(NotificationHandler::name(&handler), "ticker");
        assert!(handler.handle(&Tick(0), &CancellationToken::new()).await.is_err());
        assert_ok!(handler.handle(&Tick(1), &CancellationToken::new()).await);
    }
}
