//! The mediator: the single entry point for sending and publishing.
//!
//! # Dispatch Paths
//!
//! - [`send`](Mediator::send) - one handler, wrapped by the request's
//!   pipeline behaviors, returns the response (or `()` for void requests)
//! - [`publish`](Mediator::publish) - every handler of the notification runs
//! - [`send_boxed`](Mediator::send_boxed) / [`publish_boxed`](Mediator::publish_boxed)
//!   - the same paths for values whose type is only known at runtime
//! - [`send_json`](Mediator::send_json) / [`publish_json`](Mediator::publish_json)
//!   - the same paths addressed by exposed name with JSON payloads
//!
//! A `send` never spawns: it is a chain of awaited calls on the caller's task.
//! A `publish` polls its handlers on the caller's task too, concurrently or
//! one by one depending on the [`PublishStrategy`].

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, warn};

use crate::dispatch::erased::ErasedDispatch;
use crate::dispatch::pipeline::Next;
use crate::dispatch::registry::Registry;
use crate::foundation::error::{
    BoxError, HandlerFailure, MediatorError, MediatorResult, PublishError,
};
use crate::foundation::message::{MessageKind, Notification, Request};
use crate::foundation::value::BoxedValue;

/// How `publish` drives the handlers of one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStrategy {
    /// Poll every handler concurrently on the caller's task.
    #[default]
    Concurrent,
    /// Await handlers one at a time, in registration order.
    Sequential,
}

/// Routes requests and notifications to their registered handlers.
///
/// `Mediator` is cheap to clone; clones share the same frozen [`Registry`].
///
/// # Example
///
/// ```rust,ignore
/// let mediator = Mediator::new(builder.build());
///
/// let pong = mediator.send(Ping).await?;
/// mediator.publish(UserCreated { name: "ada".into() }).await?;
/// ```
#[derive(Clone)]
pub struct Mediator {
    registry: Arc<Registry>,
    strategy: PublishStrategy,
}

impl Mediator {
    pub fn new(registry: Registry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    /// Creates a mediator over an already shared registry.
    pub fn from_shared(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            strategy: PublishStrategy::default(),
        }
    }

    /// Sets the publish strategy (builder pattern).
    pub fn with_publish_strategy(mut self, strategy: PublishStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn publish_strategy(&self) -> PublishStrategy {
        self.strategy
    }

    // ========================================================================
    // Typed Dispatch
    // ========================================================================

    /// Sends a request with a fresh, never-cancelled token.
    pub async fn send<R: Request>(&self, request: R) -> MediatorResult<R::Response> {
        let cancel = CancellationToken::new();
        self.send_with(request, &cancel).await
    }

    /// Sends a request through its pipeline to its handler.
    ///
    /// # Errors
    ///
    /// - [`MediatorError::HandlerNotFound`] if `R` has no handler
    /// - [`MediatorError::Handler`] with the original error if the handler or
    ///   a behavior fails
    pub async fn send_with<R: Request>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> MediatorResult<R::Response> {
        let handler = self.registry.resolve_handler::<R>()?;
        let behaviors = self.registry.resolve_behaviors::<R>();
        let span = debug_span!(
            "send",
            message = type_name::<R>(),
            handler = handler.name(),
            behaviors = behaviors.len(),
        );

        Next::new(behaviors, handler.as_ref(), cancel)
            .run(request)
            .instrument(span)
            .await
            .map_err(MediatorError::from_boxed)
    }

    /// Publishes a notification with a fresh, never-cancelled token.
    pub async fn publish<N: Notification>(&self, notification: N) -> MediatorResult<()> {
        let cancel = CancellationToken::new();
        self.publish_with(notification, &cancel).await
    }

    /// Publishes a notification to every handler registered for it.
    ///
    /// Publishing to zero handlers succeeds. Every handler runs to completion
    /// even when others fail; the failures are then reported together.
    ///
    /// # Errors
    ///
    /// [`MediatorError::Publish`] listing each failed handler.
    pub async fn publish_with<N: Notification>(
        &self,
        notification: N,
        cancel: &CancellationToken,
    ) -> MediatorResult<()> {
        let handlers = self.registry.resolve_handlers::<N>();
        let total = handlers.len();
        let span = debug_span!("publish", message = type_name::<N>(), handlers = total);

        async move {
            if handlers.is_empty() {
                debug!("No handlers registered, nothing to do");
                return Ok(());
            }

            let outcomes: Vec<Result<(), BoxError>> = match self.strategy {
                PublishStrategy::Concurrent => {
                    let pending: Vec<_> = handlers
                        .iter()
                        .map(|handler| handler.handle(&notification, cancel))
                        .collect();
                    join_all(pending).await
                }
                PublishStrategy::Sequential => {
                    let mut outcomes = Vec::with_capacity(total);
                    for handler in &handlers {
                        outcomes.push(handler.handle(&notification, cancel).await);
                    }
                    outcomes
                }
            };

            let failures: Vec<HandlerFailure> = handlers
                .iter()
                .zip(outcomes)
                .filter_map(|(handler, outcome)| {
                    outcome
                        .err()
                        .map(|error| HandlerFailure::new(handler.name(), error))
                })
                .collect();

            if failures.is_empty() {
                return Ok(());
            }
            for failure in &failures {
                warn!(
                    handler = failure.handler(),
                    error = %failure.error(),
                    "Notification handler failed"
                );
            }
            Err(PublishError::new(type_name::<N>(), total, failures).into())
        }
        .instrument(span)
        .await
    }

    // ========================================================================
    // Untyped Dispatch
    // ========================================================================

    /// Sends a type-erased request with a fresh token.
    pub async fn send_boxed(&self, request: BoxedValue) -> MediatorResult<Option<BoxedValue>> {
        let cancel = CancellationToken::new();
        self.send_boxed_with(request, &cancel).await
    }

    /// Sends a type-erased request.
    ///
    /// Returns `Some` boxed response for a request, and `None` for a void
    /// request. The request takes the same pipeline as [`send_with`](Self::send_with).
    ///
    /// A value built with [`BoxedValue::request`] dispatches exactly like a
    /// typed send, including [`MediatorError::HandlerNotFound`] when its type
    /// has no handler. A value built with [`BoxedValue::new`] is routed by its
    /// registered type.
    ///
    /// # Errors
    ///
    /// [`MediatorError::UnsupportedMessageShape`] when the value is a
    /// notification, or is neither shape and unknown to the registry.
    pub async fn send_boxed_with(
        &self,
        request: BoxedValue,
        cancel: &CancellationToken,
    ) -> MediatorResult<Option<BoxedValue>> {
        match self.erased_dispatch(&request) {
            Some(ErasedDispatch::Request(thunk)) => thunk(self, request, cancel).await,
            _ => Err(MediatorError::UnsupportedMessageShape {
                type_name: request.type_name(),
                expected: "request",
            }),
        }
    }

    /// Publishes a type-erased notification with a fresh token.
    pub async fn publish_boxed(&self, notification: BoxedValue) -> MediatorResult<()> {
        let cancel = CancellationToken::new();
        self.publish_boxed_with(notification, &cancel).await
    }

    /// Publishes a type-erased notification.
    ///
    /// A value built with [`BoxedValue::notification`] whose type has no
    /// handlers publishes to nobody and succeeds, as [`publish`](Self::publish) does.
    pub async fn publish_boxed_with(
        &self,
        notification: BoxedValue,
        cancel: &CancellationToken,
    ) -> MediatorResult<()> {
        match self.erased_dispatch(&notification) {
            Some(ErasedDispatch::Notification(thunk)) => thunk(self, notification, cancel).await,
            _ => Err(MediatorError::UnsupportedMessageShape {
                type_name: notification.type_name(),
                expected: "notification",
            }),
        }
    }

    fn erased_dispatch(&self, value: &BoxedValue) -> Option<ErasedDispatch> {
        value
            .dispatch()
            .or_else(|| self.registry.dispatcher(value.value_type()))
    }

    // ========================================================================
    // JSON Dispatch
    // ========================================================================

    /// Sends the request exposed as `name`, decoded from `payload`.
    ///
    /// The response is encoded back to JSON; void requests yield `null`.
    pub async fn send_json(&self, name: &str, payload: Value) -> MediatorResult<Value> {
        let cancel = CancellationToken::new();
        self.send_json_with(name, payload, &cancel).await
    }

    pub async fn send_json_with(
        &self,
        name: &str,
        payload: Value,
        cancel: &CancellationToken,
    ) -> MediatorResult<Value> {
        let entry = self
            .registry
            .json_entry(name)
            .ok_or_else(|| MediatorError::UnknownMessageName(name.to_string()))?;
        if !entry.info.kind.is_request() {
            return Err(MediatorError::UnsupportedMessageShape {
                type_name: entry.info.type_name,
                expected: "request",
            });
        }
        (entry.thunk)(self, payload, cancel).await
    }

    /// Publishes the notification exposed as `name`, decoded from `payload`.
    pub async fn publish_json(&self, name: &str, payload: Value) -> MediatorResult<()> {
        let cancel = CancellationToken::new();
        self.publish_json_with(name, payload, &cancel).await
    }

    pub async fn publish_json_with(
        &self,
        name: &str,
        payload: Value,
        cancel: &CancellationToken,
    ) -> MediatorResult<()> {
        let entry = self
            .registry
            .json_entry(name)
            .ok_or_else(|| MediatorError::UnknownMessageName(name.to_string()))?;
        if entry.info.kind != MessageKind::Notification {
            return Err(MediatorError::UnsupportedMessageShape {
                type_name: entry.info.type_name,
                expected: "notification",
            });
        }
        (entry.thunk)(self, payload, cancel).await.map(drop)
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("registry", &self.registry)
            .field("strategy", &self.strategy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::{NotificationHandler, RequestHandler, handler_fn};
    use crate::dispatch::pipeline::PipelineBehavior;
    use crate::dispatch::registry::RegistryBuilder;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use thiserror::Error;
    use tokio::sync::Notify;
    use tokio::time::timeout;
    use tokio_test::{assert_err, assert_ok};

    // ------------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------------

    #[derive(Debug, Deserialize)]
    struct Ping;

    impl Request for Ping {
        type Response = String;
    }

    #[derive(Debug, Deserialize)]
    struct Divide {
        a: i64,
        b: i64,
    }

    impl Request for Divide {
        type Response = i64;
    }

    #[derive(Debug, Deserialize)]
    struct Reset;

    impl Request for Reset {
        type Response = ();
    }

    #[derive(Debug, Clone, Deserialize)]
    struct UserCreated {
        name: String,
    }

    impl Notification for UserCreated {}

    #[derive(Debug, Error)]
    #[error("division by zero")]
    struct DivideByZero;

    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(&self, _: Ping, _: &CancellationToken) -> Result<String, BoxError> {
            Ok("pong".to_string())
        }
    }

    struct DivideHandler;

    #[async_trait]
    impl RequestHandler<Divide> for DivideHandler {
        async fn handle(&self, request: Divide, _: &CancellationToken) -> Result<i64, BoxError> {
            if request.b == 0 {
                return Err(DivideByZero.into());
            }
            request
                .a
                .checked_div(request.b)
                .ok_or_else(|| "division overflow".into())
        }
    }

    struct ResetHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl RequestHandler<Reset> for ResetHandler {
        async fn handle(&self, _: Reset, _: &CancellationToken) -> Result<(), BoxError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
    }

    #[async_trait]
    impl NotificationHandler<UserCreated> for Recorder {
        async fn handle(&self, event: &UserCreated, _: &CancellationToken) -> Result<(), BoxError> {
            self.log.lock().push(format!("{}:{}", self.name, event.name));
            Ok(())
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    struct Failing(&'static str);

    #[async_trait]
    impl NotificationHandler<UserCreated> for Failing {
        async fn handle(&self, _: &UserCreated, _: &CancellationToken) -> Result<(), BoxError> {
            Err(format!("{} unavailable", self.0).into())
        }

        fn name(&self) -> &'static str {
            self.0
        }
    }

    struct Waiter {
        ready: Arc<Notify>,
        log: Log,
    }

    #[async_trait]
    impl NotificationHandler<UserCreated> for Waiter {
        async fn handle(&self, event: &UserCreated, _: &CancellationToken) -> Result<(), BoxError> {
            self.ready.notified().await;
            self.log.lock().push(format!("waiter:{}", event.name));
            Ok(())
        }
    }

    struct Signaler(Arc<Notify>);

    #[async_trait]
    impl NotificationHandler<UserCreated> for Signaler {
        async fn handle(&self, _: &UserCreated, _: &CancellationToken) -> Result<(), BoxError> {
            self.0.notify_one();
            Ok(())
        }
    }

    struct Yielding {
        name: &'static str,
        log: Log,
    }

    #[async_trait]
    impl NotificationHandler<UserCreated> for Yielding {
        async fn handle(&self, event: &UserCreated, _: &CancellationToken) -> Result<(), BoxError> {
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            self.log.lock().push(format!("{}:{}", self.name, event.name));
            Ok(())
        }
    }

    struct Layer {
        name: &'static str,
        log: Log,
    }

    #[async_trait]
    impl<R: Request> PipelineBehavior<R> for Layer {
        async fn handle(
            &self,
            request: R,
            next: Next<'_, R>,
            _cancel: &CancellationToken,
        ) -> Result<R::Response, BoxError> {
            self.log.lock().push(format!("{} before", self.name));
            let response = next.run(request).await;
            self.log.lock().push(format!("{} after", self.name));
            response
        }
    }

    struct Refuse;

    #[async_trait]
    impl PipelineBehavior<Ping> for Refuse {
        async fn handle(
            &self,
            _request: Ping,
            _next: Next<'_, Ping>,
            _cancel: &CancellationToken,
        ) -> Result<String, BoxError> {
            Ok("refused".to_string())
        }
    }

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn basic_builder() -> RegistryBuilder {
        let mut builder = Registry::builder();
        builder
            .register_request_handler::<Ping, _>(PingHandler)
            .unwrap()
            .register_request_handler::<Divide, _>(DivideHandler)
            .unwrap();
        builder
    }

    // ------------------------------------------------------------------------
    // Send
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_send_ping() {
        let mediator = Mediator::new(basic_builder().build());
        assert_eq!(assert_ok!(mediator.send(Ping).await), "pong");
    }

    #[tokio::test]
    async fn test_send_divide() {
        let mediator = Mediator::new(basic_builder().build());
        assert_eq!(assert_ok!(mediator.send(Divide { a: 10, b: 2 }).await), 5);
    }

    #[tokio::test]
    async fn test_handler_error_reaches_caller() {
        let mediator = Mediator::new(basic_builder().build());
        let error = assert_err!(mediator.send(Divide { a: 1, b: 0 }).await);
        assert!(error.downcast_ref::<DivideByZero>().is_some());
        assert_eq!(error.to_string(), "division by zero");
    }

    #[tokio::test]
    async fn test_send_without_handler() {
        let mediator = Mediator::new(Registry::builder().build());
        let error = assert_err!(mediator.send(Ping).await);
        assert!(error.is_handler_not_found());
    }

    #[tokio::test]
    async fn test_void_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let entries = log();
        let mut builder = Registry::builder();
        builder
            .register_request_handler::<Reset, _>(ResetHandler(calls.clone()))
            .unwrap()
            .register_behavior::<Reset, _>(Layer {
                name: "outer",
                log: entries.clone(),
            })
            .unwrap();
        let mediator = Mediator::new(builder.build());

        assert_ok!(mediator.send(Reset).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*entries.lock(), vec!["outer before", "outer after"]);
    }

    #[tokio::test]
    async fn test_behaviors_wrap_in_registration_order() {
        let entries = log();
        let mut builder = basic_builder();
        for name in ["b1", "b2", "b3"] {
            builder
                .register_behavior::<Ping, _>(Layer {
                    name,
                    log: entries.clone(),
                })
                .unwrap();
        }
        let mediator = Mediator::new(builder.build());

        assert_eq!(assert_ok!(mediator.send(Ping).await), "pong");
        assert_eq!(
            *entries.lock(),
            vec![
                "b1 before",
                "b2 before",
                "b3 before",
                "b3 after",
                "b2 after",
                "b1 after"
            ]
        );
    }

    #[tokio::test]
    async fn test_behavior_short_circuit_skips_handler() {
        let entries = log();
        let handler_log = entries.clone();
        let mut builder = Registry::builder();
        builder
            .register_request_handler::<Ping, _>(handler_fn(move |_: Ping, _| {
                let log = handler_log.clone();
                async move {
                    log.lock().push("handler".to_string());
                    Ok::<_, BoxError>("pong".to_string())
                }
            }))
            .unwrap()
            .register_behavior::<Ping, _>(Layer {
                name: "outer",
                log: entries.clone(),
            })
            .unwrap()
            .register_behavior::<Ping, _>(Refuse)
            .unwrap()
            .register_behavior::<Ping, _>(Layer {
                name: "inner",
                log: entries.clone(),
            })
            .unwrap();
        let mediator = Mediator::new(builder.build());

        assert_eq!(assert_ok!(mediator.send(Ping).await), "refused");
        assert_eq!(*entries.lock(), vec!["outer before", "outer after"]);
    }

    #[tokio::test]
    async fn test_send_is_repeatable() {
        let mediator = Mediator::new(basic_builder().build());
        for _ in 0..3 {
            assert_eq!(assert_ok!(mediator.send(Divide { a: 9, b: 3 }).await), 3);
        }
    }

    #[tokio::test]
    async fn test_transient_handler_is_built_per_call() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let mut builder = Registry::builder();
        builder
            .register_request_factory::<Ping, _, _>(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                PingHandler
            })
            .unwrap();
        let mediator = Mediator::new(builder.build());

        assert_ok!(mediator.send(Ping).await);
        assert_ok!(mediator.send(Ping).await);
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancellation_token_is_forwarded() {
        let mut builder = Registry::builder();
        builder
            .register_request_handler::<Ping, _>(handler_fn(
                |_: Ping, cancel: CancellationToken| async move {
                    Ok::<_, BoxError>(cancel.is_cancelled().to_string())
                },
            ))
            .unwrap();
        let mediator = Mediator::new(builder.build());
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(assert_ok!(mediator.send_with(Ping, &cancel).await), "true");
    }

    #[tokio::test]
    async fn test_nested_send_error_is_not_rewrapped() {
        let mediator_slot: Arc<Mutex<Option<Mediator>>> = Arc::new(Mutex::new(None));
        let inner = mediator_slot.clone();
        let mut builder = Registry::builder();
        builder
            .register_request_handler::<Divide, _>(handler_fn(move |_: Divide, _| {
                let mediator = inner.lock().clone();
                async move {
                    let mediator = mediator.ok_or("mediator not ready")?;
                    mediator.send(Ping).await?;
                    Ok::<i64, BoxError>(0)
                }
            }))
            .unwrap();
        let mediator = Mediator::new(builder.build());
        *mediator_slot.lock() = Some(mediator.clone());

        let error = assert_err!(mediator.send(Divide { a: 1, b: 1 }).await);
        assert!(error.is_handler_not_found());
    }

    // ------------------------------------------------------------------------
    // Publish
    // ------------------------------------------------------------------------

    fn user() -> UserCreated {
        UserCreated {
            name: "ada".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_handler_once() {
        let entries = log();
        let mut builder = Registry::builder();
        builder
            .register_notification_handler::<UserCreated, _>(Recorder {
                name: "audit",
                log: entries.clone(),
            })
            .unwrap()
            .register_notification_handler::<UserCreated, _>(Recorder {
                name: "mailer",
                log: entries.clone(),
            })
            .unwrap();
        let mediator = Mediator::new(builder.build());

        assert_ok!(mediator.publish(user()).await);
        let mut seen = entries.lock().clone();
        seen.sort();
        assert_eq!(seen, vec!["audit:ada", "mailer:ada"]);
    }

    #[tokio::test]
    async fn test_publish_without_handlers_is_noop() {
        let mediator = Mediator::new(Registry::builder().build());
        assert_ok!(mediator.publish(user()).await);
    }

    #[tokio::test]
    async fn test_publish_aggregates_failures() {
        let entries = log();
        let mut builder = Registry::builder();
        builder
            .register_notification_handler::<UserCreated, _>(Failing("search"))
            .unwrap()
            .register_notification_handler::<UserCreated, _>(Recorder {
                name: "audit",
                log: entries.clone(),
            })
            .unwrap()
            .register_notification_handler::<UserCreated, _>(Failing("mailer"))
            .unwrap();
        let mediator = Mediator::new(builder.build());

        let error = assert_err!(mediator.publish(user()).await);
        let error = match error {
            MediatorError::Publish(error) => error,
            other => panic!("expected a publish error, got {other:?}"),
        };
        assert_eq!(error.total(), 3);
        let failed: Vec<_> = error.failures().iter().map(|f| f.handler()).collect();
        assert_eq!(failed, vec!["search", "mailer"]);
        assert_eq!(error.failures()[1].error().to_string(), "mailer unavailable");
        assert_eq!(*entries.lock(), vec!["audit:ada"]);
    }

    #[tokio::test]
    async fn test_sequential_publish_keeps_order() {
        let entries = log();
        let mut builder = Registry::builder();
        for name in ["first", "second", "third"] {
            builder
                .register_notification_handler::<UserCreated, _>(Recorder {
                    name,
                    log: entries.clone(),
                })
                .unwrap();
        }
        builder
            .register_notification_handler::<UserCreated, _>(Failing("broken"))
            .unwrap();
        let mediator =
            Mediator::new(builder.build()).with_publish_strategy(PublishStrategy::Sequential);

        assert_err!(mediator.publish(user()).await);
        assert_eq!(
            *entries.lock(),
            vec!["first:ada", "second:ada", "third:ada"]
        );
    }

    fn handshake(strategy: PublishStrategy, entries: &Log) -> Mediator {
        let ready = Arc::new(Notify::new());
        let mut builder = Registry::builder();
        builder
            .register_notification_handler::<UserCreated, _>(Waiter {
                ready: ready.clone(),
                log: entries.clone(),
            })
            .unwrap()
            .register_notification_handler::<UserCreated, _>(Signaler(ready))
            .unwrap();
        Mediator::new(builder.build()).with_publish_strategy(strategy)
    }

    #[tokio::test]
    async fn test_concurrent_publish_polls_handlers_together() {
        let entries = log();
        let mediator = handshake(PublishStrategy::Concurrent, &entries);

        let published = timeout(Duration::from_secs(5), mediator.publish(user())).await;
        assert_ok!(assert_ok!(published));
        assert_eq!(*entries.lock(), vec!["waiter:ada"]);
    }

    #[tokio::test]
    async fn test_sequential_publish_awaits_one_handler_at_a_time() {
        let entries = log();
        let mediator = handshake(PublishStrategy::Sequential, &entries);

        // The first handler waits for the second, which never starts.
        let published = timeout(Duration::from_millis(50), mediator.publish(user())).await;
        assert_err!(published);
        assert!(entries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_publish_waits_for_suspended_handlers() {
        for strategy in [PublishStrategy::Concurrent, PublishStrategy::Sequential] {
            let entries = log();
            let mut builder = Registry::builder();
            for name in ["audit", "mailer"] {
                builder
                    .register_notification_handler::<UserCreated, _>(Yielding {
                        name,
                        log: entries.clone(),
                    })
                    .unwrap();
            }
            let mediator = Mediator::new(builder.build()).with_publish_strategy(strategy);

            assert_ok!(mediator.publish(user()).await);
            let mut seen = entries.lock().clone();
            seen.sort();
            assert_eq!(seen, vec!["audit:ada", "mailer:ada"], "{strategy:?}");
        }
    }

    // ------------------------------------------------------------------------
    // Untyped and JSON
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_send_boxed_matches_typed_send() {
        let mediator = Mediator::new(basic_builder().build());

        let request = BoxedValue::request(Divide { a: 10, b: 2 });
        let response = assert_ok!(mediator.send_boxed(request).await);
        let response = response.expect("divide has a response");
        assert_eq!(response.downcast::<i64>().ok(), Some(5));

        let request = BoxedValue::new(Divide { a: 1, b: 0 });
        let error = assert_err!(mediator.send_boxed(request).await);
        assert!(error.downcast_ref::<DivideByZero>().is_some());
    }

    #[tokio::test]
    async fn test_send_boxed_void_and_unknown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut builder = Registry::builder();
        builder
            .register_request_handler::<Reset, _>(ResetHandler(calls.clone()))
            .unwrap()
            .declare_request::<Ping>()
            .unwrap();
        let mediator = Mediator::new(builder.build());

        assert!(assert_ok!(mediator.send_boxed(BoxedValue::request(Reset)).await).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let error = assert_err!(mediator.send_boxed(BoxedValue::new(Ping)).await);
        assert!(error.is_handler_not_found());

        let error = assert_err!(mediator.send_boxed(BoxedValue::new(42_u8)).await);
        assert!(matches!(
            error,
            MediatorError::UnsupportedMessageShape {
                expected: "request",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_boxed_shapes_are_not_interchangeable() {
        let mut builder = basic_builder();
        builder
            .register_notification_handler::<UserCreated, _>(Failing("audit"))
            .unwrap();
        let mediator = Mediator::new(builder.build());

        let error = assert_err!(mediator.send_boxed(BoxedValue::new(user())).await);
        assert!(matches!(error, MediatorError::UnsupportedMessageShape { .. }));
        let error = assert_err!(mediator.publish_boxed(BoxedValue::new(Ping)).await);
        assert!(matches!(error, MediatorError::UnsupportedMessageShape { .. }));
        let error = assert_err!(mediator.publish_boxed(BoxedValue::new(user())).await);
        assert!(matches!(error, MediatorError::Publish(_)));

        let error = assert_err!(mediator.send_boxed(BoxedValue::notification(user())).await);
        assert!(matches!(
            error,
            MediatorError::UnsupportedMessageShape {
                expected: "request",
                ..
            }
        ));
        let error = assert_err!(mediator.publish_boxed(BoxedValue::request(Ping)).await);
        assert!(matches!(
            error,
            MediatorError::UnsupportedMessageShape {
                expected: "notification",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_boxed_unregistered_types_dispatch_like_typed() {
        let mediator = Mediator::new(Registry::builder().build());

        let typed = assert_err!(mediator.send(Divide { a: 1, b: 1 }).await);
        let untyped = assert_err!(
            mediator
                .send_boxed(BoxedValue::request(Divide { a: 1, b: 1 }))
                .await
        );
        assert!(typed.is_handler_not_found());
        assert!(untyped.is_handler_not_found());

        assert_ok!(mediator.publish(user()).await);
        assert_ok!(mediator.publish_boxed(BoxedValue::notification(user())).await);

        let error = assert_err!(mediator.publish_boxed(BoxedValue::new(user())).await);
        assert!(matches!(error, MediatorError::UnsupportedMessageShape { .. }));
    }

    #[tokio::test]
    async fn test_json_dispatch() {
        let entries = log();
        let mut builder = basic_builder();
        builder
            .register_request_handler::<Reset, _>(ResetHandler(Arc::new(AtomicUsize::new(0))))
            .unwrap()
            .register_notification_handler::<UserCreated, _>(Recorder {
                name: "audit",
                log: entries.clone(),
            })
            .unwrap()
            .expose_request::<Divide>("divide")
            .unwrap()
            .expose_request::<Reset>("reset")
            .unwrap()
            .expose_notification::<UserCreated>("user.created")
            .unwrap();
        let mediator = Mediator::new(builder.build());

        let quotient = assert_ok!(mediator.send_json("divide", json!({"a": 10, "b": 2})).await);
        assert_eq!(quotient, json!(5));
        assert_eq!(assert_ok!(mediator.send_json("reset", Value::Null).await), Value::Null);
        assert_ok!(mediator.publish_json("user.created", json!({"name": "ada"})).await);
        assert_eq!(*entries.lock(), vec!["audit:ada"]);

        let overflow = json!({"a": i64::MIN, "b": -1});
        let error = assert_err!(mediator.send_json("divide", overflow).await);
        assert_eq!(error.to_string(), "division overflow");
        let error = assert_err!(mediator.send_json("divide", json!({"a": "ten"})).await);
        assert!(matches!(error, MediatorError::Codec { .. }));
        let error = assert_err!(mediator.send_json("missing", Value::Null).await);
        assert!(matches!(error, MediatorError::UnknownMessageName(name) if name == "missing"));
        let error = assert_err!(mediator.send_json("user.created", json!({"name": "x"})).await);
        assert!(matches!(error, MediatorError::UnsupportedMessageShape { .. }));
    }
}
