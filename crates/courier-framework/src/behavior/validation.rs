use std::any::type_name;

use async_trait::async_trait;
use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use thiserror::Error;
use tracing::debug;

/// A request that can check its own invariants.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Why a request was rejected by [`ValidationBehavior`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    field: String,
    reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The offending field.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Runs [`Validate::validate`] and short-circuits on failure.
///
/// The handler and every behavior registered after this one are skipped for
/// invalid requests; the caller receives the [`ValidationError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationBehavior;

#[async_trait]
impl<R: Request + Validate> PipelineBehavior<R> for ValidationBehavior {
    async fn handle(
        &self,
        request: R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        if let Err(error) = request.validate() {
            debug!(message = type_name::<R>(), %error, "Request rejected");
            return Err(error.into());
        }
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{Mediator, Registry, handler_fn};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    struct Divide {
        a: i64,
        b: i64,
    }

    impl Request for Divide {
        type Response = i64;
    }

    impl Validate for Divide {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.b == 0 {
                return Err(ValidationError::new("b", "must not be zero"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut builder = Registry::builder();
        builder
            .register_request_handler::<Divide, _>(handler_fn(move |d: Divide, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<i64, BoxError>(d.a / d.b) }
            }))
            .unwrap()
            .register_behavior::<Divide, _>(ValidationBehavior)
            .unwrap();
        let mediator = Mediator::new(builder.build());

        let error = assert_err!(mediator.send(Divide { a: 1, b: 0 }).await);
        let rejected = error.downcast_ref::<ValidationError>().unwrap();
        assert_eq!(rejected.field(), "b");
        assert_eq!(error.to_string(), "invalid b: must not be zero");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(assert_ok!(mediator.send(Divide { a: 10, b: 2 }).await), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
