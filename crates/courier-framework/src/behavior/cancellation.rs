use std::any::type_name;

use async_trait::async_trait;
use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use thiserror::Error;
use tracing::debug;

/// Returned by [`CancellationGuard`] for a request whose token was cancelled
/// before it reached the guard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{message}` was cancelled before it was handled")]
pub struct Cancelled {
    message: &'static str,
}

impl Cancelled {
    pub fn message(&self) -> &'static str {
        self.message
    }
}

/// Short-circuits requests whose cancellation token is already cancelled.
///
/// The check happens once, when the guard runs. Cancellation that arrives
/// later is left to the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationGuard;

#[async_trait]
impl<R: Request> PipelineBehavior<R> for CancellationGuard {
    async fn handle(
        &self,
        request: R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        if cancel.is_cancelled() {
            debug!(message = type_name::<R>(), "Skipping cancelled request");
            return Err(Cancelled {
                message: type_name::<R>(),
            }
            .into());
        }
        next.run(request).await
    }
}
