//! Request tracing.

use std::any::type_name;
use std::time::Instant;

use async_trait::async_trait;
use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use tracing::{Instrument, debug, info_span, warn};

/// Wraps each request in an `INFO` span and logs its outcome.
///
/// Successful requests are logged at `DEBUG` with the elapsed time; failures
/// at `WARN` with the error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBehavior;

#[async_trait]
impl<R: Request> PipelineBehavior<R> for TracingBehavior {
    async fn handle(
        &self,
        request: R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let span = info_span!("request", message = type_name::<R>());

        async move {
            let start = Instant::now();
            debug!("Handling request");
            let outcome = next.run(request).await;
            let elapsed = start.elapsed();
            match &outcome {
                Ok(_) => debug!(?elapsed, "Request handled"),
                Err(error) => warn!(?elapsed, error = %error, "Request failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
