//! Pipeline behaviors wrapped around request handlers.
//!
//! Behaviors registered for a request type form an onion around its handler.
//! For behaviors `B1, B2, B3` registered in that order, a `send` runs:
//!
//! ```text
//! B1 ─▶ B2 ─▶ B3 ─▶ Handler
//!                      │
//! B1 ◀─ B2 ◀─ B3 ◀─────┘
//! ```
//!
//! Each behavior owns the request and decides whether to forward it through
//! [`Next::run`]. Returning without calling `next` short-circuits the chain:
//! the handler and every inner behavior are skipped.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dispatch::handler::RequestHandler;
use crate::foundation::error::BoxError;
use crate::foundation::message::Request;

/// Middleware around the handler of one request type.
///
/// # Example
///
/// ```rust,ignore
/// struct Timing;
///
/// #[async_trait]
/// impl<R: Request> PipelineBehavior<R> for Timing {
///     async fn handle(
///         &self,
///         request: R,
///         next: Next<'_, R>,
///         _cancel: &CancellationToken,
///     ) -> Result<R::Response, BoxError> {
///         let start = Instant::now();
///         let response = next.run(request).await;
///         println!("took {:?}", start.elapsed());
///         response
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    async fn handle(
        &self,
        request: R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError>;
}

/// The remainder of a pipeline, handed to each behavior.
///
/// Consumed by [`run`](Next::run), so a behavior can forward at most once.
pub struct Next<'a, R: Request> {
    behaviors: &'a [Arc<dyn PipelineBehavior<R>>],
    handler: &'a dyn RequestHandler<R>,
    cancel: &'a CancellationToken,
}

impl<'a, R: Request> Next<'a, R> {
    pub(crate) fn new(
        behaviors: &'a [Arc<dyn PipelineBehavior<R>>],
        handler: &'a dyn RequestHandler<R>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            behaviors,
            handler,
            cancel,
        }
    }

    /// Passes the request to the next behavior, or to the handler when no
    /// behaviors remain.
    pub async fn run(self, request: R) -> Result<R::Response, BoxError> {
        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                let next = Next::new(rest, self.handler, self.cancel);
                behavior.handle(request, next, self.cancel).await
            }
            None => self.handler.handle(request, self.cancel).await,
        }
    }

    /// Number of behaviors still ahead of the handler.
    pub fn remaining(&self) -> usize {
        self.behaviors.len()
    }
}
