//! Built-in pipeline behaviors.
//!
//! | Behavior | Applies to | Effect |
//! |----------|------------|--------|
//! | [`TracingBehavior`] | any request | span, timing and outcome logs |
//! | [`ValidationBehavior`] | `R: Validate` | rejects invalid requests before the handler |
//! | [`CancellationGuard`] | any request | rejects requests whose token is already cancelled |
//!
//! Register them like any other behavior. Order matters: behaviors run in
//! registration order, so a guard registered first also skips the ones
//! after it.

mod cancellation;
mod trace;
mod validation;

pub use self::cancellation::{CancellationGuard, Cancelled};
pub use self::trace::TracingBehavior;
pub use self::validation::{Validate, ValidationBehavior, ValidationError};
