//! Error types for the Courier core.
//!
//! Two families are defined here:
//!
//! - [`MediatorError`] - everything a dispatch call can return
//! - [`RegistrationError`] - everything registry construction can reject
//!
//! Handlers and behaviors report failures as [`BoxError`]. The mediator hands
//! those back to the caller untouched inside [`MediatorError::Handler`], so
//! the original error stays reachable through `downcast_ref`.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use super::message::MessageKind;

/// The error type handlers and behaviors return.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Result alias for dispatch operations.
pub type MediatorResult<T> = Result<T, MediatorError>;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors returned by [`Mediator`](crate::Mediator) dispatch calls.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// No handler is registered for the request type.
    #[error("no handler registered for `{message}`")]
    HandlerNotFound {
        /// Type name of the request.
        message: &'static str,
    },

    /// The value does not have the shape the call expects.
    #[error("`{type_name}` cannot be dispatched as a {expected}")]
    UnsupportedMessageShape {
        /// Type name of the offending value.
        type_name: &'static str,
        /// The shape the call required.
        expected: &'static str,
    },

    /// A handler or behavior failed. The original error is kept as-is.
    #[error("{0}")]
    Handler(#[source] BoxError),

    /// One or more notification handlers failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// No message type is exposed under the given name.
    #[error("no message exposed under the name `{0}`")]
    UnknownMessageName(String),

    /// A JSON payload could not be decoded or a response could not be encoded.
    #[error("{message}")]
    Codec {
        /// What was being converted.
        message: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl MediatorError {
    /// Wraps an error returned by a handler or behavior.
    ///
    /// A `MediatorError` that a handler forwarded with `?` (for example the
    /// result of a nested `send`) is unwrapped back to itself.
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<MediatorError>() {
            Ok(inner) => *inner,
            Err(error) => Self::Handler(error),
        }
    }

    /// Borrows the original handler error as `E`.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Handler(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Takes the original handler error out of the wrapper.
    pub fn into_handler_error(self) -> Result<BoxError, Self> {
        match self {
            Self::Handler(error) => Ok(error),
            other => Err(other),
        }
    }

    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }
}

// =============================================================================
// Publish Errors
// =============================================================================

/// A single failed notification handler.
#[derive(Debug)]
pub struct HandlerFailure {
    handler: &'static str,
    error: BoxError,
}

impl HandlerFailure {
    pub fn new(handler: &'static str, error: BoxError) -> Self {
        Self { handler, error }
    }

    /// Name of the handler that failed.
    pub fn handler(&self) -> &'static str {
        self.handler
    }

    /// The error the handler returned.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.error.as_ref()
    }

    pub fn into_error(self) -> BoxError {
        self.error
    }
}

/// Aggregated failures from one `publish` call.
///
/// Every handler has already run to completion when this error is returned.
#[derive(Debug)]
pub struct PublishError {
    notification: &'static str,
    total: usize,
    failures: Vec<HandlerFailure>,
}

impl PublishError {
    pub fn new(notification: &'static str, total: usize, failures: Vec<HandlerFailure>) -> Self {
        Self {
            notification,
            total,
            failures,
        }
    }

    /// Type name of the published notification.
    pub fn notification(&self) -> &'static str {
        self.notification
    }

    /// Number of handlers that were invoked.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The failed handlers, in registration order.
    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<HandlerFailure> {
        self.failures
    }
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} handlers failed for `{}`",
            self.failures.len(),
            self.total,
            self.notification
        )?;
        for (index, failure) in self.failures.iter().enumerate() {
            let sep = if index == 0 { ": " } else { "; " };
            write!(f, "{sep}{} ({})", failure.handler, failure.error)?;
        }
        Ok(())
    }
}

impl StdError for PublishError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.failures
            .first()
            .map(|failure| failure.error.as_ref() as &(dyn StdError + 'static))
    }
}

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while building a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A second handler was registered for a request type.
    #[error("a handler for `{message}` is already registered")]
    AmbiguousHandler {
        /// Type name of the request.
        message: &'static str,
    },

    /// The type is already registered with a different shape.
    #[error("`{message}` is already registered as a {existing}, not a {requested}")]
    KindConflict {
        /// Type name of the message.
        message: &'static str,
        /// The shape already on record.
        existing: MessageKind,
        /// The shape of the rejected registration.
        requested: MessageKind,
    },

    /// The JSON name is already exposed by another type.
    #[error("the name `{0}` is already exposed")]
    DuplicateName(String),

    /// A module's own registration logic failed.
    #[error("{0}")]
    Module(String),
}

impl RegistrationError {
    pub fn module(message: impl Into<String>) -> Self {
        Self::Module(message.into())
    }
}
