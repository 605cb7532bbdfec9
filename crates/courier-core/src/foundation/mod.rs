//! Foundation layer - message capabilities, erased values and errors.
//!
//! This module contains the types every other part of Courier builds on:
//! - Message traits and the [`MessageKind`] classification
//! - [`BoxedValue`] for the untyped dispatch boundary
//! - The dispatch and registration error taxonomy

pub mod error;
pub mod message;
pub mod value;

pub use error::{
    BoxError, HandlerFailure, MediatorError, MediatorResult, PublishError, RegistrationError,
};
pub use message::{MessageInfo, MessageKind, Notification, Request, Unit};
pub use value::BoxedValue;
