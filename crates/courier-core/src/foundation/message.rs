//! Message capabilities for the Courier mediator.
//!
//! Every value that travels through the mediator has exactly one of three
//! shapes:
//!
//! - [`Request`] - expects exactly one handler and produces a typed response
//! - A void request - a [`Request`] whose response is [`Unit`]
//! - [`Notification`] - broadcast by reference to zero or more handlers
//!
//! The shape of a type is captured once, when it is registered, as a
//! [`MessageKind`]. Dispatch never re-derives it.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_core::{Notification, Request};
//!
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct UserCreated {
//!     name: String,
//! }
//!
//! impl Notification for UserCreated {}
//! ```

use std::any::{TypeId, type_name};
use std::fmt;

/// The response type of a request that produces nothing.
///
/// A request declaring `type Response = Unit` travels through the same
/// handler lookup and pipeline as any other request.
pub type Unit = ();

// ============================================================================
// Message Traits
// ============================================================================

/// A message that expects exactly one handler and a typed response.
///
/// The request is moved into the pipeline, so behaviors may transform it on
/// the way to the handler without cloning.
pub trait Request: Send + 'static {
    /// The value produced by the handler.
    type Response: Send + 'static;
}

/// A message broadcast to every registered handler.
///
/// Handlers receive the notification by reference, which is why it must be
/// `Sync`: concurrently polled handlers share the same value.
pub trait Notification: Send + Sync + 'static {}

// ============================================================================
// Message Kind
// ============================================================================

/// The dispatch shape of a registered message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A request with a non-unit response.
    Request,
    /// A request whose response is [`Unit`].
    VoidRequest,
    /// A fan-out notification.
    Notification,
}

impl MessageKind {
    /// Classifies a request type by its response.
    pub fn of_request<R: Request>() -> Self {
        if TypeId::of::<R::Response>() == TypeId::of::<Unit>() {
            Self::VoidRequest
        } else {
            Self::Request
        }
    }

    /// Returns `true` for both request shapes.
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request | Self::VoidRequest)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::VoidRequest => "void request",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Message Info
// ============================================================================

/// Runtime identity of a registered message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageInfo {
    /// The [`TypeId`] used as the registry key.
    pub type_id: TypeId,
    /// The fully qualified type name, for diagnostics.
    pub type_name: &'static str,
    /// The dispatch shape fixed at registration.
    pub kind: MessageKind,
}

impl MessageInfo {
    /// Describes a request type.
    pub fn request<R: Request>() -> Self {
        Self {
            type_id: TypeId::of::<R>(),
            type_name: type_name::<R>(),
            kind: MessageKind::of_request::<R>(),
        }
    }

    /// Describes a notification type.
    pub fn notification<N: Notification>() -> Self {
        Self {
            type_id: TypeId::of::<N>(),
            type_name: type_name::<N>(),
            kind: MessageKind::Notification,
        }
    }
}
