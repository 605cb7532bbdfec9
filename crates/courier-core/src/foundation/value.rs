//! Type-erased values for the untyped dispatch boundary.
//!
//! A [`BoxedValue`] carries a message or a response whose concrete type is
//! only known at runtime. It remembers the [`TypeId`] and the type name it
//! was built from so the mediator can route it without reflection.
//!
//! Values built with [`BoxedValue::request`] or [`BoxedValue::notification`]
//! also carry their dispatch shape, so a message type the registry has never
//! seen still reaches the typed path and fails the way a typed call would.

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::dispatch::erased::{self, ErasedDispatch};
use crate::foundation::message::{MessageKind, Notification, Request};

/// An owned, type-erased message or response.
///
/// # Example
///
/// ```rust,ignore
/// let boxed = BoxedValue::request(Divide { a: 10, b: 2 });
/// let response = mediator.send_boxed(boxed).await?;
/// assert_eq!(response.and_then(|v| v.downcast::<i64>().ok()), Some(5));
/// ```
pub struct BoxedValue {
    inner: Box<dyn Any + Send>,
    type_id: TypeId,
    type_name: &'static str,
    shape: Option<Shape>,
}

#[derive(Clone, Copy)]
struct Shape {
    kind: MessageKind,
    dispatch: ErasedDispatch,
}

impl BoxedValue {
    /// Erases `value`, recording its runtime type.
    ///
    /// The value carries no dispatch shape; the mediator routes it only if
    /// its type is registered. Use this for responses and arbitrary values.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            shape: None,
        }
    }

    /// Erases a request together with its dispatch shape.
    pub fn request<R: Request>(request: R) -> Self {
        Self {
            shape: Some(Shape {
                kind: MessageKind::of_request::<R>(),
                dispatch: ErasedDispatch::Request(erased::send_boxed::<R>),
            }),
            ..Self::new(request)
        }
    }

    /// Erases a notification together with its dispatch shape.
    pub fn notification<N: Notification>(notification: N) -> Self {
        Self {
            shape: Some(Shape {
                kind: MessageKind::Notification,
                dispatch: ErasedDispatch::Notification(erased::publish_boxed::<N>),
            }),
            ..Self::new(notification)
        }
    }

    /// The message shape recorded at construction, if any.
    pub fn kind(&self) -> Option<MessageKind> {
        self.shape.map(|shape| shape.kind)
    }

    pub(crate) fn dispatch(&self) -> Option<ErasedDispatch> {
        self.shape.map(|shape| shape.dispatch)
    }

    /// The [`TypeId`] of the erased value.
    pub fn value_type(&self) -> TypeId {
        self.type_id
    }

    /// The type name of the erased value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Checks whether the erased value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Recovers the concrete value, or returns `self` unchanged on a mismatch.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let Self {
            inner,
            type_id,
            type_name,
            shape,
        } = self;
        match inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self {
                inner,
                type_id,
                type_name,
                shape,
            }),
        }
    }
}

impl fmt::Debug for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedValue")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}
