//! Erased dispatch entries for the untyped and JSON boundaries.
//!
//! When a message type is registered, the registry stores a function
//! pointer instantiated for that concrete type. Dispatching a
//! [`BoxedValue`] or a JSON payload is then a map lookup followed by an
//! indirect call into the typed path; no reflection is involved.

use std::any::type_name;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::dispatch::mediator::Mediator;
use crate::foundation::error::{MediatorError, MediatorResult};
use crate::foundation::message::{MessageKind, Notification, Request};
use crate::foundation::value::BoxedValue;

pub(crate) type RequestThunk = for<'a> fn(
    &'a Mediator,
    BoxedValue,
    &'a CancellationToken,
) -> BoxFuture<'a, MediatorResult<Option<BoxedValue>>>;

pub(crate) type NotificationThunk =
    for<'a> fn(&'a Mediator, BoxedValue, &'a CancellationToken) -> BoxFuture<'a, MediatorResult<()>>;

pub(crate) type JsonThunk =
    for<'a> fn(&'a Mediator, Value, &'a CancellationToken) -> BoxFuture<'a, MediatorResult<Value>>;

/// The untyped entry point of one registered message type.
#[derive(Clone, Copy)]
pub(crate) enum ErasedDispatch {
    Request(RequestThunk),
    Notification(NotificationThunk),
}

// ============================================================================
// Boxed Values
// ============================================================================

pub(crate) fn send_boxed<'a, R: Request>(
    mediator: &'a Mediator,
    request: BoxedValue,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, MediatorResult<Option<BoxedValue>>> {
    Box::pin(async move {
        let request = request
            .downcast::<R>()
            .map_err(|value| MediatorError::UnsupportedMessageShape {
                type_name: value.type_name(),
                expected: "request",
            })?;
        let response = mediator.send_with(request, cancel).await?;
        Ok(match MessageKind::of_request::<R>() {
            MessageKind::VoidRequest => None,
            _ => Some(BoxedValue::new(response)),
        })
    })
}

pub(crate) fn publish_boxed<'a, N: Notification>(
    mediator: &'a Mediator,
    notification: BoxedValue,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, MediatorResult<()>> {
    Box::pin(async move {
        let notification =
            notification
                .downcast::<N>()
                .map_err(|value| MediatorError::UnsupportedMessageShape {
                    type_name: value.type_name(),
                    expected: "notification",
                })?;
        mediator.publish_with(notification, cancel).await
    })
}

// ============================================================================
// JSON Payloads
// ============================================================================

pub(crate) fn send_json<'a, R>(
    mediator: &'a Mediator,
    payload: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, MediatorResult<Value>>
where
    R: Request + DeserializeOwned,
    R::Response: Serialize,
{
    Box::pin(async move {
        let request: R = serde_json::from_value(payload).map_err(|source| MediatorError::Codec {
            message: format!("failed to decode `{}`", type_name::<R>()),
            source,
        })?;
        let response = mediator.send_with(request, cancel).await?;
        serde_json::to_value(&response).map_err(|source| MediatorError::Codec {
            message: format!("failed to encode the response of `{}`", type_name::<R>()),
            source,
        })
    })
}

pub(crate) fn publish_json<'a, N>(
    mediator: &'a Mediator,
    payload: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, MediatorResult<Value>>
where
    N: Notification + DeserializeOwned,
{
    Box::pin(async move {
        let notification: N =
            serde_json::from_value(payload).map_err(|source| MediatorError::Codec {
                message: format!("failed to decode `{}`", type_name::<N>()),
                source,
            })?;
        mediator.publish_with(notification, cancel).await?;
        Ok(Value::Null)
    })
}
