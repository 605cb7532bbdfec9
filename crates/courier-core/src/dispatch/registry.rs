//! Handler and behavior registry.
//!
//! The registry maps the exact runtime type of a message to what handles it:
//!
//! - one request handler plus an ordered list of pipeline behaviors for each
//!   request type
//! - an ordered list of handlers for each notification type
//!
//! Registration happens on a mutable [`RegistryBuilder`] at startup. Calling
//! [`build`](RegistryBuilder::build) freezes it into an immutable
//! [`Registry`] that is shared behind an `Arc` and read without locks.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut builder = Registry::builder();
//! builder
//!     .register_request_handler::<Ping, _>(PingHandler)?
//!     .register_behavior::<Ping, _>(TracingBehavior)?
//!     .register_notification_factory::<UserCreated, _, _>(AuditLog::default)?;
//! let registry = builder.build();
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::dispatch::erased::{self, ErasedDispatch, JsonThunk};
use crate::dispatch::handler::{NotificationHandler, RequestHandler};
use crate::dispatch::pipeline::PipelineBehavior;
use crate::foundation::error::{MediatorError, MediatorResult, RegistrationError};
use crate::foundation::message::{MessageInfo, MessageKind, Notification, Request};

// ============================================================================
// Handler Lifetime
// ============================================================================

/// How handler instances are provided to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One shared instance serves every call.
    Singleton,
    /// A factory builds a fresh instance for every call.
    Transient,
}

type Factory<T> = Arc<dyn Fn() -> Arc<T> + Send + Sync>;

enum Provider<T: ?Sized> {
    Singleton(Arc<T>),
    Transient(Factory<T>),
}

impl<T: ?Sized> Provider<T> {
    fn get(&self) -> Arc<T> {
        match self {
            Self::Singleton(instance) => instance.clone(),
            Self::Transient(factory) => factory(),
        }
    }

    fn lifetime(&self) -> Lifetime {
        match self {
            Self::Singleton(_) => Lifetime::Singleton,
            Self::Transient(_) => Lifetime::Transient,
        }
    }
}

// ============================================================================
// Typed Slots
// ============================================================================

/// Everything registered for one message type, behind type erasure.
trait Slot: Send + Sync {
    fn info(&self) -> MessageInfo;

    fn handler_count(&self) -> usize;

    fn behavior_count(&self) -> usize;

    fn dispatch(&self) -> ErasedDispatch;

    /// Rejects a merge that would leave this type in an invalid state.
    fn check_merge(&self, incoming: &dyn Slot) -> Result<(), RegistrationError>;

    /// Appends the registrations of `incoming`, which has passed `check_merge`.
    fn absorb(&mut self, incoming: Box<dyn Slot>);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

fn kind_conflict(existing: MessageInfo, requested: MessageInfo) -> RegistrationError {
    RegistrationError::KindConflict {
        message: existing.type_name,
        existing: existing.kind,
        requested: requested.kind,
    }
}

struct RequestSlot<R: Request> {
    handler: Option<Provider<dyn RequestHandler<R>>>,
    behaviors: Vec<Arc<dyn PipelineBehavior<R>>>,
}

impl<R: Request> RequestSlot<R> {
    fn new() -> Self {
        Self {
            handler: None,
            behaviors: Vec::new(),
        }
    }
}

impl<R: Request> Slot for RequestSlot<R> {
    fn info(&self) -> MessageInfo {
        MessageInfo::request::<R>()
    }

    fn handler_count(&self) -> usize {
        usize::from(self.handler.is_some())
    }

    fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    fn dispatch(&self) -> ErasedDispatch {
        ErasedDispatch::Request(erased::send_boxed::<R>)
    }

    fn check_merge(&self, incoming: &dyn Slot) -> Result<(), RegistrationError> {
        let Some(other) = incoming.as_any().downcast_ref::<Self>() else {
            return Err(kind_conflict(self.info(), incoming.info()));
        };
        if self.handler.is_some() && other.handler.is_some() {
            return Err(RegistrationError::AmbiguousHandler {
                message: self.info().type_name,
            });
        }
        Ok(())
    }

    fn absorb(&mut self, incoming: Box<dyn Slot>) {
        if let Ok(other) = incoming.into_any().downcast::<Self>() {
            let other = *other;
            if self.handler.is_none() {
                self.handler = other.handler;
            }
            self.behaviors.extend(other.behaviors);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

struct NotificationSlot<N: Notification> {
    handlers: Vec<Provider<dyn NotificationHandler<N>>>,
}

impl<N: Notification> Slot for NotificationSlot<N> {
    fn info(&self) -> MessageInfo {
        MessageInfo::notification::<N>()
    }

    fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn behavior_count(&self) -> usize {
        0
    }

    fn dispatch(&self) -> ErasedDispatch {
        ErasedDispatch::Notification(erased::publish_boxed::<N>)
    }

    fn check_merge(&self, incoming: &dyn Slot) -> Result<(), RegistrationError> {
        if incoming.as_any().is::<Self>() {
            Ok(())
        } else {
            Err(kind_conflict(self.info(), incoming.info()))
        }
    }

    fn absorb(&mut self, incoming: Box<dyn Slot>) {
        if let Ok(other) = incoming.into_any().downcast::<Self>() {
            self.handlers.extend(other.handlers);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// ============================================================================
// Exposed Names
// ============================================================================

#[derive(Clone, Copy)]
pub(crate) struct JsonEntry {
    pub(crate) info: MessageInfo,
    pub(crate) thunk: JsonThunk,
}

// ============================================================================
// Registry Builder
// ============================================================================

/// Mutable registration surface used at startup.
///
/// Every method validates eagerly: a request type never ends up with two
/// handlers, and a type is never registered as both a request and a
/// notification.
#[derive(Default)]
pub struct RegistryBuilder {
    slots: HashMap<TypeId, Box<dyn Slot>>,
    names: HashMap<String, JsonEntry>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn request_slot<R: Request>(&mut self) -> Result<&mut RequestSlot<R>, RegistrationError> {
        let info = MessageInfo::request::<R>();
        let slot = self
            .slots
            .entry(info.type_id)
            .or_insert_with(|| Box::new(RequestSlot::<R>::new()));
        let existing = slot.info();
        slot.as_any_mut()
            .downcast_mut::<RequestSlot<R>>()
            .ok_or_else(|| kind_conflict(existing, info))
    }

    fn notification_slot<N: Notification>(
        &mut self,
    ) -> Result<&mut NotificationSlot<N>, RegistrationError> {
        let info = MessageInfo::notification::<N>();
        let slot = self.slots.entry(info.type_id).or_insert_with(|| {
            Box::new(NotificationSlot::<N> {
                handlers: Vec::new(),
            })
        });
        let existing = slot.info();
        slot.as_any_mut()
            .downcast_mut::<NotificationSlot<N>>()
            .ok_or_else(|| kind_conflict(existing, info))
    }

    fn set_request_handler<R: Request>(
        &mut self,
        provider: Provider<dyn RequestHandler<R>>,
    ) -> Result<&mut Self, RegistrationError> {
        let slot = self.request_slot::<R>()?;
        if slot.handler.is_some() {
            return Err(RegistrationError::AmbiguousHandler {
                message: std::any::type_name::<R>(),
            });
        }
        slot.handler = Some(provider);
        Ok(self)
    }

    /// Registers the single handler of `R` as a shared instance.
    pub fn register_request_handler<R, H>(
        &mut self,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.set_request_handler::<R>(Provider::Singleton(handler))
    }

    /// Registers the single handler of `R`, built fresh by `factory` on every call.
    pub fn register_request_factory<R, H, F>(
        &mut self,
        factory: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: Factory<dyn RequestHandler<R>> =
            Arc::new(move || Arc::new(factory()) as Arc<dyn RequestHandler<R>>);
        self.set_request_handler::<R>(Provider::Transient(factory))
    }

    /// Adds a handler for `N` as a shared instance.
    pub fn register_notification_handler<N, H>(
        &mut self,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        N: Notification,
        H: NotificationHandler<N>,
    {
        let handler: Arc<dyn NotificationHandler<N>> = Arc::new(handler);
        self.notification_slot::<N>()?
            .handlers
            .push(Provider::Singleton(handler));
        Ok(self)
    }

    /// Adds a handler for `N`, built fresh by `factory` on every publish.
    pub fn register_notification_factory<N, H, F>(
        &mut self,
        factory: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        N: Notification,
        H: NotificationHandler<N>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: Factory<dyn NotificationHandler<N>> =
            Arc::new(move || Arc::new(factory()) as Arc<dyn NotificationHandler<N>>);
        self.notification_slot::<N>()?
            .handlers
            .push(Provider::Transient(factory));
        Ok(self)
    }

    /// Appends a pipeline behavior for `R`. Behaviors run in the order they
    /// are registered.
    pub fn register_behavior<R, B>(&mut self, behavior: B) -> Result<&mut Self, RegistrationError>
    where
        R: Request,
        B: PipelineBehavior<R>,
    {
        self.request_slot::<R>()?.behaviors.push(Arc::new(behavior));
        Ok(self)
    }

    /// Records `R` as a known request type without a handler.
    ///
    /// Untyped dispatch of a declared type reports
    /// [`MediatorError::HandlerNotFound`] rather than an unknown shape.
    pub fn declare_request<R: Request>(&mut self) -> Result<&mut Self, RegistrationError> {
        self.request_slot::<R>()?;
        Ok(self)
    }

    /// Records `N` as a known notification type without handlers.
    pub fn declare_notification<N: Notification>(
        &mut self,
    ) -> Result<&mut Self, RegistrationError> {
        self.notification_slot::<N>()?;
        Ok(self)
    }

    fn expose(&mut self, name: String, entry: JsonEntry) -> Result<&mut Self, RegistrationError> {
        match self.names.entry(name) {
            Entry::Occupied(occupied) => {
                Err(RegistrationError::DuplicateName(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(self)
            }
        }
    }

    /// Makes `R` reachable through [`Mediator::send_json`](crate::Mediator::send_json).
    pub fn expose_request<R>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<&mut Self, RegistrationError>
    where
        R: Request + DeserializeOwned,
        R::Response: Serialize,
    {
        self.request_slot::<R>()?;
        self.expose(
            name.into(),
            JsonEntry {
                info: MessageInfo::request::<R>(),
                thunk: erased::send_json::<R>,
            },
        )
    }

    /// Makes `N` reachable through [`Mediator::publish_json`](crate::Mediator::publish_json).
    pub fn expose_notification<N>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<&mut Self, RegistrationError>
    where
        N: Notification + DeserializeOwned,
    {
        self.notification_slot::<N>()?;
        self.expose(
            name.into(),
            JsonEntry {
                info: MessageInfo::notification::<N>(),
                thunk: erased::publish_json::<N>,
            },
        )
    }

    /// Moves every registration of `other` into this builder.
    ///
    /// All conflicts are checked before anything changes, so a failed merge
    /// leaves `self` untouched. Behaviors and notification handlers from
    /// `other` run after the ones already registered here.
    pub fn merge(&mut self, other: RegistryBuilder) -> Result<(), RegistrationError> {
        for (type_id, incoming) in &other.slots {
            if let Some(existing) = self.slots.get(type_id) {
                existing.check_merge(incoming.as_ref())?;
            }
        }
        if let Some(name) = other.names.keys().find(|name| self.names.contains_key(*name)) {
            return Err(RegistrationError::DuplicateName(name.clone()));
        }

        for (type_id, incoming) in other.slots {
            match self.slots.entry(type_id) {
                Entry::Occupied(mut occupied) => occupied.get_mut().absorb(incoming),
                Entry::Vacant(vacant) => {
                    vacant.insert(incoming);
                }
            }
        }
        self.names.extend(other.names);
        Ok(())
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.names.is_empty()
    }

    /// Freezes the builder.
    pub fn build(self) -> Registry {
        Registry {
            slots: self.slots,
            names: self.names,
        }
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("message_types", &self.slots.len())
            .field("exposed_names", &self.names.len())
            .finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Registration counts, for startup logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub request_types: usize,
    pub request_handlers: usize,
    pub behaviors: usize,
    pub notification_types: usize,
    pub notification_handlers: usize,
    pub exposed_names: usize,
}

/// The frozen handler registry.
///
/// `Registry` is `Send + Sync`; lookups never lock.
pub struct Registry {
    slots: HashMap<TypeId, Box<dyn Slot>>,
    names: HashMap<String, JsonEntry>,
}

impl Registry {
    /// Starts a new [`RegistryBuilder`].
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    fn request_slot<R: Request>(&self) -> Option<&RequestSlot<R>> {
        self.slots
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.as_any().downcast_ref::<RequestSlot<R>>())
    }

    /// Resolves the handler of `R`.
    ///
    /// A transient handler is built anew by this call.
    pub fn resolve_handler<R: Request>(&self) -> MediatorResult<Arc<dyn RequestHandler<R>>> {
        self.request_slot::<R>()
            .and_then(|slot| slot.handler.as_ref())
            .map(Provider::get)
            .ok_or(MediatorError::HandlerNotFound {
                message: std::any::type_name::<R>(),
            })
    }

    /// The lifetime of `R`'s handler, if one is registered.
    pub fn handler_lifetime<R: Request>(&self) -> Option<Lifetime> {
        self.request_slot::<R>()
            .and_then(|slot| slot.handler.as_ref())
            .map(Provider::lifetime)
    }

    /// The pipeline behaviors of `R`, in registration order.
    pub fn resolve_behaviors<R: Request>(&self) -> &[Arc<dyn PipelineBehavior<R>>] {
        self.request_slot::<R>()
            .map(|slot| slot.behaviors.as_slice())
            .unwrap_or_default()
    }

    /// Resolves every handler of `N`, in registration order. May be empty.
    pub fn resolve_handlers<N: Notification>(&self) -> Vec<Arc<dyn NotificationHandler<N>>> {
        self.slots
            .get(&TypeId::of::<N>())
            .and_then(|slot| slot.as_any().downcast_ref::<NotificationSlot<N>>())
            .map(|slot| slot.handlers.iter().map(Provider::get).collect())
            .unwrap_or_default()
    }

    /// Looks up a registered message type.
    pub fn message_info(&self, type_id: TypeId) -> Option<MessageInfo> {
        self.slots.get(&type_id).map(|slot| slot.info())
    }

    /// Iterates over every registered message type.
    pub fn message_types(&self) -> impl Iterator<Item = MessageInfo> + '_ {
        self.slots.values().map(|slot| slot.info())
    }

    /// Iterates over exposed JSON names and the types behind them.
    pub fn exposed_names(&self) -> impl Iterator<Item = (&str, MessageInfo)> + '_ {
        self.names
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.info))
    }

    pub(crate) fn dispatcher(&self, type_id: TypeId) -> Option<ErasedDispatch> {
        self.slots.get(&type_id).map(|slot| slot.dispatch())
    }

    pub(crate) fn json_entry(&self, name: &str) -> Option<JsonEntry> {
        self.names.get(name).copied()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            exposed_names: self.names.len(),
            ..RegistryStats::default()
        };
        for slot in self.slots.values() {
            if slot.info().kind == MessageKind::Notification {
                stats.notification_types += 1;
                stats.notification_handlers += slot.handler_count();
            } else {
                stats.request_types += 1;
                stats.request_handlers += slot.handler_count();
                stats.behaviors += slot.behavior_count();
            }
        }
        stats
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("stats", &self.stats())
            .finish()
    }
}
