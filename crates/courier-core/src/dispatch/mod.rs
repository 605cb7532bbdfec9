//! Dispatch layer - handlers, pipelines, the registry and the mediator.
//!
//! This module contains everything between a caller and a handler:
//! - Handler traits and closure adapters
//! - Pipeline behaviors and the [`Next`] continuation
//! - The [`RegistryBuilder`] / [`Registry`] pair
//! - The [`Mediator`] with typed, untyped and JSON entry points

pub(crate) mod erased;
pub mod handler;
pub mod mediator;
pub mod pipeline;
pub mod registry;

pub use handler::{
    HandlerFn, NotificationFn, NotificationHandler, RequestHandler, handler_fn, notification_fn,
};
pub use mediator::{Mediator, PublishStrategy};
pub use pipeline::{Next, PipelineBehavior};
pub use registry::{Lifetime, Registry, RegistryBuilder, RegistryStats};
