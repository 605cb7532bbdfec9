//! # Courier Framework
//!
//! Higher-level building blocks on top of `courier-core`.
//!
//! This layer provides:
//! - Handler modules: named groups of registrations ([`ModuleDescriptor`], [`define_module!`])
//! - Module scanning over explicit roots, with skip diagnostics ([`Scanner`], [`ScanReport`])
//! - Built-in pipeline behaviors for tracing, validation and cancellation
//!
//! Nothing here is needed to dispatch messages; it only makes assembling a
//! registry from many feature areas convenient.

pub mod behavior;
pub mod module;
pub mod scan;

pub use behavior::{
    CancellationGuard, Cancelled, TracingBehavior, Validate, ValidationBehavior, ValidationError,
};
pub use module::{ModuleDescriptor, RegisterFn};
pub use scan::{ScanReport, Scanner, SkipReason, SkippedModule};

#[doc(hidden)]
pub mod __private {
    pub use courier_core::{RegistrationError, RegistryBuilder};
}
