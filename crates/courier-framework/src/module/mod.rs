//! Handler modules - named groups of registrations.
//!
//! A module bundles the handlers and behaviors of one feature area behind a
//! [`ModuleDescriptor`]. Modules are never discovered from global state: the
//! application lists them explicitly and hands them to a
//! [`Scanner`](crate::Scanner), which registers each one in isolation.
//!
//! ```rust,ignore
//! pub static MATH: ModuleDescriptor = define_module! {
//!     name: "math",
//!     requests: [Divide => DivideHandler],
//!     notifications: [UserCreated => AuditLog],
//!     behaviors: [Divide => ValidationBehavior],
//! };
//! ```

mod descriptor;
mod macros;

pub use descriptor::{ModuleDescriptor, RegisterFn};
