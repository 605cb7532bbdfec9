//! Module descriptor, the static `Copy` handle to a group of registrations.

use courier_core::{RegistrationError, RegistryBuilder};

/// Signature of a module's registration function.
pub type RegisterFn = fn(&mut RegistryBuilder) -> Result<(), RegistrationError>;

/// A static, `Copy` descriptor naming a module and how to register it.
///
/// # Creating descriptors
///
/// Use the [`define_module!`](crate::define_module) macro, or
/// [`ModuleDescriptor::new`] with a hand-written registration function.
/// Either way the result can live in a `static` and be handed to a
/// [`Scanner`](crate::Scanner) as a registration root.
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor {
    /// Module name, used in logs, scan reports and `disabled_modules`.
    pub name: &'static str,

    /// Registers the module's handlers and behaviors.
    pub register: RegisterFn,
}

impl ModuleDescriptor {
    pub const fn new(name: &'static str, register: RegisterFn) -> Self {
        Self { name, register }
    }

    /// Runs the registration function against `builder`.
    #[inline]
    pub fn register_into(&self, builder: &mut RegistryBuilder) -> Result<(), RegistrationError> {
        (self.register)(builder)
    }
}
