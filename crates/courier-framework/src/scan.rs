//! Module scanning over explicit registration roots.
//!
//! The [`Scanner`] registers a list of [`ModuleDescriptor`]s into one
//! [`RegistryBuilder`]. Each module is first registered into a staging
//! builder of its own and only then merged, so a module either lands
//! completely or not at all.
//!
//! A module is skipped, never fatal, when:
//!
//! 1. it is disabled by name
//! 2. a module with the same name was already loaded
//! 3. its registration function fails
//! 4. merging it conflicts with an earlier module
//!
//! Each skip is logged at `WARN` and recorded in the [`ScanReport`]. A message
//! type left without a handler surfaces later, at dispatch, as
//! `HandlerNotFound`.

use std::collections::HashSet;
use std::fmt;

use courier_core::{RegistrationError, RegistryBuilder};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::module::ModuleDescriptor;

// ─── Scan report ──────────────────────────────────────────────────────────────

/// Why a module was not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("disabled by configuration")]
    Disabled,

    #[error("a module with the same name is already loaded")]
    DuplicateName,

    #[error("registration failed: {0}")]
    Registration(#[source] RegistrationError),

    #[error("conflicts with an earlier module: {0}")]
    Conflict(#[source] RegistrationError),
}

/// A module left out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModule {
    pub name: &'static str,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// The outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Names of the registered modules, in scan order.
    pub loaded: Vec<&'static str>,
    /// Modules that were left out, in scan order.
    pub skipped: Vec<SkippedModule>,
}

impl ScanReport {
    /// Returns `true` if no module was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|loaded| *loaded == name)
    }

    /// Looks up the skip reason of a module.
    pub fn skip_reason(&self, name: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|skipped| skipped.name == name)
            .map(|skipped| &skipped.reason)
    }
}

// ─── Scanner ──────────────────────────────────────────────────────────────────

/// Registers an explicit list of modules, skipping the ones that cannot load.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = Registry::builder();
/// let report = Scanner::new()
///     .root(PING_MODULE)
///     .root(MATH_MODULE)
///     .disable("experimental")
///     .scan_into(&mut builder);
///
/// for skipped in &report.skipped {
///     eprintln!("skipped {skipped}");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    roots: Vec<ModuleDescriptor>,
    disabled: HashSet<String>,
}

impl Scanner {
    /// Creates a scanner with no roots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration root (builder pattern).
    pub fn root(mut self, module: ModuleDescriptor) -> Self {
        self.roots.push(module);
        self
    }

    /// Adds several registration roots, keeping their order.
    pub fn roots(mut self, modules: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        self.roots.extend(modules);
        self
    }

    /// Skips the module with this name.
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.disabled.insert(name.into());
        self
    }

    /// Skips every module with one of these names.
    pub fn disable_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(names.into_iter().map(Into::into));
        self
    }

    /// Returns the number of registration roots.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Registers every root into a fresh builder.
    pub fn scan(&self) -> (RegistryBuilder, ScanReport) {
        let mut builder = RegistryBuilder::new();
        let report = self.scan_into(&mut builder);
        (builder, report)
    }

    /// Registers every root into `builder`, in order.
    pub fn scan_into(&self, builder: &mut RegistryBuilder) -> ScanReport {
        let mut report = ScanReport::default();

        for module in &self.roots {
            match self.load(module, builder, &report) {
                Ok(()) => {
                    debug!(module = module.name, "Module loaded");
                    report.loaded.push(module.name);
                }
                Err(reason) => {
                    warn!(module = module.name, reason = %reason, "Skipping module");
                    report.skipped.push(SkippedModule {
                        name: module.name,
                        reason,
                    });
                }
            }
        }

        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            "Module scan complete"
        );
        report
    }

    fn load(
        &self,
        module: &ModuleDescriptor,
        builder: &mut RegistryBuilder,
        report: &ScanReport,
    ) -> Result<(), SkipReason> {
        if self.disabled.contains(module.name) {
            return Err(SkipReason::Disabled);
        }
        if report.is_loaded(module.name) {
            return Err(SkipReason::DuplicateName);
        }

        let mut staging = RegistryBuilder::new();
        module
            .register_into(&mut staging)
            .map_err(SkipReason::Registration)?;
        builder.merge(staging).map_err(SkipReason::Conflict)
    }
}
