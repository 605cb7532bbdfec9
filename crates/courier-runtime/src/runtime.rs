//! Runtime assembly: configuration, logging, module scan and mediator.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use courier_runtime::CourierRuntime;
//!
//! let runtime = CourierRuntime::builder()
//!     .config_file("courier.toml")
//!     .module(PING_MODULE)
//!     .module(MATH_MODULE)
//!     .build()?;
//!
//! let pong = runtime.send(Ping).await?;
//! runtime.wait_for_shutdown_signal().await;
//! ```

use std::path::Path;

use courier_core::{
    BoxedValue, CancellationToken, Mediator, MediatorResult, Notification, Registry,
    RegistryBuilder, RegistrationError, Request,
};
use courier_framework::{ModuleDescriptor, ScanReport, Scanner};
use serde::Serialize;
use serde_json::Value;
use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigLoader, CourierConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

type Registration = Box<dyn FnOnce(&mut RegistryBuilder) -> Result<(), RegistrationError>>;

/// A configured mediator together with its shutdown signal.
///
/// Dispatch through the runtime passes a child of the runtime's root
/// cancellation token to every handler, so [`shutdown`](Self::shutdown)
/// reaches work in flight. Dispatch through [`mediator`](Self::mediator)
/// does not.
#[derive(Debug)]
pub struct CourierRuntime {
    config: CourierConfig,
    mediator: Mediator,
    report: ScanReport,
    shutdown: CancellationToken,
}

impl CourierRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// The assembled mediator. Clones share the same registry.
    pub fn mediator(&self) -> &Mediator {
        &self.mediator
    }

    pub fn registry(&self) -> &Registry {
        self.mediator.registry()
    }

    /// The outcome of the module scan run at startup.
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub async fn send<R: Request>(&self, request: R) -> MediatorResult<R::Response> {
        let cancel = self.shutdown.child_token();
        self.mediator.send_with(request, &cancel).await
    }

    pub async fn publish<N: Notification>(&self, notification: N) -> MediatorResult<()> {
        let cancel = self.shutdown.child_token();
        self.mediator.publish_with(notification, &cancel).await
    }

    pub async fn send_boxed(&self, request: BoxedValue) -> MediatorResult<Option<BoxedValue>> {
        let cancel = self.shutdown.child_token();
        self.mediator.send_boxed_with(request, &cancel).await
    }

    pub async fn publish_boxed(&self, notification: BoxedValue) -> MediatorResult<()> {
        let cancel = self.shutdown.child_token();
        self.mediator.publish_boxed_with(notification, &cancel).await
    }

    pub async fn send_json(&self, name: &str, payload: Value) -> MediatorResult<Value> {
        let cancel = self.shutdown.child_token();
        self.mediator.send_json_with(name, payload, &cancel).await
    }

    pub async fn publish_json(&self, name: &str, payload: Value) -> MediatorResult<()> {
        let cancel = self.shutdown.child_token();
        self.mediator.publish_json_with(name, payload, &cancel).await
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// A token that is cancelled when the runtime shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Cancels the root token. Handlers observing their token stop early.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Courier runtime shutting down");
            self.shutdown.cancel();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Waits for Ctrl+C, SIGTERM on unix, or a call to [`shutdown`](Self::shutdown),
    /// then cancels the root token.
    pub async fn wait_for_shutdown_signal(&self) {
        tokio::select! {
            () = ctrl_c() => info!("Received Ctrl+C, shutting down"),
            () = terminate() => info!("Received SIGTERM, shutting down"),
            () = self.shutdown.cancelled() => debug!("Shutdown requested"),
        }
        self.shutdown();
    }
}

async fn ctrl_c() {
    if let Err(error) = signal::ctrl_c().await {
        warn!(%error, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(error) => {
            warn!(%error, "Failed to register SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`CourierRuntime`].
///
/// Startup runs in this order:
///
/// 1. load the configuration (unless one was given) and validate it
/// 2. install the logging subscriber
/// 3. scan the modules, skipping `mediator.disabled_modules`
/// 4. in strict mode, fail if any module was skipped
/// 5. apply direct registrations
/// 6. freeze the registry
pub struct RuntimeBuilder {
    loader: ConfigLoader,
    config: Option<CourierConfig>,
    modules: Vec<ModuleDescriptor>,
    registrations: Vec<Registration>,
    init_logging: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
            config: None,
            modules: Vec::new(),
            registrations: Vec::new(),
            init_logging: true,
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Overrides one configuration key on top of every other source.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.loader = self.loader.set(key, value);
        self
    }

    /// Uses `config` as is, skipping every configuration source.
    pub fn config(mut self, config: CourierConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds a module to the scan. Modules register in the order added.
    pub fn module(mut self, module: ModuleDescriptor) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Registers directly on the registry builder, after the module scan.
    ///
    /// Unlike a module, a failure here aborts [`build`](Self::build).
    pub fn register<F>(mut self, registration: F) -> Self
    where
        F: FnOnce(&mut RegistryBuilder) -> Result<(), RegistrationError> + 'static,
    {
        self.registrations.push(Box::new(registration));
        self
    }

    /// Leaves the global subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn build(self) -> RuntimeResult<CourierRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => self.loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let disabled = &config.mediator.disabled_modules;
        for name in disabled {
            if !self.modules.iter().any(|module| module.name == name.as_str()) {
                warn!(module = %name, "Disabled module is not part of the scan");
            }
        }

        let mut builder = Registry::builder();
        let report = Scanner::new()
            .roots(self.modules)
            .disable_all(disabled.iter().cloned())
            .scan_into(&mut builder);

        if config.mediator.strict && !report.is_clean() {
            error!(
                skipped = report.skipped.len(),
                "Strict mode is on, refusing to start with skipped modules"
            );
            return Err(RuntimeError::StrictScan {
                skipped: report.skipped,
            });
        }

        for registration in self.registrations {
            registration(&mut builder)?;
        }

        let registry = builder.build();
        let stats = registry.stats();
        info!(
            modules = report.loaded.len(),
            request_types = stats.request_types,
            notification_types = stats.notification_types,
            behaviors = stats.behaviors,
            exposed_names = stats.exposed_names,
            strategy = ?config.mediator.publish_strategy,
            "Courier runtime ready"
        );

        let mediator =
            Mediator::new(registry).with_publish_strategy(config.mediator.publish_strategy);

        Ok(CourierRuntime {
            config,
            mediator,
            report,
            shutdown: CancellationToken::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{BoxError, PublishStrategy, RequestHandler, async_trait, handler_fn};
    use courier_framework::{SkipReason, define_module};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    struct Ping;

    impl Request for Ping {
        type Response = String;
    }

    #[derive(Deserialize)]
    struct Add {
        a: i64,
        b: i64,
    }

    impl Request for Add {
        type Response = Sum;
    }

    #[derive(Serialize)]
    struct Sum {
        value: i64,
    }

    struct Wait;

    impl Request for Wait {
        type Response = &'static str;
    }

    #[derive(Default)]
    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(&self, _: Ping, _: &CancellationToken) -> Result<String, BoxError> {
            Ok("pong".to_string())
        }
    }

    #[derive(Default)]
    struct LoudPingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for LoudPingHandler {
        async fn handle(&self, _: Ping, _: &CancellationToken) -> Result<String, BoxError> {
            Ok("PONG".to_string())
        }
    }

    #[derive(Default)]
    struct AddHandler;

    #[async_trait]
    impl RequestHandler<Add> for AddHandler {
        async fn handle(&self, add: Add, _: &CancellationToken) -> Result<Sum, BoxError> {
            Ok(Sum {
                value: add.a + add.b,
            })
        }
    }

    static PING: ModuleDescriptor = define_module! {
        name: "ping",
        requests: [Ping => PingHandler],
    };

    static LOUD: ModuleDescriptor = define_module! {
        name: "loud",
        requests: [Ping => LoudPingHandler],
    };

    static MATH: ModuleDescriptor = define_module! {
        name: "math",
        requests: [Add => AddHandler],
        expose_requests: [Add => "math.add"],
    };

    fn builder(config: CourierConfig) -> RuntimeBuilder {
        CourierRuntime::builder().config(config).without_logging()
    }

    #[tokio::test]
    async fn test_build_and_dispatch() {
        let runtime = assert_ok!(builder(CourierConfig::default())
            .modules([PING, MATH])
            .build());

        assert_eq!(runtime.report().loaded, vec!["ping", "math"]);
        assert_eq!(assert_ok!(runtime.send(Ping).await), "pong");
        assert_eq!(
            assert_ok!(runtime.send_json("math.add", json!({ "a": 2, "b": 3 })).await),
            json!({ "value": 5 })
        );
    }

    #[test]
    fn test_configuration_reaches_mediator_and_scan() {
        let mut config = CourierConfig::default();
        config.mediator.publish_strategy = PublishStrategy::Sequential;
        config.mediator.disabled_modules = vec!["math".into()];

        let runtime = assert_ok!(builder(config).modules([PING, MATH]).build());
        assert_eq!(
            runtime.mediator().publish_strategy(),
            PublishStrategy::Sequential
        );
        assert_eq!(
            runtime.report().skip_reason("math"),
            Some(&SkipReason::Disabled)
        );
    }

    #[test]
    fn test_lenient_scan_skips_conflicting_module() {
        let runtime = assert_ok!(builder(CourierConfig::default())
            .modules([PING, LOUD])
            .build());

        assert!(runtime.report().is_loaded("ping"));
        assert!(matches!(
            runtime.report().skip_reason("loud"),
            Some(SkipReason::Conflict(_))
        ));
    }

    #[test]
    fn test_strict_scan_fails_startup() {
        let mut config = CourierConfig::default();
        config.mediator.strict = true;

        let error = assert_err!(builder(config).modules([PING, LOUD]).build());
        match &error {
            RuntimeError::StrictScan { skipped } => {
                assert_eq!(skipped.len(), 1);
                assert_eq!(skipped[0].name, "loud");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.to_string().starts_with("1 module(s) could not be loaded: loud:"));
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let mut config = CourierConfig::default();
        config.logging.max_files = 0;

        let error = assert_err!(builder(config).build());
        assert!(matches!(error, RuntimeError::Config(_)));
    }

    #[test]
    fn test_direct_registration_failure_aborts() {
        let error = assert_err!(builder(CourierConfig::default())
            .module(PING)
            .register(|registry| {
                registry.register_request_handler::<Ping, _>(LoudPingHandler)?;
                Ok(())
            })
            .build());

        assert!(matches!(
            error,
            RuntimeError::Registration(RegistrationError::AmbiguousHandler { .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_reaches_in_flight_handler() {
        let runtime = assert_ok!(builder(CourierConfig::default())
            .register(|registry| {
                registry.register_request_handler::<Wait, _>(handler_fn(
                    |_: Wait, cancel: CancellationToken| async move {
                        cancel.cancelled().await;
                        Ok::<_, BoxError>("stopped")
                    },
                ))?;
                Ok(())
            })
            .build());

        let (response, ()) = tokio::join!(runtime.send(Wait), async { runtime.shutdown() });
        assert_eq!(assert_ok!(response), "stopped");
        assert!(runtime.is_shutting_down());
        assert!(runtime.shutdown_token().is_cancelled());

        // Already shut down, so this returns without a signal.
        runtime.wait_for_shutdown_signal().await;
    }
}
