// ─── define_module! ──────────────────────────────────────────────────────────

/// Creates a [`ModuleDescriptor`], the static `Copy` handle to a module.
///
/// # Syntax
///
/// ```rust,ignore
/// use courier::prelude::*;
///
/// pub static MATH: ModuleDescriptor = define_module! {
///     name: "math",
///
///     // Request type => handler type (one handler per request)
///     requests: [Divide => DivideHandler],
///
///     // Notification type => handler type (any number per notification)
///     notifications: [
///         UserCreated => AuditLog,
///         UserCreated => WelcomeMailer,
///     ],
///
///     // Request type => behavior type, in pipeline order
///     behaviors: [
///         Divide => TracingBehavior,
///         Divide => ValidationBehavior,
///     ],
///
///     // JSON names
///     expose_requests: [Divide => "math.divide"],
///     expose_notifications: [UserCreated => "user.created"],
///
///     // Extra registrations that need more than `Default`
///     register: register_math_extras,
/// };
/// ```
///
/// ## Field reference
///
/// Fields are optional except `name`, and must appear in this order.
///
/// | Field | Description |
/// |-------|-------------|
/// | `name` | Module name, used in scan reports and `disabled_modules` |
/// | `requests` | `[Request => Handler, …]`, transient, built with `Default` |
/// | `notifications` | `[Notification => Handler, …]`, transient, built with `Default` |
/// | `behaviors` | `[Request => Behavior, …]`, built once with `Default` |
/// | `declare_requests` | `[Request, …]`, known types without a handler here |
/// | `declare_notifications` | `[Notification, …]`, known types without a handler here |
/// | `expose_requests` | `[Request => "name", …]` |
/// | `expose_notifications` | `[Notification => "name", …]` |
/// | `register` | `fn(&mut RegistryBuilder) -> Result<(), RegistrationError>` run last |
///
/// [`ModuleDescriptor`]: crate::ModuleDescriptor
#[macro_export]
macro_rules! define_module {
    (
        name: $name:literal
        $(, requests: [$($req:ty => $handler:ty),* $(,)?])?
        $(, notifications: [$($note:ty => $listener:ty),* $(,)?])?
        $(, behaviors: [$($target:ty => $behavior:ty),* $(,)?])?
        $(, declare_requests: [$($declared:ty),* $(,)?])?
        $(, declare_notifications: [$($declared_note:ty),* $(,)?])?
        $(, expose_requests: [$($exposed_req:ty => $req_name:literal),* $(,)?])?
        $(, expose_notifications: [$($exposed_note:ty => $note_name:literal),* $(,)?])?
        $(, register: $custom:path)?
        $(,)?
    ) => {{
        fn __courier_register(
            builder: &mut $crate::__private::RegistryBuilder,
        ) -> ::std::result::Result<(), $crate::__private::RegistrationError> {
            $($(
                builder.register_request_factory::<$req, _, _>(
                    <$handler as ::std::default::Default>::default,
                )?;
            )*)?
            $($(
                builder.register_notification_factory::<$note, _, _>(
                    <$listener as ::std::default::Default>::default,
                )?;
            )*)?
            $($(
                builder.register_behavior::<$target, _>(
                    <$behavior as ::std::default::Default>::default(),
                )?;
            )*)?
            $($(
                builder.declare_request::<$declared>()?;
            )*)?
            $($(
                builder.declare_notification::<$declared_note>()?;
            )*)?
            $($(
                builder.expose_request::<$exposed_req>($req_name)?;
            )*)?
            $($(
                builder.expose_notification::<$exposed_note>($note_name)?;
            )*)?
            $(
                $custom(builder)?;
            )?
            ::std::result::Result::Ok(())
        }

        $crate::ModuleDescriptor::new($name, __courier_register)
    }};
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;

    use crate::ModuleDescriptor;
    use courier_core::{
        BoxError, CancellationToken, MessageKind, Notification, NotificationHandler,
        RegistrationError, Registry, RegistryBuilder, Request, RequestHandler, async_trait,
    };

    struct Ping;

    impl Request for Ping {
        type Response = String;
    }

    struct Tick;

    impl Notification for Tick {}

    #[derive(Default)]
    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(&self, _: Ping, _: &CancellationToken) -> Result<String, BoxError> {
            Ok("pong".to_string())
        }
    }

    #[derive(Default)]
    struct TickHandler;

    #[async_trait]
    impl NotificationHandler<Tick> for TickHandler {
        async fn handle(&self, _: &Tick, _: &CancellationToken) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn fail(_: &mut RegistryBuilder) -> Result<(), RegistrationError> {
        Err(RegistrationError::module("database unavailable"))
    }

    static FULL: ModuleDescriptor = define_module! {
        name: "full",
        requests: [Ping => PingHandler],
        notifications: [Tick => TickHandler, Tick => TickHandler],
    };

    static DECLARED: ModuleDescriptor = define_module! {
        name: "declared",
        declare_requests: [Ping],
        declare_notifications: [Tick],
    };

    static NAME_ONLY: ModuleDescriptor = define_module! { name: "empty" };

    static FAILING: ModuleDescriptor = define_module! {
        name: "failing",
        notifications: [Tick => TickHandler],
        register: fail,
    };

    #[test]
    fn test_define_module_registers_transient_handlers() {
        let mut builder = Registry::builder();
        FULL.register_into(&mut builder).unwrap();
        let registry = builder.build();

        let stats = registry.stats();
        assert_eq!(stats.request_handlers, 1);
        assert_eq!(stats.notification_handlers, 2);
        assert_eq!(
            registry.handler_lifetime::<Ping>(),
            Some(courier_core::Lifetime::Transient)
        );
        assert_eq!(FULL.name, "full");
    }

    #[test]
    fn test_define_module_declares_shapes() {
        let mut builder = Registry::builder();
        DECLARED.register_into(&mut builder).unwrap();
        let registry = builder.build();

        let kind = |id| registry.message_info(id).map(|info| info.kind);
        assert_eq!(kind(TypeId::of::<Ping>()), Some(MessageKind::Request));
        assert_eq!(kind(TypeId::of::<Tick>()), Some(MessageKind::Notification));
        assert_eq!(registry.stats().notification_handlers, 0);
    }

    #[test]
    fn test_define_module_without_fields() {
        let mut builder = Registry::builder();
        NAME_ONLY.register_into(&mut builder).unwrap();
        assert!(builder.is_empty());
    }

    #[test]
    fn test_custom_register_runs_last() {
        let mut builder = Registry::builder();
        let error = FAILING.register_into(&mut builder).unwrap_err();
        assert_eq!(error.to_string(), "database unavailable");
    }
}
