//! Handler modules of the demo.
//!
//! Handlers listed in `define_module!` are built with `Default` for every
//! dispatch, so the counters they share live in statics.

use std::sync::atomic::{AtomicUsize, Ordering};

use courier::prelude::*;
use tracing::info;

use crate::messages::{
    Divide, DivideByZero, DivisionOverflow, Greet, Greeting, Ping, ResetCounters, UserCreated,
};

pub static AUDITED: AtomicUsize = AtomicUsize::new(0);
pub static WELCOMED: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// ping
// ============================================================================

#[derive(Default)]
pub struct PingHandler;

#[async_trait]
impl RequestHandler<Ping> for PingHandler {
    async fn handle(&self, _: Ping, _: &CancellationToken) -> Result<String, BoxError> {
        Ok("pong".to_string())
    }
}

pub static PING: ModuleDescriptor = define_module! {
    name: "ping",
    requests: [Ping => PingHandler],
    behaviors: [Ping => TracingBehavior],
};

// ============================================================================
// math
// ============================================================================

#[derive(Default)]
pub struct DivideHandler;

#[async_trait]
impl RequestHandler<Divide> for DivideHandler {
    async fn handle(&self, divide: Divide, _: &CancellationToken) -> Result<i64, BoxError> {
        if divide.b == 0 {
            return Err(DivideByZero { dividend: divide.a }.into());
        }
        divide.a.checked_div(divide.b).ok_or_else(|| {
            DivisionOverflow {
                dividend: divide.a,
                divisor: divide.b,
            }
            .into()
        })
    }
}

pub static MATH: ModuleDescriptor = define_module! {
    name: "math",
    requests: [Divide => DivideHandler],
    behaviors: [
        Divide => CancellationGuard,
        Divide => TracingBehavior,
    ],
    expose_requests: [Divide => "math.divide"],
};

// ============================================================================
// users
// ============================================================================

#[derive(Default)]
pub struct GreetHandler;

#[async_trait]
impl RequestHandler<Greet> for GreetHandler {
    async fn handle(&self, greet: Greet, _: &CancellationToken) -> Result<Greeting, BoxError> {
        Ok(Greeting {
            text: format!("Hello, {}!", greet.name.trim()),
        })
    }
}

#[derive(Default)]
pub struct ResetHandler;

#[async_trait]
impl RequestHandler<ResetCounters> for ResetHandler {
    async fn handle(&self, _: ResetCounters, _: &CancellationToken) -> Result<(), BoxError> {
        AUDITED.store(0, Ordering::SeqCst);
        WELCOMED.store(0, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct AuditLog;

#[async_trait]
impl NotificationHandler<UserCreated> for AuditLog {
    async fn handle(&self, event: &UserCreated, _: &CancellationToken) -> Result<(), BoxError> {
        AUDITED.fetch_add(1, Ordering::SeqCst);
        info!(user = %event.name, "Audit: user created");
        Ok(())
    }
}

#[derive(Default)]
pub struct WelcomeMailer;

#[async_trait]
impl NotificationHandler<UserCreated> for WelcomeMailer {
    async fn handle(&self, event: &UserCreated, _: &CancellationToken) -> Result<(), BoxError> {
        WELCOMED.fetch_add(1, Ordering::SeqCst);
        info!(user = %event.name, "Welcome mail queued");
        Ok(())
    }
}

pub static USERS: ModuleDescriptor = define_module! {
    name: "users",
    requests: [
        Greet => GreetHandler,
        ResetCounters => ResetHandler,
    ],
    notifications: [
        UserCreated => AuditLog,
        UserCreated => WelcomeMailer,
    ],
    behaviors: [Greet => ValidationBehavior],
    expose_notifications: [UserCreated => "user.created"],
};
