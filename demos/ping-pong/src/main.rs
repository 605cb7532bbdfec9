//! Ping-Pong Demo
//!
//! A tour of the Courier mediator: typed requests, a void request, a
//! notification with two handlers, pipeline behaviors, untyped dispatch and
//! the JSON bridge.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package ping-pong
//! cargo run --package ping-pong -- --disable users --sequential
//! ```

mod messages;
mod modules;

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Result, bail};
use clap::Parser;
use courier::prelude::*;
use serde_json::json;
use tracing::{info, warn};

use crate::messages::{Divide, DivideByZero, Greet, Ping, ResetCounters, UserCreated};
use crate::modules::{AUDITED, MATH, PING, USERS, WELCOMED};

#[derive(Debug, Parser)]
#[command(about = "A small tour of the Courier mediator")]
struct Args {
    /// Configuration file; `courier.toml` is searched for when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Module to leave out of the scan (repeatable)
    #[arg(long = "disable", value_name = "MODULE")]
    disabled: Vec<String>,

    /// Run notification handlers one after another
    #[arg(long)]
    sequential: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = CourierRuntime::builder().modules([PING, MATH, USERS]);
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if !args.disabled.is_empty() {
        builder = builder.set("mediator.disabled_modules", &args.disabled);
    }
    if args.sequential {
        builder = builder.set("mediator.publish_strategy", PublishStrategy::Sequential);
    }
    let runtime = builder.build()?;

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    match runtime.send(Ping).await {
        Ok(pong) => info!(%pong, "Ping answered"),
        Err(error) if error.is_handler_not_found() => warn!(%error, "Ping module disabled"),
        Err(error) => return Err(error.into()),
    }

    if runtime.report().is_loaded("math") {
        let quotient = runtime.send(Divide { a: 10, b: 2 }).await?;
        info!(quotient, "10 / 2");

        match runtime.send(Divide { a: 1, b: 0 }).await {
            Err(error) => match error.downcast_ref::<DivideByZero>() {
                Some(cause) => info!(dividend = cause.dividend, "Division by zero rejected"),
                None => return Err(error.into()),
            },
            Ok(value) => bail!("1 / 0 returned {value}"),
        }

        let untyped = runtime
            .send_boxed(BoxedValue::request(Divide { a: 9, b: 3 }))
            .await?
            .and_then(|value| value.downcast::<i64>().ok());
        info!(?untyped, "Untyped 9 / 3");

        let json = runtime
            .send_json("math.divide", json!({ "a": 21, "b": 7 }))
            .await?;
        info!(%json, "JSON math.divide");
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    if runtime.report().is_loaded("users") {
        match runtime.send(Greet { name: "  ".into() }).await {
            Err(error) => match error.downcast_ref::<ValidationError>() {
                Some(invalid) => info!(field = invalid.field(), "Blank greeting rejected"),
                None => return Err(error.into()),
            },
            Ok(greeting) => bail!("blank name was greeted: {}", greeting.text),
        }
        let greeting = runtime.send(Greet { name: "Ada".into() }).await?;
        info!(text = %greeting.text, "Greeted");

        runtime.send(ResetCounters).await?;
        runtime
            .publish(UserCreated {
                name: "ada".into(),
            })
            .await?;
        runtime
            .publish_json("user.created", json!({ "name": "grace" }))
            .await?;
        info!(
            audited = AUDITED.load(Ordering::SeqCst),
            welcomed = WELCOMED.load(Ordering::SeqCst),
            "Users created"
        );
    }

    // A notification type nobody handles completes without error.
    runtime.publish(Unhandled).await?;

    for skipped in &runtime.report().skipped {
        warn!(%skipped, "Module was skipped");
    }

    runtime.shutdown();
    Ok(())
}

#[derive(Debug, Notification)]
struct Unhandled;
