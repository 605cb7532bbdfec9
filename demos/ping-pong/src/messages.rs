//! Message types of the demo.

use courier::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Request)]
#[request(response = "String")]
pub struct Ping;

#[derive(Debug, Deserialize, Request)]
#[request(response = "i64")]
pub struct Divide {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Error)]
#[error("cannot divide {dividend} by zero")]
pub struct DivideByZero {
    pub dividend: i64,
}

#[derive(Debug, Error)]
#[error("{dividend} / {divisor} overflows")]
pub struct DivisionOverflow {
    pub dividend: i64,
    pub divisor: i64,
}

#[derive(Debug, Deserialize, Request)]
#[request(response = "Greeting")]
pub struct Greet {
    pub name: String,
}

impl Validate for Greet {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be blank"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub text: String,
}

/// A void request: its response is `()`.
#[derive(Debug, Request)]
pub struct ResetCounters;

#[derive(Debug, Clone, Deserialize, Notification)]
pub struct UserCreated {
    pub name: String,
}
