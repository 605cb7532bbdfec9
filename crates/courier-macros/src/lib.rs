//! Procedural macros for Courier message types.
//!
//! This crate provides:
//!
//! - `#[derive(Request)]` - implements `courier_core::Request`
//! - `#[derive(Notification)]` - implements `courier_core::Notification`
//!
//! Generated code refers to `::courier_core` unless a different path is
//! given with `crate = "..."`.
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[derive(Request)]
//! #[request(response = "i64")]
//! pub struct Divide {
//!     pub a: i64,
//!     pub b: i64,
//! }
//!
//! #[derive(Clone, Notification)]
//! pub struct UserCreated {
//!     pub name: String,
//! }
//! ```

mod message;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `Request` for a struct or enum.
///
/// # Attributes
///
/// - `#[request(response = "Type")]` - the response type (default: `()`,
///   which makes the type a void request)
/// - `#[request(crate = "path")]` - path to the core crate
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Request)]
/// #[request(response = "String")]
/// struct Ping;
///
/// #[derive(Request)]
/// struct Reset;
/// ```
#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match message::derive_request(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derives `Notification` for a struct or enum.
///
/// # Attributes
///
/// - `#[notification(crate = "path")]` - path to the core crate
#[proc_macro_derive(Notification, attributes(notification))]
pub fn derive_notification(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match message::derive_notification(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
