//! Message derive implementations.
//!
//! | Attribute | Key | Example | Description |
//! |-----------|-----|---------|-------------|
//! | `#[request(...)]` | `response` | `"i64"` | Response type, `()` when omitted |
//! | `#[request(...)]` | `crate` | `"courier"` | Path to the core crate |
//! | `#[notification(...)]` | `crate` | `"courier"` | Path to the core crate |

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Path, Type, spanned::Spanned};

// ============================================================================
// Attribute parsing
// ============================================================================

#[derive(Default)]
struct MessageAttrs {
    response: Option<Type>,
    krate: Option<Path>,
}

fn parse_attrs(attrs: &[Attribute], name: &str, allow_response: bool) -> syn::Result<MessageAttrs> {
    let mut parsed = MessageAttrs::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(name)) {
        attr.parse_nested_meta(|meta| {
            if allow_response && meta.path.is_ident("response") {
                let lit = meta.value()?.parse::<syn::LitStr>()?;
                parsed.response = Some(lit.parse::<Type>()?);
            } else if meta.path.is_ident("crate") {
                let lit = meta.value()?.parse::<syn::LitStr>()?;
                parsed.krate = Some(lit.parse::<Path>()?);
            } else {
                return Err(meta.error(format!("unknown #[{name}] key")));
            }
            Ok(())
        })?;
    }

    Ok(parsed)
}

fn core_path(krate: Option<Path>) -> TokenStream {
    match krate {
        Some(path) => quote!(#path),
        None => quote!(::courier_core),
    }
}

fn reject_unions(input: &DeriveInput, derive: &str) -> syn::Result<()> {
    if let Data::Union(_) = input.data {
        return Err(syn::Error::new(
            input.span(),
            format!("{derive} cannot be derived for unions"),
        ));
    }
    Ok(())
}

// ============================================================================
// Entry points
// ============================================================================

pub fn derive_request(input: &DeriveInput) -> syn::Result<TokenStream> {
    reject_unions(input, "Request")?;
    let attrs = parse_attrs(&input.attrs, "request", true)?;
    let core = core_path(attrs.krate);
    let response = attrs.response.map_or_else(|| quote!(()), |ty| quote!(#ty));

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #core::Request for #name #ty_generics #where_clause {
            type Response = #response;
        }
    })
}

pub fn derive_notification(input: &DeriveInput) -> syn::Result<TokenStream> {
    reject_unions(input, "Notification")?;
    let attrs = parse_attrs(&input.attrs, "notification", false)?;
    let core = core_path(attrs.krate);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #core::Notification for #name #ty_generics #where_clause {}
    })
}
