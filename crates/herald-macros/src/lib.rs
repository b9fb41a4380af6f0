//! Procedural macros for Herald.
//!
//! - `#[derive(Request)]`: declares a struct's fields as positional command
//!   parameters
//! - `#[derive(ParamEnum)]`: makes a unit-only enum selectable by name
//!
//! Generated code refers to `::herald_framework`, so the derives are used
//! through `herald_framework` or the `herald` facade.
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[derive(ParamEnum)]
//! enum Allowability {
//!     Allow,
//!     Deny,
//! }
//!
//! #[derive(Request)]
//! struct SetDefault {
//!     #[param(name = "allow/deny", ordinal = 0)]
//!     allowability: Allowability,
//! }
//! ```

mod param_enum;
mod request;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `Request` for a struct with named fields.
///
/// # Field attributes `#[param(...)]`
///
/// | Key | Description |
/// |-----|-------------|
/// | `name = "…"` | Display name (default: the field name) |
/// | `ordinal = N` | Position of the argument (default: field order) |
/// | `description = "…"` | Shown when the argument is missing |
/// | `capture_remaining` | Take all remaining text verbatim |
///
/// `Option<T>` fields are optional parameters.
#[proc_macro_derive(Request, attributes(param))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match request::derive_request(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derives `ParamEnum` for an enum of unit variants.
///
/// Variant names are matched in `UPPER_SNAKE_CASE` unless renamed with
/// `#[param(name = "…")]`.
#[proc_macro_derive(ParamEnum, attributes(param))]
pub fn derive_param_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match param_enum::derive_param_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
