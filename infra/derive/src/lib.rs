#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the infrastructure and feature crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! fieldguard-derive = { path = "../infra/derive" }
//! thiserror = "2"
//! ```

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to `Result<T, ThisError>` and to `Result<T, SourceError>` for every wrapped source.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field
///   (or a field marked `#[source]`/`#[from]`), enabling the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` when an
///   `Internal` variant is present.
/// * **Message Helper**: Emits a module-private `format_context` function used by the
///   `#[error(...)]` format strings.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants with a source must also carry a context field.
/// 4. Only one `#[fieldguard_error]` enum per module (the `format_context` helper is module-level).
///
/// # Example
///
/// ```rust,ignore
/// use fieldguard_derive::fieldguard_error;
/// use std::borrow::Cow;
///
/// #[fieldguard_error]
/// pub enum StoreError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load() -> Result<Vec<u8>, StoreError> {
///     std::fs::read("records.json").context("Reading snapshot")
/// }
/// ```
#[proc_macro_attribute]
pub fn fieldguard_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
