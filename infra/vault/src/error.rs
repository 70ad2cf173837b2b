//! # Vault Errors
//!
//! [`VaultError`] covers key configuration, encryption and authenticated decryption failures.

use std::borrow::Cow;

/// Message used for every key configuration failure, regardless of cause.
pub const KEY_FORMAT_MESSAGE: &str = "key must be 32-byte hex";

#[fieldguard_derive::fieldguard_error]
pub enum VaultError {
    /// The key is missing, not hex, or does not decode to exactly 32 bytes.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure during encryption (including an unavailable system RNG).
    #[error("Encryption error{}: {message}", format_context(.context))]
    Encryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Authentication failed: wrong key, tampered or malformed envelope.
    ///
    /// No plaintext is ever returned alongside this error.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal vault error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl VaultError {
    pub(crate) fn key_format(context: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidConfiguration { message: KEY_FORMAT_MESSAGE.into(), context: Some(context.into()) }
    }

    pub(crate) fn auth(context: &'static str) -> Self {
        Self::Decryption { message: "Authentication failed".into(), context: Some(context.into()) }
    }
}
