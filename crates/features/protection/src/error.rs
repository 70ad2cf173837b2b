use fieldguard_database::DatabaseError;
use fieldguard_kernel::security::record_id::ResourceGuardError;
use fieldguard_vault::VaultError;
use std::borrow::Cow;

/// A specialized [`ProtectionError`] enum of this crate.
#[fieldguard_derive::fieldguard_error]
pub enum ProtectionError {
    /// Caller supplied a missing or malformed argument.
    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Missing or wrong API token.
    #[error("Unauthenticated{}: {message}", format_context(.context))]
    Unauthenticated { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The requested record does not exist.
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The encryption key is missing or malformed. Retrying will not help.
    #[error("Configuration error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A stored envelope failed authentication (tampering or wrong key).
    #[error("Integrity failure{}: {message}", format_context(.context))]
    Integrity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The document store rejected an operation.
    #[error("Store error{}: {source}", format_context(.context))]
    Store {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal protection error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<VaultError> for ProtectionError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::InvalidConfiguration { message, context } => Self::Config { message, context },
            VaultError::Decryption { message, context } => Self::Integrity { message, context },
            VaultError::Encryption { message, context } | VaultError::Internal { message, context } => {
                Self::Internal { message, context }
            },
        }
    }
}

impl From<ResourceGuardError> for ProtectionError {
    fn from(err: ResourceGuardError) -> Self {
        match err {
            ResourceGuardError::Validation { message, context } => Self::InvalidInput { message, context },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_errors_map_to_taxonomy() {
        let config: ProtectionError = VaultError::InvalidConfiguration {
            message: "key must be 32-byte hex".into(),
            context: None,
        }
        .into();
        assert!(matches!(config, ProtectionError::Config { ref message, .. } if message == "key must be 32-byte hex"));

        let integrity: ProtectionError =
            VaultError::Decryption { message: "Authentication failed".into(), context: None }.into();
        assert!(matches!(integrity, ProtectionError::Integrity { .. }));

        let rng: ProtectionError =
            VaultError::Encryption { message: "rng".into(), context: None }.into();
        assert!(matches!(rng, ProtectionError::Internal { .. }));
    }

    #[test]
    fn store_errors_convert_with_question_mark() {
        fn run() -> Result<(), ProtectionError> {
            Err(DatabaseError::Conflict { message: "stale".into(), context: None })?;
            Ok(())
        }
        assert!(matches!(run(), Err(ProtectionError::Store { .. })));
    }
}
