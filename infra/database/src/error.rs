use std::borrow::Cow;

/// A specialized [`DatabaseError`] enum of this crate.
#[fieldguard_derive::fieldguard_error]
pub enum DatabaseError {
    /// Validation errors (empty collection or document id).
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A conditional write found a different revision than expected.
    #[error("Revision conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal database error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
