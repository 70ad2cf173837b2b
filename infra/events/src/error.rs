use std::borrow::Cow;

/// Errors that can occur during event bus operations.
#[fieldguard_derive::fieldguard_error]
pub enum EventBusError {
    /// An internal dynamic cast failed.
    /// This indicates an invariant violation in the type registry.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Capacity must be greater than zero.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The bus was shut down; no new channels are created afterwards.
    #[error("Event bus closed{}: {message}", format_context(.context))]
    Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
