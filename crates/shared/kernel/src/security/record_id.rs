use std::borrow::Cow;

/// Longest accepted record id, in characters.
pub const MAX_ID_LEN: usize = 128;

#[fieldguard_derive::fieldguard_error]
pub enum ResourceGuardError {
    #[error("Resource validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Checks for caller-supplied record identifiers.
#[derive(Debug)]
pub struct ResourceGuard;

impl ResourceGuard {
    /// Normalizes a record id taken from a request.
    ///
    /// Surrounding whitespace is trimmed. The result must be non-empty, at most
    /// [`MAX_ID_LEN`] characters, and free of `/` and control characters so it always
    /// names a single document.
    ///
    /// # Arguments
    /// * `id` - The raw id from the caller.
    /// * `kind` - What the id names, used in messages (e.g. `"user"`).
    ///
    /// # Errors
    /// Returns [`ResourceGuardError::Validation`]; an empty id yields `"{kind} id is required"`.
    pub fn verify<I, K>(id: I, kind: K) -> Result<String, ResourceGuardError>
    where
        I: AsRef<str>,
        K: AsRef<str>,
    {
        let id = id.as_ref().trim();
        let kind = kind.as_ref();

        if id.is_empty() {
            return Err(ResourceGuardError::Validation {
                message: format!("{kind} id is required").into(),
                context: None,
            });
        }
        if id.chars().count() > MAX_ID_LEN {
            return Err(ResourceGuardError::Validation {
                message: format!("{kind} id is too long").into(),
                context: Some(format!("max {MAX_ID_LEN} characters").into()),
            });
        }
        if id.chars().any(|c| c == '/' || c.is_control()) {
            return Err(ResourceGuardError::Validation {
                message: format!("{kind} id contains invalid characters").into(),
                context: None,
            });
        }

        Ok(id.to_owned())
    }
}
