//! Names shared by the write path, the read path and the store.

/// Collection holding user records.
pub const USERS: &str = "users";

/// Top-level user fields that hold personally identifiable information.
///
/// Only these fields are ever encrypted; every other field is stored as-is.
pub const SENSITIVE_FIELDS: [&str; 4] = ["name", "email", "phone", "extension"];

/// Returns `true` if `field` is one of [`SENSITIVE_FIELDS`].
#[must_use]
pub fn is_sensitive(field: &str) -> bool {
    SENSITIVE_FIELDS.contains(&field)
}
