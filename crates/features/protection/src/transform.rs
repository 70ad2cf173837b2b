//! Field-level encryption applied across the sensitive fields of a record.
//!
//! Both transformations work on a copy; the input record is never modified and an error
//! discards the whole copy, so callers never see a half-transformed record.

use fieldguard_database::Record;
use fieldguard_domain::fields::SENSITIVE_FIELDS;
use fieldguard_vault::{DATA_FIELD, Envelope, FieldCodec, IV_FIELD, TAG_FIELD, VaultError};
use serde_json::Value;
use std::fmt;

/// Returns `true` if `value` is an object carrying the `iv`, `data` and `tag` keys.
///
/// This is a shape check only; it says nothing about whether the value decrypts.
#[must_use]
pub fn is_envelope_shaped(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| [IV_FIELD, DATA_FIELD, TAG_FIELD].iter().all(|k| obj.contains_key(*k)))
}

/// Returns `true` if any sensitive field present on the record is envelope-shaped.
///
/// Records mixing plaintext and envelopes count as encrypted.
#[must_use]
pub fn is_encrypted(record: &Record) -> bool {
    SENSITIVE_FIELDS.iter().filter_map(|field| record.get(*field)).any(is_envelope_shaped)
}

/// Returns `true` if at least one sensitive field holds a plaintext string.
#[must_use]
pub fn has_plaintext(record: &Record) -> bool {
    SENSITIVE_FIELDS.iter().filter_map(|field| record.get(*field)).any(Value::is_string)
}

/// Encrypts every sensitive field that holds a string.
///
/// Absent fields, non-string values and non-sensitive fields are copied unchanged.
///
/// # Errors
/// Returns the first [`VaultError`] raised by the codec; no partial record is produced.
pub fn encrypt_record(record: &Record, codec: &FieldCodec) -> Result<Record, VaultError> {
    let mut out = record.clone();
    for field in SENSITIVE_FIELDS {
        if let Some(Value::String(plain)) = record.get(field) {
            out.insert(field.to_owned(), codec.seal(plain)?.into_value());
        }
    }
    Ok(out)
}

/// Decrypts every sensitive field that holds a well-formed envelope.
///
/// Fields that are not envelopes with three string parts are copied unchanged, which
/// tolerates legacy plaintext records.
///
/// # Errors
/// Returns [`VaultError::Decryption`] if any envelope fails authentication.
pub fn decrypt_record(record: &Record, codec: &FieldCodec) -> Result<Record, VaultError> {
    let mut out = record.clone();
    for field in SENSITIVE_FIELDS {
        if let Some(envelope) = record.get(field).and_then(Envelope::from_value) {
            out.insert(field.to_owned(), Value::String(codec.open(&envelope)?));
        }
    }
    Ok(out)
}

/// Log-safe view of a record's sensitive fields.
///
/// Renders `{name=<plaintext>, email=<encrypted>}`; values themselves are never printed.
#[derive(Debug, Clone, Copy)]
pub struct FieldMask<'a>(pub &'a Record);

impl fmt::Display for FieldMask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for field in SENSITIVE_FIELDS {
            let Some(value) = self.0.get(field) else { continue };
            let shown = if is_envelope_shaped(value) {
                "<encrypted>"
            } else if value.is_string() {
                "<plaintext>"
            } else {
                "<opaque>"
            };
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}={shown}")?;
            first = false;
        }
        f.write_str("}")
    }
}
