//! # Protection
//!
//! Field-level protection of personally identifiable data in user records.
//!
//! * [`encrypt_record`] / [`decrypt_record`] apply the AES-256-GCM field codec across the
//!   sensitive fields (`name`, `email`, `phone`, `extension`).
//! * [`WriteGuard`] encrypts records on create/update exactly once, and [`GuardWorker`]
//!   drives it from the store's change events with retries.
//! * [`ReadService`] returns decrypted projections without writing anything back.
//! * With the `server` feature, [`api::router`] exposes `POST /rpc/decrypt-user` and
//!   `PUT /users/{id}`.
//!
//! ```rust
//! use fieldguard_protection::{FieldCodec, SecretKey, encrypt_record, is_encrypted};
//! use serde_json::json;
//!
//! let codec = FieldCodec::new(&SecretKey::generate().unwrap()).unwrap();
//! let record = json!({ "name": "Kim", "other": 42 }).as_object().cloned().unwrap();
//!
//! let stored = encrypt_record(&record, &codec).unwrap();
//! assert!(is_encrypted(&stored));
//! assert_eq!(stored["other"], 42);
//! ```

#[cfg(feature = "server")]
pub mod api;
mod error;
mod guard;
mod read;
mod transform;
mod worker;

pub use error::{ProtectionError, ProtectionErrorExt};
pub use fieldguard_database::Record;
pub use fieldguard_vault::{FieldCodec, SecretKey};
pub use guard::{GuardOutcome, GuardState, WriteGuard};
pub use read::{ReadService, USER_NOT_FOUND};
pub use transform::{
    FieldMask, decrypt_record, encrypt_record, has_plaintext, is_encrypted, is_envelope_shaped,
};
pub use worker::{GuardWorker, RetryPolicy};

/// Starts the write guard for the configured collection on the shared state's event bus.
///
/// # Errors
/// Returns [`ProtectionError::Internal`] if the event bus is closed.
#[cfg(feature = "server")]
pub fn init(
    state: &fieldguard_kernel::server::ApiState,
) -> Result<tokio::task::JoinHandle<()>, ProtectionError> {
    let guard = WriteGuard::new(
        state.store.clone(),
        std::sync::Arc::clone(&state.keys),
        state.config.database.collection.clone(),
    );
    let handle = GuardWorker::new(guard, RetryPolicy::from(&state.config.guard)).spawn(&state.events)?;

    tracing::info!("Protection slice initialized");
    Ok(handle)
}
