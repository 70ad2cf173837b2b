use crate::error::ProtectionError;
use crate::transform::{FieldMask, decrypt_record};
use fieldguard_database::{DocumentStore, Record};
use fieldguard_kernel::security::record_id::ResourceGuard;
use fieldguard_vault::{FieldCodec, KeyProvider};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Message returned when the requested user record does not exist.
pub const USER_NOT_FOUND: &str = "user not found";

/// On-demand decryption of stored records. Never writes to the store.
#[derive(Clone)]
pub struct ReadService<S, K> {
    store: S,
    keys: K,
    collection: Cow<'static, str>,
}

impl<S, K> ReadService<S, K>
where
    S: DocumentStore,
    K: KeyProvider,
{
    pub fn new(store: S, keys: K, collection: impl Into<Cow<'static, str>>) -> Self {
        Self { store, keys, collection: collection.into() }
    }

    /// Loads a record and returns its decrypted projection.
    ///
    /// # Errors
    /// * [`ProtectionError::InvalidInput`] for a blank or malformed id (`user id is required`).
    /// * [`ProtectionError::NotFound`] if no such record exists (`user not found`).
    /// * [`ProtectionError::Config`] if the key is missing or malformed.
    /// * [`ProtectionError::Integrity`] if any field fails authentication; no partial record is returned.
    /// * [`ProtectionError::Store`] if the lookup fails.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get_decrypted_record(&self, record_id: &str) -> Result<Record, ProtectionError> {
        let id = ResourceGuard::verify(record_id, "user")?;

        let doc = self.store.get(&self.collection, &id).await?.ok_or_else(|| {
            debug!(id = %id, "Record not found");
            ProtectionError::NotFound { message: USER_NOT_FOUND.into(), context: None }
        })?;

        let key = self.keys.key()?;
        let record = decrypt_record(&doc.record, &FieldCodec::new(&key)?).map_err(|e| {
            warn!(id = %id, revision = doc.revision, "Stored record failed integrity check");
            ProtectionError::from(e)
        })?;

        debug!(id = %id, revision = doc.revision, fields = %FieldMask(&doc.record), "Record decrypted for caller");
        Ok(record)
    }
}

impl<S: fmt::Debug, K> fmt::Debug for ReadService<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadService")
            .field("store", &self.store)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}
