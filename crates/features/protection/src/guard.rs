use crate::error::ProtectionError;
use crate::transform::{FieldMask, encrypt_record, has_plaintext, is_encrypted};
use fieldguard_database::{DatabaseError, DocumentStore, RecordChanged};
use fieldguard_vault::{FieldCodec, KeyProvider};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, info, instrument, trace};

/// Steps of one guard invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Received,
    Checked,
    Skipped,
    Encrypting,
    Persisted,
}

/// How a change event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The event belongs to another collection.
    Ignored,
    /// Nothing to encrypt: sensitive fields are already envelopes or hold no text.
    Skipped,
    /// The encrypted record was written back at `revision`.
    Persisted { revision: u64 },
    /// The record changed after the event was raised; the newer write gets its own event.
    Superseded,
}

/// Encrypt-on-write trigger for one collection.
///
/// Writes back with [`DocumentStore::put_if_revision`] against the event's revision, so
/// two invocations racing on the same plaintext produce at most one write.
#[derive(Clone)]
pub struct WriteGuard<S, K> {
    store: S,
    keys: K,
    collection: Cow<'static, str>,
}

impl<S, K> WriteGuard<S, K>
where
    S: DocumentStore,
    K: KeyProvider,
{
    pub fn new(store: S, keys: K, collection: impl Into<Cow<'static, str>>) -> Self {
        Self { store, keys, collection: collection.into() }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub(crate) const fn store(&self) -> &S {
        &self.store
    }

    /// Runs the guard for one change event.
    ///
    /// # Errors
    /// * [`ProtectionError::Config`] if the key is missing or malformed.
    /// * [`ProtectionError::Internal`] if encryption fails.
    /// * [`ProtectionError::Store`] if the write-back fails for a reason other than a newer revision.
    ///
    /// Nothing is written when an error is returned.
    #[instrument(skip_all, fields(collection = %event.collection, id = %event.id, revision = event.revision))]
    pub async fn handle(&self, event: &RecordChanged) -> Result<GuardOutcome, ProtectionError> {
        if event.collection != self.collection {
            trace!("Event for another collection");
            return Ok(GuardOutcome::Ignored);
        }
        step(GuardState::Received);

        let encrypted = is_encrypted(&event.record);
        step(GuardState::Checked);
        debug!(encrypted, fields = %FieldMask(&event.record), "Sensitive fields checked");

        if encrypted || !has_plaintext(&event.record) {
            step(GuardState::Skipped);
            return Ok(GuardOutcome::Skipped);
        }

        step(GuardState::Encrypting);
        let record = {
            let key = self.keys.key()?;
            encrypt_record(&event.record, &FieldCodec::new(&key)?)?
        };

        match self.store.put_if_revision(&self.collection, &event.id, event.revision, record).await {
            Ok(doc) => {
                step(GuardState::Persisted);
                info!(written = doc.revision, "Sensitive fields encrypted at rest");
                Ok(GuardOutcome::Persisted { revision: doc.revision })
            },
            Err(DatabaseError::Conflict { .. }) => {
                debug!("Record rewritten since event; dropping stale encryption");
                Ok(GuardOutcome::Superseded)
            },
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: fmt::Debug, K> fmt::Debug for WriteGuard<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteGuard")
            .field("store", &self.store)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

fn step(state: GuardState) {
    debug!(?state, "Guard transition");
}
