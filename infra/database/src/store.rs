use crate::document::{Document, Record};
use crate::error::DatabaseError;

/// Keyed document storage.
///
/// Implementations publish a [`crate::RecordChanged`] event for every successful write.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetches a document, `None` if it does not exist.
    ///
    /// # Errors
    /// Returns [`DatabaseError::Validation`] for an empty collection or id.
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>, DatabaseError>> + Send;

    /// Snapshots every document of `collection`, ordered by id. An unknown collection is empty.
    ///
    /// Change listeners use this to resynchronise after missing events.
    ///
    /// # Errors
    /// Returns [`DatabaseError::Validation`] for an empty collection name.
    fn list(&self, collection: &str) -> impl Future<Output = Result<Vec<Document>, DatabaseError>> + Send;

    /// Creates or replaces a document unconditionally.
    ///
    /// # Errors
    /// Returns [`DatabaseError::Validation`] for an empty collection or id.
    fn put(
        &self,
        collection: &str,
        id: &str,
        record: Record,
    ) -> impl Future<Output = Result<Document, DatabaseError>> + Send;

    /// Replaces a document only if its current revision equals `expected`.
    ///
    /// # Errors
    /// Returns [`DatabaseError::Conflict`] if the document is missing or was rewritten,
    /// or [`DatabaseError::Validation`] for an empty collection or id.
    fn put_if_revision(
        &self,
        collection: &str,
        id: &str,
        expected: u64,
        record: Record,
    ) -> impl Future<Output = Result<Document, DatabaseError>> + Send;
}
