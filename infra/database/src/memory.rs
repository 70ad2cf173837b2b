use crate::document::{ChangeKind, Document, Record, RecordChanged};
use crate::error::DatabaseError;
use crate::store::DocumentStore;
use fieldguard_event_bus::EventBus;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

type Collection = FxHashMap<String, Document>;

#[derive(Debug)]
struct MemoryInner {
    collections: RwLock<FxHashMap<String, Collection>>,
    events: EventBus,
}

/// In-process [`DocumentStore`] backed by hash maps.
///
/// Writes are serialized per store, and each write's change event is published before
/// the lock is released, so subscribers observe revisions of one document in order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    /// Creates an empty store publishing [`RecordChanged`] events on `events`.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            inner: Arc::new(MemoryInner { collections: RwLock::default(), events }),
        }
    }

    /// Number of documents in `collection`.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.inner.collections.read().get(collection).map_or(0, FxHashMap::len)
    }

    /// Returns `true` if `collection` holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn write(
        &self,
        collection: &str,
        id: &str,
        expected: Option<u64>,
        record: Record,
    ) -> Result<Document, DatabaseError> {
        validate(collection, id)?;

        let mut collections = self.inner.collections.write();
        let docs = collections.entry(collection.to_owned()).or_default();
        let current = docs.get(id).map(|doc| doc.revision);

        if let Some(expected) = expected
            && current != Some(expected)
        {
            return Err(DatabaseError::Conflict {
                message: format!(
                    "expected revision {expected}, found {}",
                    current.map_or_else(|| "none".to_owned(), |r| r.to_string())
                )
                .into(),
                context: Some(format!("{collection}/{id}").into()),
            });
        }

        let (kind, revision) = match current {
            Some(revision) => (ChangeKind::Updated, revision + 1),
            None => (ChangeKind::Created, 1),
        };
        let document = Document { id: id.to_owned(), revision, record };
        docs.insert(id.to_owned(), document.clone());
        debug!(collection, id, revision, ?kind, "Document written");

        let event = RecordChanged {
            collection: collection.to_owned(),
            id: id.to_owned(),
            revision,
            kind,
            record: document.record.clone(),
        };
        if let Err(e) = self.inner.events.publish(event) {
            warn!(collection, id, revision, error = %e, "Change event not delivered");
        }

        Ok(document)
    }
}

impl DocumentStore for MemoryStore {
    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError> {
        validate(collection, id)?;
        Ok(self.inner.collections.read().get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DatabaseError> {
        validate_collection(collection)?;
        let mut docs: Vec<Document> = self
            .inner
            .collections
            .read()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    #[instrument(skip(self, record))]
    async fn put(&self, collection: &str, id: &str, record: Record) -> Result<Document, DatabaseError> {
        self.write(collection, id, None, record)
    }

    #[instrument(skip(self, record))]
    async fn put_if_revision(
        &self,
        collection: &str,
        id: &str,
        expected: u64,
        record: Record,
    ) -> Result<Document, DatabaseError> {
        self.write(collection, id, Some(expected), record)
    }
}

fn validate_collection(collection: &str) -> Result<(), DatabaseError> {
    if collection.is_empty() {
        return Err(DatabaseError::Validation {
            message: "Collection name is required".into(),
            context: None,
        });
    }
    Ok(())
}

fn validate(collection: &str, id: &str) -> Result<(), DatabaseError> {
    validate_collection(collection)?;
    if id.is_empty() {
        return Err(DatabaseError::Validation {
            message: "Document id is required".into(),
            context: Some(collection.to_owned().into()),
        });
    }
    Ok(())
}
