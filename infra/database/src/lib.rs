//! # Database Infrastructure
//!
//! Keyed JSON document storage behind the [`DocumentStore`] trait.
//!
//! Every document carries a monotonically increasing revision, and every successful write
//! publishes a [`RecordChanged`] event on the shared [`fieldguard_event_bus::EventBus`].
//! Change listeners use [`DocumentStore::put_if_revision`] to write back without
//! clobbering a newer revision.
//!
//! ## Example
//!
//! ```rust
//! use fieldguard_database::{DatabaseError, DocumentStore, MemoryStore, Record};
//! use fieldguard_event_bus::EventBus;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), DatabaseError> {
//!     let store = MemoryStore::new(EventBus::new());
//!
//!     let doc = store.put("users", "u1", Record::new()).await?;
//!     assert_eq!(doc.revision, 1);
//!     assert!(store.get("users", "u1").await?.is_some());
//!
//!     Ok(())
//! }
//! ```

mod document;
mod error;
mod memory;
mod store;

pub use document::{ChangeKind, Document, Record, RecordChanged};
pub use error::{DatabaseError, DatabaseErrorExt};
pub use memory::MemoryStore;
pub use store::DocumentStore;
