use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document body: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// A record together with its identity and write revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Starts at 1 and increases by one on every write.
    pub revision: u64,
    pub record: Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
}

/// Published on the event bus after every successful write.
///
/// `record` is the body exactly as written at `revision`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChanged {
    pub collection: String,
    pub id: String,
    pub revision: u64,
    pub kind: ChangeKind,
    pub record: Record,
}
