use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage key holding the hex IV.
pub const IV_FIELD: &str = "iv";
/// Storage key holding the hex ciphertext.
pub const DATA_FIELD: &str = "data";
/// Storage key holding the hex authentication tag.
pub const TAG_FIELD: &str = "tag";

/// A self-contained AES-256-GCM ciphertext for one text value.
///
/// All parts are lowercase hex. The triple belongs together: an IV, ciphertext
/// or tag moved between envelopes fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Envelope {
    /// 96-bit IV, unique per encryption.
    pub iv: String,
    /// Ciphertext, same length as the UTF-8 plaintext.
    pub data: String,
    /// 128-bit authentication tag.
    pub tag: String,
}

impl Envelope {
    /// Reads an envelope from its stored JSON form.
    ///
    /// Returns `None` unless the value is an object whose `iv`, `data` and `tag`
    /// members are all strings. Extra members are ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let part = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_owned);
        Some(Self { iv: part(IV_FIELD)?, data: part(DATA_FIELD)?, tag: part(TAG_FIELD)? })
    }

    /// Converts into the stored JSON form `{ "iv": .., "data": .., "tag": .. }`.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut obj = Map::with_capacity(3);
        obj.insert(IV_FIELD.to_owned(), Value::String(self.iv));
        obj.insert(DATA_FIELD.to_owned(), Value::String(self.data));
        obj.insert(TAG_FIELD.to_owned(), Value::String(self.tag));
        Value::Object(obj)
    }
}

impl From<Envelope> for Value {
    fn from(envelope: Envelope) -> Self {
        envelope.into_value()
    }
}
