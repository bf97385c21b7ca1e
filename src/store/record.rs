// Record types module
// Defines the persisted record shape and the field map it carries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field map carried by every record. Keys and values are plain strings.
pub type Fields = BTreeMap<String, String>;

/// Reserved member name. Assigned by the store, never taken from a body.
pub const ID_KEY: &str = "id";

/// A single stored entity.
///
/// Persisted flattened, so `{"id": "1", "name": "Alice"}` on disk rather
/// than nesting the field map under its own member.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Check whether every `(field, value)` pair matches exactly.
    ///
    /// An empty filter matches everything; a pair naming a field the
    /// record does not carry matches nothing.
    pub fn matches(&self, filter: &[(String, String)]) -> bool {
        filter
            .iter()
            .all(|(field, value)| self.fields.get(field) == Some(value))
    }
}
