//! Upstream records as delivered by the document source.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One loosely-typed record (a database page).
///
/// Property shapes are owned by the document database: each property is an
/// object with a `type` discriminator and a payload under the same key, for
/// example `{"type": "select", "select": {"name": "Color"}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Record {
    /// Look up a property by field name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }
}
