//! Base element mapping shared by every resource

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Fields every FHIR element carries, plus whatever else the document holds.
///
/// Keys the model does not know about are kept in `rest` and written back out
/// unchanged, so nothing is lost on a read/serialize round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<JsonValue>,

    #[serde(flatten)]
    pub rest: Map<String, JsonValue>,
}

impl Element {
    /// Look up a passthrough key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.rest.get(key)
    }
}
