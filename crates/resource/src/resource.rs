//! Resource base mapping and the per-type resource trait

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::element::Element;
use crate::error::{FhirError, Result};

/// Serialized fields shared by every resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Human language of the content (BCP-47)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(flatten)]
    pub element: Element,
}

/// A FHIR resource type that can be built from and written to JSON.
///
/// `RESOURCE_NAME` is the path segment used on the server (`Patient`,
/// `Observation`, ...) and the tag attached to searches started from the type.
pub trait FhirResource:
    Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static
{
    const RESOURCE_NAME: &'static str;

    fn data(&self) -> &ResourceData;

    fn data_mut(&mut self) -> &mut ResourceData;

    /// Build an instance from a JSON document.
    ///
    /// Only objects are accepted. Keys the type does not model are kept as
    /// passthrough and never rejected.
    fn from_json(json: JsonValue) -> Result<Self> {
        if !json.is_object() {
            return Err(FhirError::Invalid(format!(
                "{} must be a JSON object",
                Self::RESOURCE_NAME
            )));
        }
        serde_json::from_value(json)
            .map_err(|e| FhirError::Invalid(format!("{}: {}", Self::RESOURCE_NAME, e)))
    }

    /// Overlay the keys present in `json` onto this instance.
    ///
    /// Fields whose key is absent keep their current value.
    fn update_with_json(&mut self, json: JsonValue) -> Result<()> {
        let JsonValue::Object(incoming) = json else {
            return Err(FhirError::Invalid(format!(
                "{} update must be a JSON object",
                Self::RESOURCE_NAME
            )));
        };

        let mut merged = match serde_json::to_value(&*self)? {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        merged.extend(incoming);

        *self = Self::from_json(JsonValue::Object(merged))?;
        Ok(())
    }

    /// Serialize to JSON, adding `resourceType` when the document lacks one.
    fn to_json(&self) -> Result<JsonValue> {
        let mut value = serde_json::to_value(self)?;
        if let JsonValue::Object(map) = &mut value {
            if !map.contains_key("resourceType") {
                map.insert(
                    "resourceType".to_string(),
                    JsonValue::String(Self::RESOURCE_NAME.to_string()),
                );
            }
        }
        Ok(value)
    }

    fn language(&self) -> Option<&str> {
        self.data().language.as_deref()
    }

    fn id(&self) -> Option<&str> {
        self.data().element.id.as_deref()
    }
}

/// The untyped base resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    pub data: ResourceData,
}

impl FhirResource for Resource {
    const RESOURCE_NAME: &'static str = "Resource";

    fn data(&self) -> &ResourceData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ResourceData {
        &mut self.data
    }
}
