//! Patient resource model

use serde::{Deserialize, Serialize};

use crate::resource::{FhirResource, ResourceData};

/// FHIR Patient resource (simplified)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(flatten)]
    pub data: ResourceData,
}

impl FhirResource for Patient {
    const RESOURCE_NAME: &'static str = "Patient";

    fn data(&self) -> &ResourceData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ResourceData {
        &mut self.data
    }
}
