use serde::{Deserialize, Serialize};

/// FHIR CapabilityStatement resource (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    pub resource_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub fhir_version: String,
    #[serde(default)]
    pub format: Vec<String>,
    #[serde(default)]
    pub rest: Vec<CapabilityRest>,
}

impl CapabilityStatement {
    /// Server-mode declaration for a resource type, if any
    pub fn resource(&self, resource_type: &str) -> Option<&CapabilityResource> {
        self.rest
            .iter()
            .filter(|r| r.mode == "server")
            .flat_map(|r| r.resource.iter())
            .find(|r| r.resource_type == resource_type)
    }

    /// Whether the server declares `interaction` (`read`, `search-type`, ...)
    pub fn supports(&self, resource_type: &str, interaction: &str) -> bool {
        self.resource(resource_type)
            .is_some_and(|r| r.interaction.iter().any(|i| i.code == interaction))
    }
}

/// REST capability declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRest {
    pub mode: String,
    #[serde(default)]
    pub resource: Vec<CapabilityResource>,
}

/// Resource type support declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub interaction: Vec<CapabilityInteraction>,
    #[serde(default)]
    pub search_param: Vec<CapabilitySearchParam>,
}

/// Supported interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityInteraction {
    pub code: String,
}

/// Supported search parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySearchParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}
