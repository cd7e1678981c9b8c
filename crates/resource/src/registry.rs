//! Resource types looked up by name at runtime

use serde_json::Value as JsonValue;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{FhirError, Result};
use crate::handle::{ResourceHandle, read_with};
use crate::patient::Patient;
use crate::resource::{FhirResource, Resource, ResourceData};
use crate::server::FhirServer;

/// Object-safe view of any [`FhirResource`]
pub trait AnyResource: fmt::Debug + Send + Sync {
    fn resource_name(&self) -> &'static str;

    fn resource_data(&self) -> &ResourceData;

    fn to_value(&self) -> Result<JsonValue>;

    fn as_any(&self) -> &dyn Any;
}

impl<R: FhirResource> AnyResource for R {
    fn resource_name(&self) -> &'static str {
        R::RESOURCE_NAME
    }

    fn resource_data(&self) -> &ResourceData {
        FhirResource::data(self)
    }

    fn to_value(&self) -> Result<JsonValue> {
        FhirResource::to_json(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Factory = fn(JsonValue) -> Result<Box<dyn AnyResource>>;

fn build<R: FhirResource>(json: JsonValue) -> Result<Box<dyn AnyResource>> {
    Ok(Box::new(R::from_json(json)?))
}

/// Factory table keyed by resource name
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry knowing the types defined in this crate
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<Resource>().register::<Patient>();
        registry
    }

    pub fn register<R: FhirResource>(&mut self) -> &mut Self {
        self.factories.insert(R::RESOURCE_NAME, build::<R>);
        self
    }

    pub fn contains(&self, resource_name: &str) -> bool {
        self.factories.contains_key(resource_name)
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Build the registered type named `resource_name` from JSON
    pub fn from_json(&self, resource_name: &str, json: JsonValue) -> Result<Box<dyn AnyResource>> {
        let (_, factory) = self.lookup(resource_name)?;
        factory(json)
    }

    /// Read a resource whose type is only known by name.
    ///
    /// Unknown names fail before the server is contacted.
    pub fn read(
        &self,
        resource_name: &str,
        remote_id: &str,
        server: impl Into<Option<Arc<dyn FhirServer>>>,
    ) -> Result<ResourceHandle<Box<dyn AnyResource>>> {
        let (name, factory) = self.lookup(resource_name)?;
        read_with(name, remote_id, server.into(), factory)
    }

    fn lookup(&self, resource_name: &str) -> Result<(&'static str, Factory)> {
        self.factories
            .get_key_value(resource_name)
            .map(|(name, factory)| (*name, *factory))
            .ok_or_else(|| {
                FhirError::InvalidArgument(format!("unknown resource type: {}", resource_name))
            })
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resource_names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
