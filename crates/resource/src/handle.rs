//! Resources bound to the server they were read from

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use crate::error::{FhirError, Result};
use crate::resource::FhirResource;
use crate::search::{self, FhirSearch, SearchElement, SearchParams, SearchStart};
use crate::server::FhirServer;

/// Remote id and server of a resource that came from a server.
///
/// Never serialized with the resource.
#[derive(Clone)]
pub struct RemoteBinding {
    remote_id: String,
    server: Arc<dyn FhirServer>,
}

impl RemoteBinding {
    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn server(&self) -> &Arc<dyn FhirServer> {
        &self.server
    }
}

impl fmt::Debug for RemoteBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBinding")
            .field("remote_id", &self.remote_id)
            .finish_non_exhaustive()
    }
}

/// A resource together with its optional remote binding.
///
/// Handles built with [`ResourceHandle::new`] are unidentified. Handles
/// returned by [`ResourceHandle::read`] carry the remote id and server they
/// were read with; the binding cannot be changed afterwards.
#[derive(Debug, Clone)]
pub struct ResourceHandle<R> {
    resource: R,
    resource_name: &'static str,
    remote: Option<RemoteBinding>,
}

impl<R: FhirResource> ResourceHandle<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            resource_name: R::RESOURCE_NAME,
            remote: None,
        }
    }

    /// Build an unidentified handle from a JSON document
    pub fn from_json(json: JsonValue) -> Result<Self> {
        R::from_json(json).map(Self::new)
    }

    /// Read `R` with id `remote_id` from `server`.
    ///
    /// Requests `{R::RESOURCE_NAME}/{remote_id}`. The returned handle is bound
    /// to `remote_id` and `server` whatever id the fetched document carries.
    /// An empty id or a missing server fails before the server is contacted;
    /// server errors are returned as-is.
    pub fn read(
        remote_id: &str,
        server: impl Into<Option<Arc<dyn FhirServer>>>,
    ) -> Result<Self> {
        read_with(R::RESOURCE_NAME, remote_id, server.into(), R::from_json)
    }

    /// Type-level search for `R`, see [`search::where_`]
    pub fn where_(spec: Option<SearchParams>) -> SearchStart {
        search::where_::<R>(spec)
    }
}

impl<R> ResourceHandle<R> {
    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    pub fn into_inner(self) -> R {
        self.resource
    }

    pub fn resource_name(&self) -> &'static str {
        self.resource_name
    }

    pub fn remote(&self) -> Option<&RemoteBinding> {
        self.remote.as_ref()
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.remote_id.as_str())
    }

    pub fn server(&self) -> Option<&Arc<dyn FhirServer>> {
        self.remote.as_ref().map(|r| &r.server)
    }

    pub fn is_identified(&self) -> bool {
        self.remote.is_some()
    }

    /// Start a search from this resource.
    ///
    /// Without a mapping, an identified resource anchors a chain on its own
    /// id (`_id` = remote id). In every other case this is the type-level
    /// [`search::where_named`] for the resource's type.
    pub fn search(&self, spec: Option<SearchParams>) -> SearchStart {
        match (spec, self.remote_id()) {
            (None, Some(remote_id)) => SearchStart::Chain(self.anchor(remote_id)),
            (spec, _) => search::where_named(self.resource_name, spec),
        }
    }

    /// Finalized search for this resource's type, ignoring its identity
    pub fn search_by_mapping(&self, params: SearchParams) -> FhirSearch {
        FhirSearch::new(self.resource_name, params)
    }

    /// Chain anchored on this resource's id, or an empty root if unidentified
    pub fn start_search_chain(&self) -> SearchElement {
        match self.remote_id() {
            Some(remote_id) => self.anchor(remote_id),
            None => SearchElement::root(self.resource_name),
        }
    }

    // TODO: bind the anchor as the subject of the next chained term so
    // relationship searches ("resources referencing me") work.
    fn anchor(&self, remote_id: &str) -> SearchElement {
        SearchElement::new("_id", self.resource_name).with_reference(remote_id)
    }
}

impl<R: Serialize> Serialize for ResourceHandle<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.resource.serialize(serializer)
    }
}

pub(crate) fn read_with<T>(
    resource_name: &'static str,
    remote_id: &str,
    server: Option<Arc<dyn FhirServer>>,
    build: impl FnOnce(JsonValue) -> Result<T>,
) -> Result<ResourceHandle<T>> {
    if remote_id.is_empty() {
        return Err(FhirError::InvalidArgument(
            "cannot read without remote id".to_string(),
        ));
    }
    let Some(server) = server else {
        return Err(FhirError::InvalidArgument(
            "cannot read without server".to_string(),
        ));
    };

    let path = format!("{}/{}", resource_name, remote_id);
    tracing::debug!(%path, "Reading resource");
    let json = server.request_json(&path)?;
    let resource = build(json)?;

    Ok(ResourceHandle {
        resource,
        resource_name,
        remote: Some(RemoteBinding {
            remote_id: remote_id.to_string(),
            server,
        }),
    })
}
