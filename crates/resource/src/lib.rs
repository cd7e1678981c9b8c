//! fhir-resource: FHIR resource model for clients
//!
//! This crate maps resources to and from JSON, reads them from a server
//! through the [`FhirServer`] capability and builds searches, either from a
//! parameter mapping or as a chain of terms.

pub mod bundle;
pub mod capability;
pub mod element;
pub mod error;
pub mod handle;
pub mod outcome;
pub mod patient;
pub mod registry;
pub mod resource;
pub mod search;
pub mod server;

pub use bundle::{Bundle, BundleEntry, BundleEntrySearch, BundleLink, BundleType};
pub use capability::{CapabilityResource, CapabilityRest, CapabilityStatement};
pub use element::Element;
pub use error::{FhirError, Result};
pub use handle::{RemoteBinding, ResourceHandle};
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use patient::Patient;
pub use registry::{AnyResource, ResourceRegistry};
pub use resource::{FhirResource, Resource, ResourceData};
pub use search::{FhirSearch, SearchElement, SearchParams, SearchStart, where_, where_named};
pub use server::FhirServer;
