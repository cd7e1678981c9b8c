//! Server capability consumed by resources and searches

use serde_json::Value as JsonValue;

use crate::error::Result;

/// Anything that can fetch a FHIR JSON document by relative path.
///
/// `path` is relative to the server base, e.g. `Patient/42` or
/// `Patient?name=smith`. Errors are returned to the caller untouched.
pub trait FhirServer: Send + Sync {
    fn request_json(&self, path: &str) -> Result<JsonValue>;
}
