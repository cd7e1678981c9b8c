//! fhir-client: HTTP access to FHIR servers
//!
//! Provides [`HttpServer`], the reqwest-backed implementation of the
//! [`fhir_resource::FhirServer`] capability, and its configuration.

pub mod config;
pub mod http;

pub use config::Config;
pub use http::HttpServer;
