//! FHIR server reached over HTTP

use fhir_resource::{CapabilityStatement, FhirError, FhirServer, OperationOutcome, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Instant;

use crate::config::Config;

const FHIR_JSON: &str = "application/fhir+json";

/// Blocking HTTP implementation of [`FhirServer`]
#[derive(Clone)]
pub struct HttpServer {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpServer {
    /// Create a server for `base_url` with default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&Config::with_base_url(base_url))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FhirError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET /metadata - Fetch the server capability statement
    pub fn capabilities(&self) -> Result<CapabilityStatement> {
        let json = self.request_json("metadata")?;
        Ok(serde_json::from_value(json)?)
    }
}

impl FhirServer for HttpServer {
    fn request_json(&self, path: &str) -> Result<JsonValue> {
        let url = self.url_for(path);
        let start = Instant::now();

        let mut request = self.http.get(&url).header(ACCEPT, FHIR_JSON);
        if let Some(api_key) = &self.api_key {
            request = request.header("X-API-Key", api_key);
        }

        let response = request.send().map_err(|e| {
            tracing::warn!(%url, error = %e, "FHIR request failed");
            record_request(path, "error", start.elapsed().as_secs_f64());
            FhirError::Transport(format!("HTTP request failed: {}", e))
        })?;

        let status = response.status();
        record_request(path, status.as_str(), start.elapsed().as_secs_f64());
        tracing::info!(%url, status = status.as_u16(), "FHIR request");

        if !status.is_success() {
            let body = response.text().unwrap_or_else(|e| {
                tracing::warn!(%url, error = %e, "Failed to read error response body");
                String::new()
            });
            return Err(status_error(path, status, &body));
        }

        response
            .json::<JsonValue>()
            .map_err(|e| FhirError::Transport(format!("Failed to parse response: {}", e)))
    }
}

impl fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServer")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Map a non-success response to an error, preferring OperationOutcome diagnostics.
fn status_error(path: &str, status: StatusCode, body: &str) -> FhirError {
    let outcome = OperationOutcome::from_body(body);

    if status == StatusCode::NOT_FOUND {
        let message = match outcome {
            Some(o) => format!("{} ({})", path, o.summary()),
            None => path.to_string(),
        };
        return FhirError::NotFound(message);
    }

    let message = match outcome {
        Some(o) => o.summary(),
        None if body.is_empty() => status.canonical_reason().unwrap_or("").to_string(),
        None => body.to_string(),
    };
    FhirError::Server {
        status: status.as_u16(),
        message,
    }
}

/// Resource type of a relative path, used as a metrics label.
/// `Patient/123` and `Patient?name=x` both become `Patient`.
fn resource_label(path: &str) -> String {
    path.trim_start_matches('/')
        .split(['/', '?'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("root")
        .to_string()
}

/// `status` is the numeric HTTP status, or `error` when no response arrived.
fn record_request(path: &str, status: &str, duration: f64) {
    let resource = resource_label(path);

    metrics::counter!(
        "fhir_client_requests_total",
        "resource" => resource.clone(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "fhir_client_request_duration_seconds",
        "resource" => resource
    )
    .record(duration);
}
