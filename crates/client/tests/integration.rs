//! Integration tests for the HTTP FHIR server client.
//!
//! These tests start a small mock FHIR server (an Axum router on a Tokio
//! runtime in a background thread) and read from it through the blocking
//! client, exactly as application code would.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use fhir_client::{Config, HttpServer};
use fhir_resource::{
    FhirError, FhirResource, FhirServer, Patient, ResourceHandle, ResourceRegistry, SearchParams,
};
use serde_json::{Value as JsonValue, json};

// ---------------------------------------------------------------------------
// Mock server
// ---------------------------------------------------------------------------

const TEST_API_KEY: &str = "test-secret-key";

fn outcome(code: &str, diagnostics: &str) -> JsonValue {
    json!({
        "resourceType": "OperationOutcome",
        "issue": [{"severity": "error", "code": code, "diagnostics": diagnostics}]
    })
}

/// GET /fhir/Patient/{id}
async fn read_patient(Path(id): Path<String>, headers: HeaderMap) -> Response {
    match id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(outcome("not-found", "Patient/missing not found")),
        )
            .into_response(),
        "broken" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(outcome("exception", "database unavailable")),
        )
            .into_response(),
        "protected" => {
            let authorized = headers
                .get("X-API-Key")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|k| k == TEST_API_KEY);
            if !authorized {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(outcome("login", "Missing or invalid API key")),
                )
                    .into_response();
            }
            Json(json!({"resourceType": "Patient", "id": "protected", "gender": "other"}))
                .into_response()
        }
        _ => Json(json!({
            "resourceType": "Patient",
            "id": format!("stored-{}", id),
            "language": "de-CH",
            "gender": "female",
            "birthDate": "1985-02-17"
        }))
        .into_response(),
    }
}

/// GET /fhir/Patient - echoes the query back as a one-entry search-set
async fn search_patients(Query(params): Query<HashMap<String, String>>) -> Json<JsonValue> {
    let gender = params.get("gender").cloned().unwrap_or_else(|| "unknown".into());
    Json(json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": 1,
        "link": [{"relation": "self", "url": format!("Patient?gender={}", gender)}],
        "entry": [{
            "fullUrl": "Patient/1",
            "resource": {"resourceType": "Patient", "id": "1", "gender": gender},
            "search": {"mode": "match"}
        }]
    }))
}

/// GET /fhir/metadata
async fn metadata() -> Json<JsonValue> {
    Json(json!({
        "resourceType": "CapabilityStatement",
        "status": "active",
        "kind": "instance",
        "fhirVersion": "4.3.0",
        "format": ["json"],
        "rest": [{
            "mode": "server",
            "resource": [{
                "type": "Patient",
                "interaction": [{"code": "read"}, {"code": "search-type"}],
                "searchParam": [{"name": "gender", "type": "token"}]
            }]
        }]
    }))
}

fn mock_app() -> Router {
    Router::new()
        .route("/fhir/metadata", get(metadata))
        .route("/fhir/Patient", get(search_patients))
        .route("/fhir/Patient/{id}", get(read_patient))
}

/// Start the mock server on an ephemeral port and return its base URL.
fn start_mock_server() -> String {
    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind mock server");
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, mock_app()).await.unwrap();
        });
    });

    let addr = rx.recv().expect("Mock server did not start");
    format!("http://{}/fhir", addr)
}

fn server(base_url: &str) -> Arc<dyn FhirServer> {
    Arc::new(HttpServer::new(base_url).expect("Failed to build client"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn read_patient_over_http() {
    let base_url = start_mock_server();
    let server = server(&base_url);

    let handle = ResourceHandle::<Patient>::read("abc", server.clone()).unwrap();

    assert_eq!(handle.remote_id(), Some("abc"));
    assert!(Arc::ptr_eq(handle.server().unwrap(), &server));
    assert_eq!(handle.resource().id(), Some("stored-abc"));
    assert_eq!(handle.resource().language(), Some("de-CH"));
    assert_eq!(handle.resource().birth_date.as_deref(), Some("1985-02-17"));
}

#[test]
fn missing_resource_is_not_found() {
    let base_url = start_mock_server();

    let err = ResourceHandle::<Patient>::read("missing", server(&base_url)).unwrap_err();

    match err {
        FhirError::NotFound(message) => {
            assert!(message.starts_with("Patient/missing"));
            assert!(message.contains("not found"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn unknown_route_is_not_found_without_outcome() {
    let base_url = start_mock_server();
    let http = HttpServer::new(&base_url).unwrap();

    let err = http.request_json("Observation/1").unwrap_err();

    assert!(matches!(err, FhirError::NotFound(ref p) if p == "Observation/1"));
}

#[test]
fn server_failure_carries_outcome_diagnostics() {
    let base_url = start_mock_server();

    let err = ResourceHandle::<Patient>::read("broken", server(&base_url)).unwrap_err();

    assert!(matches!(
        err,
        FhirError::Server { status: 500, ref message } if message == "database unavailable"
    ));
}

#[test]
fn api_key_is_sent_when_configured() {
    let base_url = start_mock_server();

    let err = ResourceHandle::<Patient>::read("protected", server(&base_url)).unwrap_err();
    assert!(matches!(err, FhirError::Server { status: 401, .. }));

    let mut config = Config::with_base_url(&base_url);
    config.api_key = Some(TEST_API_KEY.to_string());
    let authed: Arc<dyn FhirServer> = Arc::new(HttpServer::from_config(&config).unwrap());

    let handle = ResourceHandle::<Patient>::read("protected", authed).unwrap();
    assert_eq!(handle.resource().gender.as_deref(), Some("other"));
}

#[test]
fn search_from_read_resource_performs_over_http() {
    let base_url = start_mock_server();
    let server = server(&base_url);

    let handle = ResourceHandle::<Patient>::read("abc", server.clone()).unwrap();
    let mut params = SearchParams::new();
    params.insert("gender".into(), json!("female"));

    let bundle = handle
        .search(Some(params))
        .into_search()
        .perform(server.as_ref())
        .unwrap();

    assert_eq!(bundle.total, Some(1));
    assert_eq!(bundle.link("self"), Some("Patient?gender=female"));
    let patients: Vec<Patient> = bundle.resources_of().unwrap();
    assert_eq!(patients[0].gender.as_deref(), Some("female"));
}

#[test]
fn registry_read_over_http() {
    let base_url = start_mock_server();
    let registry = ResourceRegistry::with_defaults();

    let handle = registry.read("Patient", "xyz", server(&base_url)).unwrap();

    let json = handle.resource().to_value().unwrap();
    assert_eq!(json["id"], "stored-xyz");
    assert_eq!(json["language"], "de-CH");
}

#[test]
fn capability_statement_is_fetched() {
    let base_url = start_mock_server();
    let http = HttpServer::new(&base_url).unwrap();

    let capabilities = http.capabilities().unwrap();

    assert_eq!(capabilities.fhir_version, "4.3.0");
    assert!(capabilities.supports("Patient", "read"));
    assert!(capabilities.supports("Patient", "search-type"));
    assert!(!capabilities.supports("Observation", "read"));
}

#[test]
fn unreachable_server_is_transport_error() {
    let http = HttpServer::new("http://127.0.0.1:1/fhir").unwrap();

    let err = http.request_json("Patient/1").unwrap_err();

    assert!(matches!(err, FhirError::Transport(_)));
}
