//! fhir-read: read a single FHIR resource and print it as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use fhir_resource::{FhirServer, ResourceRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir_client::{Config, HttpServer};

/// Read a FHIR resource by type and id
#[derive(Debug, Parser)]
#[command(name = "fhir-read", version)]
struct Args {
    /// Resource type, e.g. Patient
    resource_type: String,

    /// Remote id of the resource
    id: String,

    /// Server base URL (overrides FHIR_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Pretty-print the resource
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout only carries the resource
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(base_url) = args.base_url.clone() {
        config.base_url = base_url;
    }
    if config.api_key.is_none() {
        tracing::debug!("FHIR_API_KEY not set, sending unauthenticated requests");
    }

    match run(&args, &config) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Read failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &Config) -> fhir_resource::Result<String> {
    let server: Arc<dyn FhirServer> = Arc::new(HttpServer::from_config(config)?);
    let registry = ResourceRegistry::with_defaults();

    tracing::info!(
        base_url = %config.base_url,
        resource_type = %args.resource_type,
        id = %args.id,
        "Reading resource"
    );

    let handle = registry.read(&args.resource_type, &args.id, server)?;
    render(&handle.resource().to_value()?, args.pretty)
}

fn render(json: &serde_json::Value, pretty: bool) -> fhir_resource::Result<String> {
    let output = if pretty {
        serde_json::to_string_pretty(json)?
    } else {
        serde_json::to_string(json)?
    };
    Ok(output)
}
