//! Certificate verification server
//!
//! Accepts certificate uploads over HTTP and returns the authenticity
//! classification as JSON:
//!
//! - `POST /upload`: classify a PDF, PNG or JPEG
//! - `GET /health`: liveness probe
//!
//! Reference bitmaps are loaded once at startup; the server refuses to start
//! if either one is missing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use certverify_core::{CertificateVerifier, ReferenceAssets, VerifierConfig};
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_health, handle_upload};

/// Command-line arguments for the certificate verification server
#[derive(Parser, Debug)]
#[command(name = "certverify-server")]
#[command(about = "Certificate authenticity classification server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference logo bitmap (overrides the config file)
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Reference layout bitmap (overrides the config file)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Allowed CORS origin; repeat for several
    #[arg(long = "allow-origin", default_value = "http://localhost:3000")]
    allow_origins: Vec<String>,

    /// Largest accepted upload in megabytes
    #[arg(long, default_value = "20")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<CertificateVerifier>,
}

/// Routes without middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/upload", post(handle_upload))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}

fn load_config(args: &Args) -> anyhow::Result<VerifierConfig> {
    let mut config = match &args.config {
        Some(path) => VerifierConfig::from_file(path)?,
        None => VerifierConfig::default(),
    };
    if let Some(logo) = &args.logo {
        config.logo_path = logo.clone();
    }
    if let Some(template) = &args.template {
        config.template_path = template.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting certificate verification server on {}:{}", args.host, args.port);

    let config = load_config(&args)?;
    let assets = ReferenceAssets::load(&config);
    assets
        .ensure_present()
        .context("Reference assets are required to start")?;

    let verifier = CertificateVerifier::builder()
        .config(&config)
        .assets(Arc::new(assets))
        .build();
    let state = AppState {
        verifier: Arc::new(verifier),
    };

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&args.allow_origins)?)
            .layer(DefaultBodyLimit::max(args.max_upload_mb * 1024 * 1024)),
    );

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!(
        logo = %config.logo_path.display(),
        template = %config.template_path.display(),
        "Reference assets ready"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
