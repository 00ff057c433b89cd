//! multisearch-rs: concurrent multi-provider search aggregation
//!
//! This is the main entry point for the application.

use anyhow::Result;
use multisearch_rs::{
    browser::ChromeLauncher,
    config,
    network::HttpClient,
    providers::ProviderLoader,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let Some(config_path) = parse_args()? else {
        return Ok(());
    };

    // Load configuration before logging so the debug flag can pick the level
    let settings = config::load(config_path.as_deref())?;

    let default_level = if settings.general.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Starting multisearch-rs v{}", multisearch_rs::VERSION);
    let settings = config::init(settings)?;
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    // Load providers
    let registry = ProviderLoader::load(settings, &client, Arc::new(ChromeLauncher::new()))?;
    info!("Loaded {} search providers", registry.len());

    // Create application state
    let state = AppState::new(settings.clone(), registry);

    // Create router
    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    info!("Starting server on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Parse command-line flags
///
/// Returns `None` when the process should exit right away (help or version),
/// otherwise the optional settings path.
fn parse_args() -> Result<Option<Option<PathBuf>>> {
    let mut config_path = None;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{} requires a file path", arg))?;
                config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("multisearch-rs {}", multisearch_rs::VERSION);
                return Ok(None);
            }
            other => {
                print_usage();
                return Err(anyhow::anyhow!("unknown argument: {}", other));
            }
        }
    }

    Ok(Some(config_path))
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
multisearch-rs v{}
Concurrent multi-provider search aggregation

USAGE:
    multisearch-rs [OPTIONS]

OPTIONS:
    -c, --config <FILE>    Path to configuration file
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    MULTISEARCH_SETTINGS_PATH  Path to settings.yml
    MULTISEARCH_DEBUG          Enable debug logging (true/false)
    MULTISEARCH_PORT           Server port
    MULTISEARCH_BIND_ADDRESS   Bind address
    CHROME_PATH                Chrome/Chromium executable for browser-driven providers
    ZHIHU_COOKIE               Session cookie string for the zhihu providers
    RUST_LOG                   Log filter (overrides MULTISEARCH_DEBUG)
"#,
        multisearch_rs::VERSION
    );
}
