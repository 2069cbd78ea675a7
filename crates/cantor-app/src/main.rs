//! Cantor binary - composition root.
//!
//! 1. Parse CLI flags and initialize tracing
//! 2. Load configuration from TOML and apply its log level
//! 3. Build the catalog, ingestion pipeline and query engine
//! 4. Serve the HTTP API

mod cli;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter};

use cantor_api::state::AppState;
use cantor_core::config::CantorConfig;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing first, so config loading is logged. RUST_LOG wins outright;
    // otherwise the filter is swapped for the configured level once known.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let filter_from_env = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| EnvFilter::new(args.startup_log_level())),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let config_file = args.resolve_config_path();
    let mut config = CantorConfig::load_or_default(&config_file);
    config.general.port = args.resolve_port(config.general.port);
    config.general.bind_address = args.resolve_bind(&config.general.bind_address);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    if !filter_from_env {
        filter_handle.modify(|f| *f = EnvFilter::new(&config.general.log_level))?;
    }

    tracing::info!("Starting Cantor v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        log_level = %config.general.log_level,
        "Configuration resolved"
    );

    let state = AppState::development(config.clone());
    tracing::info!(
        diarize = config.ingest.diarize,
        reject_duplicates = config.ingest.reject_duplicates,
        "Catalog and pipeline ready (development collaborators)"
    );

    if let Err(e) = cantor_api::start_server(&config, state).await {
        tracing::error!(
            addr = %format!("{}:{}", config.general.bind_address, config.general.port),
            error = %e,
            "API server stopped"
        );
        return Err(e.into());
    }

    Ok(())
}
