//! traefikr - Management layer for Traefik dynamic configuration
//!
//! This is the composition root that wires together all the components.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use traefikr::adapters::inbound::ApiServer;
use traefikr::adapters::outbound::{
    SqliteResourceRepository, TomlFragmentWriter, TraefikApiClient, TraefikClientConfig,
};
use traefikr::config::load_config;
use traefikr::{ResourceService, SchemaRegistry};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting traefikr v{} listen={} upstream={}",
        env!("CARGO_PKG_VERSION"),
        cfg.listen_addr,
        cfg.traefik_api_url
    );

    // ===== COMPOSITION ROOT =====
    // Wire up all adapters and services

    // 1. Create outbound adapters

    // Schemas are compiled once; a broken document is fatal
    let schemas = Arc::new(SchemaRegistry::new()?);

    // Authoritative store (SQLite)
    let repo = Arc::new(SqliteResourceRepository::open(&cfg.db_path)?);
    tracing::info!("resource store opened at {}", cfg.db_path);

    // Upstream mirror (Traefik API)
    let mirror = Arc::new(TraefikApiClient::new(TraefikClientConfig {
        base_url: cfg.traefik_api_url.clone(),
        timeout: Duration::from_secs(cfg.traefik_api_timeout_secs),
        basic_auth_username: cfg.traefik_basic_auth_username.clone(),
        basic_auth_password: cfg.traefik_basic_auth_password.clone(),
        api_key_header: cfg.traefik_api_key_header.clone(),
        api_key_secret: cfg.traefik_api_key_secret.clone(),
    })?);

    // Fragment sink (TOML files for the file provider)
    let sink = Arc::new(TomlFragmentWriter::new(cfg.fragment_dir.as_ref().map(PathBuf::from)));
    match &cfg.fragment_dir {
        Some(dir) => tracing::info!("servers transport fragments written to {}", dir),
        None => tracing::info!("TRAEFIK_CONFIG_PATH not set, servers transport fragments disabled"),
    }

    // 2. Create application service
    let service = Arc::new(ResourceService::new(repo, mirror, schemas, sink));

    // 3. Rebuild fragments from the store before serving
    if let Err(e) = service.restore_fragments().await {
        tracing::warn!("servers transport restoration failed: {}", e);
    }

    // 4. Create inbound adapter and run
    let server = ApiServer::new(cfg.listen_addr, service, cfg.api_key);

    server.run().await
}
