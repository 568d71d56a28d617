//! swcache server entry point.
//!
//! Boots the caching engine, then serves it as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{Engine, FetchClient, FetchConfig, UpdateChannel};
use swcache_core::{AppConfig, CacheDb, CacheStorage, MemoryStorage, StoreBackend};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let storage: Arc<dyn CacheStorage> = match config.store_backend {
        StoreBackend::Sqlite => Arc::new(CacheDb::open(&config.db_path).await?),
        StoreBackend::Memory => Arc::new(MemoryStorage::new()),
    };
    let network = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config)?)?);
    let engine = Arc::new(Engine::new(&config, Arc::clone(&storage), network)?);

    tracing::info!(
        store = %config.cache_version(),
        backend = storage.backend(),
        origin = %config.origin,
        "Starting swcache server on stdio transport"
    );

    let boot = Arc::clone(&engine);
    tokio::spawn(async move {
        match boot.start().await {
            Ok(state) => tracing::info!(?state, "engine started"),
            Err(e) => tracing::error!(error = %e, "install failed; requests pass through uncached"),
        }
    });

    let (channel, _listener) = UpdateChannel::spawn(Arc::clone(&engine));

    let handler = handler::SwCacheServer::new(engine, channel);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
