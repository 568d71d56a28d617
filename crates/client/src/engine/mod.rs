//! The engine: a single dispatch point in front of the network.
//!
//! Every request is routed once. Bypassed requests, and every request made
//! before the current generation is Active, go straight to the network and
//! never touch a store; the rest run their strategy against the current
//! store.

pub mod channel;
pub mod classify;
pub mod filter;
pub mod lifecycle;
pub mod strategy;

pub use channel::{ControlMessage, UpdateChannel};
pub use classify::{Route, STATIC_ASSET_EXTENSIONS, Strategy, classify, route};
pub use filter::{BypassReason, ExclusionFilter};
pub use lifecycle::{LifecycleManager, LifecycleState, PrecacheManifest};
pub use strategy::{ResponseSource, Served, StrategyExecutor};

use serde::Serialize;
use std::sync::Arc;
use swcache_core::{AppConfig, CacheStorage, Error};
use url::Url;

use crate::fetch::{Network, canonicalize};
use crate::request::Request;
use crate::response::Response;

/// Snapshot of the engine for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub state: LifecycleState,
    pub backend: &'static str,
    pub store_name: String,
    pub stores: Vec<String>,
    pub entries: u64,
}

pub struct Engine {
    origin: Url,
    filter: ExclusionFilter,
    executor: StrategyExecutor,
    lifecycle: LifecycleManager,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl Engine {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        let version = config.cache_version();
        let filter = ExclusionFilter::new(&config.exclusions)?;
        let manifest = PrecacheManifest::resolve(&config.precache, &origin)?;
        let fallback = canonicalize(&config.offline_fallback, &origin)
            .map(Request::get)
            .map_err(|e| Error::InvalidUrl(format!("offline fallback: {e}")))?;

        let executor =
            StrategyExecutor::new(Arc::clone(&storage), Arc::clone(&network), version.store_name(), fallback);
        let lifecycle = LifecycleManager::new(
            Arc::clone(&storage),
            Arc::clone(&network),
            version,
            manifest,
            config.skip_waiting_on_install,
        );

        Ok(Self { origin, filter, executor, lifecycle, storage, network })
    }

    /// Install, then activate if skipWaiting was signalled.
    pub async fn start(&self) -> Result<LifecycleState, Error> {
        self.lifecycle.install().await?;
        if self.lifecycle.should_skip_waiting() {
            self.lifecycle.activate().await?;
        }
        Ok(self.lifecycle.state())
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn route(&self, request: &Request) -> Route {
        route(&self.filter, request)
    }

    /// Answer one intercepted request.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Served, Error> {
        match self.route(request) {
            Route::Bypass(reason) => {
                tracing::debug!(url = %request.url, ?reason, "bypass");
                self.passthrough(request).await
            }
            Route::Strategy(_) if !self.lifecycle.is_active() => {
                tracing::debug!(url = %request.url, state = ?self.lifecycle.state(), "not active, passing through");
                self.passthrough(request).await
            }
            Route::Strategy(strategy) => {
                tracing::debug!(url = %request.url, ?strategy, "intercept");
                self.executor.run(strategy, request).await
            }
        }
    }

    async fn passthrough(&self, request: &Request) -> Result<Served, Error> {
        let response = self.network.fetch(request).await?;
        Ok(Served::new(response, ResponseSource::Passthrough))
    }

    /// Handle one inbound control message; unknown messages are ignored.
    pub async fn handle_message(&self, data: &str) -> Result<(), Error> {
        match ControlMessage::parse(data) {
            Some(ControlMessage::SkipWaiting) => {
                tracing::info!(state = ?self.lifecycle.state(), "skipWaiting received");
                if self.lifecycle.skip_waiting() {
                    self.lifecycle.activate().await?;
                }
                Ok(())
            }
            None => {
                tracing::debug!(data, "ignoring unknown control message");
                Ok(())
            }
        }
    }

    /// The stored entry for `request` in the current store, without network.
    pub async fn cached(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.storage
            .lookup(self.executor.store(), &request.cache_key())
            .await?
            .map(Response::from_cached)
            .transpose()
    }

    /// URLs stored in the current store.
    pub async fn cached_urls(&self) -> Result<Vec<String>, Error> {
        self.storage.entry_urls(self.executor.store()).await
    }

    pub async fn status(&self) -> Result<EngineStatus, Error> {
        let store_name = self.executor.store().to_string();
        let stores = self.storage.keys().await?;
        let entries = self.storage.entry_count(&store_name).await?;
        Ok(EngineStatus { state: self.lifecycle.state(), backend: self.storage.backend(), store_name, stores, entries })
    }

    /// Wait for background revalidations to finish.
    pub async fn settle(&self) {
        self.executor.settle().await;
    }
}
