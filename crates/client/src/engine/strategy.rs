//! The three retrieval strategies.
//!
//! Every strategy reads and writes only the current-version store. Store
//! failures never reach the caller: a failed read counts as a miss and a
//! failed write is logged and dropped.

use serde::Serialize;
use std::sync::Arc;
use swcache_core::{CacheStorage, Error};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::classify::Strategy;
use crate::fetch::Network;
use crate::request::Request;
use crate::response::Response;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    /// A live network response.
    Network,
    /// The stored entry for the request itself.
    Cache,
    /// The stored offline shell document.
    Fallback,
    /// Not intercepted; fetched without touching any store.
    Passthrough,
}

/// A response handed back to the caller.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    pub fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }
}

type Revalidation = JoinHandle<Result<Response, Error>>;

/// Runs strategies against one store.
pub struct StrategyExecutor {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    store: String,
    fallback: Request,
    revalidations: Mutex<Vec<Revalidation>>,
}

impl StrategyExecutor {
    /// `fallback` is the request whose stored entry is the offline shell.
    pub fn new(
        storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, store: impl Into<String>, fallback: Request,
    ) -> Self {
        Self { storage, network, store: store.into(), fallback, revalidations: Mutex::new(Vec::new()) }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub async fn run(&self, strategy: Strategy, request: &Request) -> Result<Served, Error> {
        match strategy {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    /// Network, then the stored entry, then the offline shell.
    pub async fn network_first(&self, request: &Request) -> Result<Served, Error> {
        let err = match self.network.fetch(request).await {
            Ok(response) => {
                store_response(self.storage.as_ref(), &self.store, request, &response).await;
                return Ok(Served::new(response, ResponseSource::Network));
            }
            Err(err) => err,
        };

        tracing::warn!(url = %request.url, error = %err, "network failed, falling back to store");

        if let Some(hit) = self.lookup(request).await {
            return Ok(Served::new(hit, ResponseSource::Cache));
        }
        if let Some(shell) = self.lookup(&self.fallback).await {
            tracing::debug!(url = %request.url, fallback = %self.fallback.url, "serving offline shell");
            return Ok(Served::new(shell, ResponseSource::Fallback));
        }
        Err(err)
    }

    /// Stored entry with no network access, else network.
    pub async fn cache_first(&self, request: &Request) -> Result<Served, Error> {
        if let Some(hit) = self.lookup(request).await {
            return Ok(Served::new(hit, ResponseSource::Cache));
        }

        let response = self.network.fetch(request).await?;
        store_response(self.storage.as_ref(), &self.store, request, &response).await;
        Ok(Served::new(response, ResponseSource::Network))
    }

    /// Stored entry now and a refresh in the background, else wait for the
    /// refresh.
    pub async fn stale_while_revalidate(&self, request: &Request) -> Result<Served, Error> {
        let revalidation = self.spawn_revalidation(request);

        match self.lookup(request).await {
            Some(hit) => {
                let mut pending = self.revalidations.lock().await;
                pending.retain(|handle| !handle.is_finished());
                pending.push(revalidation);
                Ok(Served::new(hit, ResponseSource::Cache))
            }
            None => {
                let response = revalidation
                    .await
                    .map_err(|e| Error::Network(format!("revalidation task failed: {e}")))??;
                Ok(Served::new(response, ResponseSource::Network))
            }
        }
    }

    /// Wait for every background revalidation started so far.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(&mut *self.revalidations.lock().await);
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "revalidation task aborted");
                }
            }
        }
    }

    fn spawn_revalidation(&self, request: &Request) -> Revalidation {
        let storage = Arc::clone(&self.storage);
        let network = Arc::clone(&self.network);
        let store = self.store.clone();
        let request = request.clone();

        tokio::spawn(async move {
            match network.fetch(&request).await {
                Ok(response) => {
                    store_response(storage.as_ref(), &store, &request, &response).await;
                    Ok(response)
                }
                Err(err) => {
                    tracing::warn!(url = %request.url, error = %err, "revalidation fetch failed");
                    Err(err)
                }
            }
        })
    }

    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.storage.lookup(&self.store, &request.cache_key()).await {
            Ok(Some(entry)) => match Response::from_cached(entry) {
                Ok(response) => {
                    tracing::debug!(url = %request.url, "cache hit");
                    Some(response)
                }
                Err(e) => {
                    tracing::warn!(url = %request.url, error = %e, "discarding unreadable entry");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(url = %request.url, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "store read failed, treating as miss");
                None
            }
        }
    }
}

/// Write a copy of `response` if it is storable. Errors are logged only.
async fn store_response(storage: &dyn CacheStorage, store: &str, request: &Request, response: &Response) {
    if !response.is_storable() {
        tracing::debug!(url = %request.url, status = %response.status, kind = ?response.kind, "not storing");
        return;
    }

    match storage.put(store, response.to_cached(request)).await {
        Ok(()) => tracing::debug!(url = %request.url, store, "stored"),
        Err(e) => tracing::warn!(url = %request.url, error = %e, "store write failed"),
    }
}
