//! Test support: a scripted network and store helpers.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use swcache_core::{AppConfig, CacheStorage, CachedResponse, Error};
use tokio::sync::Notify;
use url::Url;

use crate::fetch::Network;
use crate::request::Request;
use crate::response::{Response, ResponseKind};

pub(crate) const ORIGIN: &str = "http://localhost:3000";

/// Absolute URL for a path on the test origin.
pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub(crate) fn test_config() -> AppConfig {
    AppConfig { store_backend: swcache_core::StoreBackend::Memory, ..AppConfig::default() }
}

/// Script a successful reply for every manifest path.
pub(crate) fn script_precache(network: &MockNetwork, config: &AppConfig) {
    for path in &config.precache {
        network.respond(&url(path), 200, &format!("precached {path}"));
    }
}

/// Store a 200 response for `target` directly, bypassing the network.
/// Opens the store first.
pub(crate) async fn put_entry(storage: &dyn CacheStorage, store: &str, target: &Url, body: &str) {
    storage.open(store).await.unwrap();
    let response = Response {
        url: target.clone(),
        status: StatusCode::OK,
        headers: HeaderMap::new(),
        body: Bytes::from(body.to_string()),
        kind: ResponseKind::Basic,
    };
    storage.put(store, response.to_cached(&Request::get(target.clone()))).await.unwrap();
}

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: String, kind: ResponseKind },
    Fail,
}

/// A [`Network`] that answers from a per-URL script.
///
/// The latest script for a URL wins. Unscripted URLs fail like an offline
/// network. A gated URL holds its next fetch until the gate is notified.
#[derive(Default)]
pub(crate) struct MockNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl MockNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, target: &Url, status: u16, body: &str) {
        self.respond_with_kind(target, status, body, ResponseKind::Basic);
    }

    pub(crate) fn respond_with_kind(&self, target: &Url, status: u16, body: &str, kind: ResponseKind) {
        let reply = Reply::Respond { status, body: body.to_string(), kind };
        self.replies.lock().unwrap().insert(target.to_string(), reply);
    }

    pub(crate) fn fail(&self, target: &Url) {
        self.replies.lock().unwrap().insert(target.to_string(), Reply::Fail);
    }

    /// Hold the next fetch of `target` until the returned gate is notified.
    pub(crate) fn gate(&self, target: &Url) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(target.to_string(), Arc::clone(&gate));
        gate
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, target: &Url) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == target.as_str()).count()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let key = request.url.to_string();
        self.calls.lock().unwrap().push(key.clone());

        let gate = self.gates.lock().unwrap().remove(&key);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let reply = self.replies.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::Respond { status, body, kind }) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                Ok(Response {
                    url: request.url.clone(),
                    status: StatusCode::from_u16(status).unwrap(),
                    headers,
                    body: Bytes::from(body),
                    kind,
                })
            }
            Some(Reply::Fail) => Err(Error::Network(format!("connection refused: {key}"))),
            None => Err(Error::Network(format!("no route to {key}"))),
        }
    }
}

/// A store whose every operation fails.
pub(crate) struct BrokenStorage;

#[async_trait]
impl CacheStorage for BrokenStorage {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn open(&self, _store: &str) -> Result<(), Error> {
        Err(Error::Store("unavailable".into()))
    }

    async fn has(&self, _store: &str) -> Result<bool, Error> {
        Err(Error::Store("unavailable".into()))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Err(Error::Store("unavailable".into()))
    }

    async fn delete(&self, _store: &str) -> Result<bool, Error> {
        Err(Error::Store("unavailable".into()))
    }

    async fn lookup(&self, _store: &str, _key: &str) -> Result<Option<CachedResponse>, Error> {
        Err(Error::Store("unavailable".into()))
    }

    async fn put(&self, _store: &str, _entry: CachedResponse) -> Result<(), Error> {
        Err(Error::Store("unavailable".into()))
    }

    async fn put_all(&self, _store: &str, _entries: Vec<CachedResponse>) -> Result<(), Error> {
        Err(Error::Store("unavailable".into()))
    }

    async fn entry_count(&self, _store: &str) -> Result<u64, Error> {
        Err(Error::Store("unavailable".into()))
    }

    async fn entry_urls(&self, _store: &str) -> Result<Vec<String>, Error> {
        Err(Error::Store("unavailable".into()))
    }
}
