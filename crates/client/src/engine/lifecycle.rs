//! Version lifecycle: install, wait, activate.
//!
//! ```text
//! Installing --install ok--> Waiting --activate--> Active
//!     |
//!     +--install failed--> Failed
//! ```
//!
//! Only this module creates or deletes whole stores.

use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use swcache_core::{CacheStorage, CacheVersion, CachedResponse, Error};
use tokio::sync::{Mutex, watch};
use url::Url;

use crate::fetch::{Network, canonicalize};
use crate::request::Request;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Installing,
    Waiting,
    Active,
    Failed,
}

/// Resources fetched and stored as one unit at install time.
#[derive(Debug, Clone)]
pub struct PrecacheManifest {
    requests: Vec<Request>,
}

impl PrecacheManifest {
    /// Resolve manifest paths against the application origin, keeping order.
    pub fn resolve<S: AsRef<str>>(paths: &[S], origin: &Url) -> Result<Self, Error> {
        let requests = paths
            .iter()
            .map(|path| {
                canonicalize(path.as_ref(), origin)
                    .map(Request::get)
                    .map_err(|e| Error::InvalidUrl(format!("precache path {}: {e}", path.as_ref())))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requests })
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Drives one cache generation through its lifecycle.
pub struct LifecycleManager {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    version: CacheVersion,
    manifest: PrecacheManifest,
    skip_on_install: bool,
    skip_waiting: AtomicBool,
    state: watch::Sender<LifecycleState>,
    transition: Mutex<()>,
}

impl LifecycleManager {
    pub fn new(
        storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, version: CacheVersion, manifest: PrecacheManifest,
        skip_on_install: bool,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Installing);
        Self {
            storage,
            network,
            version,
            manifest,
            skip_on_install,
            skip_waiting: AtomicBool::new(false),
            state,
            transition: Mutex::new(()),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    pub fn manifest(&self) -> &PrecacheManifest {
        &self.manifest
    }

    /// Precache every manifest entry into the current store, all or nothing.
    ///
    /// On success the state moves to Waiting. Any fetch failure or
    /// non-storable response moves it to Failed and nothing is written. An
    /// already Active generation stays Active either way.
    pub async fn install(&self) -> Result<(), Error> {
        let _guard = self.transition.lock().await;
        let previous = self.state();
        if previous == LifecycleState::Failed {
            return Err(Error::InvalidState("install already failed for this version".into()));
        }

        let store = self.version.store_name();
        tracing::info!(store, entries = self.manifest.len(), "installing");

        match self.precache(store).await {
            Ok(()) => {
                if previous != LifecycleState::Active {
                    self.state.send_replace(LifecycleState::Waiting);
                }
                if self.skip_on_install {
                    self.skip_waiting.store(true, Ordering::SeqCst);
                }
                tracing::info!(store, "installed");
                Ok(())
            }
            Err(e) => {
                if previous != LifecycleState::Active {
                    self.state.send_replace(LifecycleState::Failed);
                }
                tracing::warn!(store, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self, store: &str) -> Result<(), Error> {
        self.storage.open(store).await?;
        let fetches = self.manifest.requests().iter().map(|request| self.precache_entry(request));
        let entries = try_join_all(fetches).await?;
        self.storage.put_all(store, entries).await
    }

    async fn precache_entry(&self, request: &Request) -> Result<CachedResponse, Error> {
        let response = self
            .network
            .fetch(request)
            .await
            .map_err(|e| Error::PrecacheFailed(format!("{}: {e}", request.url)))?;
        if !response.is_storable() {
            return Err(Error::PrecacheFailed(format!("{}: status {}", request.url, response.status)));
        }
        Ok(response.to_cached(request))
    }

    /// Delete orphaned stores and take over. Returns the deleted store names.
    ///
    /// A no-op when already Active. Cleanup failures are logged and do not
    /// block activation.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let _guard = self.transition.lock().await;
        match self.state() {
            LifecycleState::Active => return Ok(Vec::new()),
            LifecycleState::Waiting => {}
            state => return Err(Error::InvalidState(format!("cannot activate while {state:?}"))),
        }

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list stores, skipping cleanup");
                Vec::new()
            }
        };

        let orphans = self.version.orphans(&names);
        let results = join_all(orphans.iter().map(|name| self.storage.delete(name))).await;

        let mut deleted = Vec::new();
        for (name, result) in orphans.into_iter().zip(results) {
            match result {
                Ok(true) => deleted.push(name.to_string()),
                Ok(false) => {}
                Err(e) => tracing::warn!(store = name, error = %e, "failed to delete orphaned store"),
            }
        }

        self.state.send_replace(LifecycleState::Active);
        tracing::info!(store = self.version.store_name(), deleted = ?deleted, "activated");
        Ok(deleted)
    }

    /// Ask to activate as soon as install completes. Returns whether the
    /// generation is Waiting and can activate right now.
    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting.store(true, Ordering::SeqCst);
        self.state() == LifecycleState::Waiting
    }

    pub fn should_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockNetwork, ORIGIN, script_precache, test_config, url};
    use swcache_core::MemoryStorage;

    fn manager(storage: Arc<dyn CacheStorage>, network: Arc<MockNetwork>, skip_on_install: bool) -> LifecycleManager {
        let config = test_config();
        let origin = Url::parse(ORIGIN).unwrap();
        let manifest = PrecacheManifest::resolve(&config.precache, &origin).unwrap();
        LifecycleManager::new(storage, network, config.cache_version(), manifest, skip_on_install)
    }

    #[test]
    fn test_manifest_resolves_in_order() {
        let origin = Url::parse(ORIGIN).unwrap();
        let manifest = PrecacheManifest::resolve(&["/", "/index.html", "logo192.png"], &origin).unwrap();
        let urls: Vec<_> = manifest.requests().iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            ["http://localhost:3000/", "http://localhost:3000/index.html", "http://localhost:3000/logo192.png"]
        );
    }

    #[test]
    fn test_manifest_rejects_empty_path() {
        let origin = Url::parse(ORIGIN).unwrap();
        assert!(matches!(PrecacheManifest::resolve(&["/", "  "], &origin), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_install_stores_every_entry() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        let lifecycle = manager(storage.clone(), network, true);

        lifecycle.install().await.unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Waiting);
        assert!(lifecycle.should_skip_waiting());
        assert_eq!(storage.entry_count("guitar-song-v1.0.0").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        network.fail(&url("/manifest.json"));
        let lifecycle = manager(storage.clone(), network, true);

        let result = lifecycle.install().await;

        assert!(matches!(result, Err(Error::PrecacheFailed(_))));
        assert_eq!(lifecycle.state(), LifecycleState::Failed);
        assert!(!lifecycle.should_skip_waiting());
        assert_eq!(storage.entry_count("guitar-song-v1.0.0").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_install_rejects_error_status() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        network.respond(&url("/favicon.ico"), 404, "");
        let lifecycle = manager(storage.clone(), network, true);

        assert!(matches!(lifecycle.install().await, Err(Error::PrecacheFailed(_))));
        assert_eq!(storage.entry_count("guitar-song-v1.0.0").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_install_twice_overwrites() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        let lifecycle = manager(storage.clone(), network, false);

        lifecycle.install().await.unwrap();
        lifecycle.install().await.unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Waiting);
        assert!(!lifecycle.should_skip_waiting());
        assert_eq!(storage.entry_count("guitar-song-v1.0.0").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_activate_deletes_only_orphans() {
        let storage = Arc::new(MemoryStorage::new());
        for name in ["guitar-song-v0.9.0", "guitar-song-v1.0.0", "other-cache"] {
            storage.open(name).await.unwrap();
        }
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        let lifecycle = manager(storage.clone(), network, true);
        lifecycle.install().await.unwrap();

        let deleted = lifecycle.activate().await.unwrap();

        assert_eq!(deleted, ["guitar-song-v0.9.0"]);
        assert_eq!(storage.keys().await.unwrap(), ["guitar-song-v1.0.0", "other-cache"]);
        assert!(lifecycle.is_active());
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        let lifecycle = manager(storage.clone(), network, true);
        lifecycle.install().await.unwrap();
        lifecycle.activate().await.unwrap();

        storage.open("guitar-song-v0.8.0").await.unwrap();
        assert!(lifecycle.activate().await.unwrap().is_empty());
        assert!(storage.has("guitar-song-v0.8.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let lifecycle = manager(Arc::new(MemoryStorage::new()), Arc::new(MockNetwork::new()), true);
        assert!(matches!(lifecycle.activate().await, Err(Error::InvalidState(_))));

        lifecycle.install().await.unwrap_err();
        assert_eq!(lifecycle.state(), LifecycleState::Failed);
        assert!(matches!(lifecycle.activate().await, Err(Error::InvalidState(_))));
        assert!(matches!(lifecycle.install().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_reinstall_while_active_stays_active() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        let lifecycle = manager(storage, network.clone(), true);
        lifecycle.install().await.unwrap();
        lifecycle.activate().await.unwrap();

        network.fail(&url("/"));
        assert!(lifecycle.install().await.is_err());
        assert!(lifecycle.is_active());
    }

    #[tokio::test]
    async fn test_skip_waiting_reports_readiness() {
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        let lifecycle = manager(Arc::new(MemoryStorage::new()), network, false);

        assert!(!lifecycle.skip_waiting());
        lifecycle.install().await.unwrap();
        assert!(lifecycle.skip_waiting());
        assert!(lifecycle.should_skip_waiting());
    }

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let network = Arc::new(MockNetwork::new());
        script_precache(&network, &test_config());
        let lifecycle = manager(Arc::new(MemoryStorage::new()), network, true);
        let mut rx = lifecycle.subscribe();
        assert_eq!(*rx.borrow_and_update(), LifecycleState::Installing);

        lifecycle.install().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), LifecycleState::Waiting);
    }
}
