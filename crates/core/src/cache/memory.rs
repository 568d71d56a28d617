//! In-process store backend.
//!
//! Keeps every store in a `HashMap` behind a tokio `RwLock` and counts
//! entry reads and writes, so callers can observe whether a code path
//! touched the store at all.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::entries::CachedResponse;
use super::storage::CacheStorage;
use crate::Error;

/// Snapshot of the entry access counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessStats {
    pub reads: u64,
    pub writes: u64,
}

impl AccessStats {
    pub fn total(&self) -> u64 {
        self.reads + self.writes
    }
}

/// Store backend that lives in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<HashMap<String, BTreeMap<String, CachedResponse>>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry reads and writes performed so far.
    pub fn stats(&self) -> AccessStats {
        AccessStats { reads: self.reads.load(Ordering::Relaxed), writes: self.writes.load(Ordering::Relaxed) }
    }
}

fn missing_store(store: &str) -> Error {
    Error::Store(format!("no such store: {store}"))
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn open(&self, store: &str) -> Result<(), Error> {
        self.stores.write().await.entry(store.to_string()).or_default();
        Ok(())
    }

    async fn has(&self, store: &str) -> Result<bool, Error> {
        Ok(self.stores.read().await.contains_key(store))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, store: &str) -> Result<bool, Error> {
        Ok(self.stores.write().await.remove(store).is_some())
    }

    async fn lookup(&self, store: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let stores = self.stores.read().await;
        Ok(stores.get(store).and_then(|entries| entries.get(key)).cloned())
    }

    async fn put(&self, store: &str, entry: CachedResponse) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut stores = self.stores.write().await;
        let target = stores.get_mut(store).ok_or_else(|| missing_store(store))?;
        target.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn put_all(&self, store: &str, entries: Vec<CachedResponse>) -> Result<(), Error> {
        self.writes.fetch_add(entries.len() as u64, Ordering::Relaxed);
        // Single lock acquisition, so readers see all entries or none.
        let mut stores = self.stores.write().await;
        let target = stores.get_mut(store).ok_or_else(|| missing_store(store))?;
        for entry in entries {
            target.insert(entry.key.clone(), entry);
        }
        Ok(())
    }

    async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        Ok(self.stores.read().await.get(store).map_or(0, |entries| entries.len() as u64))
    }

    async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        let stores = self.stores.read().await;
        let mut urls: Vec<String> = stores
            .get(store)
            .map(|entries| entries.values().map(|e| e.url.clone()).collect())
            .unwrap_or_default();
        urls.sort();
        Ok(urls)
    }
}
