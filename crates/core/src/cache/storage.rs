//! The store interface the engine runs against.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::entries::CachedResponse;
use crate::Error;

/// Asynchronous, named key-value stores of response snapshots.
///
/// Multiple stores coexist side by side. Only the lifecycle manager creates
/// or deletes whole stores; strategies read and write entries.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Backend name for logs, e.g. "sqlite" or "memory".
    fn backend(&self) -> &'static str;

    /// Create the store if absent.
    async fn open(&self, store: &str) -> Result<(), Error>;

    async fn has(&self, store: &str) -> Result<bool, Error>;

    /// Names of all stores, including ones outside our namespace.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store with all of its entries. Returns false if it was absent.
    async fn delete(&self, store: &str) -> Result<bool, Error>;

    /// The response stored under `key`, if any.
    async fn lookup(&self, store: &str, key: &str) -> Result<Option<CachedResponse>, Error>;

    /// Write one entry, replacing any previous one with the same key.
    /// Fails with a store error if the store does not exist.
    async fn put(&self, store: &str, entry: CachedResponse) -> Result<(), Error>;

    /// Write all entries or none of them into an existing store.
    async fn put_all(&self, store: &str, entries: Vec<CachedResponse>) -> Result<(), Error>;

    async fn entry_count(&self, store: &str) -> Result<u64, Error>;

    /// URLs of the entries in a store.
    async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn open(&self, store: &str) -> Result<(), Error> {
        self.open_store(store).await
    }

    async fn has(&self, store: &str) -> Result<bool, Error> {
        self.has_store(store).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }

    async fn delete(&self, store: &str) -> Result<bool, Error> {
        self.delete_store(store).await
    }

    async fn lookup(&self, store: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        self.get_entry(store, key).await
    }

    async fn put(&self, store: &str, entry: CachedResponse) -> Result<(), Error> {
        self.upsert_entry(store, entry).await
    }

    async fn put_all(&self, store: &str, entries: Vec<CachedResponse>) -> Result<(), Error> {
        self.upsert_entries(store, entries).await
    }

    async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        self.count_entries(store).await
    }

    async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        CacheDb::entry_urls(self, store).await
    }
}
