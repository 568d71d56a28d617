//! Store and entry CRUD operations on the SQLite backend.
//!
//! Stores are rows in `stores`; entries reference their store and are
//! removed with it.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A complete response snapshot stored under a request-identity key.
///
/// Entries carry no expiry; a newer write for the same key replaces the
/// older one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Encoded row ready for insertion.
struct EntryRow {
    entry: CachedResponse,
    headers_json: String,
}

impl EntryRow {
    fn encode(entry: CachedResponse) -> Result<Self, Error> {
        let headers_json =
            serde_json::to_string(&entry.headers).map_err(|e| Error::Store(format!("failed to encode headers: {e}")))?;
        Ok(Self { entry, headers_json })
    }
}

const UPSERT_ENTRY: &str = "INSERT INTO entries (store, key, method, url, status, headers_json, body, stored_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(store, key) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status = excluded.status,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

const ENSURE_STORE: &str = "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)";

fn upsert_row(tx: &rusqlite::Transaction<'_>, store: &str, row: &EntryRow) -> Result<(), Error> {
    let e = &row.entry;
    tx.execute(
        UPSERT_ENTRY,
        params![store, &e.key, &e.method, &e.url, e.status, &row.headers_json, &e.body, &e.stored_at],
    )?;
    Ok(())
}

impl CacheDb {
    /// Create a store if it does not already exist.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(ENSURE_STORE, params![name, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a store with this name exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All store names, sorted.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns false if no such store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key.
    ///
    /// Returns None if the store or the key doesn't exist.
    pub async fn get_entry(&self, store: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let store = store.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status, headers_json, body, stored_at
                     FROM entries WHERE store = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![store, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u16>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                });

                let (key, method, url, status, headers_json, body, stored_at) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let headers = serde_json::from_str(&headers_json)
                    .map_err(|e| Error::Store(format!("corrupt headers for {url}: {e}")))?;

                Ok(Some(CachedResponse { key, method, url, status, headers, body, stored_at }))
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a single entry in an existing store.
    pub async fn upsert_entry(&self, store: &str, entry: CachedResponse) -> Result<(), Error> {
        self.upsert_entries(store, vec![entry]).await
    }

    /// Insert or replace entries in one transaction.
    ///
    /// Either every entry is written or none is. The store must already
    /// exist; writing never creates one.
    pub async fn upsert_entries(&self, store: &str, entries: Vec<CachedResponse>) -> Result<(), Error> {
        let rows = entries.into_iter().map(EntryRow::encode).collect::<Result<Vec<_>, _>>()?;
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let exists: bool =
                    tx.query_row("SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)", params![&store], |row| {
                        row.get(0)
                    })?;
                if !exists {
                    return Err(Error::Store(format!("no such store: {store}")));
                }
                for row in &rows {
                    upsert_row(&tx, &store, row)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store.
    pub async fn count_entries(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of every entry in a store, sorted.
    pub async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE store = ?1 ORDER BY url")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
