//! Named response stores for the caching engine.
//!
//! This module provides the store abstraction the engine reads and writes
//! through, plus two backends:
//!
//! - `CacheDb`: persistent SQLite storage via tokio-rusqlite (WAL mode,
//!   versioned migrations, transactional bulk writes)
//! - `MemoryStorage`: process-local maps with access counters
//!
//! Stores are named `<prefix><version>`; see [`CacheVersion`].

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod storage;
pub mod version;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use memory::{AccessStats, MemoryStorage};
pub use storage::CacheStorage;
pub use version::CacheVersion;
