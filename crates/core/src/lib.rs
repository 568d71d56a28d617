//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - The cache store abstraction with SQLite and in-memory backends
//! - Store naming and versioning
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{AccessStats, CacheDb, CacheStorage, CacheVersion, CachedResponse, MemoryStorage};
pub use config::{AppConfig, ConfigError, StoreBackend};
pub use error::Error;
