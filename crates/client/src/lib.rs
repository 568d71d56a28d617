//! Client-side caching engine for swcache.
//!
//! This crate sits between an application and the network: every outbound
//! request passes through [`Engine`], which decides per request class
//! whether to answer from the current cache store, from the network, or
//! from both.
//!
//! - [`fetch`]: the network side (reqwest fetcher, URL canonicalization)
//! - [`engine`]: exclusion filter, classifier, strategies, version lifecycle
//!   and the update channel

pub mod engine;
pub mod fetch;
pub mod request;
pub mod response;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{
    BypassReason, ControlMessage, Engine, EngineStatus, ExclusionFilter, LifecycleManager, LifecycleState,
    PrecacheManifest, ResponseSource, Route, Served, Strategy, StrategyExecutor, UpdateChannel,
};
pub use fetch::{FetchClient, FetchConfig, Network};
pub use request::{Request, RequestMode};
pub use response::{Response, ResponseKind};
