//! Store naming for cache generations.

use std::fmt;

/// The current cache generation: a namespace prefix plus a version string.
///
/// Fixed at construction and never mutated; the engine reads and writes
/// only the store named by [`CacheVersion::store_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVersion {
    prefix: String,
    version: String,
    store_name: String,
}

impl CacheVersion {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let version = version.into();
        let store_name = format!("{prefix}{version}");
        Self { prefix, version, store_name }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `<prefix><version>`, e.g. `guitar-song-v1.0.0`.
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// A store in our namespace left behind by another version.
    ///
    /// Names outside the namespace are never orphans.
    pub fn is_orphan(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name != self.store_name
    }

    /// The subset of `names` eligible for deletion on activate.
    pub fn orphans<'a>(&self, names: &'a [String]) -> Vec<&'a str> {
        names.iter().map(String::as_str).filter(|n| self.is_orphan(n)).collect()
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.store_name)
    }
}
