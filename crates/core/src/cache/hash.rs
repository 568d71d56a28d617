//! Request-identity cache keys.

use sha2::{Digest, Sha256};

/// Compute the store key for a request.
///
/// Entries are keyed by request identity only: the method and the
/// canonical URL. Nothing else about the request participates.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
