//! URL canonicalization for request identity.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string so equal resources map to equal cache keys.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references (e.g. `/index.html`) against `base`
/// 3. Lowercase the host (done by the WHATWG parser for http/https)
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// Non-network schemes are accepted here; deciding what to do with them is
/// the exclusion filter's job.
pub fn canonicalize(input: &str, base: &Url) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = Url::options()
        .base_url(Some(base))
        .parse(trimmed)
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether the scheme is carried over the network (http or https).
pub fn is_network_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
