//! Request classification: which strategy answers a request.

use serde::Serialize;
use url::Url;

use super::filter::{BypassReason, ExclusionFilter};
use crate::request::Request;

/// File extensions answered cache-first. Matched case-insensitively.
pub const STATIC_ASSET_EXTENSIONS: &[&str] =
    &["js", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf", "eot"];

/// Retrieval strategy, recomputed for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
    StaleWhileRevalidate,
}

/// Dispatch decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Straight to the network; no store access at all.
    Bypass(BypassReason),
    Strategy(Strategy),
}

/// Route a request: exclusions first, then classification.
pub fn route(filter: &ExclusionFilter, request: &Request) -> Route {
    match filter.bypass_reason(request) {
        Some(reason) => Route::Bypass(reason),
        None => Route::Strategy(classify(request)),
    }
}

/// Pick a strategy for a request that is not bypassed.
///
/// Navigation wins over extension: a document load of `/logo.png` is still
/// network-first.
pub fn classify(request: &Request) -> Strategy {
    if request.is_navigation() || request.accepts_html() {
        Strategy::NetworkFirst
    } else if is_static_asset(&request.url) {
        Strategy::CacheFirst
    } else {
        Strategy::StaleWhileRevalidate
    }
}

/// Whether the last path segment carries a static asset extension.
pub fn is_static_asset(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(_, ext)| STATIC_ASSET_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestMode;
    use reqwest::Method;
    use reqwest::header::{ACCEPT, HeaderValue};

    fn url(path: &str) -> Url {
        Url::parse("http://localhost:3000").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_navigation_is_network_first() {
        assert_eq!(classify(&Request::navigate(url("/song/42"))), Strategy::NetworkFirst);
    }

    #[test]
    fn test_html_accept_is_network_first() {
        let req = Request::get(url("/song/42")).with_header(ACCEPT, HeaderValue::from_static("text/html"));
        assert_eq!(classify(&req), Strategy::NetworkFirst);
    }

    #[test]
    fn test_static_assets_are_cache_first() {
        for path in ["/app.js", "/static/css/main.css", "/logo192.png", "/fonts/a.WOFF2", "/favicon.ico", "/x.JPEG"] {
            assert_eq!(classify(&Request::get(url(path))), Strategy::CacheFirst, "{path}");
        }
    }

    #[test]
    fn test_everything_else_is_stale_while_revalidate() {
        for path in ["/api/songs", "/manifest.json", "/app.js.map", "/data.jsonp", "/static/", "/js"] {
            assert_eq!(classify(&Request::get(url(path))), Strategy::StaleWhileRevalidate, "{path}");
        }
    }

    #[test]
    fn test_extension_only_names_are_cache_first() {
        assert_eq!(classify(&Request::get(url("/.js"))), Strategy::CacheFirst);
        assert_eq!(classify(&Request::get(url("/static/.CSS"))), Strategy::CacheFirst);
    }

    #[test]
    fn test_navigation_beats_extension() {
        let req = Request::get(url("/logo192.png")).with_mode(RequestMode::Navigate);
        assert_eq!(classify(&req), Strategy::NetworkFirst);
    }

    #[test]
    fn test_query_does_not_hide_extension() {
        assert_eq!(classify(&Request::get(url("/app.js?v=3"))), Strategy::CacheFirst);
    }

    #[test]
    fn test_route_bypass_before_classify() {
        let filter = ExclusionFilter::new([r"/sockjs-node"]).unwrap();
        let post = Request::new(Method::POST, url("/app.js"));
        assert_eq!(route(&filter, &post), Route::Bypass(BypassReason::Method));
        assert_eq!(
            route(&filter, &Request::navigate(url("/sockjs-node/info"))),
            Route::Bypass(BypassReason::Excluded)
        );
        assert_eq!(route(&filter, &Request::get(url("/app.js"))), Route::Strategy(Strategy::CacheFirst));
    }
}
