//! Requests the engine must never intercept.

use regex::RegexSet;
use serde::Serialize;
use swcache_core::Error;
use url::Url;

use crate::fetch::is_network_scheme;
use crate::request::Request;

/// Why a request skips the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassReason {
    /// Not a GET.
    Method,
    /// Not http or https.
    Scheme,
    /// Matched an exclusion pattern.
    Excluded,
}

/// Static exclusion patterns compiled once at startup.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: RegexSet,
}

impl ExclusionFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = RegexSet::new(patterns).map_err(|e| Error::InvalidInput(format!("exclusion pattern: {e}")))?;
        Ok(Self { patterns })
    }

    /// Whether the full URL matches any exclusion pattern.
    pub fn matches(&self, url: &Url) -> bool {
        self.patterns.is_match(url.as_str())
    }

    /// The reason this request passes straight to the network, if any.
    pub fn bypass_reason(&self, request: &Request) -> Option<BypassReason> {
        if !request.is_read() {
            Some(BypassReason::Method)
        } else if !is_network_scheme(&request.url) {
            Some(BypassReason::Scheme)
        } else if self.matches(&request.url) {
            Some(BypassReason::Excluded)
        } else {
            None
        }
    }

    pub fn should_bypass(&self, request: &Request) -> bool {
        self.bypass_reason(request).is_some()
    }
}
