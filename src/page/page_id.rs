use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::page::error::PageError;

/// Query parameters that never distinguish one page from another.
pub const TRACKING_PARAMS: [&str; 5] = ["utm_source", "utm_medium", "utm_campaign", "fbclid", "gclid"];

/// Canonical page URL used as the key for saved form data.
///
/// Only the tracking parameters are removed; any other query difference
/// yields a different identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIdentifier(String);

impl PageIdentifier {
    pub fn from_url(raw: &str) -> Result<PageIdentifier, PageError> {
        let mut url = Url::parse(raw).map_err(|e| PageError::InvalidUrl {
            url: raw.to_string(),
            source: e,
        })?;

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }

        Ok(PageIdentifier(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host of a page URL; empty for host-less schemes such as `file:`.
pub fn page_host(raw: &str) -> Result<String, PageError> {
    let url = Url::parse(raw).map_err(|e| PageError::InvalidUrl {
        url: raw.to_string(),
        source: e,
    })?;
    Ok(url.host_str().unwrap_or_default().to_string())
}

/// Host part of `raw`, or `raw` itself when it is not a URL with a host
/// (so bare hostnames pass through unchanged).
pub fn hostname(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}
