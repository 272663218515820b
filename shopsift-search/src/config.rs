//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] holds the platform URL table, per-task deadlines, and
//! the product cap handed to each source. It is injected into the pipeline
//! at construction time and validated before first use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SearchError;
use crate::types::Platform;

/// Configuration for the search pipeline.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Home page of each platform, where a source starts its search.
    /// Must contain an entry for every [`Platform`].
    pub platform_urls: BTreeMap<Platform, String>,
    /// Deadline for one platform's search task, in seconds. Browser-driven
    /// extraction is slow, so this is generous.
    pub source_timeout_seconds: u64,
    /// Deadline for each classifier and structurer call, in seconds.
    pub capability_timeout_seconds: u64,
    /// Maximum number of products kept from a single platform.
    pub max_products_per_source: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let platform_urls = Platform::all()
            .iter()
            .map(|p| (*p, default_platform_url(*p).to_owned()))
            .collect();
        Self {
            platform_urls,
            source_timeout_seconds: 180,
            capability_timeout_seconds: 30,
            max_products_per_source: 10,
        }
    }
}

/// Built-in home page for a platform.
fn default_platform_url(platform: Platform) -> &'static str {
    match platform {
        Platform::Myntra => "https://www.myntra.com",
        Platform::Meesho => "https://www.meesho.com",
        Platform::Ajio => "https://www.ajio.com",
        Platform::Flipkart => "https://www.flipkart.com",
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - every [`Platform`] has an entry in `platform_urls`
    /// - every URL is an absolute `http` or `https` URL
    /// - `source_timeout_seconds` and `capability_timeout_seconds` are greater than 0
    /// - `max_products_per_source` is greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        for platform in Platform::all() {
            let Some(raw) = self.platform_urls.get(platform) else {
                return Err(SearchError::Config(format!(
                    "platform_urls is missing an entry for {platform}"
                )));
            };
            let parsed = Url::parse(raw).map_err(|e| {
                SearchError::Config(format!("platform_urls.{platform} is not a valid URL: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SearchError::Config(format!(
                    "platform_urls.{platform} must use http or https"
                )));
            }
        }
        if self.source_timeout_seconds == 0 {
            return Err(SearchError::Config(
                "source_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.capability_timeout_seconds == 0 {
            return Err(SearchError::Config(
                "capability_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_products_per_source == 0 {
            return Err(SearchError::Config(
                "max_products_per_source must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Home page configured for `platform`.
    ///
    /// Only `None` for a configuration that has not passed [`validate`](Self::validate).
    pub fn platform_url(&self, platform: Platform) -> Option<&str> {
        self.platform_urls.get(&platform).map(String::as_str)
    }
}
