//! Site metadata loading.
//!
//! [`SiteMeta`] carries the handful of site-wide values the helpers need —
//! base URL, site title, author identity, feed URL. It is deliberately not
//! the host framework's configuration system: hosts load their own config
//! and hand the relevant slice over, or point [`SiteMeta::load`] at a small
//! TOML file:
//!
//! ```toml
//! base_url = "https://example.com"
//! title = "Example Site"
//! author_name = "A. Author"
//! author_uri = "https://example.com/about/"
//! feed_url = "https://example.com/feed.xml"   # optional
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Site-wide metadata for feed generation and link building.
///
/// All fields are optional here; each consumer states which ones it needs
/// (the feed builder errors per missing field, see [`crate::feed`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Site root URL. Stored without a trailing slash.
    pub base_url: Option<String>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub author_uri: Option<String>,
    /// Public feed URL, when it differs from `{base_url}/feed.xml`.
    pub feed_url: Option<String>,
}

impl SiteMeta {
    /// Load from a TOML file and normalize.
    pub fn load(path: &Path) -> Result<Self, MetaError> {
        let content = std::fs::read_to_string(path)?;
        let mut meta: Self = toml::from_str(&content)?;
        meta.normalize();
        Ok(meta)
    }

    /// Strip trailing slashes from `base_url` so joins are unambiguous.
    pub fn normalize(&mut self) {
        if let Some(base) = &self.base_url {
            let trimmed = base.trim_end_matches('/');
            if trimmed.len() != base.len() {
                self.base_url = Some(trimmed.to_string());
            }
        }
    }
}
