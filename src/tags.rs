//! Tag registry loading and validation.
//!
//! Tags are site vocabulary, not free-form strings: every tag an item uses
//! must be declared in a registry file that also fixes its URL slug. The
//! registry is the single place where a typo'd tag gets caught, at build
//! time, instead of producing an orphan tag page.
//!
//! The registry file is a flat TOML table:
//!
//! ```toml
//! rust = "rust"
//! "type design" = "type-design"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use thiserror::Error;

use crate::item::Item;

#[derive(Error, Debug)]
pub enum TagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("tag `{0}` is used but not defined in the registry")]
    Undefined(String),
}

/// Mapping from tag name to URL slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    slugs: BTreeMap<String, String>,
}

impl TagRegistry {
    /// Load the registry from a TOML file.
    pub fn load(path: &Path) -> Result<Self, TagError> {
        let content = std::fs::read_to_string(path)?;
        let slugs: BTreeMap<String, String> = toml::from_str(&content)?;
        Ok(Self { slugs })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            slugs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// URL slug for a tag, if it is defined.
    pub fn slug(&self, tag: &str) -> Option<&str> {
        self.slugs.get(tag).map(String::as_str)
    }

    /// Iterate `(tag, slug)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slugs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check that every tag used by any item is defined.
    ///
    /// Errors on the first undefined tag in sorted order, naming it.
    pub fn verify(&self, items: &[Item]) -> Result<(), TagError> {
        for tag in used_tags(items) {
            if !self.slugs.contains_key(&tag) {
                return Err(TagError::Undefined(tag));
            }
        }
        Ok(())
    }
}

/// All tags used by any item, sorted and deduplicated.
pub fn used_tags(items: &[Item]) -> BTreeSet<String> {
    items
        .iter()
        .flat_map(|item| item.tags.iter().cloned())
        .collect()
}

/// Items carrying a given tag, in input order.
pub fn items_with_tag<'a>(items: &'a [Item], tag: &str) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| item.tags.iter().any(|t| t == tag))
        .collect()
}
