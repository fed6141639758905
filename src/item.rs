//! The content-item model handed in by the host framework.
//!
//! The host parses sources, assigns identifiers, and routes output paths;
//! stampa's helpers only read and stamp attributes on the resulting items.
//! [`Item`] is serde-serializable so it round-trips through whatever
//! manifest format the host uses between build stages.
//!
//! ## Identifiers and paths
//!
//! An `identifier` is the canonical content address: absolute, trailing
//! slash, extension-free (`/pages/2024/widgets/`). A `path` is where the
//! item is routed in the output site, when it is routed at all — hidden
//! items (feeds, generated listings) may have none.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// The only item kind the helpers recognize.
pub const KIND_ARTICLE: &str = "article";

/// A single content item as supplied by the host framework.
///
/// All attribute fields are optional at the serde level so hosts can hand
/// over sparse items; the preprocessing passes fill in what they can derive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Canonical content address, e.g. `/pages/2024/widgets/`.
    pub identifier: String,
    /// Routed output path, if the item is routed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Source file extension without the dot.
    #[serde(default)]
    pub extension: String,
    /// Unfiltered source content.
    #[serde(default)]
    pub raw_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Item kind; see [`KIND_ARTICLE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Hidden items are excluded from sitemaps and navigation by the host.
    #[serde(default)]
    pub hidden: bool,
    /// Position in most-recently-updated order; see
    /// [`crate::preprocess::add_indexes`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// URL used in the feed instead of the routed one (link-blog entries).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url_in_feed: Option<String>,
    /// Path used in the feed instead of the routed one (unrouted items).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_path_in_feed: Option<String>,
}

impl Item {
    /// A bare item with only an identifier and content; everything else
    /// defaulted. Generated pages start from this.
    pub fn new(identifier: impl Into<String>, raw_content: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            path: None,
            extension: String::new(),
            raw_content: raw_content.into(),
            title: None,
            kind: None,
            created_at: None,
            updated_at: None,
            tags: Vec::new(),
            hidden: false,
            index: None,
            author_name: None,
            author_uri: None,
            excerpt: None,
            custom_url_in_feed: None,
            custom_path_in_feed: None,
        }
    }

    pub fn is_article(&self) -> bool {
        self.kind.as_deref() == Some(KIND_ARTICLE)
    }

    /// Last-modified time: `updated_at` falling back to `created_at`.
    pub fn last_touched(&self) -> Option<OffsetDateTime> {
        self.updated_at.or(self.created_at)
    }
}

/// Articles sorted by creation time, newest first.
///
/// Articles without `created_at` sort last; run
/// [`crate::preprocess::add_times`] first if that matters.
pub fn sorted_articles(items: &[Item]) -> Vec<&Item> {
    let mut articles: Vec<&Item> = items.iter().filter(|i| i.is_article()).collect();
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    articles
}

/// Articles sorted by last-touched time (update falling back to creation),
/// newest first.
pub fn sorted_updated_articles(items: &[Item]) -> Vec<&Item> {
    let mut articles: Vec<&Item> = items.iter().filter(|i| i.is_article()).collect();
    articles.sort_by(|a, b| b.last_touched().cmp(&a.last_touched()));
    articles
}

/// Git `%ci` timestamp layout: `2024-05-01 10:00:00 +0900`.
const GIT_CI: &[time::format_description::BorrowedFormatItem<'static>] = time::macros::format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
);

/// Date-only layout, interpreted as midnight UTC.
const DATE_ONLY: &[time::format_description::BorrowedFormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day]");

/// Parse a timestamp in any of the forms hosts and git hand us.
///
/// Accepted: RFC 3339 (`2024-05-01T10:00:00+09:00`), git `%ci`
/// (`2024-05-01 10:00:00 +0900`, colon in the offset also tolerated), and
/// bare dates (`2024-05-01`, midnight UTC).
pub fn parse_datetime(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let value = value.trim();
    if let Ok(t) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(t);
    }
    // Normalize a colon offset (`+09:00`) to git's bare form before the
    // `%ci` layout, which expects `+0900`.
    let normalized = normalize_offset_colon(value);
    if let Ok(t) = OffsetDateTime::parse(&normalized, GIT_CI) {
        return Ok(t);
    }
    time::Date::parse(value, DATE_ONLY).map(|d| d.midnight().assume_utc())
}

/// Drop the colon in a trailing `±HH:MM` zone offset, if present.
fn normalize_offset_colon(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 6 {
        let tail = &bytes[bytes.len() - 6..];
        if (tail[0] == b'+' || tail[0] == b'-') && tail[3] == b':' {
            let mut out = String::with_capacity(value.len() - 1);
            out.push_str(&value[..value.len() - 3]);
            out.push_str(&value[value.len() - 2..]);
            return out;
        }
    }
    value.to_string()
}
