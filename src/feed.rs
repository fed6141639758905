//! Atom feed assembly.
//!
//! Builds a complete Atom 1.0 document from the site's articles, sorted by
//! recency. The host supplies the compiled article content through a
//! callback — only the host knows how to render an article — while titles,
//! authorship, and URLs resolve through a fallback chain: explicit
//! [`FeedOptions`] first, then [`SiteMeta`].
//!
//! Entry ids follow Mark Pilgrim's "how to make a good ID in Atom" recipe:
//! the site URL plus the article's path plus a fragment, stable across
//! re-publishes and independent of feed position.
//!
//! The XML is assembled by hand with explicit escaping — the document shape
//! is fixed and small, and a templating layer would only obscure it.

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::SiteMeta;
use crate::item::{Item, sorted_updated_articles};

/// Default number of entries in a feed.
const DEFAULT_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("cannot build Atom feed: site metadata has no base_url")]
    MissingBaseUrl,
    #[error("cannot build Atom feed: no title in options or site metadata")]
    MissingTitle,
    #[error("cannot build Atom feed: no author_name in options or site metadata")]
    MissingAuthorName,
    #[error("cannot build Atom feed: no author_uri in options or site metadata")]
    MissingAuthorUri,
    #[error("cannot build Atom feed: no articles")]
    NoArticles,
    #[error("cannot build Atom feed: article {0} lacks created_at")]
    MissingCreatedAt(String),
    #[error("cannot format feed timestamp: {0}")]
    Time(#[from] time::error::Format),
}

/// Per-feed overrides and knobs.
///
/// Every `Option` falls back to the corresponding [`SiteMeta`] field.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Maximum number of entries.
    pub limit: usize,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub author_uri: Option<String>,
    /// Self link; defaults to `{base_url}/feed.xml` when neither options
    /// nor site metadata provide one.
    pub feed_url: Option<String>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            title: None,
            author_name: None,
            author_uri: None,
            feed_url: None,
        }
    }
}

/// Build the Atom feed for the articles among `items`.
///
/// `content_for` renders an article's compiled HTML content; it is called
/// once per included entry. Articles are sorted most-recently-touched first
/// (`updated_at` falling back to `created_at`) and truncated to
/// `options.limit`. Entries whose URL cannot be resolved are skipped.
pub fn atom_feed<F>(
    items: &[Item],
    meta: &SiteMeta,
    options: &FeedOptions,
    content_for: F,
) -> Result<String, FeedError>
where
    F: Fn(&Item) -> String,
{
    let base = meta.base_url.as_deref().ok_or(FeedError::MissingBaseUrl)?;
    let title = options
        .title
        .as_deref()
        .or(meta.title.as_deref())
        .ok_or(FeedError::MissingTitle)?;
    let author_name = options
        .author_name
        .as_deref()
        .or(meta.author_name.as_deref())
        .ok_or(FeedError::MissingAuthorName)?;
    let author_uri = options
        .author_uri
        .as_deref()
        .or(meta.author_uri.as_deref())
        .ok_or(FeedError::MissingAuthorUri)?;

    let articles = sorted_updated_articles(items);
    if articles.is_empty() {
        return Err(FeedError::NoArticles);
    }
    if let Some(missing) = articles.iter().find(|a| a.created_at.is_none()) {
        return Err(FeedError::MissingCreatedAt(missing.identifier.clone()));
    }
    let articles = &articles[..articles.len().min(options.limit)];

    let root_url = format!("{base}/");
    let feed_url = options
        .feed_url
        .as_deref()
        .or(meta.feed_url.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{base}/feed.xml"));

    // Feed-level updated: the newest article's creation time.
    let newest = articles[0]
        .created_at
        .ok_or_else(|| FeedError::MissingCreatedAt(articles[0].identifier.clone()))?;

    let mut entries = String::new();
    for article in articles {
        let Some(path) = article
            .custom_path_in_feed
            .as_deref()
            .or(article.path.as_deref())
        else {
            continue;
        };
        let url = match article.custom_url_in_feed.as_deref() {
            Some(custom) => custom.to_string(),
            None => format!("{base}{path}"),
        };

        let created = article
            .created_at
            .ok_or_else(|| FeedError::MissingCreatedAt(article.identifier.clone()))?;
        let updated = article.updated_at.unwrap_or(created);

        entries.push_str("  <entry>\n");
        entries.push_str(&format!(
            "    <id>{}</id>\n",
            xml_escape(&atom_tag_for(base, path))
        ));
        entries.push_str(&format!(
            "    <title type=\"html\">{}</title>\n",
            xml_escape(article.title.as_deref().unwrap_or(""))
        ));
        entries.push_str(&format!("    <published>{}</published>\n", rfc3339(created)?));
        entries.push_str(&format!("    <updated>{}</updated>\n", rfc3339(updated)?));
        if article.author_name.is_some() || article.author_uri.is_some() {
            entries.push_str("    <author>\n");
            entries.push_str(&format!(
                "      <name>{}</name>\n",
                xml_escape(article.author_name.as_deref().unwrap_or(author_name))
            ));
            entries.push_str(&format!(
                "      <uri>{}</uri>\n",
                xml_escape(article.author_uri.as_deref().unwrap_or(author_uri))
            ));
            entries.push_str("    </author>\n");
        }
        entries.push_str(&format!(
            "    <link rel=\"alternate\" href=\"{}\"/>\n",
            xml_escape(&url)
        ));
        entries.push_str(&format!(
            "    <content type=\"html\">{}</content>\n",
            xml_escape(&content_for(article))
        ));
        if let Some(excerpt) = article.excerpt.as_deref() {
            entries.push_str(&format!(
                "    <summary type=\"html\">{}</summary>\n",
                xml_escape(excerpt)
            ));
        }
        entries.push_str("  </entry>\n");
    }

    let mut feed = String::new();
    feed.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    feed.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
    feed.push_str(&format!("  <id>{}</id>\n", xml_escape(&root_url)));
    feed.push_str(&format!("  <title>{}</title>\n", xml_escape(title)));
    feed.push_str(&format!("  <updated>{}</updated>\n", rfc3339(newest)?));
    feed.push_str(&format!(
        "  <link rel=\"alternate\" href=\"{}\"/>\n",
        xml_escape(&root_url)
    ));
    feed.push_str(&format!(
        "  <link rel=\"self\" href=\"{}\"/>\n",
        xml_escape(&feed_url)
    ));
    feed.push_str("  <author>\n");
    feed.push_str(&format!("    <name>{}</name>\n", xml_escape(author_name)));
    feed.push_str(&format!("    <uri>{}</uri>\n", xml_escape(author_uri)));
    feed.push_str("  </author>\n");
    feed.push_str(&entries);
    feed.push_str("</feed>\n");

    Ok(feed)
}

/// Stable Atom entry id for an article path.
pub fn atom_tag_for(base_url: &str, path: &str) -> String {
    format!("{base_url}{path}#id")
}

fn rfc3339(time: OffsetDateTime) -> Result<String, FeedError> {
    Ok(time.format(&Rfc3339)?)
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::article;
    use time::macros::datetime;

    fn meta() -> SiteMeta {
        SiteMeta {
            base_url: Some("https://example.com".into()),
            title: Some("Example".into()),
            author_name: Some("A. Author".into()),
            author_uri: Some("https://example.com/about/".into()),
            feed_url: None,
        }
    }

    fn routed_article(identifier: &str, path: &str, created: OffsetDateTime) -> Item {
        let mut item = article(identifier, created);
        item.path = Some(path.to_string());
        item.title = Some(identifier.trim_matches('/').to_string());
        item
    }

    fn render(item: &Item) -> String {
        format!("<p>content of {}</p>", item.identifier)
    }

    // =========================================================================
    // Preconditions
    // =========================================================================

    #[test]
    fn missing_base_url_is_an_error() {
        let mut m = meta();
        m.base_url = None;
        let items = vec![routed_article("/pages/a/", "/a/", datetime!(2024-01-01 00:00 UTC))];
        assert!(matches!(
            atom_feed(&items, &m, &FeedOptions::default(), render),
            Err(FeedError::MissingBaseUrl)
        ));
    }

    #[test]
    fn missing_title_is_an_error() {
        let mut m = meta();
        m.title = None;
        let items = vec![routed_article("/pages/a/", "/a/", datetime!(2024-01-01 00:00 UTC))];
        assert!(matches!(
            atom_feed(&items, &m, &FeedOptions::default(), render),
            Err(FeedError::MissingTitle)
        ));
    }

    #[test]
    fn missing_author_is_an_error() {
        let mut m = meta();
        m.author_name = None;
        let items = vec![routed_article("/pages/a/", "/a/", datetime!(2024-01-01 00:00 UTC))];
        assert!(matches!(
            atom_feed(&items, &m, &FeedOptions::default(), render),
            Err(FeedError::MissingAuthorName)
        ));

        let mut m = meta();
        m.author_uri = None;
        assert!(matches!(
            atom_feed(&items, &m, &FeedOptions::default(), render),
            Err(FeedError::MissingAuthorUri)
        ));
    }

    #[test]
    fn no_articles_is_an_error() {
        let items = vec![Item::new("/pages/plain/", "")];
        assert!(matches!(
            atom_feed(&items, &meta(), &FeedOptions::default(), render),
            Err(FeedError::NoArticles)
        ));
    }

    #[test]
    fn article_without_created_at_is_an_error() {
        let mut broken = Item::new("/pages/broken/", "");
        broken.kind = Some(crate::item::KIND_ARTICLE.into());
        let items = vec![broken];
        match atom_feed(&items, &meta(), &FeedOptions::default(), render) {
            Err(FeedError::MissingCreatedAt(id)) => assert_eq!(id, "/pages/broken/"),
            other => panic!("expected MissingCreatedAt, got {other:?}"),
        }
    }

    // =========================================================================
    // Options fallback chain
    // =========================================================================

    #[test]
    fn options_override_site_metadata() {
        let items = vec![routed_article("/pages/a/", "/a/", datetime!(2024-01-01 00:00 UTC))];
        let options = FeedOptions {
            title: Some("Override".into()),
            ..FeedOptions::default()
        };
        let feed = atom_feed(&items, &meta(), &options, render).unwrap();
        assert!(feed.contains("<title>Override</title>"));
        assert!(!feed.contains("<title>Example</title>"));
    }

    #[test]
    fn self_link_defaults_to_feed_xml() {
        let items = vec![routed_article("/pages/a/", "/a/", datetime!(2024-01-01 00:00 UTC))];
        let feed = atom_feed(&items, &meta(), &FeedOptions::default(), render).unwrap();
        assert!(feed.contains("<link rel=\"self\" href=\"https://example.com/feed.xml\"/>"));
    }

    // =========================================================================
    // Entries
    // =========================================================================

    #[test]
    fn entries_sorted_newest_first_and_limited() {
        let items: Vec<Item> = (1..=7)
            .map(|day| {
                routed_article(
                    &format!("/pages/p{day}/"),
                    &format!("/p{day}/"),
                    datetime!(2024-01-01 00:00 UTC) + time::Duration::days(day),
                )
            })
            .collect();

        let feed = atom_feed(&items, &meta(), &FeedOptions::default(), render).unwrap();
        // Default limit 5: the two oldest fall out.
        assert!(!feed.contains("/p1/"));
        assert!(!feed.contains("/p2/"));
        let pos7 = feed.find("/p7/").unwrap();
        let pos3 = feed.find("/p3/").unwrap();
        assert!(pos7 < pos3);
    }

    #[test]
    fn entry_fields_are_complete() {
        let mut item = routed_article("/pages/a/", "/a/", datetime!(2024-01-01 09:30 UTC));
        item.excerpt = Some("short version".into());
        let feed = atom_feed(&[item], &meta(), &FeedOptions::default(), render).unwrap();

        assert!(feed.contains("<id>https://example.com/a/#id</id>"));
        assert!(feed.contains("<published>2024-01-01T09:30:00Z</published>"));
        assert!(feed.contains("<updated>2024-01-01T09:30:00Z</updated>"));
        assert!(feed.contains("<link rel=\"alternate\" href=\"https://example.com/a/\"/>"));
        assert!(feed.contains(
            "<content type=\"html\">&lt;p&gt;content of /pages/a/&lt;/p&gt;</content>"
        ));
        assert!(feed.contains("<summary type=\"html\">short version</summary>"));
    }

    #[test]
    fn unrouted_entries_are_skipped() {
        let routed = routed_article("/pages/a/", "/a/", datetime!(2024-01-02 00:00 UTC));
        let unrouted = article("/pages/ghost/", datetime!(2024-01-03 00:00 UTC));
        let feed = atom_feed(&[routed, unrouted], &meta(), &FeedOptions::default(), render).unwrap();
        assert!(feed.contains("/a/"));
        assert!(!feed.contains("ghost"));
    }

    #[test]
    fn custom_url_replaces_generated_link() {
        let mut item = routed_article("/pages/link/", "/link/", datetime!(2024-01-01 00:00 UTC));
        item.custom_url_in_feed = Some("https://elsewhere.example/post".into());
        let feed = atom_feed(&[item], &meta(), &FeedOptions::default(), render).unwrap();
        assert!(feed.contains("<link rel=\"alternate\" href=\"https://elsewhere.example/post\"/>"));
        // The id stays anchored to this site.
        assert!(feed.contains("<id>https://example.com/link/#id</id>"));
    }

    #[test]
    fn per_article_author_overrides() {
        let mut item = routed_article("/pages/guest/", "/guest/", datetime!(2024-01-01 00:00 UTC));
        item.author_name = Some("Guest Writer".into());
        let feed = atom_feed(&[item], &meta(), &FeedOptions::default(), render).unwrap();
        assert!(feed.contains("<name>Guest Writer</name>"));
        // Uri falls back to the feed author's.
        assert!(feed.contains("<uri>https://example.com/about/</uri>"));
    }

    #[test]
    fn text_is_escaped() {
        let mut item = routed_article("/pages/esc/", "/esc/", datetime!(2024-01-01 00:00 UTC));
        item.title = Some("Fish & <Chips>".into());
        let feed = atom_feed(&[item], &meta(), &FeedOptions::default(), render).unwrap();
        assert!(feed.contains("<title type=\"html\">Fish &amp; &lt;Chips&gt;</title>"));
    }

    #[test]
    fn feed_updated_is_newest_creation_time() {
        let items = vec![
            routed_article("/pages/old/", "/old/", datetime!(2023-01-01 00:00 UTC)),
            routed_article("/pages/new/", "/new/", datetime!(2024-05-05 00:00 UTC)),
        ];
        let feed = atom_feed(&items, &meta(), &FeedOptions::default(), render).unwrap();
        assert!(feed.contains("<updated>2024-05-05T00:00:00Z</updated>"));
    }
}
