//! Stamping passes that run before compilation.
//!
//! Each pass is a pure in-place transformation over the host's item list,
//! filling in attributes the host's sources leave implicit: which items are
//! articles, what they are titled, when they were created, and where they
//! sit in recency order. Passes never overwrite a value that is already
//! set — an explicit attribute from the host always wins over a derived one,
//! the same precedence rule the rest of the crate follows.
//!
//! Order matters: `add_kinds` before `add_times`/`add_indexes` (both look at
//! article kind), and [`crate::gitlog`] timestamps before `add_times` if git
//! history should beat the build clock.

use time::OffsetDateTime;

use crate::asciidoc::document_title;
use crate::item::{Item, KIND_ARTICLE, sorted_updated_articles};

/// Identifier prefix under which articles live.
const ARTICLE_PREFIX: &str = "/pages/";

/// Source extensions that make a `/pages/` item an article.
const ARTICLE_EXTENSIONS: &[&str] = &["txt", "html", "xhtml", "md"];

/// Mark `/pages/` items with article extensions as articles.
pub fn add_kinds(items: &mut [Item]) {
    for item in items {
        if item.identifier.starts_with(ARTICLE_PREFIX)
            && ARTICLE_EXTENSIONS.contains(&item.extension.as_str())
        {
            item.kind = Some(KIND_ARTICLE.to_string());
        }
    }
}

/// Derive titles for untitled `/pages/` AsciiDoc sources from their leading
/// `= Title` line.
pub fn add_titles(items: &mut [Item]) {
    for item in items {
        if item.identifier.starts_with(ARTICLE_PREFIX)
            && item.extension == "txt"
            && item.title.is_none()
            && let Some(title) = document_title(&item.raw_content)
        {
            item.title = Some(title.to_string());
        }
    }
}

/// Give articles without a creation time the build clock.
///
/// `now` is injected rather than read ambiently so builds are reproducible
/// under test and a host can pin the whole run to one instant.
pub fn add_times(items: &mut [Item], now: OffsetDateTime) {
    for item in items {
        if item.is_article() && item.created_at.is_none() {
            item.created_at = Some(now);
        }
    }
}

/// Number articles 0.. in most-recently-updated-first order.
pub fn add_indexes(items: &mut [Item]) {
    let order: Vec<String> = sorted_updated_articles(items)
        .into_iter()
        .map(|item| item.identifier.clone())
        .collect();
    for item in items.iter_mut() {
        if let Some(pos) = order.iter().position(|id| id == &item.identifier) {
            item.index = Some(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::article;
    use time::macros::datetime;

    fn page(identifier: &str, extension: &str, raw_content: &str) -> Item {
        let mut item = Item::new(identifier, raw_content);
        item.extension = extension.to_string();
        item
    }

    // =========================================================================
    // add_kinds
    // =========================================================================

    #[test]
    fn kinds_stamped_for_article_extensions() {
        let mut items = vec![
            page("/pages/post/", "txt", ""),
            page("/pages/note/", "md", ""),
            page("/pages/raw/", "css", ""),
            page("/assets/logo/", "txt", ""),
        ];
        add_kinds(&mut items);
        assert!(items[0].is_article());
        assert!(items[1].is_article());
        assert!(!items[2].is_article());
        assert!(!items[3].is_article());
    }

    // =========================================================================
    // add_titles
    // =========================================================================

    #[test]
    fn titles_derived_from_heading() {
        let mut items = vec![page("/pages/post/", "txt", "= A Fine Title\n\nBody")];
        add_titles(&mut items);
        assert_eq!(items[0].title.as_deref(), Some("A Fine Title"));
    }

    #[test]
    fn explicit_title_never_overwritten() {
        let mut item = page("/pages/post/", "txt", "= Derived\nBody");
        item.title = Some("Deliberate".into());
        let mut items = vec![item];
        add_titles(&mut items);
        assert_eq!(items[0].title.as_deref(), Some("Deliberate"));
    }

    #[test]
    fn titles_only_for_txt_sources() {
        let mut items = vec![page("/pages/post/", "md", "= Not AsciiDoc\nBody")];
        add_titles(&mut items);
        assert_eq!(items[0].title, None);
    }

    #[test]
    fn untitled_content_stays_untitled() {
        let mut items = vec![page("/pages/post/", "txt", "no heading here")];
        add_titles(&mut items);
        assert_eq!(items[0].title, None);
    }

    // =========================================================================
    // add_times
    // =========================================================================

    #[test]
    fn articles_get_the_build_clock() {
        let now = datetime!(2024-08-01 12:00 UTC);
        let mut item = page("/pages/post/", "txt", "");
        item.kind = Some(KIND_ARTICLE.into());
        let mut items = vec![item, page("/pages/raw/", "css", "")];

        add_times(&mut items, now);
        assert_eq!(items[0].created_at, Some(now));
        assert_eq!(items[1].created_at, None);
    }

    #[test]
    fn existing_created_at_wins_over_clock() {
        let original = datetime!(2020-01-01 00:00 UTC);
        let mut items = vec![article("/pages/post/", original)];
        add_times(&mut items, datetime!(2024-08-01 12:00 UTC));
        assert_eq!(items[0].created_at, Some(original));
    }

    // =========================================================================
    // add_indexes
    // =========================================================================

    #[test]
    fn indexes_follow_recency() {
        let mut newest = article("/pages/c/", datetime!(2022-01-01 00:00 UTC));
        newest.updated_at = Some(datetime!(2024-06-01 00:00 UTC));
        let mut items = vec![
            article("/pages/a/", datetime!(2023-01-01 00:00 UTC)),
            article("/pages/b/", datetime!(2024-01-01 00:00 UTC)),
            newest,
            Item::new("/pages/not-article/", ""),
        ];

        add_indexes(&mut items);
        assert_eq!(items[0].index, Some(2)); // a: oldest
        assert_eq!(items[1].index, Some(1)); // b
        assert_eq!(items[2].index, Some(0)); // c: updated most recently
        assert_eq!(items[3].index, None);
    }
}
