//! Generated listing pages and summary snippets.
//!
//! These helpers stamp new, hidden items into the host's item list — an
//! archive of all articles and one listing page per tag — plus the summary
//! snippet article listings are built from. The host routes and lays out
//! the stamped items like any other content.
//!
//! All markup goes through maud, so titles and tag names are escaped
//! without anyone remembering to do it.

use maud::{Markup, html};
use time::OffsetDateTime;

use crate::item::{Item, sorted_articles};
use crate::tags::{TagError, TagRegistry, items_with_tag, used_tags};

/// Identifier of the generated archive page.
pub const ARCHIVE_IDENTIFIER: &str = "/archive/";

const ARCHIVE_TITLE: &str = "Archive (by creation date)";

/// A link to an item's routed path, falling back to its identifier.
pub fn link_to(text: &str, item: &Item) -> Markup {
    let href = item.path.as_deref().unwrap_or(&item.identifier);
    html! { a href=(href) { (text) } }
}

/// `YYYY-MM-DD` without going through a fallible formatter.
fn short_date(time: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        time.year(),
        u8::from(time.month()),
        time.day()
    )
}

/// Build the hidden archive item listing every article, newest first, each
/// link suffixed with its creation date.
pub fn archive_page(items: &[Item]) -> Item {
    let articles = sorted_articles(items);
    let markup = html! {
        ul {
            @for article in &articles {
                li {
                    (link_to(
                        &match (article.title.as_deref(), article.created_at) {
                            (Some(title), Some(created)) => {
                                format!("{title} ({})", short_date(created))
                            }
                            (Some(title), None) => title.to_string(),
                            (None, _) => article.identifier.clone(),
                        },
                        article,
                    ))
                }
            }
        }
    };

    let mut page = Item::new(ARCHIVE_IDENTIFIER, markup.into_string());
    page.title = Some(ARCHIVE_TITLE.to_string());
    page.extension = "html".to_string();
    page.hidden = true;
    page
}

/// Build one hidden listing item per used tag, at `/tag/{slug}/`.
///
/// Every used tag must be defined in the registry; the first undefined one
/// aborts with [`TagError::Undefined`].
pub fn tag_pages(items: &[Item], registry: &TagRegistry) -> Result<Vec<Item>, TagError> {
    let mut pages = Vec::new();
    for tag in used_tags(items) {
        let Some(slug) = registry.slug(&tag) else {
            return Err(TagError::Undefined(tag));
        };
        let tagged = items_with_tag(items, &tag);
        let markup = html! {
            ul {
                @for item in &tagged {
                    li {
                        (link_to(item.title.as_deref().unwrap_or(&item.identifier), item))
                    }
                }
            }
        };

        let mut page = Item::new(format!("/tag/{slug}/"), markup.into_string());
        page.title = Some(format!("Pages tagged “{tag}”"));
        page.extension = "html".to_string();
        page.hidden = true;
        pages.push(page);
    }
    Ok(pages)
}

/// Which metadata lines a summary snippet shows.
#[derive(Debug, Clone, Copy)]
pub struct SummaryOptions {
    pub created: bool,
    pub updated: bool,
    pub tags: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            created: true,
            updated: true,
            tags: true,
        }
    }
}

/// Render the summary snippet for one article: linked title plus the
/// metadata lines enabled in `options`.
///
/// Tag links resolve through the registry; a tag missing from it is
/// rendered as plain text rather than a broken link.
pub fn summary(item: &Item, registry: &TagRegistry, options: SummaryOptions) -> Markup {
    html! {
        article class="summary" {
            h2 {
                (link_to(item.title.as_deref().unwrap_or(&item.identifier), item))
            }
            @if options.created {
                @if let Some(created) = item.created_at {
                    span class="created" { "Created " (short_date(created)) }
                }
            }
            @if options.updated {
                @if let Some(updated) = item.updated_at {
                    span class="updated" { "Updated " (short_date(updated)) }
                }
            }
            @if options.tags && !item.tags.is_empty() {
                ul class="tags" {
                    @for tag in &item.tags {
                        li {
                            @if let Some(slug) = registry.slug(tag) {
                                a href=(format!("/tag/{slug}/")) { (tag) }
                            } @else {
                                (tag)
                            }
                        }
                    }
                }
            }
        }
    }
}
