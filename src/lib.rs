//! # Stampa
//!
//! Helper filters and content preprocessing for static-site build pipelines.
//! Stampa is not a site generator: it is the toolbox a host framework calls
//! with already-parsed content items, getting back derived items, transformed
//! text, and feed documents. Parsing, routing, layout, and dependency
//! tracking stay on the host's side of the seam.
//!
//! # Architecture: Thin Adapters Around a Cached Core
//!
//! The one piece with real machinery is the content-addressed filter cache:
//!
//! ```text
//! host content ──> Filter::run ──────────────────────> transformed text
//!                     │
//!                     └── CachedFilter: SHA-256(input ‖ params)
//!                            ├── hit  → CacheStore::get → UTF-8 decode
//!                            └── miss → inner filter → CacheStore::put
//! ```
//!
//! Everything else is a single-purpose pass over host-supplied [`item::Item`]
//! values — stamping kinds and titles, deriving timestamps from git history,
//! emitting archive and tag pages, assembling an Atom feed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`filter`] | The `Filter` trait and parameter types — the seam between host and helpers |
//! | [`cache`] | Content-addressed memoization: `CacheKey`, `CacheStore`, `CachedFilter` |
//! | [`asciidoc`] | AsciiDoc-to-HTML filter shim over the external `asciidoc` binary |
//! | [`item`] | The content-item model handed in by the host framework |
//! | [`preprocess`] | Kind/title/time/index stamping passes over item lists |
//! | [`gitlog`] | Created/updated timestamps harvested from `git log` |
//! | [`tags`] | Tag registry loading and validation |
//! | [`pages`] | Generated archive/tag pages and summary snippets (maud) |
//! | [`feed`] | Atom feed assembly |
//! | [`config`] | Site metadata (`SiteMeta`) from TOML |
//!
//! # Design Decisions
//!
//! ## Content-Addressed, Not Name-Addressed
//!
//! Cache keys are derived from the input bytes and a canonical serialization
//! of the filter parameters — never from file names, mtimes, or a runtime's
//! internal hash of a map. Renames don't invalidate anything; a one-byte
//! content change or a single parameter change invalidates exactly one entry.
//! The canonical form sorts parameter names, so insertion order can never
//! leak into the key.
//!
//! ## The Store Is an Injected Trait
//!
//! [`cache::CacheStore`] is a two-method trait (`get`/`put`). The shipped
//! [`cache::DirStore`] keeps one digest-named file per entry and writes
//! through a temp-file rename, so concurrent writers can race freely and the
//! loser's bytes are simply the same bytes. Hosts that want a different
//! engine or a long-lived handle implement the trait; the cache logic does
//! not change.
//!
//! ## Failures Are Terminal
//!
//! A store that won't open, a filter process that exits non-zero, a cache
//! entry that isn't UTF-8 — each is an error returned to the host for that
//! invocation. There is no silent fallback to uncached execution: masking an
//! unavailable cache would turn every build into a slow build nobody notices.
//! Failed computations are never written to the store.
//!
//! ## Maud Over Template Files
//!
//! Generated markup (archive pages, tag pages, summaries, the extracted
//! AsciiDoc `<h1>`) goes through [Maud](https://maud.lambda.xyz/):
//! compile-time checked, auto-escaped, and with zero template files to ship
//! or get out of sync.

pub mod asciidoc;
pub mod cache;
pub mod config;
pub mod feed;
pub mod filter;
pub mod gitlog;
pub mod item;
pub mod pages;
pub mod preprocess;
pub mod tags;

#[cfg(test)]
pub(crate) mod test_helpers;
