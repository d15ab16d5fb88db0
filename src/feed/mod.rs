//! Feed construction and serialization.
//!
//! Turns a list of issues into a syndication document:
//!
//! - [`model`] - Format-independent [`Feed`] / [`FeedItem`] and the issue mapping
//! - [`format`] - The closed set of wire formats, parsed from a route tag
//! - `atom` / `rss` - Serializers built on a `quick-xml` writer
//! - `markdown` - Optional Markdown-to-HTML rendering of issue bodies
//!
//! # Example
//!
//! ```ignore
//! let feed = build_feed(&meta, &issues, Utc::now());
//! let xml = render_feed(&feed, "rss".parse()?)?;
//! ```

mod atom;
mod format;
mod markdown;
mod model;
mod rss;
mod xml;

use crate::github::Issue;
use chrono::{DateTime, Utc};

pub use format::{FeedFormat, UnsupportedFormat};
pub use model::{build_feed, Author, Feed, FeedItem, FeedMeta, TextKind};
pub use model::{DEFAULT_AUTHOR, DEFAULT_DESCRIPTION, DEFAULT_TITLE};
pub use xml::RenderError;

/// Value of the `<generator>` element in both formats.
pub const GENERATOR: &str = concat!("issuefeed ", env!("CARGO_PKG_VERSION"));

/// Serializes a feed to the requested format.
pub fn render_feed(feed: &Feed, format: FeedFormat) -> Result<String, RenderError> {
    match format {
        FeedFormat::Atom => atom::write_atom(feed),
        FeedFormat::Rss => rss::write_rss(feed),
    }
}

/// Builds and serializes the feed for one request in a single step.
///
/// `now` is captured once by the caller and shared by the feed and its items.
pub fn render_issues(
    meta: &FeedMeta,
    issues: &[Issue],
    format: FeedFormat,
    now: DateTime<Utc>,
) -> Result<String, RenderError> {
    let feed = build_feed(meta, issues, now);
    let xml = render_feed(&feed, format)?;
    tracing::debug!(
        format = %format,
        items = feed.items.len(),
        bytes = xml.len(),
        "Rendered feed"
    );
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use url::Url;

    fn meta() -> FeedMeta {
        FeedMeta::new(&Url::parse("http://localhost:8888").unwrap())
    }

    fn issue(id: u64, title: &str, body: &str) -> Issue {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "url": format!("https://api.github.com/repos/o/r/issues/{id}"),
            "html_url": format!("https://github.com/o/r/issues/{id}"),
            "title": title,
            "body": body,
            "user": { "login": "dave" },
            "state": "open"
        }))
        .unwrap()
    }

    fn parse(xml: &str) -> feed_rs::model::Feed {
        feed_rs::parser::parse(xml.as_bytes()).unwrap()
    }

    struct Summary {
        title: String,
        link: String,
        description: String,
    }

    fn summarize(feed: &feed_rs::model::Feed) -> Vec<Summary> {
        feed.entries
            .iter()
            .map(|e| Summary {
                title: e.title.as_ref().map(|t| t.content.clone()).unwrap_or_default(),
                link: e.links.first().map(|l| l.href.clone()).unwrap_or_default(),
                description: e
                    .summary
                    .as_ref()
                    .map(|t| t.content.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    #[test]
    fn test_empty_feed_is_valid_in_both_formats() {
        let now = Utc::now();
        for format in [FeedFormat::Atom, FeedFormat::Rss] {
            let xml = render_issues(&meta(), &[], format, now).unwrap();
            let parsed = parse(&xml);
            assert_eq!(parsed.entries.len(), 0);
            assert_eq!(
                parsed.title.map(|t| t.content).as_deref(),
                Some("My Github Issues")
            );
        }
    }

    #[test]
    fn test_atom_and_rss_carry_the_same_items() {
        let issues = vec![
            issue(1, "Crash on <start>", "It & panics"),
            issue(2, "Typo in README", "s/teh/the/"),
        ];
        let now = Utc::now();
        let atom = render_issues(&meta(), &issues, FeedFormat::Atom, now).unwrap();
        let rss = render_issues(&meta(), &issues, FeedFormat::Rss, now).unwrap();
        assert_ne!(atom, rss);

        let atom_feed = parse(&atom);
        let rss_feed = parse(&rss);
        assert_eq!(atom_feed.feed_type, feed_rs::model::FeedType::Atom);
        assert_eq!(rss_feed.feed_type, feed_rs::model::FeedType::RSS2);

        let atom_items = summarize(&atom_feed);
        let rss_items = summarize(&rss_feed);
        assert_eq!(atom_items.len(), 2);
        assert_eq!(rss_items.len(), 2);
        for (a, r) in atom_items.iter().zip(&rss_items) {
            assert_eq!(a.title, r.title);
            assert_eq!(a.link, r.link);
            assert_eq!(a.description, r.description);
        }
        assert_eq!(atom_items[0].title, "Crash on <start>");
        assert_eq!(atom_items[0].description, "It & panics");
        assert_eq!(atom_items[1].link, "https://github.com/o/r/issues/2");
    }

    #[test]
    fn test_entry_ids_unique_and_match_web_urls() {
        let issues: Vec<Issue> = (1..=5).map(|i| issue(i, "t", "b")).collect();
        let xml = render_issues(&meta(), &issues, FeedFormat::Atom, Utc::now()).unwrap();
        let ids: Vec<String> = parse(&xml).entries.into_iter().map(|e| e.id).collect();

        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(ids[0], "https://github.com/o/r/issues/1");
    }

    #[test]
    fn test_control_characters_do_not_break_the_document() {
        let issues = vec![issue(1, "bell\x07 title", "ansi \x1b[32mgreen\x1b[0m")];
        for format in [FeedFormat::Atom, FeedFormat::Rss] {
            let xml = render_issues(&meta(), &issues, format, Utc::now()).unwrap();
            let items = summarize(&parse(&xml));
            assert_eq!(items[0].title, "bell title");
            assert_eq!(items[0].description, "ansi green");
        }
    }

    proptest! {
        #[test]
        fn prop_every_issue_becomes_one_entry(
            titles in proptest::collection::vec("[a-zA-Z0-9<>&]([a-zA-Z0-9<>& ]{0,30}[a-zA-Z0-9<>&])?", 0..20)
        ) {
            let issues: Vec<Issue> = titles
                .iter()
                .enumerate()
                .map(|(i, t)| issue(i as u64 + 1, t, "body"))
                .collect();
            let xml = render_issues(&meta(), &issues, FeedFormat::Atom, Utc::now()).unwrap();
            let parsed: Vec<String> = summarize(&parse(&xml)).into_iter().map(|s| s.title).collect();
            prop_assert_eq!(parsed, titles);
        }
    }
}
