use crate::feed::markdown;
use crate::feed::FeedFormat;
use crate::github::Issue;
use chrono::{DateTime, Utc};
use url::Url;

pub const DEFAULT_TITLE: &str = "My Github Issues";
pub const DEFAULT_DESCRIPTION: &str = "My active github issues";
pub const DEFAULT_AUTHOR: &str = "issuefeed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

/// How an item description is to be interpreted by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Text,
    Html,
}

/// One entry of a [`Feed`], derived from one issue.
#[derive(Debug, Clone)]
pub struct FeedItem {
    /// Unique within the feed: the issue's web URL.
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub description_kind: TextKind,
    pub author: Author,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Repository full name, when the API reports it.
    pub category: Option<String>,
}

/// An in-memory syndication document, independent of wire format.
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    /// Canonical link, `<base>/issues`.
    pub link: String,
    pub description: String,
    pub author: Author,
    pub created: DateTime<Utc>,
    pub items: Vec<FeedItem>,
    base_url: String,
}

impl Feed {
    /// URL the feed is served from in the given format.
    pub fn self_link(&self, format: FeedFormat) -> String {
        format!("{}{}", self.base_url, format.path())
    }
}

/// Feed-level metadata and mapping options, built once from configuration.
#[derive(Debug, Clone)]
pub struct FeedMeta {
    /// Public base URL without trailing slash.
    pub base_url: String,
    pub title: String,
    pub description: String,
    pub author: Author,
    /// Render issue bodies from Markdown to HTML.
    pub render_markdown: bool,
    /// Stamp items with the issue's own created/updated times instead of
    /// the feed generation time.
    pub use_issue_timestamps: bool,
}

impl FeedMeta {
    pub fn new(base_url: &Url) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
            title: DEFAULT_TITLE.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            author: Author {
                name: DEFAULT_AUTHOR.to_owned(),
                email: None,
            },
            render_markdown: false,
            use_issue_timestamps: false,
        }
    }

    pub fn link(&self) -> String {
        format!("{}/issues", self.base_url)
    }
}

/// Builds the feed for one request.
///
/// Items keep the order of `issues`. Unless `use_issue_timestamps` is set,
/// the feed and all of its items carry the same `now`.
pub fn build_feed(meta: &FeedMeta, issues: &[Issue], now: DateTime<Utc>) -> Feed {
    Feed {
        title: meta.title.clone(),
        link: meta.link(),
        description: meta.description.clone(),
        author: meta.author.clone(),
        created: now,
        items: issues
            .iter()
            .map(|issue| item_from_issue(meta, issue, now))
            .collect(),
        base_url: meta.base_url.clone(),
    }
}

fn item_from_issue(meta: &FeedMeta, issue: &Issue, now: DateTime<Utc>) -> FeedItem {
    let body = issue.body.as_deref().unwrap_or("");
    let (description, description_kind) = if meta.render_markdown && !body.is_empty() {
        (markdown::to_html(body), TextKind::Html)
    } else {
        (body.to_owned(), TextKind::Text)
    };

    let (published, updated) = if meta.use_issue_timestamps {
        let published = issue.created_at.unwrap_or(now);
        (published, issue.updated_at.unwrap_or(published))
    } else {
        (now, now)
    };

    FeedItem {
        id: issue.web_url().to_owned(),
        title: issue.title.clone(),
        link: issue.web_url().to_owned(),
        description,
        description_kind,
        author: Author {
            name: issue.author_login().to_owned(),
            email: None,
        },
        published,
        updated,
        category: issue.repository.as_ref().map(|r| r.full_name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn meta() -> FeedMeta {
        FeedMeta::new(&Url::parse("http://localhost:8888/").unwrap())
    }

    fn issue(json: serde_json::Value) -> Issue {
        serde_json::from_value(json).unwrap()
    }

    fn sample_issue() -> Issue {
        issue(serde_json::json!({
            "id": 7,
            "url": "https://api.github.com/repos/o/r/issues/7",
            "html_url": "https://github.com/o/r/issues/7",
            "title": "Crash on start",
            "body": "Steps:\n\n1. **run** it",
            "user": { "login": "alice" },
            "state": "open",
            "repository": { "full_name": "o/r" },
            "created_at": "2020-01-02T03:04:05Z",
            "updated_at": "2021-01-02T03:04:05Z"
        }))
    }

    #[test]
    fn test_feed_metadata_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let feed = build_feed(&meta(), &[], now);
        assert_eq!(feed.title, "My Github Issues");
        assert_eq!(feed.link, "http://localhost:8888/issues");
        assert_eq!(feed.description, "My active github issues");
        assert_eq!(feed.created, now);
        assert!(feed.items.is_empty());
        assert_eq!(feed.self_link(FeedFormat::Rss), "http://localhost:8888/rss");
    }

    #[test]
    fn test_issue_mapping() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let feed = build_feed(&meta(), &[sample_issue()], now);
        let item = &feed.items[0];

        assert_eq!(item.id, "https://github.com/o/r/issues/7");
        assert_eq!(item.link, item.id);
        assert_eq!(item.title, "Crash on start");
        assert_eq!(item.description, "Steps:\n\n1. **run** it");
        assert_eq!(item.description_kind, TextKind::Text);
        assert_eq!(item.author.name, "alice");
        assert_eq!(item.author.email, None);
        assert_eq!(item.category.as_deref(), Some("o/r"));
        assert_eq!(item.published, now);
        assert_eq!(item.updated, now);
    }

    #[test]
    fn test_api_url_used_when_web_url_missing() {
        let issue = issue(serde_json::json!({
            "id": 1, "url": "https://api.github.com/repos/o/r/issues/1",
            "title": "t", "state": "open"
        }));
        let feed = build_feed(&meta(), &[issue], Utc::now());
        assert_eq!(feed.items[0].id, "https://api.github.com/repos/o/r/issues/1");
        assert_eq!(feed.items[0].description, "");
    }

    #[test]
    fn test_issue_timestamps_opt_in() {
        let mut meta = meta();
        meta.use_issue_timestamps = true;
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let feed = build_feed(&meta, &[sample_issue()], now);

        let item = &feed.items[0];
        assert_eq!(item.published, Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(item.updated, Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(feed.created, now);
    }

    #[test]
    fn test_markdown_rendering_opt_in() {
        let mut meta = meta();
        meta.render_markdown = true;
        let feed = build_feed(&meta, &[sample_issue()], Utc::now());

        let item = &feed.items[0];
        assert_eq!(item.description_kind, TextKind::Html);
        assert!(item.description.contains("<strong>run</strong>"));
    }

    #[test]
    fn test_order_preserved() {
        let issues: Vec<Issue> = [3u64, 1, 2]
            .iter()
            .map(|id| {
                issue(serde_json::json!({
                    "id": id, "url": format!("u{id}"), "html_url": format!("h{id}"),
                    "title": format!("t{id}"), "state": "open"
                }))
            })
            .collect();
        let feed = build_feed(&meta(), &issues, Utc::now());
        let titles: Vec<&str> = feed.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["t3", "t1", "t2"]);
    }
}
