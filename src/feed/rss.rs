//! RSS 2.0 serialization.

use crate::feed::model::{Author, Feed, FeedItem};
use crate::feed::xml::{RenderError, XmlWriter};
use crate::feed::{FeedFormat, GENERATOR};
use chrono::{DateTime, Utc};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

pub(crate) fn write_rss(feed: &Feed) -> Result<String, RenderError> {
    let mut w = XmlWriter::new()?;
    let self_link = feed.self_link(FeedFormat::Rss);
    let built = timestamp(feed.created);

    w.start(
        "rss",
        &[("version", "2.0"), ("xmlns:atom", ATOM_NS), ("xmlns:dc", DC_NS)],
    )?;
    w.start("channel", &[])?;
    w.text_element("title", &[], &feed.title)?;
    w.text_element("link", &[], &feed.link)?;
    w.text_element("description", &[], &feed.description)?;
    w.empty(
        "atom:link",
        &[
            ("href", self_link.as_str()),
            ("rel", "self"),
            ("type", FeedFormat::Rss.mime_type()),
        ],
    )?;
    // managingEditor must be an email address
    if let Some(editor) = email_contact(&feed.author) {
        w.text_element("managingEditor", &[], &editor)?;
    }
    w.text_element("pubDate", &[], &built)?;
    w.text_element("lastBuildDate", &[], &built)?;
    w.text_element("generator", &[], GENERATOR)?;

    for item in &feed.items {
        write_item(&mut w, item)?;
    }

    w.end("channel")?;
    w.end("rss")?;
    w.finish()
}

fn write_item(w: &mut XmlWriter, item: &FeedItem) -> Result<(), RenderError> {
    w.start("item", &[])?;
    w.text_element("title", &[], &item.title)?;
    w.text_element("link", &[], &item.link)?;
    w.text_element("description", &[], &item.description)?;
    // <author> must be an email address; the login goes to dc:creator
    if let Some(author) = email_contact(&item.author) {
        w.text_element("author", &[], &author)?;
    }
    w.text_element("dc:creator", &[], &item.author.name)?;
    if let Some(category) = &item.category {
        w.text_element("category", &[], category)?;
    }
    let permalink = if item.id == item.link { "true" } else { "false" };
    w.text_element("guid", &[("isPermaLink", permalink)], &item.id)?;
    w.text_element("pubDate", &[], &timestamp(item.published))?;
    w.end("item")
}

fn email_contact(author: &Author) -> Option<String> {
    author
        .email
        .as_deref()
        .filter(|email| !email.is_empty())
        .map(|email| format!("{} ({})", email, author.name))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc2822()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::model::{build_feed, FeedMeta};
    use chrono::TimeZone;
    use url::Url;

    fn meta() -> FeedMeta {
        FeedMeta::new(&Url::parse("http://localhost:8888").unwrap())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_required_channel_elements() {
        let xml = write_rss(&build_feed(&meta(), &[], now())).unwrap();
        assert!(xml.contains("<rss version=\"2.0\""));
        assert!(xml.contains("xmlns:dc=\"http://purl.org/dc/elements/1.1/\""));
        assert!(xml.contains("<title>My Github Issues</title>"));
        assert!(xml.contains("<link>http://localhost:8888/issues</link>"));
        assert!(xml.contains("<description>My active github issues</description>"));
        assert!(xml.contains("<lastBuildDate>Wed, 15 May 2024 12:00:00 +0000</lastBuildDate>"));
        assert!(!xml.contains("<managingEditor>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_managing_editor_with_email() {
        let mut meta = meta();
        meta.author.email = Some("me@example.com".to_string());
        let xml = write_rss(&build_feed(&meta, &[], now())).unwrap();
        assert!(xml.contains("<managingEditor>me@example.com (issuefeed)</managingEditor>"));
    }

    #[test]
    fn test_item_elements() {
        let issues: Vec<crate::github::Issue> = serde_json::from_value(serde_json::json!([{
            "id": 3,
            "url": "https://api.github.com/repos/o/r/issues/3",
            "html_url": "https://github.com/o/r/issues/3",
            "title": "Docs typo",
            "body": null,
            "user": { "login": "carol" },
            "state": "open"
        }]))
        .unwrap();
        let xml = write_rss(&build_feed(&meta(), &issues, now())).unwrap();

        assert!(xml.contains("<guid isPermaLink=\"true\">https://github.com/o/r/issues/3</guid>"));
        assert!(xml.contains("<dc:creator>carol</dc:creator>"));
        assert!(!xml.contains("<author>"));
        assert!(xml.contains("<description></description>"));
        assert!(xml.contains("<pubDate>Wed, 15 May 2024 12:00:00 +0000</pubDate>"));
    }
}
