//! Atom 1.0 (RFC 4287) serialization.

use crate::feed::model::{Author, Feed, FeedItem, TextKind};
use crate::feed::xml::{RenderError, XmlWriter};
use crate::feed::{FeedFormat, GENERATOR};
use chrono::{DateTime, SecondsFormat, Utc};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

pub(crate) fn write_atom(feed: &Feed) -> Result<String, RenderError> {
    let mut w = XmlWriter::new()?;
    let self_link = feed.self_link(FeedFormat::Atom);

    w.start("feed", &[("xmlns", ATOM_NS)])?;
    w.text_element("title", &[], &feed.title)?;
    w.text_element("id", &[], &feed.link)?;
    w.empty("link", &[("rel", "alternate"), ("href", feed.link.as_str())])?;
    w.empty(
        "link",
        &[
            ("rel", "self"),
            ("type", FeedFormat::Atom.mime_type()),
            ("href", self_link.as_str()),
        ],
    )?;
    w.text_element("subtitle", &[], &feed.description)?;
    write_person(&mut w, &feed.author)?;
    w.text_element("updated", &[], &timestamp(feed.created))?;
    w.text_element("generator", &[], GENERATOR)?;

    for item in &feed.items {
        write_entry(&mut w, item)?;
    }

    w.end("feed")?;
    w.finish()
}

fn write_entry(w: &mut XmlWriter, item: &FeedItem) -> Result<(), RenderError> {
    w.start("entry", &[])?;
    w.text_element("title", &[], &item.title)?;
    w.text_element("id", &[], &item.id)?;
    w.empty("link", &[("rel", "alternate"), ("href", item.link.as_str())])?;
    write_person(w, &item.author)?;
    w.text_element("published", &[], &timestamp(item.published))?;
    w.text_element("updated", &[], &timestamp(item.updated))?;
    if let Some(category) = &item.category {
        w.empty("category", &[("term", category.as_str())])?;
    }
    let kind = match item.description_kind {
        TextKind::Text => "text",
        TextKind::Html => "html",
    };
    w.text_element("summary", &[("type", kind)], &item.description)?;
    w.end("entry")
}

fn write_person(w: &mut XmlWriter, author: &Author) -> Result<(), RenderError> {
    w.start("author", &[])?;
    w.text_element("name", &[], &author.name)?;
    if let Some(email) = author.email.as_deref().filter(|e| !e.is_empty()) {
        w.text_element("email", &[], email)?;
    }
    w.end("author")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
