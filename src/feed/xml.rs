use crate::util::strip_invalid_xml_chars;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use thiserror::Error;

/// Errors that can occur while serializing a feed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The XML writer rejected an event.
    #[error("XML write error while writing <{element}>: {message}")]
    Xml { element: String, message: String },

    #[error("Rendered feed contains invalid UTF-8")]
    InvalidUtf8,
}

/// Thin wrapper over an indenting `quick_xml::Writer`.
///
/// All attribute values and text pass through [`strip_invalid_xml_chars`]
/// before being escaped by the writer, so arbitrary issue text always yields
/// a well-formed document.
pub(crate) struct XmlWriter {
    inner: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    /// Starts a document with the `<?xml version="1.0" encoding="UTF-8"?>` declaration.
    pub fn new() -> Result<Self, RenderError> {
        let mut writer = Self {
            inner: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        };
        writer.write(
            "xml declaration",
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        Ok(writer)
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
        let start = element(name, attrs);
        self.write(name, Event::Start(start))
    }

    pub fn end(&mut self, name: &str) -> Result<(), RenderError> {
        self.write(name, Event::End(BytesEnd::new(name)))
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
        let empty = element(name, attrs);
        self.write(name, Event::Empty(empty))
    }

    /// Writes `<name attrs>text</name>`.
    ///
    /// The text event is written even when empty so the indenting writer
    /// keeps the closing tag on the same line and adds no whitespace content.
    pub fn text_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), RenderError> {
        self.start(name, attrs)?;
        let clean = strip_invalid_xml_chars(text);
        self.write(name, Event::Text(BytesText::new(&clean)))?;
        self.end(name)
    }

    pub fn finish(self) -> Result<String, RenderError> {
        let bytes = self.inner.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|_| RenderError::InvalidUtf8)
    }

    fn write(&mut self, element: &str, event: Event<'_>) -> Result<(), RenderError> {
        self.inner
            .write_event(event)
            .map_err(|e| RenderError::Xml {
                element: element.to_owned(),
                message: e.to_string(),
            })
    }
}

fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attrs {
        let clean = strip_invalid_xml_chars(value);
        start.push_attribute((*key, clean.as_ref()));
    }
    start
}
