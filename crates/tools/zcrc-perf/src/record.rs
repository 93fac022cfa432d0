//! Benchmark record loading.
//!
//! Parses the XML emitted by the Catch2 reporter into a small owned element
//! tree. Only tags and attributes are kept; text content carries nothing the
//! chart needs.

use std::io::Read;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::PerfError;

/// A parsed benchmark results document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// The document's root element (`Catch2TestRun` for Catch2 output).
    pub fn root(&self) -> &Element {
        &self.root
    }
}

/// One XML element: tag, attributes in source order, and child elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name.
    pub tag: String,
    /// Attributes as `(key, unescaped value)` pairs.
    pub attributes: Vec<(String, String)>,
    /// Direct child elements in source order.
    pub children: Vec<Element>,
}

impl Element {
    /// Look up an attribute value by key.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Direct children with the given tag, in source order.
    pub fn children_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

/// Read a whole results document from `source` and parse it.
///
/// Fails with [`PerfError::InputAccess`] if the source cannot be read or is
/// not valid UTF-8, and with [`PerfError::Parse`] if it is not well-formed.
pub fn load_document(mut source: impl Read) -> Result<Document, PerfError> {
    let mut text = String::new();
    source.read_to_string(&mut text)?;
    parse_document(&text)
}

/// Parse a results document from text.
pub fn parse_document(text: &str) -> Result<Document, PerfError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_error(position(reader.error_position()), e))?;
        let at = position(reader.buffer_position());

        match event {
            Event::Start(start) => {
                if open.is_empty() && root.is_some() {
                    return Err(parse_error(at, "content after the root element"));
                }
                open.push(open_element(&start, at)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start, at)?;
                attach(&mut open, &mut root, element, at)?;
            }
            Event::End(_) => {
                let element = open
                    .pop()
                    .ok_or_else(|| parse_error(at, "closing tag without an open element"))?;
                attach(&mut open, &mut root, element, at)?;
            }
            Event::Text(_) | Event::CData(_) if open.is_empty() => {
                return Err(parse_error(at, "text outside the root element"));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(parse_error(
            position(reader.buffer_position()),
            format!("unclosed element <{}>", unclosed.tag),
        ));
    }

    root.map(|root| Document { root })
        .ok_or_else(|| parse_error(0, "document has no root element"))
}

/// Build an element (without children yet) from a start or empty tag.
fn open_element(start: &BytesStart<'_>, at: u64) -> Result<Element, PerfError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_error(at, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| parse_error(at, e))?;
        attributes.push((key, value.into_owned()));
    }

    Ok(Element {
        tag,
        attributes,
        children: Vec::new(),
    })
}

/// Hang a finished element off its parent, or make it the root.
fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    at: u64,
) -> Result<(), PerfError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(parse_error(at, "more than one root element")),
    }
    Ok(())
}

fn position<P>(pos: P) -> u64
where
    u64: TryFrom<P>,
{
    u64::try_from(pos).unwrap_or(u64::MAX)
}

fn parse_error(position: u64, message: impl ToString) -> PerfError {
    PerfError::Parse {
        position,
        message: message.to_string(),
    }
}
