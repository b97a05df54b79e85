//! Minimal element tree for report source documents.
//!
//! The source format is a plain nested-element XML document. This module
//! reads it once with `quick-xml` into an owned tree that the parser can walk
//! in document order. Only what the parser needs is kept: local element
//! names, unescaped attributes, the leading text of each element (the text
//! before its first child element), and child elements.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::parser::ParseError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// An element of the source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Local name of the element (namespace prefix stripped).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value, or an empty string when absent.
    pub fn attr_or_empty(&self, name: &str) -> String {
        self.attr(name).unwrap_or_default().to_string()
    }

    /// Text before the first child element.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Leading text of the first direct child with the given name, empty when absent.
    pub fn child_text(&self, name: &str) -> String {
        self.child(name)
            .map(|child| child.text.clone())
            .unwrap_or_default()
    }

    /// All descendants (not including `self`) with the given name, in document order.
    pub fn descendants_named(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_descendants(self, name, &mut found);
        found
    }
}

fn collect_descendants<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in &element.children {
        if child.name == name {
            found.push(child);
        }
        collect_descendants(child, name, found);
    }
}

/// Parses a complete document and returns its root element.
pub fn parse_document(bytes: &[u8]) -> Result<Element, ParseError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::with_capacity(256);
    let mut stack: Vec<Element> = Vec::with_capacity(16);
    let mut root: Option<Element> = None;
    let mut entity_buf = String::with_capacity(16);

    loop {
        let position = reader.buffer_position();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let element = open_element(&reader, &e, position)?;
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                let element = open_element(&reader, &e, position)?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    return Err(ParseError::syntax("unexpected closing tag", position));
                };
                attach(&mut stack, &mut root, element, position)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .decode()
                    .map_err(|err| ParseError::syntax(format!("text decode: {err}"), position))?;
                push_text(&mut stack, root.is_some(), &text, position)?;
            }
            Ok(Event::CData(e)) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|err| ParseError::syntax(format!("cdata decode: {err}"), position))?;
                push_text(&mut stack, root.is_some(), &text, position)?;
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = e
                    .decode()
                    .map_err(|err| ParseError::syntax(format!("entity decode: {err}"), position))?;
                entity_buf.clear();
                entity_buf.push('&');
                entity_buf.push_str(&entity);
                entity_buf.push(';');
                let resolved = quick_xml::escape::unescape(&entity_buf).map_err(|err| {
                    ParseError::syntax(format!("entity unescape: {err}"), position)
                })?;
                push_text(&mut stack, root.is_some(), &resolved, position)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(ParseError::syntax(err.to_string(), reader.error_position()));
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::syntax(
            format!("unclosed element <{}>", open.name),
            reader.buffer_position(),
        ));
    }

    root.ok_or_else(|| ParseError::syntax("document has no root element", 0))
}

fn open_element(
    reader: &Reader<&[u8]>,
    start: &BytesStart<'_>,
    position: u64,
) -> Result<Element, ParseError> {
    let name = decode_name(reader, start.name().as_ref(), position)?;

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr =
            attr.map_err(|err| ParseError::syntax(format!("attribute: {err}"), position))?;
        let key = decode_name(reader, attr.key.as_ref(), position)?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| ParseError::syntax(format!("attribute value: {err}"), position))?;
        attributes.push((key, value.into_owned()));
    }

    Ok(Element {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn decode_name(reader: &Reader<&[u8]>, raw: &[u8], position: u64) -> Result<String, ParseError> {
    let decoded: Cow<'_, str> = reader
        .decoder()
        .decode(raw)
        .map_err(|err| ParseError::syntax(format!("name decode: {err}"), position))?;
    let local = decoded.rsplit(':').next().unwrap_or(decoded.as_ref());
    Ok(local.to_string())
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::syntax("multiple root elements", position));
    }
    *root = Some(element);
    Ok(())
}

// Text after an element's first child is tail text and is not kept.
fn push_text(
    stack: &mut [Element],
    has_root: bool,
    text: &str,
    position: u64,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(current) => {
            if current.children.is_empty() {
                current.text.push_str(text);
            }
        }
        None if has_root && !text.trim().is_empty() => {
            return Err(ParseError::syntax("junk after document element", position));
        }
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let root = parse_document(
            br#"<root a="1"><title>Hello</title><group><leaf id="x"/></group></root>"#,
        )
        .unwrap();

        assert_eq!(root.name(), "root");
        assert_eq!(root.attr("a"), Some("1"));
        assert_eq!(root.child_text("title"), "Hello");
        assert_eq!(root.descendants_named("leaf")[0].attr("id"), Some("x"));
    }

    #[test]
    fn test_leading_text_only() {
        let root =
            parse_document(b"<step>before<table>inside</table>after</step>").unwrap();
        assert_eq!(root.text(), "before");
        assert_eq!(root.child_text("table"), "inside");
    }

    #[test]
    fn test_entities_and_cdata() {
        let root = parse_document(
            br#"<r v="a &amp; b"><t>1 &lt; 2 &#x41;</t><c><![CDATA[<raw>]]></c></r>"#,
        )
        .unwrap();
        assert_eq!(root.attr("v"), Some("a & b"));
        assert_eq!(root.child_text("t"), "1 < 2 A");
        assert_eq!(root.child_text("c"), "<raw>");
    }

    #[test]
    fn test_bom_is_skipped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"<?xml version=\"1.0\"?><root/>");
        assert_eq!(parse_document(&bytes).unwrap().name(), "root");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = parse_document(
            br#"<r><x n="1"><x n="2"/></x><y><x n="3"/></y></r>"#,
        )
        .unwrap();
        let order: Vec<_> = root
            .descendants_named("x")
            .iter()
            .map(|e| e.attr("n").unwrap())
            .collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let err = parse_document(b"<root><a></b></root>").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_unclosed_root_fails() {
        let err = parse_document(b"<root><a></a>").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_empty_document_fails() {
        let err = parse_document(b"   ").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_text_after_root_fails() {
        let err = parse_document(b"<root><a/></root>trailing").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_whitespace_after_root_allowed() {
        let root = parse_document(b"<root/>\n  \n").unwrap();
        assert_eq!(root.name(), "root");
    }
}
