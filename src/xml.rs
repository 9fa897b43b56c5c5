//! Owned element tree over `quick-xml` pull events.
//!
//! The pipeline only needs a handful of queries against each NITF document
//! (attribute lookup, first/all descendants by tag, descendant text), so each
//! archive entry is parsed into a small in-memory tree that lives for one
//! classify/extract cycle.
//!
//! Entity references in element text are resolved once by the XML layer:
//! XML's predefined entities, numeric character references and the HTML5
//! named entities are decoded, anything else is kept verbatim.
//! [`unescape_html`] is the second, browser-style pass applied to article
//! paragraphs and attribute values.

use crate::error::{ExtractError, Result};
use once_cell::sync::Lazy;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// A character reference as browsers recognize it: decimal or hex with an
/// optional `;`, or up to 32 name characters with an optional `;`.
static HTML_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[^\t\n\x0C <&#;]{1,32};?)")
        .expect("reference pattern is valid")
});

/// Named references that HTML also accepts without the trailing `;`.
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren", "deg",
    "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34", "gt",
    "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn from_start(entry: &str, start: &BytesStart<'_>) -> Result<Self> {
        let name = utf8(entry, start.name().as_ref())?.to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| xml_error(entry, e))?;
            let key = utf8(entry, attr.key.as_ref())?.to_string();
            let value = unescape_html(utf8(entry, &attr.value)?).into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the named attribute, `None` if absent.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First descendant with the given tag, depth first in document order.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant with the given tag, in document order.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect(name, found);
        }
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.push_text(&mut text);
        text
    }

    fn push_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.push_text(out),
            }
        }
    }

    fn push_str(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

/// Parse one archive entry into its root element.
///
/// `entry` only labels errors.
pub fn parse_document(entry: &str, raw: &[u8]) -> Result<Element> {
    let source = utf8(entry, raw)?;
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            xml_error(entry, format!("{e} at byte {}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(ref start) => stack.push(Element::from_start(entry, start)?),
            Event::Empty(ref start) => {
                let element = Element::from_start(entry, start)?;
                attach(entry, &mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error(entry, "unbalanced end tag"))?;
                attach(entry, &mut stack, &mut root, element)?;
            }
            Event::Text(ref text) => {
                if let Some(current) = stack.last_mut() {
                    current.push_str(utf8(entry, text)?);
                }
            }
            Event::CData(ref data) => {
                if let Some(current) = stack.last_mut() {
                    current.push_str(utf8(entry, data)?);
                }
            }
            Event::GeneralRef(ref reference) => {
                if let Some(current) = stack.last_mut() {
                    let name = utf8(entry, reference)?;
                    match resolve_reference(name) {
                        Some(resolved) => current.push_str(&resolved),
                        None => current.push_str(&format!("&{name};")),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(entry, format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| xml_error(entry, "document has no root element"))
}

fn attach(
    entry: &str,
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(xml_error(entry, "multiple root elements")),
    }
    Ok(())
}

/// Resolve the body of an XML reference (`amp`, `#233`, `#xE9`, `eacute`).
pub fn resolve_reference(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return Some(numeric_reference(code));
    }
    resolve_html5_entity(name).map(str::to_string)
}

/// Decode character references the way a browser reads HTML text.
///
/// Besides `&name;` and `&#N;` this accepts numeric references without `;`,
/// the legacy names that need no `;` (`&amp`, `&eacute`), and the longest
/// legacy prefix of an unknown name (`&copyright` is `©right`). Anything else,
/// such as `AT&T` or `&bogus;`, is kept verbatim. One pass only:
/// `&amp;lt;` becomes `&lt;`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(unescape_html("AT&amp T &#233"), "AT& T é");
/// assert_eq!(unescape_html("&#150;"), "\u{2013}");
/// ```
pub fn unescape_html(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    HTML_REFERENCE.replace_all(text, |captures: &Captures<'_>| replace_reference(&captures[1]))
}

fn replace_reference(reference: &str) -> String {
    if let Some(number) = reference.strip_prefix('#') {
        let number = number.trim_end_matches(';');
        // Overflow only happens for runs of digits far past U+10FFFF.
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).unwrap_or(u32::MAX),
            None => number.parse::<u32>().unwrap_or(u32::MAX),
        };
        return numeric_reference(code);
    }

    match reference.strip_suffix(';') {
        Some(name) => {
            if let Some(value) = resolve_html5_entity(name) {
                return value.to_string();
            }
        }
        None => {
            if let Some(value) = legacy_entity(reference) {
                return value.to_string();
            }
        }
    }

    for end in (2..reference.len()).rev() {
        if !reference.is_char_boundary(end) {
            continue;
        }
        if let Some(value) = legacy_entity(&reference[..end]) {
            return format!("{value}{}", &reference[end..]);
        }
    }
    format!("&{reference}")
}

fn legacy_entity(name: &str) -> Option<&'static str> {
    if LEGACY_ENTITIES.contains(&name) {
        resolve_html5_entity(name)
    } else {
        None
    }
}

/// Text for a numeric reference, with HTML's repairs: NUL, surrogates and
/// out-of-range values become U+FFFD, the C1 range is read as windows-1252,
/// and other control or noncharacter code points are dropped.
fn numeric_reference(code: u32) -> String {
    if let Some(replacement) = windows_1252(code) {
        return replacement.to_string();
    }
    if (0xD800..=0xDFFF).contains(&code) || code > 0x10FFFF {
        return '\u{FFFD}'.to_string();
    }
    if is_invalid_code_point(code) {
        return String::new();
    }
    char::from_u32(code).map(String::from).unwrap_or_else(|| '\u{FFFD}'.to_string())
}

fn windows_1252(code: u32) -> Option<char> {
    let replacement = match code {
        0x00 => '\u{FFFD}',
        0x0D => '\r',
        0x80 => '\u{20AC}',
        0x81 => '\u{81}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8D => '\u{8D}',
        0x8E => '\u{017D}',
        0x8F => '\u{8F}',
        0x90 => '\u{90}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9D => '\u{9D}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => return None,
    };
    Some(replacement)
}

fn is_invalid_code_point(code: u32) -> bool {
    matches!(code, 0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F..=0x9F | 0xFDD0..=0xFDEF)
        || code & 0xFFFE == 0xFFFE
}

fn utf8<'a>(entry: &str, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| xml_error(entry, e))
}

fn xml_error(entry: &str, message: impl ToString) -> ExtractError {
    ExtractError::Xml {
        entry: entry.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nitf SYSTEM "http://www.nitf.org/IPTC/NITF/3.3/specification/dtd/nitf-3-3.dtd">
<nitf change.date="June 10, 2005" version="-//IPTC//DTD NITF 3.3//EN">
  <head>
    <docdata>
      <doc-id id-string="1815718"/>
      <classifier class="online_producer" type="taxonomic_classifier">Top/News/Sports</classifier>
    </docdata>
  </head>
  <body>
    <body.content>
      <block class="full_text"><p>One <b>bold</b> word.</p><p>Caf&#233; &amp; bar</p></block>
    </body.content>
  </body>
</nitf>"#;

    #[test]
    fn test_parse_document_navigation() {
        let root = parse_document("sample.xml", SAMPLE.as_bytes()).unwrap();
        assert_eq!(root.name(), "nitf");
        assert_eq!(root.attr("version"), Some("-//IPTC//DTD NITF 3.3//EN"));
        assert_eq!(root.attr("missing"), None);

        let doc_id = root.find("doc-id").unwrap();
        assert_eq!(doc_id.attr("id-string"), Some("1815718"));

        let classifiers = root.find("docdata").unwrap().find_all("classifier");
        assert_eq!(classifiers.len(), 1);
        assert_eq!(classifiers[0].attr("type"), Some("taxonomic_classifier"));
        assert_eq!(classifiers[0].text(), "Top/News/Sports");
    }

    #[test]
    fn test_text_includes_descendants_and_references() {
        let root = parse_document("sample.xml", SAMPLE.as_bytes()).unwrap();
        let paragraphs = root.find_all("p");
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text(), "One bold word.");
        assert_eq!(paragraphs[1].text(), "Café & bar");
    }

    #[test]
    fn test_find_all_document_order() {
        let xml = r#"<a><b n="1"><b n="2"/></b><c><b n="3"/></c></a>"#;
        let root = parse_document("order.xml", xml.as_bytes()).unwrap();
        let order: Vec<_> = root.find_all("b").iter().map(|b| b.attr("n").unwrap()).collect();
        assert_eq!(order, vec!["1", "2", "3"]);
        assert_eq!(root.find("b").unwrap().attr("n"), Some("1"));
        assert_eq!(root.child_elements().count(), 2);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let err = parse_document("bad.xml", b"<a><b></a>").unwrap_err();
        assert!(matches!(err, ExtractError::Xml { ref entry, .. } if entry == "bad.xml"));

        let err = parse_document("open.xml", b"<a><b>").unwrap_err();
        assert!(matches!(err, ExtractError::Xml { .. }));

        let err = parse_document("empty.xml", b"").unwrap_err();
        assert!(matches!(err, ExtractError::Xml { .. }));
    }

    #[test]
    fn test_unescape_html_named() {
        assert_eq!(unescape_html("A &amp; B"), "A & B");
        assert_eq!(unescape_html("&eacute;migr&eacute;"), "émigré");
        assert_eq!(unescape_html("&bogus; &"), "&bogus; &");
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
        assert_eq!(unescape_html("AT&T"), "AT&T");
    }

    #[test]
    fn test_unescape_html_without_semicolon() {
        assert_eq!(unescape_html("AT&amp T &#233"), "AT& T é");
        assert_eq!(unescape_html("caf&eacute au lait"), "café au lait");
        assert_eq!(unescape_html("&#65B&#x42"), "ABB");
        // Only legacy names may drop the semicolon.
        assert_eq!(unescape_html("&hellip and"), "&hellip and");
        assert_eq!(unescape_html("&hellip;"), "\u{2026}");
    }

    #[test]
    fn test_unescape_html_longest_legacy_prefix() {
        assert_eq!(unescape_html("&copyright;"), "©right;");
        assert_eq!(unescape_html("&notit;"), "¬it;");
        assert_eq!(unescape_html("&ampersand"), "&ersand");
    }

    #[test]
    fn test_unescape_html_numeric_repairs() {
        assert_eq!(unescape_html("&#0;"), "\u{FFFD}");
        assert_eq!(unescape_html("&#xD800;"), "\u{FFFD}");
        assert_eq!(unescape_html("&#x110000;"), "\u{FFFD}");
        assert_eq!(unescape_html("&#99999999999999;"), "\u{FFFD}");
        assert_eq!(unescape_html("&#150;"), "\u{2013}");
        assert_eq!(unescape_html("&#x93;quoted&#x94;"), "\u{201C}quoted\u{201D}");
        assert_eq!(unescape_html("&#13;"), "\r");
        assert_eq!(unescape_html("a&#1;b&#xFFFE;c"), "abc");
        assert_eq!(unescape_html("&#;"), "&#;");
    }

    #[test]
    fn test_unescape_html_borrows_plain_text() {
        assert!(matches!(unescape_html("plain"), Cow::Borrowed("plain")));
    }
}
