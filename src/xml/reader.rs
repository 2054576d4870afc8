//! Parsing packets into [`XmlDocument`] trees.

use super::element::{XmlElement, XmlNode};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A parsed XML packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Whether the source carried an XML declaration
    pub declaration: bool,
    /// Comments and processing instructions before the root element
    pub prolog: Vec<XmlNode>,
    /// Root element
    pub root: XmlElement,
}

impl XmlDocument {
    /// Wrap an element as a document without declaration.
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: false,
            prolog: Vec::new(),
            root,
        }
    }

    /// Parse a packet from raw bytes (UTF-8, optional BOM).
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Self::parse_str(text)
    }

    /// Parse a packet from a string.
    ///
    /// Whitespace-only text between elements is dropped; text inside an
    /// element without element children is kept verbatim.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let mut reader = Reader::from_str(xml);

        let mut declaration = false;
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::Xml(format!("parse error at byte {}: {}", reader.buffer_position(), e)))?;

            match event {
                Event::Decl(_) => declaration = true,
                Event::Start(ref e) => {
                    stack.push(start_element(e)?);
                },
                Event::Empty(ref e) => {
                    let element = start_element(e)?;
                    close_element(element, &mut stack, &mut root)?;
                },
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                    if element.has_element_children() {
                        element
                            .children
                            .retain(|n| !matches!(n, XmlNode::Text(t) if t.trim().is_empty()));
                    }
                    close_element(element, &mut stack, &mut root)?;
                },
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("bad text content: {}", e)))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    } else if !text.trim().is_empty() {
                        return Err(Error::Xml("text outside of root element".to_string()));
                    }
                },
                Event::CData(e) => {
                    let content = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|e| Error::Xml(format!("bad CDATA content: {}", e)))?;
                    push_misc(XmlNode::CData(content), &mut stack, &mut prolog, root.is_some());
                },
                Event::Comment(e) => {
                    let content = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    push_misc(XmlNode::Comment(content), &mut stack, &mut prolog, root.is_some());
                },
                Event::PI(e) => {
                    let content = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    push_misc(
                        XmlNode::ProcessingInstruction(content),
                        &mut stack,
                        &mut prolog,
                        root.is_some(),
                    );
                },
                Event::DocType(_) => {},
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml(format!("unclosed element <{}>", stack[stack.len() - 1].name)));
        }
        let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;

        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }
}

fn start_element(e: &BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let mut element = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Xml(format!("bad attribute: {}", e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(format!("bad attribute value: {}", e)))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(Error::Xml(format!("second root element <{}>", element.name)));
    }
    *root = Some(element);
    Ok(())
}

// Comments and PIs after the root element are dropped.
fn push_misc(node: XmlNode, stack: &mut [XmlElement], prolog: &mut Vec<XmlNode>, after_root: bool) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if !after_root {
        prolog.push(node);
    }
}
