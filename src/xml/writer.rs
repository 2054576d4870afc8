//! Serializing element trees back into packet bytes.

use super::element::{XmlElement, XmlNode};
use super::reader::XmlDocument;
use crate::error::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

fn xml_err(e: quick_xml::Error) -> Error {
    Error::Xml(format!("serialization failed: {}", e))
}

impl XmlDocument {
    /// Serialize the document. Output is compact (no indentation added).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(xml_err)?;
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }

    /// Serialize the document as a UTF-8 string.
    pub fn to_xml_string(&self) -> Result<String> {
        String::from_utf8(self.to_bytes()?).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Declaration, prolog and the opening tag of the root, without its content.
    pub fn head_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(xml_err)?;
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        writer
            .write_event(Event::Start(start_tag(&self.root)))
            .map_err(xml_err)?;
        Ok(writer.into_inner())
    }

    /// Closing tag of the root.
    pub fn tail_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::End(BytesEnd::new(self.root.name.as_str())))
            .map_err(xml_err)?;
        Ok(writer.into_inner())
    }
}

impl XmlElement {
    /// Serialize this element and its subtree without a declaration.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        Ok(writer.into_inner())
    }
}

fn start_tag(element: &XmlElement) -> BytesStart<'_> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    start
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let start = start_tag(element);

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_err)?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    let event = match node {
        XmlNode::Element(e) => return write_element(writer, e),
        XmlNode::Text(t) => Event::Text(BytesText::new(t)),
        XmlNode::CData(t) => Event::CData(BytesCData::new(t.as_str())),
        XmlNode::Comment(t) => Event::Comment(BytesText::from_escaped(t.as_str())),
        XmlNode::ProcessingInstruction(t) => Event::PI(BytesText::from_escaped(t.as_str())),
    };
    writer.write_event(event).map_err(xml_err)
}
