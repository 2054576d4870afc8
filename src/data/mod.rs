//! XFA data trees.
//!
//! Values live either in the `datasets` packet
//! (`<xfa:datasets><xfa:data><BASE>...`), where elements are matched by
//! local name and leaves hold text, or in the `form` packet
//! (`<form><subform name="BASE">...`), where `subform`, `subformSet`,
//! `exclGroup` and `field` nodes are matched by their `name` attribute and
//! a leaf value lives in `field/value/<first child>`.
//!
//! A bare tree whose root is the base element is read as a datasets tree.

mod derive;
mod extract;
mod inject;

pub use derive::data_skeleton;
pub use extract::{decode_choices, extract, ValueExtractor};
pub use inject::{inject, InjectStats, ValueInjector};

use crate::error::{Error, Result};
use crate::xml::{XmlDocument, XmlElement};

const XFA_DATA_NS: &str = "http://www.xfa.org/schema/xfa-data/1.0/";

/// Which packet a data tree was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFlavor {
    /// `datasets` packet (or a bare data tree)
    Datasets,
    /// `form` packet
    Form,
}

const FORM_NODES: [&str; 4] = ["subform", "subformSet", "exclGroup", "field"];

impl DataFlavor {
    /// Data name of an element, if it takes part in the data tree.
    pub(crate) fn key_of(self, element: &XmlElement) -> Option<&str> {
        match self {
            DataFlavor::Datasets => Some(element.local_name()),
            DataFlavor::Form if FORM_NODES.contains(&element.local_name()) => {
                element.attribute("name")
            },
            DataFlavor::Form => None,
        }
    }

    pub(crate) fn matches(self, element: &XmlElement, name: &str) -> bool {
        self.key_of(element) == Some(name)
    }

    pub(crate) fn new_node(self, name: &str, leaf: bool) -> XmlElement {
        match self {
            DataFlavor::Datasets => XmlElement::new(name),
            DataFlavor::Form if leaf => XmlElement::new("field").with_attribute("name", name),
            DataFlavor::Form => XmlElement::new("subform").with_attribute("name", name),
        }
    }

    pub(crate) fn read_value(self, element: &XmlElement) -> String {
        match self {
            DataFlavor::Datasets => element.text(),
            DataFlavor::Form => element
                .child("value")
                .and_then(XmlElement::first_element)
                .map(XmlElement::text)
                .unwrap_or_default(),
        }
    }

    pub(crate) fn write_value(self, element: &mut XmlElement, value: &str, override_value: bool) {
        match self {
            DataFlavor::Datasets => element.set_text(value),
            DataFlavor::Form => write_form_value(element, value, override_value),
        }
    }
}

fn write_form_value(field: &mut XmlElement, value: &str, override_value: bool) {
    if field.child("value").is_none() {
        field.push_element(XmlElement::new("value"));
    }
    let Some(holder) = field.child_mut("value") else {
        return;
    };
    if override_value {
        holder.set_attribute("override", "1");
    }
    if holder.first_element().is_none() {
        holder.push_element(XmlElement::new("text"));
    }
    if let Some(content) = holder.elements_mut().next() {
        content.set_text(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Datasets,
    Form,
    Bare,
}

/// A parsed `datasets` or `form` packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDocument {
    document: XmlDocument,
    layout: Layout,
}

impl DataDocument {
    /// Parse packet bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_document(XmlDocument::parse(bytes)?))
    }

    /// Wrap an already parsed document; the flavor follows the root element.
    pub fn from_document(document: XmlDocument) -> Self {
        let layout = match document.root.local_name() {
            "datasets" => Layout::Datasets,
            "form" => Layout::Form,
            _ => Layout::Bare,
        };
        log::debug!("Data tree root <{}> read as {:?}", document.root.name, layout);
        Self { document, layout }
    }

    /// Empty datasets packet with no base element yet.
    pub fn new_datasets() -> Self {
        let mut root = XmlElement::new("xfa:datasets").with_attribute("xmlns:xfa", XFA_DATA_NS);
        root.push_element(XmlElement::new("xfa:data"));
        Self {
            document: XmlDocument::new(root),
            layout: Layout::Datasets,
        }
    }

    /// Packet flavor.
    pub fn flavor(&self) -> DataFlavor {
        match self.layout {
            Layout::Form => DataFlavor::Form,
            Layout::Datasets | Layout::Bare => DataFlavor::Datasets,
        }
    }

    /// Underlying XML document.
    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    /// Base element, if the tree has one.
    pub fn base(&self) -> Option<&XmlElement> {
        let root = &self.document.root;
        match self.layout {
            Layout::Datasets => root.child("data").and_then(XmlElement::first_element),
            Layout::Form => root.child("subform"),
            Layout::Bare => Some(root),
        }
    }

    fn base_mut(&mut self) -> Option<&mut XmlElement> {
        let root = &mut self.document.root;
        match self.layout {
            Layout::Datasets => root.child_mut("data").and_then(|d| d.elements_mut().next()),
            Layout::Form => root.child_mut("subform"),
            Layout::Bare => Some(root),
        }
    }

    /// Base tag of the data tree, or `None` when it has no root yet.
    pub fn base_tag(&self) -> Option<&str> {
        let base = self.base()?;
        Some(self.flavor().key_of(base).unwrap_or(""))
    }

    /// Fail with [`Error::BaseTagMismatch`] unless the tree is rooted at `base_tag` or has no root.
    pub fn check_base_tag(&self, base_tag: &str) -> Result<()> {
        match self.base_tag() {
            Some(found) if found != base_tag => {
                log::warn!("Data tree is rooted at '{}', not '{}'", found, base_tag);
                Err(Error::BaseTagMismatch {
                    expected: base_tag.to_string(),
                    found: found.to_string(),
                })
            },
            _ => Ok(()),
        }
    }

    /// Base element, creating it under `base_tag` when the tree has no root yet.
    pub(crate) fn ensure_base(&mut self, base_tag: &str) -> Result<&mut XmlElement> {
        self.check_base_tag(base_tag)?;
        if self.base().is_none() {
            let flavor = self.flavor();
            let root = &mut self.document.root;
            match self.layout {
                Layout::Datasets => {
                    if root.child("data").is_none() {
                        let data_name = match root.name.split_once(':') {
                            Some((prefix, _)) => format!("{}:data", prefix),
                            None => "data".to_string(),
                        };
                        root.push_element(XmlElement::new(data_name));
                    }
                    if let Some(data) = root.child_mut("data") {
                        data.push_element(flavor.new_node(base_tag, false));
                    }
                },
                Layout::Form => {
                    root.push_element(flavor.new_node(base_tag, false));
                },
                Layout::Bare => {},
            }
            log::debug!("Created base element '{}'", base_tag);
        }
        self.base_mut()
            .ok_or_else(|| Error::Xml(format!("could not create base element '{}'", base_tag)))
    }

    /// Serialize the packet.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.document.to_bytes()
    }

    /// Serialize the packet as a string.
    pub fn to_xml_string(&self) -> Result<String> {
        self.document.to_xml_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasets_base_detection() {
        let doc = DataDocument::parse(
            br#"<xfa:datasets xmlns:xfa="http://www.xfa.org/schema/xfa-data/1.0/"><xfa:data><IMM_0800><Name>Ann</Name></IMM_0800></xfa:data></xfa:datasets>"#,
        )
        .unwrap();
        assert_eq!(doc.flavor(), DataFlavor::Datasets);
        assert_eq!(doc.base_tag(), Some("IMM_0800"));
    }

    #[test]
    fn test_empty_data_has_no_base() {
        let doc = DataDocument::new_datasets();
        assert_eq!(doc.base_tag(), None);
        assert!(doc.check_base_tag("anything").is_ok());

        let doc = DataDocument::parse(b"<xfa:datasets xmlns:xfa='x'/>").unwrap();
        assert_eq!(doc.base_tag(), None);
    }

    #[test]
    fn test_bare_and_form_roots() {
        let bare = DataDocument::parse(b"<form1><A>1</A></form1>").unwrap();
        assert_eq!(bare.base_tag(), Some("form1"));

        let form = DataDocument::parse(
            br#"<form xmlns="http://www.xfa.org/schema/xfa-form/2.8/"><subform name="form1"/></form>"#,
        )
        .unwrap();
        assert_eq!(form.flavor(), DataFlavor::Form);
        assert_eq!(form.base_tag(), Some("form1"));
    }

    #[test]
    fn test_ensure_base_creates_root_with_prefix() {
        let mut doc = DataDocument::parse(b"<xfa:datasets xmlns:xfa='x'/>").unwrap();
        doc.ensure_base("form1").unwrap();
        assert_eq!(
            doc.to_xml_string().unwrap(),
            "<xfa:datasets xmlns:xfa=\"x\"><xfa:data><form1/></xfa:data></xfa:datasets>"
        );
    }

    #[test]
    fn test_ensure_base_rejects_other_root() {
        let mut doc = DataDocument::parse(b"<form1/>").unwrap();
        assert!(matches!(
            doc.ensure_base("form2"),
            Err(Error::BaseTagMismatch { .. })
        ));
    }

    #[test]
    fn test_form_value_write_and_read() {
        let mut field = XmlElement::new("field").with_attribute("name", "Surname");
        DataFlavor::Form.write_value(&mut field, "Lee", true);
        assert_eq!(DataFlavor::Form.read_value(&field), "Lee");
        let holder = field.child("value").unwrap();
        assert_eq!(holder.attribute("override"), Some("1"));
        assert_eq!(holder.first_element().unwrap().local_name(), "text");

        let mut dated = XmlElement::new("field").with_attribute("name", "Dob");
        let mut value = XmlElement::new("value");
        value.push_element(XmlElement::new("date"));
        dated.push_element(value);
        DataFlavor::Form.write_value(&mut dated, "2001-02-03", false);
        let holder = dated.child("value").unwrap();
        assert_eq!(holder.attribute("override"), None);
        assert_eq!(holder.first_element().unwrap().local_name(), "date");
        assert_eq!(DataFlavor::Form.read_value(&dated), "2001-02-03");
    }

    #[test]
    fn test_form_matching_uses_name_attribute() {
        let sub = XmlElement::new("subform").with_attribute("name", "Page1");
        let draw = XmlElement::new("draw").with_attribute("name", "Page1");
        assert!(DataFlavor::Form.matches(&sub, "Page1"));
        assert!(!DataFlavor::Form.matches(&draw, "Page1"));
        assert!(!DataFlavor::Datasets.matches(&sub, "Page1"));
    }
}
