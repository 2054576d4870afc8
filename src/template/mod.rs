//! XFA template packet support.
//!
//! The template packet describes the form: nested `subform` containers,
//! `field` controls, `exclGroup` radio groups, and purely visual content
//! (`draw`, master pages). This module loads a template, resolves its
//! binding hierarchy, and derives two artifacts from it:
//!
//! - an empty field-tree skeleton ([`build_skeleton`])
//! - a tree of field type descriptors with the same shape ([`classify`])
//!
//! # Binding rules
//!
//! - Named `subform` elements are containers. Unnamed subforms, subforms
//!   with `<bind match="none"/>`, `subformSet` and `area` are transparent:
//!   their children bind to the enclosing container.
//! - Named `field` and `exclGroup` elements are leaves. Buttons and
//!   signature fields are presentation-only and skipped.
//! - `<bind match="dataRef" ref="$.A.B"/>` binds under the last ref segment.
//! - Siblings binding to the same name form a repeating group.
//!
//! # Example
//!
//! ```ignore
//! use xfa_fieldmap::template::{build_skeleton, classify, XfaTemplate};
//!
//! let template = XfaTemplate::parse(&template_bytes)?;
//! let skeleton = build_skeleton(&template);
//! let types = classify(&template);
//! println!("{} fields under {}", skeleton.fields.leaf_count(), skeleton.base_tag);
//! ```

mod binding;
mod classify;
mod picture;
mod schema;
mod skeleton;

pub use binding::{BindingGroup, BindingKind, BindingNode};
pub use classify::{
    classify, classify_leaf, FieldKind, FieldType, FieldTypeDescriptor, TypeTree,
};
pub use picture::{normalize_picture, Picture, PictureCategory};
pub use schema::{SchemaNode, TemplateSchema};
pub use skeleton::{build_skeleton, Skeleton};

use crate::error::{Error, Result};
use crate::xml::{XmlDocument, XmlElement};

/// A loaded template packet, reduced to its root binding subform.
#[derive(Debug, Clone)]
pub struct XfaTemplate {
    base_tag: String,
    root: XmlElement,
}

impl XfaTemplate {
    /// Parse a template packet (or a complete XDP containing one).
    ///
    /// Fails with [`Error::MalformedXfaTemplate`] when the bytes are not
    /// well-formed XML, contain no `<template>` element, or the template
    /// has no named root subform.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let document = XmlDocument::parse(bytes)
            .map_err(|e| Error::MalformedXfaTemplate(format!("template is not well-formed: {}", e)))?;
        Self::from_document(document)
    }

    /// Build from an already parsed document.
    pub fn from_document(document: XmlDocument) -> Result<Self> {
        let XmlDocument { root, .. } = document;
        let template = if root.local_name() == "template" {
            root
        } else {
            root.descendant("template")
                .cloned()
                .ok_or_else(|| Error::MalformedXfaTemplate("no <template> element".to_string()))?
        };

        let root_subform = template
            .children_named("subform")
            .next()
            .ok_or_else(|| Error::MalformedXfaTemplate("template has no root subform".to_string()))?;

        let base_tag = match binding::binding_of(root_subform) {
            binding::Binding::Named(name) => name,
            _ => {
                return Err(Error::MalformedXfaTemplate(
                    "root subform has no resolvable binding".to_string(),
                ))
            },
        };
        log::debug!("Template root binding: {}", base_tag);

        Ok(Self {
            base_tag,
            root: root_subform.clone(),
        })
    }

    /// Base tag (local name of the root binding).
    pub fn base_tag(&self) -> &str {
        &self.base_tag
    }

    /// The root subform element.
    pub fn root_subform(&self) -> &XmlElement {
        &self.root
    }

    /// Resolve the binding hierarchy below the root subform.
    pub fn bindings(&self) -> BindingNode<'_> {
        BindingNode::root(&self.base_tag, &self.root)
    }

    /// Schema used to validate injection paths.
    pub fn schema(&self) -> TemplateSchema {
        TemplateSchema::from_bindings(&self.bindings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template_packet() {
        let xml = r#"<template xmlns="http://www.xfa.org/schema/xfa-template/3.3/">
            <subform name="form1"><field name="A"/></subform>
        </template>"#;
        let template = XfaTemplate::parse(xml.as_bytes()).unwrap();
        assert_eq!(template.base_tag(), "form1");
        assert_eq!(template.root_subform().attribute("name"), Some("form1"));
    }

    #[test]
    fn test_parse_template_inside_xdp() {
        let xml = r#"<xdp:xdp xmlns:xdp="http://ns.adobe.com/xdp/">
            <config/>
            <template><subform name="IMM_0800"/></template>
        </xdp:xdp>"#;
        let template = XfaTemplate::parse(xml.as_bytes()).unwrap();
        assert_eq!(template.base_tag(), "IMM_0800");
    }

    #[test]
    fn test_missing_root_binding_is_malformed() {
        for xml in [
            "<template/>",
            "<template><subform/></template>",
            "<datasets><data/></datasets>",
            "<template><subform name='x'>",
        ] {
            assert!(
                matches!(XfaTemplate::parse(xml.as_bytes()), Err(Error::MalformedXfaTemplate(_))),
                "accepted {}",
                xml
            );
        }
    }
}
