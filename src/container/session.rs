//! Per-document handle tying the packet store to the mapping operations.

use super::{PacketName, PacketStore};
use crate::config::MapperConfig;
use crate::data::{
    data_skeleton, decode_choices, DataDocument, InjectStats, ValueExtractor, ValueInjector,
};
use crate::error::{Error, Result};
use crate::template::{build_skeleton, classify, Skeleton, TypeTree, XfaTemplate};
use crate::tree::FieldTree;

/// One open XFA document.
///
/// Reads go through `&self`; [`XfaSession::fill`] takes `&mut self`, so
/// writers to the same document are serialized by the borrow checker.
#[derive(Debug, Clone)]
pub struct XfaSession<S: PacketStore> {
    store: S,
    config: MapperConfig,
}

impl<S: PacketStore> XfaSession<S> {
    /// Open a session with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, MapperConfig::default())
    }

    /// Open a session with the given configuration.
    pub fn with_config(store: S, config: MapperConfig) -> Self {
        Self { store, config }
    }

    /// Underlying packet store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Close the session and return the packet store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// The template packet, if present.
    pub fn template(&self) -> Result<Option<XfaTemplate>> {
        self.store
            .read_packet(PacketName::Template)?
            .map(|bytes| XfaTemplate::parse(&bytes))
            .transpose()
    }

    fn require_template(&self) -> Result<XfaTemplate> {
        self.template()?
            .ok_or_else(|| Error::MissingPacket(PacketName::Template.to_string()))
    }

    /// Empty field tree for the form.
    pub fn skeleton(&self) -> Result<Skeleton> {
        Ok(build_skeleton(&self.require_template()?))
    }

    /// Field type descriptors for the form.
    pub fn field_types(&self) -> Result<TypeTree> {
        Ok(classify(&self.require_template()?))
    }

    fn read_data(&self, name: PacketName) -> Result<Option<DataDocument>> {
        self.store
            .read_packet(name)?
            .map(|bytes| DataDocument::parse(&bytes))
            .transpose()
    }

    /// Write `fields` into the `datasets` packet.
    ///
    /// Paths are validated against the template when one is present. The
    /// packet is written back only when every value was injected; an empty
    /// `datasets` packet is created when the container has none.
    pub fn fill(&mut self, fields: &FieldTree) -> Result<InjectStats> {
        let (base_tag, _) = fields.split_root()?;
        let template = self.template()?;
        if let Some(template) = &template {
            if template.base_tag() != base_tag {
                return Err(Error::BaseTagMismatch {
                    expected: template.base_tag().to_string(),
                    found: base_tag.to_string(),
                });
            }
        }
        let schema = template.as_ref().map(XfaTemplate::schema);

        let mut doc = match self.read_data(PacketName::Datasets)? {
            Some(doc) => doc,
            None => {
                log::info!("No datasets packet; creating one for {}", base_tag);
                DataDocument::new_datasets()
            },
        };
        let stats = ValueInjector::with_config(self.config.clone()).inject(
            &mut doc,
            base_tag,
            fields,
            schema.as_ref(),
        )?;
        self.store.write_packet(PacketName::Datasets, doc.to_bytes()?)?;
        Ok(stats)
    }

    /// Current values of the form.
    ///
    /// `datasets` is authoritative; empty leaves are filled from the `form`
    /// packet when it is rooted at the same base tag. The shape comes from
    /// the template when one is present, otherwise from the data itself.
    pub fn values(&self) -> Result<FieldTree> {
        let datasets = self.read_data(PacketName::Datasets)?;
        let form = self
            .read_data(PacketName::Form)?
            .filter(|f| f.base().is_some());
        if datasets.is_none() && form.is_none() {
            return Err(Error::MissingPacket(PacketName::Datasets.to_string()));
        }

        let template = self.template()?;
        let skeleton = match &template {
            Some(template) => build_skeleton(template),
            None => datasets
                .as_ref()
                .and_then(|d| data_skeleton(d, &self.config))
                .or_else(|| form.as_ref().and_then(|f| data_skeleton(f, &self.config)))
                .ok_or_else(|| Error::MissingPacket(PacketName::Template.to_string()))?,
        };

        let extractor = ValueExtractor::with_config(self.config.clone());

        let mut values = match &datasets {
            Some(doc) if doc.base().is_some() => extractor.extract(doc, &skeleton)?,
            _ => skeleton.to_field_tree(),
        };
        if let Some(form) = &form {
            if form.base_tag() == Some(skeleton.base_tag.as_str()) {
                values.fill_blanks(&extractor.extract(form, &skeleton)?);
            } else {
                log::warn!(
                    "form packet is rooted at {:?}, not {}; ignoring it",
                    form.base_tag(),
                    skeleton.base_tag
                );
            }
        }

        if let Some(template) = template.as_ref().filter(|_| self.config.decode_choice_values) {
            decode_choices(&mut values, &classify(template));
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::PacketSet;
    use serde_json::json;

    const TEMPLATE: &[u8] = br#"<template><subform name="form1"><subform name="Name"><field name="First"/><field name="Last"/></subform><field name="Country"><ui><choiceList/></ui><items><text>Canada</text><text>USA</text></items></field></subform></template>"#;

    fn session() -> XfaSession<PacketSet> {
        XfaSession::new(PacketSet::from_pairs([("template", TEMPLATE.to_vec())]))
    }

    #[test]
    fn test_skeleton_and_types() {
        let session = session();
        assert_eq!(
            session.skeleton().unwrap().to_field_tree().to_json().unwrap(),
            json!({"form1": {"Name": {"First": "", "Last": ""}, "Country": ""}})
        );
        assert_eq!(
            session.field_types().unwrap().to_json().unwrap()["form1"]["Country"],
            json!({"type": "select", "options": ["Canada", "USA"]})
        );
    }

    #[test]
    fn test_fill_creates_datasets_and_reads_back() {
        let mut session = session();
        let fields = FieldTree::from_json(&json!({"form1": {"Name": {"First": "Ann", "Last": "Lee"}}})).unwrap();
        session.fill(&fields).unwrap();

        assert!(session.store().get("datasets").is_some());
        assert_eq!(
            session.values().unwrap().to_json().unwrap(),
            json!({"form1": {"Name": {"First": "Ann", "Last": "Lee"}, "Country": ""}})
        );
    }

    #[test]
    fn test_failed_fill_writes_nothing() {
        let mut session = session();
        let fields = FieldTree::from_json(&json!({"form1": {"Address": {"Street": "Main"}}})).unwrap();
        assert!(matches!(
            session.fill(&fields),
            Err(Error::PathNotFoundInSchema { .. })
        ));
        assert!(session.store().get("datasets").is_none());

        let other = FieldTree::from_json(&json!({"form2": {"A": "x"}})).unwrap();
        assert!(matches!(session.fill(&other), Err(Error::BaseTagMismatch { .. })));
    }

    #[test]
    fn test_values_without_template_use_data_shape() {
        let session = XfaSession::new(PacketSet::from_pairs([(
            "datasets",
            b"<xfa:datasets xmlns:xfa='x'><xfa:data><form1><A>1</A><B/></form1></xfa:data></xfa:datasets>".to_vec(),
        )]));
        assert_eq!(
            session.values().unwrap().to_json().unwrap(),
            json!({"form1": {"A": "1", "B": ""}})
        );
        assert!(matches!(session.skeleton(), Err(Error::MissingPacket(_))));
    }

    #[test]
    fn test_values_fall_back_to_form_packet() {
        let session = XfaSession::new(PacketSet::from_pairs([(
            "form",
            br#"<form><subform name="form1"><field name="A"><value><text>v</text></value></field></subform></form>"#.to_vec(),
        )]));
        assert_eq!(session.values().unwrap().to_json().unwrap(), json!({"form1": {"A": "v"}}));
    }

    #[test]
    fn test_form_packet_fills_datasets_blanks() {
        let session = XfaSession::new(PacketSet::from_pairs([
            ("datasets", b"<xfa:datasets xmlns:xfa='x'><xfa:data><form1><A>a</A><B/></form1></xfa:data></xfa:datasets>".to_vec()),
            ("form", br#"<form><subform name="form1"><field name="A"><value><text>stale</text></value></field><field name="B"><value><text>b</text></value></field></subform></form>"#.to_vec()),
        ]));
        assert_eq!(
            session.values().unwrap().to_json().unwrap(),
            json!({"form1": {"A": "a", "B": "b"}})
        );
    }

    #[test]
    fn test_form_packet_of_other_form_is_ignored() {
        let session = XfaSession::new(PacketSet::from_pairs([
            ("template", TEMPLATE.to_vec()),
            ("datasets", b"<form1><Name><First>Ann</First></Name></form1>".to_vec()),
            ("form", br#"<form><subform name="form2"><field name="Country"><value><text>USA</text></value></field></subform></form>"#.to_vec()),
        ]));
        assert_eq!(
            session.values().unwrap().to_json().unwrap(),
            json!({"form1": {"Name": {"First": "Ann", "Last": ""}, "Country": ""}})
        );
    }

    #[test]
    fn test_values_decode_choice_codes() {
        let template = br#"<template><subform name="form1"><exclGroup name="Sex">
            <field name="F"><items><text>1</text></items></field>
            <field name="M"><items><text>2</text></items></field>
        </exclGroup></subform></template>"#;
        let data = b"<form1><Sex>2</Sex></form1>";
        let store = PacketSet::from_pairs([("template", template.to_vec()), ("datasets", data.to_vec())]);

        let session = XfaSession::new(store.clone());
        assert_eq!(session.values().unwrap().to_json().unwrap(), json!({"form1": {"Sex": "M"}}));

        let raw = XfaSession::with_config(store, MapperConfig::new().with_decode_choice_values(false));
        assert_eq!(raw.values().unwrap().to_json().unwrap(), json!({"form1": {"Sex": "2"}}));
    }

    #[test]
    fn test_no_data_packets() {
        assert!(matches!(session().values(), Err(Error::MissingPacket(_))));
    }
}
