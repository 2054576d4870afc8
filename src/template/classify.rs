//! Field type classification.
//!
//! Every bound leaf of a template gets a [`FieldTypeDescriptor`]. A leaf
//! that claims a choice, date or time kind without the metadata to back
//! it is recorded as [`FieldType::Unresolved`] in place; its siblings are
//! still classified.

use super::binding::{binding_of, Binding, BindingKind, BindingNode};
use super::picture::{Picture, PictureCategory};
use super::XfaTemplate;
use crate::error::{Error, Result};
use crate::path::JsonPath;
use crate::tree::Tree;
use crate::xml::XmlElement;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// UI category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text
    Text,
    /// Single choice from a list
    Select,
    /// Two-state toggle
    Checkbox,
    /// One value chosen among exclusive controls
    Radio,
    /// Date with a format
    Date,
    /// Time with a format
    Time,
}

/// Type information for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldTypeDescriptor {
    /// UI category
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Choice captions in document order (duplicates kept)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Normalized date/time format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Caption to stored value, where the two differ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_map: Option<IndexMap<String, String>>,
}

impl FieldTypeDescriptor {
    /// Descriptor carrying only a kind.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            options: None,
            format: None,
            value_map: None,
        }
    }

    /// Set the option list.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the value map; an empty map is dropped.
    pub fn with_value_map(mut self, value_map: IndexMap<String, String>) -> Self {
        self.value_map = Some(value_map).filter(|m| !m.is_empty());
        self
    }

    /// Caption for a stored radio or select value.
    ///
    /// `None` unless the value is non-empty and not already an option. The
    /// value map is searched in reverse first; `Y`/`1` and `N`/`0` then
    /// stand for `Yes` and `No` when those are options; a number is read
    /// as a zero-based option index, or one-based for the last option.
    pub fn display_value(&self, stored: &str) -> Option<String> {
        if !matches!(self.kind, FieldKind::Radio | FieldKind::Select) || stored.is_empty() {
            return None;
        }
        let options = self.options.as_ref().filter(|o| !o.is_empty())?;
        if options.iter().any(|o| o == stored) {
            return None;
        }

        let mapped = self
            .value_map
            .as_ref()
            .and_then(|m| m.iter().find(|(_, value)| value.as_str() == stored));
        if let Some((caption, _)) = mapped {
            return Some(caption.clone());
        }

        let word = match stored {
            "Y" | "1" => Some("Yes"),
            "N" | "0" => Some("No"),
            _ => None,
        };
        if let Some(word) = word.filter(|w| options.iter().any(|o| o == w)) {
            return Some(word.to_string());
        }

        let index: usize = stored.trim().parse().ok()?;
        if index < options.len() {
            options.get(index).cloned()
        } else if index == options.len() {
            options.last().cloned()
        } else {
            None
        }
    }
}

/// Classification outcome for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Classified
    Resolved(FieldTypeDescriptor),
    /// Classification failed; serialized as `{"type": "error", "error": reason}`
    Unresolved {
        /// Failure message
        reason: String,
    },
}

impl FieldType {
    /// The descriptor, if classification succeeded.
    pub fn descriptor(&self) -> Option<&FieldTypeDescriptor> {
        match self {
            FieldType::Resolved(d) => Some(d),
            FieldType::Unresolved { .. } => None,
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldType::Resolved(descriptor) => descriptor.serialize(serializer),
            FieldType::Unresolved { reason } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "error")?;
                map.serialize_entry("error", reason)?;
                map.end()
            },
        }
    }
}

/// Tree of classification outcomes, shaped like the template skeleton.
pub type TypeTree = Tree<FieldType>;

/// Classify every bound leaf of a template.
///
/// The result is rooted at the base tag and has exactly the shape of
/// [`build_skeleton`](super::build_skeleton) for the same template.
pub fn classify(template: &XfaTemplate) -> TypeTree {
    let root = template.bindings();
    let mut failures = 0usize;
    let body = root.shape(&JsonPath::root(template.base_tag()), &mut |node, path| {
        match classify_leaf(node, path) {
            Ok(descriptor) => FieldType::Resolved(descriptor),
            Err(e) => {
                log::warn!("Could not classify {}: {}", path, e);
                failures += 1;
                FieldType::Unresolved {
                    reason: e.to_string(),
                }
            },
        }
    });
    if failures > 0 {
        log::info!("{} field(s) under {} left unresolved", failures, template.base_tag());
    }
    Tree::rooted(template.base_tag(), body)
}

/// Classify a single bound leaf.
pub fn classify_leaf(node: &BindingNode<'_>, path: &JsonPath) -> Result<FieldTypeDescriptor> {
    let failure = |reason: &str| Error::TypeInferenceFailure {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    match node.kind {
        BindingKind::ExclusiveGroup => {
            return classify_radio(node.element)
                .ok_or_else(|| failure("exclusive group has no member controls"));
        },
        BindingKind::Container(_) => return Err(failure("container is not a leaf")),
        BindingKind::Field => {},
    }

    let field = node.element;
    let control = field
        .child("ui")
        .and_then(XmlElement::first_element)
        .map(XmlElement::local_name)
        .unwrap_or("textEdit");
    let picture = find_picture(field);

    match control {
        "choiceList" => {
            let (options, value_map) = choice_items(field);
            if options.is_empty() {
                return Err(failure("choice list has no items"));
            }
            Ok(FieldTypeDescriptor::new(FieldKind::Select)
                .with_options(options)
                .with_value_map(value_map))
        },
        "checkButton" => Ok(FieldTypeDescriptor::new(FieldKind::Checkbox)),
        "dateTimeEdit" => {
            let picture = picture.ok_or_else(|| failure("date/time control has no picture clause"))?;
            if picture.is_mask() {
                return Err(failure("date/time control has a mask picture"));
            }
            let kind = match picture.category {
                PictureCategory::Time => FieldKind::Time,
                PictureCategory::Bare if picture.looks_like_time() => FieldKind::Time,
                _ => FieldKind::Date,
            };
            let format = picture
                .normalized()
                .ok_or_else(|| failure("date/time picture clause is empty"))?;
            Ok(FieldTypeDescriptor::new(kind).with_format(format))
        },
        _ => {
            let kind = match picture.as_ref().map(|p| p.category) {
                Some(PictureCategory::Date | PictureCategory::DateTime) => FieldKind::Date,
                Some(PictureCategory::Time) => FieldKind::Time,
                _ => return Ok(FieldTypeDescriptor::new(FieldKind::Text)),
            };
            let format = picture
                .and_then(|p| p.normalized())
                .ok_or_else(|| failure("date/time picture clause is empty"))?;
            Ok(FieldTypeDescriptor::new(kind).with_format(format))
        },
    }
}

fn find_picture(field: &XmlElement) -> Option<Picture> {
    let from_format = field.child("format").and_then(|f| f.child("picture"));
    let from_ui = field
        .child("ui")
        .and_then(XmlElement::first_element)
        .and_then(|c| c.child("picture"));
    let from_validate = field.child("validate").and_then(|v| v.child("picture"));

    [from_format, from_ui, from_validate]
        .into_iter()
        .flatten()
        .find_map(|p| Picture::parse(&p.text()))
}

fn item_texts(items: &XmlElement) -> Vec<String> {
    items
        .elements()
        .map(|e| e.text().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// Display items come from the unsaved list; a `save="1"` list holds stored values.
fn choice_items(field: &XmlElement) -> (Vec<String>, IndexMap<String, String>) {
    let lists: Vec<&XmlElement> = field.children_named("items").collect();
    let saved = |e: &&XmlElement| e.attribute("save") == Some("1");

    let display = lists.iter().find(|e| !saved(e)).or_else(|| lists.first());
    let stored = lists.iter().find(|e| saved(e));

    let options = display.map(|e| item_texts(e)).unwrap_or_default();
    let mut value_map = IndexMap::new();
    if let (Some(display), Some(stored)) = (display, stored) {
        if !std::ptr::eq(*display, *stored) {
            for (caption, value) in item_texts(display).into_iter().zip(item_texts(stored)) {
                if caption != value {
                    value_map.insert(caption, value);
                }
            }
        }
    }
    (options, value_map)
}

fn caption_text(control: &XmlElement) -> Option<String> {
    let value = control.child("caption")?.child("value")?;
    let text = value.first_element().map(XmlElement::text).unwrap_or_else(|| value.text());
    Some(text.trim().to_string()).filter(|t| !t.is_empty())
}

fn member_value(member: &XmlElement) -> Option<String> {
    let from_items = member
        .child("items")
        .map(item_texts)
        .and_then(|texts| texts.into_iter().next());
    let from_value = || {
        member
            .child("value")
            .and_then(XmlElement::first_element)
            .map(|e| e.text().trim().to_string())
            .filter(|t| !t.is_empty())
    };
    from_items.or_else(from_value)
}

// Members may sit inside unnamed or unbound subforms of the group.
fn radio_members<'a>(element: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    for child in element.elements() {
        if child.local_name() == "field" {
            out.push(child);
        } else if binding_of(child) == Binding::Transparent {
            radio_members(child, out);
        }
    }
}

fn classify_radio(group: &XmlElement) -> Option<FieldTypeDescriptor> {
    let mut options = Vec::new();
    let mut value_map = IndexMap::new();

    let mut members = Vec::new();
    radio_members(group, &mut members);
    for member in members {
        let name = member.attribute("name").map(str::trim).filter(|n| !n.is_empty());
        let Some(label) = caption_text(member).or_else(|| name.map(str::to_string)) else {
            continue;
        };
        let value = member_value(member).or_else(|| name.map(str::to_string));
        if let Some(value) = value.filter(|v| *v != label) {
            value_map.insert(label.clone(), value);
        }
        options.push(label);
    }

    if options.is_empty() {
        return None;
    }
    Some(
        FieldTypeDescriptor::new(FieldKind::Radio)
            .with_options(options)
            .with_value_map(value_map),
    )
}
