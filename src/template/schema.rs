//! Name-only view of the binding hierarchy, used to validate injection paths.

use super::binding::{BindingKind, BindingNode};
use crate::error::{Error, Result};
use crate::path::JsonPath;
use indexmap::IndexMap;

/// A node of the template schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaNode {
    /// Bound children by data name
    pub children: IndexMap<String, SchemaNode>,
    /// Whether the node may hold children
    pub container: bool,
}

impl SchemaNode {
    fn leaf() -> Self {
        Self {
            children: IndexMap::new(),
            container: false,
        }
    }

    fn from_binding(node: &BindingNode<'_>) -> Self {
        match &node.kind {
            BindingKind::Container(groups) => {
                let mut out = Self {
                    children: IndexMap::new(),
                    container: true,
                };
                // every occurrence contributes its children
                for group in groups {
                    for occurrence in &group.occurrences {
                        let child = Self::from_binding(occurrence);
                        match out.children.get_mut(&group.name) {
                            Some(existing) => existing.merge(child),
                            None => {
                                out.children.insert(group.name.clone(), child);
                            },
                        }
                    }
                }
                out
            },
            BindingKind::Field | BindingKind::ExclusiveGroup => Self::leaf(),
        }
    }

    fn merge(&mut self, other: SchemaNode) {
        self.container |= other.container;
        for (name, child) in other.children {
            match self.children.get_mut(&name) {
                Some(existing) => existing.merge(child),
                None => {
                    self.children.insert(name, child);
                },
            }
        }
    }
}

/// The set of data names a template can bind, by container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSchema {
    /// Root binding name
    pub base_tag: String,
    /// Root container
    pub root: SchemaNode,
}

impl TemplateSchema {
    /// Build from a resolved binding hierarchy.
    pub fn from_bindings(root: &BindingNode<'_>) -> Self {
        Self {
            base_tag: root.name.clone(),
            root: SchemaNode::from_binding(root),
        }
    }

    /// Check that every intermediate segment of `path` names a container
    /// the template defines at that position.
    ///
    /// The final segment is not checked: unknown leaves are written as
    /// plain elements.
    pub fn validate(&self, path: &JsonPath) -> Result<()> {
        let (first, rest) = path
            .segments
            .split_first()
            .ok_or_else(|| Error::InvalidPath("empty field path".to_string()))?;
        if first.key != self.base_tag {
            return Err(Error::BaseTagMismatch {
                expected: self.base_tag.clone(),
                found: first.key.clone(),
            });
        }

        let intermediates = rest.len().saturating_sub(1);
        let mut node = &self.root;
        for segment in &rest[..intermediates] {
            node = match node.children.get(&segment.key) {
                Some(child) if child.container => child,
                _ => {
                    log::warn!("Path {} is not defined by the template", path);
                    return Err(Error::PathNotFoundInSchema {
                        path: path.to_string(),
                    });
                },
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::XfaTemplate;

    fn schema() -> TemplateSchema {
        let xml = r#"<template>
            <subform name="form1">
                <subform name="Name"><field name="First"/><field name="Last"/></subform>
                <subform name="Items"><occur max="-1"/><field name="Qty"/></subform>
                <subform name="Items"><occur max="-1"/><field name="Price"/></subform>
                <field name="Total"/>
            </subform>
        </template>"#;
        XfaTemplate::parse(xml.as_bytes()).unwrap().schema()
    }

    #[test]
    fn test_occurrences_are_merged() {
        let schema = schema();
        let items = &schema.root.children["Items"];
        assert!(items.container);
        assert!(items.children.contains_key("Qty"));
        assert!(items.children.contains_key("Price"));
    }

    #[test]
    fn test_validate_known_paths() {
        let schema = schema();
        for path in ["form1.Name.First", "form1.Items[4].Price", "form1.Total", "form1.Unknown"] {
            assert!(schema.validate(&path.parse().unwrap()).is_ok(), "{}", path);
        }
    }

    #[test]
    fn test_validate_rejects_unknown_intermediate() {
        let schema = schema();
        for path in ["form1.Address.Street", "form1.Total.Nested", "form1.Name.First.Deeper"] {
            assert!(
                matches!(
                    schema.validate(&path.parse().unwrap()),
                    Err(Error::PathNotFoundInSchema { .. })
                ),
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_validate_checks_base_tag() {
        assert!(matches!(
            schema().validate(&"other.Name.First".parse().unwrap()),
            Err(Error::BaseTagMismatch { .. })
        ));
    }
}
