//! Skeletons derived from existing data when no template is available.

use super::{DataDocument, DataFlavor};
use crate::config::MapperConfig;
use crate::template::Skeleton;
use crate::tree::{FieldTree, Tree};
use crate::xml::XmlElement;
use indexmap::IndexMap;

/// Derive a skeleton from the structure of a data tree.
///
/// An element is a leaf when it has no element children or carries
/// non-blank text; same-named siblings become a repeating group. Returns
/// `None` when the tree has no base element.
pub fn data_skeleton(doc: &DataDocument, config: &MapperConfig) -> Option<Skeleton> {
    let base = doc.base()?;
    let base_tag = doc.base_tag()?.to_string();
    let deriver = Deriver {
        flavor: doc.flavor(),
        config,
    };
    let fields = deriver.container(base);
    log::debug!(
        "Derived {} field(s) under {} from data",
        fields.leaf_count(),
        base_tag
    );
    Some(Skeleton::new(base_tag, &fields))
}

struct Deriver<'c> {
    flavor: DataFlavor,
    config: &'c MapperConfig,
}

impl Deriver<'_> {
    fn container(&self, element: &XmlElement) -> FieldTree {
        let mut grouped: IndexMap<String, Vec<FieldTree>> = IndexMap::new();
        for child in element.elements() {
            if self.config.skip_data_groups && child.attribute_local("dataNode") == Some("dataGroup") {
                continue;
            }
            let Some(key) = self.flavor.key_of(child) else {
                continue;
            };
            let shape = if self.is_leaf(child) {
                if self.config.is_excluded_leaf(key) {
                    continue;
                }
                FieldTree::empty_leaf()
            } else {
                self.container(child)
            };
            grouped.entry(key.to_string()).or_default().push(shape);
        }

        Tree::Node(
            grouped
                .into_iter()
                .map(|(key, mut shapes)| {
                    let entry = if shapes.len() == 1 {
                        shapes.remove(0)
                    } else {
                        Tree::Repeat(shapes)
                    };
                    (key, entry)
                })
                .collect(),
        )
    }

    fn is_leaf(&self, element: &XmlElement) -> bool {
        match self.flavor {
            DataFlavor::Datasets => {
                !element.has_element_children() || !element.text().trim().is_empty()
            },
            DataFlavor::Form => element.local_name() != "subform" && element.local_name() != "subformSet",
        }
    }
}
