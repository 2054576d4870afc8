//! Reading values out of a data tree in the shape of a skeleton.

use super::{DataDocument, DataFlavor};
use crate::config::MapperConfig;
use crate::error::Result;
use crate::path::{key_path, JsonSegment, XfaSegment};
use crate::template::{build_skeleton, classify, Skeleton, TypeTree, XfaTemplate};
use crate::tree::{FieldTree, Tree};
use crate::xml::XmlElement;
use indexmap::{IndexMap, IndexSet};

/// Reads field trees from `datasets` or `form` data trees.
#[derive(Debug, Clone, Default)]
pub struct ValueExtractor {
    config: MapperConfig,
}

impl ValueExtractor {
    /// Extractor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor with the given configuration.
    pub fn with_config(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Fill the shape of `skeleton` with the values found in `doc`.
    ///
    /// Missing elements read as empty strings. Repeating groups follow the
    /// data: occurrences beyond the skeleton's count are emitted with the
    /// shape of the matching skeleton occurrence (or the first one), unless
    /// `extend_repeats` is off. A single-occurrence group the skeleton marks
    /// repeating becomes a sequence once the data holds more than one match.
    /// Fails only when `doc` is rooted at another base tag.
    pub fn extract(&self, doc: &DataDocument, skeleton: &Skeleton) -> Result<FieldTree> {
        doc.check_base_tag(&skeleton.base_tag)?;
        let walker = Walker {
            flavor: doc.flavor(),
            extend_repeats: self.config.extend_repeats,
            trim_values: self.config.trim_values,
            repeating: &skeleton.repeating,
        };
        let body = walker.walk(&skeleton.fields, doc.base(), "");
        Ok(Tree::rooted(skeleton.base_tag.clone(), body))
    }

    /// Extract with the skeleton derived from `template`.
    ///
    /// Stored choice codes are turned back into captions when
    /// `decode_choice_values` is on.
    pub fn extract_with_template(&self, doc: &DataDocument, template: &XfaTemplate) -> Result<FieldTree> {
        let mut values = self.extract(doc, &build_skeleton(template))?;
        if self.config.decode_choice_values {
            decode_choices(&mut values, &classify(template));
        }
        Ok(values)
    }
}

/// Extract with default configuration.
pub fn extract(doc: &DataDocument, skeleton: &Skeleton) -> Result<FieldTree> {
    ValueExtractor::new().extract(doc, skeleton)
}

/// Replace stored radio and select codes in `values` by their captions.
///
/// `types` is the classified tree of the same form. Repeat occurrences
/// beyond the classified count use the first occurrence's types; leaves
/// with no resolved type are left alone.
pub fn decode_choices(values: &mut FieldTree, types: &TypeTree) {
    match (values, types) {
        (Tree::Leaf(value), Tree::Leaf(field_type)) => {
            let decoded = field_type
                .descriptor()
                .and_then(|d| d.display_value(value.as_str()));
            if let Some(caption) = decoded {
                log::trace!("decoded stored value {:?} as {:?}", value, caption);
                *value = caption;
            }
        },
        (Tree::Node(map), Tree::Node(type_map)) => {
            for (key, child) in map.iter_mut() {
                if let Some(child_types) = type_map.get(key) {
                    decode_choices(child, child_types);
                }
            }
        },
        (Tree::Repeat(items), Tree::Repeat(type_items)) => {
            for (index, item) in items.iter_mut().enumerate() {
                if let Some(item_types) = type_items.get(index).or_else(|| type_items.first()) {
                    decode_choices(item, item_types);
                }
            }
        },
        // a group that repeats in the data but not in the template
        (Tree::Repeat(items), other) => {
            for item in items.iter_mut() {
                decode_choices(item, other);
            }
        },
        _ => {},
    }
}

struct Walker<'s> {
    flavor: DataFlavor,
    extend_repeats: bool,
    trim_values: bool,
    repeating: &'s IndexSet<String>,
}

impl Walker<'_> {
    // `at` is the dotted key path of `shape` below the base tag
    fn walk(&self, shape: &FieldTree, element: Option<&XmlElement>, at: &str) -> FieldTree {
        match shape {
            Tree::Leaf(_) => Tree::Leaf(element.map(|e| self.leaf_value(e)).unwrap_or_default()),
            Tree::Node(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, child_shape) in map {
                    let child_at = key_path(at, key);
                    let value = match child_shape {
                        Tree::Repeat(items) => self.walk_repeat(key, items, element, &child_at),
                        _ if self.repeats_in_data(&child_at, key, element) => {
                            self.walk_repeat(key, std::slice::from_ref(child_shape), element, &child_at)
                        },
                        _ => {
                            let child = element.and_then(|e| self.first_match(e, key));
                            self.walk(child_shape, child, &child_at)
                        },
                    };
                    out.insert(key.clone(), value);
                }
                Tree::Node(out)
            },
            Tree::Repeat(items) => {
                Tree::Repeat(items.iter().map(|i| self.walk(i, element, at)).collect())
            },
        }
    }

    fn walk_repeat(
        &self,
        key: &str,
        items: &[FieldTree],
        parent: Option<&XmlElement>,
        at: &str,
    ) -> FieldTree {
        let present: Vec<&XmlElement> = parent
            .map(|p| p.elements().filter(|e| self.flavor.matches(e, key)).collect())
            .unwrap_or_default();
        let count = if self.extend_repeats {
            items.len().max(present.len())
        } else {
            items.len()
        };
        if present.len() > items.len() {
            log::debug!(
                "{} has {} occurrence(s) in data, {} in skeleton",
                at,
                present.len(),
                items.len()
            );
        }

        let mut out = Vec::with_capacity(count);
        for index in 0..count {
            // an empty skeleton repeat has no occurrence shape to extend with
            let Some(shape) = items.get(index).or_else(|| items.first()) else {
                break;
            };
            let segment = XfaSegment::from(&JsonSegment::indexed(key, index));
            let element = present.get(segment.occurrence - 1).copied();
            out.push(self.walk(shape, element, at));
        }
        Tree::Repeat(out)
    }

    fn repeats_in_data(&self, at: &str, key: &str, parent: Option<&XmlElement>) -> bool {
        self.extend_repeats
            && self.repeating.contains(at)
            && parent.is_some_and(|p| p.elements().filter(|e| self.flavor.matches(e, key)).nth(1).is_some())
    }

    fn leaf_value(&self, element: &XmlElement) -> String {
        let value = self.flavor.read_value(element);
        if self.trim_values {
            value.trim().to_string()
        } else {
            value
        }
    }

    fn first_match<'e>(&self, parent: &'e XmlElement, key: &str) -> Option<&'e XmlElement> {
        parent.elements().find(|e| self.flavor.matches(e, key))
    }
}
