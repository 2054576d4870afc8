//! Writing field-tree values into a data tree.

use super::{DataDocument, DataFlavor};
use crate::config::MapperConfig;
use crate::error::{Error, Result};
use crate::path::{to_xfa_path_checked, JsonPath, JsonSegment, XfaPath, XfaSegment};
use crate::template::TemplateSchema;
use crate::tree::{FieldTree, Tree};
use crate::xml::XmlElement;

/// Counters reported by one injection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectStats {
    /// Leaf values written
    pub leaves_written: usize,
    /// Elements created, backfilled occurrences included
    pub elements_created: usize,
}

/// Writes field trees into `datasets` or `form` data trees.
#[derive(Debug, Clone, Default)]
pub struct ValueInjector {
    config: MapperConfig,
}

impl ValueInjector {
    /// Injector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injector with the given configuration.
    pub fn with_config(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Write every leaf of `fields` into `doc`.
    ///
    /// `fields` must be rooted at `base_tag`. When `schema` is given, every
    /// path is checked against it first. Paths are all translated before
    /// the tree is touched, and a failure leaves `doc` unchanged.
    pub fn inject(
        &self,
        doc: &mut DataDocument,
        base_tag: &str,
        fields: &FieldTree,
        schema: Option<&TemplateSchema>,
    ) -> Result<InjectStats> {
        let (root_key, body) = fields.split_root()?;
        if root_key != base_tag {
            return Err(Error::BaseTagMismatch {
                expected: base_tag.to_string(),
                found: root_key.to_string(),
            });
        }
        if !matches!(body, Tree::Node(_)) {
            return Err(Error::InvalidFieldTree(format!(
                "'{}' must map to an object",
                base_tag
            )));
        }

        let mut leaves = Vec::with_capacity(body.leaf_count());
        collect_leaves(body, &JsonPath::root(base_tag), &mut leaves);
        let writes = leaves
            .into_iter()
            .map(|(path, value)| Ok((to_xfa_path_checked(&path, base_tag, schema)?, value)))
            .collect::<Result<Vec<(XfaPath, &str)>>>()?;
        doc.check_base_tag(base_tag)?;

        let mut staged = doc.clone();
        let flavor = staged.flavor();
        let override_value = self.config.form_value_override;
        let mut stats = InjectStats::default();
        let base = staged.ensure_base(base_tag)?;

        for (path, value) in &writes {
            let target = locate_or_create(base, path.below_base(), flavor, &mut stats)
                .ok_or_else(|| Error::Xml(format!("could not materialize {}", path)))?;
            flavor.write_value(target, value, override_value);
            stats.leaves_written += 1;
        }

        *doc = staged;
        log::debug!(
            "Injected {} value(s) under {}, created {} element(s)",
            stats.leaves_written,
            base_tag,
            stats.elements_created
        );
        Ok(stats)
    }
}

/// Inject with default configuration and no template check.
pub fn inject(doc: &mut DataDocument, base_tag: &str, fields: &FieldTree) -> Result<InjectStats> {
    ValueInjector::new().inject(doc, base_tag, fields, None)
}

fn collect_leaves<'t>(tree: &'t FieldTree, path: &JsonPath, out: &mut Vec<(JsonPath, &'t str)>) {
    match tree {
        Tree::Leaf(value) => out.push((path.clone(), value.as_str())),
        Tree::Node(map) => {
            for (key, child) in map {
                match child {
                    Tree::Repeat(items) => {
                        for (i, item) in items.iter().enumerate() {
                            collect_leaves(item, &path.child(JsonSegment::indexed(key, i)), out);
                        }
                    },
                    _ => collect_leaves(child, &path.child(JsonSegment::key(key)), out),
                }
            }
        },
        // A repeat directly inside a repeat cannot come out of the JSON boundary.
        Tree::Repeat(items) => {
            for item in items {
                collect_leaves(item, path, out);
            }
        },
    }
}

// Walks `segments` below `parent`. Missing occurrences are appended after the
// last same-named sibling, backfilling 1..N.
fn locate_or_create<'e>(
    parent: &'e mut XmlElement,
    segments: &[XfaSegment],
    flavor: DataFlavor,
    stats: &mut InjectStats,
) -> Option<&'e mut XmlElement> {
    let mut current = parent;
    for (depth, segment) in segments.iter().enumerate() {
        let leaf = depth + 1 == segments.len();
        let positions = current.element_positions(|e| flavor.matches(e, &segment.name));

        let position = match positions.get(segment.occurrence.checked_sub(1)?) {
            Some(&position) => position,
            None => {
                let mut insert_at = positions
                    .last()
                    .map(|p| p + 1)
                    .unwrap_or(current.children.len());
                let mut created = insert_at;
                for _ in positions.len()..segment.occurrence {
                    created = current.insert_element(insert_at, flavor.new_node(&segment.name, leaf));
                    insert_at = created + 1;
                    stats.elements_created += 1;
                }
                log::debug!(
                    "Created <{}> up to occurrence {}",
                    segment.name,
                    segment.occurrence
                );
                created
            },
        };
        current = current.element_at_mut(position)?;
    }
    Some(current)
}
