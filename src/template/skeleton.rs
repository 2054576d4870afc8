//! Empty field-tree skeletons.

use super::XfaTemplate;
use crate::error::Result;
use crate::path::JsonPath;
use crate::tree::{FieldTree, Tree};
use indexmap::IndexSet;

/// The field structure of a form with every leaf empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    /// Root binding name
    pub base_tag: String,
    /// Fields below the base tag
    pub fields: FieldTree,
    /// Dotted key paths below the base tag (no indices) of groups the
    /// template declares repeating
    pub repeating: IndexSet<String>,
}

impl Skeleton {
    /// Create a skeleton; leaf values in `fields` are cleared.
    pub fn new(base_tag: impl Into<String>, fields: &FieldTree) -> Self {
        Self {
            base_tag: base_tag.into(),
            fields: fields.blanked(),
            repeating: IndexSet::new(),
        }
    }

    /// Skeleton with the shape of a rooted field tree.
    pub fn from_field_tree(tree: &FieldTree) -> Result<Self> {
        let (base_tag, body) = tree.split_root()?;
        Ok(Self::new(base_tag, body))
    }

    /// Whether the group at the dotted key path `path` may repeat.
    pub fn is_repeating(&self, path: &str) -> bool {
        self.repeating.contains(path)
    }

    /// Rooted field tree in wire shape.
    pub fn to_field_tree(&self) -> FieldTree {
        Tree::rooted(self.base_tag.clone(), self.fields.clone())
    }
}

/// Build the empty field tree mirroring a template's bound nodes.
pub fn build_skeleton(template: &XfaTemplate) -> Skeleton {
    let root = template.bindings();
    let fields = root.shape(&JsonPath::root(template.base_tag()), &mut |_, _| String::new());
    log::debug!(
        "Skeleton for {} has {} field(s)",
        template.base_tag(),
        fields.leaf_count()
    );
    Skeleton {
        base_tag: template.base_tag().to_string(),
        fields,
        repeating: root.repeating_paths(),
    }
}
