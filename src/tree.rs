//! Field trees: the JSON-shaped side of the mapping.
//!
//! A [`Tree`] is a recursive tagged variant. Leaves carry a payload (the
//! field value for a [`FieldTree`], a type descriptor for a classified
//! tree), nodes are ordered maps, and repeats are ordered sequences whose
//! position is the zero-based occurrence index.
//!
//! The JSON wire format is checked once, in [`FieldTree::from_json`], so
//! the rest of the crate never needs to inspect dynamic JSON values.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Recursive field structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Tree<L> {
    /// Terminal value
    Leaf(L),
    /// Ordered mapping from key to subtree
    Node(IndexMap<String, Tree<L>>),
    /// Repeating group; position is the zero-based index
    Repeat(Vec<Tree<L>>),
}

/// Field tree with string leaves (the value wire format).
pub type FieldTree = Tree<String>;

impl<L> Tree<L> {
    /// Empty node.
    pub fn node() -> Self {
        Tree::Node(IndexMap::new())
    }

    /// Wrap `body` under a single top-level key.
    pub fn rooted(base_tag: impl Into<String>, body: Tree<L>) -> Self {
        let mut map = IndexMap::new();
        map.insert(base_tag.into(), body);
        Tree::Node(map)
    }

    /// Split a rooted tree into its sole top-level key and body.
    pub fn split_root(&self) -> Result<(&str, &Tree<L>)> {
        match self {
            Tree::Node(map) if map.len() == 1 => {
                let (key, body) = map.first().ok_or_else(|| {
                    Error::InvalidFieldTree("expected a single top-level key".to_string())
                })?;
                Ok((key.as_str(), body))
            },
            Tree::Node(map) => Err(Error::InvalidFieldTree(format!(
                "expected a single top-level key, found {}",
                map.len()
            ))),
            _ => Err(Error::InvalidFieldTree("top level must be an object".to_string())),
        }
    }

    /// Child of a node by key.
    pub fn get(&self, key: &str) -> Option<&Tree<L>> {
        match self {
            Tree::Node(map) => map.get(key),
            _ => None,
        }
    }

    /// Leaf payload, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Tree::Leaf(v) => Some(v),
            _ => None,
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Node(map) => map.values().map(Tree::leaf_count).sum(),
            Tree::Repeat(items) => items.iter().map(Tree::leaf_count).sum(),
        }
    }

    /// Same shape with every leaf replaced by `f(leaf)`.
    pub fn map_leaves<M, F>(&self, f: &mut F) -> Tree<M>
    where
        F: FnMut(&L) -> M,
    {
        match self {
            Tree::Leaf(v) => Tree::Leaf(f(v)),
            Tree::Node(map) => Tree::Node(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.map_leaves(&mut *f)))
                    .collect(),
            ),
            Tree::Repeat(items) => Tree::Repeat(items.iter().map(|t| t.map_leaves(&mut *f)).collect()),
        }
    }

    /// Whether two trees have the same keys, repeat lengths and leaf positions.
    pub fn same_shape<M>(&self, other: &Tree<M>) -> bool {
        match (self, other) {
            (Tree::Leaf(_), Tree::Leaf(_)) => true,
            (Tree::Node(a), Tree::Node(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_shape(vb))
            },
            (Tree::Repeat(a), Tree::Repeat(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_shape(y))
            },
            _ => false,
        }
    }
}

impl FieldTree {
    /// Empty-string leaf.
    pub fn empty_leaf() -> Self {
        Tree::Leaf(String::new())
    }

    /// Same shape with every leaf reset to the empty string.
    pub fn blanked(&self) -> Self {
        self.map_leaves(&mut |_| String::new())
    }

    /// Build a field tree from its JSON wire format.
    ///
    /// Objects become nodes, arrays repeats and strings leaves; `null`
    /// is read as an empty leaf. Numbers, booleans and arrays nested
    /// directly in arrays are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::from_json_at(value, "$")
    }

    fn from_json_at(value: &Value, at: &str) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Tree::Leaf(s.clone())),
            Value::Null => Ok(Tree::Leaf(String::new())),
            Value::Object(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, child) in map {
                    if key.is_empty() {
                        return Err(Error::InvalidFieldTree(format!("empty key under {}", at)));
                    }
                    let child_at = format!("{}.{}", at, key);
                    out.insert(key.clone(), Self::from_json_at(child, &child_at)?);
                }
                Ok(Tree::Node(out))
            },
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_at = format!("{}[{}]", at, i);
                    if item.is_array() {
                        return Err(Error::InvalidFieldTree(format!(
                            "nested array at {} has no XFA equivalent",
                            item_at
                        )));
                    }
                    out.push(Self::from_json_at(item, &item_at)?);
                }
                Ok(Tree::Repeat(out))
            },
            Value::Number(_) | Value::Bool(_) => Err(Error::InvalidFieldTree(format!(
                "leaf at {} must be a string",
                at
            ))),
        }
    }

    /// Copy values from `other` into the empty leaves of `self`.
    ///
    /// Keys missing from `self` are not added. Repeat occurrences are
    /// merged by position and extra occurrences in `other` are appended;
    /// a repeat meeting a single occurrence merges with its first item.
    pub fn fill_blanks(&mut self, other: &FieldTree) {
        match (self, other) {
            (Tree::Leaf(value), Tree::Leaf(fallback)) => {
                if value.is_empty() {
                    value.clone_from(fallback);
                }
            },
            (Tree::Node(map), Tree::Node(others)) => {
                for (key, child) in map.iter_mut() {
                    if let Some(fallback) = others.get(key) {
                        child.fill_blanks(fallback);
                    }
                }
            },
            (Tree::Repeat(items), Tree::Repeat(others)) => {
                for (item, fallback) in items.iter_mut().zip(others) {
                    item.fill_blanks(fallback);
                }
                let have = items.len();
                items.extend(others.iter().skip(have).cloned());
            },
            (Tree::Repeat(items), single) => {
                if let Some(first) = items.first_mut() {
                    first.fill_blanks(single);
                }
            },
            (this, Tree::Repeat(others)) => {
                if let Some(first) = others.first() {
                    this.fill_blanks(first);
                }
            },
            _ => {},
        }
    }

    /// Parse a field tree from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }
}

impl<L: Serialize> Tree<L> {
    /// Convert to a JSON value.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
