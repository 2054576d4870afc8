//! Element and node types.

/// Strip a namespace prefix from a qualified name (`xfa:data` -> `data`).
pub fn local_name(qname: &str) -> &str {
    match qname.rsplit_once(':') {
        Some((_, local)) => local,
        None => qname,
    }
}

/// A node in an element's child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Nested element
    Element(XmlElement),
    /// Character data (unescaped)
    Text(String),
    /// CDATA section content
    CData(String),
    /// Comment content
    Comment(String),
    /// Processing instruction content
    ProcessingInstruction(String),
}

impl XmlNode {
    /// Borrow the element if this node is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Mutably borrow the element if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    fn is_character_data(&self) -> bool {
        matches!(self, XmlNode::Text(_) | XmlNode::CData(_))
    }
}

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written (may carry a prefix)
    pub name: String,
    /// Attributes in document order (qualified key, unescaped value)
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`XmlElement::set_attribute`].
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Attribute by exact qualified key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute by local key, ignoring prefix. Namespace declarations never match.
    pub fn attribute_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .filter(|(k, _)| k != "xmlns" && !k.starts_with("xmlns:"))
            .find(|(k, _)| local_name(k) == local)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute, keeping its original position.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Mutable child elements in document order.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// First child element, whatever its name.
    pub fn first_element(&self) -> Option<&XmlElement> {
        self.elements().next()
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    /// First child element with the given local name, mutably.
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.local_name() == local)
    }

    /// First descendant (depth-first, excluding self) with the given local name.
    pub fn descendant(&self, local: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.local_name() == local {
                return Some(child);
            }
            if let Some(found) = child.descendant(local) {
                return Some(found);
            }
        }
        None
    }

    /// Whether any child node is an element.
    pub fn has_element_children(&self) -> bool {
        self.elements().next().is_some()
    }

    /// Node indices of child elements accepted by `pred`, in document order.
    pub fn element_positions<F>(&self, pred: F) -> Vec<usize>
    where
        F: Fn(&XmlElement) -> bool,
    {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                XmlNode::Element(e) if pred(e) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Element stored at a node index.
    pub fn element_at(&self, position: usize) -> Option<&XmlElement> {
        self.children.get(position).and_then(XmlNode::as_element)
    }

    /// Element stored at a node index, mutably.
    pub fn element_at_mut(&mut self, position: usize) -> Option<&mut XmlElement> {
        self.children
            .get_mut(position)
            .and_then(XmlNode::as_element_mut)
    }

    /// Insert an element at a node index and return its position.
    pub fn insert_element(&mut self, position: usize, element: XmlElement) -> usize {
        let position = position.min(self.children.len());
        self.children.insert(position, XmlNode::Element(element));
        position
    }

    /// Append an element and return its position.
    pub fn push_element(&mut self, element: XmlElement) -> usize {
        self.children.push(XmlNode::Element(element));
        self.children.len() - 1
    }

    /// Concatenated direct text and CDATA content.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                _ => {},
            }
        }
        out
    }

    /// Replace all direct character data with `value`. Child elements are kept.
    pub fn set_text(&mut self, value: &str) {
        self.children.retain(|n| !n.is_character_data());
        if !value.is_empty() {
            self.children.insert(0, XmlNode::Text(value.to_string()));
        }
    }
}
