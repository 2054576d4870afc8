//! Binding hierarchy of a template.

use crate::path::{key_path, JsonPath, JsonSegment};
use crate::tree::Tree;
use crate::xml::XmlElement;
use indexmap::{IndexMap, IndexSet};

/// How a template element takes part in data binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Binding {
    /// Binds to a data node with this name
    Named(String),
    /// Creates no data node; children bind to the enclosing container
    Transparent,
    /// Never binds
    Skipped,
}

/// Kind of a bound template node.
#[derive(Debug, Clone)]
pub enum BindingKind<'a> {
    /// `subform`: nested bound children, grouped by name
    Container(Vec<BindingGroup<'a>>),
    /// `field`: one value
    Field,
    /// `exclGroup`: one value chosen among member controls
    ExclusiveGroup,
}

/// A bound template node.
#[derive(Debug, Clone)]
pub struct BindingNode<'a> {
    /// Data name the node binds to
    pub name: String,
    /// Template element
    pub element: &'a XmlElement,
    /// Container or leaf kind
    pub kind: BindingKind<'a>,
    /// Declared repeatable through `<occur max>`
    pub repeating: bool,
}

/// Siblings binding to the same name, in document order.
#[derive(Debug, Clone)]
pub struct BindingGroup<'a> {
    /// Shared data name
    pub name: String,
    /// Each physically present occurrence
    pub occurrences: Vec<BindingNode<'a>>,
}

impl<'a> BindingNode<'a> {
    pub(crate) fn root(name: &str, element: &'a XmlElement) -> Self {
        Self {
            name: name.to_string(),
            element,
            kind: BindingKind::Container(container_groups(element)),
            repeating: false,
        }
    }

    /// Whether this node holds a single value.
    pub fn is_leaf(&self) -> bool {
        !matches!(self.kind, BindingKind::Container(_))
    }

    /// Fold the hierarchy into a tree, calling `leaf` for every bound leaf.
    ///
    /// Groups with one occurrence become a plain entry; groups with more
    /// become a repeat. `path` is the JSON path of `self`.
    pub fn shape<L, F>(&self, path: &JsonPath, leaf: &mut F) -> Tree<L>
    where
        F: FnMut(&BindingNode<'a>, &JsonPath) -> L,
    {
        match &self.kind {
            BindingKind::Container(groups) => {
                let mut map = IndexMap::with_capacity(groups.len());
                for group in groups {
                    let entry = match group.occurrences.as_slice() {
                        [single] => single.shape(&path.child(JsonSegment::key(&group.name)), &mut *leaf),
                        many => Tree::Repeat(
                            many.iter()
                                .enumerate()
                                .map(|(i, occurrence)| {
                                    let child = path.child(JsonSegment::indexed(&group.name, i));
                                    occurrence.shape(&child, &mut *leaf)
                                })
                                .collect(),
                        ),
                    };
                    map.insert(group.name.clone(), entry);
                }
                Tree::Node(map)
            },
            BindingKind::Field | BindingKind::ExclusiveGroup => Tree::Leaf(leaf(self, path)),
        }
    }

    /// Dotted key paths below `self` of every group declared repeating.
    pub fn repeating_paths(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        self.collect_repeating("", &mut out);
        out
    }

    fn collect_repeating(&self, at: &str, out: &mut IndexSet<String>) {
        let BindingKind::Container(groups) = &self.kind else {
            return;
        };
        for group in groups {
            let path = key_path(at, &group.name);
            if group.occurrences.iter().any(|o| o.repeating) {
                out.insert(path.clone());
            }
            for occurrence in &group.occurrences {
                occurrence.collect_repeating(&path, out);
            }
        }
    }
}

fn container_groups(element: &XmlElement) -> Vec<BindingGroup<'_>> {
    let mut grouped: IndexMap<String, Vec<BindingNode<'_>>> = IndexMap::new();
    collect_bound_children(element, &mut grouped);

    grouped
        .into_iter()
        .map(|(name, occurrences)| {
            if occurrences.len() > 1 && !occurrences.iter().any(|o| o.repeating) {
                log::warn!(
                    "{} siblings bind to '{}' without an <occur> declaration; treating as repeat",
                    occurrences.len(),
                    name
                );
            }
            BindingGroup { name, occurrences }
        })
        .collect()
}

fn collect_bound_children<'a>(
    element: &'a XmlElement,
    out: &mut IndexMap<String, Vec<BindingNode<'a>>>,
) {
    for child in element.elements() {
        match binding_of(child) {
            Binding::Named(name) => {
                let kind = match child.local_name() {
                    "subform" => BindingKind::Container(container_groups(child)),
                    "exclGroup" => BindingKind::ExclusiveGroup,
                    _ => BindingKind::Field,
                };
                let node = BindingNode {
                    name: name.clone(),
                    element: child,
                    kind,
                    repeating: is_repeating(child),
                };
                out.entry(name).or_default().push(node);
            },
            Binding::Transparent => collect_bound_children(child, out),
            Binding::Skipped => {},
        }
    }
}

pub(crate) fn binding_of(element: &XmlElement) -> Binding {
    let bind = element.child("bind");
    let bind_match = bind.and_then(|b| b.attribute("match")).unwrap_or("once");
    let ref_name = bind
        .filter(|_| bind_match == "dataRef")
        .and_then(|b| b.attribute("ref"))
        .and_then(ref_target_name);
    let name = ref_name.or_else(|| {
        element
            .attribute("name")
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
    });

    match element.local_name() {
        "subform" => match name {
            Some(name) if bind_match != "none" => Binding::Named(name),
            _ => Binding::Transparent,
        },
        "subformSet" | "area" => Binding::Transparent,
        "field" if is_presentation_only(element) => Binding::Skipped,
        "field" | "exclGroup" => match name {
            Some(name) if bind_match != "none" => Binding::Named(name),
            _ => Binding::Skipped,
        },
        _ => Binding::Skipped,
    }
}

fn is_presentation_only(field: &XmlElement) -> bool {
    field
        .child("ui")
        .and_then(XmlElement::first_element)
        .is_some_and(|ui| matches!(ui.local_name(), "button" | "signature"))
}

fn is_repeating(element: &XmlElement) -> bool {
    let Some(max) = element.child("occur").and_then(|o| o.attribute("max")) else {
        return false;
    };
    match max.trim().parse::<i64>() {
        Ok(n) => n == -1 || n > 1,
        Err(_) => false,
    }
}

// "$.Page1.Items[*]" -> "Items"
fn ref_target_name(reference: &str) -> Option<String> {
    let last = reference.rsplit('.').next()?;
    let last = match last.find('[') {
        Some(i) => &last[..i],
        None => last,
    };
    let last = last.trim_start_matches(['$', '!']).trim();
    if last.is_empty() || last == "record" {
        None
    } else {
        Some(last.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    fn parse(xml: &str) -> XmlElement {
        XmlDocument::parse_str(xml).unwrap().root
    }

    fn group_names(node: &BindingNode<'_>) -> Vec<String> {
        match &node.kind {
            BindingKind::Container(groups) => groups.iter().map(|g| g.name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_transparent_and_skipped_nodes() {
        let root = parse(
            r#"<subform name="form1">
                <pageSet><pageArea name="Page1"><field name="Header"/></pageArea></pageSet>
                <subform>
                    <field name="Lifted"/>
                </subform>
                <subform name="Hidden"><bind match="none"/><field name="AlsoLifted"/></subform>
                <draw name="Label"/>
                <field name="Save"><ui><button/></ui></field>
                <field name="Sign"><ui><signature/></ui></field>
                <field name="Unbound"><bind match="none"/></field>
                <field><ui><textEdit/></ui></field>
                <exclGroup name="Choice"><field name="Yes"/><field name="No"/></exclGroup>
            </subform>"#,
        );
        let node = BindingNode::root("form1", &root);
        assert_eq!(group_names(&node), vec!["Lifted", "AlsoLifted", "Choice"]);
    }

    #[test]
    fn test_data_ref_binding() {
        let field = parse(r#"<field name="Display"><bind match="dataRef" ref="$.Applicant.Surname"/></field>"#);
        assert_eq!(binding_of(&field), Binding::Named("Surname".to_string()));

        let rows = parse(r#"<subform name="Row"><bind match="dataRef" ref="$.Rows[*]"/></subform>"#);
        assert_eq!(binding_of(&rows), Binding::Named("Rows".to_string()));
    }

    #[test]
    fn test_repeating_detection() {
        assert!(is_repeating(&parse(r#"<subform name="a"><occur max="-1"/></subform>"#)));
        assert!(is_repeating(&parse(r#"<subform name="a"><occur max="5"/></subform>"#)));
        assert!(!is_repeating(&parse(r#"<subform name="a"><occur max="1"/></subform>"#)));
        assert!(!is_repeating(&parse(r#"<subform name="a"/>"#)));
    }

    #[test]
    fn test_repeating_paths() {
        let root = parse(
            r#"<subform name="form1">
                <subform name="Items"><occur max="-1"/>
                    <subform name="Notes"><occur max="3"/><field name="Text"/></subform>
                    <field name="Qty"/>
                </subform>
                <subform><subform name="Lifted"><occur max="2"/><field name="A"/></subform></subform>
                <subform name="Single"><field name="B"/></subform>
            </subform>"#,
        );
        let paths: Vec<String> = BindingNode::root("form1", &root).repeating_paths().into_iter().collect();
        assert_eq!(paths, vec!["Items", "Items.Notes", "Lifted"]);
    }

    #[test]
    fn test_same_named_siblings_are_grouped() {
        let root = parse(
            r#"<subform name="form1">
                <subform name="Items"><occur max="-1"/><field name="Qty"/></subform>
                <field name="Total"/>
                <subform name="Items"><occur max="-1"/><field name="Qty"/></subform>
            </subform>"#,
        );
        let node = BindingNode::root("form1", &root);
        match &node.kind {
            BindingKind::Container(groups) => {
                assert_eq!(groups.len(), 2);
                assert_eq!(groups[0].name, "Items");
                assert_eq!(groups[0].occurrences.len(), 2);
                assert!(groups[0].occurrences[0].repeating);
            },
            _ => panic!("root must be a container"),
        }
    }
}
