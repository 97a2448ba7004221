//! The generic tag tree
//!
//! A [`TagNode`] owns its children outright. There are no parent links, so
//! moving a node under a new parent means removing it from the old one first,
//! and a node can never end up inside its own subtree.

use crate::error::{FormatError, FormatErrorKind, Position};
use crate::validator::Cardinality;
use crate::value::Value;

/// One configuration element: `{name value child...}`
#[derive(Debug, Clone)]
pub struct TagNode {
    name: String,
    value: Value,
    children: Vec<TagNode>,
    position: Option<Position>,
    cardinality: Option<Cardinality>,
}

impl TagNode {
    /// Create a node. The name must be a valid identifier.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(is_identifier(&name), "invalid tag name `{}`", name);
        Self {
            name,
            value: Value::None,
            children: Vec::new(),
            position: None,
            cardinality: None,
        }
    }

    /// Create a node, rejecting names the format cannot represent
    pub fn try_new(name: impl Into<String>) -> Result<Self, FormatError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(FormatError::detached(FormatErrorKind::InvalidTagName(name)));
        }
        Ok(Self::new(name))
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_child(mut self, child: TagNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.value = value.into();
        self
    }

    /// Where the node's `{` appeared, for parsed nodes
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    /// Occurrence bounds from the schema position, if annotated
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.cardinality
    }

    pub fn set_cardinality(&mut self, cardinality: Option<Cardinality>) {
        self.cardinality = cardinality;
    }

    // =========================================================================
    // Children
    // =========================================================================

    pub fn children(&self) -> &[TagNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [TagNode] {
        &mut self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Append a new empty child and return it
    pub fn create_child(&mut self, name: impl Into<String>) -> &mut TagNode {
        self.append_child(TagNode::new(name))
    }

    /// Move a node in as the last child
    pub fn append_child(&mut self, child: TagNode) -> &mut TagNode {
        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TagNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&TagNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut TagNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Detach the child at `index`, handing ownership back to the caller
    pub fn remove_child(&mut self, index: usize) -> Option<TagNode> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    /// Detach every child with the given name
    pub fn remove_children_named(&mut self, name: &str) -> Vec<TagNode> {
        let (removed, kept) = std::mem::take(&mut self.children)
            .into_iter()
            .partition(|c| c.name == name);
        self.children = kept;
        removed
    }
}

/// Structural equality: name, value and children. Source positions and
/// cardinality annotations are ignored.
impl PartialEq for TagNode {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value && self.children == other.children
    }
}

/// Tag names: a letter or `_`, then letters, digits, `_`, `-` or `.`
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn test_create_child_preserves_order() {
        let mut root = TagNode::new("server");
        root.create_child("host").set_value(Scalar::from("localhost"));
        root.create_child("tag").set_value(Scalar::from("a"));
        root.create_child("tag").set_value(Scalar::from("b"));

        let names: Vec<&str> = root.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["host", "tag", "tag"]);

        let tags: Vec<String> = root
            .children_named("tag")
            .map(|c| c.value().items()[0].to_string())
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(root.children_named("missing").count(), 0);
    }

    #[test]
    fn test_child_mut_edits_first_match() {
        let mut root = TagNode::new("server")
            .with_child(TagNode::new("port").with_value(Scalar::from("80")))
            .with_child(TagNode::new("port").with_value(Scalar::from("81")));
        if let Some(port) = root.child_mut("port") {
            port.set_value(Scalar::from("8080"));
        }
        let ports: Vec<String> = root.children_named("port").map(|c| c.value().items()[0].to_string()).collect();
        assert_eq!(ports, vec!["8080", "81"]);
        assert!(root.child_mut("host").is_none());
    }

    #[test]
    fn test_remove_and_reparent() {
        let mut a = TagNode::new("a");
        a.create_child("x");
        a.create_child("y");
        let mut b = TagNode::new("b");

        let moved = a.remove_child(0).unwrap();
        b.append_child(moved);

        assert_eq!(a.children().len(), 1);
        assert_eq!(a.children()[0].name(), "y");
        assert_eq!(b.child("x").map(|n| n.name()), Some("x"));
        assert!(a.remove_child(5).is_none());
    }

    #[test]
    fn test_remove_children_named() {
        let mut root = TagNode::new("r")
            .with_child(TagNode::new("t"))
            .with_child(TagNode::new("u"))
            .with_child(TagNode::new("t"));
        let removed = root.remove_children_named("t");
        assert_eq!(removed.len(), 2);
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_equality_ignores_position_and_cardinality() {
        let plain = TagNode::new("a").with_value(Scalar::from("1"));
        let mut located = TagNode::new("a")
            .with_value(Scalar::from("1"))
            .with_position(Position::new(4, 2));
        located.set_cardinality(Some(Cardinality::OPTIONAL));
        assert_eq!(plain, located);
        assert_ne!(plain, TagNode::new("a").with_value(Scalar::from("2")));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("host"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("max-conn.v2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("has space"));
        assert!(TagNode::try_new("-x").is_err());
        assert!(TagNode::try_new("ok").is_ok());
    }
}
