//! Runtime support for generated wrappers
//!
//! Generated classes hold typed fields and implement [`TagClass`]. Loading
//! validates the tree against the class's rule table (recursively, through
//! [`LoadContext`]) and reports every violation at once. Saving rebuilds a
//! fresh tree in field declaration order.

use std::path::Path;

use crate::error::{Error, Result, ValidationErrors, Violation, ViolationKind};
use crate::format::{self, ParserConfig, WriterConfig};
use crate::tree::TagNode;
use crate::validator::{self, FieldRule};
use crate::value::ScalarValue;

/// A typed view of one schema class
pub trait TagClass: Sized + Default {
    /// Root tag name when the class is a document root
    const TAG: &'static str;

    /// Validation table, in field declaration order
    fn rules() -> &'static [FieldRule];

    /// Build from an already-validated node. Missing or malformed fields
    /// fall back to defaults; the violations were recorded by `cx`.
    fn read_fields(node: &TagNode, cx: &mut LoadContext) -> Self;

    /// Append one child per field value, in declaration order
    fn write_fields(&self, node: &mut TagNode);

    fn to_node(&self, tag: &str) -> TagNode {
        let mut node = TagNode::new(tag);
        self.write_fields(&mut node);
        validator::annotate(&mut node, Self::rules());
        node
    }

    fn save_node(&self) -> TagNode {
        self.to_node(Self::TAG)
    }

    fn save(&self) -> String {
        format::write_document(&self.save_node())
    }

    fn save_with(&self, config: &WriterConfig) -> String {
        format::write_document_with(&self.save_node(), config)
    }

    fn save_to_file(&self, path: impl AsRef<Path>, config: &WriterConfig) -> Result<()> {
        format::write_file(&self.save_node(), config, path)
    }

    /// Validate a tree and convert it, reporting all violations together
    fn load_node(node: &TagNode) -> std::result::Result<Self, ValidationErrors> {
        let mut cx = LoadContext::new(node.name());
        if node.name() != Self::TAG {
            cx.report(Violation {
                path: node.name().to_string(),
                position: node.position(),
                kind: ViolationKind::WrongRootTag {
                    expected: Self::TAG.to_string(),
                    found: node.name().to_string(),
                },
            });
        }
        let value = cx.read_class::<Self>(node);
        cx.finish(value)
    }

    fn load(text: &str) -> Result<Self> {
        Self::load_with(text, &ParserConfig::default())
    }

    fn load_with(text: &str, config: &ParserConfig) -> Result<Self> {
        let node = format::parse_document_with(text, config)?;
        Self::load_node(&node).map_err(Error::Validation)
    }

    fn load_file(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Self> {
        let node = format::parse_file(path, config)?;
        Self::load_node(&node).map_err(Error::Validation)
    }
}

// =============================================================================
// Load Context
// =============================================================================

/// Collects violations while a class tree is read
#[derive(Debug, Default)]
pub struct LoadContext {
    path: Vec<String>,
    violations: Vec<Violation>,
}

impl LoadContext {
    pub fn new(root: &str) -> Self {
        Self {
            path: vec![root.to_string()],
            violations: Vec::new(),
        }
    }

    fn path_string(&self) -> String {
        self.path.join("/")
    }

    pub fn report(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn finish<T>(self, value: T) -> std::result::Result<T, ValidationErrors> {
        ValidationErrors::new(self.violations).into_result().map(|()| value)
    }

    /// Validate `node` against `C`'s rules, then read it
    pub fn read_class<C: TagClass>(&mut self, node: &TagNode) -> C {
        let found = validator::validate_fields(node, C::rules(), &self.path_string());
        self.violations.extend(found);
        C::read_fields(node, self)
    }

    fn convert<T: ScalarValue>(node: &TagNode) -> Option<T> {
        node.value().as_scalar().and_then(|s| T::from_scalar(s).ok())
    }

    fn convert_all<T: ScalarValue>(node: &TagNode) -> Vec<T> {
        node.value()
            .items()
            .iter()
            .filter_map(|s| T::from_scalar(s).ok())
            .collect()
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    /// Required scalar
    pub fn scalar<T: ScalarValue + Default>(&mut self, node: &TagNode, tag: &str) -> T {
        self.optional(node, tag).unwrap_or_default()
    }

    /// Scalar with a schema default
    pub fn scalar_or<T: ScalarValue>(&mut self, node: &TagNode, tag: &str, default: T) -> T {
        self.optional(node, tag).unwrap_or(default)
    }

    pub fn optional<T: ScalarValue>(&mut self, node: &TagNode, tag: &str) -> Option<T> {
        node.child(tag).and_then(Self::convert)
    }

    /// Repeated scalar, one sibling tag per value
    pub fn scalars<T: ScalarValue>(&mut self, node: &TagNode, tag: &str) -> Vec<T> {
        node.children_named(tag).filter_map(Self::convert).collect()
    }

    // =========================================================================
    // Vectors
    // =========================================================================

    pub fn vector<T: ScalarValue>(&mut self, node: &TagNode, tag: &str) -> Vec<T> {
        self.optional_vector(node, tag).unwrap_or_default()
    }

    pub fn optional_vector<T: ScalarValue>(&mut self, node: &TagNode, tag: &str) -> Option<Vec<T>> {
        node.child(tag).map(Self::convert_all)
    }

    pub fn vectors<T: ScalarValue>(&mut self, node: &TagNode, tag: &str) -> Vec<Vec<T>> {
        node.children_named(tag).map(Self::convert_all).collect()
    }

    pub fn flag(&mut self, node: &TagNode, tag: &str) -> bool {
        node.child(tag).is_some()
    }

    // =========================================================================
    // Nested Classes
    // =========================================================================

    pub fn nested<C: TagClass>(&mut self, node: &TagNode, tag: &str) -> C {
        self.optional_nested(node, tag).unwrap_or_default()
    }

    /// First occurrence. Extra occurrences are still validated, under the
    /// same indexed paths `nested_all` uses, and then discarded.
    pub fn optional_nested<C: TagClass>(&mut self, node: &TagNode, tag: &str) -> Option<C> {
        self.nested_all(node, tag).into_iter().next()
    }

    pub fn nested_all<C: TagClass>(&mut self, node: &TagNode, tag: &str) -> Vec<C> {
        let children: Vec<&TagNode> = node.children_named(tag).collect();
        let repeated = children.len() > 1;
        children
            .into_iter()
            .enumerate()
            .map(|(index, child)| {
                let segment = if repeated {
                    format!("{}[{}]", tag, index)
                } else {
                    tag.to_string()
                };
                self.descend(&segment, |cx| cx.read_class(child))
            })
            .collect()
    }

    fn descend<T>(&mut self, segment: &str, read: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment.to_string());
        let value = read(self);
        self.path.pop();
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Cardinality;
    use crate::value::{ScalarType, Value};
    use std::sync::OnceLock;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Endpoint {
        url: String,
        retries: u64,
    }

    impl TagClass for Endpoint {
        const TAG: &'static str = "endpoint";

        fn rules() -> &'static [FieldRule] {
            static RULES: OnceLock<Vec<FieldRule>> = OnceLock::new();
            RULES.get_or_init(|| {
                vec![
                    FieldRule::scalar("url", ScalarType::String, Cardinality::EXACTLY_ONE),
                    FieldRule::scalar("retries", ScalarType::UInt, Cardinality::EXACTLY_ONE)
                        .with_default(),
                ]
            })
        }

        fn read_fields(node: &TagNode, cx: &mut LoadContext) -> Self {
            Self {
                url: cx.scalar(node, "url"),
                retries: cx.scalar_or(node, "retries", 3),
            }
        }

        fn write_fields(&self, node: &mut TagNode) {
            node.create_child("url").set_value(Value::scalar(&self.url));
            node.create_child("retries").set_value(Value::scalar(&self.retries));
        }
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Client {
        name: String,
        endpoints: Vec<Endpoint>,
        verbose: bool,
    }

    impl TagClass for Client {
        const TAG: &'static str = "client";

        fn rules() -> &'static [FieldRule] {
            static RULES: OnceLock<Vec<FieldRule>> = OnceLock::new();
            RULES.get_or_init(|| {
                vec![
                    FieldRule::scalar("name", ScalarType::String, Cardinality::EXACTLY_ONE),
                    FieldRule::nested("endpoint", Cardinality::ONE_OR_MORE),
                    FieldRule::flag("verbose"),
                ]
            })
        }

        fn read_fields(node: &TagNode, cx: &mut LoadContext) -> Self {
            Self {
                name: cx.scalar(node, "name"),
                endpoints: cx.nested_all(node, "endpoint"),
                verbose: cx.flag(node, "verbose"),
            }
        }

        fn write_fields(&self, node: &mut TagNode) {
            node.create_child("name").set_value(Value::scalar(&self.name));
            for value in &self.endpoints {
                node.append_child(value.to_node("endpoint"));
            }
            if self.verbose {
                node.create_child("verbose");
            }
        }
    }

    #[test]
    fn test_load_nested() {
        let client = Client::load(
            "{client {name c} {endpoint {url a}} {endpoint {url b} {retries 9}} {verbose}}",
        )
        .unwrap();
        assert_eq!(client.name, "c");
        assert_eq!(client.endpoints.len(), 2);
        assert_eq!(client.endpoints[0].retries, 3);
        assert_eq!(client.endpoints[1].retries, 9);
        assert!(client.verbose);
    }

    #[test]
    fn test_nested_violations_have_paths() {
        let err = Client::load("{client {endpoint {retries x}} {endpoint {url b}}}").unwrap_err();
        let errors = match err {
            Error::Validation(errors) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        };
        let paths: Vec<&str> = errors.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["client", "client/endpoint[0]", "client/endpoint[0]/retries"]);
    }

    #[test]
    fn test_wrong_root_tag() {
        let node = format::parse_document("{server {name c} {endpoint {url a}}}").unwrap();
        let errors = Client::load_node(&node).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors.violations[0].kind, ViolationKind::WrongRootTag { .. }));
    }

    #[test]
    fn test_save_round_trip() {
        let client = Client {
            name: "c".to_string(),
            endpoints: vec![Endpoint { url: "http://x".to_string(), retries: 1 }],
            verbose: false,
        };
        let text = client.save();
        assert_eq!(
            text,
            "{client\n\t{name c}\n\t{endpoint\n\t\t{url http://x}\n\t\t{retries 1}\n\t}\n}\n"
        );
        assert_eq!(Client::load(&text).unwrap(), client);
    }

    #[test]
    fn test_save_node_is_annotated() {
        let node = Client::default().save_node();
        assert_eq!(node.child("name").unwrap().cardinality(), Some(Cardinality::EXACTLY_ONE));
    }
}
