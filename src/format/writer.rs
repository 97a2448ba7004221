//! Writer for the tag format
//!
//! Pre-order, one tag per line. A tag with children is written as
//!
//! ```text
//! {name value
//! 	{child ...}
//! }
//! ```
//!
//! and a leaf as `{name value}`. Indentation is cosmetic.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::tree::TagNode;
use crate::value::write_scalar;

/// Indentation character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    #[default]
    Tabs,
    Spaces,
}

/// Writer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    #[serde(default)]
    pub indent: IndentStyle,

    /// Characters per level when indenting with spaces
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
}

fn default_indent_width() -> usize {
    4
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            indent: IndentStyle::Tabs,
            indent_width: default_indent_width(),
        }
    }
}

impl WriterConfig {
    pub fn spaces(width: usize) -> Self {
        Self {
            indent: IndentStyle::Spaces,
            indent_width: width,
        }
    }

    fn indent_unit(&self) -> String {
        match self.indent {
            IndentStyle::Tabs => "\t".to_string(),
            IndentStyle::Spaces => " ".repeat(self.indent_width),
        }
    }
}

/// Write a document with default settings
pub fn write_document(root: &TagNode) -> String {
    write_document_with(root, &WriterConfig::default())
}

pub fn write_document_with(root: &TagNode, config: &WriterConfig) -> String {
    let unit = config.indent_unit();
    let mut out = String::new();
    write_node(&mut out, root, 0, &unit);
    out
}

/// Write a document to a byte sink
pub fn write_to<W: io::Write>(root: &TagNode, config: &WriterConfig, mut sink: W) -> io::Result<()> {
    sink.write_all(write_document_with(root, config).as_bytes())?;
    sink.flush()
}

pub fn write_file(root: &TagNode, config: &WriterConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, write_document_with(root, config))?;
    debug!(path = %path.display(), "wrote document");
    Ok(())
}

fn write_node(out: &mut String, node: &TagNode, depth: usize, unit: &str) {
    push_indent(out, depth, unit);
    out.push('{');
    out.push_str(node.name());
    for item in node.value().items() {
        out.push(' ');
        out.push_str(&write_scalar(item));
    }

    if node.has_children() {
        out.push('\n');
        for child in node.children() {
            write_node(out, child, depth + 1, unit);
        }
        push_indent(out, depth, unit);
    }
    out.push_str("}\n");
}

fn push_indent(out: &mut String, depth: usize, unit: &str) {
    for _ in 0..depth {
        out.push_str(unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parser::parse_document;
    use crate::value::{Scalar, Value};

    fn sample() -> TagNode {
        let mut root = TagNode::new("server");
        root.create_child("host").set_value(Scalar::from("localhost"));
        root.create_child("motd").set_value(Scalar::from("hello world"));
        root.create_child("ports")
            .set_value(Value::vector(&[80i64, 443]));
        root.create_child("tls").create_child("cert").set_value(Scalar::from("a.pem"));
        root
    }

    #[test]
    fn test_layout() {
        let expected = "{server\n\
                        \t{host localhost}\n\
                        \t{motd \"hello world\"}\n\
                        \t{ports 80 443}\n\
                        \t{tls\n\
                        \t\t{cert a.pem}\n\
                        \t}\n\
                        }\n";
        assert_eq!(write_document(&sample()), expected);
    }

    #[test]
    fn test_spaces() {
        let root = TagNode::new("a").with_child(TagNode::new("b"));
        assert_eq!(write_document_with(&root, &WriterConfig::spaces(2)), "{a\n  {b}\n}\n");
    }

    #[test]
    fn test_round_trip() {
        let text = write_document(&sample());
        let reparsed = parse_document(&text).unwrap();
        assert_eq!(write_document(&reparsed), text);
    }

    #[test]
    fn test_write_to_sink() {
        let mut buf = Vec::new();
        write_to(&TagNode::new("a"), &WriterConfig::default(), &mut buf).unwrap();
        assert_eq!(buf, b"{a}\n");
    }
}
