//! Recursive-descent parser
//!
//! ```text
//! document := tag EndOfInput
//! tag      := '{' Identifier scalar* tag* '}'
//! scalar   := Identifier | BareToken | QuotedString
//! ```
//!
//! One scalar becomes [`Value::Scalar`], several a [`Value::Vector`]. Scalars
//! are kept as text; types are applied later by the validator.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, FormatError, FormatErrorKind, Result};
use crate::tree::TagNode;
use crate::value::{Scalar, Value};

use super::lexer::{Lexer, Token, TokenKind};

/// Parser settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Deepest allowed tag nesting; the root tag is depth 1
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    256
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Parse a complete document with default settings
pub fn parse_document(src: &str) -> std::result::Result<TagNode, FormatError> {
    parse_document_with(src, &ParserConfig::default())
}

pub fn parse_document_with(
    src: &str,
    config: &ParserConfig,
) -> std::result::Result<TagNode, FormatError> {
    let mut parser = Parser {
        lexer: Lexer::new(src),
        lookahead: None,
        max_depth: config.max_depth,
    };
    let root = parser.document()?;
    debug!(root = root.name(), children = root.children().len(), "parsed document");
    Ok(root)
}

/// Read a whole UTF-8 byte stream and parse it
pub fn parse_reader<R: Read>(mut reader: R, config: &ParserConfig) -> Result<TagNode> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8(bytes)
        .map_err(|_| FormatError::detached(FormatErrorKind::InvalidUtf8))?;
    Ok(parse_document_with(&text, config)?)
}

pub fn parse_file(path: impl AsRef<Path>, config: &ParserConfig) -> Result<TagNode> {
    let file = std::fs::File::open(path.as_ref()).map_err(Error::Io)?;
    parse_reader(std::io::BufReader::new(file), config)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token>,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn advance(&mut self) -> std::result::Result<Token, FormatError> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn push_back(&mut self, token: Token) {
        self.lookahead = Some(token);
    }

    fn document(&mut self) -> std::result::Result<TagNode, FormatError> {
        let first = self.advance()?;
        if first.kind == TokenKind::EndOfInput {
            return Err(FormatError::new(FormatErrorKind::EmptyDocument, first.position));
        }
        self.push_back(first);

        let root = self.tag(1)?;

        let next = self.advance()?;
        match next.kind {
            TokenKind::EndOfInput => Ok(root),
            other => Err(FormatError::new(
                FormatErrorKind::TrailingContent(other.describe()),
                next.position,
            )),
        }
    }

    fn tag(&mut self, depth: usize) -> std::result::Result<TagNode, FormatError> {
        let open = self.advance()?;
        match &open.kind {
            TokenKind::Open => {}
            TokenKind::EndOfInput => {
                return Err(FormatError::new(FormatErrorKind::UnexpectedEndOfInput, open.position));
            }
            other => {
                return Err(FormatError::new(
                    FormatErrorKind::ExpectedOpen(other.describe()),
                    open.position,
                ));
            }
        }
        if depth > self.max_depth {
            return Err(FormatError::new(
                FormatErrorKind::NestingTooDeep(self.max_depth),
                open.position,
            ));
        }

        let name_token = self.advance()?;
        let name = match name_token.kind {
            TokenKind::Identifier(name) => name,
            TokenKind::EndOfInput => {
                return Err(FormatError::new(
                    FormatErrorKind::UnexpectedEndOfInput,
                    name_token.position,
                ));
            }
            other => {
                return Err(FormatError::new(
                    FormatErrorKind::ExpectedTagName(other.describe()),
                    name_token.position,
                ));
            }
        };

        let mut node = TagNode::new(name).with_position(open.position);
        let mut items = Vec::new();

        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Identifier(text)
                | TokenKind::BareToken(text)
                | TokenKind::QuotedString(text) => {
                    if node.has_children() {
                        return Err(FormatError::new(
                            FormatErrorKind::ValueAfterChildren(node.name().to_string()),
                            token.position,
                        ));
                    }
                    items.push(Scalar::String(text));
                }
                TokenKind::Open => {
                    self.push_back(token);
                    let child = self.tag(depth + 1)?;
                    node.append_child(child);
                }
                TokenKind::Close => break,
                TokenKind::EndOfInput => {
                    return Err(FormatError::new(
                        FormatErrorKind::UnexpectedEndOfInput,
                        token.position,
                    ));
                }
                TokenKind::Comment(_) => {}
            }
        }

        node.set_value(Value::from_items(items));
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Position;

    fn text_items(node: &TagNode) -> Vec<String> {
        node.value().items().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_example_document() {
        let root = parse_document("{server {host \"localhost\"} {tag a} {tag b}}").unwrap();
        assert_eq!(root.name(), "server");
        assert!(root.value().is_none());
        assert_eq!(root.children().len(), 3);
        assert_eq!(text_items(root.child("host").unwrap()), vec!["localhost"]);
        let tags: Vec<Vec<String>> = root.children_named("tag").map(text_items).collect();
        assert_eq!(tags, vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_value_shapes() {
        let root = parse_document("{v 1 2 \"three four\" {c}}").unwrap();
        assert!(matches!(root.value(), Value::Vector(items) if items.len() == 3));
        assert_eq!(text_items(&root)[2], "three four");
        assert!(root.child("c").unwrap().value().is_none());

        let single = parse_document("{v 1}").unwrap();
        assert!(matches!(single.value(), Value::Scalar(_)));
    }

    #[test]
    fn test_positions_recorded() {
        let root = parse_document("{a\n\t{b 1}\n}").unwrap();
        assert_eq!(root.position(), Some(Position::new(1, 1)));
        assert_eq!(root.child("b").unwrap().position(), Some(Position::new(2, 2)));
    }

    #[test]
    fn test_structural_errors() {
        let err = parse_document("{a").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnexpectedEndOfInput);

        let err = parse_document("{a}}").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::TrailingContent("`}`".to_string()));
        assert_eq!(err.position, Some(Position::new(1, 4)));

        let err = parse_document("{\"quoted\" 1}").unwrap_err();
        assert!(matches!(err.kind, FormatErrorKind::ExpectedTagName(_)));

        let err = parse_document("{}").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::ExpectedTagName("`}`".to_string()));

        let err = parse_document("a").unwrap_err();
        assert!(matches!(err.kind, FormatErrorKind::ExpectedOpen(_)));

        let err = parse_document("  || only a comment\n").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::EmptyDocument);
    }

    #[test]
    fn test_value_after_children() {
        let err = parse_document("{a {b} 1}").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::ValueAfterChildren("a".to_string()));
        assert_eq!(err.position, Some(Position::new(1, 8)));
    }

    #[test]
    fn test_depth_limit() {
        let config = ParserConfig { max_depth: 3 };
        assert!(parse_document_with("{a {b {c}}}", &config).is_ok());

        let err = parse_document_with("{a {b {c {d}}}}", &config).unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::NestingTooDeep(3));
    }

    #[test]
    fn test_deep_nesting_fails_cleanly() {
        let depth = 10_000;
        let src = format!("{}{}", "{x ".repeat(depth), "}".repeat(depth));
        let err = parse_document(&src).unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::NestingTooDeep(256));
    }

    #[test]
    fn test_parse_reader_rejects_invalid_utf8() {
        let bytes: &[u8] = &[b'{', b'a', b' ', 0xff, b'}'];
        let err = parse_reader(bytes, &ParserConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError { kind: FormatErrorKind::InvalidUtf8, .. })
        ));
    }
}
