//! Error types for tagfile
//!
//! Each stage has its own error type:
//! - [`FormatError`]: tokenizer/parser failure, aborts the document
//! - [`ScalarError`]: text that does not convert to a scalar type
//! - [`ValidationErrors`]: every constraint violation found in one pass
//! - [`SchemaError`]: schema compilation failure, aborts the schema unit
//!
//! [`Error`] wraps all of them for the high-level load/compile entry points.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::value::ScalarType;

/// Result type for tagfile operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Scalar(#[from] ScalarError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

// =============================================================================
// Source Positions
// =============================================================================

/// 1-based line/column in a source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

// =============================================================================
// Format Errors
// =============================================================================

/// What went wrong while reading a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("document is empty")]
    EmptyDocument,

    #[error("unterminated quoted string")]
    UnterminatedQuote,

    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),

    #[error("expected `{{`, found {0}")]
    ExpectedOpen(String),

    #[error("expected tag name, found {0}")]
    ExpectedTagName(String),

    #[error("value of `{0}` must come before its child tags")]
    ValueAfterChildren(String),

    #[error("nesting exceeds the maximum depth of {0}")]
    NestingTooDeep(usize),

    #[error("unexpected {0} after the root tag")]
    TrailingContent(String),

    #[error("invalid tag name `{0}`")]
    InvalidTagName(String),

    #[error("input is not valid UTF-8")]
    InvalidUtf8,
}

/// A tokenizer or parser failure, with the offending location when known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub kind: FormatErrorKind,
    pub position: Option<Position>,
}

impl FormatError {
    pub fn new(kind: FormatErrorKind, position: Position) -> Self {
        Self { kind, position: Some(position) }
    }

    /// An error not tied to a source location
    pub fn detached(kind: FormatErrorKind) -> Self {
        Self { kind, position: None }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{}: {}", position, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for FormatError {}

// =============================================================================
// Scalar Errors
// =============================================================================

/// Scalar text conversion failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScalarError {
    #[error("`{text}` is not a valid {expected}")]
    Invalid { text: String, expected: ScalarType },

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),

    #[error("unterminated quoted string")]
    UnterminatedQuote,
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single constraint violation
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    #[error("missing required field `{field}` (expected at least {expected}, found {found})")]
    MissingRequiredField { field: String, expected: u32, found: u32 },

    #[error("field `{field}` occurs {found} times, at most {max} allowed")]
    TooManyOccurrences { field: String, max: u32, found: u32 },

    #[error("field `{field}` expected {expected}, found {found}")]
    TypeMismatch { field: String, expected: String, found: String },

    #[error("field `{field}` value `{value}` violates {constraint}")]
    ConstraintViolation { field: String, value: String, constraint: String },

    #[error("unexpected tag `{tag}`")]
    UnexpectedTag { tag: String },

    #[error("expected root tag `{expected}`, found `{found}`")]
    WrongRootTag { expected: String, found: String },
}

/// A violation located in the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Slash-separated tag path of the node the violation concerns
    pub path: String,
    pub position: Option<Position>,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)?;
        if let Some(position) = self.position {
            write!(f, " ({})", position)?;
        }
        Ok(())
    }
}

/// Every violation found while validating one document
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationErrors {
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Ok when nothing was collected
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.violations.len();
        write!(f, "{} validation error{}", count, if count == 1 { "" } else { "s" })?;
        for violation in &self.violations {
            write!(f, "\n  {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Schema compilation errors
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaError {
    #[error("{position}: syntax error: {message}")]
    Syntax { message: String, position: Position },

    #[error("{position}: class `{name}` is already defined")]
    DuplicateClass { name: String, position: Position },

    #[error("{position}: class `{class}` declares field `{tag}` more than once")]
    DuplicateField { class: String, tag: String, position: Position },

    #[error("{position}: unknown type `{name}` in field `{class}.{field}`")]
    UnknownTypeReference { class: String, field: String, name: String, position: Position },

    #[error("{position}: invalid type for `{class}.{field}`: {reason}")]
    InvalidFieldType { class: String, field: String, reason: String, position: Position },

    #[error("cyclic schema reference: {}", .cycle.join(" -> "))]
    CyclicSchemaReference { cycle: Vec<String> },

    #[error("{position}: invalid default for `{class}.{field}`: {reason}")]
    InvalidDefault { class: String, field: String, reason: String, position: Position },

    #[error("{position}: invalid cardinality for `{class}.{field}`: {reason}")]
    InvalidCardinality { class: String, field: String, reason: String, position: Position },

    #[error("{position}: invalid constraint for `{class}.{field}`: {reason}")]
    InvalidConstraint { class: String, field: String, reason: String, position: Position },

    #[error("name collision: {message}")]
    NameCollision { message: String },

    #[error("unknown class `{name}`")]
    UnknownClass { name: String },

    #[error("schema declares no classes")]
    EmptySchema,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = FormatError::new(FormatErrorKind::UnterminatedQuote, Position::new(3, 7));
        assert_eq!(err.to_string(), "line 3, column 7: unterminated quoted string");

        let err = FormatError::detached(FormatErrorKind::InvalidTagName("1x".to_string()));
        assert_eq!(err.to_string(), "invalid tag name `1x`");
    }

    #[test]
    fn test_validation_errors_display() {
        let errors = ValidationErrors::new(vec![
            Violation {
                path: "server".to_string(),
                position: Some(Position::new(1, 1)),
                kind: ViolationKind::MissingRequiredField {
                    field: "host".to_string(),
                    expected: 1,
                    found: 0,
                },
            },
            Violation {
                path: "server/port".to_string(),
                position: None,
                kind: ViolationKind::UnexpectedTag { tag: "port".to_string() },
            },
        ]);

        let text = errors.to_string();
        assert!(text.starts_with("2 validation errors"));
        assert!(text.contains("server: missing required field `host`"));
        assert!(text.contains("(line 1, column 1)"));
    }

    #[test]
    fn test_violation_serializes_with_kind_tag() {
        let violation = Violation {
            path: "server".to_string(),
            position: None,
            kind: ViolationKind::TooManyOccurrences {
                field: "host".to_string(),
                max: 1,
                found: 2,
            },
        };
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["kind"], "too_many_occurrences");
        assert_eq!(json["field"], "host");
        assert_eq!(json["found"], 2);
    }

    #[test]
    fn test_cycle_display() {
        let err = SchemaError::CyclicSchemaReference {
            cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(err.to_string(), "cyclic schema reference: A -> B -> A");
    }
}
