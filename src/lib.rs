//! tagfile
//!
//! A tagged-tree configuration format with a schema compiler that emits
//! typed Rust wrappers.
//!
//! ## Features
//!
//! - **Text format**: `{name value... child...}` documents with comments,
//!   quoting and a canonical writer ([`format`])
//! - **Tag tree**: a generic, ordered tree of named nodes ([`TagNode`])
//! - **Validation**: cardinality, type and value constraints, reporting
//!   every violation in one pass ([`validator`])
//! - **Schema compiler**: class declarations compiled to Rust structs that
//!   implement [`TagClass`] ([`compiler`], [`codegen`])
//!
//! ## Architecture
//!
//! ```text
//! document text --format::parse--> TagNode --TagClass::load_node--> typed struct
//!                                     ^                                  |
//!                                     +--------- TagClass::save_node ----+
//!
//! schema text --compiler::compile--> Schema --codegen::generate_rust--> Rust source
//! ```

pub mod checksum;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod format;
pub mod schema;
pub mod tree;
pub mod validator;
pub mod value;
pub mod wrapper;

pub use checksum::Checksum;
pub use config::TagfileConfig;
pub use error::{
    Error, FormatError, FormatErrorKind, Position, Result, ScalarError, SchemaError, ValidationErrors,
    Violation, ViolationKind,
};
pub use format::{parse_document, write_document, ParserConfig, WriterConfig};
pub use schema::{ClassDef, FieldDef, FieldType, Schema};
pub use tree::TagNode;
pub use validator::{Cardinality, FieldRule, RuleKind, ValueConstraint};
pub use value::{Scalar, ScalarType, ScalarValue, Value};
pub use wrapper::{LoadContext, TagClass};
