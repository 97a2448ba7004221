//! Schema compiler front end
//!
//! Source text goes through [`lexer`], [`parser`] and [`resolve`] to become
//! a [`Schema`]. Code generation lives in [`crate::codegen`].

pub mod lexer;
pub mod parser;
pub mod resolve;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SchemaError};
use crate::schema::Schema;

pub use parser::parse_schema;
pub use resolve::default_tag;

/// Parse and resolve a schema unit
pub fn compile(source: &str) -> std::result::Result<Schema, SchemaError> {
    let decls = parse_schema(source)?;
    debug!(classes = decls.len(), "parsed schema declarations");
    resolve::resolve(decls)
}

/// Read and compile a schema file
pub fn compile_file(path: impl AsRef<Path>) -> Result<Schema> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let schema = compile(&source)?;
    info!(path = %path.display(), classes = schema.classes().len(), "compiled schema");
    Ok(schema)
}
