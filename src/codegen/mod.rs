//! Code Generation
//!
//! Generates typed Rust wrappers from a resolved [`Schema`].
//!
//! Architecture:
//! - NameResolver: class and field identifiers, collision checks
//! - FieldShape: storage shape of each field, decided once per field
//! - rust: the emitter, which consumes only resolved names and shapes
//!
//! Nothing is written until the whole file has been generated, and the
//! file itself is replaced atomically.

pub mod config;
pub mod names;
pub mod rust;

use std::fs;
use std::io::Write;
use std::path::Path;

use similar::{ChangeTag, TextDiff};
use tracing::{debug, info, warn};

use crate::checksum::Checksum;
use crate::compiler;
use crate::error::{Result, SchemaError};
use crate::schema::{FieldDef, FieldType, Schema};

pub use config::{NamingConfig, RenderProfile};
pub use names::NameResolver;

// =============================================================================
// Field Shape
// =============================================================================

/// How a field is stored in the generated struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Exactly one occurrence: `T`
    Required,
    /// At most one occurrence with a schema default: `T`
    Defaulted,
    /// At most one occurrence: `Option<T>`
    Optional,
    /// Any other cardinality: `Vec<T>`
    Repeated,
    /// Presence only: `bool`
    Flag,
}

impl FieldShape {
    pub fn of(field: &FieldDef) -> Self {
        if field.field_type == FieldType::Flag {
            FieldShape::Flag
        } else if !field.cardinality.is_single() {
            FieldShape::Repeated
        } else if field.default.is_some() {
            FieldShape::Defaulted
        } else if field.cardinality.is_optional() {
            FieldShape::Optional
        } else {
            FieldShape::Required
        }
    }
}

// =============================================================================
// Generated Output
// =============================================================================

/// Output from code generation
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// Generated code as a string
    pub code: String,
    /// Number of types generated
    pub type_count: usize,
    /// Checksum of the schema source recorded in the header
    pub checksum: Checksum,
}

/// Result of comparing generated code with a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    UpToDate,
    /// No file at the output path
    Missing,
    Stale {
        /// Header checksum differs from the current schema text
        schema_changed: bool,
        changed_lines: usize,
        /// Unified diff from the file on disk to the fresh output
        diff: String,
    },
}

// =============================================================================
// Public API
// =============================================================================

/// Generate Rust code for a compiled schema
pub fn generate_rust(
    schema: &Schema,
    source_name: &str,
    checksum: &Checksum,
    profile: &RenderProfile,
) -> std::result::Result<GeneratedOutput, SchemaError> {
    let resolver = NameResolver::build(schema, profile)?;

    let mut output = String::new();
    rust::emit_header(&mut output, source_name, checksum, profile);

    let mut type_count = 0;
    for class in schema.classes() {
        output.push('\n');
        rust::emit_class(&mut output, class, &resolver, profile)?;
        type_count += 1;
    }
    debug!(types = type_count, bytes = output.len(), "emitted rust wrappers");

    Ok(GeneratedOutput {
        code: output,
        type_count,
        checksum: checksum.clone(),
    })
}

/// Compile schema text and generate Rust code for it
pub fn generate_from_source(
    source: &str,
    source_name: &str,
    profile: &RenderProfile,
) -> std::result::Result<GeneratedOutput, SchemaError> {
    let schema = compiler::compile(source)?;
    generate_rust(&schema, source_name, &Checksum::from_content(source), profile)
}

/// Compile a schema file and write the generated code to `output`.
///
/// On any error the output path is left untouched.
pub fn compile_to_path(input: &Path, output: &Path, profile: &RenderProfile) -> Result<GeneratedOutput> {
    let source = fs::read_to_string(input)?;
    let generated = generate_from_source(&source, &source_name(input), profile)?;
    write_atomic(output, &generated.code)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        types = generated.type_count,
        "wrote generated code"
    );
    Ok(generated)
}

/// Compare what `compile_to_path` would write with the file on disk
pub fn check_path(input: &Path, output: &Path, profile: &RenderProfile) -> Result<CheckOutcome> {
    let source = fs::read_to_string(input)?;
    let generated = generate_from_source(&source, &source_name(input), profile)?;

    if !output.exists() {
        warn!(output = %output.display(), "generated file is missing");
        return Ok(CheckOutcome::Missing);
    }
    let existing = fs::read_to_string(output)?;
    if existing == generated.code {
        debug!(output = %output.display(), "generated file is up to date");
        return Ok(CheckOutcome::UpToDate);
    }

    let schema_changed = Checksum::from_generated_header(&existing).as_ref() != Some(&generated.checksum);
    let label = output.display().to_string();
    let (changed_lines, diff) = unified_diff(&existing, &generated.code, &label);
    warn!(output = %label, schema_changed, changed_lines, "generated file is stale");

    Ok(CheckOutcome::Stale {
        schema_changed,
        changed_lines,
        diff,
    })
}

/// Name recorded in the generated header
fn source_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

/// Count changed lines and render a unified diff
pub fn unified_diff(old: &str, new: &str, label: &str) -> (usize, String) {
    let diff = TextDiff::from_lines(old, new);
    let changed_lines = diff
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .count();
    let rendered = diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("{} (on disk)", label), &format!("{} (generated)", label))
        .to_string();
    (changed_lines, rendered)
}

/// Write through a temporary file in the destination directory
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
