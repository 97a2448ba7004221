//! tagfile CLI
//!
//! Generates typed wrappers from schemas, validates documents against a
//! schema at runtime, and reformats documents.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tagfile::codegen::{self, CheckOutcome, NameResolver};
use tagfile::schema::Schema;
use tagfile::{compiler, format, Error, TagfileConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagfile")]
#[command(about = "Tagged-tree configuration files and typed Rust wrappers")]
struct Cli {
    /// Path to a tagfile.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema and write the generated Rust code
    Generate {
        /// Schema file
        #[arg(short, long)]
        input: PathBuf,
        /// Output .rs file
        #[arg(short, long)]
        output: PathBuf,
        /// Compare with the existing output instead of writing
        #[arg(long)]
        check: bool,
    },

    /// Compile a schema and print a class summary
    Check {
        /// Schema file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Validate a document against a schema
    Validate {
        /// Schema file
        #[arg(long)]
        schema: PathBuf,
        /// Class to validate against (default: picked by root tag)
        #[arg(long)]
        class: Option<String>,
        /// Document to validate
        document: PathBuf,
        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Rewrite a document in canonical layout
    Fmt {
        /// Document to format
        document: PathBuf,
        /// Write back in place instead of printing
        #[arg(short, long)]
        write: bool,
        /// Allow --write to drop the document's comments
        #[arg(long, requires = "write")]
        strip_comments: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TagfileConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Generate { input, output, check } => {
            if check {
                return check_generated(&input, &output, &config);
            }
            let generated = codegen::compile_to_path(&input, &output, &config.codegen)
                .with_context(|| format!("generating code from {}", input.display()))?;
            println!(
                "✅ Wrote {} type{} to {}",
                generated.type_count,
                plural(generated.type_count),
                output.display()
            );
            Ok(())
        }

        Commands::Check { input } => {
            let schema = compile(&input)?;
            NameResolver::build(&schema, &config.codegen)
                .with_context(|| format!("resolving Rust names for {}", input.display()))?;
            print_summary(&input, &schema);
            Ok(())
        }

        Commands::Validate {
            schema,
            class,
            document,
            format,
        } => validate(&schema, class.as_deref(), &document, format, &config),

        Commands::Fmt {
            document,
            write,
            strip_comments,
        } => fmt(&document, write, strip_comments, &config),
    }
}

fn compile(input: &Path) -> anyhow::Result<Schema> {
    compiler::compile_file(input).with_context(|| format!("compiling {}", input.display()))
}

fn fmt(document: &Path, write: bool, strip_comments: bool, config: &TagfileConfig) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(document).with_context(|| format!("reading {}", document.display()))?;
    let node = format::parse_document_with(&text, &config.parser)
        .with_context(|| format!("parsing {}", document.display()))?;
    let formatted = format::write_document_with(&node, &config.writer);

    if !write {
        print!("{}", formatted);
        return Ok(());
    }

    let comments = format::comments(&text)?;
    if !comments.is_empty() && !strip_comments {
        eprintln!(
            "❌ {} has {} comment{} that formatting would remove (first at {})",
            document.display(),
            comments.len(),
            plural(comments.len()),
            comments[0].position
        );
        eprintln!("   Pass --strip-comments to rewrite it anyway");
        std::process::exit(1);
    }

    codegen::write_atomic(document, &formatted)?;
    println!("✅ Formatted {}", document.display());
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn check_generated(input: &Path, output: &Path, config: &TagfileConfig) -> anyhow::Result<()> {
    let outcome = codegen::check_path(input, output, &config.codegen)
        .with_context(|| format!("checking {}", output.display()))?;

    match outcome {
        CheckOutcome::UpToDate => {
            println!("✅ {} is up to date", output.display());
            Ok(())
        }
        CheckOutcome::Missing => {
            eprintln!("❌ {} does not exist", output.display());
            std::process::exit(1);
        }
        CheckOutcome::Stale {
            schema_changed,
            changed_lines,
            diff,
        } => {
            print!("{}", diff);
            let reason = if schema_changed {
                "schema changed since generation"
            } else {
                "file was edited after generation"
            };
            eprintln!(
                "❌ {} is stale ({}, {} line{} differ)",
                output.display(),
                reason,
                changed_lines,
                plural(changed_lines)
            );
            std::process::exit(1);
        }
    }
}

fn print_summary(input: &Path, schema: &Schema) {
    let count = schema.classes().len();
    println!("✅ {}: {} class{}", input.display(), count, if count == 1 { "" } else { "es" });
    let roots: Vec<&str> = schema.root_classes().map(|c| c.name.as_str()).collect();
    for class in schema.classes() {
        let marker = if roots.contains(&class.name.as_str()) { " (root)" } else { "" };
        println!(
            "  {} <{}>{}: {} field{}",
            class.name,
            class.tag,
            marker,
            class.fields.len(),
            plural(class.fields.len())
        );
        for field in &class.fields {
            let kind = match &field.field_type {
                tagfile::FieldType::Scalar(ty) => ty.to_string(),
                tagfile::FieldType::Vector(ty) => format!("[{}]", ty),
                tagfile::FieldType::Flag => "flag".to_string(),
                tagfile::FieldType::Class(name) => name.clone(),
            };
            println!("    {}: {} {}", field.tag, kind, field.cardinality);
        }
    }
}

fn validate(
    schema_path: &Path,
    class: Option<&str>,
    document: &Path,
    report: ReportFormat,
    config: &TagfileConfig,
) -> anyhow::Result<()> {
    let schema = compile(schema_path)?;
    let node = format::parse_file(document, &config.parser)
        .with_context(|| format!("parsing {}", document.display()))?;

    let class_name = match class {
        Some(name) => schema
            .class(name)
            .map(|c| c.name.clone())
            .ok_or_else(|| anyhow!("schema has no class `{}`", name))?,
        None => schema
            .class_for_root(node.name())
            .map(|c| c.name.clone())
            .ok_or_else(|| anyhow!("no class in the schema has root tag `{}`", node.name()))?,
    };

    let violations = match schema.validate_document(&node, &class_name) {
        Ok(()) => Vec::new(),
        Err(Error::Validation(errors)) => errors.violations,
        Err(other) => return Err(other.into()),
    };

    match report {
        ReportFormat::Json => {
            let report = json!({
                "document": document.display().to_string(),
                "class": class_name,
                "valid": violations.is_empty(),
                "violations": violations,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ReportFormat::Text if violations.is_empty() => {
            println!("✅ {} is a valid `{}` document", document.display(), class_name);
        }
        ReportFormat::Text => {
            eprintln!(
                "❌ {}: {} violation{}",
                document.display(),
                violations.len(),
                plural(violations.len())
            );
            for violation in &violations {
                eprintln!("  {}", violation);
            }
        }
    }

    if !violations.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
