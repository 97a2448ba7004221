//! Name Resolution Pass
//!
//! Maps schema classes and field tags to Rust identifiers:
//! - class names to PascalCase type names, respecting acronyms
//! - field tags to snake_case, with keyword escaping
//! - accessor names per field shape (`set_*`, `add_*`, `clear_*`, `*_mut`)
//!
//! Any two schema names that land on the same Rust identifier, or that
//! shadow an imported type or a runtime trait method, are rejected here,
//! before any text is emitted.

use std::collections::HashMap;

use super::config::{NamingConfig, RenderProfile};
use super::FieldShape;
use crate::error::SchemaError;
use crate::schema::{ClassDef, FieldType, Schema};

/// Type names visible in every generated module
const RESERVED_TYPE_NAMES: &[&str] = &[
    // runtime imports
    "Cardinality", "FieldRule", "LoadContext", "ScalarType", "TagClass", "TagNode", "Value",
    "ValueConstraint", "OnceLock",
    // prelude
    "String", "Vec", "Option", "Result", "Box", "Some", "None", "Ok", "Err", "Self",
    "Default", "Clone", "Copy", "Debug", "PartialEq", "Eq", "Send", "Sync", "Sized",
    "Drop", "Fn", "FnMut", "FnOnce", "Iterator", "IntoIterator", "From", "Into",
    "ToString", "ToOwned", "AsRef", "AsMut",
];

/// Methods a generated struct already has through `TagClass`, its
/// constructor, or its standard trait impls
const RESERVED_METHODS: &[&str] = &[
    "new", "load", "load_node", "load_with", "load_file", "save", "save_node", "save_with",
    "save_to_file", "to_node", "rules", "read_fields", "write_fields", "default", "clone",
    "eq", "ne", "fmt",
];

// =============================================================================
// Resolved Names
// =============================================================================

/// Rust names for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    /// Struct field and getter name, keyword-escaped
    pub ident: String,
    /// Unescaped snake_case stem used to build accessor names
    pub stem: String,
}

impl FieldNames {
    pub fn setter(&self) -> String {
        format!("set_{}", self.stem)
    }

    pub fn adder(&self) -> String {
        format!("add_{}", self.stem)
    }

    pub fn clearer(&self) -> String {
        format!("clear_{}", self.stem)
    }

    pub fn mut_getter(&self) -> String {
        format!("{}_mut", self.stem)
    }
}

/// Rust names for one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames {
    pub type_name: String,
    /// In field declaration order
    pub fields: Vec<FieldNames>,
}

// =============================================================================
// Name Resolver
// =============================================================================

/// Resolves schema names to Rust identifiers with collision checks
#[derive(Debug)]
pub struct NameResolver {
    /// class name -> resolved names
    classes: HashMap<String, ClassNames>,
    naming_config: NamingConfig,
}

impl NameResolver {
    pub fn new(naming_config: NamingConfig) -> Self {
        Self {
            classes: HashMap::new(),
            naming_config,
        }
    }

    /// Resolve every class and field of a schema
    pub fn build(schema: &Schema, profile: &RenderProfile) -> Result<Self, SchemaError> {
        let mut resolver = Self::new(profile.naming.clone());

        // First pass: type names
        let mut type_owner: HashMap<String, &str> = HashMap::new();
        for class in schema.classes() {
            let type_name = resolver.type_name_for(&class.name);
            if RESERVED_TYPE_NAMES.contains(&type_name.as_str()) {
                return Err(collision(format!(
                    "class `{}` maps to `{}`, which is already in scope in generated code",
                    class.name, type_name
                )));
            }
            if let Some(other) = type_owner.insert(type_name.clone(), &class.name) {
                return Err(collision(format!(
                    "classes `{}` and `{}` both map to type `{}`",
                    other, class.name, type_name
                )));
            }
        }

        // Second pass: fields and accessors
        for class in schema.classes() {
            let names = resolver.resolve_class(class, profile)?;
            resolver.classes.insert(class.name.clone(), names);
        }

        Ok(resolver)
    }

    fn resolve_class(&self, class: &ClassDef, profile: &RenderProfile) -> Result<ClassNames, SchemaError> {
        let mut fields = Vec::with_capacity(class.fields.len());
        // method name -> tag that produced it
        let mut methods: HashMap<String, &str> = HashMap::new();

        for field in &class.fields {
            let stem = to_snake_case(&field.tag);
            if stem.chars().all(|c| c == '_') {
                return Err(collision(format!(
                    "field `{}` of class `{}` has no usable Rust name",
                    field.tag, class.name
                )));
            }
            let names = FieldNames {
                ident: profile.escape_keyword(&stem),
                stem,
            };

            let shape = FieldShape::of(field);
            let mut generated = vec![names.stem.clone(), names.setter()];
            match shape {
                FieldShape::Optional => generated.push(names.clearer()),
                FieldShape::Repeated => {
                    generated.push(names.adder());
                    generated.push(names.clearer());
                }
                _ => {}
            }
            if matches!(field.field_type, FieldType::Class(_)) {
                generated.push(names.mut_getter());
            }

            for method in generated {
                if RESERVED_METHODS.contains(&method.as_str()) {
                    return Err(collision(format!(
                        "field `{}` of class `{}` generates method `{}`, which the class already has",
                        field.tag, class.name, method
                    )));
                }
                if let Some(other) = methods.insert(method.clone(), &field.tag) {
                    return Err(collision(format!(
                        "fields `{}` and `{}` of class `{}` both generate `{}`",
                        other, field.tag, class.name, method
                    )));
                }
            }
            fields.push(names);
        }

        Ok(ClassNames {
            type_name: self.type_name_for(&class.name),
            fields,
        })
    }

    /// Resolved names for a class
    pub fn class(&self, class_name: &str) -> Option<&ClassNames> {
        self.classes.get(class_name)
    }

    /// Rust type name for a class
    pub fn type_name(&self, class_name: &str) -> Option<&str> {
        self.classes.get(class_name).map(|c| c.type_name.as_str())
    }

    fn type_name_for(&self, class_name: &str) -> String {
        // Already PascalCase-ish (no separators): only force the first letter
        if !class_name.contains(|c: char| c == '_' || c == '-') {
            let mut chars = class_name.chars();
            return match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            };
        }
        self.to_pascal_case(class_name)
    }

    /// Convert string to PascalCase, respecting acronyms
    fn to_pascal_case(&self, s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let mut capitalize_next = true;
        let mut current_word = String::new();

        for c in s.chars() {
            if c == '_' || c == '-' {
                if !current_word.is_empty() {
                    result.push_str(&self.case_word(&current_word));
                    current_word.clear();
                }
                capitalize_next = true;
            } else if capitalize_next {
                current_word.extend(c.to_uppercase());
                capitalize_next = false;
            } else {
                current_word.push(c);
            }
        }

        if !current_word.is_empty() {
            result.push_str(&self.case_word(&current_word));
        }

        result
    }

    /// Apply casing to a word, preserving acronyms
    fn case_word(&self, word: &str) -> String {
        let upper = word.to_uppercase();

        if self.naming_config.acronyms.contains(&upper) {
            return upper;
        }

        if self.naming_config.preserve_screaming_case
            && word.len() > 1
            && word.chars().all(|c| c.is_ascii_uppercase())
        {
            return word.to_string();
        }

        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = first.to_uppercase().to_string();
                for c in chars {
                    result.extend(c.to_lowercase());
                }
                result
            }
        }
    }
}

fn collision(message: String) -> SchemaError {
    SchemaError::NameCollision { message }
}

/// Convert a tag to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_lower = false;
        } else if c == '-' || c == '.' {
            result.push('_');
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }

    result
}
