//! Rust Code Emitter
//!
//! Generates one struct per schema class, with accessors, a `Default`
//! impl, and a `TagClass` impl carrying the validation table.
//!
//! Key constraints:
//! - Identifiers come from the [`NameResolver`] (already collision-checked)
//! - Storage shapes come from [`FieldShape`]
//! - Rendering options come from the [`RenderProfile`]

use crate::checksum::{Checksum, HEADER_PREFIX};
use crate::error::SchemaError;
use crate::schema::{ClassDef, FieldDef, FieldType};
use crate::validator::{Cardinality, ValueConstraint};
use crate::value::{Scalar, ScalarType};

use super::names::{ClassNames, FieldNames, NameResolver};
use super::{FieldShape, RenderProfile};

// =============================================================================
// Header
// =============================================================================

/// File header: provenance, checksum and runtime imports
pub fn emit_header(output: &mut String, source_name: &str, checksum: &Checksum, profile: &RenderProfile) {
    output.push_str(&format!(
        "//! Generated by tagfile from `{}` - DO NOT EDIT\n",
        source_name
    ));
    output.push_str("//!\n");
    output.push_str(&format!("//! {} {}\n\n", HEADER_PREFIX, checksum));

    output.push_str("#[allow(unused_imports)]\n");
    output.push_str("use std::sync::OnceLock;\n\n");
    output.push_str("#[allow(unused_imports)]\n");
    output.push_str(&format!(
        "use {}::{{Cardinality, FieldRule, LoadContext, ScalarType, TagClass, TagNode, Value, ValueConstraint}};\n",
        profile.runtime_crate
    ));
}

// =============================================================================
// Class Emission
// =============================================================================

/// Everything the emitter needs to know about one field
struct FieldPlan<'a> {
    field: &'a FieldDef,
    names: &'a FieldNames,
    shape: FieldShape,
    base: Base,
}

/// Rust type of one occurrence of a field
enum Base {
    /// `String`, handed out as `&str`
    Text,
    /// `i64`, `u64`, `f64` or `bool`
    Copy(&'static str),
    /// `Vec<elem>`, handed out as `&[elem]`
    Vector(&'static str),
    /// Generated struct
    Class(String),
}

impl Base {
    fn type_str(&self, profile: &RenderProfile) -> String {
        match self {
            Base::Text => "String".to_string(),
            Base::Copy(ty) => ty.to_string(),
            Base::Vector(elem) => profile.wrap_array(elem),
            Base::Class(name) => name.clone(),
        }
    }

    /// Parameter type and conversion expression for setters
    fn param(&self, profile: &RenderProfile) -> (String, &'static str) {
        match self {
            Base::Text => ("impl Into<String>".to_string(), "value.into()"),
            other => (other.type_str(profile), "value"),
        }
    }
}

impl FieldPlan<'_> {
    fn storage_type(&self, profile: &RenderProfile) -> String {
        let base = self.base.type_str(profile);
        match self.shape {
            FieldShape::Required | FieldShape::Defaulted => base,
            FieldShape::Optional => profile.wrap_optional(&base),
            FieldShape::Repeated => profile.wrap_array(&base),
            FieldShape::Flag => "bool".to_string(),
        }
    }

    fn tag(&self) -> String {
        format!("{:?}", self.field.tag)
    }
}

/// Emit the struct and impls for one class
pub fn emit_class(
    output: &mut String,
    class: &ClassDef,
    resolver: &NameResolver,
    profile: &RenderProfile,
) -> Result<(), SchemaError> {
    let names = resolver.class(&class.name).ok_or_else(|| SchemaError::UnknownClass {
        name: class.name.clone(),
    })?;
    let plans = plan_fields(class, names, resolver)?;
    let type_name = &names.type_name;

    // Struct
    if profile.emit_docs {
        emit_doc(output, class.doc.as_deref(), "");
    }
    if let Some(derives) = profile.derive_attr() {
        output.push_str(&derives);
        output.push('\n');
    }
    if plans.is_empty() {
        output.push_str(&format!("pub struct {} {{}}\n\n", type_name));
    } else {
        output.push_str(&format!("pub struct {} {{\n", type_name));
        for plan in &plans {
            output.push_str(&format!("    {}: {},\n", plan.names.ident, plan.storage_type(profile)));
        }
        output.push_str("}\n\n");
    }

    // Inherent impl
    output.push_str(&format!("impl {} {{\n", type_name));
    emit_constructor(output, &plans);
    for plan in &plans {
        emit_accessors(output, plan, profile);
    }
    output.push_str("}\n\n");

    // Default
    output.push_str(&format!("impl Default for {} {{\n", type_name));
    output.push_str("    fn default() -> Self {\n");
    output.push_str("        Self::new()\n");
    output.push_str("    }\n");
    output.push_str("}\n\n");

    emit_tag_class(output, class, type_name, &plans);
    Ok(())
}

fn plan_fields<'a>(
    class: &'a ClassDef,
    names: &'a ClassNames,
    resolver: &NameResolver,
) -> Result<Vec<FieldPlan<'a>>, SchemaError> {
    class
        .fields
        .iter()
        .zip(&names.fields)
        .map(|(field, field_names)| {
            let base = match &field.field_type {
                FieldType::Scalar(ScalarType::String) => Base::Text,
                FieldType::Flag => Base::Copy("bool"),
                FieldType::Scalar(ty) => Base::Copy(ty.rust_type()),
                FieldType::Vector(ty) => Base::Vector(ty.rust_type()),
                FieldType::Class(name) => Base::Class(
                    resolver
                        .type_name(name)
                        .ok_or_else(|| SchemaError::UnknownClass { name: name.clone() })?
                        .to_string(),
                ),
            };
            Ok(FieldPlan {
                field,
                names: field_names,
                shape: FieldShape::of(field),
                base,
            })
        })
        .collect()
}

fn emit_doc(output: &mut String, doc: Option<&str>, indent: &str) {
    let Some(doc) = doc else {
        return;
    };
    for line in doc.lines() {
        if line.is_empty() {
            output.push_str(&format!("{}///\n", indent));
        } else {
            output.push_str(&format!("{}/// {}\n", indent, line));
        }
    }
}

// =============================================================================
// Constructor And Accessors
// =============================================================================

fn emit_constructor(output: &mut String, plans: &[FieldPlan<'_>]) {
    output.push_str("    pub fn new() -> Self {\n");
    if plans.is_empty() {
        output.push_str("        Self {}\n");
    } else {
        output.push_str("        Self {\n");
        for plan in plans {
            let init = match &plan.field.default {
                Some(default) if plan.shape == FieldShape::Defaulted => default_literal(default),
                _ => "Default::default()".to_string(),
            };
            output.push_str(&format!("            {}: {},\n", plan.names.ident, init));
        }
        output.push_str("        }\n");
    }
    output.push_str("    }\n");
}

fn emit_method(output: &mut String, signature: &str, body: &[String]) {
    output.push('\n');
    output.push_str(&format!("    pub fn {} {{\n", signature));
    for line in body {
        output.push_str(&format!("        {}\n", line));
    }
    output.push_str("    }\n");
}

fn emit_accessors(output: &mut String, plan: &FieldPlan<'_>, profile: &RenderProfile) {
    let ident = &plan.names.ident;
    let (param, convert) = plan.base.param(profile);

    // Getter
    let (ret, body) = match (plan.shape, &plan.base) {
        (FieldShape::Flag, _) => ("bool".to_string(), format!("self.{}", ident)),
        (FieldShape::Repeated, base) => (format!("&[{}]", base.type_str(profile)), format!("&self.{}", ident)),
        (FieldShape::Optional, Base::Text) => ("Option<&str>".to_string(), format!("self.{}.as_deref()", ident)),
        (FieldShape::Optional, Base::Copy(ty)) => (format!("Option<{}>", ty), format!("self.{}", ident)),
        (FieldShape::Optional, Base::Vector(elem)) => {
            (format!("Option<&[{}]>", elem), format!("self.{}.as_deref()", ident))
        }
        (FieldShape::Optional, Base::Class(name)) => (format!("Option<&{}>", name), format!("self.{}.as_ref()", ident)),
        (_, Base::Text) => ("&str".to_string(), format!("&self.{}", ident)),
        (_, Base::Copy(ty)) => (ty.to_string(), format!("self.{}", ident)),
        (_, Base::Vector(elem)) => (format!("&[{}]", elem), format!("&self.{}", ident)),
        (_, Base::Class(name)) => (format!("&{}", name), format!("&self.{}", ident)),
    };
    output.push('\n');
    if profile.emit_docs {
        emit_doc(output, plan.field.doc.as_deref(), "    ");
    }
    output.push_str(&format!("    pub fn {}(&self) -> {} {{\n", ident, ret));
    output.push_str(&format!("        {}\n", body));
    output.push_str("    }\n");

    // Mutable access to nested classes
    if let Base::Class(name) = &plan.base {
        let (ret, body) = match plan.shape {
            FieldShape::Optional => (format!("Option<&mut {}>", name), format!("self.{}.as_mut()", ident)),
            FieldShape::Repeated => (format!("&mut [{}]", name), format!("&mut self.{}", ident)),
            _ => (format!("&mut {}", name), format!("&mut self.{}", ident)),
        };
        emit_method(output, &format!("{}(&mut self) -> {}", plan.names.mut_getter(), ret), &[body]);
    }

    // Setters
    match plan.shape {
        FieldShape::Flag => emit_method(
            output,
            &format!("{}(&mut self, value: bool) -> &mut Self", plan.names.setter()),
            &[format!("self.{} = value;", ident), "self".to_string()],
        ),
        FieldShape::Required | FieldShape::Defaulted => emit_method(
            output,
            &format!("{}(&mut self, value: {}) -> &mut Self", plan.names.setter(), param),
            &[format!("self.{} = {};", ident, convert), "self".to_string()],
        ),
        FieldShape::Optional => {
            emit_method(
                output,
                &format!("{}(&mut self, value: {}) -> &mut Self", plan.names.setter(), param),
                &[format!("self.{} = Some({});", ident, convert), "self".to_string()],
            );
            emit_method(
                output,
                &format!("{}(&mut self) -> &mut Self", plan.names.clearer()),
                &[format!("self.{} = None;", ident), "self".to_string()],
            );
        }
        FieldShape::Repeated => {
            emit_method(
                output,
                &format!(
                    "{}(&mut self, values: {}) -> &mut Self",
                    plan.names.setter(),
                    plan.storage_type(profile)
                ),
                &[format!("self.{} = values;", ident), "self".to_string()],
            );
            emit_method(
                output,
                &format!("{}(&mut self, value: {}) -> &mut Self", plan.names.adder(), param),
                &[format!("self.{}.push({});", ident, convert), "self".to_string()],
            );
            emit_method(
                output,
                &format!("{}(&mut self) -> &mut Self", plan.names.clearer()),
                &[format!("self.{}.clear();", ident), "self".to_string()],
            );
        }
    }
}

// =============================================================================
// TagClass Impl
// =============================================================================

fn emit_tag_class(output: &mut String, class: &ClassDef, type_name: &str, plans: &[FieldPlan<'_>]) {
    output.push_str(&format!("impl TagClass for {} {{\n", type_name));
    output.push_str(&format!("    const TAG: &'static str = {:?};\n\n", class.tag));

    // Rule table
    output.push_str("    fn rules() -> &'static [FieldRule] {\n");
    output.push_str("        static RULES: OnceLock<Vec<FieldRule>> = OnceLock::new();\n");
    if plans.is_empty() {
        output.push_str("        RULES.get_or_init(Vec::new)\n");
    } else {
        output.push_str("        RULES.get_or_init(|| {\n");
        output.push_str("            vec![\n");
        for plan in plans {
            output.push_str(&format!("                {},\n", rule_expr(plan.field)));
        }
        output.push_str("            ]\n");
        output.push_str("        })\n");
    }
    output.push_str("    }\n\n");

    // Reading
    if plans.is_empty() {
        output.push_str("    fn read_fields(_node: &TagNode, _cx: &mut LoadContext) -> Self {\n");
        output.push_str("        Self::new()\n");
        output.push_str("    }\n\n");
    } else {
        output.push_str("    fn read_fields(node: &TagNode, cx: &mut LoadContext) -> Self {\n");
        output.push_str("        Self {\n");
        for plan in plans {
            output.push_str(&format!("            {}: {},\n", plan.names.ident, read_expr(plan)));
        }
        output.push_str("        }\n");
        output.push_str("    }\n\n");
    }

    // Writing
    if plans.is_empty() {
        output.push_str("    fn write_fields(&self, _node: &mut TagNode) {}\n");
    } else {
        output.push_str("    fn write_fields(&self, node: &mut TagNode) {\n");
        for plan in plans {
            emit_write(output, plan);
        }
        output.push_str("    }\n");
    }
    output.push_str("}\n");
}

fn rule_expr(field: &FieldDef) -> String {
    let tag = format!("{:?}", field.tag);
    let card = cardinality_expr(field.cardinality);
    let mut expr = match &field.field_type {
        FieldType::Scalar(ty) => format!("FieldRule::scalar({}, ScalarType::{}, {})", tag, ty.variant_name(), card),
        FieldType::Vector(ty) => format!("FieldRule::vector({}, ScalarType::{}, {})", tag, ty.variant_name(), card),
        FieldType::Flag => format!("FieldRule::flag({})", tag),
        FieldType::Class(_) => format!("FieldRule::nested({}, {})", tag, card),
    };
    if field.default.is_some() {
        expr.push_str(".with_default()");
    }
    if let Some(constraint) = &field.constraint {
        expr.push_str(&format!(".with_constraint({})", constraint_expr(constraint)));
    }
    expr
}

fn read_expr(plan: &FieldPlan<'_>) -> String {
    let tag = plan.tag();
    let method = match (&plan.base, plan.shape) {
        (_, FieldShape::Flag) => "flag",
        (_, FieldShape::Defaulted) => {
            let default = plan.field.default.as_ref().map(default_literal).unwrap_or_default();
            return format!("cx.scalar_or(node, {}, {})", tag, default);
        }
        (Base::Vector(_), FieldShape::Required) => "vector",
        (Base::Vector(_), FieldShape::Optional) => "optional_vector",
        (Base::Vector(_), FieldShape::Repeated) => "vectors",
        (Base::Class(_), FieldShape::Required) => "nested",
        (Base::Class(_), FieldShape::Optional) => "optional_nested",
        (Base::Class(_), FieldShape::Repeated) => "nested_all",
        (_, FieldShape::Required) => "scalar",
        (_, FieldShape::Optional) => "optional",
        (_, FieldShape::Repeated) => "scalars",
    };
    format!("cx.{}(node, {})", method, tag)
}

fn emit_write(output: &mut String, plan: &FieldPlan<'_>) {
    let ident = &plan.names.ident;
    let tag = plan.tag();
    let write_one = |value: &str| match &plan.base {
        Base::Class(_) => format!("node.append_child({}.to_node({}));", value, tag),
        Base::Vector(_) => format!("node.create_child({}).set_value(Value::vector({}));", tag, value),
        _ => format!("node.create_child({}).set_value(Value::scalar({}));", tag, value),
    };

    match plan.shape {
        FieldShape::Flag => {
            output.push_str(&format!("        if self.{} {{\n", ident));
            output.push_str(&format!("            node.create_child({});\n", tag));
            output.push_str("        }\n");
        }
        FieldShape::Required | FieldShape::Defaulted => {
            let value = match plan.base {
                Base::Class(_) => format!("self.{}", ident),
                _ => format!("&self.{}", ident),
            };
            output.push_str(&format!("        {}\n", write_one(&value)));
        }
        FieldShape::Optional => {
            output.push_str(&format!("        if let Some(value) = &self.{} {{\n", ident));
            output.push_str(&format!("            {}\n", write_one("value")));
            output.push_str("        }\n");
        }
        FieldShape::Repeated => {
            output.push_str(&format!("        for value in &self.{} {{\n", ident));
            output.push_str(&format!("            {}\n", write_one("value")));
            output.push_str("        }\n");
        }
    }
}

// =============================================================================
// Literals
// =============================================================================

fn cardinality_expr(cardinality: Cardinality) -> String {
    match cardinality {
        Cardinality::EXACTLY_ONE => "Cardinality::EXACTLY_ONE".to_string(),
        Cardinality::OPTIONAL => "Cardinality::OPTIONAL".to_string(),
        Cardinality::ZERO_OR_MORE => "Cardinality::ZERO_OR_MORE".to_string(),
        Cardinality::ONE_OR_MORE => "Cardinality::ONE_OR_MORE".to_string(),
        Cardinality { min, max } => format!("Cardinality::bounded({}, {})", min, option_literal(max)),
    }
}

fn constraint_expr(constraint: &ValueConstraint) -> String {
    match constraint {
        ValueConstraint::OneOf(values) => {
            let values: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
            format!("ValueConstraint::one_of(&[{}])", values.join(", "))
        }
        ValueConstraint::IntRange { min, max } => format!(
            "ValueConstraint::IntRange {{ min: {}, max: {} }}",
            option_literal(*min),
            option_literal(*max)
        ),
        ValueConstraint::FloatRange { min, max } => format!(
            "ValueConstraint::FloatRange {{ min: {}, max: {} }}",
            min.map_or("None".to_string(), |v| format!("Some({})", float_literal(v))),
            max.map_or("None".to_string(), |v| format!("Some({})", float_literal(v)))
        ),
    }
}

fn option_literal<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => format!("Some({})", v),
        None => "None".to_string(),
    }
}

fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "f64::NAN".to_string()
    } else if value == f64::INFINITY {
        "f64::INFINITY".to_string()
    } else if value == f64::NEG_INFINITY {
        "f64::NEG_INFINITY".to_string()
    } else {
        format!("{:?}", value)
    }
}

/// Rust expression for a schema default
fn default_literal(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => format!("{:?}.to_string()", s),
        Scalar::Int(v) => v.to_string(),
        Scalar::UInt(v) => v.to_string(),
        Scalar::Float(v) => float_literal(*v),
        Scalar::Bool(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;

    fn render(src: &str) -> String {
        let schema = compile(src).unwrap();
        let profile = RenderProfile::rust();
        let resolver = NameResolver::build(&schema, &profile).unwrap();
        let mut output = String::new();
        for class in schema.classes() {
            emit_class(&mut output, class, &resolver, &profile).unwrap();
        }
        output
    }

    #[test]
    fn test_struct_storage_types() {
        let code = render(
            "class Server { host: string; port: int = 8080; alias: string ?; tag: string *; \
             weights: [float] ?; tls: flag; peer: Peer * } class Peer { addr: string }",
        );
        assert!(code.contains("pub struct Server {\n    host: String,\n    port: i64,\n"));
        assert!(code.contains("    alias: Option<String>,\n"));
        assert!(code.contains("    tag: Vec<String>,\n"));
        assert!(code.contains("    weights: Option<Vec<f64>>,\n"));
        assert!(code.contains("    tls: bool,\n"));
        assert!(code.contains("    peer: Vec<Peer>,\n"));
    }

    #[test]
    fn test_accessors() {
        let code = render("class Server { host: string; tag: string *; alias: string ? }");
        assert!(code.contains("    pub fn host(&self) -> &str {\n        &self.host\n    }\n"));
        assert!(code.contains("    pub fn set_host(&mut self, value: impl Into<String>) -> &mut Self {\n"));
        assert!(code.contains("    pub fn add_tag(&mut self, value: impl Into<String>) -> &mut Self {\n        self.tag.push(value.into());\n"));
        assert!(code.contains("    pub fn alias(&self) -> Option<&str> {\n        self.alias.as_deref()\n"));
        assert!(code.contains("    pub fn clear_alias(&mut self) -> &mut Self {\n        self.alias = None;\n"));
    }

    #[test]
    fn test_nested_class_accessors() {
        let code = render("class App { server: Server } class Server { }");
        assert!(code.contains("    pub fn server_mut(&mut self) -> &mut Server {\n"));
        assert!(code.contains("        node.append_child(self.server.to_node(\"server\"));\n"));
        assert!(code.contains("            server: cx.nested(node, \"server\"),\n"));
        assert!(code.contains("pub struct Server {}\n"));
        assert!(code.contains("RULES.get_or_init(Vec::new)"));
    }

    #[test]
    fn test_rule_table() {
        let code = render(
            "class S { port: uint range(1..65535) = 80; mode: string one-of(a, b) ?; \
             ids: int bounded(2..4); debug: flag }",
        );
        assert!(code.contains(
            "FieldRule::scalar(\"port\", ScalarType::UInt, Cardinality::EXACTLY_ONE).with_default()\
             .with_constraint(ValueConstraint::IntRange { min: Some(1), max: Some(65535) }),"
        ));
        assert!(code.contains(
            "FieldRule::scalar(\"mode\", ScalarType::String, Cardinality::OPTIONAL)\
             .with_constraint(ValueConstraint::one_of(&[\"a\", \"b\"])),"
        ));
        assert!(code.contains("FieldRule::scalar(\"ids\", ScalarType::Int, Cardinality::bounded(2, Some(4))),"));
        assert!(code.contains("FieldRule::flag(\"debug\"),"));
        assert!(code.contains("            port: cx.scalar_or(node, \"port\", 80),\n"));
    }

    #[test]
    fn test_keyword_field() {
        let code = render("class Rule { type: string }");
        assert!(code.contains("    r#type: String,\n"));
        assert!(code.contains("    pub fn r#type(&self) -> &str {\n"));
        assert!(code.contains("    pub fn set_type(&mut self"));
        assert!(code.contains("node.create_child(\"type\").set_value(Value::scalar(&self.r#type));"));
    }

    #[test]
    fn test_literals() {
        assert_eq!(default_literal(&Scalar::String("a \"b\"".to_string())), "\"a \\\"b\\\"\".to_string()");
        assert_eq!(default_literal(&Scalar::Float(8080.0)), "8080.0");
        assert_eq!(default_literal(&Scalar::Float(f64::NEG_INFINITY)), "f64::NEG_INFINITY");
        assert_eq!(default_literal(&Scalar::Int(-3)), "-3");
        assert_eq!(cardinality_expr(Cardinality::bounded(1, None)), "Cardinality::ONE_OR_MORE");
        assert_eq!(cardinality_expr(Cardinality::bounded(3, None)), "Cardinality::bounded(3, None)");
    }

    #[test]
    fn test_docs_follow_profile() {
        let src = "/// Listening endpoint.\nclass Server {\n/// Host name.\nhost: string }";
        assert!(render(src).starts_with("/// Listening endpoint.\n#[derive(Debug, Clone, PartialEq)]\n"));
        assert!(render(src).contains("    /// Host name.\n    pub fn host(&self)"));
    }
}
