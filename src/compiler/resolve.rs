//! Reference resolution
//!
//! Three passes over the parsed declarations:
//! 1. register every class name, so later classes can be referenced early
//! 2. resolve field types, cardinalities, constraints and defaults
//! 3. reject any class that contains itself, directly or through others

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::{ClassDef, FieldDef, FieldType, Schema};
use crate::validator::{Cardinality, ValueConstraint};
use crate::value::{parse_plain, Scalar, ScalarType};

use super::parser::{ClassDecl, ConstraintDecl, FieldDecl, Literal};

/// Resolve declarations into a checked schema
pub fn resolve(decls: Vec<ClassDecl>) -> Result<Schema, SchemaError> {
    if decls.is_empty() {
        return Err(SchemaError::EmptySchema);
    }

    // Pass 1: register class names
    let mut names = HashSet::new();
    for decl in &decls {
        if is_builtin_type(&decl.name) {
            return Err(SchemaError::NameCollision {
                message: format!("class `{}` shadows the built-in type of that name", decl.name),
            });
        }
        if !names.insert(decl.name.clone()) {
            return Err(SchemaError::DuplicateClass {
                name: decl.name.clone(),
                position: decl.position,
            });
        }
    }
    debug!(classes = names.len(), "registered schema classes");

    // Pass 2: resolve fields
    let classes = decls
        .into_iter()
        .map(|decl| resolve_class(decl, &names))
        .collect::<Result<Vec<_>, _>>()?;

    // Pass 3: containment cycles
    check_cycles(&classes)?;
    debug!("schema resolved without cycles");

    Ok(Schema::new(classes))
}

fn is_builtin_type(name: &str) -> bool {
    name == "flag" || ScalarType::from_keyword(name).is_some()
}

/// Root tag for a class with no explicit `tag`: the name with its first
/// letter lower-cased
pub fn default_tag(class_name: &str) -> String {
    let mut chars = class_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn resolve_class(decl: ClassDecl, names: &HashSet<String>) -> Result<ClassDef, SchemaError> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(decl.fields.len());

    for field in decl.fields {
        if !seen.insert(field.tag.clone()) {
            return Err(SchemaError::DuplicateField {
                class: decl.name.clone(),
                tag: field.tag,
                position: field.position,
            });
        }
        fields.push(resolve_field(&decl.name, field, names)?);
    }

    Ok(ClassDef {
        tag: decl.tag.unwrap_or_else(|| default_tag(&decl.name)),
        name: decl.name,
        doc: decl.doc,
        fields,
        position: decl.position,
    })
}

/// Context for field-level errors
struct FieldScope<'a> {
    class: &'a str,
    field: &'a FieldDecl,
}

impl FieldScope<'_> {
    fn invalid_type(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidFieldType {
            class: self.class.to_string(),
            field: self.field.tag.clone(),
            reason: reason.into(),
            position: self.field.type_ref.position,
        }
    }

    fn invalid_cardinality(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidCardinality {
            class: self.class.to_string(),
            field: self.field.tag.clone(),
            reason: reason.into(),
            position: self.field.position,
        }
    }

    fn invalid_constraint(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidConstraint {
            class: self.class.to_string(),
            field: self.field.tag.clone(),
            reason: reason.into(),
            position: self.field.position,
        }
    }

    fn invalid_default(&self, literal: &Literal, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidDefault {
            class: self.class.to_string(),
            field: self.field.tag.clone(),
            reason: reason.into(),
            position: literal.position,
        }
    }
}

fn resolve_field(class: &str, decl: FieldDecl, names: &HashSet<String>) -> Result<FieldDef, SchemaError> {
    let scope = FieldScope { class, field: &decl };

    let field_type = resolve_type(&scope, names)?;
    let cardinality = resolve_cardinality(&scope, &field_type)?;
    let constraint = match &decl.constraint {
        Some(constraint) => Some(resolve_constraint(&scope, constraint, &field_type)?),
        None => None,
    };
    let default = match &decl.default {
        Some(literal) => Some(resolve_default(
            &scope,
            literal,
            &field_type,
            cardinality,
            constraint.as_ref(),
        )?),
        None => None,
    };

    Ok(FieldDef {
        tag: decl.tag,
        field_type,
        cardinality,
        default,
        constraint,
        doc: decl.doc,
        position: decl.position,
    })
}

fn resolve_type(scope: &FieldScope<'_>, names: &HashSet<String>) -> Result<FieldType, SchemaError> {
    let type_ref = &scope.field.type_ref;
    let scalar = ScalarType::from_keyword(&type_ref.name);

    if type_ref.vector {
        return match scalar {
            Some(ty) => Ok(FieldType::Vector(ty)),
            None if type_ref.name == "flag" || names.contains(&type_ref.name) => Err(
                scope.invalid_type(format!("`[{}]`: vector elements must be scalar", type_ref.name)),
            ),
            None => Err(unknown_type(scope)),
        };
    }

    match scalar {
        Some(ty) => Ok(FieldType::Scalar(ty)),
        None if type_ref.name == "flag" => Ok(FieldType::Flag),
        None if names.contains(&type_ref.name) => Ok(FieldType::Class(type_ref.name.clone())),
        None => Err(unknown_type(scope)),
    }
}

fn unknown_type(scope: &FieldScope<'_>) -> SchemaError {
    SchemaError::UnknownTypeReference {
        class: scope.class.to_string(),
        field: scope.field.tag.clone(),
        name: scope.field.type_ref.name.clone(),
        position: scope.field.type_ref.position,
    }
}

fn resolve_cardinality(scope: &FieldScope<'_>, field_type: &FieldType) -> Result<Cardinality, SchemaError> {
    let default = if *field_type == FieldType::Flag {
        Cardinality::OPTIONAL
    } else {
        Cardinality::EXACTLY_ONE
    };
    let cardinality = scope.field.cardinality.unwrap_or(default);

    match cardinality.max {
        Some(0) => return Err(scope.invalid_cardinality("maximum must be at least 1")),
        Some(max) if max < cardinality.min => {
            return Err(scope.invalid_cardinality(format!(
                "minimum {} exceeds maximum {}",
                cardinality.min, max
            )));
        }
        _ => {}
    }
    if *field_type == FieldType::Flag && cardinality != Cardinality::OPTIONAL {
        return Err(scope.invalid_cardinality("flags are always optional"));
    }
    Ok(cardinality)
}

fn element_type(field_type: &FieldType) -> Option<ScalarType> {
    match field_type {
        FieldType::Scalar(ty) | FieldType::Vector(ty) => Some(*ty),
        FieldType::Flag | FieldType::Class(_) => None,
    }
}

fn resolve_constraint(
    scope: &FieldScope<'_>,
    constraint: &ConstraintDecl,
    field_type: &FieldType,
) -> Result<ValueConstraint, SchemaError> {
    let ty = element_type(field_type)
        .ok_or_else(|| scope.invalid_constraint("constraints apply only to scalar and vector fields"))?;

    match constraint {
        ConstraintDecl::OneOf(literals) => {
            let mut allowed = Vec::with_capacity(literals.len());
            for literal in literals {
                let typed = parse_plain(&literal.text, ty)
                    .map_err(|e| scope.invalid_constraint(e.to_string()))?;
                allowed.push(typed.to_string());
            }
            Ok(ValueConstraint::OneOf(allowed))
        }
        ConstraintDecl::Range { min: None, max: None } => {
            Err(scope.invalid_constraint("range needs at least one bound"))
        }
        ConstraintDecl::Range { min, max } => match ty {
            ScalarType::Int | ScalarType::UInt => {
                let parse = |bound: &Option<Literal>| -> Result<Option<i128>, SchemaError> {
                    bound
                        .as_ref()
                        .filter(|l| !is_open_bound(&l.text))
                        .map(|l| {
                            l.text.parse::<i128>().map_err(|_| {
                                scope.invalid_constraint(format!("`{}` is not an integer bound", l.text))
                            })
                        })
                        .transpose()
                };
                let (min, max) = (parse(min)?, parse(max)?);
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(scope.invalid_constraint("lower bound exceeds upper bound"));
                    }
                }
                Ok(ValueConstraint::IntRange { min, max })
            }
            ScalarType::Float => {
                let parse = |bound: &Option<Literal>| -> Result<Option<f64>, SchemaError> {
                    bound
                        .as_ref()
                        .filter(|l| !is_open_bound(&l.text))
                        .map(|l| {
                            l.text.parse::<f64>().map_err(|_| {
                                scope.invalid_constraint(format!("`{}` is not a numeric bound", l.text))
                            })
                        })
                        .transpose()
                };
                let (min, max) = (parse(min)?, parse(max)?);
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(scope.invalid_constraint("lower bound exceeds upper bound"));
                    }
                }
                Ok(ValueConstraint::FloatRange { min, max })
            }
            other => Err(scope.invalid_constraint(format!("range requires a numeric type, not {}", other))),
        },
    }
}

/// `inf` with or without a sign leaves that side of a range open
fn is_open_bound(text: &str) -> bool {
    matches!(text, "inf" | "+inf" | "-inf")
}

fn resolve_default(
    scope: &FieldScope<'_>,
    literal: &Literal,
    field_type: &FieldType,
    cardinality: Cardinality,
    constraint: Option<&ValueConstraint>,
) -> Result<Scalar, SchemaError> {
    let FieldType::Scalar(ty) = field_type else {
        return Err(scope.invalid_default(literal, "defaults are only allowed on scalar fields"));
    };
    if !cardinality.is_single() {
        return Err(scope.invalid_default(
            literal,
            format!("a defaulted field must occur at most once, not {}", cardinality),
        ));
    }

    let value = parse_plain(&literal.text, *ty).map_err(|e| scope.invalid_default(literal, e.to_string()))?;
    if let Some(constraint) = constraint {
        if !constraint.check(&value) {
            return Err(scope.invalid_default(
                literal,
                format!("`{}` violates {}", literal.text, constraint),
            ));
        }
    }
    Ok(value)
}

// =============================================================================
// Cycle Detection
// =============================================================================

fn check_cycles(classes: &[ClassDef]) -> Result<(), SchemaError> {
    let mut graph = DiGraph::<&str, ()>::new();
    let nodes: HashMap<&str, NodeIndex> = classes
        .iter()
        .map(|c| (c.name.as_str(), graph.add_node(c.name.as_str())))
        .collect();

    for class in classes {
        let from = nodes[class.name.as_str()];
        for field in &class.fields {
            if let Some(&to) = field.field_type.class_name().and_then(|t| nodes.get(t)) {
                graph.update_edge(from, to, ());
            }
        }
    }

    // Report the cycle containing the earliest-declared class
    let first_cycle = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .min_by_key(|scc| scc.iter().min().copied());

    match first_cycle {
        None => Ok(()),
        Some(scc) => {
            let members: HashSet<NodeIndex> = scc.iter().copied().collect();
            let start = scc.iter().min().copied().unwrap_or(scc[0]);
            let cycle = cycle_through(&graph, &members, start)
                .into_iter()
                .map(|n| graph[n].to_string())
                .collect();
            Err(SchemaError::CyclicSchemaReference { cycle })
        }
    }
}

/// A closed path `start -> ... -> start` inside one strongly connected component
fn cycle_through(graph: &DiGraph<&str, ()>, members: &HashSet<NodeIndex>, start: NodeIndex) -> Vec<NodeIndex> {
    fn extend(
        graph: &DiGraph<&str, ()>,
        members: &HashSet<NodeIndex>,
        start: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        let Some(&current) = path.last() else {
            return false;
        };
        let mut next: Vec<NodeIndex> = graph.neighbors(current).filter(|n| members.contains(n)).collect();
        next.sort();
        for n in next {
            if n == start {
                path.push(start);
                return true;
            }
            if visited.insert(n) {
                path.push(n);
                if extend(graph, members, start, path, visited) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    let mut path = vec![start];
    let mut visited = HashSet::from([start]);
    if extend(graph, members, start, &mut path, &mut visited) {
        path
    } else {
        vec![start, start]
    }
}
