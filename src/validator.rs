//! Constraint validation
//!
//! A pure function over a node and a table of [`FieldRule`]s. Every
//! violation is collected; nothing short-circuits. Nested class fields are
//! only checked for shape here, their contents are validated against the
//! nested class's own table by the caller.

use std::fmt;

use serde::Serialize;

use crate::error::{ValidationErrors, Violation, ViolationKind};
use crate::tree::TagNode;
use crate::value::{write_scalar, Scalar, ScalarType};

// =============================================================================
// Cardinality
// =============================================================================

/// Allowed occurrence count of a tag under its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cardinality {
    pub min: u32,
    /// `None` means unbounded
    pub max: Option<u32>,
}

impl Cardinality {
    pub const EXACTLY_ONE: Cardinality = Cardinality { min: 1, max: Some(1) };
    pub const OPTIONAL: Cardinality = Cardinality { min: 0, max: Some(1) };
    pub const ZERO_OR_MORE: Cardinality = Cardinality { min: 0, max: None };
    pub const ONE_OR_MORE: Cardinality = Cardinality { min: 1, max: None };

    pub const fn bounded(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn allows(&self, count: u32) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    /// At most one occurrence
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EXACTLY_ONE => f.write_str("exactly-one"),
            Self::OPTIONAL => f.write_str("optional"),
            Self::ZERO_OR_MORE => f.write_str("zero-or-more"),
            Self::ONE_OR_MORE => f.write_str("one-or-more"),
            Cardinality { min, max: Some(max) } => write!(f, "bounded({}..{})", min, max),
            Cardinality { min, max: None } => write!(f, "bounded({}..)", min),
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// What a field's tag carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Exactly one scalar
    Scalar(ScalarType),
    /// Any number of scalars on one tag
    Vector(ScalarType),
    /// Presence only, no value and no children
    Flag,
    /// A nested class; children only
    Nested,
}

/// Restriction on individual scalar values
#[derive(Debug, Clone, PartialEq)]
pub enum ValueConstraint {
    /// Text form must be one of these
    OneOf(Vec<String>),
    IntRange { min: Option<i128>, max: Option<i128> },
    FloatRange { min: Option<f64>, max: Option<f64> },
}

impl ValueConstraint {
    pub fn one_of(values: &[&str]) -> Self {
        ValueConstraint::OneOf(values.iter().map(|v| v.to_string()).collect())
    }

    /// Whether an already-typed scalar satisfies the constraint
    pub fn check(&self, scalar: &Scalar) -> bool {
        match self {
            ValueConstraint::OneOf(allowed) => {
                let text = scalar.to_string();
                allowed.iter().any(|a| *a == text)
            }
            ValueConstraint::IntRange { min, max } => {
                let value = match scalar {
                    Scalar::Int(v) => i128::from(*v),
                    Scalar::UInt(v) => i128::from(*v),
                    _ => return false,
                };
                min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
            }
            ValueConstraint::FloatRange { min, max } => {
                let value = match scalar {
                    Scalar::Float(v) => *v,
                    Scalar::Int(v) => *v as f64,
                    Scalar::UInt(v) => *v as f64,
                    _ => return false,
                };
                min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
            }
        }
    }
}

impl fmt::Display for ValueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bound<T: fmt::Display>(b: &Option<T>) -> String {
            b.as_ref().map(|v| v.to_string()).unwrap_or_default()
        }
        match self {
            ValueConstraint::OneOf(values) => write!(f, "one-of({})", values.join(", ")),
            ValueConstraint::IntRange { min, max } => write!(f, "range({}..{})", bound(min), bound(max)),
            ValueConstraint::FloatRange { min, max } => {
                write!(f, "range({}..{})", bound(min), bound(max))
            }
        }
    }
}

/// Validation rule for one field of a class
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub tag: String,
    pub kind: RuleKind,
    pub cardinality: Cardinality,
    /// Absence is filled in by a default rather than reported
    pub has_default: bool,
    pub constraint: Option<ValueConstraint>,
}

impl FieldRule {
    fn new(tag: &str, kind: RuleKind, cardinality: Cardinality) -> Self {
        Self {
            tag: tag.to_string(),
            kind,
            cardinality,
            has_default: false,
            constraint: None,
        }
    }

    pub fn scalar(tag: &str, ty: ScalarType, cardinality: Cardinality) -> Self {
        Self::new(tag, RuleKind::Scalar(ty), cardinality)
    }

    pub fn vector(tag: &str, ty: ScalarType, cardinality: Cardinality) -> Self {
        Self::new(tag, RuleKind::Vector(ty), cardinality)
    }

    pub fn flag(tag: &str) -> Self {
        Self::new(tag, RuleKind::Flag, Cardinality::OPTIONAL)
    }

    pub fn nested(tag: &str, cardinality: Cardinality) -> Self {
        Self::new(tag, RuleKind::Nested, cardinality)
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn with_constraint(mut self, constraint: ValueConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validate a node's direct children against a rule table.
///
/// `path` names `node` in reported violations.
pub fn validate_fields(node: &TagNode, rules: &[FieldRule], path: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in rules {
        let present: Vec<&TagNode> = node.children_named(&rule.tag).collect();
        let count = u32::try_from(present.len()).unwrap_or(u32::MAX);

        if count < rule.cardinality.min && !rule.has_default {
            violations.push(Violation {
                path: path.to_string(),
                position: node.position(),
                kind: ViolationKind::MissingRequiredField {
                    field: rule.tag.clone(),
                    expected: rule.cardinality.min,
                    found: count,
                },
            });
        }

        if let Some(max) = rule.cardinality.max {
            if count > max {
                violations.push(Violation {
                    path: path.to_string(),
                    position: present.get(max as usize).and_then(|n| n.position()),
                    kind: ViolationKind::TooManyOccurrences {
                        field: rule.tag.clone(),
                        max,
                        found: count,
                    },
                });
            }
        }

        for child in present {
            check_child(child, rule, &format!("{}/{}", path, rule.tag), &mut violations);
        }
    }

    for child in node.children() {
        if !rules.iter().any(|r| r.tag == child.name()) {
            violations.push(Violation {
                path: format!("{}/{}", path, child.name()),
                position: child.position(),
                kind: ViolationKind::UnexpectedTag {
                    tag: child.name().to_string(),
                },
            });
        }
    }

    violations
}

/// Validate a node against a rule table, rooted at the node's own name
pub fn validate(node: &TagNode, rules: &[FieldRule]) -> Result<(), ValidationErrors> {
    ValidationErrors::new(validate_fields(node, rules, node.name())).into_result()
}

/// Record each child's schema cardinality on the node
pub fn annotate(node: &mut TagNode, rules: &[FieldRule]) {
    for child in node.children_mut() {
        let cardinality = rules
            .iter()
            .find(|r| r.tag == child.name())
            .map(|r| r.cardinality);
        child.set_cardinality(cardinality);
    }
}

fn check_child(child: &TagNode, rule: &FieldRule, path: &str, out: &mut Vec<Violation>) {
    let mismatch = |expected: String, found: String| Violation {
        path: path.to_string(),
        position: child.position(),
        kind: ViolationKind::TypeMismatch {
            field: rule.tag.clone(),
            expected,
            found,
        },
    };

    match rule.kind {
        RuleKind::Scalar(ty) => match child.value().items() {
            [item] => check_item(item, ty, rule, child, path, out),
            _ => out.push(mismatch(format!("a single {}", ty), child.value().describe())),
        },
        RuleKind::Vector(ty) => {
            for item in child.value().items() {
                check_item(item, ty, rule, child, path, out);
            }
        }
        RuleKind::Flag => {
            if !child.value().is_none() {
                out.push(mismatch("a flag with no value".to_string(), child.value().describe()));
            }
        }
        RuleKind::Nested => {
            if !child.value().is_none() {
                out.push(mismatch("nested tags only".to_string(), child.value().describe()));
            }
        }
    }

    if rule.kind != RuleKind::Nested {
        for grandchild in child.children() {
            out.push(Violation {
                path: format!("{}/{}", path, grandchild.name()),
                position: grandchild.position(),
                kind: ViolationKind::UnexpectedTag {
                    tag: grandchild.name().to_string(),
                },
            });
        }
    }
}

fn check_item(
    item: &Scalar,
    ty: ScalarType,
    rule: &FieldRule,
    child: &TagNode,
    path: &str,
    out: &mut Vec<Violation>,
) {
    match item.coerce(ty) {
        Ok(typed) => {
            if let Some(constraint) = &rule.constraint {
                if !constraint.check(&typed) {
                    out.push(Violation {
                        path: path.to_string(),
                        position: child.position(),
                        kind: ViolationKind::ConstraintViolation {
                            field: rule.tag.clone(),
                            value: typed.to_string(),
                            constraint: constraint.to_string(),
                        },
                    });
                }
            }
        }
        Err(_) => out.push(Violation {
            path: path.to_string(),
            position: child.position(),
            kind: ViolationKind::TypeMismatch {
                field: rule.tag.clone(),
                expected: ty.to_string(),
                found: write_scalar(item),
            },
        }),
    }
}
