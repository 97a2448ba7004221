//! Resolved schema model
//!
//! Produced by [`compiler::compile`](crate::compiler::compile): every type
//! reference points at a declared class and the class graph is acyclic.

use std::collections::HashMap;

use crate::error::{Error, Position, Result, SchemaError, ValidationErrors, Violation, ViolationKind};
use crate::tree::TagNode;
use crate::validator::{validate_fields, Cardinality, FieldRule, ValueConstraint};
use crate::value::{Scalar, ScalarType};

/// Value kind of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    Vector(ScalarType),
    Flag,
    /// Nested tag described by another class
    Class(String),
}

impl FieldType {
    pub fn class_name(&self) -> Option<&str> {
        match self {
            FieldType::Class(name) => Some(name),
            _ => None,
        }
    }
}

/// One field of a class
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub tag: String,
    pub field_type: FieldType,
    pub cardinality: Cardinality,
    /// Typed default, only on single scalar fields
    pub default: Option<Scalar>,
    pub constraint: Option<ValueConstraint>,
    pub doc: Option<String>,
    pub position: Position,
}

impl FieldDef {
    /// Validation rule for this field
    pub fn rule(&self) -> FieldRule {
        let rule = match &self.field_type {
            FieldType::Scalar(ty) => FieldRule::scalar(&self.tag, *ty, self.cardinality),
            FieldType::Vector(ty) => FieldRule::vector(&self.tag, *ty, self.cardinality),
            FieldType::Flag => FieldRule::flag(&self.tag),
            FieldType::Class(_) => FieldRule::nested(&self.tag, self.cardinality),
        };
        let rule = if self.default.is_some() { rule.with_default() } else { rule };
        match &self.constraint {
            Some(constraint) => rule.with_constraint(constraint.clone()),
            None => rule,
        }
    }
}

/// A class: the shape of one tag and its children
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    /// Tag name used when the class is a document root
    pub tag: String,
    pub doc: Option<String>,
    pub fields: Vec<FieldDef>,
    pub position: Position,
}

impl ClassDef {
    pub fn rules(&self) -> Vec<FieldRule> {
        self.fields.iter().map(FieldDef::rule).collect()
    }

    pub fn field(&self, tag: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.tag == tag)
    }
}

/// A compiled schema unit
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    classes: Vec<ClassDef>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build from resolved classes. Callers guarantee references resolve.
    pub(crate) fn new(classes: Vec<ClassDef>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { classes, index }
    }

    /// Classes in declaration order
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.index.get(name).map(|&i| &self.classes[i])
    }

    /// Classes not used as a field type by any other class
    pub fn root_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.iter().filter(move |candidate| {
            !self.classes.iter().any(|c| {
                c.fields
                    .iter()
                    .any(|f| f.field_type.class_name() == Some(candidate.name.as_str()))
            })
        })
    }

    /// Class to validate a document with the given root tag against:
    /// a root class with that tag, else any class with it
    pub fn class_for_root(&self, tag: &str) -> Option<&ClassDef> {
        self.root_classes()
            .find(|c| c.tag == tag)
            .or_else(|| self.classes.iter().find(|c| c.tag == tag))
    }

    /// Validate a whole document against a class, without generated code
    pub fn validate_document(&self, node: &TagNode, class_name: &str) -> Result<()> {
        let class = self.class(class_name).ok_or_else(|| {
            Error::Schema(SchemaError::UnknownClass {
                name: class_name.to_string(),
            })
        })?;

        let mut violations = Vec::new();
        if node.name() != class.tag {
            violations.push(Violation {
                path: node.name().to_string(),
                position: node.position(),
                kind: ViolationKind::WrongRootTag {
                    expected: class.tag.clone(),
                    found: node.name().to_string(),
                },
            });
        }
        self.validate_class(node, class, node.name(), &mut violations);

        Ok(ValidationErrors::new(violations).into_result()?)
    }

    fn validate_class(&self, node: &TagNode, class: &ClassDef, path: &str, out: &mut Vec<Violation>) {
        out.extend(validate_fields(node, &class.rules(), path));

        for field in &class.fields {
            let Some(nested) = field.field_type.class_name().and_then(|n| self.class(n)) else {
                continue;
            };
            let children: Vec<&TagNode> = node.children_named(&field.tag).collect();
            let repeated = children.len() > 1;
            for (index, child) in children.into_iter().enumerate() {
                let child_path = if repeated {
                    format!("{}/{}[{}]", path, field.tag, index)
                } else {
                    format!("{}/{}", path, field.tag)
                };
                self.validate_class(child, nested, &child_path, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse_document;

    fn field(tag: &str, field_type: FieldType, cardinality: Cardinality) -> FieldDef {
        FieldDef {
            tag: tag.to_string(),
            field_type,
            cardinality,
            default: None,
            constraint: None,
            doc: None,
            position: Position::START,
        }
    }

    fn class(name: &str, tag: &str, fields: Vec<FieldDef>) -> ClassDef {
        ClassDef {
            name: name.to_string(),
            tag: tag.to_string(),
            doc: None,
            fields,
            position: Position::START,
        }
    }

    fn sample() -> Schema {
        Schema::new(vec![
            class(
                "App",
                "app",
                vec![field("server", FieldType::Class("Server".to_string()), Cardinality::ONE_OR_MORE)],
            ),
            class(
                "Server",
                "server",
                vec![field("port", FieldType::Scalar(ScalarType::Int), Cardinality::EXACTLY_ONE)],
            ),
        ])
    }

    #[test]
    fn test_root_classes() {
        let schema = sample();
        let roots: Vec<&str> = schema.root_classes().map(|c| c.name.as_str()).collect();
        assert_eq!(roots, vec!["App"]);
        assert_eq!(schema.class_for_root("server").map(|c| c.name.as_str()), Some("Server"));
    }

    #[test]
    fn test_validate_document_recurses() {
        let schema = sample();
        let node = parse_document("{app {server {port 1}} {server {port x}} {server}}").unwrap();
        let err = schema.validate_document(&node, "App").unwrap_err();
        let errors = match err {
            Error::Validation(errors) => errors,
            other => panic!("unexpected error {:?}", other),
        };
        let paths: Vec<&str> = errors.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["app/server[1]/port", "app/server[2]"]);
    }

    #[test]
    fn test_validate_unknown_class() {
        let node = parse_document("{app}").unwrap();
        assert!(matches!(
            sample().validate_document(&node, "Nope"),
            Err(Error::Schema(SchemaError::UnknownClass { .. }))
        ));
    }

    #[test]
    fn test_field_rule_carries_default_and_constraint() {
        let mut def = field("port", FieldType::Scalar(ScalarType::Int), Cardinality::EXACTLY_ONE);
        def.default = Some(Scalar::Int(8080));
        def.constraint = Some(ValueConstraint::IntRange { min: Some(1), max: None });
        let rule = def.rule();
        assert!(rule.has_default);
        assert!(rule.constraint.is_some());
    }
}
