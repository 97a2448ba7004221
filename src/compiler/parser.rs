//! Parser for schema files
//!
//! ```text
//! unit        := (doc* class)*
//! class       := 'class' Name ('tag' Ident)? '{' (doc* field (';' | ',')?)* '}'
//! field       := Ident ':' type modifier* ('=' literal)?
//! type        := Ident | '[' Ident ']'
//! modifier    := cardinality | constraint
//! cardinality := 'exactly-one' | 'optional' | '?' | 'zero-or-more' | '*'
//!              | 'one-or-more' | '+' | 'bounded' '(' Number '..' Number? ')'
//! constraint  := 'one-of' '(' literal (',' literal)* ')'
//!              | 'range' '(' Number? '..' Number? ')'
//! literal     := Number | String | Ident
//! ```
//!
//! Produces unresolved declarations; type names are checked by
//! [`resolve`](super::resolve).

use crate::error::{Position, SchemaError};
use crate::validator::Cardinality;

use super::lexer::{tokenize, Spanned, Tok};

// =============================================================================
// Declarations
// =============================================================================

/// A class as written
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub tag: Option<String>,
    pub doc: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub position: Position,
}

/// A field as written
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub tag: String,
    pub type_ref: TypeRef,
    /// `None` when no cardinality was written
    pub cardinality: Option<Cardinality>,
    pub constraint: Option<ConstraintDecl>,
    pub default: Option<Literal>,
    pub doc: Option<String>,
    pub position: Position,
}

/// Unresolved type name, `name` or `[name]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub vector: bool,
    pub position: Position,
}

/// Literal text, typed later against the field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub text: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintDecl {
    OneOf(Vec<Literal>),
    Range { min: Option<Literal>, max: Option<Literal> },
}

// =============================================================================
// Parser
// =============================================================================

/// Parse schema source into class declarations
pub fn parse_schema(src: &str) -> Result<Vec<ClassDecl>, SchemaError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, index: 0 };
    parser.unit()
}

struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        self.tokens.get(self.index).map_or(&Tok::Eof, |s| &s.tok)
    }

    fn position(&self) -> Position {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map_or(Position::START, |s| s.position)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == tok {
            self.bump();
            true
        } else {
            false
        }
    }

    /// `Ident ':'` starts the next field, even when the name is a modifier word
    fn at_field_start(&self) -> bool {
        matches!(self.peek(), Tok::Ident(_))
            && matches!(self.tokens.get(self.index + 1).map(|s| &s.tok), Some(Tok::Colon))
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Tok::Ident(s) if s == keyword)
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, SchemaError> {
        Err(SchemaError::Syntax {
            message: message.into(),
            position: self.position(),
        })
    }

    fn expect(&mut self, tok: Tok) -> Result<(), SchemaError> {
        if self.eat(&tok) {
            Ok(())
        } else {
            self.error(format!("expected {}, found {}", tok.describe(), self.peek().describe()))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, SchemaError> {
        match self.peek().clone() {
            Tok::Ident(name) => {
                self.bump();
                Ok(name)
            }
            other => self.error(format!("expected {}, found {}", what, other.describe())),
        }
    }

    fn docs(&mut self) -> Option<String> {
        let mut lines = Vec::new();
        while let Tok::Doc(text) = self.peek().clone() {
            self.bump();
            lines.push(text);
        }
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    fn unit(&mut self) -> Result<Vec<ClassDecl>, SchemaError> {
        let mut classes = Vec::new();
        loop {
            let doc = self.docs();
            if self.peek() == &Tok::Eof {
                return Ok(classes);
            }
            classes.push(self.class(doc)?);
        }
    }

    fn class(&mut self, doc: Option<String>) -> Result<ClassDecl, SchemaError> {
        let position = self.position();
        if !self.is_keyword("class") {
            return self.error(format!("expected `class`, found {}", self.peek().describe()));
        }
        self.bump();
        let name_position = self.position();
        let name = self.ident("class name")?;
        if name.contains('.') {
            return Err(SchemaError::Syntax {
                message: format!("class name `{}` cannot contain `.`", name),
                position: name_position,
            });
        }

        let tag = if self.is_keyword("tag") {
            self.bump();
            Some(self.ident("tag name")?)
        } else {
            None
        };

        self.expect(Tok::LBrace)?;
        let mut fields = Vec::new();
        loop {
            let field_doc = self.docs();
            if self.eat(&Tok::RBrace) {
                break;
            }
            fields.push(self.field(field_doc)?);
            if !self.eat(&Tok::Semi) {
                self.eat(&Tok::Comma);
            }
        }

        Ok(ClassDecl {
            name,
            tag,
            doc,
            fields,
            position,
        })
    }

    fn field(&mut self, doc: Option<String>) -> Result<FieldDecl, SchemaError> {
        let position = self.position();
        let tag = self.ident("field name")?;
        self.expect(Tok::Colon)?;
        let type_ref = self.type_ref()?;

        let mut cardinality = None;
        let mut constraint = None;
        while !self.at_field_start() {
            if let Some(parsed) = self.cardinality()? {
                if cardinality.replace(parsed).is_some() {
                    return self.error(format!("field `{}` has more than one cardinality", tag));
                }
            } else if let Some(parsed) = self.constraint()? {
                if constraint.replace(parsed).is_some() {
                    return self.error(format!("field `{}` has more than one constraint", tag));
                }
            } else {
                break;
            }
        }

        let default = if self.eat(&Tok::Eq) {
            Some(self.literal()?)
        } else {
            None
        };

        Ok(FieldDecl {
            tag,
            type_ref,
            cardinality,
            constraint,
            default,
            doc,
            position,
        })
    }

    fn type_ref(&mut self) -> Result<TypeRef, SchemaError> {
        let position = self.position();
        if self.eat(&Tok::LBracket) {
            let name = self.ident("element type")?;
            self.expect(Tok::RBracket)?;
            Ok(TypeRef { name, vector: true, position })
        } else {
            let name = self.ident("type name")?;
            Ok(TypeRef { name, vector: false, position })
        }
    }

    fn cardinality(&mut self) -> Result<Option<Cardinality>, SchemaError> {
        let word = match self.peek() {
            Tok::Question => "?".to_string(),
            Tok::Star => "*".to_string(),
            Tok::Plus => "+".to_string(),
            Tok::Ident(word) => word.clone(),
            _ => return Ok(None),
        };
        let cardinality = match word.as_str() {
            "exactly-one" => Cardinality::EXACTLY_ONE,
            "optional" | "?" => Cardinality::OPTIONAL,
            "zero-or-more" | "*" => Cardinality::ZERO_OR_MORE,
            "one-or-more" | "+" => Cardinality::ONE_OR_MORE,
            "bounded" => {
                self.bump();
                return self.bounded().map(Some);
            }
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(cardinality))
    }

    fn bounded(&mut self) -> Result<Cardinality, SchemaError> {
        self.expect(Tok::LParen)?;
        let min = self.count()?;
        self.expect(Tok::DotDot)?;
        let max = if matches!(self.peek(), Tok::Number(_)) {
            Some(self.count()?)
        } else {
            None
        };
        self.expect(Tok::RParen)?;
        Ok(Cardinality::bounded(min, max))
    }

    fn count(&mut self) -> Result<u32, SchemaError> {
        match self.peek().clone() {
            Tok::Number(text) => match text.parse::<u32>() {
                Ok(n) => {
                    self.bump();
                    Ok(n)
                }
                Err(_) => self.error(format!("`{}` is not a valid occurrence count", text)),
            },
            other => self.error(format!("expected occurrence count, found {}", other.describe())),
        }
    }

    fn constraint(&mut self) -> Result<Option<ConstraintDecl>, SchemaError> {
        if self.is_keyword("one-of") {
            self.bump();
            self.expect(Tok::LParen)?;
            let mut values = vec![self.literal()?];
            while self.eat(&Tok::Comma) {
                values.push(self.literal()?);
            }
            self.expect(Tok::RParen)?;
            Ok(Some(ConstraintDecl::OneOf(values)))
        } else if self.is_keyword("range") {
            self.bump();
            self.expect(Tok::LParen)?;
            let min = self.bound()?;
            self.expect(Tok::DotDot)?;
            let max = self.bound()?;
            self.expect(Tok::RParen)?;
            Ok(Some(ConstraintDecl::Range { min, max }))
        } else {
            Ok(None)
        }
    }

    fn bound(&mut self) -> Result<Option<Literal>, SchemaError> {
        let position = self.position();
        match self.peek().clone() {
            Tok::Number(text) => {
                self.bump();
                Ok(Some(Literal { text, position }))
            }
            Tok::Ident(text) if text == "inf" => {
                self.bump();
                Ok(Some(Literal { text, position }))
            }
            _ => Ok(None),
        }
    }

    fn literal(&mut self) -> Result<Literal, SchemaError> {
        let position = self.position();
        match self.peek().clone() {
            Tok::Number(text) | Tok::Str(text) | Tok::Ident(text) => {
                self.bump();
                Ok(Literal { text, position })
            }
            other => self.error(format!("expected a literal, found {}", other.describe())),
        }
    }
}
