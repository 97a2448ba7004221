//! Typed leaf values and their text form
//!
//! Scalars are written bare when that is unambiguous and quoted otherwise.
//! Inside quotes the escapes are `\"`, `\\`, `\n`, `\r` and `\t`; anything
//! else after a backslash is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScalarError;

// =============================================================================
// Scalar Types
// =============================================================================

/// Declared type of a leaf value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    String,
    Int,
    UInt,
    Float,
    Bool,
}

impl ScalarType {
    pub const ALL: [ScalarType; 5] = [
        ScalarType::String,
        ScalarType::Int,
        ScalarType::UInt,
        ScalarType::Float,
        ScalarType::Bool,
    ];

    /// Keyword used for this type in schema files
    pub fn keyword(self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.keyword() == keyword)
    }

    /// Rust type that stores values of this type
    pub fn rust_type(self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Int => "i64",
            ScalarType::UInt => "u64",
            ScalarType::Float => "f64",
            ScalarType::Bool => "bool",
        }
    }

    /// Name of the `ScalarType` variant, as written in generated code
    pub fn variant_name(self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::UInt => "UInt",
            ScalarType::Float => "Float",
            ScalarType::Bool => "Bool",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::UInt | ScalarType::Float)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// =============================================================================
// Scalars
// =============================================================================

/// A single typed leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::String(_) => ScalarType::String,
            Scalar::Int(_) => ScalarType::Int,
            Scalar::UInt(_) => ScalarType::UInt,
            Scalar::Float(_) => ScalarType::Float,
            Scalar::Bool(_) => ScalarType::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to the requested type.
    ///
    /// Parsed documents hold every scalar as text; this is where a declared
    /// type is applied. Values of another type go through their text form.
    pub fn coerce(&self, ty: ScalarType) -> Result<Scalar, ScalarError> {
        if self.scalar_type() == ty {
            return Ok(self.clone());
        }
        match self {
            Scalar::String(text) => parse_plain(text, ty),
            other => parse_plain(&other.to_string(), ty),
        }
    }
}

/// Raw, unquoted text of the scalar
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::UInt(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{:?}", v),
            Scalar::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::UInt(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

// =============================================================================
// Values
// =============================================================================

/// Value carried by a tag: nothing, one scalar, or a run of scalars
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Scalar(Scalar),
    Vector(Vec<Scalar>),
}

impl Value {
    pub fn scalar<T: ScalarValue>(value: &T) -> Self {
        Value::Scalar(value.to_scalar())
    }

    pub fn vector<T: ScalarValue>(items: &[T]) -> Self {
        Value::Vector(items.iter().map(ScalarValue::to_scalar).collect())
    }

    /// Shape a run of scalars the way the parser does
    pub fn from_items(mut items: Vec<Scalar>) -> Self {
        match items.len() {
            0 => Value::None,
            1 => Value::Scalar(items.remove(0)),
            _ => Value::Vector(items),
        }
    }

    /// All scalars in document order
    pub fn items(&self) -> &[Scalar] {
        match self {
            Value::None => &[],
            Value::Scalar(s) => std::slice::from_ref(s),
            Value::Vector(items) => items,
        }
    }

    pub fn is_none(&self) -> bool {
        self.items().is_empty()
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self.items() {
            [single] => Some(single),
            _ => None,
        }
    }

    /// Short human description, used in diagnostics
    pub fn describe(&self) -> String {
        match self.items() {
            [] => "no value".to_string(),
            [single] => format!("`{}`", write_scalar(single)),
            items => format!("{} values", items.len()),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

// =============================================================================
// Rust Type Bindings
// =============================================================================

/// Rust types that map onto a [`ScalarType`]
pub trait ScalarValue: Sized {
    const TYPE: ScalarType;

    fn to_scalar(&self) -> Scalar;

    fn from_scalar(scalar: &Scalar) -> Result<Self, ScalarError>;
}

macro_rules! impl_scalar_value {
    ($rust:ty, $ty:ident, $variant:ident, |$v:ident| $to:expr) => {
        impl ScalarValue for $rust {
            const TYPE: ScalarType = ScalarType::$ty;

            fn to_scalar(&self) -> Scalar {
                let $v = self;
                Scalar::$variant($to)
            }

            fn from_scalar(scalar: &Scalar) -> Result<Self, ScalarError> {
                match scalar.coerce(Self::TYPE)? {
                    Scalar::$variant(value) => Ok(value),
                    other => Err(ScalarError::Invalid {
                        text: other.to_string(),
                        expected: Self::TYPE,
                    }),
                }
            }
        }
    };
}

impl_scalar_value!(String, String, String, |v| v.clone());
impl_scalar_value!(i64, Int, Int, |v| *v);
impl_scalar_value!(u64, UInt, UInt, |v| *v);
impl_scalar_value!(f64, Float, Float, |v| *v);
impl_scalar_value!(bool, Bool, Bool, |v| *v);

// =============================================================================
// Text Conversion
// =============================================================================

/// Parse scalar text, quoted or bare, as the given type
pub fn parse_scalar(text: &str, ty: ScalarType) -> Result<Scalar, ScalarError> {
    if text.starts_with('"') {
        let unquoted = unquote(text)?;
        parse_plain(&unquoted, ty)
    } else {
        parse_plain(text, ty)
    }
}

/// Parse already-unquoted text as the given type
pub fn parse_plain(text: &str, ty: ScalarType) -> Result<Scalar, ScalarError> {
    let invalid = || ScalarError::Invalid {
        text: text.to_string(),
        expected: ty,
    };
    match ty {
        ScalarType::String => Ok(Scalar::String(text.to_string())),
        ScalarType::Int => text.parse().map(Scalar::Int).map_err(|_| invalid()),
        ScalarType::UInt => text.parse().map(Scalar::UInt).map_err(|_| invalid()),
        ScalarType::Float => text.parse().map(Scalar::Float).map_err(|_| invalid()),
        ScalarType::Bool => parse_bool(text).map(Scalar::Bool).ok_or_else(invalid),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "on", "yes", "1"];
    const FALSE: [&str; 4] = ["false", "off", "no", "0"];

    if TRUE.iter().any(|t| t.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSE.iter().any(|f| f.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}

/// Canonical text of a scalar, quoted when needed
pub fn write_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::String(s) => quote_if_needed(s),
        other => other.to_string(),
    }
}

/// Whether a string must be quoted to read back as a single scalar
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.chars().any(|c| matches!(c, '{' | '}' | '"' | '\\') || c.is_whitespace())
        || s.contains("||")
        || s.contains("|#")
        || s.contains("#|")
}

pub fn quote_if_needed(s: &str) -> String {
    if needs_quotes(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Wrap in double quotes, escaping as required
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Character produced by `\c` inside quotes
pub(crate) fn unescape(c: char) -> Option<char> {
    match c {
        '"' => Some('"'),
        '\\' => Some('\\'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        _ => None,
    }
}

/// Strip surrounding quotes and resolve escapes
pub fn unquote(text: &str) -> Result<String, ScalarError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|_| text.len() >= 2)
        .ok_or(ScalarError::UnterminatedQuote)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or(ScalarError::UnterminatedQuote)?;
                out.push(unescape(escaped).ok_or(ScalarError::InvalidEscape(escaped))?);
            }
            '"' => return Err(ScalarError::UnterminatedQuote),
            c => out.push(c),
        }
    }
    Ok(out)
}
