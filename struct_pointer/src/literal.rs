use std::fmt;

use crate::value::{FieldName, Record, Value};
use crate::{Result, StructError};

/// A constant that occupies a field's bytes without being bound to a record
/// slot.
///
/// Packing writes the constant. Unpacking checks that the bytes match it and
/// fails with [`StructError::LiteralMismatch`] otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    value: Value,
}

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Self { value: value.into() }
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Where a field's value comes from: a record slot or a literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Field(FieldName),
    Literal(Literal),
}

impl Key {
    pub fn field_name(&self) -> Option<&FieldName> {
        match self {
            Key::Field(name) => Some(name),
            Key::Literal(_) => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Key::Literal(_))
    }

    /// The value this key designates in `object`.
    pub(crate) fn resolve<'v>(&'v self, object: &'v Record, expected: &'static str) -> Result<&'v Value> {
        match self {
            Key::Literal(literal) => Ok(literal.value()),
            Key::Field(name) => object.get_field(name).ok_or_else(|| StructError::Shape {
                key: self.to_string(),
                expected,
                found: "nothing".to_string(),
            }),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => write!(f, "{name}"),
            Key::Literal(literal) => write!(f, "literal {:?}", literal.value()),
        }
    }
}

impl From<Literal> for Key {
    fn from(literal: Literal) -> Self {
        Key::Literal(literal)
    }
}

impl From<FieldName> for Key {
    fn from(name: FieldName) -> Self {
        Key::Field(name)
    }
}

impl From<&FieldName> for Key {
    fn from(name: &FieldName) -> Self {
        Key::Field(name.clone())
    }
}

macro_rules! key_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Key {
                fn from(name: $t) -> Self {
                    Key::Field(name.into())
                }
            }
        )*
    };
}

key_from!(&str, String, i32, i64, u32, usize);
