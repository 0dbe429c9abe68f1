//! Field datatypes and the conversions between [`Value`]s and primitives.

use std::fmt;
use std::str::FromStr;

use struct_buffer::Primitive;

use crate::StructError;
use crate::value::{Array, Value};

/// The datatype of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Str,
}

impl Kind {
    /// Encoded width of one element. Strings count one byte per UTF-8 byte.
    pub const fn width(self) -> usize {
        match self {
            Kind::U8 | Kind::I8 | Kind::Bool | Kind::Str => 1,
            Kind::U16 | Kind::I16 => 2,
            Kind::U32 | Kind::I32 | Kind::F32 => 4,
            Kind::U64 | Kind::I64 | Kind::F64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Bool => "bool",
            Kind::Str => "str",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = StructError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "u8" => Kind::U8,
            "u16" => Kind::U16,
            "u32" => Kind::U32,
            "u64" => Kind::U64,
            "i8" => Kind::I8,
            "i16" => Kind::I16,
            "i32" => Kind::I32,
            "i64" => Kind::I64,
            "f32" => Kind::F32,
            "f64" => Kind::F64,
            "bool" => Kind::Bool,
            "str" => Kind::Str,
            other => return Err(StructError::Unrecognized(format!("datatype {other:?}"))),
        })
    }
}

/// A numeric primitive that can live in a field.
///
/// Conversion from a [`Value`] is range-checked: integers accept any integer
/// variant whose value fits, floats accept any numeric variant.
pub trait Element: Primitive {
    const KIND: Kind;

    fn from_value(value: &Value) -> Option<Self>;
    fn into_value(self) -> Value;
    fn into_array(values: Vec<Self>) -> Array;

    /// Borrow the elements of an array of exactly this type.
    fn as_slice(array: &Array) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($($t:ty => $variant:ident, $from:expr);* $(;)?) => {
        $(
            impl Element for $t {
                const KIND: Kind = Kind::$variant;

                #[inline]
                #[allow(clippy::redundant_closure_call)]
                fn from_value(value: &Value) -> Option<Self> {
                    ($from)(value)
                }

                #[inline]
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                #[inline]
                fn into_array(values: Vec<Self>) -> Array {
                    Array::$variant(values)
                }

                #[inline]
                fn as_slice(array: &Array) -> Option<&[Self]> {
                    match array {
                        Array::$variant(values) => Some(values),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_element! {
    u8 => U8, |v: &Value| v.as_i128().and_then(|i| u8::try_from(i).ok());
    u16 => U16, |v: &Value| v.as_i128().and_then(|i| u16::try_from(i).ok());
    u32 => U32, |v: &Value| v.as_i128().and_then(|i| u32::try_from(i).ok());
    u64 => U64, |v: &Value| v.as_i128().and_then(|i| u64::try_from(i).ok());
    i8 => I8, |v: &Value| v.as_i128().and_then(|i| i8::try_from(i).ok());
    i16 => I16, |v: &Value| v.as_i128().and_then(|i| i16::try_from(i).ok());
    i32 => I32, |v: &Value| v.as_i128().and_then(|i| i32::try_from(i).ok());
    i64 => I64, |v: &Value| v.as_i128().and_then(|i| i64::try_from(i).ok());
    f32 => F32, |v: &Value| v.as_f64().map(|f| f as f32);
    f64 => F64, |v: &Value| v.as_f64();
}

/// All elements of an array-like value as `T`, or `None` if any element does
/// not convert.
pub(crate) fn elements<T: Element>(value: &Value) -> Option<Vec<T>> {
    match value {
        Value::Array(array) => match T::as_slice(array) {
            Some(values) => Some(values.to_vec()),
            None => (0..array.len())
                .map(|i| array.get(i).as_ref().and_then(T::from_value))
                .collect(),
        },
        Value::List(items) => items.iter().map(T::from_value).collect(),
        _ => None,
    }
}

/// Like [`elements`], for booleans.
pub(crate) fn booleans(value: &Value) -> Option<Vec<bool>> {
    match value {
        Value::Array(Array::Bool(values)) => Some(values.clone()),
        Value::Array(array) => (0..array.len())
            .map(|i| array.get(i).as_ref().and_then(Value::as_bool))
            .collect(),
        Value::List(items) => items.iter().map(Value::as_bool).collect(),
        _ => None,
    }
}
