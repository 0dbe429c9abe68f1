//! The structured values that schemas read from and write to.

use std::collections::BTreeMap;
use std::fmt;

/// Key of a slot in a [`Record`]: either a name or an integer index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldName {
    Index(i64),
    Name(String),
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldName::Index(i) => write!(f, "{i}"),
            FieldName::Name(name) => write!(f, "{name:?}"),
        }
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        FieldName::Name(name.to_string())
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        FieldName::Name(name)
    }
}

macro_rules! field_name_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldName {
                fn from(index: $t) -> Self {
                    FieldName::Index(index as i64)
                }
            }
        )*
    };
}

field_name_from_int!(i32, i64, u32, usize);

/// A typed array of numerics or booleans.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
}

macro_rules! array_dispatch {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            Array::U8($values) => $body,
            Array::U16($values) => $body,
            Array::U32($values) => $body,
            Array::U64($values) => $body,
            Array::I8($values) => $body,
            Array::I16($values) => $body,
            Array::I32($values) => $body,
            Array::I64($values) => $body,
            Array::F32($values) => $body,
            Array::F64($values) => $body,
            Array::Bool($values) => $body,
        }
    };
}

impl Array {
    pub fn len(&self) -> usize {
        array_dispatch!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `index` as a scalar [`Value`].
    pub fn get(&self, index: usize) -> Option<Value> {
        array_dispatch!(self, values => values.get(index).map(|v| Value::from(*v)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Array::U8(_) => "u8 array",
            Array::U16(_) => "u16 array",
            Array::U32(_) => "u32 array",
            Array::U64(_) => "u64 array",
            Array::I8(_) => "i8 array",
            Array::I16(_) => "i16 array",
            Array::I32(_) => "i32 array",
            Array::I64(_) => "i64 array",
            Array::F32(_) => "f32 array",
            Array::F64(_) => "f64 array",
            Array::Bool(_) => "bool array",
        }
    }
}

/// A structured value: scalars, strings, typed arrays, nested records and
/// lists of nested records.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Str(String),
    Array(Array),
    Record(Record),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Array(array) => array.type_name(),
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }

    /// The integer held by an integer variant.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v.into()),
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Any numeric variant as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// `Bool`, or a number read as truthy when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => self.as_f64().map(|v| v != 0.0),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Element count of array-like values.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.len()),
            Value::List(items) => Some(items.len()),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }

            impl From<Vec<$t>> for Value {
                fn from(v: Vec<$t>) -> Self {
                    Value::Array(Array::$variant(v))
                }
            }

            impl From<Vec<$t>> for Array {
                fn from(v: Vec<$t>) -> Self {
                    Array::$variant(v)
                }
            }
        )*
    };
}

value_from!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
);

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Vec<Record>> for Value {
    fn from(records: Vec<Record>) -> Self {
        Value::List(records.into_iter().map(Value::Record).collect())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// A mapping from field names to values.
///
/// Serves as the source of a pack and the target of an unpack.
///
/// ```
/// use struct_pointer::{Record, Value};
///
/// let record = Record::new().with("a", 10u8).with(0, "zero");
/// assert_eq!(record.get("a"), Some(&Value::U8(10)));
/// assert_eq!(record.get(0), Some(&Value::from("zero")));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<FieldName, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<FieldName>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: impl Into<FieldName>) -> Option<&Value> {
        self.fields.get(&name.into())
    }

    /// Lookup without converting the key.
    #[inline]
    pub fn get_field(&self, name: &FieldName) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: impl Into<FieldName>) -> Option<Value> {
        self.fields.remove(&name.into())
    }

    pub fn contains(&self, name: impl Into<FieldName>) -> bool {
        self.fields.contains_key(&name.into())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &Value)> {
        self.fields.iter()
    }
}

impl<K: Into<FieldName>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_keys() {
        let mut record = Record::new();
        record.insert("name", "x");
        record.insert(3, 1.5f32);

        assert_eq!(record.len(), 2);
        assert!(record.contains("name"));
        assert!(record.contains(3usize));
        assert!(!record.contains("3"));
        assert_eq!(record.remove(3), Some(Value::F32(1.5)));
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::I8(-3).as_i128(), Some(-3));
        assert_eq!(Value::U64(u64::MAX).as_i128(), Some(u64::MAX as i128));
        assert_eq!(Value::F32(1.0).as_i128(), None);
        assert_eq!(Value::U16(2).as_f64(), Some(2.0));
        assert_eq!(Value::U8(0).as_bool(), Some(false));
        assert_eq!(Value::I32(-1).as_bool(), Some(true));
        assert_eq!(Value::from("x").as_bool(), None);
    }

    #[test]
    fn array_elements() {
        let array = Array::from(vec![1u16, 2, 3]);
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(1), Some(Value::U16(2)));
        assert_eq!(array.get(3), None);
        assert_eq!(Value::from(array).len(), Some(3));
    }

    #[test]
    fn from_iterator() {
        let record: Record = [("a", 1u8), ("b", 2u8)].into_iter().collect();
        assert_eq!(record.get("b"), Some(&Value::U8(2)));
    }
}
