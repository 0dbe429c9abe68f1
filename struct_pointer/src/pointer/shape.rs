//! Validation of source values against a field's declared shape.
//!
//! Measuring and packing both go through [`canonical`], so a value that
//! measures successfully also packs, into exactly the measured bytes.

use crate::kind::{self, Element, Kind};
use crate::literal::Key;
use crate::value::{Array, Record, Value};
use crate::{Result, StructError};

fn mismatch(key: &Key, expected: &'static str, found: &Value) -> StructError {
    StructError::Shape {
        key: key.to_string(),
        expected,
        found: found.type_name().to_string(),
    }
}

fn check_len(key: &Key, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(StructError::LengthMismatch {
            key: key.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

fn numeric<T: Element>(key: &Key, value: &Value, count: Option<usize>) -> Result<Value> {
    match count {
        None => T::from_value(value)
            .map(T::into_value)
            .ok_or_else(|| mismatch(key, T::KIND.name(), value)),
        Some(n) => {
            let found = value.len().ok_or_else(|| mismatch(key, "an array", value))?;
            check_len(key, n, found)?;
            kind::elements::<T>(value)
                .map(|values| Value::Array(T::into_array(values)))
                .ok_or_else(|| mismatch(key, T::KIND.name(), value))
        }
    }
}

fn boolean(key: &Key, value: &Value, count: Option<usize>) -> Result<Value> {
    match count {
        None => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| mismatch(key, "bool", value)),
        Some(n) => {
            let found = value.len().ok_or_else(|| mismatch(key, "an array", value))?;
            check_len(key, n, found)?;
            kind::booleans(value)
                .map(|values| Value::Array(Array::Bool(values)))
                .ok_or_else(|| mismatch(key, "bool", value))
        }
    }
}

fn text(key: &Key, value: &Value, count: Option<usize>) -> Result<Value> {
    let s = value.as_str().ok_or_else(|| mismatch(key, "a string", value))?;
    match count {
        Some(n) => check_len(key, n, s.len())?,
        // the terminator would end the string early on unpack
        None if s.as_bytes().contains(&0) => {
            return Err(StructError::Shape {
                key: key.to_string(),
                expected: "a string without NUL bytes",
                found: format!("{s:?}"),
            });
        }
        None => {}
    }
    Ok(Value::Str(s.to_string()))
}

/// Convert `value` into the exact variant a `kind` field with `count`
/// elements stores.
///
/// Scalars become `Value::<Kind>`, arrays become `Value::Array` of the kind's
/// element type, strings stay `Value::Str`.
pub(crate) fn canonical(kind: Kind, key: &Key, value: &Value, count: Option<usize>) -> Result<Value> {
    match kind {
        Kind::U8 => numeric::<u8>(key, value, count),
        Kind::U16 => numeric::<u16>(key, value, count),
        Kind::U32 => numeric::<u32>(key, value, count),
        Kind::U64 => numeric::<u64>(key, value, count),
        Kind::I8 => numeric::<i8>(key, value, count),
        Kind::I16 => numeric::<i16>(key, value, count),
        Kind::I32 => numeric::<i32>(key, value, count),
        Kind::I64 => numeric::<i64>(key, value, count),
        Kind::F32 => numeric::<f32>(key, value, count),
        Kind::F64 => numeric::<f64>(key, value, count),
        Kind::Bool => boolean(key, value, count),
        Kind::Str => text(key, value, count),
    }
}

/// Bytes a canonical value occupies, including the terminator of a
/// length-less string.
pub(crate) fn encoded_len(kind: Kind, value: &Value, count: Option<usize>) -> usize {
    match (value, count) {
        (Value::Str(s), None) => s.len() + 1,
        (Value::Str(s), Some(_)) => s.len(),
        (Value::Array(array), _) => array.len() * kind.width(),
        _ => kind.width(),
    }
}

/// Nested structures bind to record slots only.
pub(crate) fn field_only(key: &Key) -> Result<()> {
    if key.is_literal() {
        return Err(StructError::Unrecognized(format!(
            "{key} in a structure field; structure fields take a record key"
        )));
    }
    Ok(())
}

/// The record(s) a structure field packs from.
pub(crate) fn records<'a>(key: &Key, object: &'a Record, count: Option<usize>) -> Result<Vec<&'a Record>> {
    field_only(key)?;
    let value = key
        .field_name()
        .and_then(|name| object.get_field(name))
        .ok_or_else(|| StructError::Shape {
            key: key.to_string(),
            expected: "a record",
            found: "nothing".to_string(),
        })?;
    match count {
        None => value
            .as_record()
            .map(|record| vec![record])
            .ok_or_else(|| mismatch(key, "a record", value)),
        Some(n) => {
            let Value::List(items) = value else {
                return Err(mismatch(key, "a list of records", value));
            };
            check_len(key, n, items.len())?;
            items
                .iter()
                .map(|item| item.as_record().ok_or_else(|| mismatch(key, "a record", item)))
                .collect()
        }
    }
}
