//! Schemas built from a list of field descriptors instead of a hand-written
//! traversal.
//!
//! ```
//! use struct_pointer::layout::Layout;
//! use struct_pointer::{Kind, Record, Value};
//!
//! let schema = Layout::new()
//!     .literal(Kind::U8, 0xAAu8)
//!     .scalar(Kind::U16, "len")
//!     .counted(Kind::U8, "data", "len")
//!     .into_struct();
//!
//! let record = Record::new().with("len", 3u16).with("data", vec![7u8, 8, 9]);
//! let bytes = schema.pack_to_vec(&record).unwrap();
//! assert_eq!(bytes, [0xAA, 0, 3, 7, 8, 9]);
//! assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use struct_buffer::ByteOrder;

use crate::kind::Kind;
use crate::literal::{Key, Literal};
use crate::pointer::Pointer;
use crate::schema::Struct;
use crate::value::{FieldName, Value};
use crate::{Result, StructError};

#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar(Kind),
    Struct(Struct),
    /// Skip this many bytes.
    Padding(usize),
    /// Align to a multiple of this many bytes.
    Align(usize),
}

/// Element count of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Count {
    Single,
    Fixed(usize),
    /// The value of an earlier field of the same layout.
    Field(FieldName),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub ty: FieldType,
    pub key: Key,
    pub count: Count,
    pub order: ByteOrder,
}

impl FieldSpec {
    pub fn new(ty: FieldType, key: impl Into<Key>) -> Self {
        FieldSpec {
            ty,
            key: key.into(),
            count: Count::Single,
            order: ByteOrder::default(),
        }
    }

    pub fn count(mut self, count: Count) -> Self {
        self.count = count;
        self
    }

    pub fn order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    /// Build a spec from its textual form: a datatype name (or `pad` /
    /// `align`, which take their byte count from `count`) and `"be"` /
    /// `"le"`.
    pub fn parse(ty: &str, key: impl Into<Key>, count: Count, order: &str) -> Result<Self> {
        let fixed = |what: &str| match &count {
            Count::Fixed(n) => Ok(*n),
            _ => Err(StructError::Unrecognized(format!("{what} without a fixed byte count"))),
        };
        let ty = match ty {
            "pad" => FieldType::Padding(fixed("padding")?),
            "align" => FieldType::Align(fixed("alignment")?),
            name => FieldType::Scalar(name.parse()?),
        };
        let order = order.parse()?;
        Ok(FieldSpec::new(ty, key).count(count).order(order))
    }
}

/// An ordered list of field descriptors.
///
/// Fields added after a call to [`order`](Self::order) use that byte order.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    fields: Vec<FieldSpec>,
    order: ByteOrder,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    /// Append a spec as is, keeping its own byte order.
    pub fn push(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    fn add(self, ty: FieldType, key: impl Into<Key>, count: Count) -> Self {
        let order = self.order;
        self.push(FieldSpec::new(ty, key).count(count).order(order))
    }

    pub fn scalar(self, kind: Kind, key: impl Into<Key>) -> Self {
        self.add(FieldType::Scalar(kind), key, Count::Single)
    }

    pub fn array(self, kind: Kind, key: impl Into<Key>, count: usize) -> Self {
        self.add(FieldType::Scalar(kind), key, Count::Fixed(count))
    }

    /// An array whose length is stored in the earlier field `count`.
    pub fn counted(self, kind: Kind, key: impl Into<Key>, count: impl Into<FieldName>) -> Self {
        self.add(FieldType::Scalar(kind), key, Count::Field(count.into()))
    }

    /// A constant field. Arrays and strings take their length from the value.
    pub fn literal(self, kind: Kind, value: impl Into<Value>) -> Self {
        let value = value.into();
        let count = match &value {
            Value::Str(s) => Count::Fixed(s.len()),
            other => other.len().map_or(Count::Single, Count::Fixed),
        };
        self.add(FieldType::Scalar(kind), Literal::new(value), count)
    }

    pub fn structure(self, schema: &Struct, key: impl Into<Key>) -> Self {
        self.add(FieldType::Struct(schema.clone()), key, Count::Single)
    }

    pub fn structures(self, schema: &Struct, key: impl Into<Key>, count: Count) -> Self {
        self.add(FieldType::Struct(schema.clone()), key, count)
    }

    pub fn padding(self, length: usize) -> Self {
        self.add(FieldType::Padding(length), FieldName::Index(-1), Count::Single)
    }

    pub fn align(self, multiple: usize) -> Self {
        self.add(FieldType::Align(multiple), FieldName::Index(-1), Count::Single)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// A schema replaying these descriptors in order.
    pub fn into_struct(self) -> Struct {
        let fields: Arc<[FieldSpec]> = self.fields.into();
        Struct::new(move |p| replay(&fields, p))
    }
}

impl FromIterator<FieldSpec> for Layout {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        Layout {
            fields: iter.into_iter().collect(),
            order: ByteOrder::default(),
        }
    }
}

fn replay(fields: &[FieldSpec], p: &mut dyn Pointer<'_>) -> Result<()> {
    let mut seen: HashMap<&FieldName, Value> = HashMap::new();
    for spec in fields {
        p.order(spec.order);
        let count = resolve_count(&spec.count, &seen)?;
        match &spec.ty {
            FieldType::Scalar(kind) => {
                let value = p.field(*kind, &spec.key, count)?;
                if let Some(name) = spec.key.field_name() {
                    seen.insert(name, value);
                }
            }
            FieldType::Struct(schema) => {
                p.structure(schema, &spec.key, count)?;
            }
            FieldType::Padding(length) => p.pad(*length)?,
            FieldType::Align(multiple) => p.align(*multiple, 0)?,
        }
    }
    Ok(())
}

fn resolve_count(count: &Count, seen: &HashMap<&FieldName, Value>) -> Result<Option<usize>> {
    match count {
        Count::Single => Ok(None),
        Count::Fixed(n) => Ok(Some(*n)),
        Count::Field(name) => {
            let shape = |found: String| StructError::Shape {
                key: name.to_string(),
                expected: "a non-negative integer count",
                found,
            };
            let value = seen
                .get(name)
                .ok_or_else(|| shape("a field not evaluated yet".to_string()))?;
            value
                .as_i128()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| shape(format!("{value:?}")))
        }
    }
}
