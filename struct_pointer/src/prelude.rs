//! Convenience re-exports for writing schemas

pub use crate::layout::{Count, FieldSpec, FieldType, Layout};
pub use crate::pointer::{Address, Fields, Link, Pointer};
pub use crate::{Array, FieldName, Key, Kind, Literal, Record, Result, Struct, StructError, Value};

pub use struct_buffer::ByteOrder;
