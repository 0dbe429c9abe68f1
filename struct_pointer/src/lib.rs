//! Struct-pointer: declarative binary layouts over byte buffers.
//!
//! A [`Struct`] is defined by one traversal function written against the
//! [`Pointer`] interface. The same function
//! - measures a [`Record`] ([`Struct::length`])
//! - packs it into bytes ([`Struct::pack`])
//! - unpacks bytes back into a record ([`Struct::unpack`])
//!
//! Fields may be bound to record slots or to [`Literal`] constants that are
//! written on pack and verified on unpack. Byte order can change between
//! fields. Nested schemas, reserved regions ([`Pointer::defer`]) and
//! forward pointers ([`Pointer::pointer`] / [`Pointer::follow`]) are
//! supported; forward pointers are placed after all other data and patched
//! once their target is known.
//!
//! ```
//! use struct_pointer::prelude::*;
//!
//! let entry = Struct::new(|p| {
//!     p.u16("id")?;
//!     p.forward(Address::I16, false, 0, |p| {
//!         p.str("label")?;
//!         Ok(())
//!     })
//! });
//!
//! let record = Record::new().with("id", 7u16).with("label", "hi");
//! let bytes = entry.pack_to_vec(&record).unwrap();
//! assert_eq!(bytes, [0, 7, 0, 4, b'h', b'i', 0]);
//! ```
//!
//! The `forward` body must be `'static`: it captures owned data only and
//! reads its values from the record through the pointer.
//!
//! ## Features
//! - `mmap`: pack into and unpack from memory-mapped files (see [`io`])

pub mod error;
pub mod kind;
pub mod layout;
pub mod literal;
pub mod pointer;
pub mod prelude;
pub mod schema;
pub mod value;

#[cfg(feature = "mmap")]
pub mod io;

pub use error::{Result, StructError};
pub use kind::{Element, Kind};
pub use literal::{Key, Literal};
pub use pointer::{Address, Fields, Link, Pointer};
pub use schema::Struct;
pub use value::{Array, FieldName, Record, Value};

// Re-export the buffer layer for convenience
pub use struct_buffer;
pub use struct_buffer::ByteOrder;
