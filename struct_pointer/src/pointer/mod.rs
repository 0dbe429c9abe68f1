//! The traversal interface a schema is written against.
//!
//! A schema is one function over `&mut dyn Pointer`. Running it with a
//! [`LengthPointer`] measures a record, with a [`PackPointer`] writes it and
//! with an [`UnpackPointer`] reads it back. The schema cannot tell which mode
//! it runs in, so the three always agree on the layout.

use std::fmt;
use std::str::FromStr;

use struct_buffer::{ByteOrder, ByteView, ByteViewMut};

use crate::kind::{self, Element, Kind};
use crate::literal::Key;
use crate::schema::Struct;
use crate::value::{Record, Value};
use crate::{Result, StructError};

mod length;
mod pack;
mod shape;
mod shared;
mod unpack;

pub use length::LengthPointer;
pub use pack::PackPointer;
pub use shared::Cursor;
pub use unpack::UnpackPointer;

/// Deferred work run against the region a [`Link`] points at.
pub type Body = Box<dyn for<'p> FnOnce(&mut dyn Pointer<'p>) -> Result<()>>;

/// Width of an encoded address. Addresses are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    I16,
    I32,
}

impl Address {
    pub const fn width(self) -> usize {
        match self {
            Address::I16 => 2,
            Address::I32 => 4,
        }
    }

    fn check(self, address: i64) -> Result<i64> {
        let fits = match self {
            Address::I16 => i16::try_from(address).is_ok(),
            Address::I32 => i32::try_from(address).is_ok(),
        };
        if !fits {
            return Err(StructError::AddressOverflow { address, width: self });
        }
        Ok(address)
    }

    pub(crate) fn read(self, bytes: &[u8], at: usize, order: ByteOrder) -> Result<i64> {
        Ok(match self {
            Address::I16 => bytes.read_at::<i16>(at, order)?.into(),
            Address::I32 => bytes.read_at::<i32>(at, order)?.into(),
        })
    }

    pub(crate) fn write(self, bytes: &mut [u8], at: usize, address: i64, order: ByteOrder) -> Result<()> {
        let address = self.check(address)?;
        match self {
            Address::I16 => bytes.write_at(at, address as i16, order)?,
            Address::I32 => bytes.write_at(at, address as i32, order)?,
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Address::I16 => "i16",
            Address::I32 => "i32",
        })
    }
}

impl FromStr for Address {
    type Err = StructError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "i16" => Ok(Address::I16),
            "i32" => Ok(Address::I32),
            other => Err(StructError::Unrecognized(format!("address type {other:?}"))),
        }
    }
}

/// An address slot reserved by [`Pointer::pointer`].
///
/// The encoded address of an absolute position `target` is
/// `target - origin`, where `origin` is the pointer's `offset` plus, for
/// relative pointers, the start of the window the slot was reserved in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    slot: usize,
    address: Address,
    order: ByteOrder,
    origin: i64,
    target: Option<usize>,
}

impl Link {
    pub(crate) fn new(slot: usize, address: Address, order: ByteOrder, origin: i64) -> Self {
        Link {
            slot,
            address,
            order,
            origin,
            target: None,
        }
    }

    /// Claim an address slot at the cursor's position.
    pub(crate) fn reserve(cursor: &mut Cursor, address: Address, relative: bool, offset: i64) -> Result<Self> {
        let slot = cursor.claim(address.width())?;
        let base = if relative { cursor.start() as i64 } else { 0 };
        Ok(Link::new(slot, address, cursor.order(), offset.saturating_add(base)))
    }

    /// Absolute position of the address bytes.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.address
    }

    /// The decoded target. Only known when unpacking.
    #[inline]
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    pub(crate) fn with_target(mut self, raw: i64) -> Result<Self> {
        let target = raw.checked_add(self.origin).filter(|&t| t >= 0).ok_or(
            StructError::AddressOverflow {
                address: raw,
                width: self.address,
            },
        )?;
        self.target = Some(target as usize);
        Ok(self)
    }

    /// Write the address of `target` into the slot.
    pub(crate) fn patch(&self, bytes: &mut [u8], target: usize) -> Result<()> {
        let address = (target as i64).checked_sub(self.origin).ok_or(
            StructError::AddressOverflow {
                address: i64::MIN,
                width: self.address,
            },
        )?;
        self.address.write(bytes, self.slot, address, self.order)
    }
}

/// One traversal mode over a window of a buffer.
///
/// Keys are either record slots or [`Literal`](crate::Literal)s; a `count`
/// of `None` means a single element, `Some(n)` an array of `n` elements
/// (for strings: exactly `n` bytes with no terminator).
pub trait Pointer<'a> {
    fn cursor(&self) -> &Cursor;
    fn cursor_mut(&mut self) -> &mut Cursor;

    /// Read or write a primitive field. Returns the field's value.
    fn field(&mut self, kind: Kind, key: &Key, count: Option<usize>) -> Result<Value>;

    /// Run `schema` over one nested record (`count == None`) or a list of
    /// `n` consecutive records. Literal keys are rejected.
    fn structure(&mut self, schema: &Struct, key: &Key, count: Option<usize>) -> Result<Value>;

    /// Reserve the next `length` bytes and return a pointer confined to them.
    ///
    /// The child inherits this pointer's byte order.
    fn defer(&mut self, length: usize) -> Result<Box<dyn Pointer<'a> + 'a>>;

    /// Reserve an address slot.
    fn pointer(&mut self, address: Address, relative: bool, offset: i64) -> Result<Link>;

    /// Run `body` against the region `link` points at.
    fn follow(&mut self, link: Link, body: Body) -> Result<()>;

    /// Current position, absolute or relative to the window start.
    fn getpos(&self, relative: bool) -> usize {
        self.cursor().getpos(relative)
    }

    fn start(&self) -> usize {
        self.cursor().start()
    }

    fn end(&self) -> usize {
        self.cursor().end()
    }

    /// Move to an absolute position within the window.
    fn seek(&mut self, position: usize) -> Result<()> {
        self.cursor_mut().seek(position)
    }

    fn pad(&mut self, length: usize) -> Result<()> {
        self.cursor_mut().pad(length)
    }

    fn align(&mut self, multiple: usize, offset: usize) -> Result<()> {
        self.cursor_mut().align(multiple, offset)
    }

    /// Byte order of subsequent fields.
    fn order(&mut self, order: ByteOrder) {
        self.cursor_mut().set_order(order);
    }

    fn byte_order(&self) -> ByteOrder {
        self.cursor().order()
    }
}

fn unexpected(key: &Key, expected: &'static str, found: &Value) -> StructError {
    StructError::Shape {
        key: key.to_string(),
        expected,
        found: found.type_name().to_string(),
    }
}

macro_rules! scalar_fields {
    ($($name:ident: $t:ty),* $(,)?) => {
        $(
            fn $name(&mut self, key: impl Into<Key>) -> Result<$t> {
                self.scalar::<$t>(key)
            }
        )*
    };
}

macro_rules! array_fields {
    ($($name:ident: $t:ty),* $(,)?) => {
        $(
            fn $name(&mut self, key: impl Into<Key>, count: usize) -> Result<Vec<$t>> {
                self.array::<$t>(key, count)
            }
        )*
    };
}

/// Typed sugar over [`Pointer`], available on every pointer.
///
/// ```
/// use struct_pointer::{Fields, Literal, Record, Struct, Value};
///
/// let header = Struct::new(|p| {
///     p.u8(Literal::new(0x7Fu8))?;
///     p.order("le".parse()?);
///     p.u16("version")?;
///     p.str("name")?;
///     Ok(())
/// });
///
/// let record = Record::new().with("version", 3u16).with("name", "abc");
/// let bytes = header.pack_to_vec(&record).unwrap();
/// assert_eq!(bytes, [0x7F, 3, 0, b'a', b'b', b'c', 0]);
/// assert_eq!(header.unpack_record(&bytes).unwrap(), record);
/// ```
pub trait Fields<'a>: Pointer<'a> {
    fn scalar<T: Element>(&mut self, key: impl Into<Key>) -> Result<T> {
        let key = key.into();
        let value = self.field(T::KIND, &key, None)?;
        T::from_value(&value).ok_or_else(|| unexpected(&key, T::KIND.name(), &value))
    }

    fn array<T: Element>(&mut self, key: impl Into<Key>, count: usize) -> Result<Vec<T>> {
        let key = key.into();
        let value = self.field(T::KIND, &key, Some(count))?;
        kind::elements::<T>(&value).ok_or_else(|| unexpected(&key, T::KIND.name(), &value))
    }

    scalar_fields! {
        u8: u8, u16: u16, u32: u32, u64: u64,
        i8: i8, i16: i16, i32: i32, i64: i64,
        f32: f32, f64: f64,
    }

    array_fields! {
        u8s: u8, u16s: u16, u32s: u32, u64s: u64,
        i8s: i8, i16s: i16, i32s: i32, i64s: i64,
        f32s: f32, f64s: f64,
    }

    fn bool(&mut self, key: impl Into<Key>) -> Result<bool> {
        let key = key.into();
        let value = self.field(Kind::Bool, &key, None)?;
        value.as_bool().ok_or_else(|| unexpected(&key, "bool", &value))
    }

    fn bools(&mut self, key: impl Into<Key>, count: usize) -> Result<Vec<bool>> {
        let key = key.into();
        let value = self.field(Kind::Bool, &key, Some(count))?;
        kind::booleans(&value).ok_or_else(|| unexpected(&key, "bool", &value))
    }

    /// A NUL-terminated string.
    fn str(&mut self, key: impl Into<Key>) -> Result<String> {
        self.text(key, None)
    }

    /// A string of exactly `length` bytes.
    fn str_sized(&mut self, key: impl Into<Key>, length: usize) -> Result<String> {
        self.text(key, Some(length))
    }

    #[doc(hidden)]
    fn text(&mut self, key: impl Into<Key>, count: Option<usize>) -> Result<String> {
        let key = key.into();
        match self.field(Kind::Str, &key, count)? {
            Value::Str(s) => Ok(s),
            other => Err(unexpected(&key, "a string", &other)),
        }
    }

    fn record(&mut self, schema: &Struct, key: impl Into<Key>) -> Result<Record> {
        let key = key.into();
        match self.structure(schema, &key, None)? {
            Value::Record(record) => Ok(record),
            other => Err(unexpected(&key, "a record", &other)),
        }
    }

    fn records(&mut self, schema: &Struct, key: impl Into<Key>, count: usize) -> Result<Vec<Record>> {
        let key = key.into();
        match self.structure(schema, &key, Some(count))? {
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Record(record) => Ok(record),
                    other => Err(unexpected(&key, "a record", &other)),
                })
                .collect(),
            other => Err(unexpected(&key, "a list of records", &other)),
        }
    }

    /// Reserve an address slot and follow it with `body`.
    fn forward<F>(&mut self, address: Address, relative: bool, offset: i64, body: F) -> Result<()>
    where
        F: for<'p> FnOnce(&mut dyn Pointer<'p>) -> Result<()> + 'static,
    {
        let link = self.pointer(address, relative, offset)?;
        self.follow(link, Box::new(body))
    }
}

impl<'a, P: Pointer<'a> + ?Sized> Fields<'a> for P {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_ranges() {
        let mut bytes = [0u8; 4];
        Address::I16.write(&mut bytes, 0, -2, ByteOrder::Big).unwrap();
        assert_eq!(bytes[..2], [0xFF, 0xFE]);
        assert_eq!(Address::I16.read(&bytes, 0, ByteOrder::Big).unwrap(), -2);

        let err = Address::I16.write(&mut bytes, 0, 40_000, ByteOrder::Big).unwrap_err();
        assert!(matches!(err, StructError::AddressOverflow { address: 40_000, width: Address::I16 }));
        assert!(Address::I32.write(&mut bytes, 0, 40_000, ByteOrder::Little).is_ok());
    }

    #[test]
    fn address_names() {
        assert_eq!("i32".parse::<Address>().unwrap(), Address::I32);
        assert!("u16".parse::<Address>().is_err());
        assert_eq!(Address::I16.to_string(), "i16");
    }

    #[test]
    fn link_encoding() {
        let mut bytes = [0u8; 8];
        let link = Link::new(0, Address::I32, ByteOrder::Little, 4);
        link.patch(&mut bytes, 6).unwrap();
        assert_eq!(bytes[..4], [2, 0, 0, 0]);

        let link = link.with_target(2).unwrap();
        assert_eq!(link.target(), Some(6));

        let link = Link::new(0, Address::I16, ByteOrder::Big, 0);
        assert!(link.with_target(-1).is_err());
    }
}
