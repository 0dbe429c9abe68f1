use std::cell::RefCell;
use std::rc::Rc;

use struct_buffer::{ByteOrder, ByteView};

use crate::kind::{Element, Kind};
use crate::literal::Key;
use crate::schema::Struct;
use crate::value::{Array, Record, Value};
use crate::{Result, StructError};

use super::{shape, Address, Body, Cursor, Link, Pointer};

#[derive(Clone)]
struct Context<'a> {
    bytes: &'a [u8],
    /// End of the outermost window; followed links may land up to here.
    end: usize,
    object: Rc<RefCell<Record>>,
}

macro_rules! read_value {
    ($bytes:expr, $key:expr, $at:expr, $count:expr, $order:expr, $kind:expr; $($variant:ident: $t:ty),*) => {
        match $kind {
            $(Kind::$variant => match $count {
                None => $bytes.read_at::<$t>($at, $order)?.into_value(),
                Some(n) => Value::Array(<$t>::into_array($bytes.read_array_at::<$t>($at, n, $order)?)),
            },)*
            Kind::Bool => match $count {
                None => Value::Bool($bytes.read_at::<u8>($at, $order)? != 0),
                Some(n) => Value::Array(Array::Bool($bytes.span($at, n)?.iter().map(|&b| b != 0).collect())),
            },
            Kind::Str => Value::Str(decode_text($key, $at, $bytes.span($at, $count.unwrap_or(0))?)?),
        }
    };
}

/// Text fields must hold valid UTF-8; anything else would not pack back to
/// the same bytes.
fn decode_text(key: &Key, at: usize, bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| StructError::Shape {
            key: key.to_string(),
            expected: "UTF-8 text",
            found: format!("an invalid byte at {}", at + err.valid_up_to()),
        })
}

impl Context<'_> {
    fn read(&self, kind: Kind, key: &Key, at: usize, count: Option<usize>, order: ByteOrder) -> Result<Value> {
        let bytes = self.bytes;
        Ok(read_value!(bytes, key, at, count, order, kind;
            U8: u8, U16: u16, U32: u32, U64: u64,
            I8: i8, I16: i16, I32: i32, I64: i64,
            F32: f32, F64: f64))
    }
}

/// Reads a record out of a byte buffer.
///
/// Fields keyed by name are stored into the target record; literal fields
/// are compared against their constant. Followed links run immediately at
/// their decoded target.
pub struct UnpackPointer<'a> {
    context: Context<'a>,
    cursor: Cursor,
}

impl<'a> UnpackPointer<'a> {
    /// A pointer over `bytes[start..end]` storing fields into `object`.
    pub fn new(bytes: &'a [u8], object: Rc<RefCell<Record>>, start: usize, end: usize) -> Result<Self> {
        let cursor = Cursor::new(start, start, end, bytes.len())?;
        Ok(UnpackPointer {
            context: Context { bytes, end, object },
            cursor,
        })
    }

    fn store(&self, kind: Kind, key: &Key, count: Option<usize>, value: Value) -> Result<Value> {
        match key {
            Key::Field(name) => {
                self.context.object.borrow_mut().insert(name.clone(), value.clone());
                Ok(value)
            }
            Key::Literal(literal) => {
                let matches = shape::canonical(kind, key, literal.value(), count)
                    .is_ok_and(|expected| expected == value);
                if !matches {
                    return Err(StructError::LiteralMismatch {
                        expected: format!("{:?}", literal.value()),
                        found: format!("{value:?}"),
                    });
                }
                Ok(value)
            }
        }
    }

    /// Unpack one nested record into a fresh record from the schema's
    /// factory.
    fn nested(&mut self, schema: &Struct) -> Result<Record> {
        let object = Rc::new(RefCell::new(schema.create()));
        let mut nested = UnpackPointer {
            context: Context {
                object: Rc::clone(&object),
                ..self.context.clone()
            },
            cursor: self.cursor.nested(),
        };
        schema.run(&mut nested)?;
        self.cursor.seek(nested.cursor.getpos(false))?;
        drop(nested);
        Ok(object.take())
    }
}

impl<'a> Pointer<'a> for UnpackPointer<'a> {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    fn field(&mut self, kind: Kind, key: &Key, count: Option<usize>) -> Result<Value> {
        let order = self.cursor.order();
        let value = match (kind, count) {
            (Kind::Str, None) => {
                let from = self.cursor.getpos(false);
                let end = self.cursor.end();
                // a missing terminator ends the string at the window end
                let nul = self.context.bytes.find_byte(from, end, 0)?;
                let len = nul.unwrap_or(end) - from;
                let at = self.cursor.claim(len)?;
                if nul.is_some() {
                    self.cursor.pad(1)?;
                }
                self.context.read(kind, key, at, Some(len), order)?
            }
            _ => {
                let at = self.cursor.claim_elements(kind.width(), count.unwrap_or(1))?;
                self.context.read(kind, key, at, count, order)?
            }
        };
        self.store(kind, key, count, value)
    }

    fn structure(&mut self, schema: &Struct, key: &Key, count: Option<usize>) -> Result<Value> {
        shape::field_only(key)?;
        let value = match count {
            None => Value::Record(self.nested(schema)?),
            Some(n) => Value::List(
                (0..n)
                    .map(|_| self.nested(schema).map(Value::Record))
                    .collect::<Result<_>>()?,
            ),
        };
        if let Key::Field(name) = key {
            self.context.object.borrow_mut().insert(name.clone(), value.clone());
        }
        Ok(value)
    }

    fn defer(&mut self, length: usize) -> Result<Box<dyn Pointer<'a> + 'a>> {
        let cursor = self.cursor.region(length)?;
        self.cursor.pad(length)?;
        Ok(Box::new(UnpackPointer {
            context: self.context.clone(),
            cursor,
        }))
    }

    fn pointer(&mut self, address: Address, relative: bool, offset: i64) -> Result<Link> {
        let link = Link::reserve(&mut self.cursor, address, relative, offset)?;
        let raw = address.read(self.context.bytes, link.slot(), self.cursor.order())?;
        link.with_target(raw)
    }

    fn follow(&mut self, link: Link, body: Body) -> Result<()> {
        let target = link
            .target()
            .ok_or_else(|| StructError::Unrecognized("link without a decoded target".to_string()))?;
        let mut pointer = UnpackPointer {
            context: self.context.clone(),
            cursor: self.cursor.reach(target, self.context.end)?,
        };
        body(&mut pointer)
    }
}
