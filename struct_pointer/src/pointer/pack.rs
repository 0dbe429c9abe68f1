use std::cell::RefCell;
use std::rc::Rc;

use log::trace;
use struct_buffer::{ByteOrder, ByteViewMut};

use crate::kind::Kind;
use crate::literal::Key;
use crate::schema::Struct;
use crate::value::{Array, Record, Value};
use crate::{Result, StructError};

use super::shared::{Pending, Queue};
use super::{shape, Address, Body, Cursor, Link, Pointer};

/// State shared by every pointer of a single pack call.
struct Shared<'a> {
    bytes: RefCell<&'a mut [u8]>,
    queue: Queue<'a>,
    /// End of the outermost window; followed bodies may write up to here.
    end: usize,
}

#[derive(Clone)]
struct Context<'a> {
    shared: Rc<Shared<'a>>,
    object: &'a Record,
}

/// Writes a record into a byte buffer.
///
/// Followed links are queued rather than run. Once the top-level traversal
/// finishes, [`resolve`](Self::resolve) places each queued body after
/// everything written so far, one nesting level at a time, and patches the
/// address slots to point at them.
pub struct PackPointer<'a> {
    context: Context<'a>,
    cursor: Cursor,
    level: usize,
}

macro_rules! write_value {
    ($bytes:expr, $at:expr, $value:expr, $order:expr; $($variant:ident),*) => {
        match $value {
            $(Value::$variant(v) => $bytes.write_at($at, *v, $order)?,)*
            $(Value::Array(Array::$variant(values)) => $bytes.write_array_at($at, &values[..], $order)?,)*
            Value::Bool(b) => $bytes.write_at($at, encode_bool(*b), $order)?,
            Value::Array(Array::Bool(values)) => {
                let span = $bytes.span_mut($at, values.len())?;
                for (byte, b) in span.iter_mut().zip(values) {
                    *byte = encode_bool(*b);
                }
            }
            Value::Str(s) => $bytes.span_mut($at, s.len())?.copy_from_slice(s.as_bytes()),
            other @ (Value::Record(_) | Value::List(_)) => {
                return Err(StructError::Unrecognized(format!(
                    "{} in a primitive field",
                    other.type_name()
                )))
            }
        }
    };
}

#[inline]
fn encode_bool(b: bool) -> u8 {
    if b { 0xFF } else { 0x00 }
}

impl<'a> Context<'a> {
    fn write(&self, at: usize, value: &Value, order: ByteOrder) -> Result<()> {
        let mut guard = self.shared.bytes.borrow_mut();
        let bytes: &mut [u8] = &mut guard;
        write_value!(bytes, at, value, order; U8, U16, U32, U64, I8, I16, I32, I64, F32, F64);
        Ok(())
    }

    fn nested(&self, object: &'a Record) -> Self {
        Context {
            shared: Rc::clone(&self.shared),
            object,
        }
    }
}

/// Patch the address slot of `pending` with `position` and run its body
/// there. Returns where the body stopped writing.
fn place<'a>(pending: Pending<'a>, shared: &Rc<Shared<'a>>, position: usize) -> Result<usize> {
    trace!(
        "patching {} address at {} to target {position}",
        pending.link.address(),
        pending.link.slot()
    );
    {
        let mut guard = shared.bytes.borrow_mut();
        pending.link.patch(&mut guard, position)?;
    }
    let cursor = pending.cursor.reach(position, shared.end)?;
    let mut pointer = PackPointer {
        context: Context {
            shared: Rc::clone(shared),
            object: pending.object,
        },
        cursor,
        level: pending.level + 1,
    };
    (pending.body)(&mut pointer)?;
    Ok(pointer.cursor.getpos(false))
}

impl<'a> PackPointer<'a> {
    /// A pointer over `bytes[start..end]` reading values from `object`.
    pub fn new(bytes: &'a mut [u8], object: &'a Record, start: usize, end: usize) -> Result<Self> {
        let cursor = Cursor::new(start, start, end, bytes.len())?;
        let shared = Shared {
            bytes: RefCell::new(bytes),
            queue: Queue::default(),
            end,
        };
        Ok(PackPointer {
            context: Context {
                shared: Rc::new(shared),
                object,
            },
            cursor,
            level: 0,
        })
    }

    /// Place every queued body and return the absolute end of the data.
    pub fn resolve(self) -> Result<usize> {
        let mut position = self.cursor.getpos(false);
        let mut level = self.level;
        let shared = &self.context.shared;
        while !shared.queue.is_empty() {
            for pending in shared.queue.take_level(level) {
                position = place(pending, shared, position)?;
            }
            level += 1;
        }
        Ok(position)
    }
}

impl<'a> Pointer<'a> for PackPointer<'a> {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    fn field(&mut self, kind: Kind, key: &Key, count: Option<usize>) -> Result<Value> {
        let source = key.resolve(self.context.object, kind.name())?;
        let value = shape::canonical(kind, key, source, count)?;
        let len = shape::encoded_len(kind, &value, count);
        let at = self.cursor.claim(len)?;

        let order = self.cursor.order();
        self.context.write(at, &value, order)?;
        if kind == Kind::Str && count.is_none() {
            self.context.write(at + len - 1, &Value::U8(0), order)?;
        }
        Ok(value)
    }

    fn structure(&mut self, schema: &Struct, key: &Key, count: Option<usize>) -> Result<Value> {
        for record in shape::records(key, self.context.object, count)? {
            let mut nested = PackPointer {
                context: self.context.nested(record),
                cursor: self.cursor.nested(),
                level: self.level,
            };
            schema.run(&mut nested)?;
            self.cursor.seek(nested.cursor.getpos(false))?;
        }
        key.resolve(self.context.object, "a record").cloned()
    }

    fn defer(&mut self, length: usize) -> Result<Box<dyn Pointer<'a> + 'a>> {
        let cursor = self.cursor.region(length)?;
        self.cursor.pad(length)?;
        Ok(Box::new(PackPointer {
            context: self.context.clone(),
            cursor,
            level: self.level,
        }))
    }

    fn pointer(&mut self, address: Address, relative: bool, offset: i64) -> Result<Link> {
        Link::reserve(&mut self.cursor, address, relative, offset)
    }

    fn follow(&mut self, link: Link, body: Body) -> Result<()> {
        self.context.shared.queue.push(Pending {
            level: self.level,
            link,
            object: self.context.object,
            cursor: self.cursor.clone(),
            body,
        });
        Ok(())
    }
}
