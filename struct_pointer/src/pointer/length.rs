use std::rc::Rc;

use crate::kind::Kind;
use crate::literal::Key;
use crate::schema::Struct;
use crate::value::{Record, Value};
use crate::Result;

use super::shared::{Pending, Queue};
use super::{shape, Address, Body, Cursor, Link, Pointer};

/// Measures the bytes a record packs into without writing anything.
///
/// Values are validated exactly as [`PackPointer`](super::PackPointer)
/// validates them, and followed bodies are queued and placed the same way,
/// so [`resolve`](Self::resolve) reports the end `PackPointer::resolve`
/// would report.
pub struct LengthPointer<'a> {
    object: &'a Record,
    cursor: Cursor,
    queue: Rc<Queue<'a>>,
    level: usize,
}

impl<'a> LengthPointer<'a> {
    pub fn new(object: &'a Record) -> Self {
        LengthPointer {
            object,
            cursor: Cursor::unbounded(),
            queue: Rc::default(),
            level: 0,
        }
    }

    fn child(&self, object: &'a Record, cursor: Cursor) -> Self {
        LengthPointer {
            object,
            cursor,
            queue: Rc::clone(&self.queue),
            level: self.level,
        }
    }

    /// Place every queued body after the measured data and return the end.
    pub fn resolve(self) -> Result<usize> {
        let mut position = self.cursor.getpos(false);
        let mut level = self.level;
        while !self.queue.is_empty() {
            for pending in self.queue.take_level(level) {
                position = self.place(pending, position)?;
            }
            level += 1;
        }
        Ok(position)
    }

    fn place(&self, pending: Pending<'a>, position: usize) -> Result<usize> {
        let mut pointer = LengthPointer {
            object: pending.object,
            cursor: pending.cursor.reach(position, usize::MAX)?,
            queue: Rc::clone(&self.queue),
            level: pending.level + 1,
        };
        (pending.body)(&mut pointer)?;
        Ok(pointer.cursor.getpos(false))
    }
}

impl<'a> Pointer<'a> for LengthPointer<'a> {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    fn field(&mut self, kind: Kind, key: &Key, count: Option<usize>) -> Result<Value> {
        let source = key.resolve(self.object, kind.name())?;
        let value = shape::canonical(kind, key, source, count)?;
        self.cursor.pad(shape::encoded_len(kind, &value, count))?;
        Ok(value)
    }

    fn structure(&mut self, schema: &Struct, key: &Key, count: Option<usize>) -> Result<Value> {
        for record in shape::records(key, self.object, count)? {
            let mut nested = self.child(record, self.cursor.nested());
            schema.run(&mut nested)?;
            self.cursor.seek(nested.cursor.getpos(false))?;
        }
        key.resolve(self.object, "a record").cloned()
    }

    fn defer(&mut self, length: usize) -> Result<Box<dyn Pointer<'a> + 'a>> {
        let cursor = self.cursor.region(length)?;
        self.cursor.pad(length)?;
        Ok(Box::new(self.child(self.object, cursor)))
    }

    fn pointer(&mut self, address: Address, relative: bool, offset: i64) -> Result<Link> {
        Link::reserve(&mut self.cursor, address, relative, offset)
    }

    fn follow(&mut self, link: Link, body: Body) -> Result<()> {
        self.queue.push(Pending {
            level: self.level,
            link,
            object: self.object,
            cursor: self.cursor.clone(),
            body,
        });
        Ok(())
    }
}
