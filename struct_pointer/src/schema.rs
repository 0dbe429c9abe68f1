use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use log::debug;
use struct_buffer::Storage;

use crate::pointer::{LengthPointer, PackPointer, Pointer, UnpackPointer};
use crate::value::Record;
use crate::{Result, StructError};

type Traversal = dyn for<'p> Fn(&mut dyn Pointer<'p>) -> Result<()> + Send + Sync;
type Factory = dyn Fn() -> Record + Send + Sync;

/// A binary layout defined by a traversal function.
///
/// The same function measures, packs and unpacks, so the three directions
/// cannot drift apart. Schemas are cheap to clone and can be nested inside
/// other schemas.
///
/// ```
/// use struct_pointer::{Fields, Literal, Record, Struct, Value};
///
/// let schema = Struct::new(|p| {
///     p.u8("a")?;
///     p.u8s("b", 4)?;
///     p.u8(Literal::new(0xFFu8))?;
///     Ok(())
/// });
///
/// let record = Record::new().with("a", 10u8).with("b", vec![1u8, 2, 3, 4]);
/// assert_eq!(schema.length(&record).unwrap(), 6);
///
/// let bytes = schema.pack_to_vec(&record).unwrap();
/// assert_eq!(bytes, [10, 1, 2, 3, 4, 255]);
///
/// let back = schema.unpack_record(&bytes).unwrap();
/// assert_eq!(back.get("b"), Some(&Value::from(vec![1u8, 2, 3, 4])));
/// ```
#[derive(Clone)]
pub struct Struct {
    exec: Arc<Traversal>,
    factory: Arc<Factory>,
}

impl Struct {
    /// A schema whose unpacked records start out empty.
    pub fn new<F>(exec: F) -> Self
    where
        F: for<'p> Fn(&mut dyn Pointer<'p>) -> Result<()> + Send + Sync + 'static,
    {
        Self::with_factory(exec, Record::new)
    }

    /// A schema whose unpacked records start from `factory()`.
    ///
    /// Used for nested records too: each nested instance gets its own fresh
    /// record.
    pub fn with_factory<F, G>(exec: F, factory: G) -> Self
    where
        F: for<'p> Fn(&mut dyn Pointer<'p>) -> Result<()> + Send + Sync + 'static,
        G: Fn() -> Record + Send + Sync + 'static,
    {
        Struct {
            exec: Arc::new(exec),
            factory: Arc::new(factory),
        }
    }

    /// A fresh, empty record of this schema.
    pub fn create(&self) -> Record {
        (self.factory)()
    }

    /// Run the traversal with an arbitrary pointer.
    pub fn run(&self, pointer: &mut dyn Pointer<'_>) -> Result<()> {
        (self.exec)(pointer)
    }

    /// Number of bytes `source` packs into, including deferred regions.
    pub fn length(&self, source: &Record) -> Result<usize> {
        let mut pointer = LengthPointer::new(source);
        self.run(&mut pointer)?;
        let len = pointer.resolve()?;
        debug!("measured {len} bytes");
        Ok(len)
    }

    /// Pack `source` at the start of `target`. Returns the end of the data.
    pub fn pack(&self, source: &Record, target: &mut [u8]) -> Result<usize> {
        self.pack_at(source, target, 0, None)
    }

    /// Pack `source` into `target[offset..offset + length]`, or to the end of
    /// `target` when `length` is `None`. Returns the absolute end of the
    /// data, deferred regions included.
    pub fn pack_at(
        &self,
        source: &Record,
        target: &mut [u8],
        offset: usize,
        length: Option<usize>,
    ) -> Result<usize> {
        let end = window_end(target.len(), offset, length)?;
        debug!("packing into [{offset}, {end}) of a {} byte buffer", target.len());

        let mut pointer = PackPointer::new(target, source, offset, end)?;
        self.run(&mut pointer)?;
        let end = pointer.resolve()?;

        debug!("packed {} bytes", end - offset);
        Ok(end)
    }

    /// Unpack from the start of `source` into `target`. Returns the end
    /// position of the main traversal.
    pub fn unpack(&self, source: &[u8], target: &mut Record) -> Result<usize> {
        self.unpack_at(source, target, 0, None)
    }

    /// Unpack from `source[offset..offset + length]` into `target`.
    ///
    /// Fields are stored into `target` as they are read, so it holds
    /// whatever was read before an error.
    pub fn unpack_at(
        &self,
        source: &[u8],
        target: &mut Record,
        offset: usize,
        length: Option<usize>,
    ) -> Result<usize> {
        let end = window_end(source.len(), offset, length)?;
        debug!("unpacking from [{offset}, {end}) of a {} byte buffer", source.len());

        let object = Rc::new(RefCell::new(std::mem::take(target)));
        let result = UnpackPointer::new(source, Rc::clone(&object), offset, end).and_then(|mut pointer| {
            self.run(&mut pointer)?;
            Ok(pointer.getpos(false))
        });
        *target = object.take();

        if let Ok(end) = result {
            debug!("unpacked {} bytes", end - offset);
        }
        result
    }

    /// Measure, allocate and pack in one step.
    pub fn pack_to_vec(&self, source: &Record) -> Result<Vec<u8>> {
        let len = self.length(source)?;
        let mut storage = Storage::zeroed(len);
        self.pack(source, storage.as_bytes_mut()?)?;
        Ok(storage.into_vec())
    }

    /// Unpack `source` into a fresh record from the factory.
    pub fn unpack_record(&self, source: &[u8]) -> Result<Record> {
        let mut record = self.create();
        self.unpack(source, &mut record)?;
        Ok(record)
    }
}

impl fmt::Debug for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Struct").finish_non_exhaustive()
    }
}

fn window_end(capacity: usize, offset: usize, length: Option<usize>) -> Result<usize> {
    let invalid = |end| StructError::InvalidWindow {
        start: offset,
        end,
        capacity,
    };
    if offset > capacity {
        return Err(invalid(offset));
    }
    let end = match length {
        Some(len) => offset.checked_add(len).ok_or_else(|| invalid(usize::MAX))?,
        None => capacity,
    };
    if end > capacity {
        return Err(invalid(end));
    }
    Ok(end)
}
