//! Packing straight into and unpacking straight out of memory-mapped files.

use std::path::Path;

use log::debug;
use struct_buffer::Storage;

use crate::schema::Struct;
use crate::value::Record;
use crate::Result;

/// Pack `source` into a file at `path` sized to the packed length.
///
/// An existing file is truncated. Returns the number of bytes written.
pub fn pack_to_file<P: AsRef<Path>>(schema: &Struct, source: &Record, path: P) -> Result<usize> {
    let len = schema.length(source)?;
    debug!("mapping {} for {len} bytes", path.as_ref().display());

    let mut storage = Storage::create_mmap(path, len)?;
    let end = schema.pack(source, storage.as_bytes_mut()?)?;
    storage.flush()?;
    Ok(end)
}

/// Unpack a whole file into a fresh record.
pub fn unpack_file<P: AsRef<Path>>(schema: &Struct, path: P) -> Result<Record> {
    let storage = Storage::open_mmap_readonly(path)?;
    schema.unpack_record(storage.as_bytes())
}
