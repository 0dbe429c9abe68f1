#[cfg(feature = "mmap")]
use std::{fs::File, path::Path};

#[cfg(feature = "mmap")]
use memmap2::{Mmap, MmapMut};

use crate::BufferError;

/// The owned backing store for a packed buffer.
///
/// - Always includes in-memory `Vec<u8>`
/// - Includes mmap only when feature = "mmap"
#[derive(Debug)]
pub enum Storage {
    /// Standard in-memory vector
    InMemory(Vec<u8>),

    /// Read-only memory mapped file
    #[cfg(feature = "mmap")]
    MmapReadOnly(Mmap),

    /// Read-write memory mapped file
    #[cfg(feature = "mmap")]
    MmapReadWrite(MmapMut),
}

impl Storage {
    /// Zero-filled in-memory storage of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Storage::InMemory(vec![0; len])
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Storage::InMemory(bytes)
    }

    /// Return byte count
    pub fn len(&self) -> usize {
        match self {
            Storage::InMemory(vec) => vec.len(),

            #[cfg(feature = "mmap")]
            Storage::MmapReadOnly(m) => m.len(),

            #[cfg(feature = "mmap")]
            Storage::MmapReadWrite(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Storage::InMemory(vec) => vec.as_slice(),

            #[cfg(feature = "mmap")]
            Storage::MmapReadOnly(m) => m.as_ref(),

            #[cfg(feature = "mmap")]
            Storage::MmapReadWrite(m) => m.as_ref(),
        }
    }

    /// Mutable bytes — valid only for InMemory and MmapReadWrite
    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8], BufferError> {
        match self {
            Storage::InMemory(vec) => Ok(vec.as_mut_slice()),

            #[cfg(feature = "mmap")]
            Storage::MmapReadOnly(_) => Err(BufferError::ReadOnly),

            #[cfg(feature = "mmap")]
            Storage::MmapReadWrite(m) => Ok(m.as_mut()),
        }
    }

    /// Take the bytes out of an in-memory storage.
    ///
    /// Mapped storage is copied.
    pub fn into_vec(self) -> Vec<u8> {
        match self {
            Storage::InMemory(vec) => vec,

            #[cfg(feature = "mmap")]
            Storage::MmapReadOnly(m) => m.to_vec(),

            #[cfg(feature = "mmap")]
            Storage::MmapReadWrite(m) => m.to_vec(),
        }
    }

    /// Flush pending writes of a read-write mapping. No-op otherwise.
    pub fn flush(&self) -> Result<(), BufferError> {
        match self {
            #[cfg(feature = "mmap")]
            Storage::MmapReadWrite(m) => Ok(m.flush()?),
            _ => Ok(()),
        }
    }

    //  Mmap constructors

    /// Create (or truncate) `path` to `len` zero bytes and map it read-write.
    #[cfg(feature = "mmap")]
    pub fn create_mmap<P: AsRef<Path>>(path: P, len: usize) -> Result<Self, BufferError> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(len as u64)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Storage::MmapReadWrite(mmap))
    }

    #[cfg(feature = "mmap")]
    pub fn open_mmap_readonly<P: AsRef<Path>>(path: P) -> Result<Self, BufferError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Storage::MmapReadOnly(mmap))
    }

    #[cfg(feature = "mmap")]
    pub fn open_mmap_readwrite<P: AsRef<Path>>(path: P) -> Result<Self, BufferError> {
        let file = File::options().read(true).write(true).open(path)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Storage::MmapReadWrite(mmap))
    }
}

impl Default for Storage {
    fn default() -> Self {
        Storage::InMemory(Vec::new())
    }
}
