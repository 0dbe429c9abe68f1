//! Byte storage and byte-order-aware primitive access.
//!
//! This crate is the buffer layer underneath `struct_pointer`:
//! - [`Storage`]: owned bytes, in memory or memory-mapped (`mmap` feature)
//! - [`ByteOrder`] and [`Primitive`]: fixed-width numerics in either byte order
//! - [`ByteView`] / [`ByteViewMut`]: bounds-checked reads and writes over `[u8]`
//!
//! ```
//! use struct_buffer::{ByteOrder, ByteView, ByteViewMut};
//!
//! let mut bytes = [0u8; 4];
//! bytes.write_at(0, 0x0102u16, ByteOrder::Big).unwrap();
//! bytes.write_at(2, 0x0102u16, ByteOrder::Little).unwrap();
//! assert_eq!(bytes, [0x01, 0x02, 0x02, 0x01]);
//! assert_eq!(bytes.read_at::<u16>(2, ByteOrder::Little).unwrap(), 0x0102);
//! ```

pub mod error;
pub mod order;
pub mod storage;
pub mod view;

pub use error::BufferError;
pub use order::{ByteOrder, Primitive};
pub use storage::Storage;
pub use view::{ByteView, ByteViewMut};
