//! Bounds-checked, byte-order-aware access to byte slices.
//!
//! These traits are implemented for `[u8]`, so any borrowed window of a
//! [`Storage`](crate::Storage), a `Vec<u8>` or an array can be read and written
//! in place without copying.

use crate::{BufferError, ByteOrder, Primitive};

/// Read access to a byte buffer.
pub trait ByteView {
    /// Borrow `len` bytes starting at `offset`.
    fn span(&self, offset: usize, len: usize) -> Result<&[u8], BufferError>;

    /// Read a single primitive at `offset`.
    fn read_at<T: Primitive>(&self, offset: usize, order: ByteOrder) -> Result<T, BufferError> {
        let bytes = self.span(offset, T::WIDTH)?;
        let value: T = bytemuck::pod_read_unaligned(bytes);
        Ok(value.reorder(order))
    }

    /// Read `count` consecutive primitives starting at `offset`.
    fn read_array_at<T: Primitive>(
        &self,
        offset: usize,
        count: usize,
        order: ByteOrder,
    ) -> Result<Vec<T>, BufferError> {
        let len = byte_len::<T>(offset, count)?;
        let bytes = self.span(offset, len)?;

        let mut values = vec![T::zeroed(); count];
        bytemuck::cast_slice_mut::<T, u8>(&mut values).copy_from_slice(bytes);
        if !order.is_native() {
            for v in values.iter_mut() {
                *v = v.swap();
            }
        }
        Ok(values)
    }

    /// Position of the first `byte` in `[from, end)`, if any.
    fn find_byte(&self, from: usize, end: usize, byte: u8) -> Result<Option<usize>, BufferError> {
        let len = end.saturating_sub(from);
        let bytes = self.span(from, len)?;
        Ok(bytes.iter().position(|&b| b == byte).map(|i| from + i))
    }
}

/// Write access to a byte buffer.
pub trait ByteViewMut: ByteView {
    fn span_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], BufferError>;

    /// Write a single primitive at `offset`.
    fn write_at<T: Primitive>(
        &mut self,
        offset: usize,
        value: T,
        order: ByteOrder,
    ) -> Result<(), BufferError> {
        let value = value.reorder(order);
        self.span_mut(offset, T::WIDTH)?
            .copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    /// Write `values` contiguously starting at `offset`.
    fn write_array_at<T: Primitive>(
        &mut self,
        offset: usize,
        values: &[T],
        order: ByteOrder,
    ) -> Result<(), BufferError> {
        let len = byte_len::<T>(offset, values.len())?;
        let dst = self.span_mut(offset, len)?;

        if order.is_native() {
            dst.copy_from_slice(bytemuck::cast_slice(values));
        } else {
            for (chunk, v) in dst.chunks_exact_mut(T::WIDTH).zip(values) {
                chunk.copy_from_slice(bytemuck::bytes_of(&v.swap()));
            }
        }
        Ok(())
    }
}

impl ByteView for [u8] {
    fn span(&self, offset: usize, len: usize) -> Result<&[u8], BufferError> {
        let end = offset.checked_add(len).ok_or(BufferError::OutOfBounds {
            offset,
            len,
            capacity: self.len(),
        })?;
        self.get(offset..end).ok_or(BufferError::OutOfBounds {
            offset,
            len,
            capacity: self.len(),
        })
    }
}

impl ByteViewMut for [u8] {
    fn span_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], BufferError> {
        let capacity = self.len();
        let end = offset.checked_add(len).ok_or(BufferError::OutOfBounds {
            offset,
            len,
            capacity,
        })?;
        self.get_mut(offset..end).ok_or(BufferError::OutOfBounds {
            offset,
            len,
            capacity,
        })
    }
}

fn byte_len<T: Primitive>(offset: usize, count: usize) -> Result<usize, BufferError> {
    count.checked_mul(T::WIDTH).ok_or(BufferError::OutOfBounds {
        offset,
        len: usize::MAX,
        capacity: 0,
    })
}
