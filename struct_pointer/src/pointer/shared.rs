//! Position bookkeeping shared by every pointer.

use std::cell::RefCell;

use struct_buffer::ByteOrder;

use crate::value::Record;
use crate::{Result, StructError};

use super::{Body, Link};

/// A position inside an absolute `[start, end)` window, plus the byte order
/// applied to the next fields.
///
/// Positions are absolute offsets into the buffer. The cursor only ever moves
/// within its window; `end` itself is a valid resting position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    start: usize,
    position: usize,
    end: usize,
    order: ByteOrder,
}

impl Cursor {
    /// Window `[start, end)` over `capacity` bytes, positioned at `position`.
    pub(crate) fn new(start: usize, position: usize, end: usize, capacity: usize) -> Result<Self> {
        if start > end || end > capacity {
            return Err(StructError::InvalidWindow { start, end, capacity });
        }
        let mut cursor = Cursor {
            start,
            position: start,
            end,
            order: ByteOrder::default(),
        };
        cursor.seek(position)?;
        Ok(cursor)
    }

    /// A window with no upper bound, used when measuring.
    pub(crate) fn unbounded() -> Self {
        Cursor {
            start: 0,
            position: 0,
            end: usize::MAX,
            order: ByteOrder::default(),
        }
    }

    /// Window `[position, end)` for a nested structure, in the default order.
    pub(crate) fn nested(&self) -> Self {
        Cursor {
            start: self.position,
            position: self.position,
            end: self.end,
            order: ByteOrder::default(),
        }
    }

    /// Window `[position, position + len)` inheriting this cursor's order.
    pub(crate) fn region(&self, len: usize) -> Result<Self> {
        let end = self.checked_end(len)?;
        Ok(Cursor {
            start: self.position,
            position: self.position,
            end,
            order: self.order,
        })
    }

    /// Same start and order over `[start, end)`, positioned at `position`.
    ///
    /// Followed links land here: the target may lie past a deferred region,
    /// so the window is widened to the end of the whole traversal.
    pub(crate) fn reach(&self, position: usize, end: usize) -> Result<Self> {
        let mut cursor = Cursor {
            end: end.max(self.start),
            ..self.clone()
        };
        cursor.seek(position)?;
        Ok(cursor)
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    #[inline]
    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Current position, absolute or relative to the window start.
    #[inline]
    pub fn getpos(&self, relative: bool) -> usize {
        if relative {
            self.position - self.start
        } else {
            self.position
        }
    }

    /// Move to an absolute position inside the window.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position < self.start || position > self.end {
            return Err(self.out_of_window(position, 0));
        }
        self.position = position;
        Ok(())
    }

    /// Reserve `len` bytes at the current position, returning where they start.
    pub fn claim(&mut self, len: usize) -> Result<usize> {
        let at = self.position;
        self.position = self.checked_end(len)?;
        Ok(at)
    }

    /// Reserve `count` elements of `width` bytes each.
    pub fn claim_elements(&mut self, width: usize, count: usize) -> Result<usize> {
        let len = width
            .checked_mul(count)
            .ok_or_else(|| self.out_of_window(self.position, usize::MAX))?;
        self.claim(len)
    }

    /// Skip `len` bytes.
    pub fn pad(&mut self, len: usize) -> Result<()> {
        self.claim(len).map(|_| ())
    }

    /// Advance to the next window-relative position `r` with
    /// `r % multiple == offset % multiple`. A position already satisfying
    /// this does not move.
    pub fn align(&mut self, multiple: usize, offset: usize) -> Result<()> {
        if multiple == 0 {
            return Err(StructError::InvalidAlignment(multiple));
        }
        let relative = self.getpos(true);
        let skip = (offset % multiple + multiple - relative % multiple) % multiple;
        self.pad(skip)
    }

    fn checked_end(&self, len: usize) -> Result<usize> {
        self.position
            .checked_add(len)
            .filter(|&end| end <= self.end)
            .ok_or_else(|| self.out_of_window(self.position, len))
    }

    fn out_of_window(&self, position: usize, len: usize) -> StructError {
        StructError::OutOfWindow {
            position,
            len,
            start: self.start,
            end: self.end,
        }
    }
}

/// A followed link whose body has not been placed yet.
pub(crate) struct Pending<'a> {
    pub(crate) level: usize,
    pub(crate) link: Link,
    pub(crate) object: &'a Record,
    /// The following pointer's cursor at follow time.
    pub(crate) cursor: Cursor,
    pub(crate) body: Body,
}

/// Bodies queued by `follow`, drained one nesting level at a time once the
/// main traversal is done.
#[derive(Default)]
pub(crate) struct Queue<'a> {
    pending: RefCell<Vec<Pending<'a>>>,
}

impl<'a> Queue<'a> {
    pub(crate) fn push(&self, pending: Pending<'a>) {
        self.pending.borrow_mut().push(pending);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Remove every entry queued at or below `level`, in queue order.
    pub(crate) fn take_level(&self, level: usize) -> Vec<Pending<'a>> {
        let mut pending = self.pending.borrow_mut();
        let (batch, rest) = std::mem::take(&mut *pending)
            .into_iter()
            .partition(|entry| entry.level <= level);
        *pending = rest;
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::Address;

    #[test]
    fn claim_and_bounds() {
        let mut cursor = Cursor::new(2, 2, 6, 8).unwrap();
        assert_eq!(cursor.claim(3).unwrap(), 2);
        assert_eq!(cursor.getpos(false), 5);
        assert_eq!(cursor.getpos(true), 3);

        let err = cursor.claim(2).unwrap_err();
        assert!(matches!(err, StructError::OutOfWindow { position: 5, len: 2, .. }));
        assert_eq!(cursor.getpos(false), 5);

        cursor.claim(1).unwrap();
        assert_eq!(cursor.getpos(false), 6);
    }

    #[test]
    fn invalid_windows() {
        assert!(matches!(Cursor::new(4, 4, 3, 8), Err(StructError::InvalidWindow { .. })));
        assert!(matches!(Cursor::new(0, 0, 9, 8), Err(StructError::InvalidWindow { .. })));
        assert!(matches!(Cursor::new(2, 1, 4, 8), Err(StructError::OutOfWindow { .. })));
    }

    #[test]
    fn seek_is_absolute() {
        let mut cursor = Cursor::new(4, 4, 8, 8).unwrap();
        cursor.seek(8).unwrap();
        assert!(cursor.seek(3).is_err());
        assert!(cursor.seek(9).is_err());
        assert_eq!(cursor.getpos(false), 8);
    }

    #[test]
    fn align_relative_to_window() {
        let mut cursor = Cursor::new(3, 3, 32, 32).unwrap();
        cursor.pad(1).unwrap();
        cursor.align(4, 0).unwrap();
        assert_eq!(cursor.getpos(true), 4);

        // already aligned stays put
        cursor.align(4, 0).unwrap();
        assert_eq!(cursor.getpos(true), 4);

        cursor.align(4, 1).unwrap();
        assert_eq!(cursor.getpos(true), 5);

        cursor.align(8, 10).unwrap();
        assert_eq!(cursor.getpos(true), 10);

        assert!(matches!(cursor.align(0, 0), Err(StructError::InvalidAlignment(0))));
    }

    #[test]
    fn regions_and_nesting() {
        let mut cursor = Cursor::new(0, 0, 16, 16).unwrap();
        cursor.set_order(ByteOrder::Little);
        cursor.pad(4).unwrap();

        let region = cursor.region(8).unwrap();
        assert_eq!((region.start(), region.end()), (4, 12));
        assert_eq!(region.order(), ByteOrder::Little);
        assert!(cursor.region(13).is_err());

        let nested = cursor.nested();
        assert_eq!((nested.start(), nested.end()), (4, 16));
        assert_eq!(nested.order(), ByteOrder::Big);

        let reached = region.reach(14, 16).unwrap();
        assert_eq!((reached.start(), reached.getpos(false)), (4, 14));
        assert_eq!(reached.order(), ByteOrder::Little);
        assert!(region.reach(2, 16).is_err());
    }

    #[test]
    fn queue_drains_by_level() {
        let record = Record::new();
        let queue = Queue::default();
        for (level, slot) in [(1, 10), (0, 20), (2, 30), (0, 40)] {
            queue.push(Pending {
                level,
                link: Link::new(slot, Address::I16, ByteOrder::Big, 0),
                object: &record,
                cursor: Cursor::unbounded(),
                body: Box::new(|_| Ok(())),
            });
        }

        let slots = |batch: Vec<Pending<'_>>| batch.iter().map(|p| p.link.slot()).collect::<Vec<_>>();
        assert_eq!(slots(queue.take_level(0)), [20, 40]);
        assert_eq!(slots(queue.take_level(1)), [10]);
        assert!(!queue.is_empty());
        assert_eq!(slots(queue.take_level(2)), [30]);
        assert!(queue.is_empty());
    }

    #[test]
    fn unbounded_never_overflows_silently() {
        let mut cursor = Cursor::unbounded();
        cursor.pad(usize::MAX - 1).unwrap();
        assert!(cursor.claim(2).is_err());
        assert!(cursor.claim_elements(8, usize::MAX).is_err());
    }
}
