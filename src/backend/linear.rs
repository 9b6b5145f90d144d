//! Bump-pointer strategy: O(1) allocation, bulk reset, no individual free.

use alloc::boxed::Box;
use log::debug;

use crate::heap::{Heap, SystemHeap};
use crate::utils::align::padding_for;
use crate::{AllocError, Allocator, Block, Usage};

/// Linear (bump-pointer) allocator over one owned arena.
///
/// Allocation only ever advances an offset; the single deallocation
/// mechanism is [`reset`](Allocator::reset), which returns the whole
/// arena at once. Individual [`free`](Allocator::free) always fails with
/// [`AllocError::UnsupportedOp`].
///
/// Padding is inserted only when the current offset is not already a
/// multiple of the requested alignment, so back-to-back allocations of
/// naturally aligned sizes pack densely.
pub struct LinearAllocator {
    arena: Box<[u8]>,
    offset: usize,
    usage: Usage,
}

impl LinearAllocator {
    /// Creates an allocator with a `total`-byte arena from the system heap.
    pub fn new(total: usize) -> Result<Self, AllocError> {
        Self::with_heap(total, &SystemHeap)
    }

    /// Creates an allocator whose arena is acquired from `heap`.
    pub fn with_heap(total: usize, heap: &dyn Heap) -> Result<Self, AllocError> {
        let arena = heap.acquire(total)?;
        debug!("linear: arena of {total} bytes acquired");
        Ok(Self {
            arena,
            offset: 0,
            usage: Usage::new(total),
        })
    }

    /// Current bump offset (bytes consumed from the front of the arena).
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Allocator for LinearAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Result<Block, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }

        let padding = if align != 0 && self.offset % align != 0 {
            padding_for(self.offset, align)
        } else {
            0
        };

        let start = self.offset + padding;
        let new_offset = start.checked_add(size).ok_or(AllocError::OutOfMemory)?;
        if new_offset > self.usage.total {
            return Err(AllocError::OutOfMemory);
        }

        self.offset = new_offset;
        self.usage.charge(padding + size);
        Ok(Block::new(start, size))
    }

    fn free(&mut self, _block: Block) -> Result<(), AllocError> {
        // individual free is not part of this strategy; use reset()
        Err(AllocError::UnsupportedOp)
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.usage.clear();
    }

    fn get(&self, block: Block) -> Option<&[u8]> {
        if block.end() > self.offset {
            return None;
        }
        self.arena.get(block.offset..block.end())
    }

    fn get_mut(&mut self, block: Block) -> Option<&mut [u8]> {
        if block.end() > self.offset {
            return None;
        }
        self.arena.get_mut(block.offset..block.end())
    }

    fn total(&self) -> usize {
        self.usage.total
    }

    fn used(&self) -> usize {
        self.usage.used
    }

    fn peak(&self) -> usize {
        self.usage.peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_sequential_no_overlap() {
        let mut alloc = LinearAllocator::new(256).unwrap();

        let a = alloc.allocate(10, 0).unwrap();
        let b = alloc.allocate(20, 0).unwrap();
        let c = alloc.allocate(30, 4).unwrap();

        assert!(a.end() <= b.offset);
        assert!(b.end() <= c.offset);
        assert_eq!(c.offset % 4, 0);
    }

    #[test]
    fn test_linear_no_padding_when_aligned() {
        let mut alloc = LinearAllocator::new(256).unwrap();

        // offset 0 is a multiple of every alignment, so the first
        // allocation starts at the very front of the arena
        let a = alloc.allocate(16, 8).unwrap();
        assert_eq!(a.offset, 0);

        // offset 16 is still 8-aligned
        let b = alloc.allocate(8, 8).unwrap();
        assert_eq!(b.offset, 16);

        // offset 24 is not 16-aligned, padding kicks in
        let c = alloc.allocate(8, 16).unwrap();
        assert_eq!(c.offset, 32);
    }

    #[test]
    fn test_linear_out_of_memory() {
        let mut alloc = LinearAllocator::new(64).unwrap();

        assert!(alloc.allocate(60, 0).is_ok());
        assert_eq!(alloc.allocate(8, 0), Err(AllocError::OutOfMemory));

        // a smaller request that still fits succeeds
        assert!(alloc.allocate(4, 0).is_ok());
    }

    #[test]
    fn test_linear_free_unsupported() {
        let mut alloc = LinearAllocator::new(64).unwrap();
        let block = alloc.allocate(8, 0).unwrap();
        assert_eq!(alloc.free(block), Err(AllocError::UnsupportedOp));
    }

    #[test]
    fn test_linear_reset_restarts_at_front() {
        let mut alloc = LinearAllocator::new(128).unwrap();

        let first = alloc.allocate(24, 8).unwrap();
        alloc.allocate(40, 8).unwrap();
        assert!(alloc.used() > 0);

        alloc.reset();
        assert_eq!(alloc.used(), 0);
        assert_eq!(alloc.peak(), 0);

        let again = alloc.allocate(24, 8).unwrap();
        assert_eq!(again.offset, first.offset);
    }

    #[test]
    fn test_linear_stale_block_after_reset() {
        let mut alloc = LinearAllocator::new(128).unwrap();
        let block = alloc.allocate(24, 0).unwrap();
        alloc.reset();
        assert!(alloc.get(block).is_none());
    }

    #[test]
    fn test_linear_bookkeeping_invariant() {
        let mut alloc = LinearAllocator::new(256).unwrap();
        for size in [10, 30, 7, 50] {
            alloc.allocate(size, 8).unwrap();
            assert!(alloc.used() <= alloc.total());
            assert!(alloc.peak() >= alloc.used());
        }
    }

    #[test]
    fn test_linear_zero_size_rejected() {
        let mut alloc = LinearAllocator::new(64).unwrap();
        assert_eq!(alloc.allocate(0, 8), Err(AllocError::ZeroSize));
    }
}
