//! Pass-through strategy: every allocation is its own buffer from the
//! backing heap. Used as the default/root allocator.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::heap::{Heap, SystemHeap};
use crate::{AllocError, Allocator, Block, Usage};

/// Heap-delegating allocator.
///
/// There is no arena: each allocation acquires a dedicated buffer from
/// the [`Heap`] collaborator, tracked in a slot table so [`Block`]
/// handles stay stable (`offset` is the slot index). Alignment is
/// ignored - the backing heap's natural alignment applies.
///
/// Unlike the arena strategies, capacity is unbounded; [`total`] reports
/// `usize::MAX`. `used`/`peak` are maintained normally.
///
/// A stale handle is rejected while its slot is empty or holds a
/// different-sized buffer; a same-sized reallocation into the slot makes
/// the old handle indistinguishable from the new one.
///
/// [`total`]: Allocator::total
pub struct SystemAllocator<H: Heap = SystemHeap> {
    heap: H,
    slots: Vec<Option<Box<[u8]>>>,
    free_slots: Vec<usize>,
    usage: Usage,
}

impl SystemAllocator<SystemHeap> {
    /// Creates an allocator over the system heap.
    pub fn new() -> Self {
        Self::with_heap(SystemHeap)
    }
}

impl Default for SystemAllocator<SystemHeap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Heap> SystemAllocator<H> {
    /// Creates an allocator that draws every buffer from `heap`.
    pub fn with_heap(heap: H) -> Self {
        Self {
            heap,
            slots: Vec::new(),
            free_slots: Vec::new(),
            usage: Usage::new(usize::MAX),
        }
    }

    /// Number of live allocations.
    pub fn live_blocks(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    fn slot(&self, block: Block) -> Option<usize> {
        let buf = self.slots.get(block.offset)?.as_ref()?;
        (buf.len() == block.len).then_some(block.offset)
    }
}

impl<H: Heap> Allocator for SystemAllocator<H> {
    fn allocate(&mut self, size: usize, _align: usize) -> Result<Block, AllocError> {
        let buf = self.heap.acquire(size)?;

        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = Some(buf);
                slot
            }
            None => {
                self.slots.push(Some(buf));
                self.slots.len() - 1
            }
        };

        self.usage.charge(size);
        Ok(Block::new(slot, size))
    }

    fn free(&mut self, block: Block) -> Result<(), AllocError> {
        let slot = self.slot(block).ok_or(AllocError::InvalidBlock)?;
        self.slots[slot] = None;
        self.free_slots.push(slot);
        self.usage.release(block.len);
        Ok(())
    }

    fn reset(&mut self) {
        self.slots.clear();
        self.free_slots.clear();
        self.usage.clear();
    }

    fn get(&self, block: Block) -> Option<&[u8]> {
        let slot = self.slot(block)?;
        self.slots[slot].as_deref()
    }

    fn get_mut(&mut self, block: Block) -> Option<&mut [u8]> {
        let slot = self.slot(block)?;
        self.slots[slot].as_deref_mut()
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
    fn test_system_alloc_and_access() {
        let mut alloc = SystemAllocator::new();

        let block = alloc.allocate(32, 0).unwrap();
        alloc.get_mut(block).unwrap().fill(0xEE);
        assert_eq!(alloc.get(block).unwrap().len(), 32);
        assert_eq!(alloc.get(block).unwrap()[31], 0xEE);
    }

    #[test]
    fn test_system_tracks_usage() {
        // the pass-through strategy keeps its counters current like the
        // arena strategies do
        let mut alloc = SystemAllocator::new();

        let a = alloc.allocate(100, 0).unwrap();
        let b = alloc.allocate(50, 0).unwrap();
        assert_eq!(alloc.used(), 150);
        assert_eq!(alloc.peak(), 150);

        alloc.free(a).unwrap();
        assert_eq!(alloc.used(), 50);
        assert_eq!(alloc.peak(), 150);

        alloc.free(b).unwrap();
        assert_eq!(alloc.used(), 0);
        assert_eq!(alloc.live_blocks(), 0);
    }

    #[test]
    fn test_system_slot_reuse() {
        let mut alloc = SystemAllocator::new();

        let a = alloc.allocate(16, 0).unwrap();
        let _b = alloc.allocate(16, 0).unwrap();
        alloc.free(a).unwrap();

        // the freed slot is reused rather than growing the table
        let c = alloc.allocate(24, 0).unwrap();
        assert_eq!(c.offset, a.offset);
        assert_eq!(alloc.live_blocks(), 2);
    }

    #[test]
    fn test_system_stale_handle_rejected() {
        let mut alloc = SystemAllocator::new();
        let a = alloc.allocate(16, 0).unwrap();
        alloc.free(a).unwrap();

        assert!(alloc.get(a).is_none());
        assert_eq!(alloc.free(a), Err(AllocError::InvalidBlock));
    }

    #[test]
    fn test_system_zero_size_rejected() {
        let mut alloc = SystemAllocator::new();
        assert_eq!(alloc.allocate(0, 0), Err(AllocError::ZeroSize));
    }
}
