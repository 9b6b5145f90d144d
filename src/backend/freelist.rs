//! General-purpose strategy: placement policies, block splitting and
//! eager coalescing over an explicit free-block registry.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use log::{debug, trace};

use crate::heap::{Heap, SystemHeap};
use crate::utils::align::padding_with_header;
use crate::{AllocError, Allocator, Block, Usage};

/// Per-allocation header stored just before the payload: the full block
/// size and the padding in front of the payload, both little-endian u32.
const HEADER_SIZE: usize = 8;

/// Alignment substituted when the caller passes `align == 0`.
const MIN_ALIGN: usize = 8;

/// Largest supported arena; block sizes must fit the u32 header fields.
const MAX_ARENA: usize = u32::MAX as usize;

/// Search strategy for picking a free block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Take the first block that fits. Early exit, may fragment more.
    FirstFit,
    /// Scan everything and take the block with the least leftover slack.
    BestFit,
}

/// One free range of the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FreeBlock {
    offset: usize,
    size: usize,
}

impl FreeBlock {
    const fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Free-list allocator over one owned arena.
///
/// Free ranges live in a registry sorted by ascending offset, held next
/// to the arena rather than written into freed payload bytes. The sort
/// order is what makes coalescing cheap: a freed block only ever merges
/// with its immediate registry neighbors, checked by offset arithmetic.
/// Coalescing happens eagerly on every free, so fragmentation cannot
/// accumulate across a free-heavy workload.
pub struct FreeListAllocator {
    arena: Box<[u8]>,
    free: Vec<FreeBlock>,
    policy: Policy,
    usage: Usage,
}

impl FreeListAllocator {
    /// Creates an allocator with a `total`-byte arena from the system heap.
    pub fn new(total: usize, policy: Policy) -> Result<Self, AllocError> {
        Self::with_heap(total, policy, &SystemHeap)
    }

    /// Creates an allocator whose arena is acquired from `heap`.
    pub fn with_heap(
        total: usize,
        policy: Policy,
        heap: &dyn Heap,
    ) -> Result<Self, AllocError> {
        if total > MAX_ARENA {
            return Err(AllocError::InvalidConfig);
        }
        let arena = heap.acquire(total)?;
        debug!("freelist: arena of {total} bytes acquired, policy {policy:?}");
        Ok(Self {
            arena,
            free: vec![FreeBlock { offset: 0, size: total }],
            policy,
            usage: Usage::new(total),
        })
    }

    /// The placement policy chosen at construction.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Number of ranges currently in the free registry.
    pub fn fragment_count(&self) -> usize {
        self.free.len()
    }

    /// Picks a free block for `size`/`align` per the placement policy.
    /// Returns the registry index and the padding in front of the payload.
    fn find(&self, size: usize, align: usize) -> Option<(usize, usize)> {
        match self.policy {
            Policy::FirstFit => self.free.iter().enumerate().find_map(|(i, fb)| {
                let padding = padding_with_header(fb.offset, align, HEADER_SIZE);
                (padding + size <= fb.size).then_some((i, padding))
            }),
            Policy::BestFit => {
                let mut best: Option<(usize, usize, usize)> = None;
                for (i, fb) in self.free.iter().enumerate() {
                    let padding = padding_with_header(fb.offset, align, HEADER_SIZE);
                    let need = padding + size;
                    if need <= fb.size {
                        let slack = fb.size - need;
                        if best.is_none_or(|(_, _, s)| slack < s) {
                            best = Some((i, padding, slack));
                        }
                    }
                }
                best.map(|(i, padding, _)| (i, padding))
            }
        }
    }

    fn write_header(&mut self, payload: usize, block_size: u32, padding: u32) {
        let at = payload - HEADER_SIZE;
        self.arena[at..at + 4].copy_from_slice(&block_size.to_le_bytes());
        self.arena[at + 4..at + 8].copy_from_slice(&padding.to_le_bytes());
    }

    fn read_header(&self, payload: usize) -> (usize, usize) {
        let at = payload - HEADER_SIZE;
        let block_size = u32::from_le_bytes(self.arena[at..at + 4].try_into().unwrap());
        let padding = u32::from_le_bytes(self.arena[at + 4..at + 8].try_into().unwrap());
        (block_size as usize, padding as usize)
    }

    /// True if `block` lies inside the arena and does not intersect any
    /// free range.
    fn is_live(&self, block: Block) -> bool {
        if block.len == 0 || block.offset < HEADER_SIZE || block.end() > self.usage.total {
            return false;
        }
        let after = self.free.partition_point(|fb| fb.offset <= block.offset);
        if after > 0 && self.free[after - 1].end() > block.offset {
            return false;
        }
        if let Some(next) = self.free.get(after) {
            if next.offset < block.end() {
                return false;
            }
        }
        true
    }
}

impl Allocator for FreeListAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Result<Block, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        if size > self.usage.total {
            return Err(AllocError::OutOfMemory);
        }
        let align = if align == 0 { MIN_ALIGN } else { align };

        let (index, padding) = self.find(size, align).ok_or(AllocError::OutOfMemory)?;
        let chosen = self.free[index];
        let block_size = padding + size;
        let rest = chosen.size - block_size;

        if rest > 0 {
            // the remainder stays where it was, just shrunk from the
            // front; registry order is preserved
            self.free[index] = FreeBlock {
                offset: chosen.offset + block_size,
                size: rest,
            };
        } else {
            self.free.remove(index);
        }

        let payload = chosen.offset + padding;
        self.write_header(payload, block_size as u32, padding as u32);
        self.usage.charge(block_size);
        trace!(
            "freelist: alloc {size}@{align} -> offset {payload} (block {block_size}, rest {rest})"
        );
        Ok(Block::new(payload, size))
    }

    fn free(&mut self, block: Block) -> Result<(), AllocError> {
        if block.offset < HEADER_SIZE || block.end() > self.usage.total {
            return Err(AllocError::InvalidBlock);
        }

        let (block_size, padding) = self.read_header(block.offset);
        if padding < HEADER_SIZE || padding > block.offset || block_size != padding + block.len {
            return Err(AllocError::InvalidBlock);
        }
        let start = block.offset - padding;

        // sorted insertion point; a double free shows up as an overlap
        // with a registry neighbor
        let pos = match self.free.binary_search_by_key(&start, |fb| fb.offset) {
            Ok(_) => return Err(AllocError::InvalidBlock),
            Err(pos) => pos,
        };
        if pos > 0 && self.free[pos - 1].end() > start {
            return Err(AllocError::InvalidBlock);
        }
        if let Some(next) = self.free.get(pos) {
            if next.offset < start + block_size {
                return Err(AllocError::InvalidBlock);
            }
        }

        // eager coalescing with whichever neighbors are contiguous
        let merges_prev = pos > 0 && self.free[pos - 1].end() == start;
        let merges_next = self
            .free
            .get(pos)
            .is_some_and(|next| start + block_size == next.offset);

        match (merges_prev, merges_next) {
            (true, true) => {
                let next_size = self.free[pos].size;
                self.free[pos - 1].size += block_size + next_size;
                self.free.remove(pos);
            }
            (true, false) => self.free[pos - 1].size += block_size,
            (false, true) => {
                let next = self.free[pos];
                self.free[pos] = FreeBlock {
                    offset: start,
                    size: block_size + next.size,
                };
            }
            (false, false) => self.free.insert(
                pos,
                FreeBlock {
                    offset: start,
                    size: block_size,
                },
            ),
        }

        self.usage.release(block_size);
        trace!("freelist: free offset {} (block {block_size})", block.offset);
        Ok(())
    }

    fn reset(&mut self) {
        self.free.clear();
        self.free.push(FreeBlock {
            offset: 0,
            size: self.usage.total,
        });
        self.usage.clear();
    }

    fn get(&self, block: Block) -> Option<&[u8]> {
        if !self.is_live(block) {
            return None;
        }
        self.arena.get(block.offset..block.end())
    }

    fn get_mut(&mut self, block: Block) -> Option<&mut [u8]> {
        if !self.is_live(block) {
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
    fn test_freelist_basic_allocation() {
        let mut alloc = FreeListAllocator::new(1024, Policy::FirstFit).unwrap();

        let block = alloc.allocate(64, 0).unwrap();
        assert_eq!(block.offset % MIN_ALIGN, 0);
        alloc.get_mut(block).unwrap().fill(0x5A);
        assert_eq!(alloc.get(block).unwrap()[63], 0x5A);

        alloc.free(block).unwrap();
        assert_eq!(alloc.used(), 0);
        assert!(alloc.get(block).is_none());
    }

    #[test]
    fn test_freelist_alignment() {
        let mut alloc = FreeListAllocator::new(2048, Policy::FirstFit).unwrap();
        alloc.allocate(3, 0).unwrap();
        let block = alloc.allocate(32, 64).unwrap();
        assert_eq!(block.offset % 64, 0);
    }

    #[test]
    fn test_freelist_split_and_coalesce_round_trip() {
        let mut alloc = FreeListAllocator::new(300, Policy::FirstFit).unwrap();

        let b1 = alloc.allocate(32, 0).unwrap();
        let b2 = alloc.allocate(32, 0).unwrap();
        let b3 = alloc.allocate(32, 0).unwrap();
        assert!(b1.offset < b2.offset && b2.offset < b3.offset);

        alloc.free(b2).unwrap();
        alloc.free(b1).unwrap();
        alloc.free(b3).unwrap();

        // everything merged back into one arena-spanning range
        assert_eq!(alloc.fragment_count(), 1);
        assert_eq!(alloc.used(), 0);

        // which a near-arena-sized allocation proves: only the header
        // overhead of a single block is left over
        let big = alloc.allocate(300 - HEADER_SIZE, 0).unwrap();
        assert_eq!(big.len, 292);
        assert_eq!(alloc.used(), alloc.total());
    }

    #[test]
    fn test_freelist_first_fit_vs_best_fit() {
        // replay the same fragmentation pattern in two allocators that
        // differ only in policy; free ranges end up as
        // [{0,40}, {56,10}, {82,56}, {160,140}]
        fn fragment(alloc: &mut FreeListAllocator) -> Block {
            let a = alloc.allocate(32, 0).unwrap();
            let _s1 = alloc.allocate(8, 0).unwrap();
            let b = alloc.allocate(2, 0).unwrap();
            let _s2 = alloc.allocate(2, 0).unwrap();
            let c = alloc.allocate(42, 0).unwrap();
            let _s3 = alloc.allocate(8, 0).unwrap();
            alloc.free(a).unwrap();
            alloc.free(b).unwrap();
            alloc.free(c).unwrap();
            alloc.allocate(2, 0).unwrap()
        }

        let mut first = FreeListAllocator::new(300, Policy::FirstFit).unwrap();
        let mut best = FreeListAllocator::new(300, Policy::BestFit).unwrap();

        let first_pick = fragment(&mut first);
        let best_pick = fragment(&mut best);

        // first fit settles for the lowest block that fits, best fit
        // finds the exact-fit fragment further up
        assert_ne!(first_pick.offset, best_pick.offset);
        assert_eq!(first_pick.offset, 8);
        assert_eq!(best_pick.offset, 64);
    }

    #[test]
    fn test_freelist_out_of_memory() {
        let mut alloc = FreeListAllocator::new(64, Policy::FirstFit).unwrap();
        assert_eq!(alloc.allocate(100, 0), Err(AllocError::OutOfMemory));

        // exhaust, then verify a fragmented arena reports OOM for a
        // request no single fragment can hold
        let mut small = FreeListAllocator::new(160, Policy::FirstFit).unwrap();
        let _a = small.allocate(32, 0).unwrap();
        let b = small.allocate(32, 0).unwrap();
        let _c = small.allocate(32, 0).unwrap();
        let _d = small.allocate(32, 0).unwrap();
        assert_eq!(small.allocate(8, 0), Err(AllocError::OutOfMemory));

        small.free(b).unwrap();
        assert_eq!(small.allocate(64, 0), Err(AllocError::OutOfMemory));
        // the freed fragment itself is still usable
        assert!(small.allocate(32, 0).is_ok());
    }

    #[test]
    fn test_freelist_double_free_rejected() {
        let mut alloc = FreeListAllocator::new(256, Policy::FirstFit).unwrap();
        let a = alloc.allocate(16, 0).unwrap();
        let b = alloc.allocate(16, 0).unwrap();

        alloc.free(a).unwrap();
        assert_eq!(alloc.free(a), Err(AllocError::InvalidBlock));

        alloc.free(b).unwrap();
        assert_eq!(alloc.free(b), Err(AllocError::InvalidBlock));
    }

    #[test]
    fn test_freelist_foreign_block_rejected() {
        let mut alloc = FreeListAllocator::new(256, Policy::FirstFit).unwrap();
        alloc.allocate(16, 0).unwrap();

        assert_eq!(alloc.free(Block::new(4, 300)), Err(AllocError::InvalidBlock));
        assert_eq!(alloc.free(Block::new(0, 16)), Err(AllocError::InvalidBlock));
    }

    #[test]
    fn test_freelist_reset() {
        let mut alloc = FreeListAllocator::new(512, Policy::BestFit).unwrap();
        let a = alloc.allocate(64, 0).unwrap();
        alloc.allocate(64, 0).unwrap();

        alloc.reset();
        assert_eq!(alloc.fragment_count(), 1);
        assert_eq!(alloc.used(), 0);
        assert_eq!(alloc.peak(), 0);
        assert!(alloc.get(a).is_none());

        let again = alloc.allocate(64, 0).unwrap();
        assert_eq!(again.offset, a.offset);
    }

    #[test]
    fn test_freelist_bookkeeping_invariant() {
        let mut alloc = FreeListAllocator::new(1024, Policy::BestFit).unwrap();
        let a = alloc.allocate(100, 0).unwrap();
        let b = alloc.allocate(50, 16).unwrap();
        assert!(alloc.used() <= alloc.total());
        assert!(alloc.peak() >= alloc.used());

        alloc.free(a).unwrap();
        let c = alloc.allocate(30, 0).unwrap();
        assert!(alloc.peak() >= alloc.used());

        alloc.free(b).unwrap();
        alloc.free(c).unwrap();
        assert_eq!(alloc.used(), 0);
        assert!(alloc.peak() > 0);
    }
}
