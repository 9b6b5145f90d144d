//! Fixed-chunk strategy: O(1) allocation and free over uniform chunks.

use alloc::boxed::Box;
use alloc::vec;
use log::debug;

use crate::heap::{Heap, SystemHeap};
use crate::{AllocError, Allocator, Block, Usage};

/// Free-list terminator.
const END_OF_LIST: u32 = u32::MAX;
/// Side-table marker for a chunk that is currently allocated.
const CHUNK_LIVE: u32 = u32::MAX - 1;

/// Smallest supported chunk size in bytes.
pub const MIN_CHUNK_SIZE: usize = 8;

/// Pool allocator: one arena partitioned into equal chunks.
///
/// The free list is a LIFO stack of chunk indices held in a side table
/// next to the arena, so freed payload bytes are never reinterpreted as
/// list nodes. Chunks are interchangeable; the list order only matters
/// for the reuse pattern (last freed, first reused).
///
/// Every allocation must request exactly the chunk size. Alignment is
/// ignored: chunk boundaries are the pool's natural alignment.
pub struct PoolAllocator {
    arena: Box<[u8]>,
    chunk_size: usize,
    next_free: Box<[u32]>,
    free_head: u32,
    usage: Usage,
}

impl PoolAllocator {
    /// Creates a pool of `total / chunk_size` chunks from the system heap.
    ///
    /// # Errors
    ///
    /// [`AllocError::InvalidConfig`] unless `chunk_size` is at least
    /// [`MIN_CHUNK_SIZE`] and divides `total` exactly.
    pub fn new(total: usize, chunk_size: usize) -> Result<Self, AllocError> {
        Self::with_heap(total, chunk_size, &SystemHeap)
    }

    /// Creates a pool whose arena is acquired from `heap`.
    pub fn with_heap(
        total: usize,
        chunk_size: usize,
        heap: &dyn Heap,
    ) -> Result<Self, AllocError> {
        if chunk_size < MIN_CHUNK_SIZE || chunk_size > total || total % chunk_size != 0 {
            return Err(AllocError::InvalidConfig);
        }
        let chunks = total / chunk_size;
        if chunks >= CHUNK_LIVE as usize {
            return Err(AllocError::InvalidConfig);
        }

        let arena = heap.acquire(total)?;
        let mut pool = Self {
            arena,
            chunk_size,
            next_free: vec![END_OF_LIST; chunks].into_boxed_slice(),
            free_head: END_OF_LIST,
            usage: Usage::new(total),
        };
        pool.rebuild_free_list();
        debug!("pool: {chunks} chunks of {chunk_size} bytes");
        Ok(pool)
    }

    /// Size of each chunk in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks currently on the free list.
    pub fn free_chunks(&self) -> usize {
        (self.usage.total - self.usage.used) / self.chunk_size
    }

    fn rebuild_free_list(&mut self) {
        // ascending order; irrelevant for correctness, chunks are equal
        let chunks = self.next_free.len();
        for i in 0..chunks {
            self.next_free[i] = if i + 1 < chunks {
                (i + 1) as u32
            } else {
                END_OF_LIST
            };
        }
        self.free_head = if chunks > 0 { 0 } else { END_OF_LIST };
    }

    fn chunk_index(&self, block: Block) -> Option<usize> {
        if block.len != self.chunk_size || block.offset % self.chunk_size != 0 {
            return None;
        }
        let index = block.offset / self.chunk_size;
        (index < self.next_free.len()).then_some(index)
    }
}

impl Allocator for PoolAllocator {
    fn allocate(&mut self, size: usize, _align: usize) -> Result<Block, AllocError> {
        if size != self.chunk_size {
            return Err(AllocError::ChunkMismatch);
        }
        if self.free_head == END_OF_LIST {
            return Err(AllocError::OutOfMemory);
        }

        let index = self.free_head as usize;
        self.free_head = self.next_free[index];
        self.next_free[index] = CHUNK_LIVE;

        self.usage.charge(self.chunk_size);
        Ok(Block::new(index * self.chunk_size, self.chunk_size))
    }

    fn free(&mut self, block: Block) -> Result<(), AllocError> {
        let index = self.chunk_index(block).ok_or(AllocError::InvalidBlock)?;
        if self.next_free[index] != CHUNK_LIVE {
            // double free or a fabricated handle
            return Err(AllocError::InvalidBlock);
        }

        self.next_free[index] = self.free_head;
        self.free_head = index as u32;
        self.usage.release(self.chunk_size);
        Ok(())
    }

    fn reset(&mut self) {
        self.rebuild_free_list();
        self.usage.clear();
    }

    fn get(&self, block: Block) -> Option<&[u8]> {
        let index = self.chunk_index(block)?;
        if self.next_free[index] != CHUNK_LIVE {
            return None;
        }
        self.arena.get(block.offset..block.end())
    }

    fn get_mut(&mut self, block: Block) -> Option<&mut [u8]> {
        let index = self.chunk_index(block)?;
        if self.next_free[index] != CHUNK_LIVE {
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
