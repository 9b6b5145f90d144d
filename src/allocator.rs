//! # TinyArena - Arena Allocation Strategies for Game Engines
//!
//! TinyArena provides the memory layer of a game engine: a family of
//! arena-backed allocation strategies with explicit, recoverable error
//! handling and a process-wide facade for engine subsystems.
//!
//! - **Handle-based access** - Allocations are `(offset, len)` blocks into
//!   an owned arena, read through byte-slice views; no raw pointers escape
//! - **Recoverable exhaustion** - Every strategy reports out-of-memory as
//!   an error value, never by aborting
//! - **Pluggable backing heap** - Arenas draw their storage from a
//!   [`Heap`](heap::Heap) collaborator, by default the system heap
//! - **Usage tracking** - Every strategy maintains `total`/`used`/`peak`
//!
//! ## Quick Start
//!
//! ```rust
//! use tinyarena::prelude::*;
//!
//! // A 4 KiB bump allocator for per-frame scratch data
//! let mut scratch = LinearAllocator::new(4096).unwrap();
//!
//! let block = scratch.allocate(256, 16).unwrap();
//! scratch.get_mut(block).unwrap()[0] = 0xAB;
//! assert_eq!(scratch.get(block).unwrap()[0], 0xAB);
//!
//! // Individual free is not part of the linear strategy;
//! // the whole arena is reclaimed at once.
//! scratch.reset();
//! ```
//!
//! ## Strategies
//!
//! | Strategy | Allocate | Free | Best for |
//! |----------|----------|------|----------|
//! | [`LinearAllocator`](backend::linear::LinearAllocator) | O(1) | bulk `reset` only | per-frame scratch |
//! | [`StackAllocator`](backend::stack::StackAllocator) | O(1) | O(1), LIFO order | nested scopes |
//! | [`PoolAllocator`](backend::pool::PoolAllocator) | O(1) | O(1) | uniform objects |
//! | [`FreeListAllocator`](backend::freelist::FreeListAllocator) | O(n) | O(n) | general purpose |
//! | [`SystemAllocator`](backend::system::SystemAllocator) | heap | heap | default/root |
//!
//! ## Safety Model
//!
//! Strategies own their arena (`Box<[u8]>`) and hand out [`Block`] handles
//! instead of pointers. Payload access goes through
//! [`Allocator::get`]/[`Allocator::get_mut`], which validate the handle
//! against the strategy's bookkeeping before returning a slice. A handle
//! for a freed region is rejected where the strategy can detect it (pool,
//! free list, stack top) rather than aliasing live data.
//!
//! Strategy instances are single-threaded by construction: all mutation
//! goes through `&mut self`. The [`global`] facade wraps the named
//! process-wide instances in locks; see its module docs.
//!
//! ## Process-wide facade
//!
//! ```rust,no_run
//! use tinyarena::prelude::*;
//!
//! fn main() {
//!     memory::init(MemoryConfig::default()).unwrap();
//!
//!     let block = memory::with_field(Field::Scratch, |a| a.allocate(64, 8))
//!         .unwrap()
//!         .unwrap();
//!     let _ = block;
//!
//!     memory::run_gc();
//!     memory::end();
//! }
//! ```
//!
//! ## Features
//!
//! - `linear`, `stack`, `pool`, `freelist`, `system` (default) - one flag
//!   per strategy
//! - `global` (default) - the process-wide facade; pulls in `spin`

#![no_std]
#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/tinyarena/0.1.0")]

extern crate alloc;

// Internal modules - use prelude for public API
pub mod backend;
pub mod heap;
mod utils;

#[cfg(feature = "global")]
pub mod global;

/// Convenient re-exports for common use - this is the public API
///
/// Users should import from prelude:
/// ```
/// use tinyarena::prelude::*;
/// ```
pub mod prelude;

pub use utils::align::{padding_for, padding_with_header};

/// A handle for a single allocation inside a strategy's arena.
///
/// Blocks replace raw pointers: they name a byte range that only the
/// owning allocator can resolve, via [`Allocator::get`] and
/// [`Allocator::get_mut`].
///
/// # Examples
///
/// ```
/// use tinyarena::Block;
///
/// let block = Block::new(64, 16);
/// let (offset, len) = block.parts();
/// assert_eq!(offset, 64);
/// assert_eq!(len, 16);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Byte offset of the payload inside the arena
    pub offset: usize,
    /// Payload length in bytes
    pub len: usize,
}

impl Block {
    /// Creates a handle from an offset and a length.
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Returns the offset and length as a tuple.
    pub const fn parts(&self) -> (usize, usize) {
        (self.offset, self.len)
    }

    /// Offset one past the end of the payload.
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Errors reported by allocators and the process facade.
///
/// Exhaustion and misuse are ordinary error values; no strategy aborts
/// the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The arena (or backing heap) cannot satisfy the request.
    OutOfMemory,
    /// The strategy does not support this operation (e.g. individual
    /// free on the linear strategy).
    UnsupportedOp,
    /// A stack-strategy free that does not target the topmost live block.
    OutOfOrderFree,
    /// A pool allocation whose size differs from the pool's chunk size.
    ChunkMismatch,
    /// Construction parameters are unusable (chunk geometry, arena cap).
    InvalidConfig,
    /// The handle does not name a live allocation of this strategy.
    InvalidBlock,
    /// A zero-byte allocation was requested.
    ZeroSize,
    /// The facade was initialized twice without an intervening teardown.
    AlreadyInitialized,
    /// The facade (or one of its fields) was used before initialization.
    Uninitialized,
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Self::OutOfMemory => "out of memory",
            Self::UnsupportedOp => "operation not supported by this strategy",
            Self::OutOfOrderFree => "free does not target the top of the stack",
            Self::ChunkMismatch => "allocation size differs from the pool chunk size",
            Self::InvalidConfig => "invalid allocator configuration",
            Self::InvalidBlock => "block is not a live allocation of this allocator",
            Self::ZeroSize => "zero-sized allocation",
            Self::AlreadyInitialized => "memory facade already initialized",
            Self::Uninitialized => "memory facade not initialized",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for AllocError {}

/// Byte bookkeeping common to every strategy.
///
/// Invariants after every successful operation: `used <= total` and
/// `peak >= used`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    /// Arena capacity in bytes.
    pub total: usize,
    /// Bytes currently handed out, including padding and headers.
    pub used: usize,
    /// High-water mark of `used`.
    pub peak: usize,
}

impl Usage {
    /// Bookkeeping for an arena of `total` bytes, nothing allocated yet.
    pub const fn new(total: usize) -> Self {
        Self {
            total,
            used: 0,
            peak: 0,
        }
    }

    /// Records `bytes` as allocated and updates the high-water mark.
    pub fn charge(&mut self, bytes: usize) {
        self.used += bytes;
        if self.used > self.peak {
            self.peak = self.used;
        }
    }

    /// Records `bytes` as returned.
    pub fn release(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.used);
        self.used -= bytes;
    }

    /// Forgets all allocations, including the high-water mark.
    pub fn clear(&mut self) {
        self.used = 0;
        self.peak = 0;
    }
}

/// Common capability of every allocation strategy.
///
/// `align == 0` means "no alignment constraint"; how that is interpreted
/// is strategy-dependent (the free list substitutes its minimum alignment,
/// the pool ignores alignment entirely). Non-zero alignments must be
/// powers of two.
///
/// Implementations are single-threaded per instance: every mutating
/// operation takes `&mut self`. Wrap an instance in a lock (as the
/// [`global`](crate::global) facade does) for shared use.
///
/// # Examples
///
/// ```
/// use tinyarena::prelude::*;
///
/// let mut pool = PoolAllocator::new(128, 16).unwrap();
///
/// let block = pool.allocate(16, 0).unwrap();
/// pool.get_mut(block).unwrap().fill(7);
/// assert_eq!(pool.used(), 16);
///
/// pool.free(block).unwrap();
/// assert_eq!(pool.used(), 0);
/// assert!(pool.get(block).is_none());
/// ```
pub trait Allocator {
    /// Allocates `size` bytes with the given alignment.
    ///
    /// # Errors
    ///
    /// [`AllocError::OutOfMemory`] when the arena cannot satisfy the
    /// request; strategy-specific misuse errors otherwise.
    fn allocate(&mut self, size: usize, align: usize) -> Result<Block, AllocError>;

    /// Returns a block to the allocator.
    ///
    /// # Errors
    ///
    /// Strategy-dependent: the linear strategy never frees individually,
    /// the stack strategy requires LIFO order, pool and free list reject
    /// handles they did not produce.
    fn free(&mut self, block: Block) -> Result<(), AllocError>;

    /// Bulk-frees every allocation without releasing the arena.
    fn reset(&mut self);

    /// Shared view of a live allocation, or `None` if the handle is not
    /// recognized.
    fn get(&self, block: Block) -> Option<&[u8]>;

    /// Mutable view of a live allocation, or `None` if the handle is not
    /// recognized.
    fn get_mut(&mut self, block: Block) -> Option<&mut [u8]>;

    /// Arena capacity in bytes.
    fn total(&self) -> usize;

    /// Bytes currently allocated, including padding and headers.
    fn used(&self) -> usize;

    /// High-water mark of [`used`](Self::used).
    fn peak(&self) -> usize;

    /// Bytes still available.
    fn available(&self) -> usize {
        self.total() - self.used()
    }
}
