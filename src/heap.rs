//! Backing-heap collaborator.
//!
//! Every strategy obtains its arena once, at construction, from a [`Heap`].
//! The trait is the narrow seam to a collected heap: an engine embedding a
//! garbage collector implements it over the collector's raw allocation
//! primitive and reports reclamation through [`Heap::collect`]. The
//! default [`SystemHeap`] draws from the global allocator and has nothing
//! to collect.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::AllocError;

/// Result of one collection cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Objects reclaimed by the cycle.
    pub freed_objects: usize,
    /// Bytes returned to the heap by the cycle.
    pub freed_bytes: usize,
}

/// Provider of raw backing storage for arenas.
///
/// Implementations hand out owned, zero-initialized buffers; dropping the
/// buffer returns the storage. `collect` triggers one collection cycle on
/// heaps that have one and is a no-op elsewhere.
pub trait Heap {
    /// Acquires `len` bytes of zeroed storage.
    ///
    /// # Errors
    ///
    /// [`AllocError::OutOfMemory`] when the heap cannot provide the
    /// buffer, [`AllocError::ZeroSize`] for an empty request.
    fn acquire(&self, len: usize) -> Result<Box<[u8]>, AllocError>;

    /// Runs one collection cycle and reports what it reclaimed.
    fn collect(&self) -> CollectStats;
}

/// The process heap, with no collector behind it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHeap;

/// Shared instance for call sites that need a `'static` heap reference.
pub static SYSTEM_HEAP: SystemHeap = SystemHeap;

impl Heap for SystemHeap {
    fn acquire(&self, len: usize) -> Result<Box<[u8]>, AllocError> {
        if len == 0 {
            return Err(AllocError::ZeroSize);
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| AllocError::OutOfMemory)?;
        buf.resize(len, 0);
        Ok(buf.into_boxed_slice())
    }

    fn collect(&self) -> CollectStats {
        CollectStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_zeroed() {
        let buf = SystemHeap.acquire(64).unwrap();
        assert_eq!(buf.len(), 64);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_acquire_empty_rejected() {
        assert_eq!(SystemHeap.acquire(0), Err(AllocError::ZeroSize));
    }

    #[test]
    fn test_collect_is_idle() {
        assert_eq!(SystemHeap.collect(), CollectStats::default());
    }
}
