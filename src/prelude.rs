//! Prelude module for convenient imports
//!
//! This is the **only public API** for TinyArena. All items should be
//! accessed through:
//! ```
//! use tinyarena::prelude::*;
//! ```

pub use crate::AllocError;
pub use crate::Allocator;
pub use crate::Block;
pub use crate::Usage;

pub use crate::heap::{CollectStats, Heap, SystemHeap};

#[cfg(feature = "linear")]
pub use crate::backend::linear::LinearAllocator;

#[cfg(feature = "stack")]
pub use crate::backend::stack::StackAllocator;

#[cfg(feature = "pool")]
pub use crate::backend::pool::PoolAllocator;

#[cfg(feature = "freelist")]
pub use crate::backend::freelist::{FreeListAllocator, Policy};

#[cfg(feature = "system")]
pub use crate::backend::system::SystemAllocator;

#[cfg(feature = "global")]
pub use crate::global as memory;

#[cfg(feature = "global")]
pub use crate::global::{Field, MemoryConfig};
