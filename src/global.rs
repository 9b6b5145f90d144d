//! Process-wide memory facade.
//!
//! Engine subsystems do not construct allocators themselves; they go
//! through two named fields installed once at process start:
//!
//! - [`Field::General`] - the default allocator, a heap pass-through
//!   ([`SystemAllocator`]); object lifetimes are arbitrary.
//! - [`Field::Scratch`] - a [`LinearAllocator`] for transient data,
//!   reclaimed wholesale between frames.
//!
//! # Lifecycle
//!
//! [`init`] installs both fields and remembers the backing [`Heap`];
//! [`end`] tears them down and runs a final collection; [`run_gc`]
//! triggers a collection cycle on demand for deterministic cleanup
//! points. Using a field outside the init/end window is an error, not
//! undefined behavior.
//!
//! ```rust,no_run
//! use tinyarena::prelude::*;
//!
//! fn main() {
//!     memory::init(MemoryConfig::default()).unwrap();
//!
//!     let block = memory::with_field(Field::General, |a| a.allocate(128, 8))
//!         .unwrap()
//!         .unwrap();
//!     memory::with_field(Field::General, |a| a.free(block))
//!         .unwrap()
//!         .unwrap();
//!
//!     memory::end();
//! }
//! ```
//!
//! # Thread Safety
//!
//! Each field is guarded by a `spin::Mutex`, so facade access is safe
//! from any thread; the closure passed to [`with_field`] runs under the
//! lock and must not call back into the same field. The live-object
//! counters are atomics and may be read without the lock.
//!
//! # Leak auditing
//!
//! [`track_alloc`]/[`track_free`] (or the [`tracked_alloc!`] /
//! [`tracked_free!`] macros) maintain a per-field live-object count -
//! informational bookkeeping, not ownership. In debug builds they also
//! record a type-name-to-size map readable via [`debug_type_sizes`] for
//! hunting leaks by type.
//!
//! [`tracked_alloc!`]: crate::tracked_alloc
//! [`tracked_free!`]: crate::tracked_free

use core::sync::atomic::{AtomicUsize, Ordering};

use alloc::boxed::Box;
use log::debug;
use spin::Mutex;

use crate::backend::linear::LinearAllocator;
use crate::backend::system::SystemAllocator;
use crate::heap::{CollectStats, Heap, SYSTEM_HEAP};
use crate::{AllocError, Allocator};

/// Default scratch-arena capacity installed by [`MemoryConfig::default`].
pub const DEFAULT_SCRATCH_CAPACITY: usize = 64 * 1024;

/// Named allocator fields of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// General-purpose allocations of arbitrary lifetime.
    General,
    /// Transient per-frame data; reclaimed by bulk reset.
    Scratch,
}

/// Configuration for [`init`].
#[derive(Clone, Copy)]
pub struct MemoryConfig {
    /// Capacity of the scratch (linear) arena in bytes.
    pub scratch_capacity: usize,
    /// Backing heap for the arenas and the collection entry points.
    pub heap: &'static (dyn Heap + Sync),
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            heap: &SYSTEM_HEAP,
        }
    }
}

struct Slot {
    allocator: Mutex<Option<Box<dyn Allocator + Send>>>,
    live: AtomicUsize,
}

impl Slot {
    const fn new() -> Self {
        Self {
            allocator: Mutex::new(None),
            live: AtomicUsize::new(0),
        }
    }
}

static GENERAL: Slot = Slot::new();
static SCRATCH: Slot = Slot::new();
static HEAP: Mutex<Option<&'static (dyn Heap + Sync)>> = Mutex::new(None);

#[cfg(debug_assertions)]
static TYPE_SIZES: Mutex<alloc::collections::BTreeMap<&'static str, usize>> =
    Mutex::new(alloc::collections::BTreeMap::new());

fn slot_of(field: Field) -> &'static Slot {
    match field {
        Field::General => &GENERAL,
        Field::Scratch => &SCRATCH,
    }
}

/// Installs the named fields and starts the collection lifecycle.
///
/// # Errors
///
/// [`AllocError::AlreadyInitialized`] if called again without an
/// intervening [`end`]; heap errors if the scratch arena cannot be
/// acquired.
pub fn init(config: MemoryConfig) -> Result<(), AllocError> {
    let mut heap = HEAP.lock();
    if heap.is_some() {
        return Err(AllocError::AlreadyInitialized);
    }

    let scratch = LinearAllocator::with_heap(config.scratch_capacity, config.heap)?;
    *GENERAL.allocator.lock() = Some(Box::new(SystemAllocator::new()));
    *SCRATCH.allocator.lock() = Some(Box::new(scratch));
    GENERAL.live.store(0, Ordering::Relaxed);
    SCRATCH.live.store(0, Ordering::Relaxed);
    *heap = Some(config.heap);

    debug!(
        "memory: initialized (scratch {} bytes)",
        config.scratch_capacity
    );
    Ok(())
}

/// Tears down both fields, releasing their arenas, and runs a final
/// collection cycle. Safe to call when not initialized.
pub fn end() {
    let mut heap = HEAP.lock();
    *GENERAL.allocator.lock() = None;
    *SCRATCH.allocator.lock() = None;
    GENERAL.live.store(0, Ordering::Relaxed);
    SCRATCH.live.store(0, Ordering::Relaxed);

    #[cfg(debug_assertions)]
    TYPE_SIZES.lock().clear();

    if let Some(h) = heap.take() {
        let stats = h.collect();
        debug!(
            "memory: ended (final sweep reclaimed {} bytes)",
            stats.freed_bytes
        );
    }
}

/// Triggers one collection cycle on the configured heap.
///
/// Returns idle stats when the facade is not initialized or the heap has
/// no collector.
pub fn run_gc() -> CollectStats {
    match *HEAP.lock() {
        Some(heap) => heap.collect(),
        None => CollectStats::default(),
    }
}

/// Runs `f` with exclusive access to the named field.
///
/// # Errors
///
/// [`AllocError::Uninitialized`] outside the [`init`]/[`end`] window.
pub fn with_field<F, R>(field: Field, f: F) -> Result<R, AllocError>
where
    F: FnOnce(&mut dyn Allocator) -> R,
{
    let mut guard = slot_of(field).allocator.lock();
    let allocator = guard.as_deref_mut().ok_or(AllocError::Uninitialized)?;
    Ok(f(allocator))
}

/// Live-object count of the named field.
pub fn live_objects(field: Field) -> usize {
    slot_of(field).live.load(Ordering::Relaxed)
}

/// Records a constructed object of type `T` against the field's counter.
pub fn track_alloc<T>(field: Field) {
    slot_of(field).live.fetch_add(1, Ordering::Relaxed);

    #[cfg(debug_assertions)]
    TYPE_SIZES
        .lock()
        .insert(core::any::type_name::<T>(), core::mem::size_of::<T>());
}

/// Records a destroyed object of type `T` against the field's counter.
pub fn track_free<T>(field: Field) {
    slot_of(field).live.fetch_sub(1, Ordering::Relaxed);
}

/// Snapshot of the debug type-size map: every type allocated through the
/// tracked helpers since [`init`], with its size in bytes.
#[cfg(debug_assertions)]
pub fn debug_type_sizes() -> alloc::vec::Vec<(&'static str, usize)> {
    TYPE_SIZES
        .lock()
        .iter()
        .map(|(name, size)| (*name, *size))
        .collect()
}

/// Allocates room for a `$ty` from a named field and records it against
/// the field's live-object counter.
///
/// Evaluates to `Result<Block, AllocError>`.
///
/// ```rust,no_run
/// use tinyarena::prelude::*;
/// use tinyarena::{tracked_alloc, tracked_free};
///
/// memory::init(MemoryConfig::default()).unwrap();
///
/// let block = tracked_alloc!(Field::General, [f32; 16]).unwrap();
/// assert_eq!(memory::live_objects(Field::General), 1);
///
/// tracked_free!(Field::General, [f32; 16], block).unwrap();
/// memory::end();
/// ```
#[macro_export]
macro_rules! tracked_alloc {
    ($field:expr, $ty:ty) => {{
        let field = $field;
        $crate::global::with_field(field, |a| {
            a.allocate(::core::mem::size_of::<$ty>(), ::core::mem::align_of::<$ty>())
        })
        .and_then(|result| result)
        .inspect(|_| $crate::global::track_alloc::<$ty>(field))
    }};
}

/// Frees a block obtained via [`tracked_alloc!`] and decrements the
/// field's live-object counter.
///
/// Evaluates to `Result<(), AllocError>`.
///
/// [`tracked_alloc!`]: crate::tracked_alloc
#[macro_export]
macro_rules! tracked_free {
    ($field:expr, $ty:ty, $block:expr) => {{
        let field = $field;
        $crate::global::with_field(field, |a| a.free($block))
            .and_then(|result| result)
            .inspect(|_| $crate::global::track_free::<$ty>(field))
    }};
}
