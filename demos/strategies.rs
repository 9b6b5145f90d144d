//! Strategy Comparison Example
//!
//! Walks the four arena strategies through the allocation patterns they
//! were built for and prints their bookkeeping along the way.

use tinyarena::prelude::*;

fn report(name: &str, alloc: &dyn Allocator) {
    println!(
        "  [{name}] used: {} / {} bytes, peak: {}",
        alloc.used(),
        alloc.total(),
        alloc.peak()
    );
}

fn main() {
    println!("=== Arena Strategy Comparison ===\n");

    // Linear: per-frame scratch, reclaimed wholesale
    println!("Linear allocator (4 KiB frame scratch)...");
    let mut scratch = LinearAllocator::new(4096).unwrap();
    for _ in 0..3 {
        scratch.allocate(512, 16).unwrap();
    }
    report("linear", &scratch);
    scratch.reset();
    println!("  after frame reset:");
    report("linear", &scratch);

    // Stack: nested scopes, freed in reverse
    println!("\nStack allocator (nested scopes)...");
    let mut stack = StackAllocator::new(1024).unwrap();
    let outer = stack.allocate(128, 8).unwrap();
    let inner = stack.allocate(64, 8).unwrap();
    report("stack", &stack);
    stack.free(inner).unwrap();
    stack.free(outer).unwrap();
    report("stack", &stack);

    // Pool: uniform objects, recycled chunks
    println!("\nPool allocator (64-byte particles)...");
    let mut pool = PoolAllocator::new(1024, 64).unwrap();
    let first = pool.allocate(64, 0).unwrap();
    let _second = pool.allocate(64, 0).unwrap();
    pool.free(first).unwrap();
    let recycled = pool.allocate(64, 0).unwrap();
    println!("  recycled chunk offset: {} (was {})", recycled.offset, first.offset);
    report("pool", &pool);

    // Free list: mixed sizes, coalescing
    println!("\nFree-list allocator (mixed sizes, best fit)...");
    let mut general = FreeListAllocator::new(2048, Policy::BestFit).unwrap();
    let a = general.allocate(100, 8).unwrap();
    let b = general.allocate(300, 8).unwrap();
    let c = general.allocate(50, 8).unwrap();
    report("freelist", &general);
    println!("  fragments: {}", general.fragment_count());

    general.free(b).unwrap();
    general.free(a).unwrap();
    general.free(c).unwrap();
    println!("  after freeing everything:");
    report("freelist", &general);
    println!("  fragments: {} (coalesced)", general.fragment_count());
}
