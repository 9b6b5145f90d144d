//! Memory Facade Example
//!
//! Demonstrates the process-wide lifecycle: init the named fields, route
//! allocations through them with leak tracking, trigger a collection,
//! tear down.

use tinyarena::prelude::*;
use tinyarena::{tracked_alloc, tracked_free};

struct Particle {
    _position: [f32; 3],
    _velocity: [f32; 3],
}

fn main() {
    println!("=== Memory Facade Usage ===\n");

    // STEP 1: bring up the facade before any subsystem allocates
    memory::init(MemoryConfig {
        scratch_capacity: 16 * 1024,
        ..MemoryConfig::default()
    })
    .unwrap();

    // STEP 2: long-lived objects go to the General field, tracked
    let particle = tracked_alloc!(Field::General, Particle).unwrap();
    println!("Allocated a particle ({} bytes)", particle.len);
    println!("  live objects (general): {}", memory::live_objects(Field::General));

    // STEP 3: transient data goes to the Scratch field
    let frame_data = memory::with_field(Field::Scratch, |a| a.allocate(4096, 16))
        .unwrap()
        .unwrap();
    println!("Scratch frame buffer at offset {}", frame_data.offset);

    // end of frame: scratch is reclaimed wholesale
    memory::with_field(Field::Scratch, |a| a.reset()).unwrap();

    // STEP 4: deterministic cleanup point
    let stats = memory::run_gc();
    println!(
        "Collection cycle reclaimed {} objects / {} bytes",
        stats.freed_objects, stats.freed_bytes
    );

    // STEP 5: release tracked objects and shut down
    tracked_free!(Field::General, Particle, particle).unwrap();
    println!("  live objects (general): {}", memory::live_objects(Field::General));

    memory::end();
    println!("\nFacade torn down.");
}
