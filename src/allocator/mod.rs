//! Nearest-slot allocation engine
//!
//! # Architecture
//!
//! ```text
//! SlotAllocator ── Mutex ──▶ GateHeapIndex
//!   │                          ├─→ (GATE_1, CAR)  → min-heap [A:5, B:50]
//!   │                          ├─→ (GATE_2, CAR)  → min-heap [B:5, A:50]
//!   │                          └─→ ...one heap per (gate, vehicle type)
//!   │
//!   ├─→ SlotDirectory   (source of truth for FREE / OCCUPIED)
//!   └─→ DistanceTable   (gate, slot number) → distance
//! ```
//!
//! Allocate pops the nearest candidate, re-reads it from the directory,
//! marks it OCCUPIED and purges it from every gate. Release marks the slot
//! FREE and pushes it back into every gate with that gate's distance.
//! Both run under the same lock as rebuild, so no caller ever sees a
//! half-updated index.

#[allow(clippy::module_inception)]
pub mod allocator;
pub mod index;
pub mod slot_distance;

pub use allocator::{Inconsistency, SlotAllocator};
pub use index::GateHeapIndex;
pub use slot_distance::SlotDistance;
