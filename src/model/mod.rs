//! Domain model
//!
//! ```text
//! Gate (fixed)  ──distance──▶  Slot (id, number, floor, type, status)
//!                                 └─→ FREE ⇄ OCCUPIED
//! ```
//!
//! Gates and vehicle types are closed enums. Slots are owned by the
//! slot directory; the allocator only flips their status.

pub mod gate;
pub mod slot;

pub use gate::{Gate, VehicleType};
pub use slot::{NewSlot, Slot, SlotId, SlotStatus, SlotUpdate};
