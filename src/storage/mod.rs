//! Slot storage
//!
//! The slot directory is the source of truth for slot records and their
//! FREE/OCCUPIED status. The allocation index is only a cache of it.
//!
//! ```text
//! SlotDirectory (trait)
//!   └─→ InMemorySlotDirectory   (BTreeMap<SlotId, Slot> behind an RwLock)
//! ```

pub mod directory;
pub mod memory;

pub use directory::SlotDirectory;
pub use memory::{load_slots, InMemorySlotDirectory};
