//! Slot directory trait

use crate::error::Result;
use crate::model::{NewSlot, Slot, SlotId};

/// Source of truth for slot records
///
/// The allocator reads and writes through this trait; persistence is the
/// implementor's concern. Calls are synchronous and expected to be fast.
pub trait SlotDirectory: Send + Sync {
    /// Full scan of every slot
    fn get_all(&self) -> Result<Vec<Slot>>;

    /// Point lookup by id
    fn get_by_id(&self, id: SlotId) -> Result<Option<Slot>>;

    /// Point lookup by slot number
    fn find_by_number(&self, slot_number: &str) -> Result<Option<Slot>>;

    /// Insert a new slot and assign its id
    fn create(&self, slot: NewSlot) -> Result<Slot>;

    /// Overwrite an existing slot
    fn save(&self, slot: Slot) -> Result<Slot>;

    /// Remove a slot; returns whether it existed
    fn delete(&self, id: SlotId) -> Result<bool>;
}
