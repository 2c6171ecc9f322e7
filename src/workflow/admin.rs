//! Administrative slot management
//!
//! Mutations run inside the allocator's lock and finish with a full index
//! refresh from the directory.

use super::service::ParkingService;
use crate::allocator::Inconsistency;
use crate::error::{Error, Result};
use crate::model::{NewSlot, Slot, SlotId, SlotUpdate};
use tracing::info;

impl ParkingService {
    pub fn list_slots(&self) -> Result<Vec<Slot>> {
        self.allocator.directory().get_all()
    }

    pub fn get_slot(&self, id: SlotId) -> Result<Slot> {
        self.allocator
            .directory()
            .get_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("{}", id)))
    }

    /// Add a slot; it always starts FREE
    pub fn add_slot(&self, slot: NewSlot) -> Result<Slot> {
        let created = self.allocator.add_slot(slot)?;
        info!(slot = %created.slot_number, id = %created.id, "Added slot");
        Ok(created)
    }

    pub fn update_slot(&self, id: SlotId, update: SlotUpdate) -> Result<Slot> {
        let saved = self.allocator.update_slot(id, &update)?;
        info!(slot = %saved.slot_number, id = %saved.id, status = ?saved.status, "Updated slot");
        Ok(saved)
    }

    /// Remove a slot; occupied slots cannot be removed
    pub fn delete_slot(&self, id: SlotId) -> Result<Slot> {
        let removed = self.allocator.remove_slot(id)?;
        info!(slot = %removed.slot_number, id = %id, "Deleted slot");
        Ok(removed)
    }

    pub fn check_consistency(&self) -> Result<Vec<Inconsistency>> {
        self.allocator.check_consistency()
    }
}
