//! In-memory slot directory
//!
//! Backs the server and the tests. Slot numbers are kept unique.

use super::directory::SlotDirectory;
use crate::error::{Error, Result};
use crate::model::{NewSlot, Slot, SlotId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Slot directory held in process memory
#[derive(Debug)]
pub struct InMemorySlotDirectory {
    slots: RwLock<BTreeMap<SlotId, Slot>>,
    next_id: AtomicU64,
}

impl Default for InMemorySlotDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySlotDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a directory holding `slots`, ids assigned in order from 1
    pub fn seeded<I>(slots: I) -> Result<Self>
    where
        I: IntoIterator<Item = NewSlot>,
    {
        let directory = Self::new();
        for slot in slots {
            directory.create(slot)?;
        }
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    fn number_taken(slots: &BTreeMap<SlotId, Slot>, number: &str, except: Option<SlotId>) -> bool {
        slots
            .values()
            .any(|s| s.slot_number == number && Some(s.id) != except)
    }
}

impl SlotDirectory for InMemorySlotDirectory {
    fn get_all(&self) -> Result<Vec<Slot>> {
        Ok(self.slots.read().values().cloned().collect())
    }

    fn get_by_id(&self, id: SlotId) -> Result<Option<Slot>> {
        Ok(self.slots.read().get(&id).cloned())
    }

    fn find_by_number(&self, slot_number: &str) -> Result<Option<Slot>> {
        Ok(self
            .slots
            .read()
            .values()
            .find(|s| s.slot_number == slot_number)
            .cloned())
    }

    fn create(&self, slot: NewSlot) -> Result<Slot> {
        let mut slots = self.slots.write();
        if Self::number_taken(&slots, &slot.slot_number, None) {
            return Err(Error::AlreadyExists(format!(
                "Slot with number {} already exists",
                slot.slot_number
            )));
        }

        let id = SlotId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = Slot {
            id,
            slot_number: slot.slot_number,
            floor_number: slot.floor_number,
            vehicle_type: slot.vehicle_type,
            status: slot.status,
        };
        slots.insert(id, created.clone());
        debug!(slot = %id, number = %created.slot_number, "Created slot");
        Ok(created)
    }

    fn save(&self, slot: Slot) -> Result<Slot> {
        let mut slots = self.slots.write();
        if !slots.contains_key(&slot.id) {
            return Err(Error::NotFound(format!("{}", slot.id)));
        }
        if Self::number_taken(&slots, &slot.slot_number, Some(slot.id)) {
            return Err(Error::AlreadyExists(format!(
                "Slot with number {} already exists",
                slot.slot_number
            )));
        }
        slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    fn delete(&self, id: SlotId) -> Result<bool> {
        Ok(self.slots.write().remove(&id).is_some())
    }
}

/// Read a JSON array of slot definitions
pub fn load_slots<P: AsRef<Path>>(path: P) -> Result<Vec<NewSlot>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::Config(format!("Failed to open slot file {}: {}", path.display(), e))
    })?;
    let slots: Vec<NewSlot> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::Serialization(format!("Invalid slot file: {}", e)))?;
    info!(path = %path.display(), slots = slots.len(), "Loaded slot definitions");
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SlotStatus, VehicleType};

    #[test]
    fn test_create_assigns_sequential_ids() -> Result<()> {
        let directory = InMemorySlotDirectory::new();
        let a = directory.create(NewSlot::new("F1-01", 1, VehicleType::Car))?;
        let b = directory.create(NewSlot::new("F1-02", 1, VehicleType::Bike))?;

        assert_eq!(a.id, SlotId::new(1));
        assert_eq!(b.id, SlotId::new(2));
        assert_eq!(directory.len(), 2);
        Ok(())
    }

    #[test]
    fn test_duplicate_number_rejected() -> Result<()> {
        let directory = InMemorySlotDirectory::new();
        directory.create(NewSlot::new("F1-01", 1, VehicleType::Car))?;

        let err = directory
            .create(NewSlot::new("F1-01", 2, VehicleType::Truck))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        Ok(())
    }

    #[test]
    fn test_save_updates_and_checks_uniqueness() -> Result<()> {
        let directory = InMemorySlotDirectory::seeded(vec![
            NewSlot::new("F1-01", 1, VehicleType::Car),
            NewSlot::new("F1-02", 1, VehicleType::Car),
        ])?;

        let mut slot = directory.find_by_number("F1-01")?.unwrap();
        slot.status = SlotStatus::Occupied;
        directory.save(slot.clone())?;
        assert_eq!(
            directory.get_by_id(slot.id)?.unwrap().status,
            SlotStatus::Occupied
        );

        slot.slot_number = "F1-02".to_string();
        assert!(matches!(directory.save(slot), Err(Error::AlreadyExists(_))));
        Ok(())
    }

    #[test]
    fn test_save_unknown_slot() {
        let directory = InMemorySlotDirectory::new();
        let ghost = Slot::new(SlotId::new(99), "X", 0, VehicleType::Car);
        assert!(matches!(directory.save(ghost), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete() -> Result<()> {
        let directory =
            InMemorySlotDirectory::seeded(vec![NewSlot::new("F1-01", 1, VehicleType::Car)])?;
        assert!(directory.delete(SlotId::new(1))?);
        assert!(!directory.delete(SlotId::new(1))?);
        assert!(directory.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_slots_file() -> Result<()> {
        let path = std::env::temp_dir().join(format!("parkgate_slots_{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"slotNumber":"F1-01","floorNumber":1,"type":"CAR"},
                {"slotNumber":"F1-02","floorNumber":1,"type":"BIKE","status":"OCCUPIED"}]"#,
        )?;

        let slots = load_slots(&path)?;
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].status, SlotStatus::Occupied);

        std::fs::remove_file(path).ok();
        Ok(())
    }
}
