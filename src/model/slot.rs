//! Parking slot records

use super::gate::VehicleType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a slot in the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u64);

impl SlotId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot#{}", self.0)
    }
}

/// Occupancy of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Free,
    Occupied,
}

/// A parking slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    /// Human-facing number, unique across the facility (e.g. `F1-03`)
    pub slot_number: String,
    pub floor_number: i32,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub status: SlotStatus,
}

impl Slot {
    /// Create a new free slot
    pub fn new(
        id: SlotId,
        slot_number: impl Into<String>,
        floor_number: i32,
        vehicle_type: VehicleType,
    ) -> Self {
        Self {
            id,
            slot_number: slot_number.into(),
            floor_number,
            vehicle_type,
            status: SlotStatus::Free,
        }
    }

    pub fn is_free(&self) -> bool {
        self.status == SlotStatus::Free
    }

    /// Mark this slot occupied
    pub fn occupy(&mut self) {
        self.status = SlotStatus::Occupied;
    }

    /// Mark this slot free
    pub fn free(&mut self) {
        self.status = SlotStatus::Free;
    }
}

/// Slot definition without an id, as supplied by seed files and admins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlot {
    pub slot_number: String,
    pub floor_number: i32,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    #[serde(default = "default_status")]
    pub status: SlotStatus,
}

fn default_status() -> SlotStatus {
    SlotStatus::Free
}

impl NewSlot {
    pub fn new(slot_number: impl Into<String>, floor_number: i32, vehicle_type: VehicleType) -> Self {
        Self {
            slot_number: slot_number.into(),
            floor_number,
            vehicle_type,
            status: SlotStatus::Free,
        }
    }
}

/// Administrative edit; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotUpdate {
    pub slot_number: Option<String>,
    pub floor_number: Option<i32>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<VehicleType>,
    pub status: Option<SlotStatus>,
}

impl SlotUpdate {
    /// Apply this edit to `slot`
    pub fn apply_to(&self, slot: &mut Slot) {
        if let Some(number) = &self.slot_number {
            slot.slot_number = number.clone();
        }
        if let Some(floor) = self.floor_number {
            slot.floor_number = floor;
        }
        if let Some(vt) = self.vehicle_type {
            slot.vehicle_type = vt;
        }
        if let Some(status) = self.status {
            slot.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lifecycle() {
        let mut slot = Slot::new(SlotId::new(1), "F1-01", 1, VehicleType::Car);
        assert!(slot.is_free());

        slot.occupy();
        assert_eq!(slot.status, SlotStatus::Occupied);

        slot.free();
        assert!(slot.is_free());
    }

    #[test]
    fn test_slot_json_shape() {
        let slot = Slot::new(SlotId::new(7), "F2-03", 2, VehicleType::Bike);
        let value = serde_json::to_value(&slot).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["slotNumber"], "F2-03");
        assert_eq!(value["floorNumber"], 2);
        assert_eq!(value["type"], "BIKE");
        assert_eq!(value["status"], "FREE");
    }

    #[test]
    fn test_new_slot_defaults_to_free() {
        let parsed: NewSlot =
            serde_json::from_str(r#"{"slotNumber":"F4-08","floorNumber":4,"type":"TRUCK"}"#)
                .unwrap();
        assert_eq!(parsed.status, SlotStatus::Free);
        assert_eq!(parsed.vehicle_type, VehicleType::Truck);
    }

    #[test]
    fn test_slot_update_applies_only_present_fields() {
        let mut slot = Slot::new(SlotId::new(3), "F1-05", 1, VehicleType::Truck);
        let update = SlotUpdate {
            floor_number: Some(2),
            vehicle_type: Some(VehicleType::Car),
            ..Default::default()
        };
        update.apply_to(&mut slot);

        assert_eq!(slot.slot_number, "F1-05");
        assert_eq!(slot.floor_number, 2);
        assert_eq!(slot.vehicle_type, VehicleType::Car);
        assert!(slot.is_free());
    }
}
