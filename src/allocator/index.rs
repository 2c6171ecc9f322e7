//! Per-gate, per-vehicle-type nearest-slot index

use super::slot_distance::SlotDistance;
use crate::distance::DistanceTable;
use crate::error::Result;
use crate::model::{Gate, Slot, SlotId, VehicleType};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

type MinHeap = BinaryHeap<Reverse<SlotDistance>>;

/// Min-heaps of free slots, one per (gate, vehicle type)
///
/// The index is a cache of the slot directory. It is not synchronized;
/// [`SlotAllocator`](super::SlotAllocator) owns it behind a single lock.
#[derive(Debug, Clone)]
pub struct GateHeapIndex {
    heaps: HashMap<(Gate, VehicleType), MinHeap>,
}

impl Default for GateHeapIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl GateHeapIndex {
    /// Create an index with an empty heap for every (gate, type) pair
    pub fn new() -> Self {
        let mut heaps = HashMap::with_capacity(Gate::ALL.len() * VehicleType::ALL.len());
        for gate in Gate::ALL {
            for vehicle_type in VehicleType::ALL {
                heaps.insert((gate, vehicle_type), MinHeap::new());
            }
        }
        Self { heaps }
    }

    /// Build an index from a full slot snapshot
    ///
    /// Every slot in the snapshot must have a distance from every gate,
    /// occupied ones included, since they come back on release. Only free
    /// slots are indexed.
    pub fn build(slots: &[Slot], distances: &DistanceTable) -> Result<Self> {
        let mut index = Self::new();
        for slot in slots {
            let per_gate = distances.distances_for(&slot.slot_number)?;
            if !slot.is_free() {
                continue;
            }
            for (gate, distance) in per_gate {
                index.insert(gate, slot.vehicle_type, SlotDistance::new(slot.id, distance));
            }
        }
        Ok(index)
    }

    /// Replace the whole index with one built from `slots`
    ///
    /// On error the current contents are left untouched.
    pub fn rebuild(&mut self, slots: &[Slot], distances: &DistanceTable) -> Result<()> {
        *self = Self::build(slots, distances)?;
        Ok(())
    }

    /// Remove and return the nearest entry for (gate, type)
    pub fn pop_nearest(&mut self, gate: Gate, vehicle_type: VehicleType) -> Option<SlotDistance> {
        self.heaps
            .get_mut(&(gate, vehicle_type))
            .and_then(|heap| heap.pop())
            .map(|Reverse(entry)| entry)
    }

    /// Add one entry to one (gate, type) heap
    pub fn insert(&mut self, gate: Gate, vehicle_type: VehicleType, entry: SlotDistance) {
        self.heaps
            .entry((gate, vehicle_type))
            .or_default()
            .push(Reverse(entry));
    }

    /// Remove every entry for `slot_id` from all gates' heaps of `vehicle_type`
    ///
    /// Returns the number of entries removed.
    pub fn purge(&mut self, slot_id: SlotId, vehicle_type: VehicleType) -> usize {
        let mut removed = 0;
        for gate in Gate::ALL {
            if let Some(heap) = self.heaps.get_mut(&(gate, vehicle_type)) {
                let before = heap.len();
                heap.retain(|Reverse(entry)| entry.slot_id != slot_id);
                removed += before - heap.len();
            }
        }
        removed
    }

    /// Number of entries for (gate, type)
    pub fn len(&self, gate: Gate, vehicle_type: VehicleType) -> usize {
        self.heaps
            .get(&(gate, vehicle_type))
            .map_or(0, BinaryHeap::len)
    }

    /// True when no heap holds any entry
    pub fn is_empty(&self) -> bool {
        self.heaps.values().all(BinaryHeap::is_empty)
    }

    /// Free slots of `vehicle_type`, as seen from the first gate
    pub fn free_count(&self, vehicle_type: VehicleType) -> usize {
        self.len(Gate::ALL[0], vehicle_type)
    }

    /// Entries for (gate, type), nearest first
    pub fn entries(&self, gate: Gate, vehicle_type: VehicleType) -> Vec<SlotDistance> {
        let mut entries: Vec<SlotDistance> = self
            .heaps
            .get(&(gate, vehicle_type))
            .map(|heap| heap.iter().map(|Reverse(entry)| *entry).collect())
            .unwrap_or_default();
        entries.sort();
        entries
    }

    /// Distance of the nearest entry for (gate, type), without removing it
    pub fn nearest_distance(&self, gate: Gate, vehicle_type: VehicleType) -> Option<u32> {
        self.heaps
            .get(&(gate, vehicle_type))
            .and_then(|heap| heap.peek())
            .map(|Reverse(entry)| entry.distance)
    }

    /// How many times `slot_id` appears in (gate, type)
    pub fn occurrences(&self, gate: Gate, vehicle_type: VehicleType, slot_id: SlotId) -> usize {
        self.heaps
            .get(&(gate, vehicle_type))
            .map_or(0, |heap| {
                heap.iter()
                    .filter(|Reverse(entry)| entry.slot_id == slot_id)
                    .count()
            })
    }

    pub fn contains(&self, gate: Gate, vehicle_type: VehicleType, slot_id: SlotId) -> bool {
        self.occurrences(gate, vehicle_type, slot_id) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceEntry;
    use crate::error::Error;
    use crate::model::SlotStatus;

    fn table(rows: &[(&str, [u32; 3])]) -> DistanceTable {
        DistanceTable::from_entries(rows.iter().flat_map(|(number, per_gate)| {
            Gate::ALL
                .into_iter()
                .zip(per_gate.iter())
                .map(move |(gate, d)| DistanceEntry::new(gate, *number, *d))
        }))
    }

    fn car(id: u64, number: &str) -> Slot {
        Slot::new(SlotId::new(id), number, 1, VehicleType::Car)
    }

    #[test]
    fn test_new_index_is_empty() {
        let index = GateHeapIndex::new();
        assert!(index.is_empty());
        for gate in Gate::ALL {
            for vt in VehicleType::ALL {
                assert_eq!(index.len(gate, vt), 0);
            }
        }
    }

    #[test]
    fn test_build_orders_by_gate_distance() {
        let distances = table(&[("A", [5, 50, 20]), ("B", [50, 5, 10])]);
        let slots = vec![car(1, "A"), car(2, "B")];
        let mut index = GateHeapIndex::build(&slots, &distances).unwrap();

        assert_eq!(index.len(Gate::Gate1, VehicleType::Car), 2);
        assert_eq!(index.len(Gate::Gate1, VehicleType::Bike), 0);
        assert_eq!(index.nearest_distance(Gate::Gate3, VehicleType::Car), Some(10));

        let first = index.pop_nearest(Gate::Gate1, VehicleType::Car).unwrap();
        assert_eq!(first.slot_id, SlotId::new(1));
        assert_eq!(first.distance, 5);

        let first = index.pop_nearest(Gate::Gate2, VehicleType::Car).unwrap();
        assert_eq!(first.slot_id, SlotId::new(2));
    }

    #[test]
    fn test_build_skips_occupied_but_requires_their_distances() {
        let distances = table(&[("A", [1, 2, 3]), ("B", [4, 5, 6])]);
        let mut occupied = car(2, "B");
        occupied.status = SlotStatus::Occupied;
        let index = GateHeapIndex::build(&[car(1, "A"), occupied], &distances).unwrap();

        for gate in Gate::ALL {
            assert!(index.contains(gate, VehicleType::Car, SlotId::new(1)));
            assert!(!index.contains(gate, VehicleType::Car, SlotId::new(2)));
        }

        let mut orphan = car(3, "C");
        orphan.status = SlotStatus::Occupied;
        let err = GateHeapIndex::build(&[car(1, "A"), orphan], &distances).unwrap_err();
        assert!(matches!(err, Error::MissingDistance { .. }));
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_contents() {
        let distances = table(&[("A", [1, 2, 3])]);
        let mut index = GateHeapIndex::build(&[car(1, "A")], &distances).unwrap();

        let result = index.rebuild(&[car(1, "A"), car(2, "MISSING")], &distances);
        assert!(result.is_err());
        assert!(index.contains(Gate::Gate1, VehicleType::Car, SlotId::new(1)));
    }

    #[test]
    fn test_purge_removes_from_every_gate() {
        let distances = table(&[("A", [1, 2, 3]), ("B", [4, 5, 6])]);
        let mut index = GateHeapIndex::build(&[car(1, "A"), car(2, "B")], &distances).unwrap();

        let removed = index.purge(SlotId::new(1), VehicleType::Car);
        assert_eq!(removed, Gate::ALL.len());
        for gate in Gate::ALL {
            assert!(!index.contains(gate, VehicleType::Car, SlotId::new(1)));
            assert!(index.contains(gate, VehicleType::Car, SlotId::new(2)));
        }

        assert_eq!(index.purge(SlotId::new(1), VehicleType::Car), 0);
    }

    #[test]
    fn test_insert_after_pop() {
        let distances = table(&[("A", [1, 2, 3])]);
        let mut index = GateHeapIndex::build(&[car(1, "A")], &distances).unwrap();

        let popped = index.pop_nearest(Gate::Gate2, VehicleType::Car).unwrap();
        assert_eq!(index.len(Gate::Gate2, VehicleType::Car), 0);
        assert!(index.pop_nearest(Gate::Gate2, VehicleType::Car).is_none());

        index.insert(Gate::Gate2, VehicleType::Car, popped);
        assert_eq!(index.entries(Gate::Gate2, VehicleType::Car).len(), 1);
        assert_eq!(index.occurrences(Gate::Gate2, VehicleType::Car, SlotId::new(1)), 1);
    }

    #[test]
    fn test_entries_sorted_nearest_first() {
        let distances = table(&[("A", [30, 1, 1]), ("B", [10, 1, 1]), ("C", [20, 1, 1])]);
        let index =
            GateHeapIndex::build(&[car(1, "A"), car(2, "B"), car(3, "C")], &distances).unwrap();

        let order: Vec<u32> = index
            .entries(Gate::Gate1, VehicleType::Car)
            .iter()
            .map(|e| e.distance)
            .collect();
        assert_eq!(order, vec![10, 20, 30]);
        assert_eq!(index.free_count(VehicleType::Car), 3);
    }
}
