//! Slot allocator implementation

use super::index::GateHeapIndex;
use super::slot_distance::SlotDistance;
use crate::distance::DistanceTable;
use crate::error::{Error, Result};
use crate::metrics;
use crate::model::{Gate, NewSlot, Slot, SlotId, SlotStatus, SlotUpdate, VehicleType};
use crate::storage::SlotDirectory;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Allocates the nearest free slot to an entry gate
///
/// One lock guards the index for allocate, release and rebuild, and each
/// of them does its directory read/write while holding it. A slot handed
/// out by one gate is therefore gone from every gate before the lock is
/// released.
pub struct SlotAllocator {
    directory: Arc<dyn SlotDirectory>,
    distances: Arc<DistanceTable>,
    /// `None` until the first successful rebuild
    index: Mutex<Option<GateHeapIndex>>,
}

impl fmt::Debug for SlotAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotAllocator")
            .field("distances", &self.distances.len())
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl SlotAllocator {
    /// Create an allocator with an unbuilt index
    ///
    /// Nothing can be allocated until [`rebuild`](Self::rebuild) or
    /// [`refresh`](Self::refresh) succeeds.
    pub fn new(directory: Arc<dyn SlotDirectory>, distances: Arc<DistanceTable>) -> Self {
        Self {
            directory,
            distances,
            index: Mutex::new(None),
        }
    }

    /// Create an allocator and build its index from the directory
    pub fn bootstrap(
        directory: Arc<dyn SlotDirectory>,
        distances: Arc<DistanceTable>,
    ) -> Result<Self> {
        let allocator = Self::new(directory, distances);
        allocator.refresh()?;
        Ok(allocator)
    }

    pub fn directory(&self) -> &Arc<dyn SlotDirectory> {
        &self.directory
    }

    pub fn distances(&self) -> &Arc<DistanceTable> {
        &self.distances
    }

    /// Whether a rebuild has completed
    pub fn is_ready(&self) -> bool {
        self.index.lock().is_some()
    }

    /// Replace the index with one built from `slots`
    ///
    /// Fails with `MissingDistance` if any slot lacks a distance from any
    /// gate; the previous index stays in place in that case.
    pub fn rebuild(&self, slots: &[Slot]) -> Result<()> {
        let mut guard = self.index.lock();
        let rebuilt = GateHeapIndex::build(slots, &self.distances)?;
        publish_free_counts(&rebuilt);
        *guard = Some(rebuilt);
        metrics::record_rebuild();
        info!(slots = slots.len(), "Rebuilt slot index");
        Ok(())
    }

    /// Rebuild from a directory scan taken under the index lock
    pub fn refresh(&self) -> Result<()> {
        let mut guard = self.index.lock();
        self.refresh_locked(&mut guard)
    }

    fn refresh_locked(&self, index: &mut Option<GateHeapIndex>) -> Result<()> {
        let slots = self.directory.get_all()?;
        let rebuilt = GateHeapIndex::build(&slots, &self.distances)?;
        publish_free_counts(&rebuilt);
        *index = Some(rebuilt);
        metrics::record_rebuild();
        info!(slots = slots.len(), "Refreshed slot index from directory");
        Ok(())
    }

    /// Create a FREE slot and re-index
    ///
    /// The slot number must have a distance from every gate. Admin
    /// mutations hold the index lock from the first directory read to the
    /// rebuild, so no allocation or release interleaves with them.
    pub fn add_slot(&self, slot: NewSlot) -> Result<Slot> {
        let mut guard = self.index.lock();

        let slot_number = checked_number(&slot.slot_number)?;
        self.distances.distances_for(&slot_number)?;
        let created = self.directory.create(NewSlot {
            slot_number,
            status: SlotStatus::Free,
            ..slot
        })?;

        self.refresh_locked(&mut guard)?;
        Ok(created)
    }

    /// Apply an administrative edit to a slot and re-index
    pub fn update_slot(&self, id: SlotId, update: &SlotUpdate) -> Result<Slot> {
        let mut guard = self.index.lock();

        let mut slot = self
            .directory
            .get_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("{}", id)))?;
        update.apply_to(&mut slot);
        slot.slot_number = checked_number(&slot.slot_number)?;
        self.distances.distances_for(&slot.slot_number)?;
        let saved = self.directory.save(slot)?;

        self.refresh_locked(&mut guard)?;
        Ok(saved)
    }

    /// Delete a FREE slot and re-index; OCCUPIED slots are a `Conflict`
    pub fn remove_slot(&self, id: SlotId) -> Result<Slot> {
        let mut guard = self.index.lock();

        let slot = self
            .directory
            .get_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("{}", id)))?;
        if !slot.is_free() {
            return Err(Error::Conflict(format!(
                "Slot {} is occupied",
                slot.slot_number
            )));
        }
        if !self.directory.delete(id)? {
            return Err(Error::NotFound(format!("{}", id)));
        }

        self.refresh_locked(&mut guard)?;
        Ok(slot)
    }

    /// Allocate the nearest free slot of `vehicle_type` to `gate`
    ///
    /// Candidates are re-read from the directory before being committed.
    /// A candidate that is no longer free (or no longer of this type) is
    /// dropped from the index and the next one is tried.
    pub fn allocate(&self, gate: Gate, vehicle_type: VehicleType) -> Result<Slot> {
        let mut guard = self.index.lock();
        let index = guard.as_mut().ok_or(Error::IndexNotReady)?;

        while let Some(candidate) = index.pop_nearest(gate, vehicle_type) {
            let fresh = match self.directory.get_by_id(candidate.slot_id) {
                Ok(fresh) => fresh,
                Err(e) => {
                    index.insert(gate, vehicle_type, candidate);
                    metrics::record_allocation(gate, vehicle_type, metrics::OUTCOME_ERROR);
                    return Err(e);
                }
            };

            let mut slot = match fresh {
                Some(slot) if slot.is_free() && slot.vehicle_type == vehicle_type => slot,
                _ => {
                    debug!(
                        slot = %candidate.slot_id,
                        gate = %gate,
                        vehicle_type = %vehicle_type,
                        "Discarding stale index candidate"
                    );
                    index.purge(candidate.slot_id, vehicle_type);
                    metrics::record_stale_candidate();
                    continue;
                }
            };

            slot.occupy();
            let slot = match self.directory.save(slot) {
                Ok(saved) => saved,
                Err(e) => {
                    index.insert(gate, vehicle_type, candidate);
                    metrics::record_allocation(gate, vehicle_type, metrics::OUTCOME_ERROR);
                    return Err(e);
                }
            };

            let purged = index.purge(slot.id, vehicle_type);
            debug!(slot = %slot.id, purged, "Purged allocated slot from all gates");

            metrics::record_allocation(gate, vehicle_type, metrics::OUTCOME_ALLOCATED);
            metrics::set_free_slots(vehicle_type, index.free_count(vehicle_type));
            info!(
                gate = %gate,
                vehicle_type = %vehicle_type,
                slot = %slot.slot_number,
                distance = candidate.distance,
                "Allocated slot"
            );
            return Ok(slot);
        }

        metrics::record_allocation(gate, vehicle_type, metrics::OUTCOME_FULL);
        info!(gate = %gate, vehicle_type = %vehicle_type, "No free slot available");
        Err(Error::NoSlotAvailable { vehicle_type })
    }

    /// Return an occupied slot to every gate's index
    ///
    /// Releasing a slot that is already free is rejected.
    pub fn release(&self, slot_id: SlotId) -> Result<Slot> {
        let mut guard = self.index.lock();
        let index = guard.as_mut().ok_or(Error::IndexNotReady)?;

        let mut slot = self
            .directory
            .get_by_id(slot_id)?
            .ok_or_else(|| Error::NotFound(format!("{}", slot_id)))?;
        if slot.is_free() {
            warn!(slot = %slot.slot_number, "Rejected release of a free slot");
            return Err(Error::InvalidTransition(format!(
                "Slot {} is already free",
                slot.slot_number
            )));
        }

        // Resolve every distance before touching the directory.
        let per_gate = self.distances.distances_for(&slot.slot_number)?;

        slot.free();
        let slot = self.directory.save(slot)?;
        for (gate, distance) in per_gate {
            index.insert(gate, slot.vehicle_type, SlotDistance::new(slot.id, distance));
        }

        metrics::record_release(slot.vehicle_type);
        metrics::set_free_slots(slot.vehicle_type, index.free_count(slot.vehicle_type));
        info!(slot = %slot.slot_number, vehicle_type = %slot.vehicle_type, "Released slot");
        Ok(slot)
    }

    /// Free slots per vehicle type, as currently indexed
    pub fn availability(&self) -> Result<BTreeMap<VehicleType, usize>> {
        let guard = self.index.lock();
        let index = guard.as_ref().ok_or(Error::IndexNotReady)?;
        Ok(VehicleType::ALL
            .into_iter()
            .map(|vt| (vt, index.free_count(vt)))
            .collect())
    }

    /// Run `f` against the current index
    pub fn with_index<R>(&self, f: impl FnOnce(&GateHeapIndex) -> R) -> Result<R> {
        let guard = self.index.lock();
        guard.as_ref().map(f).ok_or(Error::IndexNotReady)
    }

    /// Compare the index against the directory
    ///
    /// Every free slot must appear exactly once in each gate's heap for its
    /// type, with that gate's distance. Occupied slots must appear nowhere.
    pub fn check_consistency(&self) -> Result<Vec<Inconsistency>> {
        let guard = self.index.lock();
        let index = guard.as_ref().ok_or(Error::IndexNotReady)?;
        let slots = self.directory.get_all()?;

        let mut problems = Vec::new();
        let mut accounted = 0usize;
        for slot in &slots {
            for gate in Gate::ALL {
                let count = index.occurrences(gate, slot.vehicle_type, slot.id);
                accounted += count;
                if !slot.is_free() {
                    if count > 0 {
                        problems.push(Inconsistency::OccupiedListed { gate, slot: slot.id });
                    }
                    continue;
                }
                match count {
                    0 => problems.push(Inconsistency::FreeMissing { gate, slot: slot.id }),
                    1 => {
                        let want = self.distances.lookup_or_default(gate, &slot.slot_number);
                        let found = index
                            .entries(gate, slot.vehicle_type)
                            .into_iter()
                            .find(|e| e.slot_id == slot.id)
                            .map(|e| e.distance);
                        if found != Some(want) {
                            problems.push(Inconsistency::WrongDistance {
                                gate,
                                slot: slot.id,
                                expected: want,
                                found: found.unwrap_or_default(),
                            });
                        }
                    }
                    n => problems.push(Inconsistency::Duplicated {
                        gate,
                        slot: slot.id,
                        count: n,
                    }),
                }
            }
        }

        // Entries left over belong to slots the directory no longer has,
        // or has under another vehicle type.
        let indexed: usize = Gate::ALL
            .into_iter()
            .flat_map(|gate| VehicleType::ALL.into_iter().map(move |vt| (gate, vt)))
            .map(|(gate, vt)| index.len(gate, vt))
            .sum();
        if indexed > accounted {
            problems.push(Inconsistency::Unknown {
                entries: indexed - accounted,
            });
        }

        Ok(problems)
    }
}

fn checked_number(slot_number: &str) -> Result<String> {
    let number = slot_number.trim();
    if number.is_empty() {
        return Err(Error::InvalidArgument("Slot number is required".to_string()));
    }
    Ok(number.to_string())
}

fn publish_free_counts(index: &GateHeapIndex) {
    for vt in VehicleType::ALL {
        metrics::set_free_slots(vt, index.free_count(vt));
    }
}

/// A disagreement between the index and the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    OccupiedListed { gate: Gate, slot: SlotId },
    FreeMissing { gate: Gate, slot: SlotId },
    Duplicated { gate: Gate, slot: SlotId, count: usize },
    WrongDistance { gate: Gate, slot: SlotId, expected: u32, found: u32 },
    /// Entries for slots absent from the directory
    Unknown { entries: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceEntry;
    use crate::model::{NewSlot, SlotStatus};
    use crate::storage::InMemorySlotDirectory;

    /// Two car slots: A is near GATE_1, B is near GATE_2.
    fn scenario() -> (Arc<InMemorySlotDirectory>, SlotAllocator) {
        let directory = Arc::new(
            InMemorySlotDirectory::seeded(vec![
                NewSlot::new("A", 1, VehicleType::Car),
                NewSlot::new("B", 1, VehicleType::Car),
            ])
            .unwrap(),
        );
        let distances = Arc::new(DistanceTable::from_entries(vec![
            DistanceEntry::new(Gate::Gate1, "A", 5),
            DistanceEntry::new(Gate::Gate1, "B", 50),
            DistanceEntry::new(Gate::Gate2, "A", 50),
            DistanceEntry::new(Gate::Gate2, "B", 5),
            DistanceEntry::new(Gate::Gate3, "A", 30),
            DistanceEntry::new(Gate::Gate3, "B", 30),
        ]));
        let allocator = SlotAllocator::bootstrap(directory.clone(), distances).unwrap();
        (directory, allocator)
    }

    #[test]
    fn test_not_ready_before_rebuild() {
        let directory = Arc::new(InMemorySlotDirectory::new());
        let allocator = SlotAllocator::new(directory, Arc::new(DistanceTable::default()));

        assert!(!allocator.is_ready());
        assert!(matches!(
            allocator.allocate(Gate::Gate1, VehicleType::Car),
            Err(Error::IndexNotReady)
        ));
        assert!(matches!(
            allocator.release(SlotId::new(1)),
            Err(Error::IndexNotReady)
        ));

        allocator.rebuild(&[]).unwrap();
        assert!(allocator.is_ready());
        assert!(matches!(
            allocator.allocate(Gate::Gate1, VehicleType::Car),
            Err(Error::NoSlotAvailable { .. })
        ));
    }

    #[test]
    fn test_two_gate_scenario() -> Result<()> {
        let (directory, allocator) = scenario();

        let first = allocator.allocate(Gate::Gate1, VehicleType::Car)?;
        assert_eq!(first.slot_number, "A");
        assert_eq!(first.status, SlotStatus::Occupied);

        let second = allocator.allocate(Gate::Gate2, VehicleType::Car)?;
        assert_eq!(second.slot_number, "B");

        let err = allocator.allocate(Gate::Gate1, VehicleType::Car).unwrap_err();
        assert!(matches!(err, Error::NoSlotAvailable { vehicle_type: VehicleType::Car }));

        allocator.release(first.id)?;
        assert!(directory.get_by_id(first.id)?.unwrap().is_free());

        let again = allocator.allocate(Gate::Gate2, VehicleType::Car)?;
        assert_eq!(again.slot_number, "A");

        assert!(allocator.check_consistency()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_release_free_slot_rejected() -> Result<()> {
        let (_directory, allocator) = scenario();
        let err = allocator.release(SlotId::new(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));

        let err = allocator.release(SlotId::new(42)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        assert!(allocator.check_consistency()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_stale_candidate_is_skipped() -> Result<()> {
        let (directory, allocator) = scenario();

        // Occupy A behind the allocator's back.
        let mut a = directory.find_by_number("A")?.unwrap();
        a.status = SlotStatus::Occupied;
        directory.save(a)?;

        let slot = allocator.allocate(Gate::Gate1, VehicleType::Car)?;
        assert_eq!(slot.slot_number, "B");

        // The stale entry was dropped everywhere.
        assert!(allocator.check_consistency()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_vanished_candidate_is_skipped() -> Result<()> {
        let (directory, allocator) = scenario();
        let a = directory.find_by_number("A")?.unwrap();
        directory.delete(a.id)?;

        let slot = allocator.allocate(Gate::Gate1, VehicleType::Car)?;
        assert_eq!(slot.slot_number, "B");
        assert!(matches!(
            allocator.allocate(Gate::Gate3, VehicleType::Car),
            Err(Error::NoSlotAvailable { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_exhaustion_leaves_state_unchanged() -> Result<()> {
        let (_directory, allocator) = scenario();
        let before = allocator.with_index(|index| index.clone())?;

        assert!(matches!(
            allocator.allocate(Gate::Gate1, VehicleType::Truck),
            Err(Error::NoSlotAvailable { vehicle_type: VehicleType::Truck })
        ));

        allocator.with_index(|index| {
            for gate in Gate::ALL {
                for vt in VehicleType::ALL {
                    assert_eq!(index.len(gate, vt), before.len(gate, vt));
                }
            }
        })?;
        Ok(())
    }

    #[test]
    fn test_failed_rebuild_keeps_index() -> Result<()> {
        let (_directory, allocator) = scenario();
        let unknown = Slot::new(SlotId::new(9), "Z", 1, VehicleType::Car);

        let err = allocator.rebuild(&[unknown]).unwrap_err();
        assert!(matches!(err, Error::MissingDistance { .. }));
        assert_eq!(allocator.availability()?[&VehicleType::Car], 2);
        Ok(())
    }

    #[test]
    fn test_consistency_detects_drift() -> Result<()> {
        let (directory, allocator) = scenario();
        let mut a = directory.find_by_number("A")?.unwrap();
        a.status = SlotStatus::Occupied;
        directory.save(a.clone())?;

        let problems = allocator.check_consistency()?;
        assert_eq!(problems.len(), Gate::ALL.len());
        assert!(problems
            .iter()
            .all(|p| matches!(p, Inconsistency::OccupiedListed { slot, .. } if *slot == a.id)));

        allocator.refresh()?;
        assert!(allocator.check_consistency()?.is_empty());
        Ok(())
    }
}
