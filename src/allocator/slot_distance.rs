//! Index entry ordering

use crate::model::SlotId;
use serde::Serialize;
use std::cmp::Ordering;

/// A slot paired with its distance from one gate
///
/// Ordering and equality look at the distance only. Slots at the same
/// distance compare equal, so the heap hands them out in whatever order
/// it happens to hold them.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SlotDistance {
    pub slot_id: SlotId,
    pub distance: u32,
}

impl SlotDistance {
    pub fn new(slot_id: SlotId, distance: u32) -> Self {
        Self { slot_id, distance }
    }
}

impl PartialEq for SlotDistance {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for SlotDistance {}

impl PartialOrd for SlotDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SlotDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.cmp(&other.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    #[test]
    fn test_orders_by_distance() {
        let near = SlotDistance::new(SlotId::new(1), 5);
        let far = SlotDistance::new(SlotId::new(2), 50);
        assert!(near < far);
        assert_eq!(near.cmp(&far), Ordering::Less);
    }

    #[test]
    fn test_ties_compare_equal() {
        let a = SlotDistance::new(SlotId::new(1), 7);
        let b = SlotDistance::new(SlotId::new(2), 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_min_heap_pops_nearest() {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(SlotDistance::new(SlotId::new(1), 30)));
        heap.push(Reverse(SlotDistance::new(SlotId::new(2), 10)));
        heap.push(Reverse(SlotDistance::new(SlotId::new(3), 20)));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop())
            .map(|Reverse(entry)| entry.slot_id.get())
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
