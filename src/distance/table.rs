//! Distance table implementation

use crate::error::{Error, Result};
use crate::model::{Gate, Slot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Distance reported for pairs absent from the table
pub const UNREACHABLE: u32 = u32::MAX;

/// One precomputed (gate, slot) distance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceEntry {
    pub gate_number: Gate,
    pub slot_number: String,
    pub distance: u32,
}

impl DistanceEntry {
    pub fn new(gate: Gate, slot_number: impl Into<String>, distance: u32) -> Self {
        Self {
            gate_number: gate,
            slot_number: slot_number.into(),
            distance,
        }
    }
}

/// Immutable (gate, slot number) → distance lookup
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    by_gate: HashMap<Gate, HashMap<String, u32>>,
}

impl DistanceTable {
    /// Build a table from a list of entries
    ///
    /// A repeated (gate, slot) pair keeps the last distance seen.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = DistanceEntry>,
    {
        let mut by_gate: HashMap<Gate, HashMap<String, u32>> = HashMap::new();
        for entry in entries {
            let previous = by_gate
                .entry(entry.gate_number)
                .or_default()
                .insert(entry.slot_number.clone(), entry.distance);
            if let Some(previous) = previous {
                if previous != entry.distance {
                    warn!(
                        gate = %entry.gate_number,
                        slot = %entry.slot_number,
                        previous,
                        distance = entry.distance,
                        "Duplicate distance entry, keeping the later one"
                    );
                }
            }
        }
        Self { by_gate }
    }

    /// Parse a JSON array of entries
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let entries: Vec<DistanceEntry> = serde_json::from_reader(reader)
            .map_err(|e| Error::Serialization(format!("Invalid distance table: {}", e)))?;
        Ok(Self::from_entries(entries))
    }

    /// Load a JSON distance file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Config(format!(
                "Failed to open distance table {}: {}",
                path.display(),
                e
            ))
        })?;
        let table = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            entries = table.len(),
            "Loaded distance table"
        );
        Ok(table)
    }

    /// Strict lookup
    pub fn lookup(&self, gate: Gate, slot_number: &str) -> Result<u32> {
        self.by_gate
            .get(&gate)
            .and_then(|slots| slots.get(slot_number))
            .copied()
            .ok_or_else(|| Error::MissingDistance {
                gate,
                slot_number: slot_number.to_string(),
            })
    }

    /// Lookup falling back to [`UNREACHABLE`]
    pub fn lookup_or_default(&self, gate: Gate, slot_number: &str) -> u32 {
        self.lookup(gate, slot_number).unwrap_or(UNREACHABLE)
    }

    /// Distances from every gate to `slot_number`, in [`Gate::ALL`] order
    pub fn distances_for(&self, slot_number: &str) -> Result<Vec<(Gate, u32)>> {
        Gate::ALL
            .into_iter()
            .map(|gate| Ok((gate, self.lookup(gate, slot_number)?)))
            .collect()
    }

    /// Check that every gate has a distance to every given slot
    ///
    /// Reports the first missing pair.
    pub fn validate(&self, slots: &[Slot]) -> Result<()> {
        for slot in slots {
            self.distances_for(&slot.slot_number)?;
        }
        Ok(())
    }

    /// Number of (gate, slot) pairs
    pub fn len(&self) -> usize {
        self.by_gate.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
