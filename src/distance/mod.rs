//! Gate-to-slot distance lookup
//!
//! Distances are precomputed offline and loaded once at startup from a
//! JSON list of `{gateNumber, slotNumber, distance}` records. The table is
//! immutable afterwards.
//!
//! Two lookup forms exist:
//! - [`DistanceTable::lookup`] fails with `MissingDistance`; index
//!   construction always uses it.
//! - [`DistanceTable::lookup_or_default`] falls back to [`UNREACHABLE`],
//!   which sorts after every real distance.

pub mod table;

pub use table::{DistanceEntry, DistanceTable, UNREACHABLE};
