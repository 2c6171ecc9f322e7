// Parkgate - nearest-slot allocation for multi-gate parking facilities

#![warn(rust_2018_idioms)]

pub mod allocator;
pub mod config;
pub mod distance;
pub mod ledger;
pub mod metrics;
pub mod model;
pub mod pricing;
pub mod server;
pub mod storage;
pub mod workflow;

// Re-exports for convenience
pub use allocator::{GateHeapIndex, SlotAllocator, SlotDistance};
pub use distance::DistanceTable;
pub use model::{Gate, Slot, SlotId, SlotStatus, VehicleType};
pub use storage::{InMemorySlotDirectory, SlotDirectory};
pub use workflow::ParkingService;

/// Parkgate error types
pub mod error {
    use crate::model::{Gate, VehicleType};
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        /// Every slot of the requested type is occupied.
        #[error("Parking full for vehicle type: {vehicle_type}")]
        NoSlotAvailable { vehicle_type: VehicleType },

        #[error("Missing distance for {gate} -> {slot_number}")]
        MissingDistance { gate: Gate, slot_number: String },

        #[error("Invalid state transition: {0}")]
        InvalidTransition(String),

        /// No rebuild has completed yet.
        #[error("Slot index has not been built")]
        IndexNotReady,

        #[error("Not found: {0}")]
        NotFound(String),

        #[error("Already exists: {0}")]
        AlreadyExists(String),

        #[error("Conflict: {0}")]
        Conflict(String),

        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Insufficient payment. Required: {required}, offered: {offered}")]
        InsufficientPayment { required: u64, offered: u64 },

        #[error("Storage error: {0}")]
        Storage(String),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Serialization error: {0}")]
        Serialization(String),

        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),
    }

    impl Error {
        /// HTTP status a caller should surface for this error
        pub fn status_code(&self) -> u16 {
            match self {
                Error::NoSlotAvailable { .. } | Error::Conflict(_) | Error::AlreadyExists(_) => 409,
                Error::InvalidTransition(_)
                | Error::InvalidArgument(_)
                | Error::InsufficientPayment { .. } => 400,
                Error::NotFound(_) => 404,
                Error::IndexNotReady => 503,
                Error::MissingDistance { .. }
                | Error::Storage(_)
                | Error::Config(_)
                | Error::Serialization(_)
                | Error::Io(_) => 500,
            }
        }

        /// Capacity exhaustion is an expected outcome, not a fault.
        pub fn is_capacity_exhausted(&self) -> bool {
            matches!(self, Error::NoSlotAvailable { .. })
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::error::Error;
    use super::*;

    #[test]
    fn test_version_format() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_status_codes() {
        let full = Error::NoSlotAvailable {
            vehicle_type: VehicleType::Car,
        };
        assert_eq!(full.status_code(), 409);
        assert!(full.is_capacity_exhausted());

        let missing = Error::MissingDistance {
            gate: Gate::Gate1,
            slot_number: "F1-01".to_string(),
        };
        assert_eq!(missing.status_code(), 500);
        assert!(!missing.is_capacity_exhausted());

        assert_eq!(Error::InvalidTransition("x".into()).status_code(), 400);
        assert_eq!(Error::NotFound("x".into()).status_code(), 404);
        assert_eq!(Error::IndexNotReady.status_code(), 503);
    }

    #[test]
    fn test_error_messages() {
        let err = Error::MissingDistance {
            gate: Gate::Gate2,
            slot_number: "F2-07".to_string(),
        };
        assert_eq!(err.to_string(), "Missing distance for GATE_2 -> F2-07");

        let err = Error::NoSlotAvailable {
            vehicle_type: VehicleType::Truck,
        };
        assert_eq!(err.to_string(), "Parking full for vehicle type: TRUCK");
    }
}
