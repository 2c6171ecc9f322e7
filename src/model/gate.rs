//! Gates and vehicle categories

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A physical entry point of the facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gate {
    #[serde(rename = "GATE_1")]
    Gate1,
    #[serde(rename = "GATE_2")]
    Gate2,
    #[serde(rename = "GATE_3")]
    Gate3,
}

impl Gate {
    /// Every gate, in declaration order
    pub const ALL: [Gate; 3] = [Gate::Gate1, Gate::Gate2, Gate::Gate3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::Gate1 => "GATE_1",
            Gate::Gate2 => "GATE_2",
            Gate::Gate3 => "GATE_3",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gate {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gate::ALL
            .into_iter()
            .find(|gate| gate.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::error::Error::InvalidArgument(format!("Unknown gate: {}", s)))
    }
}

/// Vehicle category; partitions both pricing and the slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Bike,
    Car,
    Truck,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] = [VehicleType::Bike, VehicleType::Car, VehicleType::Truck];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Bike => "BIKE",
            VehicleType::Car => "CAR",
            VehicleType::Truck => "TRUCK",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .into_iter()
            .find(|vt| vt.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                crate::error::Error::InvalidArgument(format!("Unknown vehicle type: {}", s))
            })
    }
}
