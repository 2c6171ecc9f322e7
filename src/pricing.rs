//! Fare policies
//!
//! The workflow asks a [`FarePolicy`] for the amount owed on exit. The
//! allocator has no knowledge of pricing.

use crate::error::{Error, Result};
use crate::model::VehicleType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Computes the fare for a stay
pub trait FarePolicy: Send + Sync {
    /// Amount owed, in whole currency units, for `minutes` parked
    fn fare(&self, vehicle_type: VehicleType, minutes: i64) -> Result<u64>;
}

/// Pricing for one vehicle type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    pub vehicle_type: VehicleType,
    /// Stays up to this long are free
    pub free_minutes: u32,
    /// Charged per started hour beyond the free minutes
    pub rate_per_hour: u64,
}

impl PricingRule {
    pub fn new(vehicle_type: VehicleType, free_minutes: u32, rate_per_hour: u64) -> Self {
        Self {
            vehicle_type,
            free_minutes,
            rate_per_hour,
        }
    }
}

/// Default rules: one free minute, then 10 / 20 / 30 per hour
pub fn default_rules() -> Vec<PricingRule> {
    vec![
        PricingRule::new(VehicleType::Bike, 1, 10),
        PricingRule::new(VehicleType::Car, 1, 20),
        PricingRule::new(VehicleType::Truck, 1, 30),
    ]
}

/// Free period followed by a rate per started hour
#[derive(Debug, Clone)]
pub struct HourlyRatePolicy {
    rules: HashMap<VehicleType, PricingRule>,
}

impl Default for HourlyRatePolicy {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl HourlyRatePolicy {
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = PricingRule>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (rule.vehicle_type, rule))
                .collect(),
        }
    }

    pub fn rule(&self, vehicle_type: VehicleType) -> Option<&PricingRule> {
        self.rules.get(&vehicle_type)
    }
}

impl FarePolicy for HourlyRatePolicy {
    fn fare(&self, vehicle_type: VehicleType, minutes: i64) -> Result<u64> {
        let rule = self.rule(vehicle_type).ok_or_else(|| {
            Error::InvalidArgument(format!("No pricing rule for type: {}", vehicle_type))
        })?;

        let minutes = minutes.max(0) as u64;
        let free = u64::from(rule.free_minutes);
        if minutes <= free {
            return Ok(0);
        }

        let hours = (minutes - free).div_ceil(60);
        Ok(hours * rule.rate_per_hour)
    }
}
