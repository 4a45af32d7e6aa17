use super::{HourlySeries, YearlySeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fuel burnt by generator types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fuel {
    pub name: String,
    /// Emission type -> emission per unit of fuel
    pub emission: BTreeMap<String, f64>,
    /// Energy contained in one unit of fuel
    pub energy_per_unit: f64,
    /// Price per unit of fuel
    pub cost: YearlySeries,
}

/// Hourly availability profile of a non-dispatchable type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityFactor {
    pub name: String,
    pub profile: HourlySeries,
}

/// Price charged per unit of a given emission type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFee {
    pub name: String,
    pub emission_type: String,
    pub price: YearlySeries,
}
