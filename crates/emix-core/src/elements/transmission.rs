use super::HourlySeries;
use serde::{Deserialize, Serialize};

/// Directed single-carrier connection between two buses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub name: String,
    pub energy_type: String,
    /// Sending bus
    pub fr: String,
    /// Receiving bus
    pub to: String,
    /// Fraction of the flow lost in transit
    pub transmission_loss: f64,
    pub max_capacity: f64,
    #[serde(default)]
    pub transmission_fee: Option<String>,
}

/// Hourly fee charged per unit of energy sent through a line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionFee {
    pub name: String,
    pub fee: HourlySeries,
}
