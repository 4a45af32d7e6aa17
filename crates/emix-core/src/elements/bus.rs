use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Single-carrier node of the network.
///
/// Unit and line membership sets are filled by [`crate::Network`] when the
/// attached elements are registered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    pub energy_type: String,
    #[serde(default)]
    pub generators: BTreeSet<String>,
    #[serde(default)]
    pub storages: BTreeSet<String>,
    #[serde(default)]
    pub lines_in: BTreeSet<String>,
    #[serde(default)]
    pub lines_out: BTreeSet<String>,
    /// Demand-side-response program applied to this bus
    #[serde(default)]
    pub dsr_type: Option<String>,
}

impl Bus {
    pub fn new(name: impl Into<String>, energy_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            energy_type: energy_type.into(),
            ..Self::default()
        }
    }

    pub fn with_dsr(mut self, dsr: impl Into<String>) -> Self {
        self.dsr_type = Some(dsr.into());
        self
    }
}

/// Demand-side-response program.
///
/// Load can be shifted within a balancing period; every shifted unit has to
/// be paid back with `1 + compensation_factor` units later in the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dsr {
    pub name: String,
    pub compensation_factor: f64,
    /// Number of consecutive sampled hours in one balancing period
    pub balancing_period_len: usize,
    /// Cost per unit of shifted energy
    pub penalization: f64,
    /// Upper bound on shifted energy relative to the bus demand
    #[serde(default)]
    pub relative_shift_limit: Option<f64>,
    /// Absolute upper bound on shifted energy per hour
    #[serde(default)]
    pub abs_shift_limit: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_init() {
        let bus = Bus::new("bus_1", "ELECTRICITY");
        assert_eq!(bus.name, "bus_1");
        assert!(bus.generators.is_empty());
        assert!(bus.storages.is_empty());
        assert!(bus.lines_in.is_empty());
        assert!(bus.lines_out.is_empty());
        assert!(bus.dsr_type.is_none());
    }

    #[test]
    fn test_bus_deserialize_defaults() {
        let bus: Bus =
            serde_json::from_str(r#"{"name": "b", "energy_type": "HEAT"}"#).unwrap();
        assert_eq!(bus, Bus::new("b", "HEAT"));
    }
}
