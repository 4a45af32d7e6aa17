use super::{unbounded, HourlySeries, YearlyBounds, YearlySeries};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Yearly capacity and capacity-increase bounds.
///
/// Shared by type templates (applied to the sum over all units of the type)
/// and by units (applied to the unit alone).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityBounds {
    #[serde(default)]
    pub min_capacity: YearlyBounds,
    #[serde(default)]
    pub max_capacity: YearlyBounds,
    #[serde(default)]
    pub min_capacity_increase: YearlyBounds,
    #[serde(default)]
    pub max_capacity_increase: YearlyBounds,
}

impl CapacityBounds {
    pub fn unbounded(n_years: usize) -> Self {
        Self {
            min_capacity: unbounded(n_years),
            max_capacity: unbounded(n_years),
            min_capacity_increase: unbounded(n_years),
            max_capacity_increase: unbounded(n_years),
        }
    }
}

/// Techno-economic template shared by generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorType {
    pub name: String,
    /// Years a built unit stays dispatchable
    pub life_time: usize,
    /// Years between committing capacity and its availability
    pub build_time: usize,
    pub capex: YearlySeries,
    pub opex: YearlySeries,
    /// Carriers the type produces
    pub energy_types: BTreeSet<String>,
    /// Conversion efficiency per produced carrier
    pub efficiency: BTreeMap<String, HourlySeries>,
    /// Fraction of fuel emission removed, per emission type
    #[serde(default)]
    pub emission_reduction: BTreeMap<String, YearlySeries>,
    #[serde(default)]
    pub fuel: Option<String>,
    /// Availability profile; its presence makes the type non-dispatchable
    #[serde(default)]
    pub capacity_factor: Option<String>,
    #[serde(flatten)]
    pub bounds: CapacityBounds,
    pub power_utilization: HourlySeries,
    #[serde(default)]
    pub minimal_power_utilization: Option<HourlySeries>,
    /// Input carrier -> output per unit of input drawn from the unit's bus of
    /// that carrier (heat pumps, electrolysers)
    #[serde(default)]
    pub conversion_rate: BTreeMap<String, HourlySeries>,
    /// Yearly payment per unit of delivered energy; negative values subsidize
    #[serde(default)]
    pub generation_compensation: Option<YearlySeries>,
}

impl GeneratorType {
    /// Whether generation follows a fixed availability profile
    pub fn is_non_dispatchable(&self) -> bool {
        self.capacity_factor.is_some()
    }
}

/// Techno-economic template shared by storages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageType {
    pub name: String,
    pub energy_type: String,
    pub life_time: usize,
    pub build_time: usize,
    pub capex: YearlySeries,
    pub opex: YearlySeries,
    pub load_efficiency: f64,
    pub generation_efficiency: f64,
    /// Maximum charge/discharge power per unit of storage capacity
    pub power_to_capacity: f64,
    /// Fraction of the state of charge lost every hour
    #[serde(default)]
    pub energy_loss: f64,
    #[serde(default = "default_power_utilization")]
    pub power_utilization: f64,
    #[serde(flatten)]
    pub bounds: CapacityBounds,
}

fn default_power_utilization() -> f64 {
    1.0
}

/// Generator unit instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub energy_source_type: String,
    /// Buses the unit delivers to, one per produced carrier
    pub buses: BTreeSet<String>,
    pub unit_base_cap: f64,
    #[serde(flatten)]
    pub bounds: CapacityBounds,
    #[serde(default)]
    pub emission_fees: BTreeSet<String>,
    /// Units sharing a binding name decommission along one path
    #[serde(default)]
    pub generator_binding: Option<String>,
    /// Installed power per consumer served, for units inside a stack
    #[serde(default)]
    pub min_device_nom_power: Option<f64>,
    #[serde(default)]
    pub max_device_nom_power: Option<f64>,
}

impl Generator {
    pub fn new(
        name: impl Into<String>,
        energy_source_type: impl Into<String>,
        buses: impl IntoIterator<Item = impl Into<String>>,
        unit_base_cap: f64,
        n_years: usize,
    ) -> Self {
        Self {
            name: name.into(),
            energy_source_type: energy_source_type.into(),
            buses: buses.into_iter().map(Into::into).collect(),
            unit_base_cap,
            bounds: CapacityBounds::unbounded(n_years),
            emission_fees: BTreeSet::new(),
            generator_binding: None,
            min_device_nom_power: None,
            max_device_nom_power: None,
        }
    }

    pub fn with_emission_fee(mut self, fee: impl Into<String>) -> Self {
        self.emission_fees.insert(fee.into());
        self
    }

    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.generator_binding = Some(binding.into());
        self
    }

    pub fn with_device_nom_power(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_device_nom_power = min;
        self.max_device_nom_power = max;
        self
    }
}

/// Storage unit instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub name: String,
    pub energy_source_type: String,
    pub bus: String,
    pub unit_base_cap: f64,
    #[serde(flatten)]
    pub bounds: CapacityBounds,
    #[serde(default)]
    pub min_device_nom_power: Option<f64>,
    #[serde(default)]
    pub max_device_nom_power: Option<f64>,
}

impl Storage {
    pub fn new(
        name: impl Into<String>,
        energy_source_type: impl Into<String>,
        bus: impl Into<String>,
        unit_base_cap: f64,
        n_years: usize,
    ) -> Self {
        Self {
            name: name.into(),
            energy_source_type: energy_source_type.into(),
            bus: bus.into(),
            unit_base_cap,
            bounds: CapacityBounds::unbounded(n_years),
            min_device_nom_power: None,
            max_device_nom_power: None,
        }
    }

    pub fn with_device_nom_power(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_device_nom_power = min;
        self.max_device_nom_power = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_builder() {
        let gen = Generator::new("pv_1", "pv", ["bus_ee"], 12.5, 4)
            .with_emission_fee("co2_fee")
            .with_binding("farm");

        assert_eq!(gen.buses.len(), 1);
        assert_eq!(gen.bounds.max_capacity, vec![None; 4]);
        assert!(gen.emission_fees.contains("co2_fee"));
        assert_eq!(gen.generator_binding.as_deref(), Some("farm"));
        assert!(gen.min_device_nom_power.is_none());
    }

    #[test]
    fn test_generator_type_optional_series() {
        let json = r#"{
            "name": "heat_pump", "life_time": 15, "build_time": 0,
            "capex": [1.0], "opex": [0.1], "energy_types": ["heat"],
            "efficiency": {"heat": [1.0]}, "power_utilization": [1.0],
            "conversion_rate": {"ee": [3.2]}
        }"#;
        let t: GeneratorType = serde_json::from_str(json).unwrap();
        assert_eq!(t.conversion_rate["ee"], vec![3.2]);
        assert!(t.generation_compensation.is_none());
        assert!(t.fuel.is_none());
        assert!(!t.is_non_dispatchable());
    }

    #[test]
    fn test_storage_type_defaults() {
        let json = r#"{
            "name": "battery", "energy_type": "ee", "life_time": 10, "build_time": 0,
            "capex": [1.0], "opex": [0.1], "load_efficiency": 0.9,
            "generation_efficiency": 0.85, "power_to_capacity": 0.5
        }"#;
        let st: StorageType = serde_json::from_str(json).unwrap();
        assert_eq!(st.power_utilization, 1.0);
        assert_eq!(st.energy_loss, 0.0);
        assert!(st.bounds.min_capacity.is_empty());
    }
}
