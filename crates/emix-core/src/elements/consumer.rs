use super::{HourlySeries, YearlyBounds, YearlySeries};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Normalized hourly demand shape per carrier; each series sums to one
/// over the full year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandProfile {
    pub name: String,
    pub normalized_profile: BTreeMap<String, HourlySeries>,
}

/// Bundle of buses, one outlet per carrier, serving a share of an
/// aggregated consumer's demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalBalancingStack {
    pub name: String,
    /// Carrier -> bus where the served demand is withdrawn
    pub buses_out: BTreeMap<String, String>,
    /// Carrier -> every bus belonging to the stack
    pub buses: BTreeMap<String, BTreeSet<String>>,
}

impl LocalBalancingStack {
    /// Every bus name of the stack, outlets included
    pub fn all_buses(&self) -> BTreeSet<&str> {
        self.buses
            .values()
            .flatten()
            .chain(self.buses_out.values())
            .map(String::as_str)
            .collect()
    }
}

/// Demand-side entity served by a mix of local balancing stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedConsumer {
    pub name: String,
    pub demand_profile: String,
    /// Stack name -> share of demand served in the first year
    pub stack_base_fraction: BTreeMap<String, f64>,
    /// Carrier -> yearly energy usage
    pub yearly_energy_usage: BTreeMap<String, YearlySeries>,
    #[serde(default)]
    pub min_fraction: BTreeMap<String, YearlyBounds>,
    #[serde(default)]
    pub max_fraction: BTreeMap<String, YearlyBounds>,
    #[serde(default)]
    pub max_fraction_increase: BTreeMap<String, YearlyBounds>,
    #[serde(default)]
    pub max_fraction_decrease: BTreeMap<String, YearlyBounds>,
    pub n_consumers: YearlySeries,
}

impl AggregatedConsumer {
    pub fn stacks(&self) -> impl Iterator<Item = &str> {
        self.stack_base_fraction.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_buses_includes_outlets() {
        let lbs = LocalBalancingStack {
            name: "lbs".into(),
            buses_out: BTreeMap::from([("ee".to_string(), "local_ee".to_string())]),
            buses: BTreeMap::from([(
                "heat".to_string(),
                BTreeSet::from(["local_heat".to_string()]),
            )]),
        };
        let buses = lbs.all_buses();
        assert!(buses.contains("local_ee"));
        assert!(buses.contains("local_heat"));
        assert_eq!(buses.len(), 2);
    }
}
