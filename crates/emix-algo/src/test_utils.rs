//! Small networks for tests and examples.
//!
//! [`NetworkFixture`] describes a two-carrier system: a grid with a coal
//! plant, a PV farm and a battery feeds a town whose local stack runs a CHP
//! unit and a flexible heat bus.

use crate::config::OptConfig;
use anyhow::{Context, Result};
use emix_core::{
    AggregatedConsumer, Bus, CapacityBounds, CapacityFactor, DemandProfile, Dsr, EmissionFee,
    Fuel, Generator, GeneratorType, Line, LocalBalancingStack, Network, NetworkConstants,
    Storage, StorageType, TransmissionFee,
};
use std::collections::{BTreeMap, BTreeSet};

pub const ELECTRICITY: &str = "electricity";
pub const HEAT: &str = "heat";
pub const CO2: &str = "CO2";

/// Copy-with description of the fixture network
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkFixture {
    pub n_hours: usize,
    pub n_years: usize,
    /// Yearly electricity use of the town
    pub electricity_usage: f64,
    /// Yearly heat use of the town
    pub heat_usage: f64,
    /// CO2 price charged to the grid coal plant; `None` leaves it unhooked
    pub emission_price: Option<f64>,
    pub dsr: bool,
    /// Adds a second coal plant bound to the first
    pub bound_coal_fleet: bool,
}

impl Default for NetworkFixture {
    fn default() -> Self {
        Self {
            n_hours: 48,
            n_years: 5,
            electricity_usage: 2400.0,
            heat_usage: 1440.0,
            emission_price: Some(20.0),
            dsr: true,
            bound_coal_fleet: false,
        }
    }
}

impl NetworkFixture {
    pub fn with_years(mut self, n_years: usize) -> Self {
        self.n_years = n_years;
        self
    }

    pub fn with_hours(mut self, n_hours: usize) -> Self {
        self.n_hours = n_hours;
        self
    }

    pub fn with_emission_price(mut self, price: Option<f64>) -> Self {
        self.emission_price = price;
        self
    }

    pub fn without_dsr(mut self) -> Self {
        self.dsr = false;
        self
    }

    pub fn with_bound_coal_fleet(mut self) -> Self {
        self.bound_coal_fleet = true;
        self
    }

    fn hourly(&self, value: f64) -> Vec<f64> {
        vec![value; self.n_hours]
    }

    fn yearly(&self, value: f64) -> Vec<f64> {
        vec![value; self.n_years]
    }

    fn sun(&self) -> Vec<f64> {
        (0..self.n_hours)
            .map(|h| if (6..18).contains(&(h % 24)) { 0.5 } else { 0.0 })
            .collect()
    }

    pub fn build(&self) -> Result<Network> {
        let ny = self.n_years;
        let mut network = Network::new(
            [ELECTRICITY, HEAT],
            [CO2],
            NetworkConstants {
                n_hours: self.n_hours,
                n_years: ny,
            },
        );

        network.add_fuel(Fuel {
            name: "coal".into(),
            emission: BTreeMap::from([(CO2.to_string(), 0.1)]),
            energy_per_unit: 10.0,
            cost: self.yearly(30.0),
        })?;
        network.add_capacity_factor(CapacityFactor {
            name: "sun".into(),
            profile: self.sun(),
        })?;
        network.add_emission_fee(EmissionFee {
            name: "co2_fee".into(),
            emission_type: CO2.into(),
            price: self.yearly(self.emission_price.unwrap_or(0.0)),
        })?;
        network.add_transmission_fee(TransmissionFee {
            name: "grid_fee".into(),
            fee: self.hourly(0.1),
        })?;

        network.add_generator_type(GeneratorType {
            name: "coal_pp".into(),
            life_time: 10,
            build_time: 0,
            capex: self.yearly(500.0),
            opex: self.yearly(10.0),
            energy_types: BTreeSet::from([ELECTRICITY.to_string()]),
            efficiency: BTreeMap::from([(ELECTRICITY.to_string(), self.hourly(0.4))]),
            emission_reduction: BTreeMap::new(),
            fuel: Some("coal".into()),
            capacity_factor: None,
            bounds: CapacityBounds::unbounded(ny),
            power_utilization: self.hourly(1.0),
            minimal_power_utilization: None,
            conversion_rate: BTreeMap::new(),
            generation_compensation: None,
        })?;
        network.add_generator_type(GeneratorType {
            name: "pv".into(),
            life_time: 20,
            build_time: 1,
            capex: self.yearly(800.0),
            opex: self.yearly(5.0),
            energy_types: BTreeSet::from([ELECTRICITY.to_string()]),
            efficiency: BTreeMap::from([(ELECTRICITY.to_string(), self.hourly(1.0))]),
            emission_reduction: BTreeMap::new(),
            fuel: None,
            capacity_factor: Some("sun".into()),
            bounds: CapacityBounds::unbounded(ny),
            power_utilization: self.hourly(1.0),
            minimal_power_utilization: None,
            conversion_rate: BTreeMap::new(),
            generation_compensation: None,
        })?;
        network.add_generator_type(GeneratorType {
            name: "chp".into(),
            life_time: 3,
            build_time: 0,
            capex: self.yearly(600.0),
            opex: self.yearly(8.0),
            energy_types: BTreeSet::from([ELECTRICITY.to_string(), HEAT.to_string()]),
            efficiency: BTreeMap::from([
                (ELECTRICITY.to_string(), self.hourly(0.3)),
                (HEAT.to_string(), self.hourly(0.5)),
            ]),
            emission_reduction: BTreeMap::new(),
            fuel: Some("coal".into()),
            capacity_factor: None,
            bounds: CapacityBounds::unbounded(ny),
            power_utilization: self.hourly(1.0),
            minimal_power_utilization: None,
            conversion_rate: BTreeMap::new(),
            generation_compensation: None,
        })?;
        network.add_storage_type(StorageType {
            name: "battery".into(),
            energy_type: ELECTRICITY.into(),
            life_time: 10,
            build_time: 0,
            capex: self.yearly(300.0),
            opex: self.yearly(2.0),
            load_efficiency: 0.95,
            generation_efficiency: 0.95,
            power_to_capacity: 0.5,
            energy_loss: 0.01,
            power_utilization: 1.0,
            bounds: CapacityBounds::unbounded(ny),
        })?;

        if self.dsr {
            network.add_dsr(Dsr {
                name: "flex".into(),
                compensation_factor: 0.1,
                balancing_period_len: 4,
                penalization: 1.0,
                relative_shift_limit: Some(0.2),
                abs_shift_limit: None,
            })?;
        }

        network.add_bus(Bus::new("grid_ee", ELECTRICITY))?;
        network.add_bus(Bus::new("local_ee", ELECTRICITY))?;
        let heat_bus = Bus::new("local_heat", HEAT);
        network.add_bus(if self.dsr { heat_bus.with_dsr("flex") } else { heat_bus })?;

        let mut coal = Generator::new("pp_coal_grid", "coal_pp", ["grid_ee"], 200.0, ny);
        if self.emission_price.is_some() {
            coal = coal.with_emission_fee("co2_fee");
        }
        if self.bound_coal_fleet {
            coal = coal.with_binding("coal_fleet");
        }
        network.add_generator(coal)?;
        if self.bound_coal_fleet {
            network.add_generator(
                Generator::new("pp_coal_grid_2", "coal_pp", ["grid_ee"], 100.0, ny)
                    .with_binding("coal_fleet"),
            )?;
        }
        network.add_generator(Generator::new("pv_grid", "pv", ["grid_ee"], 50.0, ny))?;
        network.add_generator(Generator::new(
            "chp_local",
            "chp",
            ["local_ee", "local_heat"],
            100.0,
            ny,
        ))?;
        network.add_storage(Storage::new("battery_grid", "battery", "grid_ee", 10.0, ny))?;

        network.add_line(Line {
            name: "grid_local".into(),
            energy_type: ELECTRICITY.into(),
            fr: "grid_ee".into(),
            to: "local_ee".into(),
            transmission_loss: 0.05,
            max_capacity: 1000.0,
            transmission_fee: Some("grid_fee".into()),
        })?;

        network.add_local_balancing_stack(LocalBalancingStack {
            name: "lbs_town".into(),
            buses_out: BTreeMap::from([
                (ELECTRICITY.to_string(), "local_ee".to_string()),
                (HEAT.to_string(), "local_heat".to_string()),
            ]),
            buses: BTreeMap::from([
                (ELECTRICITY.to_string(), BTreeSet::from(["local_ee".to_string()])),
                (HEAT.to_string(), BTreeSet::from(["local_heat".to_string()])),
            ]),
        })?;
        network.add_demand_profile(DemandProfile {
            name: "flat".into(),
            normalized_profile: BTreeMap::from([
                (ELECTRICITY.to_string(), self.hourly(1.0 / self.n_hours as f64)),
                (HEAT.to_string(), self.hourly(1.0 / self.n_hours as f64)),
            ]),
        })?;
        network.add_aggregated_consumer(AggregatedConsumer {
            name: "town".into(),
            demand_profile: "flat".into(),
            stack_base_fraction: BTreeMap::from([("lbs_town".to_string(), 1.0)]),
            yearly_energy_usage: BTreeMap::from([
                (ELECTRICITY.to_string(), self.yearly(self.electricity_usage)),
                (HEAT.to_string(), self.yearly(self.heat_usage)),
            ]),
            min_fraction: BTreeMap::new(),
            max_fraction: BTreeMap::new(),
            max_fraction_increase: BTreeMap::new(),
            max_fraction_decrease: BTreeMap::new(),
            n_consumers: self.yearly(1000.0),
        })?;

        Ok(network)
    }
}

/// The default fixture network
pub fn fixture_network() -> Result<Network> {
    NetworkFixture::default()
        .build()
        .context("building fixture network")
}

fn coal_fuel(n_years: usize) -> Fuel {
    Fuel {
        name: "coal".into(),
        emission: BTreeMap::from([(CO2.to_string(), 0.1)]),
        energy_per_unit: 10.0,
        cost: vec![30.0; n_years],
    }
}

/// Electricity-only coal plant at efficiency 0.5
fn coal_plant_type(n_hours: usize, n_years: usize) -> GeneratorType {
    GeneratorType {
        name: "coal_pp".into(),
        life_time: 10,
        build_time: 0,
        capex: vec![500.0; n_years],
        opex: vec![10.0; n_years],
        energy_types: BTreeSet::from([ELECTRICITY.to_string()]),
        efficiency: BTreeMap::from([(ELECTRICITY.to_string(), vec![0.5; n_hours])]),
        emission_reduction: BTreeMap::new(),
        fuel: Some("coal".into()),
        capacity_factor: None,
        bounds: CapacityBounds::unbounded(n_years),
        power_utilization: vec![1.0; n_hours],
        minimal_power_utilization: None,
        conversion_rate: BTreeMap::new(),
        generation_compensation: None,
    }
}

/// Stack made of a single outlet bus
fn outlet_stack(name: &str, energy_type: &str, bus: &str) -> LocalBalancingStack {
    LocalBalancingStack {
        name: name.into(),
        buses_out: BTreeMap::from([(energy_type.to_string(), bus.to_string())]),
        buses: BTreeMap::from([(energy_type.to_string(), BTreeSet::from([bus.to_string()]))]),
    }
}

/// Profile proportional to `hourly_demand`, plus the yearly usage it sums to
fn demand_profile(name: &str, energy_type: &str, hourly_demand: &[f64]) -> (DemandProfile, f64) {
    let total: f64 = hourly_demand.iter().sum();
    let profile = DemandProfile {
        name: name.into(),
        normalized_profile: BTreeMap::from([(
            energy_type.to_string(),
            hourly_demand.iter().map(|d| d / total).collect(),
        )]),
    };
    (profile, total)
}

fn consumer(
    name: &str,
    profile: &str,
    energy_type: &str,
    yearly_usage: f64,
    stacks: &[(&str, f64)],
    n_years: usize,
) -> AggregatedConsumer {
    AggregatedConsumer {
        name: name.into(),
        demand_profile: profile.into(),
        stack_base_fraction: stacks.iter().map(|(lbs, frac)| (lbs.to_string(), *frac)).collect(),
        yearly_energy_usage: BTreeMap::from([(energy_type.to_string(), vec![yearly_usage; n_years])]),
        min_fraction: BTreeMap::new(),
        max_fraction: BTreeMap::new(),
        max_fraction_increase: BTreeMap::new(),
        max_fraction_decrease: BTreeMap::new(),
        n_consumers: vec![1.0; n_years],
    }
}

/// One coal plant serving a flat electricity demand; its dispatch and
/// capacity are fully determined by the demand, whatever the fuel price.
pub fn forced_dispatch_network(n_hours: usize, n_years: usize, emission_price: f64) -> Result<Network> {
    let mut network = Network::new([ELECTRICITY], [CO2], NetworkConstants { n_hours, n_years });
    network.add_fuel(coal_fuel(n_years))?;
    network.add_emission_fee(EmissionFee {
        name: "co2_fee".into(),
        emission_type: CO2.into(),
        price: vec![emission_price; n_years],
    })?;
    network.add_generator_type(coal_plant_type(n_hours, n_years))?;
    network.add_bus(Bus::new("grid_ee", ELECTRICITY))?;
    network.add_generator(
        Generator::new("pp_coal", "coal_pp", ["grid_ee"], 100.0, n_years).with_emission_fee("co2_fee"),
    )?;
    network.add_local_balancing_stack(outlet_stack("lbs_grid", ELECTRICITY, "grid_ee"))?;
    let (profile, usage) = demand_profile("flat", ELECTRICITY, &vec![40.0; n_hours]);
    network.add_demand_profile(profile)?;
    network.add_aggregated_consumer(consumer("city", "flat", ELECTRICITY, usage, &[("lbs_grid", 1.0)], n_years))?;
    Ok(network)
}

/// A city split evenly between two stacks fed by the same coal plant.
///
/// `lbs_a` is reached through a free line, `lbs_b` through a line charging
/// a transmission fee, so every unit of demand moved to `lbs_a` saves money.
pub fn two_stack_network(n_hours: usize, n_years: usize) -> Result<Network> {
    let mut network = Network::new([ELECTRICITY], [CO2], NetworkConstants { n_hours, n_years });
    network.add_fuel(coal_fuel(n_years))?;
    network.add_generator_type(coal_plant_type(n_hours, n_years))?;
    network.add_transmission_fee(TransmissionFee {
        name: "b_fee".into(),
        fee: vec![1.0; n_hours],
    })?;
    for bus in ["grid_ee", "a_ee", "b_ee"] {
        network.add_bus(Bus::new(bus, ELECTRICITY))?;
    }
    network.add_generator(Generator::new("pp_coal", "coal_pp", ["grid_ee"], 100.0, n_years))?;
    for (line, to, fee) in [("grid_a", "a_ee", None), ("grid_b", "b_ee", Some("b_fee"))] {
        network.add_line(Line {
            name: line.into(),
            energy_type: ELECTRICITY.into(),
            fr: "grid_ee".into(),
            to: to.into(),
            transmission_loss: 0.0,
            max_capacity: 1000.0,
            transmission_fee: fee.map(String::from),
        })?;
    }
    network.add_local_balancing_stack(outlet_stack("lbs_a", ELECTRICITY, "a_ee"))?;
    network.add_local_balancing_stack(outlet_stack("lbs_b", ELECTRICITY, "b_ee"))?;
    let (profile, usage) = demand_profile("flat", ELECTRICITY, &vec![40.0; n_hours]);
    network.add_demand_profile(profile)?;
    network.add_aggregated_consumer(consumer(
        "city",
        "flat",
        ELECTRICITY,
        usage,
        &[("lbs_a", 0.5), ("lbs_b", 0.5)],
        n_years,
    ))?;
    Ok(network)
}

/// Demand of 10 per hour with a peak of 50 in the last hour of every four,
/// on a bus whose DSR program balances over four-hour periods. The coal
/// plant starts with no capacity, so every unit of peak costs investment.
pub fn peak_shaving_network(n_hours: usize, n_years: usize, dsr: Dsr) -> Result<Network> {
    let mut network = Network::new([ELECTRICITY], [CO2], NetworkConstants { n_hours, n_years });
    network.add_fuel(coal_fuel(n_years))?;
    network.add_generator_type(coal_plant_type(n_hours, n_years))?;
    let dsr_name = dsr.name.clone();
    network.add_dsr(dsr)?;
    network.add_bus(Bus::new("grid_ee", ELECTRICITY).with_dsr(dsr_name))?;
    network.add_generator(Generator::new("pp_coal", "coal_pp", ["grid_ee"], 0.0, n_years))?;
    network.add_local_balancing_stack(outlet_stack("lbs_grid", ELECTRICITY, "grid_ee"))?;
    let hourly: Vec<f64> = (0..n_hours).map(|h| if h % 4 == 3 { 50.0 } else { 10.0 }).collect();
    let (profile, usage) = demand_profile("peak", ELECTRICITY, &hourly);
    network.add_demand_profile(profile)?;
    network.add_aggregated_consumer(consumer("city", "peak", ELECTRICITY, usage, &[("lbs_grid", 1.0)], n_years))?;
    Ok(network)
}

/// A home heated by a heat pump that draws electricity from the grid at a
/// conversion rate of 2.5; heat demand is 40 per hour.
pub fn heat_pump_network(n_hours: usize, n_years: usize) -> Result<Network> {
    let mut network = Network::new([ELECTRICITY, HEAT], [CO2], NetworkConstants { n_hours, n_years });
    network.add_fuel(coal_fuel(n_years))?;
    network.add_generator_type(coal_plant_type(n_hours, n_years))?;
    network.add_generator_type(GeneratorType {
        name: "heat_pump".into(),
        life_time: 15,
        build_time: 0,
        capex: vec![100.0; n_years],
        opex: vec![1.0; n_years],
        energy_types: BTreeSet::from([HEAT.to_string()]),
        efficiency: BTreeMap::from([(HEAT.to_string(), vec![1.0; n_hours])]),
        emission_reduction: BTreeMap::new(),
        fuel: None,
        capacity_factor: None,
        bounds: CapacityBounds::unbounded(n_years),
        power_utilization: vec![1.0; n_hours],
        minimal_power_utilization: None,
        conversion_rate: BTreeMap::from([(ELECTRICITY.to_string(), vec![2.5; n_hours])]),
        generation_compensation: None,
    })?;
    network.add_bus(Bus::new("grid_ee", ELECTRICITY))?;
    network.add_bus(Bus::new("home_heat", HEAT))?;
    network.add_generator(Generator::new("pp_coal", "coal_pp", ["grid_ee"], 100.0, n_years))?;
    network.add_generator(Generator::new("hp", "heat_pump", ["home_heat", "grid_ee"], 50.0, n_years))?;
    network.add_local_balancing_stack(outlet_stack("lbs_home", HEAT, "home_heat"))?;
    let (profile, usage) = demand_profile("flat", HEAT, &vec![40.0; n_hours]);
    network.add_demand_profile(profile)?;
    network.add_aggregated_consumer(consumer("home", "flat", HEAT, usage, &[("lbs_home", 1.0)], n_years))?;
    Ok(network)
}

/// Every hour and year of `network`, Clarabel backend
pub fn full_config(network: &Network) -> OptConfig {
    OptConfig::builder(
        (0..network.constants.n_hours).collect(),
        (0..network.constants.n_years).collect(),
    )
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_is_valid() {
        let network = fixture_network().unwrap();
        let diagnostics = network.validate();
        assert!(!diagnostics.has_errors(), "{}", diagnostics.summary());
        assert_eq!(network.generators.len(), 3);
        assert!(network.buses["local_heat"].dsr_type.is_some());
    }

    #[test]
    fn test_fixture_variants() {
        let network = NetworkFixture::default()
            .with_years(3)
            .with_bound_coal_fleet()
            .without_dsr()
            .build()
            .unwrap();
        assert_eq!(network.constants.n_years, 3);
        assert_eq!(network.generators.len(), 4);
        assert!(network.dsr.is_empty());
        assert!(!network.validate().has_errors());
    }

    #[test]
    fn test_forced_dispatch_is_valid() {
        let network = forced_dispatch_network(8, 2, 5.0).unwrap();
        assert!(network.validate().issues.is_empty());
        assert_eq!(full_config(&network).hour_sample.len(), 8);
    }

    #[test]
    fn test_small_networks_are_valid() {
        let dsr = Dsr {
            name: "flex".into(),
            compensation_factor: 0.1,
            balancing_period_len: 4,
            penalization: 0.01,
            relative_shift_limit: Some(0.5),
            abs_shift_limit: None,
        };
        for network in [
            two_stack_network(8, 3).unwrap(),
            peak_shaving_network(8, 1, dsr).unwrap(),
            heat_pump_network(8, 2).unwrap(),
        ] {
            let diagnostics = network.validate();
            assert!(diagnostics.issues.is_empty(), "{diagnostics}");
        }
    }

    #[test]
    fn test_demand_profile_sums_to_one() {
        let (profile, usage) = demand_profile("peak", ELECTRICITY, &[10.0, 10.0, 10.0, 50.0]);
        assert_eq!(usage, 80.0);
        let shares = &profile.normalized_profile[ELECTRICITY];
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(shares[3] * usage, 50.0);
    }
}
