//! Network container and reference validation.

use crate::diagnostics::Diagnostics;
use crate::elements::*;
use crate::error::{EmixError, EmixResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Time horizon of the full (unsampled) model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConstants {
    pub n_hours: usize,
    pub n_years: usize,
}

impl Default for NetworkConstants {
    fn default() -> Self {
        Self {
            n_hours: 8760,
            n_years: 20,
        }
    }
}

/// Multi-carrier energy network.
///
/// Every collection is keyed by element name and keeps insertion order, which
/// is the order the indexing layer assigns ordinals in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    pub energy_types: Vec<String>,
    pub emission_types: Vec<String>,
    pub constants: NetworkConstants,
    pub buses: IndexMap<String, Bus>,
    pub generators: IndexMap<String, Generator>,
    pub storages: IndexMap<String, Storage>,
    pub generator_types: IndexMap<String, GeneratorType>,
    pub storage_types: IndexMap<String, StorageType>,
    pub lines: IndexMap<String, Line>,
    pub transmission_fees: IndexMap<String, TransmissionFee>,
    pub fuels: IndexMap<String, Fuel>,
    pub capacity_factors: IndexMap<String, CapacityFactor>,
    pub demand_profiles: IndexMap<String, DemandProfile>,
    pub aggregated_consumers: IndexMap<String, AggregatedConsumer>,
    pub local_balancing_stacks: IndexMap<String, LocalBalancingStack>,
    pub emission_fees: IndexMap<String, EmissionFee>,
    pub dsr: IndexMap<String, Dsr>,
}

fn insert_unique<T>(map: &mut IndexMap<String, T>, kind: &str, name: &str, item: T) -> EmixResult<()> {
    if map.contains_key(name) {
        return Err(EmixError::Validation(format!(
            "{kind} {name} already exists in the network"
        )));
    }
    map.insert(name.to_string(), item);
    Ok(())
}

impl Network {
    pub fn new(
        energy_types: impl IntoIterator<Item = impl Into<String>>,
        emission_types: impl IntoIterator<Item = impl Into<String>>,
        constants: NetworkConstants,
    ) -> Self {
        Self {
            energy_types: energy_types.into_iter().map(Into::into).collect(),
            emission_types: emission_types.into_iter().map(Into::into).collect(),
            constants,
            ..Self::default()
        }
    }

    pub fn add_bus(&mut self, bus: Bus) -> EmixResult<()> {
        let name = bus.name.clone();
        insert_unique(&mut self.buses, "Bus", &name, bus)
    }

    /// Add a generator and register it on each of its buses
    pub fn add_generator(&mut self, generator: Generator) -> EmixResult<()> {
        if self.generators.contains_key(&generator.name) {
            return Err(EmixError::Validation(format!(
                "Generator {} already exists in the network",
                generator.name
            )));
        }
        for bus in &generator.buses {
            if !self.buses.contains_key(bus) {
                return Err(EmixError::Validation(format!(
                    "Cannot add generator {}: bus {} not found",
                    generator.name, bus
                )));
            }
        }
        for bus in &generator.buses {
            if let Some(b) = self.buses.get_mut(bus) {
                b.generators.insert(generator.name.clone());
            }
        }
        self.generators.insert(generator.name.clone(), generator);
        Ok(())
    }

    /// Add a storage and register it on its bus
    pub fn add_storage(&mut self, storage: Storage) -> EmixResult<()> {
        if self.storages.contains_key(&storage.name) {
            return Err(EmixError::Validation(format!(
                "Storage {} already exists in the network",
                storage.name
            )));
        }
        let bus = self.buses.get_mut(&storage.bus).ok_or_else(|| {
            EmixError::Validation(format!(
                "Cannot add storage {}: bus {} not found",
                storage.name, storage.bus
            ))
        })?;
        bus.storages.insert(storage.name.clone());
        self.storages.insert(storage.name.clone(), storage);
        Ok(())
    }

    /// Add a line and register it as outgoing on `fr` and incoming on `to`
    pub fn add_line(&mut self, line: Line) -> EmixResult<()> {
        if self.lines.contains_key(&line.name) {
            return Err(EmixError::Validation(format!(
                "Line {} already exists in the network",
                line.name
            )));
        }
        for end in [&line.fr, &line.to] {
            if !self.buses.contains_key(end) {
                return Err(EmixError::Validation(format!(
                    "Cannot add line {}: bus {} not found",
                    line.name, end
                )));
            }
        }
        if let Some(fr) = self.buses.get_mut(&line.fr) {
            fr.lines_out.insert(line.name.clone());
        }
        if let Some(to) = self.buses.get_mut(&line.to) {
            to.lines_in.insert(line.name.clone());
        }
        self.lines.insert(line.name.clone(), line);
        Ok(())
    }

    pub fn add_generator_type(&mut self, t: GeneratorType) -> EmixResult<()> {
        let name = t.name.clone();
        insert_unique(&mut self.generator_types, "Generator type", &name, t)
    }

    pub fn add_storage_type(&mut self, t: StorageType) -> EmixResult<()> {
        let name = t.name.clone();
        insert_unique(&mut self.storage_types, "Storage type", &name, t)
    }

    pub fn add_transmission_fee(&mut self, fee: TransmissionFee) -> EmixResult<()> {
        let name = fee.name.clone();
        insert_unique(&mut self.transmission_fees, "Transmission fee", &name, fee)
    }

    pub fn add_fuel(&mut self, fuel: Fuel) -> EmixResult<()> {
        let name = fuel.name.clone();
        insert_unique(&mut self.fuels, "Fuel", &name, fuel)
    }

    pub fn add_capacity_factor(&mut self, cf: CapacityFactor) -> EmixResult<()> {
        let name = cf.name.clone();
        insert_unique(&mut self.capacity_factors, "Capacity factor", &name, cf)
    }

    pub fn add_demand_profile(&mut self, profile: DemandProfile) -> EmixResult<()> {
        let name = profile.name.clone();
        insert_unique(&mut self.demand_profiles, "Demand profile", &name, profile)
    }

    pub fn add_aggregated_consumer(&mut self, aggr: AggregatedConsumer) -> EmixResult<()> {
        let name = aggr.name.clone();
        insert_unique(&mut self.aggregated_consumers, "Aggregated consumer", &name, aggr)
    }

    pub fn add_local_balancing_stack(&mut self, lbs: LocalBalancingStack) -> EmixResult<()> {
        let name = lbs.name.clone();
        insert_unique(&mut self.local_balancing_stacks, "Local balancing stack", &name, lbs)
    }

    pub fn add_emission_fee(&mut self, fee: EmissionFee) -> EmixResult<()> {
        let name = fee.name.clone();
        insert_unique(&mut self.emission_fees, "Emission fee", &name, fee)
    }

    pub fn add_dsr(&mut self, dsr: Dsr) -> EmixResult<()> {
        let name = dsr.name.clone();
        insert_unique(&mut self.dsr, "DSR", &name, dsr)
    }

    /// Energy types formatted as a bracketed list of quoted names
    fn energy_types_display(&self) -> String {
        let quoted: Vec<String> = self.energy_types.iter().map(|e| format!("'{e}'")).collect();
        format!("[{}]", quoted.join(", "))
    }

    /// Buses of every stack that serves an aggregated consumer
    fn consumer_buses(&self) -> BTreeSet<&str> {
        self.aggregated_consumers
            .values()
            .flat_map(|a| a.stacks())
            .filter_map(|name| self.local_balancing_stacks.get(name))
            .flat_map(|lbs| lbs.all_buses())
            .collect()
    }

    /// Check cross references and declared carriers.
    ///
    /// Returns every finding. Errors block indexing; warnings flag inputs that
    /// have no effect on the model.
    pub fn validate(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let declared = |e: &str| self.energy_types.iter().any(|x| x == e);
        let local = self.consumer_buses();

        if self.energy_types.is_empty() {
            diag.add_error("network", "Network declares no energy types");
        }

        for bus in self.buses.values() {
            if !declared(&bus.energy_type) {
                diag.add_error_with_entity(
                    "bus",
                    &format!(
                        "Bus {} has energy type {} which is not compliant with the network energy types: {}",
                        bus.name,
                        bus.energy_type,
                        self.energy_types_display()
                    ),
                    &bus.name,
                );
            }
            if let Some(dsr) = &bus.dsr_type {
                if !self.dsr.contains_key(dsr) {
                    diag.add_error_with_entity(
                        "bus",
                        &format!("DSR type {} of bus {} not exists in Network DSR", dsr, bus.name),
                        &bus.name,
                    );
                }
            }
        }

        for t in self.generator_types.values() {
            for e in &t.energy_types {
                if !declared(e) {
                    diag.add_error_with_entity(
                        "generator_type",
                        &format!(
                            "Generator type {} produces energy type {} which is not compliant with the network energy types: {}",
                            t.name,
                            e,
                            self.energy_types_display()
                        ),
                        &t.name,
                    );
                }
            }
            if let Some(fuel) = &t.fuel {
                if !self.fuels.contains_key(fuel) {
                    diag.add_error_with_entity(
                        "generator_type",
                        &format!("Fuel {} of generator type {} not exists in Network fuels", fuel, t.name),
                        &t.name,
                    );
                }
            }
            for (e, rate) in &t.conversion_rate {
                if !declared(e) {
                    diag.add_error_with_entity(
                        "generator_type",
                        &format!(
                            "Generator type {} converts energy type {} which is not compliant with the network energy types: {}",
                            t.name,
                            e,
                            self.energy_types_display()
                        ),
                        &t.name,
                    );
                }
                if rate.iter().any(|r| !(r.is_finite() && *r > 0.0)) {
                    diag.add_error_with_entity(
                        "generator_type",
                        &format!("Conversion rate of generator type {} for {} must be positive", t.name, e),
                        &t.name,
                    );
                }
            }
            if !self.generators.values().any(|g| g.energy_source_type == t.name) {
                diag.add_warning(
                    "generator_type",
                    &format!("Generator type {} has no generators", t.name),
                );
            }
            if let Some(cf) = &t.capacity_factor {
                if !self.capacity_factors.contains_key(cf) {
                    diag.add_error_with_entity(
                        "generator_type",
                        &format!(
                            "Capacity factor {} of generator type {} not exists in Network capacity factors",
                            cf, t.name
                        ),
                        &t.name,
                    );
                }
            }
        }

        for t in self.storage_types.values() {
            if !self.storages.values().any(|st| st.energy_source_type == t.name) {
                diag.add_warning(
                    "storage_type",
                    &format!("Storage type {} has no storages", t.name),
                );
            }
            if !declared(&t.energy_type) {
                diag.add_error_with_entity(
                    "storage_type",
                    &format!(
                        "Storage type {} has energy type {} which is not compliant with the network energy types: {}",
                        t.name,
                        t.energy_type,
                        self.energy_types_display()
                    ),
                    &t.name,
                );
            }
        }

        for g in self.generators.values() {
            if !self.generator_types.contains_key(&g.energy_source_type) {
                diag.add_error_with_entity(
                    "generator",
                    &format!(
                        "Generator type {} of generator {} not exists in Network generator types",
                        g.energy_source_type, g.name
                    ),
                    &g.name,
                );
            }
            let mut carriers = BTreeSet::new();
            for bus in &g.buses {
                match self.buses.get(bus) {
                    None => diag.add_error_with_entity(
                        "generator",
                        &format!("Bus {} of generator {} not exists in Network buses", bus, g.name),
                        &g.name,
                    ),
                    Some(b) if !carriers.insert(b.energy_type.as_str()) => diag.add_error_with_entity(
                        "generator",
                        &format!(
                            "Generator {} is connected to more than one bus of energy type {}",
                            g.name, b.energy_type
                        ),
                        &g.name,
                    ),
                    Some(_) => {}
                }
            }
            if let Some(t) = self.generator_types.get(&g.energy_source_type) {
                for e in t.conversion_rate.keys() {
                    if !carriers.contains(e.as_str()) {
                        diag.add_error_with_entity(
                            "generator",
                            &format!(
                                "Generator {} converts energy type {} but is connected to no bus of that type",
                                g.name, e
                            ),
                            &g.name,
                        );
                    }
                }
            }
            let has_device_power = g.min_device_nom_power.is_some() || g.max_device_nom_power.is_some();
            if has_device_power && !g.buses.iter().any(|b| local.contains(b.as_str())) {
                diag.add_warning(
                    "generator",
                    &format!(
                        "Device nominal power of generator {} is ignored: it serves no aggregated consumer",
                        g.name
                    ),
                );
            }
            for fee in &g.emission_fees {
                if !self.emission_fees.contains_key(fee) {
                    diag.add_error_with_entity(
                        "generator",
                        &format!(
                            "Emission fee {} of generator {} not exists in Network emission fees",
                            fee, g.name
                        ),
                        &g.name,
                    );
                }
            }
        }

        for s in self.storages.values() {
            if !self.storage_types.contains_key(&s.energy_source_type) {
                diag.add_error_with_entity(
                    "storage",
                    &format!(
                        "Storage type {} of storage {} not exists in Network storage types",
                        s.energy_source_type, s.name
                    ),
                    &s.name,
                );
            }
            match self.buses.get(&s.bus) {
                None => diag.add_error_with_entity(
                    "storage",
                    &format!("Bus {} of storage {} not exists in Network buses", s.bus, s.name),
                    &s.name,
                ),
                Some(bus) => {
                    if let Some(t) = self.storage_types.get(&s.energy_source_type) {
                        if t.energy_type != bus.energy_type {
                            diag.add_error_with_entity(
                                "storage",
                                &format!(
                                    "Storage {} of energy type {} is connected to bus {} of energy type {}",
                                    s.name, t.energy_type, bus.name, bus.energy_type
                                ),
                                &s.name,
                            );
                        }
                    }
                }
            }
            let has_device_power = s.min_device_nom_power.is_some() || s.max_device_nom_power.is_some();
            if has_device_power && !local.contains(s.bus.as_str()) {
                diag.add_warning(
                    "storage",
                    &format!(
                        "Device nominal power of storage {} is ignored: it serves no aggregated consumer",
                        s.name
                    ),
                );
            }
        }

        for line in self.lines.values() {
            for end in [&line.fr, &line.to] {
                if !self.buses.contains_key(end) {
                    diag.add_error_with_entity(
                        "line",
                        &format!("Bus {} of line {} not exists in Network buses", end, line.name),
                        &line.name,
                    );
                }
            }
            if let Some(fee) = &line.transmission_fee {
                if !self.transmission_fees.contains_key(fee) {
                    diag.add_error_with_entity(
                        "line",
                        &format!(
                            "Transmission fee {} of line {} not exists in Network transmission fees",
                            fee, line.name
                        ),
                        &line.name,
                    );
                }
            }
        }

        for fee in self.emission_fees.values() {
            if !self.emission_types.contains(&fee.emission_type) {
                diag.add_error_with_entity(
                    "emission_fee",
                    &format!(
                        "Emission type {} of emission fee {} not exists in Network emission types",
                        fee.emission_type, fee.name
                    ),
                    &fee.name,
                );
            }
        }

        for aggr in self.aggregated_consumers.values() {
            if !self.demand_profiles.contains_key(&aggr.demand_profile) {
                diag.add_error_with_entity(
                    "aggregated_consumer",
                    &format!(
                        "Demand profile {} of aggregated consumer {} not exists in Network demand profiles",
                        aggr.demand_profile, aggr.name
                    ),
                    &aggr.name,
                );
            }
            for lbs in aggr.stacks() {
                if !self.local_balancing_stacks.contains_key(lbs) {
                    diag.add_error_with_entity(
                        "aggregated_consumer",
                        &format!(
                            "Local balancing stack {} of aggregated consumer {} not exists in Network local balancing stacks",
                            lbs, aggr.name
                        ),
                        &aggr.name,
                    );
                }
            }
        }

        for dsr in self.dsr.values() {
            if !self.buses.values().any(|b| b.dsr_type.as_deref() == Some(dsr.name.as_str())) {
                diag.add_warning("dsr", &format!("DSR {} is not used by any bus", dsr.name));
            }
        }

        for lbs in self.local_balancing_stacks.values() {
            for bus in lbs.all_buses() {
                if !self.buses.contains_key(bus) {
                    diag.add_error_with_entity(
                        "local_balancing_stack",
                        &format!(
                            "Bus {} of local balancing stack {} not exists in Network buses",
                            bus, lbs.name
                        ),
                        &lbs.name,
                    );
                }
            }
        }

        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> Network {
        let mut network = Network::new(
            ["ELECTRICITY", "HEATING"],
            ["CO2"],
            NetworkConstants {
                n_hours: 24,
                n_years: 2,
            },
        );
        network.add_bus(Bus::new("bus_1", "ELECTRICITY")).unwrap();
        network.add_bus(Bus::new("bus_2", "ELECTRICITY")).unwrap();
        network
    }

    #[test]
    fn test_bus_energy_type_not_declared() {
        let mut network = network();
        network.add_bus(Bus::new("bus_3", "TRANSPORT")).unwrap();

        let diag = network.validate();
        assert_eq!(diag.error_count(), 1);
        assert_eq!(
            diag.messages(),
            vec!["Bus bus_3 has energy type TRANSPORT which is not compliant with the network energy types: ['ELECTRICITY', 'HEATING']"]
        );
    }

    #[test]
    fn test_bus_unknown_dsr() {
        let mut network = network();
        network
            .add_bus(Bus::new("bus_3", "HEATING").with_dsr("not_existing_dsr"))
            .unwrap();

        let diag = network.validate();
        assert_eq!(
            diag.messages(),
            vec!["DSR type not_existing_dsr of bus bus_3 not exists in Network DSR"]
        );
    }

    #[test]
    fn test_add_line_registers_ends() {
        let mut network = network();
        network
            .add_line(Line {
                name: "l12".into(),
                energy_type: "ELECTRICITY".into(),
                fr: "bus_1".into(),
                to: "bus_2".into(),
                transmission_loss: 0.0,
                max_capacity: 10.0,
                transmission_fee: None,
            })
            .unwrap();

        assert!(network.buses["bus_1"].lines_out.contains("l12"));
        assert!(network.buses["bus_2"].lines_in.contains("l12"));
        assert!(network.validate().issues.is_empty());
    }

    #[test]
    fn test_add_storage_unknown_bus_fails() {
        let mut network = network();
        let result = network.add_storage(Storage::new("st", "battery", "missing", 1.0, 2));
        assert!(matches!(result, Err(EmixError::Validation(_))));
        assert!(network.storages.is_empty());
    }

    #[test]
    fn test_duplicate_bus_rejected() {
        let mut network = network();
        assert!(network.add_bus(Bus::new("bus_1", "HEATING")).is_err());
    }

    fn generator_type(name: &str, energy_type: &str) -> GeneratorType {
        GeneratorType {
            name: name.into(),
            life_time: 10,
            build_time: 0,
            capex: vec![1.0; 2],
            opex: vec![0.1; 2],
            energy_types: BTreeSet::from([energy_type.to_string()]),
            efficiency: [(energy_type.to_string(), vec![1.0; 24])].into(),
            emission_reduction: Default::default(),
            fuel: None,
            capacity_factor: None,
            bounds: CapacityBounds::unbounded(2),
            power_utilization: vec![1.0; 24],
            minimal_power_utilization: None,
            conversion_rate: Default::default(),
            generation_compensation: None,
        }
    }

    #[test]
    fn test_generator_two_buses_same_carrier() {
        let mut network = network();
        network.add_generator_type(generator_type("pp", "ELECTRICITY")).unwrap();
        network
            .add_generator(Generator::new("g", "pp", ["bus_1", "bus_2"], 1.0, 2))
            .unwrap();

        let diag = network.validate();
        assert_eq!(
            diag.messages(),
            vec!["Generator g is connected to more than one bus of energy type ELECTRICITY"]
        );
    }

    #[test]
    fn test_storage_carrier_mismatch() {
        let mut network = network();
        network
            .add_storage_type(StorageType {
                name: "heat_tank".into(),
                energy_type: "HEATING".into(),
                life_time: 10,
                build_time: 0,
                capex: vec![1.0; 2],
                opex: vec![0.1; 2],
                load_efficiency: 0.9,
                generation_efficiency: 0.9,
                power_to_capacity: 1.0,
                energy_loss: 0.0,
                power_utilization: 1.0,
                bounds: CapacityBounds::unbounded(2),
            })
            .unwrap();
        network
            .add_storage(Storage::new("tank", "heat_tank", "bus_1", 5.0, 2))
            .unwrap();

        let diag = network.validate();
        assert_eq!(
            diag.messages(),
            vec!["Storage tank of energy type HEATING is connected to bus bus_1 of energy type ELECTRICITY"]
        );
    }

    #[test]
    fn test_conversion_needs_input_bus() {
        let mut network = network();
        network.add_bus(Bus::new("heat", "HEATING")).unwrap();
        let mut heat_pump = generator_type("heat_pump", "HEATING");
        heat_pump.conversion_rate = [("ELECTRICITY".to_string(), vec![3.0; 24])].into();
        network.add_generator_type(heat_pump).unwrap();

        network
            .add_generator(Generator::new("hp_ok", "heat_pump", ["heat", "bus_1"], 1.0, 2))
            .unwrap();
        network
            .add_generator(Generator::new("hp_bad", "heat_pump", ["heat"], 1.0, 2))
            .unwrap();

        let diag = network.validate();
        assert_eq!(
            diag.messages(),
            vec!["Generator hp_bad converts energy type ELECTRICITY but is connected to no bus of that type"]
        );
    }

    #[test]
    fn test_unused_definitions_are_warnings() {
        let mut network = network();
        network.add_generator_type(generator_type("spare", "ELECTRICITY")).unwrap();
        network
            .add_dsr(Dsr {
                name: "flex".into(),
                compensation_factor: 0.0,
                balancing_period_len: 4,
                penalization: 0.0,
                relative_shift_limit: None,
                abs_shift_limit: None,
            })
            .unwrap();

        let diag = network.validate();
        assert!(!diag.has_errors());
        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.issues_by_category("dsr").count(), 1);
        assert_eq!(diag.issues_by_category("generator_type").count(), 1);
    }

    #[test]
    fn test_device_power_outside_consumer_is_warning() {
        let mut network = network();
        network.add_generator_type(generator_type("pp", "ELECTRICITY")).unwrap();
        network
            .add_generator(Generator::new("g", "pp", ["bus_1"], 1.0, 2).with_device_nom_power(None, Some(2.0)))
            .unwrap();

        let diag = network.validate();
        assert!(!diag.has_errors());
        let warnings: Vec<_> = diag.warnings().map(|w| w.message.as_str()).collect();
        assert_eq!(
            warnings,
            vec!["Device nominal power of generator g is ignored: it serves no aggregated consumer"]
        );
    }

    #[test]
    fn test_empty_energy_types() {
        let network = Network::new(Vec::<String>::new(), ["CO2"], NetworkConstants::default());
        assert_eq!(network.validate().messages(), vec!["Network declares no energy types"]);
    }

    #[test]
    fn test_generator_unknown_type_reported() {
        let mut network = network();
        network
            .add_generator(Generator::new("g", "missing_type", ["bus_1"], 1.0, 2))
            .unwrap();

        let diag = network.validate();
        assert_eq!(diag.issues_by_category("generator").count(), 1);
        assert!(diag.has_errors());
    }
}
