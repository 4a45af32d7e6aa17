//! Numeric parameters keyed by dense ordinals.
//!
//! Every series is sampled here (yearly series by `Y.ii()`, hourly by
//! `H.ii()`) and every monetary value is divided by the money scale here, so
//! the model layer never touches labels or raw network units.

use crate::config::OptConfig;
use crate::preprocessing::indices::{Indices, IndexingSet};
use emix_core::{CapacityBounds, Network};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParameterError {
    #[error("{element}: missing attribute {attribute}")]
    MissingAttribute { element: String, attribute: String },
    #[error("{element}: {property} references unknown element '{target}'")]
    UnresolvedReference {
        element: String,
        property: String,
        target: String,
    },
}

/// Scaling applied to the cost side of the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleConfig {
    pub money_scale: f64,
    /// Ratio of modeled hours to sampled hours
    pub hourly_scale: f64,
}

impl ScaleConfig {
    pub fn new(config: &OptConfig, n_hours: usize, n_sampled_hours: usize) -> Self {
        let hourly_scale = if config.use_hourly_scale && n_sampled_hours > 0 {
            n_hours as f64 / n_sampled_hours as f64
        } else {
            1.0
        };
        Self {
            money_scale: config.money_scale,
            hourly_scale,
        }
    }
}

fn lookup(
    index: &IndexingSet,
    element: &str,
    property: &str,
    target: &str,
) -> Result<usize, ParameterError> {
    index
        .get(target)
        .ok_or_else(|| ParameterError::UnresolvedReference {
            element: element.to_string(),
            property: property.to_string(),
            target: target.to_string(),
        })
}

fn lookup_all<'a>(
    index: &IndexingSet,
    element: &str,
    property: &str,
    targets: impl IntoIterator<Item = &'a String>,
) -> Result<BTreeSet<usize>, ParameterError> {
    targets
        .into_iter()
        .map(|t| lookup(index, element, property, t))
        .collect()
}

/// Strict counterpart of [`get_index_from_prop`](super::indices::get_index_from_prop):
/// a reference that cannot be resolved is an error instead of being dropped.
pub fn resolve_index_from_prop<E, F>(
    elements: &IndexMap<String, E>,
    element_index: &IndexingSet,
    connected_index: &IndexingSet,
    property: &str,
    prop: F,
) -> Result<BTreeMap<usize, usize>, ParameterError>
where
    F: Fn(&E) -> Option<&str>,
{
    let mut result = BTreeMap::new();
    for (idx, name) in element_index.mapping.iter().enumerate() {
        let Some(target) = elements.get(name).and_then(|e| prop(e)) else {
            continue;
        };
        result.insert(idx, lookup(connected_index, name, property, target)?);
    }
    Ok(result)
}

fn sample(
    series: &[f64],
    labels: &[usize],
    element: &str,
    attribute: &str,
) -> Result<Vec<f64>, ParameterError> {
    labels
        .iter()
        .map(|&label| {
            series
                .get(label)
                .copied()
                .ok_or_else(|| ParameterError::MissingAttribute {
                    element: element.to_string(),
                    attribute: format!("{attribute}[{label}]"),
                })
        })
        .collect()
}

fn sample_money(
    series: &[f64],
    labels: &[usize],
    element: &str,
    attribute: &str,
    money_scale: f64,
) -> Result<Vec<f64>, ParameterError> {
    Ok(sample(series, labels, element, attribute)?
        .into_iter()
        .map(|v| v / money_scale)
        .collect())
}

/// Absent entries are unbounded
fn sample_bounds(series: &[Option<f64>], labels: &[usize]) -> Vec<Option<f64>> {
    labels
        .iter()
        .map(|&label| series.get(label).copied().flatten())
        .collect()
}

fn get<'a, T>(map: &'a IndexMap<String, T>, name: &str) -> Result<&'a T, ParameterError> {
    map.get(name).ok_or_else(|| ParameterError::MissingAttribute {
        element: name.to_string(),
        attribute: "definition".to_string(),
    })
}

/// Sampled yearly capacity bounds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityBoundParameters {
    pub min_capacity: Vec<Option<f64>>,
    pub max_capacity: Vec<Option<f64>>,
    pub min_capacity_increase: Vec<Option<f64>>,
    pub max_capacity_increase: Vec<Option<f64>>,
}

impl CapacityBoundParameters {
    fn new(bounds: &CapacityBounds, years: &[usize]) -> Self {
        Self {
            min_capacity: sample_bounds(&bounds.min_capacity, years),
            max_capacity: sample_bounds(&bounds.max_capacity, years),
            min_capacity_increase: sample_bounds(&bounds.min_capacity_increase, years),
            max_capacity_increase: sample_bounds(&bounds.max_capacity_increase, years),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BusParameters {
    pub et: Vec<usize>,
    pub generators: Vec<BTreeSet<usize>>,
    pub storages: Vec<BTreeSet<usize>>,
    pub lines_in: Vec<BTreeSet<usize>>,
    pub lines_out: Vec<BTreeSet<usize>>,
    /// Bus -> DSR program, for buses with one
    pub dsr_type: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorParameters {
    pub base_cap: Vec<f64>,
    pub tgen: Vec<usize>,
    pub buses: Vec<BTreeSet<usize>>,
    pub emission_fees: Vec<BTreeSet<usize>>,
    pub bounds: Vec<CapacityBoundParameters>,
    /// Binding name -> bound generators, in index order
    pub bindings: BTreeMap<String, Vec<usize>>,
    pub min_device_nom_power: Vec<Option<f64>>,
    pub max_device_nom_power: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorTypeParameters {
    pub lt: Vec<usize>,
    pub bt: Vec<usize>,
    pub capex: Vec<Vec<f64>>,
    pub opex: Vec<Vec<f64>>,
    pub energy_types: Vec<BTreeSet<usize>>,
    /// Type -> energy type -> hourly efficiency
    pub efficiency: Vec<BTreeMap<usize, Vec<f64>>>,
    /// Type -> emission type -> yearly reduction
    pub emission_reduction: Vec<BTreeMap<usize, Vec<f64>>>,
    pub fuel: BTreeMap<usize, usize>,
    pub capacity_factor: BTreeMap<usize, usize>,
    pub power_utilization: Vec<Vec<f64>>,
    pub minimal_power_utilization: BTreeMap<usize, Vec<f64>>,
    /// Type -> input energy type -> hourly conversion rate
    pub conversion_rate: Vec<BTreeMap<usize, Vec<f64>>>,
    /// Type -> yearly compensation per unit of delivered energy
    pub generation_compensation: BTreeMap<usize, Vec<f64>>,
    pub bounds: Vec<CapacityBoundParameters>,
}

#[derive(Debug, Clone, Default)]
pub struct StorageParameters {
    pub base_cap: Vec<f64>,
    pub tstor: Vec<usize>,
    pub bus: Vec<usize>,
    pub bounds: Vec<CapacityBoundParameters>,
    pub min_device_nom_power: Vec<Option<f64>>,
    pub max_device_nom_power: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct StorageTypeParameters {
    pub lt: Vec<usize>,
    pub bt: Vec<usize>,
    pub capex: Vec<Vec<f64>>,
    pub opex: Vec<Vec<f64>>,
    pub et: Vec<usize>,
    pub load_eff: Vec<f64>,
    pub gen_eff: Vec<f64>,
    pub power_to_capacity: Vec<f64>,
    pub energy_loss: Vec<f64>,
    pub power_utilization: Vec<f64>,
    pub bounds: Vec<CapacityBoundParameters>,
}

#[derive(Debug, Clone, Default)]
pub struct LineParameters {
    pub et: Vec<usize>,
    pub fr: Vec<usize>,
    pub to: Vec<usize>,
    pub loss: Vec<f64>,
    pub max_capacity: Vec<f64>,
    /// Line -> transmission fee, for lines with one
    pub tf: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct FuelParameters {
    pub emission: Vec<BTreeMap<usize, f64>>,
    pub energy_per_unit: Vec<f64>,
    pub cost: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct AggregatedConsumerParameters {
    pub dp: Vec<usize>,
    pub base_fraction: Vec<BTreeMap<usize, f64>>,
    /// Aggregate -> energy type -> yearly usage
    pub usage: Vec<BTreeMap<usize, Vec<f64>>>,
    pub min_fraction: Vec<BTreeMap<usize, Vec<Option<f64>>>>,
    pub max_fraction: Vec<BTreeMap<usize, Vec<Option<f64>>>>,
    pub max_fraction_increase: Vec<BTreeMap<usize, Vec<Option<f64>>>>,
    pub max_fraction_decrease: Vec<BTreeMap<usize, Vec<Option<f64>>>>,
    pub n_consumers: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct LbsParameters {
    /// Stack -> energy type -> outlet bus
    pub buses_out: Vec<BTreeMap<usize, usize>>,
    pub buses: Vec<BTreeMap<usize, BTreeSet<usize>>>,
}

#[derive(Debug, Clone, Default)]
pub struct EmissionFeeParameters {
    pub emission_type: Vec<usize>,
    pub price: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct DsrParameters {
    pub compensation_factor: Vec<f64>,
    pub balancing_period_len: Vec<usize>,
    pub penalization: Vec<f64>,
    pub relative_shift_limit: Vec<Option<f64>>,
    pub abs_shift_limit: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioParameters {
    pub year_weights: Vec<f64>,
    pub discount_factor: Vec<f64>,
    pub hourly_scale: f64,
    pub ens_penalty: f64,
}

/// Discount factor of every year label up to `n_years`.
///
/// `df(0) = 1` and `df(y) = df(y - 1) / (1 + r_y)`; missing rates are zero.
pub fn discount_factors(rates: &[f64], n_years: usize) -> Vec<f64> {
    let mut factors = Vec::with_capacity(n_years);
    let mut acc = 1.0;
    for year in 0..n_years {
        if year > 0 {
            acc /= 1.0 + rates.get(year).copied().unwrap_or(0.0);
        }
        factors.push(acc);
    }
    factors
}

/// All parameters of one model instance
#[derive(Debug, Clone)]
pub struct ModelParameters {
    pub scale: ScaleConfig,
    pub bus: BusParameters,
    pub gen: GeneratorParameters,
    pub tgen: GeneratorTypeParameters,
    pub stor: StorageParameters,
    pub tstor: StorageTypeParameters,
    pub line: LineParameters,
    /// Transmission fee -> hourly fee
    pub tf: Vec<Vec<f64>>,
    pub fuel: FuelParameters,
    /// Capacity factor -> hourly profile
    pub cf: Vec<Vec<f64>>,
    /// Demand profile -> energy type -> hourly share
    pub dp: Vec<BTreeMap<usize, Vec<f64>>>,
    pub aggr: AggregatedConsumerParameters,
    pub lbs: LbsParameters,
    pub em_fee: EmissionFeeParameters,
    pub dsr: DsrParameters,
    pub scenario: ScenarioParameters,
}

impl ModelParameters {
    pub fn new(
        network: &Network,
        indices: &Indices,
        config: &OptConfig,
    ) -> Result<Self, ParameterError> {
        let scale = ScaleConfig::new(config, network.constants.n_hours, indices.h.len());
        let hours = indices.h.ii();
        let years = indices.y.ii();
        let money = scale.money_scale;

        let all_years = discount_factors(&config.discount_rate, network.constants.n_years);
        let scenario = ScenarioParameters {
            year_weights: indices.year_aggregates.clone(),
            discount_factor: sample(&all_years, years, "scenario", "discount_factor")?,
            hourly_scale: scale.hourly_scale,
            ens_penalty: config.ens_penalty / money,
        };

        let mut bus = BusParameters::default();
        for name in &indices.bus.mapping {
            let b = get(&network.buses, name)?;
            bus.et.push(lookup(&indices.et, name, "energy_type", &b.energy_type)?);
            bus.generators.push(lookup_all(&indices.gen, name, "generators", &b.generators)?);
            bus.storages.push(lookup_all(&indices.stor, name, "storages", &b.storages)?);
            bus.lines_in.push(lookup_all(&indices.line, name, "lines_in", &b.lines_in)?);
            bus.lines_out.push(lookup_all(&indices.line, name, "lines_out", &b.lines_out)?);
        }
        bus.dsr_type = resolve_index_from_prop(
            &network.buses,
            &indices.bus,
            &indices.dsr,
            "dsr_type",
            |b| b.dsr_type.as_deref(),
        )?;

        let mut gen = GeneratorParameters::default();
        for (idx, name) in indices.gen.mapping.iter().enumerate() {
            let g = get(&network.generators, name)?;
            gen.base_cap.push(g.unit_base_cap);
            gen.tgen.push(lookup(&indices.tgen, name, "energy_source_type", &g.energy_source_type)?);
            gen.buses.push(lookup_all(&indices.bus, name, "buses", &g.buses)?);
            gen.emission_fees.push(lookup_all(&indices.em_fee, name, "emission_fees", &g.emission_fees)?);
            gen.bounds.push(CapacityBoundParameters::new(&g.bounds, years));
            if let Some(binding) = &g.generator_binding {
                gen.bindings.entry(binding.clone()).or_default().push(idx);
            }
            gen.min_device_nom_power.push(g.min_device_nom_power);
            gen.max_device_nom_power.push(g.max_device_nom_power);
        }

        let mut tgen = GeneratorTypeParameters::default();
        for (idx, name) in indices.tgen.mapping.iter().enumerate() {
            let t = get(&network.generator_types, name)?;
            tgen.lt.push(t.life_time);
            tgen.bt.push(t.build_time);
            tgen.capex.push(sample_money(&t.capex, years, name, "capex", money)?);
            tgen.opex.push(sample_money(&t.opex, years, name, "opex", money)?);
            tgen.energy_types.push(lookup_all(&indices.et, name, "energy_types", &t.energy_types)?);
            let mut efficiency = BTreeMap::new();
            for et_name in &t.energy_types {
                let series = t.efficiency.get(et_name).ok_or_else(|| {
                    ParameterError::MissingAttribute {
                        element: name.clone(),
                        attribute: format!("efficiency[{et_name}]"),
                    }
                })?;
                let et = lookup(&indices.et, name, "energy_types", et_name)?;
                efficiency.insert(et, sample(series, hours, name, "efficiency")?);
            }
            tgen.efficiency.push(efficiency);
            let mut reduction = BTreeMap::new();
            for (em_name, series) in &t.emission_reduction {
                let em = lookup(&indices.em, name, "emission_reduction", em_name)?;
                reduction.insert(em, sample(series, years, name, "emission_reduction")?);
            }
            tgen.emission_reduction.push(reduction);
            if let Some(fuel) = &t.fuel {
                tgen.fuel.insert(idx, lookup(&indices.fuel, name, "fuel", fuel)?);
            }
            if let Some(cf) = &t.capacity_factor {
                tgen.capacity_factor.insert(idx, lookup(&indices.cf, name, "capacity_factor", cf)?);
            }
            tgen.power_utilization.push(sample(&t.power_utilization, hours, name, "power_utilization")?);
            if let Some(min_pu) = &t.minimal_power_utilization {
                tgen.minimal_power_utilization
                    .insert(idx, sample(min_pu, hours, name, "minimal_power_utilization")?);
            }
            let mut conversion = BTreeMap::new();
            for (et_name, series) in &t.conversion_rate {
                let et = lookup(&indices.et, name, "conversion_rate", et_name)?;
                conversion.insert(et, sample(series, hours, name, "conversion_rate")?);
            }
            tgen.conversion_rate.push(conversion);
            if let Some(compensation) = &t.generation_compensation {
                tgen.generation_compensation.insert(
                    idx,
                    sample_money(compensation, years, name, "generation_compensation", money)?,
                );
            }
            tgen.bounds.push(CapacityBoundParameters::new(&t.bounds, years));
        }

        let mut stor = StorageParameters::default();
        for name in &indices.stor.mapping {
            let s = get(&network.storages, name)?;
            stor.base_cap.push(s.unit_base_cap);
            stor.tstor.push(lookup(&indices.tstor, name, "energy_source_type", &s.energy_source_type)?);
            stor.bus.push(lookup(&indices.bus, name, "bus", &s.bus)?);
            stor.bounds.push(CapacityBoundParameters::new(&s.bounds, years));
            stor.min_device_nom_power.push(s.min_device_nom_power);
            stor.max_device_nom_power.push(s.max_device_nom_power);
        }

        let mut tstor = StorageTypeParameters::default();
        for name in &indices.tstor.mapping {
            let t = get(&network.storage_types, name)?;
            tstor.lt.push(t.life_time);
            tstor.bt.push(t.build_time);
            tstor.capex.push(sample_money(&t.capex, years, name, "capex", money)?);
            tstor.opex.push(sample_money(&t.opex, years, name, "opex", money)?);
            tstor.et.push(lookup(&indices.et, name, "energy_type", &t.energy_type)?);
            tstor.load_eff.push(t.load_efficiency);
            tstor.gen_eff.push(t.generation_efficiency);
            tstor.power_to_capacity.push(t.power_to_capacity);
            tstor.energy_loss.push(t.energy_loss);
            tstor.power_utilization.push(t.power_utilization);
            tstor.bounds.push(CapacityBoundParameters::new(&t.bounds, years));
        }

        let mut line = LineParameters::default();
        for name in &indices.line.mapping {
            let l = get(&network.lines, name)?;
            line.et.push(lookup(&indices.et, name, "energy_type", &l.energy_type)?);
            line.fr.push(lookup(&indices.bus, name, "fr", &l.fr)?);
            line.to.push(lookup(&indices.bus, name, "to", &l.to)?);
            line.loss.push(l.transmission_loss);
            line.max_capacity.push(l.max_capacity);
        }
        line.tf = resolve_index_from_prop(
            &network.lines,
            &indices.line,
            &indices.tf,
            "transmission_fee",
            |l| l.transmission_fee.as_deref(),
        )?;

        let tf = indices
            .tf
            .mapping
            .iter()
            .map(|name| {
                let fee = get(&network.transmission_fees, name)?;
                sample_money(&fee.fee, hours, name, "fee", money)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut fuel = FuelParameters::default();
        for name in &indices.fuel.mapping {
            let f = get(&network.fuels, name)?;
            let emission = f
                .emission
                .iter()
                .map(|(em, value)| Ok((lookup(&indices.em, name, "emission", em)?, *value)))
                .collect::<Result<BTreeMap<_, _>, ParameterError>>()?;
            fuel.emission.push(emission);
            fuel.energy_per_unit.push(f.energy_per_unit);
            fuel.cost.push(sample_money(&f.cost, years, name, "cost", money)?);
        }

        let cf = indices
            .cf
            .mapping
            .iter()
            .map(|name| {
                let profile = get(&network.capacity_factors, name)?;
                sample(&profile.profile, hours, name, "profile")
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut dp = Vec::with_capacity(indices.dp.len());
        for name in &indices.dp.mapping {
            let profile = get(&network.demand_profiles, name)?;
            let mut by_et = BTreeMap::new();
            for (et_name, series) in &profile.normalized_profile {
                let et = lookup(&indices.et, name, "normalized_profile", et_name)?;
                by_et.insert(et, sample(series, hours, name, "normalized_profile")?);
            }
            dp.push(by_et);
        }

        let mut aggr = AggregatedConsumerParameters::default();
        for name in &indices.aggr.mapping {
            let a = get(&network.aggregated_consumers, name)?;
            aggr.dp.push(lookup(&indices.dp, name, "demand_profile", &a.demand_profile)?);
            let base_fraction = a
                .stack_base_fraction
                .iter()
                .map(|(lbs, frac)| Ok((lookup(&indices.lbs, name, "stack_base_fraction", lbs)?, *frac)))
                .collect::<Result<BTreeMap<_, _>, ParameterError>>()?;
            aggr.base_fraction.push(base_fraction);
            let mut usage = BTreeMap::new();
            for (et_name, series) in &a.yearly_energy_usage {
                let et = lookup(&indices.et, name, "yearly_energy_usage", et_name)?;
                usage.insert(et, sample(series, years, name, "yearly_energy_usage")?);
            }
            aggr.usage.push(usage);
            let fraction_bounds = |bounds: &BTreeMap<String, Vec<Option<f64>>>, property: &str| {
                bounds
                    .iter()
                    .map(|(lbs, series)| {
                        Ok((lookup(&indices.lbs, name, property, lbs)?, sample_bounds(series, years)))
                    })
                    .collect::<Result<BTreeMap<_, _>, ParameterError>>()
            };
            aggr.min_fraction.push(fraction_bounds(&a.min_fraction, "min_fraction")?);
            aggr.max_fraction.push(fraction_bounds(&a.max_fraction, "max_fraction")?);
            aggr.max_fraction_increase
                .push(fraction_bounds(&a.max_fraction_increase, "max_fraction_increase")?);
            aggr.max_fraction_decrease
                .push(fraction_bounds(&a.max_fraction_decrease, "max_fraction_decrease")?);
            aggr.n_consumers.push(sample(&a.n_consumers, years, name, "n_consumers")?);
        }

        let mut lbs = LbsParameters::default();
        for name in &indices.lbs.mapping {
            let stack = get(&network.local_balancing_stacks, name)?;
            let mut buses_out = BTreeMap::new();
            for (et_name, bus_name) in &stack.buses_out {
                let et = lookup(&indices.et, name, "buses_out", et_name)?;
                buses_out.insert(et, lookup(&indices.bus, name, "buses_out", bus_name)?);
            }
            let mut buses = BTreeMap::new();
            for (et_name, bus_names) in &stack.buses {
                let et = lookup(&indices.et, name, "buses", et_name)?;
                buses.insert(et, lookup_all(&indices.bus, name, "buses", bus_names)?);
            }
            lbs.buses_out.push(buses_out);
            lbs.buses.push(buses);
        }

        let mut em_fee = EmissionFeeParameters::default();
        for name in &indices.em_fee.mapping {
            let fee = get(&network.emission_fees, name)?;
            em_fee.emission_type.push(lookup(&indices.em, name, "emission_type", &fee.emission_type)?);
            em_fee.price.push(sample_money(&fee.price, years, name, "price", money)?);
        }

        let mut dsr = DsrParameters::default();
        for name in &indices.dsr.mapping {
            let d = get(&network.dsr, name)?;
            if d.balancing_period_len == 0 {
                return Err(ParameterError::MissingAttribute {
                    element: name.clone(),
                    attribute: "balancing_period_len".to_string(),
                });
            }
            dsr.compensation_factor.push(d.compensation_factor);
            dsr.balancing_period_len.push(d.balancing_period_len);
            dsr.penalization.push(d.penalization / money);
            dsr.relative_shift_limit.push(d.relative_shift_limit);
            dsr.abs_shift_limit.push(d.abs_shift_limit);
        }

        tracing::debug!(
            money_scale = scale.money_scale,
            hourly_scale = scale.hourly_scale,
            "model parameters built"
        );

        Ok(Self {
            scale,
            bus,
            gen,
            tgen,
            stor,
            tstor,
            line,
            tf,
            fuel,
            cf,
            dp,
            aggr,
            lbs,
            em_fee,
            dsr,
            scenario,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_factors() {
        let df = discount_factors(&[0.0, 0.1, 0.1], 4);
        assert_eq!(df.len(), 4);
        assert!((df[0] - 1.0).abs() < 1e-12);
        assert!((df[1] - 1.0 / 1.1).abs() < 1e-12);
        assert!((df[2] - 1.0 / 1.21).abs() < 1e-12);
        // missing rate for year 3 is zero
        assert!((df[3] - df[2]).abs() < 1e-12);
    }

    #[test]
    fn test_sample_missing_label() {
        let err = sample(&[1.0, 2.0], &[0, 2], "pv", "capex").unwrap_err();
        assert_eq!(
            err,
            ParameterError::MissingAttribute {
                element: "pv".into(),
                attribute: "capex[2]".into()
            }
        );
    }

    #[test]
    fn test_resolve_index_from_prop_strict() {
        let elements: IndexMap<String, Option<String>> = [
            ("a".to_string(), Some("x".to_string())),
            ("b".to_string(), None),
            ("c".to_string(), Some("zz".to_string())),
        ]
        .into_iter()
        .collect();
        let element_index = IndexingSet::build("el", ["a", "b"].map(String::from)).unwrap();
        let connected = IndexingSet::build("conn", ["y", "x"].map(String::from)).unwrap();

        let resolved =
            resolve_index_from_prop(&elements, &element_index, &connected, "link", |e| e.as_deref())
                .unwrap();
        assert_eq!(resolved, BTreeMap::from([(0, 1)]));

        let all = IndexingSet::build("el", ["a", "c"].map(String::from)).unwrap();
        let err = resolve_index_from_prop(&elements, &all, &connected, "link", |e| e.as_deref())
            .unwrap_err();
        assert!(matches!(err, ParameterError::UnresolvedReference { ref target, .. } if target == "zz"));
    }

    #[test]
    fn test_hourly_scale() {
        let config = OptConfig::builder(vec![0, 1], vec![0]).build();
        assert_eq!(ScaleConfig::new(&config, 8, 2).hourly_scale, 4.0);
        let config = OptConfig::builder(vec![0, 1], vec![0]).use_hourly_scale(false).build();
        assert_eq!(ScaleConfig::new(&config, 8, 2).hourly_scale, 1.0);
    }
}
