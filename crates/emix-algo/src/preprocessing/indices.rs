//! Dense integer indexing of network elements and of the sampled time grid.

use emix_core::Network;
use indexmap::IndexMap;
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndexError {
    #[error("duplicate label '{label}' in {set} index")]
    Duplicate { set: String, label: String },
    #[error("{set} sample contains {label}, outside of 0..{n}")]
    OutOfRange { set: String, label: usize, n: usize },
    #[error("{set} sample is empty")]
    EmptySample { set: String },
    #[error("invalid year aggregation: {0}")]
    InvalidAggregation(String),
}

/// Bijection between labels and dense ordinals `0..n`.
///
/// `mapping[ord]` is the label of an ordinal and `inverse[label]` its
/// ordinal. For time sets the labels are the original hour/year numbers, so
/// `ii()` is what sampled series are read with.
#[derive(Debug, Clone)]
pub struct IndexingSet<K = String> {
    pub mapping: Vec<K>,
    pub inverse: HashMap<K, usize>,
}

impl<K> IndexingSet<K>
where
    K: Clone + Eq + Hash + Display,
{
    pub fn build(set: &str, labels: impl IntoIterator<Item = K>) -> Result<Self, IndexError> {
        let mut mapping = Vec::new();
        let mut inverse = HashMap::new();
        for label in labels {
            if inverse.insert(label.clone(), mapping.len()).is_some() {
                return Err(IndexError::Duplicate {
                    set: set.to_string(),
                    label: label.to_string(),
                });
            }
            mapping.push(label);
        }
        Ok(Self { mapping, inverse })
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn ord(&self) -> std::ops::Range<usize> {
        0..self.mapping.len()
    }

    /// Original labels in ordinal order
    pub fn ii(&self) -> &[K] {
        &self.mapping
    }

    pub fn get<Q>(&self, label: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inverse.get(label).copied()
    }
}

impl IndexingSet<usize> {
    pub fn hours(sample: &[usize], n_hours: usize) -> Result<Self, IndexError> {
        Self::sample("hour", sample, n_hours)
    }

    pub fn years(sample: &[usize], n_years: usize) -> Result<Self, IndexError> {
        Self::sample("year", sample, n_years)
    }

    fn sample(set: &str, sample: &[usize], n: usize) -> Result<Self, IndexError> {
        if sample.is_empty() {
            return Err(IndexError::EmptySample {
                set: set.to_string(),
            });
        }
        if let Some(&label) = sample.iter().find(|&&label| label >= n) {
            return Err(IndexError::OutOfRange {
                set: set.to_string(),
                label,
                n,
            });
        }
        Self::build(set, sample.iter().copied())
    }
}

/// Name index in collection order
pub fn build_index<'a>(
    set: &str,
    names: impl IntoIterator<Item = &'a String>,
) -> Result<IndexingSet, IndexError> {
    IndexingSet::build(set, names.into_iter().cloned())
}

/// Map element ordinals to the ordinal of the element referenced by `prop`.
///
/// Elements missing from the collection, with no reference, or whose
/// reference is not in `connected_index` are left out.
pub fn get_index_from_prop<E, F>(
    elements: &IndexMap<String, E>,
    element_index: &IndexingSet,
    connected_index: &IndexingSet,
    prop: F,
) -> BTreeMap<usize, usize>
where
    F: Fn(&E) -> Option<&str>,
{
    element_index
        .mapping
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let target = prop(elements.get(name)?)?;
            Some((idx, connected_index.get(target)?))
        })
        .collect()
}

/// Every index the model is built over.
#[derive(Debug, Clone)]
pub struct Indices {
    pub h: IndexingSet<usize>,
    pub y: IndexingSet<usize>,
    /// Objective weight of every sampled year
    pub year_aggregates: Vec<f64>,
    pub bus: IndexingSet,
    pub gen: IndexingSet,
    pub stor: IndexingSet,
    pub tgen: IndexingSet,
    pub tstor: IndexingSet,
    pub line: IndexingSet,
    pub tf: IndexingSet,
    pub fuel: IndexingSet,
    pub cf: IndexingSet,
    pub dp: IndexingSet,
    pub aggr: IndexingSet,
    pub lbs: IndexingSet,
    pub em_fee: IndexingSet,
    pub dsr: IndexingSet,
    pub et: IndexingSet,
    pub em: IndexingSet,
    /// Aggregated consumer -> its stacks
    pub aggr_lbs_map: BTreeMap<usize, BTreeSet<usize>>,
    /// Aggregated consumer -> generators attached to any of its stacks
    pub aggr_gen_map: BTreeMap<usize, BTreeSet<usize>>,
    pub aggr_stor_map: BTreeMap<usize, BTreeSet<usize>>,
    /// Aggregated consumer -> types of its local generators
    pub aggr_tgen_map: BTreeMap<usize, BTreeSet<usize>>,
    pub aggr_tstor_map: BTreeMap<usize, BTreeSet<usize>>,
    /// Stack -> generators connected to one of its buses
    pub lbs_gen_map: BTreeMap<usize, BTreeSet<usize>>,
    pub lbs_stor_map: BTreeMap<usize, BTreeSet<usize>>,
}

impl Indices {
    pub fn new(
        network: &Network,
        hour_sample: &[usize],
        year_sample: &[usize],
        year_aggregates: Option<&[f64]>,
    ) -> Result<Self, IndexError> {
        let h = IndexingSet::hours(hour_sample, network.constants.n_hours)?;
        let y = IndexingSet::years(year_sample, network.constants.n_years)?;
        let year_aggregates = match year_aggregates {
            None => vec![1.0; y.len()],
            Some(weights) => {
                if weights.len() != y.len() {
                    return Err(IndexError::InvalidAggregation(format!(
                        "expected {} weights, got {}",
                        y.len(),
                        weights.len()
                    )));
                }
                if let Some(w) = weights.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
                    return Err(IndexError::InvalidAggregation(format!(
                        "weights must be positive, got {w}"
                    )));
                }
                weights.to_vec()
            }
        };

        let bus = build_index("bus", network.buses.keys())?;
        let gen = build_index("generator", network.generators.keys())?;
        let stor = build_index("storage", network.storages.keys())?;
        let tgen = build_index("generator type", network.generator_types.keys())?;
        let tstor = build_index("storage type", network.storage_types.keys())?;
        let lbs = build_index("local balancing stack", network.local_balancing_stacks.keys())?;
        let aggr = build_index("aggregated consumer", network.aggregated_consumers.keys())?;

        let mut lbs_gen_map = BTreeMap::new();
        let mut lbs_stor_map = BTreeMap::new();
        for (lbs_idx, name) in lbs.mapping.iter().enumerate() {
            let stack_buses = network
                .local_balancing_stacks
                .get(name)
                .map(|stack| stack.all_buses())
                .unwrap_or_default();
            let gens: BTreeSet<usize> = network
                .generators
                .values()
                .filter(|g| g.buses.iter().any(|b| stack_buses.contains(b.as_str())))
                .filter_map(|g| gen.get(g.name.as_str()))
                .collect();
            let stors: BTreeSet<usize> = network
                .storages
                .values()
                .filter(|s| stack_buses.contains(s.bus.as_str()))
                .filter_map(|s| stor.get(s.name.as_str()))
                .collect();
            lbs_gen_map.insert(lbs_idx, gens);
            lbs_stor_map.insert(lbs_idx, stors);
        }

        let mut aggr_lbs_map = BTreeMap::new();
        let mut aggr_gen_map = BTreeMap::new();
        let mut aggr_stor_map = BTreeMap::new();
        let mut aggr_tgen_map = BTreeMap::new();
        let mut aggr_tstor_map = BTreeMap::new();
        for (aggr_idx, name) in aggr.mapping.iter().enumerate() {
            let stacks: BTreeSet<usize> = network
                .aggregated_consumers
                .get(name)
                .map(|a| a.stacks().filter_map(|s| lbs.get(s)).collect())
                .unwrap_or_default();
            let gens: BTreeSet<usize> = stacks
                .iter()
                .flat_map(|s| lbs_gen_map.get(s).into_iter().flatten().copied())
                .collect();
            let stors: BTreeSet<usize> = stacks
                .iter()
                .flat_map(|s| lbs_stor_map.get(s).into_iter().flatten().copied())
                .collect();
            let tgens: BTreeSet<usize> = gens
                .iter()
                .filter_map(|&g| {
                    let unit = network.generators.get(&gen.mapping[g])?;
                    tgen.get(unit.energy_source_type.as_str())
                })
                .collect();
            let tstors: BTreeSet<usize> = stors
                .iter()
                .filter_map(|&s| {
                    let unit = network.storages.get(&stor.mapping[s])?;
                    tstor.get(unit.energy_source_type.as_str())
                })
                .collect();
            aggr_lbs_map.insert(aggr_idx, stacks);
            aggr_gen_map.insert(aggr_idx, gens);
            aggr_stor_map.insert(aggr_idx, stors);
            aggr_tgen_map.insert(aggr_idx, tgens);
            aggr_tstor_map.insert(aggr_idx, tstors);
        }

        Ok(Self {
            h,
            y,
            year_aggregates,
            bus,
            gen,
            stor,
            tgen,
            tstor,
            line: build_index("line", network.lines.keys())?,
            tf: build_index("transmission fee", network.transmission_fees.keys())?,
            fuel: build_index("fuel", network.fuels.keys())?,
            cf: build_index("capacity factor", network.capacity_factors.keys())?,
            dp: build_index("demand profile", network.demand_profiles.keys())?,
            aggr,
            lbs,
            em_fee: build_index("emission fee", network.emission_fees.keys())?,
            dsr: build_index("dsr", network.dsr.keys())?,
            et: build_index("energy type", network.energy_types.iter())?,
            em: build_index("emission type", network.emission_types.iter())?,
            aggr_lbs_map,
            aggr_gen_map,
            aggr_stor_map,
            aggr_tgen_map,
            aggr_tstor_map,
            lbs_gen_map,
            lbs_stor_map,
        })
    }

    /// Generators attached to no aggregated consumer
    pub fn global_generators(&self) -> BTreeSet<usize> {
        let local: BTreeSet<usize> = self.aggr_gen_map.values().flatten().copied().collect();
        self.gen.ord().filter(|g| !local.contains(g)).collect()
    }

    /// Storages attached to no aggregated consumer
    pub fn global_storages(&self) -> BTreeSet<usize> {
        let local: BTreeSet<usize> = self.aggr_stor_map.values().flatten().copied().collect();
        self.stor.ord().filter(|s| !local.contains(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(labels: &[&str]) -> IndexingSet {
        IndexingSet::build("test", labels.iter().map(|s| s.to_string())).unwrap()
    }

    fn check_prop(elements: &[&str], links: &[(&str, &str)], connected: &[&str], expected: &[(usize, usize)]) {
        let collection: IndexMap<String, String> = links
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let result = get_index_from_prop(&collection, &names(elements), &names(connected), |target| {
            Some(target.as_str())
        });
        assert_eq!(result, expected.iter().copied().collect::<BTreeMap<_, _>>());
    }

    #[test]
    fn test_get_index_from_prop() {
        check_prop(
            &["el1", "el2"],
            &[("el1", "conn1"), ("el2", "conn2")],
            &["conn1", "conn5", "conn3", "conn2"],
            &[(0, 0), (1, 3)],
        );
        check_prop(&["AA"], &[("AA", "BB")], &["X", "Y", "BB"], &[(0, 2)]);
        check_prop(
            &["L1", "L2", "L3"],
            &[("L1", "B1"), ("L2", "B2"), ("L3", "B3")],
            &["B1", "B2", "B3", "X", "Y"],
            &[(0, 0), (1, 1), (2, 2)],
        );
    }

    #[test]
    fn test_get_index_from_prop_drops_unresolved() {
        check_prop(&["a", "b"], &[("a", "missing"), ("b", "x")], &["x"], &[(1, 0)]);
    }

    #[test]
    fn test_hours_renumbered() {
        let h = IndexingSet::hours(&[5, 7, 9], 10).unwrap();
        assert_eq!(h.ord(), 0..3);
        assert_eq!(h.ii(), &[5, 7, 9]);
        assert_eq!(h.get(&7usize), Some(1));
    }

    #[test]
    fn test_sample_errors() {
        assert!(matches!(
            IndexingSet::hours(&[], 10),
            Err(IndexError::EmptySample { .. })
        ));
        assert!(matches!(
            IndexingSet::years(&[0, 3], 3),
            Err(IndexError::OutOfRange { label: 3, n: 3, .. })
        ));
        assert!(matches!(
            IndexingSet::hours(&[1, 1], 10),
            Err(IndexError::Duplicate { .. })
        ));
    }
}
