//! Variable registry and variable families.

use super::capacity::CapacityEvolution;
use crate::preprocessing::{Indices, ModelParameters};
use good_lp::{variable, ProblemVariables, Variable, VariableDefinition};
use std::collections::BTreeMap;

/// Dense position of a variable in the [`VariableRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// Per-element `[hour][year]` grid of variables
pub type HourYear = Vec<Vec<VarId>>;

/// Owns the backend variables in creation order.
///
/// Solve outcomes report values in the same order, so a [`VarId`] indexes
/// both the backend handle and its solved value.
pub struct VariableRegistry {
    problem: ProblemVariables,
    handles: Vec<Variable>,
    has_integer: bool,
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self {
            problem: ProblemVariables::new(),
            handles: Vec::new(),
            has_integer: false,
        }
    }

    pub fn add(&mut self, definition: VariableDefinition) -> VarId {
        let id = VarId(self.handles.len());
        self.handles.push(self.problem.add(definition));
        id
    }

    pub fn non_negative(&mut self) -> VarId {
        self.add(variable().min(0.0))
    }

    pub fn bounded(&mut self, min: f64, max: f64) -> VarId {
        self.add(variable().min(min).max(max))
    }

    pub fn binary(&mut self) -> VarId {
        self.has_integer = true;
        self.add(variable().binary())
    }

    pub fn var(&self, id: VarId) -> Variable {
        self.handles[id.0]
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn has_integer(&self) -> bool {
        self.has_integer
    }

    pub(crate) fn into_parts(self) -> (ProblemVariables, Vec<Variable>, bool) {
        (self.problem, self.handles, self.has_integer)
    }

    fn hour_year(&mut self, n_hours: usize, n_years: usize) -> HourYear {
        (0..n_hours)
            .map(|_| (0..n_years).map(|_| self.non_negative()).collect())
            .collect()
    }

    fn hour_year_bounded(&mut self, n_hours: usize, n_years: usize, max: f64) -> HourYear {
        (0..n_hours)
            .map(|_| (0..n_years).map(|_| self.bounded(0.0, max)).collect())
            .collect()
    }

    fn yearly(&mut self, n_years: usize) -> Vec<VarId> {
        (0..n_years).map(|_| self.non_negative()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorVariables {
    pub gen: Vec<HourYear>,
    pub dump: Vec<HourYear>,
    /// Generator -> declared energy type -> grid
    pub gen_et: Vec<BTreeMap<usize, HourYear>>,
    pub dump_et: Vec<BTreeMap<usize, HourYear>>,
    pub cap: Vec<Vec<VarId>>,
    /// Capacity evolution of generators outside any aggregated consumer
    pub evolution: BTreeMap<usize, CapacityEvolution>,
    /// (aggregated consumer, generator type) -> yearly capacity
    pub tcap: BTreeMap<(usize, usize), Vec<VarId>>,
    pub tevolution: BTreeMap<(usize, usize), CapacityEvolution>,
}

#[derive(Debug, Clone, Default)]
pub struct StorageVariables {
    pub gen: Vec<HourYear>,
    pub load: Vec<HourYear>,
    pub soc: Vec<HourYear>,
    pub cap: Vec<Vec<VarId>>,
    pub evolution: BTreeMap<usize, CapacityEvolution>,
    pub tcap: BTreeMap<(usize, usize), Vec<VarId>>,
    pub tevolution: BTreeMap<(usize, usize), CapacityEvolution>,
}

#[derive(Debug, Clone, Default)]
pub struct LineVariables {
    pub flow: Vec<HourYear>,
}

#[derive(Debug, Clone, Default)]
pub struct BusVariables {
    /// Energy not served, present only with a positive penalty
    pub ens: BTreeMap<usize, HourYear>,
    pub shift_minus: BTreeMap<usize, HourYear>,
    pub shift_plus: BTreeMap<usize, HourYear>,
}

#[derive(Debug, Clone, Default)]
pub struct FractionVariables {
    /// (aggregated consumer, stack) -> yearly share of demand
    pub frac: BTreeMap<(usize, usize), Vec<VarId>>,
}

/// Every variable family of the model
#[derive(Debug, Clone, Default)]
pub struct ModelVariables {
    pub gen: GeneratorVariables,
    pub stor: StorageVariables,
    pub line: LineVariables,
    pub bus: BusVariables,
    pub frac: FractionVariables,
    /// Registry size once every family is created
    pub n_variables: usize,
}

impl ModelVariables {
    pub fn new(
        registry: &mut VariableRegistry,
        indices: &Indices,
        params: &ModelParameters,
        binary_fraction: bool,
    ) -> Self {
        let nh = indices.h.len();
        let ny = indices.y.len();

        let mut gen = GeneratorVariables::default();
        for g in indices.gen.ord() {
            let t = params.gen.tgen[g];
            gen.gen.push(registry.hour_year(nh, ny));
            gen.dump.push(registry.hour_year(nh, ny));
            let declared = &params.tgen.energy_types[t];
            gen.gen_et.push(declared.iter().map(|&e| (e, registry.hour_year(nh, ny))).collect());
            gen.dump_et.push(declared.iter().map(|&e| (e, registry.hour_year(nh, ny))).collect());
            gen.cap.push(registry.yearly(ny));
        }
        for g in indices.global_generators() {
            let t = params.gen.tgen[g];
            let evolution = CapacityEvolution::new(
                registry,
                params.gen.base_cap[g],
                params.tgen.lt[t],
                params.tgen.bt[t],
                ny,
            );
            gen.evolution.insert(g, evolution);
        }
        for (&a, types) in &indices.aggr_tgen_map {
            for &t in types {
                let base_cap: f64 = indices
                    .aggr_gen_map
                    .get(&a)
                    .into_iter()
                    .flatten()
                    .filter(|&&u| params.gen.tgen[u] == t)
                    .map(|&u| params.gen.base_cap[u])
                    .sum();
                gen.tcap.insert((a, t), registry.yearly(ny));
                let evolution =
                    CapacityEvolution::new(registry, base_cap, params.tgen.lt[t], params.tgen.bt[t], ny);
                gen.tevolution.insert((a, t), evolution);
            }
        }

        let mut stor = StorageVariables::default();
        for _ in indices.stor.ord() {
            stor.gen.push(registry.hour_year(nh, ny));
            stor.load.push(registry.hour_year(nh, ny));
            stor.soc.push(registry.hour_year(nh, ny));
            stor.cap.push(registry.yearly(ny));
        }
        for s in indices.global_storages() {
            let t = params.stor.tstor[s];
            let evolution = CapacityEvolution::new(
                registry,
                params.stor.base_cap[s],
                params.tstor.lt[t],
                params.tstor.bt[t],
                ny,
            );
            stor.evolution.insert(s, evolution);
        }
        for (&a, types) in &indices.aggr_tstor_map {
            for &t in types {
                let base_cap: f64 = indices
                    .aggr_stor_map
                    .get(&a)
                    .into_iter()
                    .flatten()
                    .filter(|&&u| params.stor.tstor[u] == t)
                    .map(|&u| params.stor.base_cap[u])
                    .sum();
                stor.tcap.insert((a, t), registry.yearly(ny));
                let evolution =
                    CapacityEvolution::new(registry, base_cap, params.tstor.lt[t], params.tstor.bt[t], ny);
                stor.tevolution.insert((a, t), evolution);
            }
        }

        let line = LineVariables {
            flow: indices
                .line
                .ord()
                .map(|l| registry.hour_year_bounded(nh, ny, params.line.max_capacity[l]))
                .collect(),
        };

        let mut bus = BusVariables::default();
        for b in indices.bus.ord() {
            if params.scenario.ens_penalty > 0.0 {
                bus.ens.insert(b, registry.hour_year(nh, ny));
            }
            if params.bus.dsr_type.contains_key(&b) {
                bus.shift_minus.insert(b, registry.hour_year(nh, ny));
                bus.shift_plus.insert(b, registry.hour_year(nh, ny));
            }
        }

        let mut frac = FractionVariables::default();
        for (&a, stacks) in &indices.aggr_lbs_map {
            for &lbs in stacks {
                let yearly = (0..ny)
                    .map(|_| {
                        if binary_fraction {
                            registry.binary()
                        } else {
                            registry.bounded(0.0, 1.0)
                        }
                    })
                    .collect();
                frac.frac.insert((a, lbs), yearly);
            }
        }

        tracing::debug!(n_variables = registry.len(), "model variables created");

        Self {
            gen,
            stor,
            line,
            bus,
            frac,
            n_variables: registry.len(),
        }
    }
}
