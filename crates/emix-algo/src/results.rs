//! Solved values reshaped into name-keyed tables.
//!
//! Rows and columns carry the original hour and year labels of the sample,
//! so a table can be joined back against the unsampled inputs.

use crate::model::objective::emission_rate;
use crate::model::{CapacityEvolution, HourYear, ModelVariables, VarId};
use crate::preprocessing::{Indices, IndexingSet, ModelParameters};
use crate::solver::{SolveOutcome, SolveStatus};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResultsError {
    #[error("no solution to read back (status: {0})")]
    NotOptimal(SolveStatus),
    #[error("solution has {found} values, model has {expected} variables")]
    ValueCount { expected: usize, found: usize },
}

/// Hour-by-year values of one element, row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourYearTable {
    pub hours: Vec<usize>,
    pub years: Vec<usize>,
    values: Vec<f64>,
}

impl HourYearTable {
    pub fn zeros(hours: &[usize], years: &[usize]) -> Self {
        Self {
            hours: hours.to_vec(),
            years: years.to_vec(),
            values: vec![0.0; hours.len() * years.len()],
        }
    }

    fn read(hours: &[usize], years: &[usize], grid: &HourYear, values: &[f64]) -> Self {
        let mut table = Self::zeros(hours, years);
        let ny = years.len();
        for (h, row) in grid.iter().enumerate() {
            for (y, id) in row.iter().enumerate() {
                table.values[h * ny + y] = values[id.0];
            }
        }
        table
    }

    /// Value at hour and year ordinals
    pub fn get(&self, h: usize, y: usize) -> f64 {
        self.values[h * self.years.len() + y]
    }

    /// Value at original hour and year labels
    pub fn at(&self, hour: usize, year: usize) -> Option<f64> {
        let h = self.hours.iter().position(|&l| l == hour)?;
        let y = self.years.iter().position(|&l| l == year)?;
        Some(self.get(h, y))
    }

    pub fn column(&self, y: usize) -> Vec<f64> {
        (0..self.hours.len()).map(|h| self.get(h, y)).collect()
    }

    pub fn year_total(&self, y: usize) -> f64 {
        self.column(y).iter().sum()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSeries {
    pub years: Vec<usize>,
    pub values: Vec<f64>,
}

impl YearSeries {
    fn zeros(years: &[usize]) -> Self {
        Self {
            years: years.to_vec(),
            values: vec![0.0; years.len()],
        }
    }

    fn read(years: &[usize], ids: &[VarId], values: &[f64]) -> Self {
        Self {
            years: years.to_vec(),
            values: ids.iter().map(|id| values[id.0]).collect(),
        }
    }

    pub fn get(&self, y: usize) -> f64 {
        self.values[y]
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Commitment year by retirement year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMatrix {
    pub years: Vec<usize>,
    values: Vec<f64>,
}

impl YearMatrix {
    fn zeros(years: &[usize]) -> Self {
        Self {
            years: years.to_vec(),
            values: vec![0.0; years.len() * years.len()],
        }
    }

    pub fn get(&self, s: usize, t: usize) -> f64 {
        self.values[s * self.years.len() + t]
    }

    /// Total early retirement of the capacity committed in `s`
    pub fn row_sum(&self, s: usize) -> f64 {
        let n = self.years.len();
        self.values[s * n..(s + 1) * n].iter().sum()
    }
}

/// `plus`, `minus` and `base_minus` of one capacity evolution
struct EvolutionTables {
    plus: YearSeries,
    minus: YearMatrix,
    base_minus: YearSeries,
}

impl EvolutionTables {
    fn read(years: &[usize], evolution: &CapacityEvolution, values: &[f64]) -> Self {
        let n = years.len();
        let mut plus = YearSeries::zeros(years);
        for (&s, id) in &evolution.plus {
            plus.values[s] = values[id.0];
        }
        let mut minus = YearMatrix::zeros(years);
        for (&(s, t), id) in &evolution.minus {
            minus.values[s * n + t] = values[id.0];
        }
        let mut base_minus = YearSeries::zeros(years);
        for (&y, id) in &evolution.base_minus {
            base_minus.values[y] = values[id.0];
        }
        Self {
            plus,
            minus,
            base_minus,
        }
    }
}

type Nested<T> = IndexMap<String, IndexMap<String, T>>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CapacityResults {
    pub cap: IndexMap<String, YearSeries>,
    /// Per unit outside aggregated consumers
    pub cap_plus: IndexMap<String, YearSeries>,
    pub cap_minus: IndexMap<String, YearMatrix>,
    pub cap_base_minus: IndexMap<String, YearSeries>,
    /// Aggregated consumer -> unit type
    pub tcap: Nested<YearSeries>,
    pub tcap_plus: Nested<YearSeries>,
    pub tcap_minus: Nested<YearMatrix>,
    pub tcap_base_minus: Nested<YearSeries>,
}

impl CapacityResults {
    #[allow(clippy::too_many_arguments)]
    fn read(
        years: &[usize],
        units: &IndexingSet,
        types: &IndexingSet,
        aggr: &IndexingSet,
        cap: &[Vec<VarId>],
        evolution: &BTreeMap<usize, CapacityEvolution>,
        tcap: &BTreeMap<(usize, usize), Vec<VarId>>,
        tevolution: &BTreeMap<(usize, usize), CapacityEvolution>,
        values: &[f64],
    ) -> Self {
        let mut out = Self::default();
        for (u, ids) in cap.iter().enumerate() {
            out.cap.insert(units.mapping[u].clone(), YearSeries::read(years, ids, values));
        }
        for (&u, evo) in evolution {
            let name = units.mapping[u].clone();
            let tables = EvolutionTables::read(years, evo, values);
            out.cap_plus.insert(name.clone(), tables.plus);
            out.cap_minus.insert(name.clone(), tables.minus);
            out.cap_base_minus.insert(name, tables.base_minus);
        }
        for (&(a, t), ids) in tcap {
            let (a_name, t_name) = (&aggr.mapping[a], &types.mapping[t]);
            out.tcap
                .entry(a_name.clone())
                .or_default()
                .insert(t_name.clone(), YearSeries::read(years, ids, values));
            if let Some(evo) = tevolution.get(&(a, t)) {
                let tables = EvolutionTables::read(years, evo, values);
                out.tcap_plus
                    .entry(a_name.clone())
                    .or_default()
                    .insert(t_name.clone(), tables.plus);
                out.tcap_minus
                    .entry(a_name.clone())
                    .or_default()
                    .insert(t_name.clone(), tables.minus);
                out.tcap_base_minus
                    .entry(a_name.clone())
                    .or_default()
                    .insert(t_name.clone(), tables.base_minus);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneratorsResults {
    pub gen: IndexMap<String, HourYearTable>,
    /// Generator -> energy type; every network energy type is present
    pub gen_et: Nested<HourYearTable>,
    pub dump: IndexMap<String, HourYearTable>,
    pub dump_et: Nested<HourYearTable>,
    /// Generator -> emission type -> yearly emission, hour-scaled
    pub emission: Nested<YearSeries>,
    #[serde(flatten)]
    pub capacity: CapacityResults,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoragesResults {
    pub gen: IndexMap<String, HourYearTable>,
    pub load: IndexMap<String, HourYearTable>,
    pub soc: IndexMap<String, HourYearTable>,
    #[serde(flatten)]
    pub capacity: CapacityResults,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinesResults {
    pub flow: IndexMap<String, HourYearTable>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BusesResults {
    pub ens: IndexMap<String, HourYearTable>,
    pub shift_minus: IndexMap<String, HourYearTable>,
    pub shift_plus: IndexMap<String, HourYearTable>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FractionsResults {
    /// Aggregated consumer -> stack
    pub frac: Nested<YearSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Results {
    pub generators: GeneratorsResults,
    pub storages: StoragesResults,
    pub lines: LinesResults,
    pub buses: BusesResults,
    pub fractions: FractionsResults,
    pub objective_value: f64,
}

fn read_grids(
    names: &IndexingSet,
    hours: &[usize],
    years: &[usize],
    grids: &[HourYear],
    values: &[f64],
) -> IndexMap<String, HourYearTable> {
    grids
        .iter()
        .enumerate()
        .map(|(i, grid)| (names.mapping[i].clone(), HourYearTable::read(hours, years, grid, values)))
        .collect()
}

fn read_bus_grids(
    names: &IndexingSet,
    hours: &[usize],
    years: &[usize],
    grids: &BTreeMap<usize, HourYear>,
    values: &[f64],
) -> IndexMap<String, HourYearTable> {
    grids
        .iter()
        .map(|(&b, grid)| (names.mapping[b].clone(), HourYearTable::read(hours, years, grid, values)))
        .collect()
}

fn read_per_type(
    indices: &Indices,
    grids: &[BTreeMap<usize, HourYear>],
    values: &[f64],
) -> Nested<HourYearTable> {
    let hours = indices.h.ii();
    let years = indices.y.ii();
    grids
        .iter()
        .enumerate()
        .map(|(g, per_type)| {
            let tables = indices
                .et
                .ord()
                .map(|e| {
                    let table = match per_type.get(&e) {
                        Some(grid) => HourYearTable::read(hours, years, grid, values),
                        None => HourYearTable::zeros(hours, years),
                    };
                    (indices.et.mapping[e].clone(), table)
                })
                .collect();
            (indices.gen.mapping[g].clone(), tables)
        })
        .collect()
}

fn read_emission(
    indices: &Indices,
    params: &ModelParameters,
    gen: &IndexMap<String, HourYearTable>,
) -> Nested<YearSeries> {
    let years = indices.y.ii();
    let hourly_scale = params.scenario.hourly_scale;
    gen.values()
        .enumerate()
        .map(|(g, table)| {
            let per_type = indices
                .em
                .ord()
                .map(|em| {
                    let values = indices
                        .y
                        .ord()
                        .map(|y| hourly_scale * emission_rate(params, g, em, y) * table.year_total(y))
                        .collect();
                    (
                        indices.em.mapping[em].clone(),
                        YearSeries {
                            years: years.to_vec(),
                            values,
                        },
                    )
                })
                .collect();
            (indices.gen.mapping[g].clone(), per_type)
        })
        .collect()
}

impl Results {
    pub fn from_solution(
        indices: &Indices,
        params: &ModelParameters,
        variables: &ModelVariables,
        outcome: &SolveOutcome,
    ) -> Result<Self, ResultsError> {
        if outcome.status != SolveStatus::Optimal {
            return Err(ResultsError::NotOptimal(outcome.status));
        }
        if outcome.values.len() != variables.n_variables {
            return Err(ResultsError::ValueCount {
                expected: variables.n_variables,
                found: outcome.values.len(),
            });
        }
        let values = outcome.values.as_slice();
        let hours = indices.h.ii();
        let years = indices.y.ii();

        let gen = &variables.gen;
        let gen_tables = read_grids(&indices.gen, hours, years, &gen.gen, values);
        let generators = GeneratorsResults {
            emission: read_emission(indices, params, &gen_tables),
            gen: gen_tables,
            gen_et: read_per_type(indices, &gen.gen_et, values),
            dump: read_grids(&indices.gen, hours, years, &gen.dump, values),
            dump_et: read_per_type(indices, &gen.dump_et, values),
            capacity: CapacityResults::read(
                years,
                &indices.gen,
                &indices.tgen,
                &indices.aggr,
                &gen.cap,
                &gen.evolution,
                &gen.tcap,
                &gen.tevolution,
                values,
            ),
        };

        let stor = &variables.stor;
        let storages = StoragesResults {
            gen: read_grids(&indices.stor, hours, years, &stor.gen, values),
            load: read_grids(&indices.stor, hours, years, &stor.load, values),
            soc: read_grids(&indices.stor, hours, years, &stor.soc, values),
            capacity: CapacityResults::read(
                years,
                &indices.stor,
                &indices.tstor,
                &indices.aggr,
                &stor.cap,
                &stor.evolution,
                &stor.tcap,
                &stor.tevolution,
                values,
            ),
        };

        let lines = LinesResults {
            flow: read_grids(&indices.line, hours, years, &variables.line.flow, values),
        };

        let bus = &variables.bus;
        let buses = BusesResults {
            ens: read_bus_grids(&indices.bus, hours, years, &bus.ens, values),
            shift_minus: read_bus_grids(&indices.bus, hours, years, &bus.shift_minus, values),
            shift_plus: read_bus_grids(&indices.bus, hours, years, &bus.shift_plus, values),
        };

        let mut fractions = FractionsResults::default();
        for (&(a, lbs), ids) in &variables.frac.frac {
            fractions
                .frac
                .entry(indices.aggr.mapping[a].clone())
                .or_default()
                .insert(indices.lbs.mapping[lbs].clone(), YearSeries::read(years, ids, values));
        }

        tracing::debug!(
            generators = generators.gen.len(),
            storages = storages.gen.len(),
            lines = lines.flow.len(),
            "results read back"
        );

        Ok(Self {
            generators,
            storages,
            lines,
            buses,
            fractions,
            objective_value: outcome.objective,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_year_table_layout() {
        let grid: HourYear = vec![vec![VarId(0), VarId(1)], vec![VarId(2), VarId(3)], vec![VarId(4), VarId(5)]];
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let table = HourYearTable::read(&[10, 11, 12], &[0, 3], &grid, &values);
        assert_eq!(table.get(1, 0), 3.0);
        assert_eq!(table.at(12, 3), Some(6.0));
        assert_eq!(table.at(13, 3), None);
        assert_eq!(table.column(1), vec![2.0, 4.0, 6.0]);
        assert_eq!(table.year_total(0), 9.0);
        assert_eq!(table.sum(), 21.0);
    }

    #[test]
    fn test_evolution_tables_zero_fill() {
        let mut evolution = CapacityEvolution {
            base_cap: 1.0,
            lt: 2,
            bt: 1,
            ..CapacityEvolution::default()
        };
        evolution.plus.insert(0, VarId(0));
        evolution.minus.insert((0, 1), VarId(1));
        evolution.base_minus.insert(1, VarId(2));
        let tables = EvolutionTables::read(&[0, 1], &evolution, &[5.0, 2.0, 0.5]);
        assert_eq!(tables.plus.values, vec![5.0, 0.0]);
        assert_eq!(tables.minus.get(0, 1), 2.0);
        assert_eq!(tables.minus.row_sum(0), 2.0);
        assert_eq!(tables.minus.row_sum(1), 0.0);
        assert_eq!(tables.base_minus.values, vec![0.0, 0.5]);
    }

    #[test]
    fn test_not_optimal_message() {
        let err = ResultsError::NotOptimal(SolveStatus::Infeasible);
        assert_eq!(err.to_string(), "no solution to read back (status: infeasible)");
    }
}
