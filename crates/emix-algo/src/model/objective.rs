//! Total system cost.
//!
//! Every year term is weighted by `discount_factor(y) * year_weight(y)`;
//! per-hour terms are additionally multiplied by the hourly scale.
//! Generation compensation is charged on delivered energy (`gen_et`), so a
//! negative compensation acts as a subsidy.

use super::capacity::{s_range, CapacityEvolution};
use super::variables::ModelVariables;
use super::{ModelContext, ModelError};
use crate::preprocessing::ModelParameters;
use good_lp::Expression;

/// Straight-line annuity: `capex(s) / lt` for every year the commitment is live
fn add_capex(
    expr: &mut Expression,
    ctx: &ModelContext,
    evolution: &CapacityEvolution,
    capex: &[f64],
    year_factor: &[f64],
) {
    let lt = evolution.lt.max(1) as f64;
    for (y, factor) in year_factor.iter().enumerate() {
        for s in s_range(y, evolution.lt, evolution.bt) {
            if let Some(&plus) = evolution.plus.get(&s) {
                *expr += (factor * capex[s] / lt) * ctx.registry.var(plus);
            }
        }
    }
}

pub(super) fn build_objective(ctx: &ModelContext, vars: &ModelVariables) -> Result<Expression, ModelError> {
    let indices = ctx.indices;
    let params = ctx.params;
    let scenario = &params.scenario;
    let hourly_scale = scenario.hourly_scale;
    let year_factor: Vec<f64> = indices
        .y
        .ord()
        .map(|y| scenario.discount_factor[y] * scenario.year_weights[y])
        .collect();

    let mut objective = Expression::from(0.0);

    // capital
    for (&g, evolution) in &vars.gen.evolution {
        add_capex(&mut objective, ctx, evolution, &params.tgen.capex[params.gen.tgen[g]], &year_factor);
    }
    for (&(_, t), evolution) in &vars.gen.tevolution {
        add_capex(&mut objective, ctx, evolution, &params.tgen.capex[t], &year_factor);
    }
    for (&s, evolution) in &vars.stor.evolution {
        add_capex(&mut objective, ctx, evolution, &params.tstor.capex[params.stor.tstor[s]], &year_factor);
    }
    for (&(_, t), evolution) in &vars.stor.tevolution {
        add_capex(&mut objective, ctx, evolution, &params.tstor.capex[t], &year_factor);
    }

    // operating
    for g in indices.gen.ord() {
        let opex = &params.tgen.opex[params.gen.tgen[g]];
        for (y, factor) in year_factor.iter().enumerate() {
            objective += (factor * opex[y]) * ctx.registry.var(vars.gen.cap[g][y]);
        }
    }
    for s in indices.stor.ord() {
        let opex = &params.tstor.opex[params.stor.tstor[s]];
        for (y, factor) in year_factor.iter().enumerate() {
            objective += (factor * opex[y]) * ctx.registry.var(vars.stor.cap[s][y]);
        }
    }

    // fuel and emission fees
    for g in indices.gen.ord() {
        let t = params.gen.tgen[g];
        let Some(&f) = params.tgen.fuel.get(&t) else {
            continue;
        };
        let energy_per_unit = params.fuel.energy_per_unit[f];
        if energy_per_unit <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "energy per unit of fuel {} must be positive",
                indices.fuel.mapping[f]
            )));
        }
        for (y, factor) in year_factor.iter().enumerate() {
            let mut per_unit = params.fuel.cost[f][y] / energy_per_unit;
            for &fee in &params.gen.emission_fees[g] {
                let em = params.em_fee.emission_type[fee];
                per_unit += params.em_fee.price[fee][y] * emission_rate(params, g, em, y);
            }
            if per_unit == 0.0 {
                continue;
            }
            let coef = hourly_scale * factor * per_unit;
            for h in indices.h.ord() {
                objective += coef * ctx.registry.var(vars.gen.gen[g][h][y]);
            }
        }
    }

    // generation compensation
    for g in indices.gen.ord() {
        let Some(compensation) = params.tgen.generation_compensation.get(&params.gen.tgen[g]) else {
            continue;
        };
        for (y, factor) in year_factor.iter().enumerate() {
            let coef = hourly_scale * factor * compensation[y];
            for gen_et in vars.gen.gen_et[g].values() {
                for row in gen_et {
                    objective += coef * ctx.registry.var(row[y]);
                }
            }
        }
    }

    // energy not served
    for ens in vars.bus.ens.values() {
        for h in indices.h.ord() {
            for (y, factor) in year_factor.iter().enumerate() {
                objective += (hourly_scale * factor * scenario.ens_penalty) * ctx.registry.var(ens[h][y]);
            }
        }
    }

    // transmission fees
    for (&l, &tf) in &params.line.tf {
        let fee = &params.tf[tf];
        for h in indices.h.ord() {
            for (y, factor) in year_factor.iter().enumerate() {
                objective += (hourly_scale * factor * fee[h]) * ctx.registry.var(vars.line.flow[l][h][y]);
            }
        }
    }

    // demand-side response
    for (&b, &d) in &params.bus.dsr_type {
        let Some(minus) = vars.bus.shift_minus.get(&b) else {
            continue;
        };
        let penalization = params.dsr.penalization[d];
        for h in indices.h.ord() {
            for (y, factor) in year_factor.iter().enumerate() {
                objective += (hourly_scale * factor * penalization) * ctx.registry.var(minus[h][y]);
            }
        }
    }

    Ok(objective)
}

/// Emission of `em` per unit of generator throughput in sampled year `y`
pub fn emission_rate(params: &ModelParameters, g: usize, em: usize, y: usize) -> f64 {
    let t = params.gen.tgen[g];
    let Some(&f) = params.tgen.fuel.get(&t) else {
        return 0.0;
    };
    let energy_per_unit = params.fuel.energy_per_unit[f];
    if energy_per_unit <= 0.0 {
        return 0.0;
    }
    let emission = params.fuel.emission[f].get(&em).copied().unwrap_or(0.0);
    let reduction = params.tgen.emission_reduction[t]
        .get(&em)
        .map(|series| series[y])
        .unwrap_or(0.0);
    emission / energy_per_unit * (1.0 - reduction)
}
