//! Bus energy balance and demand-side response.
//!
//! For every bus, sampled hour and year:
//!
//! ```text
//! sum gen_et - sum gen / conversion_rate + sum (stor_gen - stor_load)
//!     + sum (1 - loss) * inflow - sum outflow + ens + shift_minus - shift_plus = demand
//! ```
//!
//! The conversion term covers units drawing their input from this bus's carrier.
//!
//! Demand sits at stack outlet buses: `usage(a, e, y) * profile(a, e, h) * frac(a, lbs, y)`.

use super::variables::{ModelVariables, VarId};
use super::{ModelContext, ModelError};
use good_lp::{constraint, Expression};

struct DemandTerm<'a> {
    usage: &'a [f64],
    profile: &'a [f64],
    frac: &'a [VarId],
}

fn demand_terms<'a>(
    ctx: &ModelContext<'a>,
    vars: &'a ModelVariables,
) -> Result<Vec<Vec<DemandTerm<'a>>>, ModelError> {
    let indices = ctx.indices;
    let params = ctx.params;
    let mut terms: Vec<Vec<DemandTerm<'a>>> = (0..indices.bus.len()).map(|_| Vec::new()).collect();

    for (&a, stacks) in &indices.aggr_lbs_map {
        let aggr_name = &indices.aggr.mapping[a];
        for &lbs in stacks {
            let frac = vars.frac.frac.get(&(a, lbs)).ok_or_else(|| {
                ModelError::MissingIndex(format!("fraction of stack {lbs} in {aggr_name}"))
            })?;
            for (&e, &bus) in &params.lbs.buses_out[lbs] {
                let Some(usage) = params.aggr.usage[a].get(&e) else {
                    continue;
                };
                let profile = params.dp[params.aggr.dp[a]].get(&e).ok_or_else(|| {
                    ModelError::MissingIndex(format!(
                        "demand profile of {aggr_name} for energy type {}",
                        indices.et.mapping[e]
                    ))
                })?;
                terms[bus].push(DemandTerm {
                    usage,
                    profile,
                    frac,
                });
            }
        }
    }
    Ok(terms)
}

fn demand_expr(ctx: &ModelContext, terms: &[DemandTerm], h: usize, y: usize) -> Expression {
    let mut demand = Expression::from(0.0);
    for term in terms {
        demand += (term.usage[y] * term.profile[h]) * ctx.registry.var(term.frac[y]);
    }
    demand
}

pub(super) fn add_constraints(ctx: &mut ModelContext, vars: &ModelVariables) -> Result<(), ModelError> {
    let indices = ctx.indices;
    let params = ctx.params;
    let demand = demand_terms(ctx, vars)?;

    for b in indices.bus.ord() {
        let name = &indices.bus.mapping[b];
        let e = params.bus.et[b];
        for h in indices.h.ord() {
            for y in indices.y.ord() {
                let mut supply = Expression::from(0.0);
                for &g in &params.bus.generators[b] {
                    if let Some(gen_et) = vars.gen.gen_et[g].get(&e) {
                        supply += ctx.registry.var(gen_et[h][y]);
                    }
                    if let Some(rate) = params.tgen.conversion_rate[params.gen.tgen[g]].get(&e) {
                        if rate[h] <= 0.0 {
                            return Err(ModelError::InvalidParameter(format!(
                                "conversion rate of generator {} must be positive",
                                indices.gen.mapping[g]
                            )));
                        }
                        supply -= (1.0 / rate[h]) * ctx.registry.var(vars.gen.gen[g][h][y]);
                    }
                }
                for &s in &params.bus.storages[b] {
                    supply += ctx.registry.var(vars.stor.gen[s][h][y]);
                    supply -= ctx.registry.var(vars.stor.load[s][h][y]);
                }
                for &l in &params.bus.lines_in[b] {
                    supply += (1.0 - params.line.loss[l]) * ctx.registry.var(vars.line.flow[l][h][y]);
                }
                for &l in &params.bus.lines_out[b] {
                    supply -= ctx.registry.var(vars.line.flow[l][h][y]);
                }
                if let Some(ens) = vars.bus.ens.get(&b) {
                    supply += ctx.registry.var(ens[h][y]);
                }
                if let (Some(minus), Some(plus)) =
                    (vars.bus.shift_minus.get(&b), vars.bus.shift_plus.get(&b))
                {
                    supply += ctx.registry.var(minus[h][y]);
                    supply -= ctx.registry.var(plus[h][y]);
                }
                let rhs = demand_expr(ctx, &demand[b], h, y);
                ctx.constraints.add(
                    format!("bus[{name}]:balance[h={h},y={y}]"),
                    constraint!(supply == rhs),
                );
            }
        }
    }

    for (&b, &d) in &params.bus.dsr_type {
        let name = &indices.bus.mapping[b];
        let (Some(minus), Some(plus)) = (vars.bus.shift_minus.get(&b), vars.bus.shift_plus.get(&b))
        else {
            return Err(ModelError::MissingIndex(format!("shift variables of bus {name}")));
        };
        let compensation = 1.0 + params.dsr.compensation_factor[d];
        let period_len = params.dsr.balancing_period_len[d];
        let hours: Vec<usize> = indices.h.ord().collect();

        for y in indices.y.ord() {
            for (period, chunk) in hours.chunks(period_len).enumerate() {
                let mut shifted_in = Expression::from(0.0);
                let mut shifted_out = Expression::from(0.0);
                for &h in chunk {
                    shifted_in += ctx.registry.var(plus[h][y]);
                    shifted_out += compensation * ctx.registry.var(minus[h][y]);
                }
                ctx.constraints.add(
                    format!("dsr[{name}]:period[p={period},y={y}]"),
                    constraint!(shifted_in == shifted_out),
                );
            }
            for h in indices.h.ord() {
                let shift = Expression::from(ctx.registry.var(minus[h][y]));
                if let Some(rel) = params.dsr.relative_shift_limit[d] {
                    let limit = rel * demand_expr(ctx, &demand[b], h, y);
                    ctx.constraints.add(
                        format!("dsr[{name}]:relative_limit[h={h},y={y}]"),
                        constraint!(shift.clone() <= limit),
                    );
                }
                if let Some(abs) = params.dsr.abs_shift_limit[d] {
                    ctx.constraints.add(
                        format!("dsr[{name}]:abs_limit[h={h},y={y}]"),
                        constraint!(shift.clone() <= abs),
                    );
                }
            }
        }
    }
    Ok(())
}
