//! Shares of aggregated consumer demand served by each local balancing stack.
//!
//! The base fraction describes year 0 and is pinned only when the sample
//! contains it; a sample starting later leaves its first year free within the
//! bounds.

use super::variables::ModelVariables;
use super::{ModelContext, ModelError};
use good_lp::{constraint, Expression};

pub(super) fn add_constraints(ctx: &mut ModelContext, vars: &ModelVariables) -> Result<(), ModelError> {
    let indices = ctx.indices;
    let params = ctx.params;

    for (&a, stacks) in &indices.aggr_lbs_map {
        if stacks.is_empty() {
            continue;
        }
        let aggr_name = &indices.aggr.mapping[a];
        for y in indices.y.ord() {
            let mut total = Expression::from(0.0);
            for &lbs in stacks {
                let frac = vars.frac.frac.get(&(a, lbs)).ok_or_else(|| {
                    ModelError::MissingIndex(format!("fraction of stack {lbs} in {aggr_name}"))
                })?;
                total += ctx.registry.var(frac[y]);
            }
            ctx.constraints
                .add(format!("frac[{aggr_name}]:sum[y={y}]"), constraint!(total == 1.0));
        }

        let base_year = indices.y.get(&0usize);
        for &lbs in stacks {
            let lbs_name = &indices.lbs.mapping[lbs];
            let Some(frac) = vars.frac.frac.get(&(a, lbs)) else {
                continue;
            };
            let tag = format!("frac[{aggr_name},{lbs_name}]");
            if let Some(y0) = base_year {
                let base = params.aggr.base_fraction[a].get(&lbs).copied().unwrap_or(0.0);
                let first = Expression::from(ctx.registry.var(frac[y0]));
                ctx.constraints
                    .add(format!("{tag}:base"), constraint!(first == base));
            }

            let bound = |bounds: &std::collections::BTreeMap<usize, Vec<Option<f64>>>, y: usize| {
                bounds.get(&lbs).and_then(|series| series.get(y).copied().flatten())
            };
            for y in indices.y.ord() {
                let current = ctx.registry.var(frac[y]);
                if let Some(min) = bound(&params.aggr.min_fraction[a], y) {
                    let current = Expression::from(current);
                    ctx.constraints
                        .add(format!("{tag}:min[y={y}]"), constraint!(current >= min));
                }
                if let Some(max) = bound(&params.aggr.max_fraction[a], y) {
                    let current = Expression::from(current);
                    ctx.constraints
                        .add(format!("{tag}:max[y={y}]"), constraint!(current <= max));
                }
                if y == 0 {
                    continue;
                }
                let previous = ctx.registry.var(frac[y - 1]);
                if let Some(inc) = bound(&params.aggr.max_fraction_increase[a], y) {
                    ctx.constraints.add(
                        format!("{tag}:increase[y={y}]"),
                        constraint!(current - previous <= inc),
                    );
                }
                if let Some(dec) = bound(&params.aggr.max_fraction_decrease[a], y) {
                    ctx.constraints.add(
                        format!("{tag}:decrease[y={y}]"),
                        constraint!(previous - current <= dec),
                    );
                }
            }
        }
    }
    Ok(())
}
