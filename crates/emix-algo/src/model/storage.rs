//! Storage state of charge and power limits.

use super::variables::ModelVariables;
use super::{ModelContext, ModelError};
use good_lp::{constraint, Expression};

pub(super) fn add_constraints(ctx: &mut ModelContext, vars: &ModelVariables) -> Result<(), ModelError> {
    let indices = ctx.indices;
    let params = ctx.params;
    let n_hours = indices.h.len();

    for s in indices.stor.ord() {
        let name = &indices.stor.mapping[s];
        let t = params.stor.tstor[s];
        let retention = 1.0 - params.tstor.energy_loss[t];
        let load_eff = params.tstor.load_eff[t];
        let gen_eff = params.tstor.gen_eff[t];
        if gen_eff <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "generation efficiency of storage type {} must be positive",
                indices.tstor.mapping[t]
            )));
        }
        let power = params.tstor.power_to_capacity[t] * params.tstor.power_utilization[t];
        let soc = &vars.stor.soc[s];
        let gen = &vars.stor.gen[s];
        let load = &vars.stor.load[s];

        for y in indices.y.ord() {
            let cap = ctx.registry.var(vars.stor.cap[s][y]);
            for h in indices.h.ord() {
                let soc_now = ctx.registry.var(soc[h][y]);
                // previous hour, wrapping to the last hour of the previous year
                let prev = if h > 0 {
                    Some((h - 1, y))
                } else if y > 0 {
                    Some((n_hours - 1, y - 1))
                } else {
                    None
                };
                match prev {
                    Some((ph, py)) => {
                        let rhs: Expression = retention * ctx.registry.var(soc[ph][py])
                            + load_eff * ctx.registry.var(load[ph][py])
                            - (1.0 / gen_eff) * ctx.registry.var(gen[ph][py]);
                        ctx.constraints.add(
                            format!("stor[{name}]:soc[h={h},y={y}]"),
                            constraint!(soc_now == rhs),
                        );
                    }
                    None => {
                        let initial = Expression::from(soc_now);
                        ctx.constraints
                            .add(format!("stor[{name}]:soc_initial"), constraint!(initial == 0.0));
                    }
                }

                ctx.constraints.add(
                    format!("stor[{name}]:soc_le_cap[h={h},y={y}]"),
                    constraint!(soc_now <= cap),
                );
                let gen_now = ctx.registry.var(gen[h][y]);
                let load_now = ctx.registry.var(load[h][y]);
                ctx.constraints.add(
                    format!("stor[{name}]:gen_power[h={h},y={y}]"),
                    constraint!(gen_now <= power * cap),
                );
                ctx.constraints.add(
                    format!("stor[{name}]:load_power[h={h},y={y}]"),
                    constraint!(load_now <= power * cap),
                );
            }
        }
    }
    Ok(())
}
