//! Generator output, its split per carrier and power limits.
//!
//! `gen` is the unit's throughput. For every carrier `e` the type declares:
//!
//! ```text
//! gen_et(e) + dump_et(e) = eff(e, h) * gen
//! dump_et(e)             = eff(e, h) * dump
//! dump                   <= gen
//! ```
//!
//! A type with a capacity factor follows it exactly (`gen = cap * cf * pu`);
//! any other type is dispatchable between `cap * min_pu` and `cap * pu`.

use super::variables::ModelVariables;
use super::{ModelContext, ModelError};
use good_lp::constraint;

pub(super) fn add_constraints(ctx: &mut ModelContext, vars: &ModelVariables) -> Result<(), ModelError> {
    let indices = ctx.indices;
    let params = ctx.params;

    for g in indices.gen.ord() {
        let name = &indices.gen.mapping[g];
        let t = params.gen.tgen[g];
        let pu = &params.tgen.power_utilization[t];
        let min_pu = params.tgen.minimal_power_utilization.get(&t);
        let availability = match params.tgen.capacity_factor.get(&t) {
            Some(&cf) => Some(params.cf.get(cf).ok_or_else(|| {
                ModelError::MissingIndex(format!("capacity factor {cf} of generator {name}"))
            })?),
            None => None,
        };

        for h in indices.h.ord() {
            for y in indices.y.ord() {
                let gen = ctx.registry.var(vars.gen.gen[g][h][y]);
                let dump = ctx.registry.var(vars.gen.dump[g][h][y]);
                let cap = ctx.registry.var(vars.gen.cap[g][y]);

                for (&e, gen_et) in &vars.gen.gen_et[g] {
                    let dump_et = vars.gen.dump_et[g].get(&e).ok_or_else(|| {
                        ModelError::MissingIndex(format!("dump_et[{e}] of generator {name}"))
                    })?;
                    let eff = params.tgen.efficiency[t]
                        .get(&e)
                        .and_then(|series| series.get(h))
                        .copied()
                        .ok_or_else(|| {
                            ModelError::MissingIndex(format!("efficiency[{e}] of generator {name}"))
                        })?;
                    let gen_et = ctx.registry.var(gen_et[h][y]);
                    let dump_et = ctx.registry.var(dump_et[h][y]);
                    ctx.constraints.add(
                        format!("gen[{name}]:partition[e={e},h={h},y={y}]"),
                        constraint!(gen_et + dump_et == eff * gen),
                    );
                    ctx.constraints.add(
                        format!("gen[{name}]:dump_partition[e={e},h={h},y={y}]"),
                        constraint!(dump_et == eff * dump),
                    );
                }
                ctx.constraints.add(
                    format!("gen[{name}]:dump_le_gen[h={h},y={y}]"),
                    constraint!(dump <= gen),
                );

                match availability {
                    Some(profile) => {
                        let factor = profile[h] * pu[h];
                        ctx.constraints.add(
                            format!("gen[{name}]:non_dispatchable[h={h},y={y}]"),
                            constraint!(gen == factor * cap),
                        );
                    }
                    None => {
                        ctx.constraints.add(
                            format!("gen[{name}]:max_power[h={h},y={y}]"),
                            constraint!(gen <= pu[h] * cap),
                        );
                        if let Some(min_pu) = min_pu {
                            ctx.constraints.add(
                                format!("gen[{name}]:min_power[h={h},y={y}]"),
                                constraint!(gen >= min_pu[h] * cap),
                            );
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
