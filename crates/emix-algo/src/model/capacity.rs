//! Capacity evolution across overlapping build and life windows.
//!
//! With life time `lt` and build time `bt`, capacity committed in year `s`
//! becomes available in `s + bt` and retires after `s + bt + lt - 1`:
//!
//! ```text
//! cap(y) = initial(y) + sum_{s in S(y)} plus(s) - sum_{s in S(y)} sum_{t in T(y,s)} minus(s,t)
//! initial(y) = base_cap - sum_{s=1..=y} base_minus(s)   if y < lt, else 0
//! ```

use super::variables::{ModelVariables, VarId, VariableRegistry};
use super::{ModelContext, ModelError};
use crate::preprocessing::parameters::CapacityBoundParameters;
use good_lp::{constraint, Expression};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// Years whose commitments are available in `y`: `max(0, y-lt-bt+1) ..= y-bt`
pub fn s_range(y: usize, lt: usize, bt: usize) -> Range<usize> {
    if y < bt {
        return 0..0;
    }
    let lo = (y + 1).saturating_sub(lt + bt);
    lo..(y - bt + 1)
}

/// Years in which capacity committed in `s` may be retired early, up to `y`:
/// `s+bt ..= min(y, s+bt+lt-1)`
pub fn t_range(y: usize, s: usize, lt: usize, bt: usize) -> Range<usize> {
    let lo = s + bt;
    let hi = (y + 1).min(s + bt + lt);
    if hi <= lo {
        return lo..lo;
    }
    lo..hi
}

/// Decomposition variables of one capacity owner
#[derive(Debug, Clone, Default)]
pub struct CapacityEvolution {
    pub base_cap: f64,
    pub lt: usize,
    pub bt: usize,
    /// Commitment year -> new capacity, only where it can become available
    pub plus: BTreeMap<usize, VarId>,
    /// (commitment year, retirement year) -> early retirement
    pub minus: BTreeMap<(usize, usize), VarId>,
    /// Year (from 1) -> retirement of base capacity
    pub base_minus: BTreeMap<usize, VarId>,
}

impl CapacityEvolution {
    pub fn new(
        registry: &mut VariableRegistry,
        base_cap: f64,
        lt: usize,
        bt: usize,
        n_years: usize,
    ) -> Self {
        let mut evolution = Self {
            base_cap,
            lt,
            bt,
            ..Self::default()
        };
        for s in 0..n_years {
            if s + bt >= n_years {
                break;
            }
            evolution.plus.insert(s, registry.non_negative());
            for t in (s + bt)..(s + bt + lt).min(n_years) {
                evolution.minus.insert((s, t), registry.non_negative());
            }
        }
        for y in 1..n_years {
            evolution.base_minus.insert(y, registry.non_negative());
        }
        evolution
    }

    /// Right-hand side of the capacity recurrence for year `y`
    pub fn capacity_expr(&self, registry: &VariableRegistry, y: usize) -> Expression {
        let mut expr = Expression::from(0.0);
        if y < self.lt {
            expr += self.base_cap;
            for s in 1..=y {
                if let Some(&v) = self.base_minus.get(&s) {
                    expr -= registry.var(v);
                }
            }
        }
        for s in s_range(y, self.lt, self.bt) {
            if let Some(&v) = self.plus.get(&s) {
                expr += registry.var(v);
            }
            for t in t_range(y, s, self.lt, self.bt) {
                if let Some(&v) = self.minus.get(&(s, t)) {
                    expr -= registry.var(v);
                }
            }
        }
        expr
    }

    pub fn plus_expr(&self, registry: &VariableRegistry, y: usize) -> Expression {
        match self.plus.get(&y) {
            Some(&v) => Expression::from(registry.var(v)),
            None => Expression::from(0.0),
        }
    }

    fn add_constraints(&self, ctx: &mut ModelContext, cap: &[VarId], tag: &str) {
        for (y, &c) in cap.iter().enumerate() {
            let rhs = self.capacity_expr(&ctx.registry, y);
            let cap_var = ctx.registry.var(c);
            ctx.constraints
                .add(format!("{tag}:evolution[y={y}]"), constraint!(cap_var == rhs));
        }
        for (&s, &plus) in &self.plus {
            let mut retired = Expression::from(0.0);
            for (_, &m) in self.minus.range((s, 0)..(s + 1, 0)) {
                retired += ctx.registry.var(m);
            }
            let plus_var = ctx.registry.var(plus);
            ctx.constraints
                .add(format!("{tag}:minus_le_plus[s={s}]"), constraint!(retired <= plus_var));
        }
        if !self.base_minus.is_empty() {
            let mut retired = Expression::from(0.0);
            for &v in self.base_minus.values() {
                retired += ctx.registry.var(v);
            }
            ctx.constraints
                .add(format!("{tag}:base_minus_le_base_cap"), constraint!(retired <= self.base_cap));
        }
    }
}

/// Unit-level view shared by generators and storages
struct UnitFamily<'a> {
    kind: &'static str,
    names: &'a [String],
    type_names: &'a [String],
    unit_type: &'a [usize],
    unit_bounds: &'a [CapacityBoundParameters],
    type_bounds: &'a [CapacityBoundParameters],
    cap: &'a [Vec<VarId>],
    evolution: &'a BTreeMap<usize, CapacityEvolution>,
    tcap: &'a BTreeMap<(usize, usize), Vec<VarId>>,
    tevolution: &'a BTreeMap<(usize, usize), CapacityEvolution>,
    aggr_units: &'a BTreeMap<usize, BTreeSet<usize>>,
    lbs_units: &'a BTreeMap<usize, BTreeSet<usize>>,
    min_device_nom_power: &'a [Option<f64>],
    max_device_nom_power: &'a [Option<f64>],
}

fn bound_constraints(
    ctx: &mut ModelContext,
    tag: &str,
    expr: &Expression,
    min: Option<f64>,
    max: Option<f64>,
) {
    if let Some(min) = min {
        ctx.constraints
            .add(format!("{tag}:min"), constraint!(expr.clone() >= min));
    }
    if let Some(max) = max {
        ctx.constraints
            .add(format!("{tag}:max"), constraint!(expr.clone() <= max));
    }
}

fn add_family(ctx: &mut ModelContext, family: &UnitFamily) -> Result<(), ModelError> {
    let kind = family.kind;
    for (&u, evolution) in family.evolution {
        let cap = family
            .cap
            .get(u)
            .ok_or_else(|| ModelError::MissingIndex(format!("{kind} capacity of unit {u}")))?;
        evolution.add_constraints(ctx, cap, &format!("{kind}[{}]", family.names[u]));
    }

    for (&(a, t), evolution) in family.tevolution {
        let tcap = family
            .tcap
            .get(&(a, t))
            .ok_or_else(|| ModelError::MissingIndex(format!("{kind} tcap of ({a}, {t})")))?;
        let tag = format!("{kind}_aggr[{a},{}]", family.type_names[t]);
        evolution.add_constraints(ctx, tcap, &tag);

        let members: Vec<usize> = family
            .aggr_units
            .get(&a)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&u| family.unit_type[u] == t)
            .collect();
        for (y, &tc) in tcap.iter().enumerate() {
            let mut sum = Expression::from(0.0);
            for &u in &members {
                sum += ctx.registry.var(family.cap[u][y]);
            }
            let tcap_var = ctx.registry.var(tc);
            ctx.constraints
                .add(format!("{tag}:conservation[y={y}]"), constraint!(sum == tcap_var));
        }
    }

    for (u, bounds) in family.unit_bounds.iter().enumerate() {
        for (y, &c) in family.cap[u].iter().enumerate() {
            let expr = Expression::from(ctx.registry.var(c));
            let tag = format!("{kind}[{}]:cap_bound[y={y}]", family.names[u]);
            bound_constraints(ctx, &tag, &expr, bounds.min_capacity[y], bounds.max_capacity[y]);
        }
        if let Some(evolution) = family.evolution.get(&u) {
            for y in 0..family.cap[u].len() {
                let expr = evolution.plus_expr(&ctx.registry, y);
                let tag = format!("{kind}[{}]:increase_bound[y={y}]", family.names[u]);
                bound_constraints(
                    ctx,
                    &tag,
                    &expr,
                    bounds.min_capacity_increase[y],
                    bounds.max_capacity_increase[y],
                );
            }
        }
    }

    for (t, bounds) in family.type_bounds.iter().enumerate() {
        let units: Vec<usize> = (0..family.unit_type.len())
            .filter(|&u| family.unit_type[u] == t)
            .collect();
        let n_years = bounds.min_capacity.len();
        for y in 0..n_years {
            let mut total = Expression::from(0.0);
            for &u in &units {
                total += ctx.registry.var(family.cap[u][y]);
            }
            let tag = format!("{kind}_type[{}]:cap_bound[y={y}]", family.type_names[t]);
            bound_constraints(ctx, &tag, &total, bounds.min_capacity[y], bounds.max_capacity[y]);

            let mut increase = Expression::from(0.0);
            for &u in &units {
                if let Some(evolution) = family.evolution.get(&u) {
                    increase += evolution.plus_expr(&ctx.registry, y);
                }
            }
            for (&(_, pair_type), evolution) in family.tevolution {
                if pair_type == t {
                    increase += evolution.plus_expr(&ctx.registry, y);
                }
            }
            let tag = format!("{kind}_type[{}]:increase_bound[y={y}]", family.type_names[t]);
            bound_constraints(
                ctx,
                &tag,
                &increase,
                bounds.min_capacity_increase[y],
                bounds.max_capacity_increase[y],
            );
        }
    }
    Ok(())
}

/// Local units hold between `min` and `max` device power for every consumer
/// their stacks serve: `dnp * sum_lbs n_consumers(a, y) * frac(a, lbs, y)`
fn add_device_power_bounds(
    ctx: &mut ModelContext,
    family: &UnitFamily,
    fractions: &BTreeMap<(usize, usize), Vec<VarId>>,
) -> Result<(), ModelError> {
    let indices = ctx.indices;
    let params = ctx.params;
    let kind = family.kind;
    for u in 0..family.names.len() {
        let min = family.min_device_nom_power.get(u).copied().flatten();
        let max = family.max_device_nom_power.get(u).copied().flatten();
        if min.is_none() && max.is_none() {
            continue;
        }
        let served: Vec<(usize, usize)> = indices
            .aggr_lbs_map
            .iter()
            .flat_map(|(&a, stacks)| stacks.iter().map(move |&lbs| (a, lbs)))
            .filter(|(_, lbs)| family.lbs_units.get(lbs).is_some_and(|units| units.contains(&u)))
            .collect();
        for (y, &c) in family.cap[u].iter().enumerate() {
            if served.is_empty() {
                break;
            }
            let mut consumers = Expression::from(0.0);
            for &(a, lbs) in &served {
                let frac = fractions.get(&(a, lbs)).ok_or_else(|| {
                    ModelError::MissingIndex(format!("fraction of stack {lbs} in aggregated consumer {a}"))
                })?;
                consumers += params.aggr.n_consumers[a][y] * ctx.registry.var(frac[y]);
            }
            let cap = ctx.registry.var(c);
            let tag = format!("{kind}[{}]:device_power[y={y}]", family.names[u]);
            if let Some(min) = min {
                ctx.constraints
                    .add(format!("{tag}:min"), constraint!(cap >= min * consumers.clone()));
            }
            if let Some(max) = max {
                ctx.constraints
                    .add(format!("{tag}:max"), constraint!(cap <= max * consumers.clone()));
            }
        }
    }
    Ok(())
}

/// Bound generators decommission base capacity in proportion to their size
fn add_generator_binding(ctx: &mut ModelContext, vars: &ModelVariables) {
    let params = ctx.params;
    let indices = ctx.indices;
    for (binding, units) in &params.gen.bindings {
        let global: Vec<usize> = units
            .iter()
            .copied()
            .filter(|u| vars.gen.evolution.contains_key(u))
            .collect();
        if global.len() < units.len() {
            tracing::warn!(binding = %binding, "binding includes local generators, which are left unbound");
        }
        let Some((&reference, others)) = global.split_first() else {
            continue;
        };
        let ref_cap = params.gen.base_cap[reference];
        for &u in others {
            let u_cap = params.gen.base_cap[u];
            let (Some(ref_ev), Some(u_ev)) =
                (vars.gen.evolution.get(&reference), vars.gen.evolution.get(&u))
            else {
                continue;
            };
            for (&y, &u_bm) in &u_ev.base_minus {
                let Some(&ref_bm) = ref_ev.base_minus.get(&y) else {
                    continue;
                };
                let lhs = ref_cap * ctx.registry.var(u_bm);
                let rhs = u_cap * ctx.registry.var(ref_bm);
                ctx.constraints.add(
                    format!("binding[{binding}]:{}[y={y}]", indices.gen.mapping[u]),
                    constraint!(lhs == rhs),
                );
            }
        }
    }
}

pub(super) fn add_constraints(ctx: &mut ModelContext, vars: &ModelVariables) -> Result<(), ModelError> {
    let indices = ctx.indices;
    let params = ctx.params;
    let generators = UnitFamily {
        kind: "gen",
        names: &indices.gen.mapping,
        type_names: &indices.tgen.mapping,
        unit_type: &params.gen.tgen,
        unit_bounds: &params.gen.bounds,
        type_bounds: &params.tgen.bounds,
        cap: &vars.gen.cap,
        evolution: &vars.gen.evolution,
        tcap: &vars.gen.tcap,
        tevolution: &vars.gen.tevolution,
        aggr_units: &indices.aggr_gen_map,
        lbs_units: &indices.lbs_gen_map,
        min_device_nom_power: &params.gen.min_device_nom_power,
        max_device_nom_power: &params.gen.max_device_nom_power,
    };
    add_family(ctx, &generators)?;
    add_device_power_bounds(ctx, &generators, &vars.frac.frac)?;

    let storages = UnitFamily {
        kind: "stor",
        names: &indices.stor.mapping,
        type_names: &indices.tstor.mapping,
        unit_type: &params.stor.tstor,
        unit_bounds: &params.stor.bounds,
        type_bounds: &params.tstor.bounds,
        cap: &vars.stor.cap,
        evolution: &vars.stor.evolution,
        tcap: &vars.stor.tcap,
        tevolution: &vars.stor.tevolution,
        aggr_units: &indices.aggr_stor_map,
        lbs_units: &indices.lbs_stor_map,
        min_device_nom_power: &params.stor.min_device_nom_power,
        max_device_nom_power: &params.stor.max_device_nom_power,
    };
    add_family(ctx, &storages)?;
    add_device_power_bounds(ctx, &storages, &vars.frac.frac)?;

    add_generator_binding(ctx, vars);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s_range() {
        assert_eq!(s_range(0, 3, 0), 0..1);
        assert_eq!(s_range(4, 3, 0), 2..5);
        assert_eq!(s_range(4, 3, 1), 1..4);
        assert!(s_range(0, 3, 1).is_empty());
    }

    #[test]
    fn test_t_range() {
        assert_eq!(t_range(4, 1, 3, 1), 2..5);
        assert_eq!(t_range(2, 1, 3, 1), 2..3);
        assert_eq!(t_range(10, 1, 3, 1), 2..5);
        assert!(t_range(1, 1, 3, 1).is_empty());
    }

    #[test]
    fn test_evolution_variables_within_horizon() {
        let mut registry = VariableRegistry::new();
        let ev = CapacityEvolution::new(&mut registry, 10.0, 2, 1, 4);

        assert_eq!(ev.plus.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(ev.minus.keys().all(|&(s, t)| s + 1 <= t && t <= s + 2 && t < 4));
        assert_eq!(ev.base_minus.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(registry.len(), ev.plus.len() + ev.minus.len() + ev.base_minus.len());
    }
}
