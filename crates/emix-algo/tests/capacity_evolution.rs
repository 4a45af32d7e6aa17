//! Capacity recurrence, conservation and retirement limits on solved runs

mod common;

use common::{assert_close, half_day_config, results, solve, TOL};
use emix_algo::model::{s_range, t_range};
use emix_algo::test_utils::NetworkFixture;
use emix_algo::{YearMatrix, YearSeries};

/// `initial(y) + sum plus - sum minus` over the sampled years
fn recurrence(
    base_cap: f64,
    lt: usize,
    bt: usize,
    y: usize,
    plus: &YearSeries,
    minus: &YearMatrix,
    base_minus: &YearSeries,
) -> f64 {
    let mut cap = 0.0;
    if y < lt {
        cap += base_cap - (1..=y).map(|s| base_minus.get(s)).sum::<f64>();
    }
    for s in s_range(y, lt, bt) {
        cap += plus.get(s);
        for t in t_range(y, s, lt, bt) {
            cap -= minus.get(s, t);
        }
    }
    cap
}

#[test]
fn test_global_unit_recurrence() {
    let network = NetworkFixture::default().build().unwrap();
    let run = solve(&network, &half_day_config(&network));
    let capacity = &results(&run).generators.capacity;

    for name in ["pp_coal_grid", "pv_grid"] {
        let unit = &network.generators[name];
        let gen_type = &network.generator_types[&unit.energy_source_type];
        let cap = &capacity.cap[name];
        let plus = &capacity.cap_plus[name];
        let minus = &capacity.cap_minus[name];
        let base_minus = &capacity.cap_base_minus[name];

        assert_eq!(base_minus.get(0), 0.0);
        for y in 0..network.constants.n_years {
            let expected = recurrence(
                unit.unit_base_cap,
                gen_type.life_time,
                gen_type.build_time,
                y,
                plus,
                minus,
                base_minus,
            );
            assert_close(cap.get(y), expected, &format!("{name} cap[{y}]"));
        }
    }
}

#[test]
fn test_aggregated_pair_recurrence_and_conservation() {
    let network = NetworkFixture::default().build().unwrap();
    let run = solve(&network, &half_day_config(&network));
    let capacity = &results(&run).generators.capacity;

    let chp = &network.generator_types["chp"];
    let tcap = &capacity.tcap["town"]["chp"];
    let plus = &capacity.tcap_plus["town"]["chp"];
    let minus = &capacity.tcap_minus["town"]["chp"];
    let base_minus = &capacity.tcap_base_minus["town"]["chp"];

    assert_eq!(base_minus.get(0), 0.0);
    for y in 0..network.constants.n_years {
        let expected = recurrence(100.0, chp.life_time, chp.build_time, y, plus, minus, base_minus);
        assert_close(tcap.get(y), expected, &format!("tcap[{y}]"));
        // the only chp unit of the town carries the whole pair capacity
        assert_close(capacity.cap["chp_local"].get(y), tcap.get(y), &format!("conservation[{y}]"));
    }

    // base capacity retires after its life time, so later years must build
    let late_build: f64 = (0..network.constants.n_years).map(|s| plus.get(s)).sum();
    assert!(late_build > 1.0, "expected new chp capacity, got {late_build}");
    assert!(!capacity.cap_plus.contains_key("chp_local"));
}

#[test]
fn test_retirement_never_exceeds_build() {
    let network = NetworkFixture::default().build().unwrap();
    let run = solve(&network, &half_day_config(&network));
    let capacity = &results(&run).generators.capacity;
    let n_years = network.constants.n_years;

    for (name, plus) in &capacity.cap_plus {
        let minus = &capacity.cap_minus[name];
        for s in 0..n_years {
            assert!(minus.row_sum(s) <= plus.get(s) + TOL, "{name} s={s}");
        }
    }
    for (aggr, per_type) in &capacity.tcap_plus {
        for (t, plus) in per_type {
            let minus = &capacity.tcap_minus[aggr][t];
            for s in 0..n_years {
                assert!(minus.row_sum(s) <= plus.get(s) + TOL, "{aggr}/{t} s={s}");
            }
        }
    }
}

#[test]
fn test_build_time_delays_availability() {
    let network = NetworkFixture::default().build().unwrap();
    let run = solve(&network, &half_day_config(&network));
    let capacity = &results(&run).generators.capacity;

    // pv takes a year to build: nothing committed in the last year can come online
    let plus = &capacity.cap_plus["pv_grid"];
    assert_eq!(plus.get(network.constants.n_years - 1), 0.0);
}
