//! Emission fees in the objective under year aggregation

mod common;

use common::{assert_close, results, solve};
use emix_algo::test_utils::{forced_dispatch_network, full_config};
use emix_algo::OptConfig;

const N_HOURS: usize = 8;
const N_YEARS: usize = 2;
const PRICE: f64 = 5.0;

fn objective(price: f64, year_aggregates: Option<Vec<f64>>) -> (f64, emix_algo::EngineRun) {
    let network = forced_dispatch_network(N_HOURS, N_YEARS, price).unwrap();
    let mut config = full_config(&network);
    config.year_aggregates = year_aggregates;
    let run = solve(&network, &config);
    (results(&run).objective_value, run)
}

#[test]
fn test_fee_changes_objective_not_dispatch() {
    let (without, run_without) = objective(0.0, None);
    let (with, run_with) = objective(PRICE, None);

    // 40 per hour at efficiency 0.5, 0.1 CO2 per 10 energy units
    let expected = PRICE * 0.01 * 80.0 * (N_HOURS * N_YEARS) as f64;
    assert_close(with - without, expected, "fee delta");

    let a = &results(&run_without).generators;
    let b = &results(&run_with).generators;
    for (h, y) in (0..N_HOURS).flat_map(|h| (0..N_YEARS).map(move |y| (h, y))) {
        assert_close(a.gen["pp_coal"].get(h, y), b.gen["pp_coal"].get(h, y), "gen");
        assert_close(
            a.gen_et["pp_coal"]["electricity"].get(h, y),
            b.gen_et["pp_coal"]["electricity"].get(h, y),
            "gen_et",
        );
    }
    for y in 0..N_YEARS {
        assert_close(
            a.capacity.cap["pp_coal"].get(y),
            b.capacity.cap["pp_coal"].get(y),
            "cap",
        );
    }
}

/// Three years with the fee charged in the middle one only
fn middle_year_fee(price: f64, year_aggregates: Option<Vec<f64>>) -> f64 {
    let mut network = forced_dispatch_network(N_HOURS, 3, 0.0).unwrap();
    network.emission_fees.get_mut("co2_fee").unwrap().price = vec![0.0, price, 0.0];
    let mut config = full_config(&network);
    config.year_aggregates = year_aggregates;
    results(&solve(&network, &config)).objective_value
}

#[test]
fn test_fee_delta_scales_with_year_weight() {
    let weights = vec![1.0, 5.0, 1.0];
    let base = middle_year_fee(0.0, None);
    let fee = middle_year_fee(PRICE, None);
    let base_agg = middle_year_fee(0.0, Some(weights.clone()));
    let fee_agg = middle_year_fee(PRICE, Some(weights));

    assert_close(fee - base, PRICE * 0.01 * 80.0 * N_HOURS as f64, "unweighted delta");
    assert_close((fee_agg - base_agg) / 5.0, fee - base, "weighted delta");
}

#[test]
fn test_emission_tables() {
    let (_, run) = objective(PRICE, None);
    let emission = &results(&run).generators.emission["pp_coal"]["CO2"];
    for y in 0..N_YEARS {
        assert_close(emission.get(y), 0.01 * 80.0 * N_HOURS as f64, "yearly CO2");
    }
}

#[test]
fn test_money_scale_divides_objective() {
    let network = forced_dispatch_network(N_HOURS, N_YEARS, PRICE).unwrap();
    let plain = solve(&network, &full_config(&network));
    let scaled_config = OptConfig {
        money_scale: 1000.0,
        ..full_config(&network)
    };
    let scaled = solve(&network, &scaled_config);
    assert_close(
        results(&scaled).objective_value * 1000.0,
        results(&plain).objective_value,
        "scaled objective",
    );
}
