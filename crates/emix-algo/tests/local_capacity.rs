//! Local unit capacity sized by the number of consumers a stack serves

mod common;

use common::{assert_close, half_day_config, results, solve, TOL};
use emix_algo::test_utils::{NetworkFixture, HEAT};
use emix_core::{Generator, Network};

/// Fixture town with a second CHP unit and a ten-year CHP life time
fn town_with_two_chp(min_power: (f64, f64)) -> Network {
    let mut network = NetworkFixture::default().without_dsr().build().unwrap();
    network.generator_types.get_mut("chp").unwrap().life_time = 10;
    network
        .generators
        .get_mut("chp_local")
        .unwrap()
        .min_device_nom_power = Some(min_power.0);
    network
        .add_generator(
            Generator::new("chp_local_2", "chp", ["local_ee", "local_heat"], 50.0, 5)
                .with_device_nom_power(Some(min_power.1), None),
        )
        .unwrap();
    network
}

#[test]
fn test_min_device_power_keeps_local_capacity() {
    let network = town_with_two_chp((0.05, 0.03));
    assert!(!network.validate().has_errors());
    let run = solve(&network, &half_day_config(&network));
    let capacity = &results(&run).generators.capacity;

    // 1000 consumers: 50 for chp_local and 30 for chp_local_2 from year 1
    let tcap = &capacity.tcap["town"]["chp"];
    let expected = [150.0, 80.0, 80.0, 80.0, 80.0];
    for (y, &value) in expected.iter().enumerate() {
        assert_close(tcap.get(y), value, &format!("tcap[{y}]"));
    }

    let base_minus = &capacity.tcap_base_minus["town"]["chp"];
    let expected = [0.0, 70.0, 0.0, 0.0, 0.0];
    for (y, &value) in expected.iter().enumerate() {
        assert_close(base_minus.get(y), value, &format!("tcap_base_minus[{y}]"));
    }
    assert!(capacity.tcap_plus["town"]["chp"].sum().abs() < TOL);
    for s in 0..5 {
        assert!(capacity.tcap_minus["town"]["chp"].row_sum(s).abs() < TOL);
    }

    for y in 1..5 {
        assert_close(capacity.cap["chp_local"].get(y), 50.0, &format!("chp_local[{y}]"));
        assert_close(capacity.cap["chp_local_2"].get(y), 30.0, &format!("chp_local_2[{y}]"));
    }
}

#[test]
fn test_local_units_sum_to_type_capacity() {
    let network = town_with_two_chp((0.05, 0.03));
    let run = solve(&network, &half_day_config(&network));
    let capacity = &results(&run).generators.capacity;

    for y in 0..5 {
        let units = capacity.cap["chp_local"].get(y) + capacity.cap["chp_local_2"].get(y);
        assert_close(units, capacity.tcap["town"]["chp"].get(y), &format!("y={y}"));
        assert!(capacity.cap["chp_local"].get(y) >= 50.0 - TOL);
        assert!(capacity.cap["chp_local_2"].get(y) >= 30.0 - TOL);
    }
}

#[test]
fn test_max_device_power_leaves_heat_unserved() {
    let mut fixture = NetworkFixture::default().without_dsr();
    fixture.heat_usage = 3840.0;
    let mut network = fixture.build().unwrap();
    network.generator_types.get_mut("chp").unwrap().life_time = 10;
    network
        .generators
        .get_mut("chp_local")
        .unwrap()
        .max_device_nom_power = Some(0.1);
    let config = emix_algo::OptConfig {
        ens_penalty: 1e4,
        ..half_day_config(&network)
    };
    let run = solve(&network, &config);
    let results = results(&run);

    // 80 heat per hour needs 160 of input, the cap allows 100
    for y in 0..5 {
        assert!(results.generators.capacity.cap["chp_local"].get(y) <= 100.0 + TOL);
        assert_close(results.generators.capacity.tcap["town"]["chp"].get(y), 100.0, &format!("tcap[{y}]"));
    }
    let ens = &results.buses.ens["local_heat"];
    for h in 0..ens.hours.len() {
        assert_close(ens.get(h, 4), 30.0, &format!("{HEAT} ens h={h}"));
    }
}
