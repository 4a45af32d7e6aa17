//! State of charge carried across hours and years

mod common;

use common::{assert_close, half_day_config, results, solve, TOL};
use emix_algo::test_utils::NetworkFixture;

#[test]
fn test_soc_recurrence() {
    let network = NetworkFixture::default().build().unwrap();
    let run = solve(&network, &half_day_config(&network));
    let storages = &results(&run).storages;
    let battery = &network.storage_types["battery"];
    let retention = 1.0 - battery.energy_loss;

    let soc = &storages.soc["battery_grid"];
    let load = &storages.load["battery_grid"];
    let gen = &storages.gen["battery_grid"];
    let n_hours = soc.hours.len();

    assert_close(soc.get(0, 0), 0.0, "initial soc");
    for y in 0..soc.years.len() {
        for h in 0..n_hours {
            let (ph, py) = match (h, y) {
                (0, 0) => continue,
                (0, y) => (n_hours - 1, y - 1),
                (h, y) => (h - 1, y),
            };
            let expected = retention * soc.get(ph, py) + battery.load_efficiency * load.get(ph, py)
                - gen.get(ph, py) / battery.generation_efficiency;
            assert_close(soc.get(h, y), expected, &format!("soc h={h} y={y}"));
        }
    }
}

#[test]
fn test_soc_and_power_within_capacity() {
    let network = NetworkFixture::default().build().unwrap();
    let run = solve(&network, &half_day_config(&network));
    let storages = &results(&run).storages;
    let ptc = network.storage_types["battery"].power_to_capacity;

    let cap = &storages.capacity.cap["battery_grid"];
    let soc = &storages.soc["battery_grid"];
    for y in 0..soc.years.len() {
        for h in 0..soc.hours.len() {
            assert!(soc.get(h, y) <= cap.get(y) + TOL);
            assert!(storages.gen["battery_grid"].get(h, y) <= ptc * cap.get(y) + TOL);
            assert!(storages.load["battery_grid"].get(h, y) <= ptc * cap.get(y) + TOL);
        }
    }
}
