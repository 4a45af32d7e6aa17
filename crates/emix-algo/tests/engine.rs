//! End-to-end runs: validation, backends, read-back and determinism

mod common;

use common::{assert_close, half_day_config, results, solve};
use emix_algo::test_utils::{fixture_network, NetworkFixture};
use emix_algo::{
    AssembledModel, Indices, ModelBuilder, ModelParameters, OptConfig, OptimizationEngine,
    OptimizationError, SolveAdapter, SolveOutcome, SolveStatus,
};
use emix_core::Bus;

/// Reports every variable at a fixed value
struct ConstantAdapter(f64);

impl SolveAdapter for ConstantAdapter {
    fn solve(&self, model: AssembledModel) -> SolveOutcome {
        SolveOutcome::optimal(vec![self.0; model.n_variables()], 42.0)
    }
}

struct FailingAdapter;

impl SolveAdapter for FailingAdapter {
    fn solve(&self, _model: AssembledModel) -> SolveOutcome {
        SolveOutcome::failed(SolveStatus::Infeasible, "no feasible point")
    }
}

#[test]
fn test_results_reshape_with_mock_backend() {
    let network = fixture_network().unwrap();
    let config = OptConfig::builder(vec![5, 6, 7], vec![0, 2]).build();
    let run = OptimizationEngine::run_with(&network, &config, &ConstantAdapter(1.5)).unwrap();
    let results = results(&run);

    assert_eq!(results.objective_value, 42.0);
    let gen = &results.generators.gen["pp_coal_grid"];
    assert_eq!(gen.hours, vec![5, 6, 7]);
    assert_eq!(gen.years, vec![0, 2]);
    assert_eq!(gen.at(6, 2), Some(1.5));
    assert_eq!(results.generators.gen_et["pp_coal_grid"]["heat"].sum(), 0.0);
    assert_eq!(results.lines.flow["grid_local"].get(2, 1), 1.5);
    assert!(results.buses.ens.is_empty());
    assert_eq!(results.buses.shift_minus.keys().collect::<Vec<_>>(), vec!["local_heat"]);
    assert_eq!(results.fractions.frac["town"]["lbs_town"].values, vec![1.5, 1.5]);
    // base retirement has no variable in the first sampled year
    assert_eq!(results.generators.capacity.cap_base_minus["pp_coal_grid"].values, vec![0.0, 1.5]);
}

#[test]
fn test_failed_solve_has_no_results() {
    let network = fixture_network().unwrap();
    let config = half_day_config(&network);
    let run = OptimizationEngine::run_with(&network, &config, &FailingAdapter).unwrap();

    assert_eq!(run.status, SolveStatus::Infeasible);
    assert!(run.results.is_none());
    assert_eq!(run.message.as_deref(), Some("no feasible point"));
    assert_eq!(run.indices.h.len(), 12);
}

#[test]
fn test_validation_blocks_run() {
    let mut network = fixture_network().unwrap();
    network.add_bus(Bus::new("steam", "steam")).unwrap();
    let config = half_day_config(&network);

    let err = OptimizationEngine::run(&network, &config).unwrap_err();
    match err {
        OptimizationError::Validation(msg) => assert!(msg.contains("Bus steam has energy type steam")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_sample_outside_horizon() {
    let network = fixture_network().unwrap();
    let config = OptConfig::builder(vec![0, 48], vec![0]).build();
    let err = OptimizationEngine::run(&network, &config).unwrap_err();
    assert!(matches!(err, OptimizationError::Index(_)));
}

#[test]
fn test_binary_fraction_needs_integer_backend() {
    let network = fixture_network().unwrap();
    let config = OptConfig::builder((0..12).collect(), vec![0, 1])
        .binary_fraction(true)
        .solver("clarabel")
        .build();
    let run = OptimizationEngine::run(&network, &config).unwrap();

    assert_eq!(run.status, SolveStatus::Error);
    assert!(run.results.is_none());
    assert!(run.message.unwrap().contains("integer"));
}

#[test]
fn test_unknown_solver() {
    let network = fixture_network().unwrap();
    let config = OptConfig::builder(vec![0], vec![0]).solver("gurobi").build();
    let err = OptimizationEngine::run(&network, &config).unwrap_err();
    assert!(matches!(err, OptimizationError::Config(_)));
}

#[test]
fn test_rebuild_is_deterministic() {
    let network = fixture_network().unwrap();
    let config = half_day_config(&network);

    let build = || {
        let indices = Indices::new(&network, &config.hour_sample, &config.year_sample, None).unwrap();
        let params = ModelParameters::new(&network, &indices, &config).unwrap();
        ModelBuilder::new(&indices, &params, &config).build().unwrap()
    };
    let first = build();
    let second = build();
    assert_eq!(first.tags, second.tags);
    assert_eq!(first.n_variables(), second.n_variables());

    let a = solve(&network, &config);
    let b = solve(&network, &config);
    assert_close(results(&a).objective_value, results(&b).objective_value, "objective");
}

#[test]
fn test_generator_binding_ties_base_retirement() {
    let network = NetworkFixture::default().with_bound_coal_fleet().build().unwrap();
    let run = solve(&network, &half_day_config(&network));
    let base_minus = &results(&run).generators.capacity.cap_base_minus;

    let first = &base_minus["pp_coal_grid"];
    let second = &base_minus["pp_coal_grid_2"];
    for y in 1..network.constants.n_years {
        assert_close(100.0 * first.get(y), 200.0 * second.get(y), &format!("binding y={y}"));
    }
}

#[test]
fn test_ens_covers_missing_supply() {
    // the chp is the only heat source; take it out entirely
    let mut network = NetworkFixture::default().without_dsr().build().unwrap();
    let n_years = network.constants.n_years;
    network.generators.get_mut("chp_local").unwrap().unit_base_cap = 0.0;
    network.generator_types.get_mut("chp").unwrap().bounds.max_capacity = vec![Some(0.0); n_years];
    let config = OptConfig::builder((0..4).collect(), vec![0, 1]).ens_penalty(1e4).build();

    let run = solve(&network, &config);
    let ens = &results(&run).buses.ens["local_heat"];
    assert_close(ens.get(0, 0), 1440.0 / 48.0, "heat ens");
}

#[test]
fn test_errors_convert_to_core_error() {
    let network = fixture_network().unwrap();
    let config = OptConfig::builder(vec![0, 48], vec![0]).build();
    let err: emix_core::EmixError = OptimizationEngine::run(&network, &config).unwrap_err().into();
    assert!(matches!(err, emix_core::EmixError::Index(_)));
}
