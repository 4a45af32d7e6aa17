#![allow(dead_code)]

use emix_algo::{EngineRun, OptConfig, OptimizationEngine, Results, SolveStatus};
use emix_core::Network;

/// Clarabel is an interior-point method; compare solved values loosely.
pub const TOL: f64 = 1e-3;

pub fn assert_close(actual: f64, expected: f64, what: &str) {
    let scale = 1.0 + expected.abs().max(actual.abs());
    assert!(
        (actual - expected).abs() <= TOL * scale,
        "{what}: expected {expected}, got {actual}"
    );
}

pub fn solve(network: &Network, config: &OptConfig) -> EngineRun {
    emix_algo::logging::try_init("warn");
    let run = OptimizationEngine::run(network, config).expect("engine run");
    assert_eq!(
        run.status,
        SolveStatus::Optimal,
        "solve failed: {:?}",
        run.message
    );
    run
}

pub fn results(run: &EngineRun) -> &Results {
    run.results.as_ref().expect("optimal run has results")
}

/// First twelve hours of every year
pub fn half_day_config(network: &Network) -> OptConfig {
    OptConfig::builder(
        (0..12).collect(),
        (0..network.constants.n_years).collect(),
    )
    .build()
}
