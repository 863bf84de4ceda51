//! Zero-noise extrapolation of a Trotterized Ising chain
//!
//! Run with: cargo run --example ising_zne -p zeno_engine [config.json]
//!
//! Without an argument a 5-qubit chain under sparse Pauli-Lindblad noise is
//! used. Set `RUST_LOG=info` to follow the pipeline stages.

use anyhow::Context;
use zeno_core::builder::IsingParams;
use zeno_engine::prelude::*;
use zeno_mitigation::FitModel;

fn default_config() -> ExperimentConfig {
    ExperimentConfig::ising_chain(5)
        .with_name("ising_chain_5_zne")
        .with_ising(IsingParams::new(1.0, 0.7, 0.1, 4))
        .with_noise(NoiseSpec::SparseLindblad {
            rate_1q: 2e-3,
            rate_2q: 4e-3,
        })
        .with_observable(ObservableSpec::z(2))
        .with_gains(vec![1.0, 1.5, 2.0, 2.5, 3.0])
        .with_ideal(true)
        .with_seed(42)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ExperimentConfig::load(&path)
            .with_context(|| format!("failed to load experiment config {}", path))?,
        None => default_config(),
    };

    println!("{}", config);
    println!();

    for model in [FitModel::Linear, FitModel::Polynomial(2), FitModel::Exponential] {
        let report = run_experiment(config.clone().with_model(model))
            .with_context(|| format!("{} extrapolation failed", model))?;
        println!("{}", report.to_markdown());
    }

    Ok(())
}
