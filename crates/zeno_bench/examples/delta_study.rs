//! δ₀ study over random layered circuits
//!
//! Run with: cargo run --release --example delta_study -p zeno_bench [circuits] [qubits]
//!
//! Defaults to 500 circuits of 20 qubits at depth 6 with ε = 0.01, each
//! sampled with 4000 trajectories. Pass smaller numbers for a quick run.
//! Set `RUST_LOG=info` for progress.

use anyhow::Context;
use zeno_bench::prelude::*;

fn parse_arg(index: usize) -> anyhow::Result<Option<usize>> {
    std::env::args()
        .nth(index)
        .map(|s| s.parse().with_context(|| format!("argument {} is not a count: {}", index, s)))
        .transpose()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = StudyConfig::default();
    if let Some(circuits) = parse_arg(1)? {
        config.circuits = circuits;
    }
    if let Some(qubits) = parse_arg(2)? {
        config.num_qubits = qubits;
    }
    println!("{}\n", config);

    let study = DeltaStudy::new(config).context("invalid study configuration")?;
    let result = study.run().context("δ₀ study failed")?;

    println!("{}", Reporter::to_markdown(&result));
    std::fs::write("delta_study.csv", Reporter::to_csv(&result))
        .context("failed to write delta_study.csv")?;
    println!("per-circuit values written to delta_study.csv");

    Ok(())
}
