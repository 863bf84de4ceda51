//! # ZENO Engine
//!
//! Experiment configuration, staged pipeline and reports.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zeno_engine // L5: Integration
//!     ExperimentConfig // serde JSON document
//!         TopologySpec, NoiseSpec, ObservableSpec
//!         load(), save(), to_json(), from_json()
//!     Pipeline // staged run
//!         build_circuit() → build_noise() → build_observable()
//!         → extrapolate() → report()
//!     ExperimentReport // samples, estimate, fit, ideal, γ
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zeno_engine::prelude::*;
//!
//! let config = ExperimentConfig::ising_chain(3)
//!     .with_noise(NoiseSpec::SparseLindblad { rate_1q: 1e-3, rate_2q: 1e-3 })
//!     .with_ideal(true)
//!     .with_seed(42);
//!
//! let report = run_experiment(config).unwrap();
//! println!("{}", report);
//! ```
//!
//! ## Using Pipeline
//!
//! ```rust
//! use zeno_engine::prelude::*;
//!
//! let mut pipeline = Pipeline::new(ExperimentConfig::ising_chain(2)).unwrap();
//! pipeline.build_circuit().unwrap();
//! pipeline.build_noise().unwrap();
//! pipeline.build_observable().unwrap();
//! pipeline.extrapolate().unwrap();
//! let report = pipeline.report().unwrap();
//! assert_eq!(report.samples.len(), 3);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Configuration (Gantree: L5_Integration → ExperimentConfig)
pub mod config;

/// Pipeline (Gantree: L5_Integration → Pipeline)
pub mod pipeline;

/// Reports (Gantree: L5_Integration → ExperimentReport)
pub mod report;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{
    ExperimentConfig, NoiseSpec, NoiseTermSpec, ObservableSpec, PauliTermSpec, TopologySpec,
};
pub use pipeline::{run_experiment, Pipeline, PipelineStage, PipelineState};
pub use report::{CircuitSummary, ExperimentReport};

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common use cases
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zeno_engine::prelude::*;
    //! ```

    pub use crate::config::{ExperimentConfig, NoiseSpec, ObservableSpec, TopologySpec};
    pub use crate::pipeline::{run_experiment, Pipeline, PipelineStage};
    pub use crate::report::ExperimentReport;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_relative_eq;
    use zeno_backend::{ExecutionMethod, ExecutorConfig};
    use zeno_core::prelude::*;
    use zeno_mitigation::FitModel;

    #[test]
    fn test_json_config_to_report() {
        let json = r#"{
            "name": "chain3",
            "num_qubits": 3,
            "topology": { "preset": { "line": 3 } },
            "ising": { "j": 1.0, "h": 0.5, "dt": 0.1, "steps": 2 },
            "noise": { "kind": "depolarizing", "epsilon_1q": 0.001, "epsilon_2q": 0.01 },
            "zne": { "gains": [1.0, 1.5, 2.0, 2.5], "model": { "polynomial": 2 } },
            "observable": { "kind": "pauli", "terms": [{ "coefficient": 0.5, "label": "ZZI" }] },
            "compute_ideal": true
        }"#;
        let config = ExperimentConfig::from_json(json).unwrap();
        assert_eq!(config.zne.model, FitModel::Polynomial(2));
        let report = run_experiment(config).unwrap();
        assert_eq!(report.name, "chain3");
        assert_eq!(report.samples.len(), 4);
        assert_eq!(report.fit.degrees_of_freedom, 1);
        assert!(report.improvement_ratio.unwrap() > 1.0);
    }

    #[test]
    fn test_trajectory_experiment_is_reproducible() {
        let config = ExperimentConfig::ising_chain(3)
            .with_noise(NoiseSpec::SparseLindblad {
                rate_1q: 5e-3,
                rate_2q: 5e-3,
            })
            .with_executor(ExecutorConfig::trajectories(50))
            .with_seed(9);
        let a = run_experiment(config.clone()).unwrap();
        let b = run_experiment(config).unwrap();
        assert_eq!(a.method, ExecutionMethod::Trajectories);
        assert_eq!(a.samples, b.samples);
    }

    #[test]
    fn test_median_projector_experiment() {
        let config = ExperimentConfig::ising_chain(3)
            .with_ising(IsingParams::new(1.0, 2.0, 0.2, 2))
            .with_noise(NoiseSpec::Depolarizing {
                epsilon_1q: 0.002,
                epsilon_2q: 0.01,
            })
            .with_observable(ObservableSpec::MedianProjector)
            .with_model(FitModel::Exponential)
            .with_ideal(true);
        let report = run_experiment(config).unwrap();
        let ideal = report.ideal.unwrap();
        // heavy outputs carry at least half the ideal probability
        assert!(ideal >= 0.5 - 1e-12 && ideal <= 1.0 + 1e-12);
        assert!(report.samples.iter().all(|s| s.expectation > 0.0));
    }

    #[test]
    fn test_heavy_hex_cell() {
        let config = ExperimentConfig::heavy_hex_7()
            .with_ising(IsingParams::new(1.0, 0.5, 0.1, 1))
            .with_gains(vec![1.0, 2.0]);
        let report = run_experiment(config).unwrap();
        assert_eq!(report.circuit.num_qubits, 7);
        assert_eq!(report.method, ExecutionMethod::StateVector);
        assert_relative_eq!(report.samples[0].expectation, report.samples[1].expectation);
    }
}
