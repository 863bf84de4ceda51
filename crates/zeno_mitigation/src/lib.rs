//! # ZENO Mitigation
//!
//! Zero-noise extrapolation over noise-gain sweeps.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zeno_mitigation // L4: Mitigation
//!     Extrapolator // least-squares fit to gain 0
//!         FitModel // Linear | Polynomial(d) | Exponential
//!         FitResult // estimate, residuals, R², 95% CI
//!     ZneRunner // gain sweep over a Backend
//!         ZneConfig // gains, model, parallel
//!         ZneResult // samples, fit, improvement ratio
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zeno_core::prelude::*;
//! use zeno_mitigation::prelude::*;
//! use zeno_noise::NoiseModel;
//!
//! let topo = Topology::linear(3);
//! let circuit = build_trotter_circuit(&topo, &IsingParams::new(1.0, 0.5, 0.1, 2)).unwrap();
//! let noise = NoiseModel::sparse_lindblad(&topo, 1e-3, 1e-3).unwrap();
//!
//! let runner = ZneRunner::with_default_backend(ZneConfig::richardson(2).unwrap()).unwrap();
//! let result = runner
//!     .extrapolate_with_reference(&circuit, &noise, &Observable::z(1))
//!     .unwrap();
//! println!("{}", result);
//! ```
//!
//! ## Fitting Raw Points
//!
//! ```rust
//! use zeno_mitigation::prelude::*;
//!
//! let estimate = Extrapolator::new(FitModel::Linear)
//!     .extrapolate(&[(1.0, 0.9), (2.0, 0.8), (3.0, 0.7)])
//!     .unwrap();
//! assert!((estimate - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Regression models (Gantree: L4_Mitigation → Extrapolator)
pub mod extrapolation;

/// Gain sweep driver (Gantree: L4_Mitigation → ZneRunner)
pub mod zne;

// ============================================================================
// Re-exports
// ============================================================================

pub use extrapolation::{ExtrapolationSample, Extrapolator, FitModel, FitResult};
pub use zne::{ZneConfig, ZneResult, ZneRunner};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude for convenient imports
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zeno_mitigation::prelude::*;
    //! ```

    pub use crate::extrapolation::{ExtrapolationSample, Extrapolator, FitModel, FitResult};
    pub use crate::zne::{ZneConfig, ZneResult, ZneRunner};
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_relative_eq;
    use zeno_backend::{Executor, ExecutorConfig};
    use zeno_core::prelude::*;
    use zeno_noise::NoiseModel;

    #[test]
    fn test_zne_on_trotter_circuit() {
        let topo = Topology::linear(3);
        let circuit = build_trotter_circuit(&topo, &IsingParams::new(1.0, 0.5, 0.1, 3)).unwrap();
        let noise = NoiseModel::sparse_lindblad(&topo, 2e-3, 2e-3).unwrap();
        let runner = ZneRunner::with_default_backend(ZneConfig::richardson(2).unwrap()).unwrap();
        let result = runner
            .extrapolate_with_reference(&circuit, &noise, &Observable::z(1))
            .unwrap();
        assert!(result.improved().unwrap());
    }

    #[test]
    fn test_density_backend_with_depolarizing_noise() {
        // ⟨Z⟩(g) = -e^{-4λg} after one noisy X
        let circuit = CircuitBuilder::new(1).x(0).build().unwrap();
        let noise = NoiseModel::depolarizing(0.02, 0.0).unwrap();
        let backend = Executor::new(ExecutorConfig::exact()).unwrap();
        let runner =
            ZneRunner::new(backend, ZneConfig::exponential(vec![1.0, 1.5, 2.0]).unwrap()).unwrap();
        let result = runner
            .extrapolate(&circuit, &noise, &Observable::z(0))
            .unwrap();
        assert_relative_eq!(result.estimate, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_result_json_roundtrip() {
        let circuit = CircuitBuilder::new(1).x(0).x(0).build().unwrap();
        let noise = NoiseModel::uniform_layer(1, &[(Pauli::Z, 0.01), (Pauli::X, 0.01)]).unwrap();
        let result = ZneRunner::with_default_backend(ZneConfig::default())
            .unwrap()
            .extrapolate(&circuit, &noise, &Observable::z(0))
            .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: ZneResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
