//! # ZENO Backend
//!
//! Dense register simulation and circuit execution for ZENO.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zeno_backend // L3: Backend
//!     RegisterState // strategy trait
//!         StateVector // pure state, sampled channels
//!         DensityMatrix // mixed state, exact channels
//!     BackendTrait // execute(), execute_batch()
//!         ExecutionResult // value, std error, method, metadata
//!     Executor // layer loop + noise + timeout
//!         ExecutorConfig // Exact | Trajectories{shots}, seed, limits
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zeno_backend::prelude::*;
//! use zeno_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new(2).h(0).cnot(0, 1).build().unwrap();
//! let zz = Observable::from(PauliString::from_label("ZZ").unwrap());
//!
//! let executor = Executor::default();
//! let value = executor.run(&circuit, None, 1.0, &zz).unwrap();
//! assert!((value - 1.0).abs() < 1e-12);
//! ```
//!
//! ## Noisy Execution
//!
//! ```rust
//! use zeno_backend::prelude::*;
//! use zeno_core::prelude::*;
//! use zeno_noise::NoiseModel;
//!
//! let topo = Topology::linear(3);
//! let circuit = build_trotter_circuit(&topo, &IsingParams::new(1.0, 0.5, 0.1, 2)).unwrap();
//! let noise = NoiseModel::sparse_lindblad(&topo, 1e-3, 1e-3).unwrap();
//!
//! let executor = Executor::new(ExecutorConfig::exact().with_seed(7)).unwrap();
//! let result = executor
//!     .execute(&circuit, Some(&noise), 2.0, &Observable::z(1))
//!     .unwrap();
//! println!("{}", result);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Register state trait (Gantree: L3_Backend → RegisterState)
pub mod state;

/// State-vector register (Gantree: L3_Backend → StateVector)
pub mod statevector;

/// Density-matrix register (Gantree: L3_Backend → DensityMatrix)
pub mod density;

/// Execution types and backend trait (Gantree: L3_Backend → BackendTrait)
pub mod execution;

/// Circuit executor (Gantree: L3_Backend → Executor)
pub mod executor;

// ============================================================================
// Re-exports
// ============================================================================

pub use density::DensityMatrix;
pub use execution::{Backend, ExecutionMetadata, ExecutionMethod, ExecutionResult};
pub use executor::{Executor, ExecutorConfig, NoisyMethod};
pub use state::{RegisterState, StateKind};
pub use statevector::StateVector;

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common use cases
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zeno_backend::prelude::*;
    //! ```

    pub use crate::density::DensityMatrix;
    pub use crate::execution::{Backend, ExecutionMetadata, ExecutionMethod, ExecutionResult};
    pub use crate::executor::{Executor, ExecutorConfig, NoisyMethod};
    pub use crate::state::{RegisterState, StateKind};
    pub use crate::statevector::StateVector;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_relative_eq;
    use zeno_core::prelude::*;
    use zeno_noise::NoiseModel;

    #[test]
    fn test_benchmark_fast_path_matches_general_rzz() {
        let topo = Topology::linear(3);
        let angles = TrotterAngles::new(-std::f64::consts::FRAC_PI_2, 0.3, 2);
        let fast = build_trotter_circuit_with(&topo, &angles, &TrotterConfig::default()).unwrap();
        let general = build_trotter_circuit_with(
            &topo,
            &angles,
            &TrotterConfig {
                fast_path: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(fast.count_2q() == general.count_2q());

        let exec = Executor::default();
        for q in 0..3 {
            let a = exec.run(&fast, None, 1.0, &Observable::z(q)).unwrap();
            let b = exec.run(&general, None, 1.0, &Observable::z(q)).unwrap();
            assert_relative_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_exact_and_trajectories_on_trotter() {
        let topo = Topology::linear(3);
        let circuit = build_trotter_circuit(&topo, &IsingParams::new(1.0, 1.0, 0.2, 2)).unwrap();
        let noise = NoiseModel::sparse_lindblad(&topo, 5e-3, 5e-3).unwrap();
        let obs = Observable::z(1);

        let exact = Executor::default().run(&circuit, Some(&noise), 1.0, &obs).unwrap();
        let traj = Executor::new(ExecutorConfig::trajectories(2000).with_seed(5))
            .unwrap()
            .execute(&circuit, Some(&noise), 1.0, &obs)
            .unwrap();
        assert!((traj.expectation - exact).abs() < 5.0 * traj.std_error + 1e-3);
    }

    #[test]
    fn test_noise_pulls_toward_zero() {
        let topo = Topology::linear(2);
        let circuit = build_trotter_circuit(&topo, &IsingParams::new(1.0, 0.2, 0.1, 2)).unwrap();
        let noise = NoiseModel::sparse_lindblad(&topo, 1e-2, 1e-2).unwrap();
        let exec = Executor::default();
        let ideal = exec.run(&circuit, None, 1.0, &Observable::z(0)).unwrap();
        let noisy = exec.run(&circuit, Some(&noise), 1.0, &Observable::z(0)).unwrap();
        assert!(noisy.abs() < ideal.abs());
    }
}
