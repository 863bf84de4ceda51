//! # ZENO Core
//!
//! Operators, Pauli strings, circuits and topology for the zero-noise
//! extrapolation engine.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zeno_core // L0+L1: Foundation + Operators + Circuit
//!     L0_Foundation // base types, constants, errors
//!         CoreTypes // QubitId, Angle, Probability, Bitstring
//!         Constants // tolerances, limits, Ising defaults
//!         Errors // ZenoError
//!     L1_Operators // dense algebra
//!         Operator // gate matrices, adjoint, kron, embed
//!         Pauli // sparse Pauli strings
//!         Observable // Pauli sums, projectors
//!     L1_Circuit // layered circuits
//!         Gate // Single | Two
//!         Circuit // layers + global phase
//!         CircuitBuilder // fluent + Trotter builders
//!         Topology // coupling graphs, heavy-hex 127
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zeno_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new(2)
//!     .h(0)
//!     .cnot(0, 1)
//!     .build()
//!     .unwrap();
//!
//! println!("{}", circuit);
//! println!("{}", circuit.to_qasm());
//! ```
//!
//! ## Trotterized Ising Circuit
//!
//! ```rust
//! use zeno_core::prelude::*;
//!
//! let topo = Topology::grid(2, 2);
//! let params = IsingParams::new(1.0, 0.5, 0.1, 2);
//! let circuit = build_trotter_circuit(&topo, &params).unwrap();
//!
//! // 2 colours of RZZ + 1 RX layer per step
//! assert_eq!(circuit.depth(), 6);
//! assert!(topo.validate_circuit(&circuit).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Gate matrices (Gantree: L1_Operators → Operator)
pub mod operator;

/// Pauli strings (Gantree: L1_Operators → Pauli)
pub mod pauli;

/// Observables (Gantree: L1_Operators → Observable)
pub mod observable;

/// Gate instructions (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Circuit structure (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Circuit builders (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

/// Qubit topology (Gantree: L1_Circuit → Topology)
pub mod topology;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{
    build_trotter_circuit, build_trotter_circuit_for_preset, build_trotter_circuit_with,
    CircuitBuilder, IsingParams, TrotterAngles, TrotterConfig,
};
pub use circuit::{Circuit, Layer};
pub use constants::{bench, ising, limits, numerics, stats};
pub use error::{ZenoError, ZenoResult};
pub use gate::{Gate, SingleQubitGate, TwoQubitGate};
pub use observable::{Observable, PauliSum, Projector};
pub use operator::{embed, Operator, Tolerance};
pub use pauli::{Pauli, PauliString};
pub use topology::{Edge, Topology, TopologyPreset};
pub use types::{Amplitude, Angle, Bitstring, Probability, QubitId};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use zeno_core::prelude::*;
    //! ```

    pub use crate::builder::{
        build_trotter_circuit, build_trotter_circuit_for_preset, build_trotter_circuit_with,
        CircuitBuilder, IsingParams, TrotterAngles, TrotterConfig,
    };
    pub use crate::circuit::{Circuit, Layer};
    pub use crate::constants::{bench, ising, limits, numerics, stats};
    pub use crate::error::{ZenoError, ZenoResult};
    pub use crate::gate::{Gate, SingleQubitGate, TwoQubitGate};
    pub use crate::observable::{Observable, PauliSum, Projector};
    pub use crate::operator::{embed, Operator, Tolerance};
    pub use crate::pauli::{Pauli, PauliString};
    pub use crate::topology::{Edge, Topology, TopologyPreset};
    pub use crate::types::{Amplitude, Angle, Bitstring, Probability, QubitId};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_benchmark_circuit_on_heavy_hex() {
        let topo = Topology::heavy_hex_127();
        let circuit =
            build_trotter_circuit_with(&topo, &TrotterAngles::benchmark(1), &TrotterConfig::default())
                .unwrap();

        // every RZZ(-π/2) becomes one CNOT
        assert_eq!(circuit.count_2q(), 144);
        assert!(topo.validate_circuit(&circuit).is_ok());
        assert!((circuit.global_phase() - 144.0 * FRAC_PI_2 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_topology_violation_detected() {
        let topo = Topology::linear(4);
        let circuit = CircuitBuilder::new(4).cnot(0, 3).build().unwrap();
        assert!(matches!(
            topo.validate_circuit(&circuit),
            Err(ZenoError::TopologyViolation { .. })
        ));
    }

    #[test]
    fn test_operator_lookup_matches_gate() {
        let tol = Tolerance::default();
        let gate = Gate::rzz(0, 1, 0.3);
        let named = Operator::by_name("rzz", &[0.3]).unwrap();
        assert!(gate.operator().approx_eq(&named, tol));
    }

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "zeno_core");
    }
}
