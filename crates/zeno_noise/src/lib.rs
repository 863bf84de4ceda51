//! # ZENO Noise
//!
//! Sparse Pauli-Lindblad noise models for noisy circuit simulation.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zeno_noise // L2: Noise Model
//!     Channel // single-Pauli channels
//!         PauliChannel // (1-p)ρ + pPρP
//!         ChannelTarget // trait implemented by register states
//!     NoiseModel // Σ λ_k (P_k·P_k − ·)
//!         add_term(), depolarizing(), sparse_lindblad(), uniform_layer()
//!         rates(), rate_map(), scale(gain)
//!         channels_for_layer(), apply(), first_order_error_bound()
//!     Overhead // PEC sampling cost
//!         depolarizing_pec_overhead(), pec_sampling_overhead()
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zeno_noise::prelude::*;
//! use zeno_core::prelude::*;
//!
//! let topo = Topology::linear(4);
//! let model = NoiseModel::sparse_lindblad(&topo, 1e-3, 5e-4).unwrap();
//!
//! // scaling returns a new model
//! let amplified = model.scale(3.0).unwrap();
//! assert_eq!(amplified.len(), model.len());
//!
//! let circuit = build_trotter_circuit(&topo, &IsingParams::default()).unwrap();
//! let gamma = pec_sampling_overhead(&model, &circuit, 1.0).unwrap();
//! println!("PEC overhead: {:.4}", gamma);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Pauli channels (Gantree: L2_Noise → Channel)
pub mod channel;

/// Pauli-Lindblad noise model (Gantree: L2_Noise → NoiseModel)
pub mod noise_model;

/// PEC sampling overhead (Gantree: L2_Noise → Overhead)
pub mod overhead;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{ChannelTarget, PauliChannel};
pub use noise_model::{Approximation, NoiseModel, NoiseScope, NoiseTerm};
pub use overhead::{depolarizing_pec_overhead, layer_overhead, pec_sample_cost, pec_sampling_overhead};

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common use cases
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zeno_noise::prelude::*;
    //! ```

    pub use crate::channel::{ChannelTarget, PauliChannel};
    pub use crate::noise_model::{Approximation, NoiseModel, NoiseScope, NoiseTerm};
    pub use crate::overhead::{
        depolarizing_pec_overhead, layer_overhead, pec_sample_cost, pec_sampling_overhead,
    };
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use zeno_core::prelude::*;

    #[test]
    fn test_trotter_channels_cover_register() {
        let topo = Topology::linear(3);
        let model = NoiseModel::sparse_lindblad(&topo, 1e-3, 1e-3).unwrap();
        let circuit = build_trotter_circuit(&topo, &IsingParams::new(1.0, 0.5, 0.1, 1)).unwrap();

        for layer in circuit.layers() {
            let channels = model.channels_for_layer(layer, 1.0).unwrap();
            assert_eq!(channels.len(), model.len());
            assert!(channels.iter().all(|c| c.pauli.validate_for(3).is_ok()));
        }
    }

    #[test]
    fn test_depolarizing_follows_gates() {
        let model = NoiseModel::depolarizing(0.01, 0.02).unwrap();
        let circuit = CircuitBuilder::new(3).h(0).cnot(1, 2).build().unwrap();
        let layer = circuit.layers().next().unwrap();
        let channels = model.channels_for_layer(layer, 1.0).unwrap();
        assert_eq!(channels.len(), 3 + 15);
        assert!(channels[3..].iter().all(|c| c.pauli.max_qubit() <= Some(2)));
        assert!(channels[3..].iter().all(|c| c.pauli.get(0) == Pauli::I));
    }

    #[test]
    fn test_gain_amplifies_probabilities() {
        let model = NoiseModel::uniform_layer(1, &[(Pauli::X, 0.01)]).unwrap();
        let layer = Layer::from_gates([Gate::rx(0, 0.2)]).unwrap();
        let p1 = model.channels_for_layer(&layer, 1.0).unwrap()[0].probability;
        let p3 = model.channels_for_layer(&layer, 3.0).unwrap()[0].probability;
        assert!(p3 > p1);
        assert!(p3 < 0.5);
    }

    #[test]
    fn test_model_json_roundtrip() {
        let model = NoiseModel::depolarizing(0.01, 0.02)
            .unwrap()
            .with_approximation(Approximation::FirstOrder);
        let json = serde_json::to_string(&model).unwrap();
        let back: NoiseModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
