//! Single-Pauli channels and the state interface they act on
//!
//! Gantree: L2_Noise → Channel
//!
//! A `PauliChannel` is the map `ρ → (1 − p) ρ + p PρP`. Every noise model in
//! this crate lowers to a sequence of these; register states apply them
//! either exactly or by sampling one outcome per call.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::pauli::PauliString;

// ============================================================================
// PauliChannel
// ============================================================================

/// Pauli error `P` applied with probability `p`
/// Gantree: PauliChannel // (1-p)ρ + pPρP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliChannel {
    /// Error operator on global register indices
    pub pauli: PauliString,
    /// Flip probability in [0, 1]
    pub probability: f64,
}

impl PauliChannel {
    /// Create a channel, failing with `InvalidProbability` outside [0, 1]
    pub fn new(pauli: PauliString, probability: f64) -> ZenoResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ZenoError::InvalidProbability(probability));
        }
        Ok(Self { pauli, probability })
    }

    /// True if the channel is the identity map
    pub fn is_trivial(&self) -> bool {
        self.probability == 0.0 || self.pauli.is_identity()
    }

    /// Draw whether the error fires on this trajectory
    /// Gantree: fires(rng) -> bool // Bernoulli(p)
    pub fn fires(&self, rng: &mut ChaCha8Rng) -> bool {
        self.probability > 0.0 && rng.gen::<f64>() < self.probability
    }

    /// Pauli fidelity factor `1 − 2p` seen by anticommuting observables
    pub fn fidelity(&self) -> f64 {
        1.0 - 2.0 * self.probability
    }
}

impl fmt::Display for PauliChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:.3e}", self.pauli, self.probability)
    }
}

// ============================================================================
// ChannelTarget
// ============================================================================

/// Anything a Pauli channel can be applied to
/// Gantree: ChannelTarget // trait
///
/// Exact representations (density matrices) apply the full mixture; pure
/// states apply `P` with probability `p`. Both agree in expectation.
pub trait ChannelTarget {
    /// Register width
    fn num_qubits(&self) -> usize;

    /// Apply `ρ → (1 − p) ρ + p PρP`, drawing from `rng` if the
    /// representation samples
    fn apply_pauli_channel(&mut self, channel: &PauliChannel, rng: &mut ChaCha8Rng)
        -> ZenoResult<()>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use zeno_core::pauli::Pauli;

    #[test]
    fn test_channel_validation() {
        let x = PauliString::single(0, Pauli::X);
        assert!(PauliChannel::new(x.clone(), 1.5).is_err());
        assert!(PauliChannel::new(x.clone(), -0.1).is_err());
        assert!(PauliChannel::new(x, 0.5).is_ok());
    }

    #[test]
    fn test_trivial() {
        assert!(PauliChannel::new(PauliString::identity(), 0.3).unwrap().is_trivial());
        assert!(PauliChannel::new(PauliString::single(1, Pauli::Z), 0.0)
            .unwrap()
            .is_trivial());
    }

    #[test]
    fn test_fire_frequency() {
        let ch = PauliChannel::new(PauliString::single(0, Pauli::X), 0.25).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let hits = (0..20_000).filter(|_| ch.fires(&mut rng)).count();
        let freq = hits as f64 / 20_000.0;
        assert!((freq - 0.25).abs() < 0.02);
    }

    #[test]
    fn test_fidelity() {
        let ch = PauliChannel::new(PauliString::single(0, Pauli::Y), 0.1).unwrap();
        assert!((ch.fidelity() - 0.8).abs() < 1e-12);
        assert_eq!(ch.to_string(), "Y0@1.000e-1");
    }
}
