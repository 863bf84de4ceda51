//! Dense state-vector register
//!
//! Gantree: L3_Backend → StateVector
//!
//! Pure-state simulation. Pauli channels are sampled: each call applies `P`
//! with probability `p`, so averaging many trajectories reproduces the
//! density-matrix result.

use crate::state::{apply_local, check_operator, RegisterState, StateKind};
use num_complex::Complex64;
use rand_chacha::ChaCha8Rng;
use zeno_core::constants::limits::MAX_STATEVECTOR_QUBITS;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::observable::{Observable, PauliSum};
use zeno_core::operator::Operator;
use zeno_core::pauli::PauliString;
use zeno_core::types::QubitId;
use zeno_noise::{ChannelTarget, PauliChannel};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Pure state on `N` qubits
/// Gantree: StateVector // 2^N amplitudes
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// `|0…0⟩` on `num_qubits` qubits
    pub fn new(num_qubits: usize) -> ZenoResult<Self> {
        check_limit(num_qubits)?;
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    /// Wrap raw amplitudes (length must be a power of two)
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> ZenoResult<Self> {
        let len = amplitudes.len();
        if len == 0 || !len.is_power_of_two() {
            return Err(ZenoError::DimensionMismatch {
                expected: len.next_power_of_two().max(1),
                found: len,
            });
        }
        let num_qubits = len.trailing_zeros() as usize;
        check_limit(num_qubits)?;
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Amplitudes, little-endian
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Amplitude of one basis state
    pub fn amplitude(&self, index: usize) -> Option<Complex64> {
        self.amplitudes.get(index).copied()
    }

    // ========================================================================
    // Pauli Operations
    // ========================================================================

    /// Apply a Pauli string in place
    /// Gantree: apply_pauli(P) // |k⟩ → phase·|k⊕x⟩
    pub fn apply_pauli(&mut self, pauli: &PauliString) -> ZenoResult<()> {
        pauli.validate_for(self.num_qubits)?;
        let x = pauli.x_mask();
        let z = pauli.z_mask();
        let y = pauli.y_count();

        if x == 0 {
            for (k, amp) in self.amplitudes.iter_mut().enumerate() {
                *amp *= pauli.phase_on(k, z, y);
            }
            return Ok(());
        }
        for k in 0..self.amplitudes.len() {
            let partner = k ^ x;
            if k > partner {
                continue;
            }
            let a = self.amplitudes[k];
            let b = self.amplitudes[partner];
            self.amplitudes[partner] = pauli.phase_on(k, z, y) * a;
            self.amplitudes[k] = pauli.phase_on(partner, z, y) * b;
        }
        Ok(())
    }

    /// `⟨ψ|P|ψ⟩`
    pub fn pauli_expectation(&self, pauli: &PauliString) -> ZenoResult<f64> {
        pauli.validate_for(self.num_qubits)?;
        let x = pauli.x_mask();
        let z = pauli.z_mask();
        let y = pauli.y_count();
        let value: Complex64 = self
            .amplitudes
            .iter()
            .enumerate()
            .map(|(k, amp)| self.amplitudes[k ^ x].conj() * pauli.phase_on(k, z, y) * amp)
            .sum();
        Ok(value.re)
    }

    fn sum_expectation(&self, sum: &PauliSum) -> ZenoResult<f64> {
        sum.validate_for(self.num_qubits)?;
        sum.terms()
            .iter()
            .map(|(c, p)| -> ZenoResult<f64> { Ok(c * self.pauli_expectation(p)?) })
            .sum()
    }
}

impl ChannelTarget for StateVector {
    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn apply_pauli_channel(&mut self, channel: &PauliChannel, rng: &mut ChaCha8Rng) -> ZenoResult<()> {
        if channel.fires(rng) {
            self.apply_pauli(&channel.pauli)?;
        }
        Ok(())
    }
}

impl RegisterState for StateVector {
    fn kind(&self) -> StateKind {
        StateKind::StateVector
    }

    fn reset(&mut self, num_qubits: usize) -> ZenoResult<()> {
        *self = Self::new(num_qubits)?;
        Ok(())
    }

    fn apply_unitary(&mut self, op: &Operator, targets: &[QubitId]) -> ZenoResult<()> {
        check_operator(op, targets, self.num_qubits)?;
        apply_local(&mut self.amplitudes, self.num_qubits, op, targets, false, |k| k);
        Ok(())
    }

    fn expectation(&self, observable: &Observable) -> ZenoResult<f64> {
        observable.validate_for(self.num_qubits)?;
        match observable {
            Observable::Pauli(sum) => self.sum_expectation(sum),
            Observable::Projector(p) => Ok(p.weight(&self.probabilities())),
        }
    }

    fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    fn normalization(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    fn renormalize(&mut self) {
        let norm = self.normalization().sqrt();
        if norm > 0.0 {
            for amp in &mut self.amplitudes {
                *amp /= norm;
            }
        }
    }
}

fn check_limit(num_qubits: usize) -> ZenoResult<()> {
    if num_qubits > MAX_STATEVECTOR_QUBITS {
        return Err(ZenoError::QubitLimitExceeded {
            qubits: num_qubits,
            max: MAX_STATEVECTOR_QUBITS,
            representation: "statevector".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
