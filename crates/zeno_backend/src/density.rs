//! Dense density-matrix register
//!
//! Gantree: L3_Backend → DensityMatrix
//!
//! Mixed-state simulation with exact Pauli channels. Storage is row-major
//! `ρ[r, c] = data[r·2^N + c]`.

use crate::state::{apply_local, check_operator, RegisterState, StateKind};
use crate::statevector::StateVector;
use num_complex::Complex64;
use rand_chacha::ChaCha8Rng;
use zeno_core::constants::limits::MAX_DENSITY_QUBITS;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::observable::Observable;
use zeno_core::operator::Operator;
use zeno_core::pauli::PauliString;
use zeno_core::types::QubitId;
use zeno_noise::{ChannelTarget, PauliChannel};

/// Mixed state on `N` qubits
/// Gantree: DensityMatrix // 2^N × 2^N
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    num_qubits: usize,
    dim: usize,
    data: Vec<Complex64>,
}

impl DensityMatrix {
    /// `|0…0⟩⟨0…0|` on `num_qubits` qubits
    pub fn new(num_qubits: usize) -> ZenoResult<Self> {
        check_limit(num_qubits)?;
        let dim = 1usize << num_qubits;
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        data[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            dim,
            data,
        })
    }

    /// `|ψ⟩⟨ψ|`
    pub fn from_statevector(state: &StateVector) -> ZenoResult<Self> {
        let num_qubits = state.num_qubits();
        check_limit(num_qubits)?;
        let amps = state.amplitudes();
        let dim = amps.len();
        let mut data = Vec::with_capacity(dim * dim);
        for r in amps {
            for c in amps {
                data.push(r * c.conj());
            }
        }
        Ok(Self {
            num_qubits,
            dim,
            data,
        })
    }

    /// Entry `ρ[row, col]`
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    /// Matrix dimension `2^N`
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// `Tr(ρ²)`, 1 for pure states
    pub fn purity(&self) -> f64 {
        let mut total = 0.0;
        for r in 0..self.dim {
            for c in 0..self.dim {
                total += self.get(r, c).norm_sqr();
            }
        }
        total
    }

    /// `Tr(Pρ)`
    pub fn pauli_expectation(&self, pauli: &PauliString) -> ZenoResult<f64> {
        pauli.validate_for(self.num_qubits)?;
        let x = pauli.x_mask();
        let z = pauli.z_mask();
        let y = pauli.y_count();
        let value: Complex64 = (0..self.dim)
            .map(|k| pauli.phase_on(k ^ x, z, y) * self.get(k ^ x, k))
            .sum();
        Ok(value.re)
    }

    /// `ρ → PρP`
    fn conjugate_by_pauli(&mut self, pauli: &PauliString, probability: f64) {
        let x = pauli.x_mask();
        let z = pauli.z_mask();
        let y = pauli.y_count();
        let keep = 1.0 - probability;
        let dim = self.dim;

        // (PρP)[r, c] = φ(r⊕x)·φ(c)·ρ[r⊕x, c⊕x]
        let sign = |r: usize, c: usize| pauli.phase_on(r ^ x, z, y) * pauli.phase_on(c, z, y);

        if x == 0 {
            for r in 0..dim {
                for c in 0..dim {
                    let idx = r * dim + c;
                    let v = self.data[idx];
                    self.data[idx] = keep * v + probability * sign(r, c) * v;
                }
            }
            return;
        }
        for r in 0..dim {
            let rp = r ^ x;
            if r > rp {
                continue;
            }
            for c in 0..dim {
                let cp = c ^ x;
                let a = self.data[r * dim + c];
                let b = self.data[rp * dim + cp];
                self.data[r * dim + c] = keep * a + probability * sign(r, c) * b;
                self.data[rp * dim + cp] = keep * b + probability * sign(rp, cp) * a;
            }
        }
    }
}

impl ChannelTarget for DensityMatrix {
    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn apply_pauli_channel(&mut self, channel: &PauliChannel, _rng: &mut ChaCha8Rng) -> ZenoResult<()> {
        channel.pauli.validate_for(self.num_qubits)?;
        if !channel.is_trivial() {
            self.conjugate_by_pauli(&channel.pauli, channel.probability);
        }
        Ok(())
    }
}

impl RegisterState for DensityMatrix {
    fn kind(&self) -> StateKind {
        StateKind::DensityMatrix
    }

    fn reset(&mut self, num_qubits: usize) -> ZenoResult<()> {
        *self = Self::new(num_qubits)?;
        Ok(())
    }

    /// `ρ → UρU†`: `U` on every column, then `conj(U)` on every row
    fn apply_unitary(&mut self, op: &Operator, targets: &[QubitId]) -> ZenoResult<()> {
        check_operator(op, targets, self.num_qubits)?;
        let dim = self.dim;
        let n = self.num_qubits;
        for c in 0..dim {
            apply_local(&mut self.data, n, op, targets, false, |r| r * dim + c);
        }
        for r in 0..dim {
            apply_local(&mut self.data, n, op, targets, true, |c| r * dim + c);
        }
        Ok(())
    }

    fn expectation(&self, observable: &Observable) -> ZenoResult<f64> {
        observable.validate_for(self.num_qubits)?;
        match observable {
            Observable::Pauli(sum) => {
                let mut total = 0.0;
                for (c, p) in sum.terms() {
                    total += c * self.pauli_expectation(p)?;
                }
                Ok(total)
            }
            Observable::Projector(p) => Ok(p.weight(&self.probabilities())),
        }
    }

    fn probabilities(&self) -> Vec<f64> {
        (0..self.dim).map(|k| self.get(k, k).re).collect()
    }

    fn normalization(&self) -> f64 {
        (0..self.dim).map(|k| self.get(k, k).re).sum()
    }

    fn renormalize(&mut self) {
        let trace = self.normalization();
        if trace > 0.0 {
            for v in &mut self.data {
                *v /= trace;
            }
        }
    }
}

fn check_limit(num_qubits: usize) -> ZenoResult<()> {
    if num_qubits > MAX_DENSITY_QUBITS {
        return Err(ZenoError::QubitLimitExceeded {
            qubits: num_qubits,
            max: MAX_DENSITY_QUBITS,
            representation: "density_matrix".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use zeno_core::builder::CircuitBuilder;
    use zeno_core::circuit::Circuit;
    use zeno_core::observable::Projector;
    use zeno_core::pauli::Pauli;

    fn evolve<S: RegisterState>(state: &mut S, circuit: &Circuit) {
        for layer in circuit.layers() {
            state.apply_layer(layer).unwrap();
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn test_matches_statevector() {
        let circuit = CircuitBuilder::new(3)
            .h(0)
            .sy(1)
            .cnot(0, 2)
            .rzz(1, 2, -0.4)
            .rx(0, 0.3)
            .s(1)
            .build()
            .unwrap();
        let mut sv = StateVector::new(3).unwrap();
        let mut dm = DensityMatrix::new(3).unwrap();
        evolve(&mut sv, &circuit);
        evolve(&mut dm, &circuit);

        let expected = DensityMatrix::from_statevector(&sv).unwrap();
        for r in 0..8 {
            for c in 0..8 {
                assert!((dm.get(r, c) - expected.get(r, c)).norm() < 1e-12);
            }
        }
        for label in ["ZII", "IXZ", "YYI", "XIY"] {
            let obs = Observable::from(PauliString::from_label(label).unwrap());
            assert_relative_eq!(
                dm.expectation(&obs).unwrap(),
                sv.expectation(&obs).unwrap(),
                epsilon = 1e-12
            );
        }
        assert_relative_eq!(dm.purity(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bit_flip_channel() {
        let mut dm = DensityMatrix::new(1).unwrap();
        let ch = PauliChannel::new(PauliString::single(0, Pauli::X), 0.3).unwrap();
        dm.apply_pauli_channel(&ch, &mut rng()).unwrap();
        assert_relative_eq!(dm.expectation(&Observable::z(0)).unwrap(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(dm.normalization(), 1.0, epsilon = 1e-12);
        assert!(dm.purity() < 1.0);
    }

    #[test]
    fn test_y_channel_on_plus_state() {
        let mut dm = DensityMatrix::new(2).unwrap();
        dm.apply_unitary(&Operator::h(), &[1]).unwrap();
        let ch = PauliChannel::new(PauliString::single(1, Pauli::Y), 0.1).unwrap();
        dm.apply_pauli_channel(&ch, &mut rng()).unwrap();

        let x1 = Observable::from(PauliString::single(1, Pauli::X));
        assert_relative_eq!(dm.expectation(&x1).unwrap(), 0.8, epsilon = 1e-12);
        // Y commutes with itself: no effect on ⟨Y⟩
        let y1 = Observable::from(PauliString::single(1, Pauli::Y));
        assert_relative_eq!(dm.expectation(&y1).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_qubit_channel() {
        // Bell state under XZ noise: ⟨ZZ⟩ flips sign with probability p
        let circuit = CircuitBuilder::new(2).h(0).cnot(0, 1).build().unwrap();
        let mut dm = DensityMatrix::new(2).unwrap();
        evolve(&mut dm, &circuit);
        let noise = PauliString::from_label("XZ").unwrap();
        dm.apply_pauli_channel(&PauliChannel::new(noise, 0.25).unwrap(), &mut rng())
            .unwrap();

        let zz = Observable::from(PauliString::from_label("ZZ").unwrap());
        let xx = Observable::from(PauliString::from_label("XX").unwrap());
        assert_relative_eq!(dm.expectation(&zz).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(dm.expectation(&xx).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(dm.normalization(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projector_and_probabilities() {
        let mut dm = DensityMatrix::new(2).unwrap();
        dm.apply_unitary(&Operator::x(), &[0]).unwrap();
        let probs = dm.probabilities();
        assert_relative_eq!(probs[1], 1.0, epsilon = 1e-12);
        let proj = Projector::from_indices(2, [1, 2]).unwrap();
        assert_relative_eq!(dm.expectation(&proj.into()).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_limits_and_errors() {
        assert!(matches!(
            DensityMatrix::new(MAX_DENSITY_QUBITS + 1),
            Err(ZenoError::QubitLimitExceeded { .. })
        ));
        let mut dm = DensityMatrix::new(1).unwrap();
        assert!(dm.apply_unitary(&Operator::cnot(), &[0]).is_err());
        let ch = PauliChannel::new(PauliString::single(3, Pauli::Z), 0.1).unwrap();
        assert!(matches!(
            dm.apply_pauli_channel(&ch, &mut rng()),
            Err(ZenoError::InvalidTarget { qubit: 3, .. })
        ));
    }

    #[test]
    fn test_renormalize_trace() {
        let mut dm = DensityMatrix::new(1).unwrap();
        for v in &mut dm.data {
            *v *= 2.0;
        }
        assert!(dm.check_normalization(1e-9));
        assert_relative_eq!(dm.normalization(), 1.0, epsilon = 1e-15);
    }
}
