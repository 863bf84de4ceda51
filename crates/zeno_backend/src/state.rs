//! Register state strategy
//!
//! Gantree: L3_Backend → RegisterState
//!
//! The executor picks one representation per run and drives it only
//! through this trait.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeno_core::circuit::Layer;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::observable::Observable;
use zeno_core::operator::{scatter_local, validate_targets, Operator};
use zeno_core::types::QubitId;
use zeno_noise::ChannelTarget;

/// Representation tag
/// Gantree: StateKind // StateVector | DensityMatrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    /// Pure state, `2^N` amplitudes
    StateVector,
    /// Mixed state, `2^N × 2^N` matrix
    DensityMatrix,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::StateVector => write!(f, "statevector"),
            StateKind::DensityMatrix => write!(f, "density_matrix"),
        }
    }
}

/// Qubit register under simulation
/// Gantree: RegisterState // trait
pub trait RegisterState: ChannelTarget + Send {
    /// Representation tag
    fn kind(&self) -> StateKind;

    /// Reinitialize to `|0…0⟩` on `num_qubits` qubits
    fn reset(&mut self, num_qubits: usize) -> ZenoResult<()>;

    /// Apply `op` on `targets` (first target = most significant local bit)
    fn apply_unitary(&mut self, op: &Operator, targets: &[QubitId]) -> ZenoResult<()>;

    /// Expectation value of a Hermitian observable
    fn expectation(&self, observable: &Observable) -> ZenoResult<f64>;

    /// Computational-basis distribution, indexed little-endian
    fn probabilities(&self) -> Vec<f64>;

    /// Norm squared (state vector) or trace (density matrix)
    fn normalization(&self) -> f64;

    /// Rescale so that `normalization() == 1`
    fn renormalize(&mut self);

    /// Apply every gate of a layer
    fn apply_layer(&mut self, layer: &Layer) -> ZenoResult<()> {
        for gate in layer.gates() {
            self.apply_unitary(&gate.operator(), &gate.qubits())?;
        }
        Ok(())
    }

    /// Renormalize if normalization drifted beyond `tolerance`
    /// Gantree: check_normalization(tol) -> bool // warn, never fail
    fn check_normalization(&mut self, tolerance: f64) -> bool {
        let norm = self.normalization();
        if (norm - 1.0).abs() <= tolerance {
            return false;
        }
        log::warn!(
            "{} normalization drifted to {:.3e}, renormalizing",
            self.kind(),
            norm
        );
        self.renormalize();
        true
    }
}

// ============================================================================
// Kernel Helpers
// ============================================================================

/// Validate targets and operator size against an `num_qubits` register
pub(crate) fn check_operator(op: &Operator, targets: &[QubitId], num_qubits: usize) -> ZenoResult<()> {
    validate_targets(targets, num_qubits)?;
    let expected = 1usize << targets.len();
    if op.dim() != expected {
        return Err(ZenoError::DimensionMismatch {
            expected,
            found: op.dim(),
        });
    }
    Ok(())
}

/// Apply a local operator to the entries of `data` addressed by `position`
///
/// `position(k)` maps basis index `k` of the register to a slot in `data`,
/// so the same kernel serves state vectors, matrix rows and matrix columns.
/// With `conjugate` the entrywise conjugate of `op` is used.
pub(crate) fn apply_local<F>(
    data: &mut [Complex64],
    num_qubits: usize,
    op: &Operator,
    targets: &[QubitId],
    conjugate: bool,
    position: F,
) where
    F: Fn(usize) -> usize,
{
    let d = op.dim();
    let mask = targets.iter().fold(0usize, |m, &q| m | (1 << q));
    let mut slots = vec![0usize; d];
    let mut old = vec![Complex64::new(0.0, 0.0); d];

    for base in (0..1usize << num_qubits).filter(|b| b & mask == 0) {
        for l in 0..d {
            slots[l] = position(scatter_local(base, l, targets));
            old[l] = data[slots[l]];
        }
        for (row, &slot) in slots.iter().enumerate() {
            let mut acc = Complex64::new(0.0, 0.0);
            for (col, amp) in old.iter().enumerate() {
                let u = op.get(row, col);
                let u = if conjugate { u.conj() } else { u };
                acc += u * amp;
            }
            data[slot] = acc;
        }
    }
}

