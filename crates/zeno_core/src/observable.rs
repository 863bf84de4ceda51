//! Observables for ZENO
//!
//! Gantree: L1_Operators → Observable
//!
//! Hermitian observables read out by the executor: real combinations of
//! Pauli strings, and projectors onto sets of computational basis states.

use crate::error::{ZenoError, ZenoResult};
use crate::pauli::PauliString;
use crate::types::{Bitstring, QubitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// PauliSum
// ============================================================================

/// Real linear combination of Pauli strings
/// Gantree: PauliSum // Σ c_k P_k
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PauliSum {
    terms: Vec<(f64, PauliString)>,
}

impl PauliSum {
    /// Empty sum (the zero observable)
    pub fn new() -> Self {
        Self::default()
    }

    /// Single Pauli string with unit coefficient
    pub fn single(pauli: PauliString) -> Self {
        Self::new().with_term(1.0, pauli)
    }

    /// Z on one qubit
    pub fn z(qubit: QubitId) -> Self {
        Self::single(PauliString::single(qubit, crate::pauli::Pauli::Z))
    }

    /// Z correlator ⟨Z_a Z_b ...⟩
    pub fn z_correlator(qubits: &[QubitId]) -> ZenoResult<Self> {
        Ok(Self::single(PauliString::z_string(qubits)?))
    }

    /// Average magnetization (1/N) Σ Z_i
    pub fn magnetization(num_qubits: usize) -> Self {
        let c = 1.0 / num_qubits.max(1) as f64;
        (0..num_qubits).fold(Self::new(), |acc, q| {
            acc.with_term(c, PauliString::single(q, crate::pauli::Pauli::Z))
        })
    }

    /// Parse a dense label such as `"ZIZ"`
    pub fn from_label(label: &str) -> ZenoResult<Self> {
        Ok(Self::single(PauliString::from_label(label)?))
    }

    /// Add a term (builder)
    pub fn with_term(mut self, coeff: f64, pauli: PauliString) -> Self {
        self.terms.push((coeff, pauli));
        self
    }

    /// Terms in insertion order
    pub fn terms(&self) -> &[(f64, PauliString)] {
        &self.terms
    }

    /// Check if sum has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Highest qubit touched
    pub fn max_qubit(&self) -> Option<QubitId> {
        self.terms.iter().filter_map(|(_, p)| p.max_qubit()).max()
    }

    /// Fail with `InvalidTarget` if a term lies outside the register
    pub fn validate_for(&self, num_qubits: usize) -> ZenoResult<()> {
        for (c, p) in &self.terms {
            if !c.is_finite() {
                return Err(ZenoError::InvalidConfig(format!(
                    "non-finite coefficient {} on {}",
                    c, p
                )));
            }
            p.validate_for(num_qubits)?;
        }
        Ok(())
    }
}

impl fmt::Display for PauliSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|(c, p)| format!("{:+}·[{}]", c, p))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

// ============================================================================
// Projector
// ============================================================================

/// Projector Σ_{b ∈ S} |b⟩⟨b| onto a set of basis states
/// Gantree: Projector // basis-state set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projector {
    num_qubits: usize,
    states: BTreeSet<usize>,
}

impl Projector {
    /// Build from basis-state indices
    pub fn from_indices(
        num_qubits: usize,
        indices: impl IntoIterator<Item = usize>,
    ) -> ZenoResult<Self> {
        let dim = 1usize.checked_shl(num_qubits as u32).unwrap_or(0);
        let mut states = BTreeSet::new();
        for idx in indices {
            if idx >= dim {
                return Err(ZenoError::InvalidBitstring(format!(
                    "index {} out of range for {} qubits",
                    idx, num_qubits
                )));
            }
            states.insert(idx);
        }
        Ok(Self { num_qubits, states })
    }

    /// Build from printed bitstrings (qubit 0 rightmost)
    pub fn from_bitstrings(num_qubits: usize, labels: &[&str]) -> ZenoResult<Self> {
        let mut indices = Vec::with_capacity(labels.len());
        for label in labels {
            let bs = Bitstring::parse(label)?;
            if bs.len() != num_qubits {
                return Err(ZenoError::InvalidBitstring(label.to_string()));
            }
            indices.push(bs.to_index());
        }
        Self::from_indices(num_qubits, indices)
    }

    /// Projector onto every state whose probability is at least the median
    /// Gantree: median(probabilities) -> Projector // heavy-output set
    ///
    /// The median of an even-length list is the mean of its two middle
    /// values.
    pub fn above_median(probabilities: &[f64]) -> ZenoResult<Self> {
        let dim = probabilities.len();
        if dim == 0 || !dim.is_power_of_two() {
            return Err(ZenoError::DimensionMismatch {
                expected: dim.next_power_of_two().max(1),
                found: dim,
            });
        }
        let num_qubits = dim.trailing_zeros() as usize;
        let median = median(probabilities);
        Self::from_indices(
            num_qubits,
            probabilities
                .iter()
                .enumerate()
                .filter(|(_, &p)| p >= median)
                .map(|(i, _)| i),
        )
    }

    /// Register width
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Basis-state indices in the image
    pub fn states(&self) -> &BTreeSet<usize> {
        &self.states
    }

    /// Rank of the projector
    pub fn rank(&self) -> usize {
        self.states.len()
    }

    /// True if `index` is in the image
    pub fn contains(&self, index: usize) -> bool {
        self.states.contains(&index)
    }

    /// Sum of `probabilities` over the image
    pub fn weight(&self, probabilities: &[f64]) -> f64 {
        self.states
            .iter()
            .filter_map(|&i| probabilities.get(i))
            .sum()
    }
}

/// Median of a slice (mean of the two middle values for even length)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

// ============================================================================
// Observable
// ============================================================================

/// Observable read out at the end of a run
/// Gantree: Observable // Pauli | Projector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observable {
    /// Pauli-string combination
    Pauli(PauliSum),
    /// Basis-state projector
    Projector(Projector),
}

impl Observable {
    /// Z on one qubit
    pub fn z(qubit: QubitId) -> Self {
        Observable::Pauli(PauliSum::z(qubit))
    }

    /// Fail with `InvalidTarget` / `DimensionMismatch` if the observable does
    /// not fit an `num_qubits` register
    pub fn validate_for(&self, num_qubits: usize) -> ZenoResult<()> {
        match self {
            Observable::Pauli(sum) => sum.validate_for(num_qubits),
            Observable::Projector(p) if p.num_qubits() != num_qubits => {
                Err(ZenoError::DimensionMismatch {
                    expected: num_qubits,
                    found: p.num_qubits(),
                })
            }
            Observable::Projector(_) => Ok(()),
        }
    }
}

impl From<PauliSum> for Observable {
    fn from(sum: PauliSum) -> Self {
        Observable::Pauli(sum)
    }
}

impl From<PauliString> for Observable {
    fn from(p: PauliString) -> Self {
        Observable::Pauli(PauliSum::single(p))
    }
}

impl From<Projector> for Observable {
    fn from(p: Projector) -> Self {
        Observable::Projector(p)
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observable::Pauli(sum) => write!(f, "{}", sum),
            Observable::Projector(p) => write!(f, "Projector(rank {} of 2^{})", p.rank(), p.num_qubits),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
