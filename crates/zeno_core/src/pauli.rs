//! Pauli operators and sparse Pauli strings
//!
//! Gantree: L1_Operators → Pauli
//!
//! A `PauliString` stores only its non-identity factors, so a weight-2 error
//! on a 127-qubit lattice costs two entries. Labels follow the usual
//! little-endian convention: the rightmost character is qubit 0.

use crate::error::{ZenoError, ZenoResult};
use crate::operator::Operator;
use crate::types::QubitId;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Pauli
// ============================================================================

/// Single-qubit Pauli
/// Gantree: Pauli // I/X/Y/Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity
    I,
    /// Bit flip
    X,
    /// Bit and phase flip
    Y,
    /// Phase flip
    Z,
}

impl Pauli {
    /// Parse from character
    pub fn from_char(c: char) -> ZenoResult<Self> {
        match c.to_ascii_uppercase() {
            'I' => Ok(Pauli::I),
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            _ => Err(ZenoError::InvalidPauli(c.to_string())),
        }
    }

    /// Convert to character
    pub fn to_char(&self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// Has an X component (X or Y)
    #[inline]
    pub fn flips_bit(&self) -> bool {
        matches!(self, Pauli::X | Pauli::Y)
    }

    /// Has a Z component (Z or Y)
    #[inline]
    pub fn flips_phase(&self) -> bool {
        matches!(self, Pauli::Z | Pauli::Y)
    }

    /// 2x2 matrix
    pub fn operator(&self) -> Operator {
        match self {
            Pauli::I => Operator::i(),
            Pauli::X => Operator::x(),
            Pauli::Y => Operator::y(),
            Pauli::Z => Operator::z(),
        }
    }

    /// The three non-identity Paulis
    pub const NON_IDENTITY: [Pauli; 3] = [Pauli::X, Pauli::Y, Pauli::Z];
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ============================================================================
// PauliString
// ============================================================================

/// Sparse tensor product of Paulis, identity on every unlisted qubit
/// Gantree: PauliString // sparse (qubit, Pauli) list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PauliString {
    /// Non-identity factors sorted by qubit
    factors: Vec<(QubitId, Pauli)>,
}

impl PauliString {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Identity string
    pub fn identity() -> Self {
        Self {
            factors: Vec::new(),
        }
    }

    /// Single factor on one qubit
    pub fn single(qubit: QubitId, pauli: Pauli) -> Self {
        Self::from_sparse(&[(qubit, pauli)]).unwrap_or_else(|_| Self::identity())
    }

    /// Build from `(qubit, Pauli)` pairs; identities are dropped
    ///
    /// A qubit listed twice fails with `InvalidPauli`.
    pub fn from_sparse(pairs: &[(QubitId, Pauli)]) -> ZenoResult<Self> {
        let mut factors: Vec<(QubitId, Pauli)> = pairs
            .iter()
            .copied()
            .filter(|&(_, p)| p != Pauli::I)
            .collect();
        factors.sort_by_key(|&(q, _)| q);
        if factors.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(ZenoError::InvalidPauli(format!("{:?}", pairs)));
        }
        Ok(Self { factors })
    }

    /// Parse a dense label, rightmost character is qubit 0 ("XZ" = Z0 X1)
    /// Gantree: from_label(s) -> Result<Self> // parse
    pub fn from_label(label: &str) -> ZenoResult<Self> {
        if label.is_empty() {
            return Err(ZenoError::InvalidPauli(label.to_string()));
        }
        let mut factors = Vec::new();
        for (q, c) in label.chars().rev().enumerate() {
            let p = Pauli::from_char(c).map_err(|_| ZenoError::InvalidPauli(label.to_string()))?;
            if p != Pauli::I {
                factors.push((q, p));
            }
        }
        Ok(Self { factors })
    }

    /// Z on every listed qubit (a Z correlator)
    pub fn z_string(qubits: &[QubitId]) -> ZenoResult<Self> {
        let pairs: Vec<_> = qubits.iter().map(|&q| (q, Pauli::Z)).collect();
        Self::from_sparse(&pairs)
    }

    /// All non-identity strings supported on `qubits` (4^k - 1 of them)
    pub fn all_on(qubits: &[QubitId]) -> Vec<Self> {
        let k = qubits.len();
        let all = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z];
        (1..(1usize << (2 * k)))
            .filter_map(|code| {
                let pairs: Vec<_> = qubits
                    .iter()
                    .enumerate()
                    .map(|(i, &q)| (q, all[(code >> (2 * i)) & 3]))
                    .collect();
                Self::from_sparse(&pairs).ok()
            })
            .collect()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Non-identity factors sorted by qubit
    pub fn factors(&self) -> &[(QubitId, Pauli)] {
        &self.factors
    }

    /// Pauli acting on `qubit`
    pub fn get(&self, qubit: QubitId) -> Pauli {
        self.factors
            .binary_search_by_key(&qubit, |&(q, _)| q)
            .map(|i| self.factors[i].1)
            .unwrap_or(Pauli::I)
    }

    /// Number of non-identity factors
    pub fn weight(&self) -> usize {
        self.factors.len()
    }

    /// True for the identity string
    pub fn is_identity(&self) -> bool {
        self.factors.is_empty()
    }

    /// Highest qubit touched, `None` for the identity
    pub fn max_qubit(&self) -> Option<QubitId> {
        self.factors.last().map(|&(q, _)| q)
    }

    /// Qubits touched
    pub fn support(&self) -> Vec<QubitId> {
        self.factors.iter().map(|&(q, _)| q).collect()
    }

    /// Fails with `InvalidTarget` if any factor lies outside the register
    pub fn validate_for(&self, num_qubits: usize) -> ZenoResult<()> {
        match self.max_qubit() {
            Some(q) if q >= num_qubits => Err(ZenoError::invalid_target(q, num_qubits)),
            _ => Ok(()),
        }
    }

    // ========================================================================
    // Bit-Mask Form
    // ========================================================================

    /// Bits flipped by the string (qubits must be < usize::BITS)
    pub fn x_mask(&self) -> usize {
        self.factors
            .iter()
            .filter(|(_, p)| p.flips_bit())
            .fold(0, |m, &(q, _)| m | (1 << q))
    }

    /// Bits whose value contributes a sign
    pub fn z_mask(&self) -> usize {
        self.factors
            .iter()
            .filter(|(_, p)| p.flips_phase())
            .fold(0, |m, &(q, _)| m | (1 << q))
    }

    /// Number of Y factors
    pub fn y_count(&self) -> usize {
        self.factors.iter().filter(|(_, p)| *p == Pauli::Y).count()
    }

    /// Phase `c` in `P|k⟩ = c |k ⊕ x_mask⟩`
    ///
    /// Equals `i^{#Y} · (-1)^{|k ∧ z_mask|}`.
    #[inline]
    pub fn phase_on(&self, index: usize, z_mask: usize, y_count: usize) -> Complex64 {
        let base = match y_count % 4 {
            0 => Complex64::new(1.0, 0.0),
            1 => Complex64::new(0.0, 1.0),
            2 => Complex64::new(-1.0, 0.0),
            _ => Complex64::new(0.0, -1.0),
        };
        if (index & z_mask).count_ones() % 2 == 1 {
            -base
        } else {
            base
        }
    }

    // ========================================================================
    // Algebra
    // ========================================================================

    /// True if the two strings commute
    pub fn commutes_with(&self, other: &PauliString) -> bool {
        let anti = self
            .factors
            .iter()
            .filter(|&&(q, p)| {
                let o = other.get(q);
                o != Pauli::I && o != p
            })
            .count();
        anti % 2 == 0
    }

    /// Relabel qubits: local qubit `i` becomes `targets[i]`
    ///
    /// Used to place gate-local noise strings onto a gate's qubits.
    pub fn remap(&self, targets: &[QubitId]) -> ZenoResult<Self> {
        let mut pairs = Vec::with_capacity(self.factors.len());
        for &(q, p) in &self.factors {
            let t = targets
                .get(q)
                .ok_or_else(|| ZenoError::invalid_target(q, targets.len()))?;
            pairs.push((*t, p));
        }
        Self::from_sparse(&pairs)
    }

    /// Dense label over `num_qubits` (qubit 0 rightmost)
    pub fn to_label(&self, num_qubits: usize) -> String {
        (0..num_qubits).rev().map(|q| self.get(q).to_char()).collect()
    }

    /// Dense matrix on `num_qubits` qubits
    pub fn to_operator(&self, num_qubits: usize) -> ZenoResult<Operator> {
        self.validate_for(num_qubits)?;
        let mut op = Operator::identity(0);
        for q in (0..num_qubits).rev() {
            op = op.kron(&self.get(q).operator());
        }
        Ok(op)
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "I");
        }
        let parts: Vec<String> = self
            .factors
            .iter()
            .map(|(q, p)| format!("{}{}", p, q))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

// ============================================================================
// Tests
// ============================================================================
