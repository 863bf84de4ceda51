//! Operator library
//!
//! Gantree: L1_Operators → Operator
//!
//! Dense complex matrices for the gates used by the Ising circuits, plus the
//! algebra needed to test and embed them (adjoint, product, Kronecker
//! product, embedding into an N-qubit space).
//!
//! Local index convention: for an operator acting on `targets`, the first
//! target is the most significant bit of the local index. With
//! `targets = [control, target]` the CNOT matrix is the textbook one.

use crate::constants::numerics::DEFAULT_TOLERANCE;
use crate::error::{ZenoError, ZenoResult};
use crate::types::{Angle, QubitId};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I_UNIT: Complex64 = Complex64::new(0.0, 1.0);

// ============================================================================
// Tolerance
// ============================================================================

/// Numerical tolerance passed explicitly to checks
/// Gantree: Tolerance // epsilon config
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Max-abs entry tolerance
    pub epsilon: f64,
}

impl Tolerance {
    /// Create with a custom epsilon
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_TOLERANCE,
        }
    }
}

// ============================================================================
// Operator
// ============================================================================

/// Square complex matrix of dimension 2^k, row-major
/// Gantree: Operator // dense matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    dim: usize,
    data: Vec<Complex64>,
}

impl Operator {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Build from row-major data
    ///
    /// Fails with `DimensionMismatch` unless `data.len() == dim * dim` and
    /// `dim` is a power of two.
    pub fn from_vec(dim: usize, data: Vec<Complex64>) -> ZenoResult<Self> {
        if dim == 0 || !dim.is_power_of_two() {
            return Err(ZenoError::DimensionMismatch {
                expected: dim.next_power_of_two(),
                found: dim,
            });
        }
        if data.len() != dim * dim {
            return Err(ZenoError::DimensionMismatch {
                expected: dim * dim,
                found: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    /// Build from nested rows
    pub fn from_rows(rows: Vec<Vec<Complex64>>) -> ZenoResult<Self> {
        let dim = rows.len();
        let mut data = Vec::with_capacity(dim * dim);
        for row in rows {
            if row.len() != dim {
                return Err(ZenoError::DimensionMismatch {
                    expected: dim,
                    found: row.len(),
                });
            }
            data.extend(row);
        }
        Self::from_vec(dim, data)
    }

    /// Identity on `num_qubits` qubits
    pub fn identity(num_qubits: usize) -> Self {
        let dim = 1usize << num_qubits;
        let mut data = vec![ZERO; dim * dim];
        for k in 0..dim {
            data[k * dim + k] = ONE;
        }
        Self { dim, data }
    }

    fn small(rows: [[Complex64; 2]; 2]) -> Self {
        Self {
            dim: 2,
            data: vec![rows[0][0], rows[0][1], rows[1][0], rows[1][1]],
        }
    }

    fn diagonal(entries: &[Complex64]) -> Self {
        let dim = entries.len();
        let mut data = vec![ZERO; dim * dim];
        for (k, &v) in entries.iter().enumerate() {
            data[k * dim + k] = v;
        }
        Self { dim, data }
    }

    // ========================================================================
    // Gate Library
    // ========================================================================

    /// Single-qubit identity
    pub fn i() -> Self {
        Self::identity(1)
    }

    /// Pauli X
    pub fn x() -> Self {
        Self::small([[ZERO, ONE], [ONE, ZERO]])
    }

    /// Pauli Y
    pub fn y() -> Self {
        Self::small([[ZERO, -I_UNIT], [I_UNIT, ZERO]])
    }

    /// Pauli Z
    pub fn z() -> Self {
        Self::diagonal(&[ONE, -ONE])
    }

    /// Hadamard
    pub fn h() -> Self {
        let r = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
        Self::small([[r, r], [r, -r]])
    }

    /// S = diag(1, i)
    pub fn s() -> Self {
        Self::diagonal(&[ONE, I_UNIT])
    }

    /// S† = diag(1, -i)
    pub fn sdg() -> Self {
        Self::diagonal(&[ONE, -I_UNIT])
    }

    /// T = diag(1, e^{iπ/4})
    pub fn t() -> Self {
        Self::diagonal(&[ONE, Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_4)])
    }

    /// √Y = ½[[1+i, -1-i], [1+i, 1+i]]
    pub fn sqrt_y() -> Self {
        let a = Complex64::new(0.5, 0.5);
        Self::small([[a, -a], [a, a]])
    }

    /// √Y† = ½[[1-i, 1-i], [-1+i, 1-i]]
    pub fn sqrt_ydg() -> Self {
        let b = Complex64::new(0.5, -0.5);
        Self::small([[b, b], [-b, b]])
    }

    /// CNOT with the control as the first target
    pub fn cnot() -> Self {
        let mut data = vec![ZERO; 16];
        data[0] = ONE;
        data[5] = ONE;
        data[2 * 4 + 3] = ONE;
        data[3 * 4 + 2] = ONE;
        Self { dim: 4, data }
    }

    /// RX(θ) = exp(-iθX/2)
    pub fn rx(theta: Angle) -> Self {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new(0.0, -(theta / 2.0).sin());
        Self::small([[c, s], [s, c]])
    }

    /// RZZ(θ) = exp(-iθ Z⊗Z / 2)
    pub fn rzz(theta: Angle) -> Self {
        let even = Complex64::from_polar(1.0, -theta / 2.0);
        let odd = Complex64::from_polar(1.0, theta / 2.0);
        Self::diagonal(&[even, odd, odd, even])
    }

    /// Look up an operator by name
    /// Gantree: operator(name, params) -> Operator // library lookup
    pub fn by_name(name: &str, params: &[Angle]) -> ZenoResult<Self> {
        let lower = name.to_ascii_lowercase();
        let fixed = |op: Operator| {
            if params.is_empty() {
                Ok(op)
            } else {
                Err(ZenoError::InvalidGateParameter(format!(
                    "'{}' takes no parameters, got {}",
                    name,
                    params.len()
                )))
            }
        };
        let angle = || match params {
            [theta] if theta.is_finite() => Ok(*theta),
            [theta] => Err(ZenoError::InvalidAngle(*theta)),
            _ => Err(ZenoError::InvalidGateParameter(format!(
                "'{}' takes one angle, got {}",
                name,
                params.len()
            ))),
        };
        match lower.as_str() {
            "i" | "id" => fixed(Self::i()),
            "x" => fixed(Self::x()),
            "y" => fixed(Self::y()),
            "z" => fixed(Self::z()),
            "h" => fixed(Self::h()),
            "s" => fixed(Self::s()),
            "sdg" => fixed(Self::sdg()),
            "t" => fixed(Self::t()),
            "sy" | "sqrt_y" => fixed(Self::sqrt_y()),
            "sydg" | "sqrt_ydg" => fixed(Self::sqrt_ydg()),
            "cx" | "cnot" => fixed(Self::cnot()),
            "rx" => Ok(Self::rx(angle()?)),
            "rzz" => Ok(Self::rzz(angle()?)),
            _ => Err(ZenoError::InvalidGateParameter(format!(
                "unknown operator '{}'",
                name
            ))),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Matrix dimension
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of qubits the operator acts on
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.dim.trailing_zeros() as usize
    }

    /// Entry at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    /// Row-major entries
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    // ========================================================================
    // Algebra
    // ========================================================================

    /// Conjugate transpose
    pub fn adjoint(&self) -> Self {
        let n = self.dim;
        let mut data = vec![ZERO; n * n];
        for r in 0..n {
            for c in 0..n {
                data[c * n + r] = self.data[r * n + c].conj();
            }
        }
        Self { dim: n, data }
    }

    /// Matrix product `self · other`
    pub fn matmul(&self, other: &Operator) -> ZenoResult<Self> {
        if self.dim != other.dim {
            return Err(ZenoError::DimensionMismatch {
                expected: self.dim,
                found: other.dim,
            });
        }
        let n = self.dim;
        let mut data = vec![ZERO; n * n];
        for r in 0..n {
            for k in 0..n {
                let a = self.data[r * n + k];
                if a == ZERO {
                    continue;
                }
                for c in 0..n {
                    data[r * n + c] += a * other.data[k * n + c];
                }
            }
        }
        Ok(Self { dim: n, data })
    }

    /// Kronecker product `self ⊗ other`
    pub fn kron(&self, other: &Operator) -> Self {
        let (n, m) = (self.dim, other.dim);
        let dim = n * m;
        let mut data = vec![ZERO; dim * dim];
        for r1 in 0..n {
            for c1 in 0..n {
                let a = self.data[r1 * n + c1];
                for r2 in 0..m {
                    for c2 in 0..m {
                        data[(r1 * m + r2) * dim + c1 * m + c2] = a * other.data[r2 * m + c2];
                    }
                }
            }
        }
        Self { dim, data }
    }

    /// Multiply every entry by a scalar
    pub fn scale(&self, factor: Complex64) -> Self {
        Self {
            dim: self.dim,
            data: self.data.iter().map(|v| v * factor).collect(),
        }
    }

    /// Largest absolute entry difference (infinite if dimensions differ)
    pub fn distance(&self, other: &Operator) -> f64 {
        if self.dim != other.dim {
            return f64::INFINITY;
        }
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    /// Entry-wise equality within tolerance
    pub fn approx_eq(&self, other: &Operator, tol: Tolerance) -> bool {
        self.distance(other) <= tol.epsilon
    }

    /// Check ‖U·U† − I‖ ≤ ε
    pub fn is_unitary(&self, tol: Tolerance) -> bool {
        match self.matmul(&self.adjoint()) {
            Ok(product) => product.approx_eq(&Self::identity(self.num_qubits()), tol),
            Err(_) => false,
        }
    }

    /// Embed this operator on `targets` of an `num_qubits` register
    pub fn embed(&self, targets: &[QubitId], num_qubits: usize) -> ZenoResult<Self> {
        embed(self, targets, num_qubits)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Operator({}x{})", self.dim, self.dim)?;
        for r in 0..self.dim {
            let row: Vec<String> = (0..self.dim)
                .map(|c| {
                    let v = self.get(r, c);
                    format!("{:+.4}{:+.4}i", v.re, v.im)
                })
                .collect();
            writeln!(f, "  [{}]", row.join(", "))?;
        }
        Ok(())
    }
}

// ============================================================================
// Embedding
// ============================================================================

/// Check that targets are in range and pairwise distinct
/// Gantree: validate_targets(targets, n) -> Result // InvalidTarget
pub fn validate_targets(targets: &[QubitId], num_qubits: usize) -> ZenoResult<()> {
    for (i, &q) in targets.iter().enumerate() {
        if q >= num_qubits {
            return Err(ZenoError::invalid_target(q, num_qubits));
        }
        if targets[..i].contains(&q) {
            return Err(ZenoError::repeated_target(q));
        }
    }
    Ok(())
}

/// Local index of `index` restricted to `targets` (first target = MSB)
#[inline]
pub fn local_index(index: usize, targets: &[QubitId]) -> usize {
    targets
        .iter()
        .fold(0, |acc, &q| (acc << 1) | ((index >> q) & 1))
}

/// Write local bits back into `index` at `targets`
#[inline]
pub fn scatter_local(index: usize, local: usize, targets: &[QubitId]) -> usize {
    let k = targets.len();
    targets.iter().enumerate().fold(index, |acc, (i, &q)| {
        let bit = (local >> (k - 1 - i)) & 1;
        (acc & !(1 << q)) | (bit << q)
    })
}

/// Full `2^n × 2^n` operator with `op` on `targets` and identity elsewhere
/// Gantree: embed(op, targets, n) -> Operator // tensor embedding
pub fn embed(op: &Operator, targets: &[QubitId], num_qubits: usize) -> ZenoResult<Operator> {
    validate_targets(targets, num_qubits)?;
    let expected = 1usize << targets.len();
    if op.dim() != expected {
        return Err(ZenoError::DimensionMismatch {
            expected,
            found: op.dim(),
        });
    }
    let dim = 1usize << num_qubits;
    let target_mask = targets.iter().fold(0usize, |m, &q| m | (1 << q));
    let mut data = vec![ZERO; dim * dim];
    for row in 0..dim {
        let lr = local_index(row, targets);
        let rest = row & !target_mask;
        for lc in 0..op.dim() {
            let v = op.get(lr, lc);
            if v != ZERO {
                data[row * dim + scatter_local(rest, lc, targets)] = v;
            }
        }
    }
    Ok(Operator { dim, data })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    fn paulis() -> Vec<Operator> {
        vec![Operator::x(), Operator::y(), Operator::z()]
    }

    #[test]
    fn test_pauli_involution() {
        for p in paulis() {
            assert!(p.matmul(&p).unwrap().approx_eq(&Operator::i(), tol()));
        }
    }

    #[test]
    fn test_pauli_anticommutation() {
        let ps = paulis();
        for (a, p) in ps.iter().enumerate() {
            for (b, q) in ps.iter().enumerate() {
                if a == b {
                    continue;
                }
                let pq = p.matmul(q).unwrap();
                let qp = q.matmul(p).unwrap().scale(-ONE);
                assert!(pq.approx_eq(&qp, tol()));
            }
        }
    }

    #[test]
    fn test_rx_inverse() {
        for theta in [0.3, -1.2, PI, 2.5] {
            let prod = Operator::rx(theta).matmul(&Operator::rx(-theta)).unwrap();
            assert!(prod.approx_eq(&Operator::i(), tol()));
        }
        assert!(Operator::rx(0.0).approx_eq(&Operator::i(), tol()));
    }

    #[test]
    fn test_all_gates_unitary() {
        let gates = vec![
            Operator::i(),
            Operator::x(),
            Operator::y(),
            Operator::z(),
            Operator::h(),
            Operator::s(),
            Operator::sdg(),
            Operator::t(),
            Operator::sqrt_y(),
            Operator::sqrt_ydg(),
            Operator::cnot(),
            Operator::rx(0.7),
            Operator::rzz(-0.4),
        ];
        for g in gates {
            assert!(g.is_unitary(tol()));
        }
    }

    #[test]
    fn test_sqrt_y_squares_to_y() {
        let sy2 = Operator::sqrt_y().matmul(&Operator::sqrt_y()).unwrap();
        assert!(sy2.approx_eq(&Operator::y(), tol()));
        let inv = Operator::sqrt_y().matmul(&Operator::sqrt_ydg()).unwrap();
        assert!(inv.approx_eq(&Operator::i(), tol()));
        assert!(Operator::sqrt_ydg().approx_eq(&Operator::sqrt_y().adjoint(), tol()));
    }

    #[test]
    fn test_cnot_self_inverse() {
        let c = Operator::cnot();
        assert!(c.matmul(&c).unwrap().approx_eq(&Operator::identity(2), tol()));
    }

    #[test]
    fn test_rzz_decomposition() {
        // e^{iπ/4} · SYdg(b) · CX(a,b) · SY(b) · (Sdg ⊗ Sdg)
        let sdg2 = Operator::sdg().kron(&Operator::sdg());
        let sy_b = Operator::i().kron(&Operator::sqrt_y());
        let sydg_b = Operator::i().kron(&Operator::sqrt_ydg());
        let product = sydg_b
            .matmul(&Operator::cnot())
            .unwrap()
            .matmul(&sy_b)
            .unwrap()
            .matmul(&sdg2)
            .unwrap()
            .scale(Complex64::from_polar(1.0, FRAC_PI_4));
        assert!(product.approx_eq(&Operator::rzz(-FRAC_PI_2), tol()));
    }

    #[test]
    fn test_kron_order() {
        // X ⊗ I flips the most significant local bit
        let xi = Operator::x().kron(&Operator::i());
        assert_eq!(xi.get(2, 0), ONE);
        assert_eq!(xi.get(1, 0), ZERO);
    }

    #[test]
    fn test_embed_little_endian() {
        // X on qubit 0 of a 2-qubit register is I ⊗ X in matrix order
        let e = embed(&Operator::x(), &[0], 2).unwrap();
        assert!(e.approx_eq(&Operator::i().kron(&Operator::x()), tol()));
        let e1 = embed(&Operator::x(), &[1], 2).unwrap();
        assert!(e1.approx_eq(&Operator::x().kron(&Operator::i()), tol()));
    }

    #[test]
    fn test_embed_cnot_reversed() {
        // control 0, target 1: |q1 q0> = |01> -> |11>
        let e = embed(&Operator::cnot(), &[0, 1], 2).unwrap();
        assert_eq!(e.get(3, 1), ONE);
        assert_eq!(e.get(1, 1), ZERO);
    }

    #[test]
    fn test_embed_errors() {
        assert!(matches!(
            embed(&Operator::x(), &[3], 2),
            Err(ZenoError::InvalidTarget { qubit: 3, .. })
        ));
        assert!(matches!(
            embed(&Operator::cnot(), &[1, 1], 2),
            Err(ZenoError::InvalidTarget { .. })
        ));
        assert!(matches!(
            embed(&Operator::cnot(), &[0], 2),
            Err(ZenoError::DimensionMismatch {
                expected: 2,
                found: 4
            })
        ));
    }

    #[test]
    fn test_by_name() {
        assert!(Operator::by_name("RX", &[0.5])
            .unwrap()
            .approx_eq(&Operator::rx(0.5), tol()));
        assert!(Operator::by_name("sdg", &[]).is_ok());
        assert!(Operator::by_name("rx", &[]).is_err());
        assert!(Operator::by_name("x", &[1.0]).is_err());
        assert!(Operator::by_name("foo", &[]).is_err());
    }

    #[test]
    fn test_from_rows_validation() {
        assert!(Operator::from_rows(vec![vec![ONE, ZERO], vec![ZERO]]).is_err());
        assert!(Operator::from_vec(3, vec![ONE; 9]).is_err());
        assert!(Operator::from_rows(vec![vec![ONE, ZERO], vec![ZERO, ONE]]).is_ok());
    }

    #[test]
    fn test_local_scatter_roundtrip() {
        let targets = [3, 0];
        for idx in 0..16usize {
            let l = local_index(idx, &targets);
            assert_eq!(scatter_local(idx, l, &targets), idx);
        }
        // qubit 3 is the MSB of the local index
        assert_eq!(local_index(0b1000, &targets), 0b10);
    }
}
