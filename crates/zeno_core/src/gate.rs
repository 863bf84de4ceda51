//! Gate instructions for ZENO
//!
//! Gantree: L1_Circuit → Gate
//!
//! A gate is either a single-qubit or a two-qubit instruction. Both arms
//! carry a kind enum, so every place that turns gates into matrices matches
//! exhaustively and a new kind is a compile-time change.

use crate::error::{ZenoError, ZenoResult};
use crate::operator::{validate_targets, Operator};
use crate::types::{Angle, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Gate Kinds
// ============================================================================

/// Single-qubit gate kinds
/// Gantree: SingleQubitGate // 1Q kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SingleQubitGate {
    /// Identity (padding)
    I,
    /// Pauli-X
    X,
    /// Pauli-Y
    Y,
    /// Pauli-Z
    Z,
    /// Hadamard
    H,
    /// S = √Z
    S,
    /// S†
    Sdg,
    /// T = ⁴√Z
    T,
    /// √Y
    SqrtY,
    /// √Y†
    SqrtYdg,
    /// Rotation around X
    Rx(Angle),
}

impl SingleQubitGate {
    /// Dense 2x2 matrix
    pub fn operator(&self) -> Operator {
        match self {
            SingleQubitGate::I => Operator::i(),
            SingleQubitGate::X => Operator::x(),
            SingleQubitGate::Y => Operator::y(),
            SingleQubitGate::Z => Operator::z(),
            SingleQubitGate::H => Operator::h(),
            SingleQubitGate::S => Operator::s(),
            SingleQubitGate::Sdg => Operator::sdg(),
            SingleQubitGate::T => Operator::t(),
            SingleQubitGate::SqrtY => Operator::sqrt_y(),
            SingleQubitGate::SqrtYdg => Operator::sqrt_ydg(),
            SingleQubitGate::Rx(theta) => Operator::rx(*theta),
        }
    }

    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            SingleQubitGate::I => "id",
            SingleQubitGate::X => "x",
            SingleQubitGate::Y => "y",
            SingleQubitGate::Z => "z",
            SingleQubitGate::H => "h",
            SingleQubitGate::S => "s",
            SingleQubitGate::Sdg => "sdg",
            SingleQubitGate::T => "t",
            SingleQubitGate::SqrtY => "sy",
            SingleQubitGate::SqrtYdg => "sydg",
            SingleQubitGate::Rx(_) => "rx",
        }
    }

    /// Inverse gate, `None` for T (no T† kind)
    pub fn inverse(&self) -> Option<Self> {
        Some(match self {
            SingleQubitGate::S => SingleQubitGate::Sdg,
            SingleQubitGate::Sdg => SingleQubitGate::S,
            SingleQubitGate::SqrtY => SingleQubitGate::SqrtYdg,
            SingleQubitGate::SqrtYdg => SingleQubitGate::SqrtY,
            SingleQubitGate::Rx(theta) => SingleQubitGate::Rx(-theta),
            SingleQubitGate::T => return None,
            other => *other,
        })
    }
}

/// Two-qubit gate kinds
/// Gantree: TwoQubitGate // 2Q kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TwoQubitGate {
    /// Controlled-NOT
    Cnot,
    /// exp(-iθ ZZ / 2)
    Rzz(Angle),
}

impl TwoQubitGate {
    /// Dense 4x4 matrix, control as the most significant local bit
    pub fn operator(&self) -> Operator {
        match self {
            TwoQubitGate::Cnot => Operator::cnot(),
            TwoQubitGate::Rzz(theta) => Operator::rzz(*theta),
        }
    }

    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            TwoQubitGate::Cnot => "cx",
            TwoQubitGate::Rzz(_) => "rzz",
        }
    }

    /// Inverse gate
    pub fn inverse(&self) -> Self {
        match self {
            TwoQubitGate::Cnot => TwoQubitGate::Cnot,
            TwoQubitGate::Rzz(theta) => TwoQubitGate::Rzz(-theta),
        }
    }
}

// ============================================================================
// Gate
// ============================================================================

/// Gate instruction placed in a circuit layer
/// Gantree: Gate // Single | Two
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Single-qubit instruction
    Single {
        /// Gate kind
        kind: SingleQubitGate,
        /// Target qubit
        target: QubitId,
    },
    /// Two-qubit instruction (for RZZ the roles are symmetric)
    Two {
        /// Gate kind
        kind: TwoQubitGate,
        /// First qubit (control for CNOT)
        control: QubitId,
        /// Second qubit
        target: QubitId,
    },
}

impl Gate {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Single-qubit gate
    pub fn single(kind: SingleQubitGate, target: QubitId) -> Self {
        Gate::Single { kind, target }
    }

    /// Two-qubit gate
    pub fn two(kind: TwoQubitGate, control: QubitId, target: QubitId) -> Self {
        Gate::Two {
            kind,
            control,
            target,
        }
    }

    /// RX(θ) on `q`
    pub fn rx(q: QubitId, theta: Angle) -> Self {
        Self::single(SingleQubitGate::Rx(theta), q)
    }

    /// CNOT
    pub fn cnot(control: QubitId, target: QubitId) -> Self {
        Self::two(TwoQubitGate::Cnot, control, target)
    }

    /// RZZ(θ)
    pub fn rzz(a: QubitId, b: QubitId, theta: Angle) -> Self {
        Self::two(TwoQubitGate::Rzz(theta), a, b)
    }

    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Qubits touched, in local-index order
    /// Gantree: qubits(&self) -> Vec<QubitId> // targets
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::Single { target, .. } => vec![*target],
            Gate::Two {
                control, target, ..
            } => vec![*control, *target],
        }
    }

    /// Check if gate is single-qubit
    pub fn is_single_qubit(&self) -> bool {
        matches!(self, Gate::Single { .. })
    }

    /// Check if gate is two-qubit
    pub fn is_two_qubit(&self) -> bool {
        matches!(self, Gate::Two { .. })
    }

    /// Rotation angle for parametrized kinds
    pub fn angle(&self) -> Option<Angle> {
        match self {
            Gate::Single {
                kind: SingleQubitGate::Rx(theta),
                ..
            }
            | Gate::Two {
                kind: TwoQubitGate::Rzz(theta),
                ..
            } => Some(*theta),
            _ => None,
        }
    }

    /// Check if gate has parameters
    pub fn is_parameterized(&self) -> bool {
        self.angle().is_some()
    }

    /// Get gate name
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Single { kind, .. } => kind.name(),
            Gate::Two { kind, .. } => kind.name(),
        }
    }

    /// Local matrix (dimension 2 or 4)
    /// Gantree: operator(&self) -> Operator // matrix
    pub fn operator(&self) -> Operator {
        match self {
            Gate::Single { kind, .. } => kind.operator(),
            Gate::Two { kind, .. } => kind.operator(),
        }
    }

    /// Inverse instruction on the same qubits
    pub fn inverse(&self) -> Option<Self> {
        match self {
            Gate::Single { kind, target } => kind.inverse().map(|k| Gate::single(k, *target)),
            Gate::Two {
                kind,
                control,
                target,
            } => Some(Gate::two(kind.inverse(), *control, *target)),
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check targets against the register and that angles are finite
    pub fn validate(&self, num_qubits: usize) -> ZenoResult<()> {
        validate_targets(&self.qubits(), num_qubits)?;
        match self.angle() {
            Some(theta) if !theta.is_finite() => Err(ZenoError::InvalidAngle(theta)),
            _ => Ok(()),
        }
    }

    /// Convert to OpenQASM 2.0 string
    ///
    /// `sy`/`sydg` are emitted as `ry(±π/2)`, which differ by a global phase.
    pub fn to_qasm(&self) -> String {
        match self {
            Gate::Single { kind, target } => match kind {
                SingleQubitGate::Rx(theta) => format!("rx({}) q[{}];", theta, target),
                SingleQubitGate::SqrtY => format!("ry(pi/2) q[{}];", target),
                SingleQubitGate::SqrtYdg => format!("ry(-pi/2) q[{}];", target),
                other => format!("{} q[{}];", other.name(), target),
            },
            Gate::Two {
                kind,
                control,
                target,
            } => match kind {
                TwoQubitGate::Cnot => format!("cx q[{}],q[{}];", control, target),
                TwoQubitGate::Rzz(theta) => {
                    format!("rzz({}) q[{}],q[{}];", theta, control, target)
                }
            },
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_qasm())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Tolerance;

    #[test]
    fn test_gate_qubits() {
        assert_eq!(Gate::rx(3, 0.1).qubits(), vec![3]);
        assert_eq!(Gate::cnot(0, 1).qubits(), vec![0, 1]);
    }

    #[test]
    fn test_gate_classification() {
        assert!(Gate::single(SingleQubitGate::H, 0).is_single_qubit());
        assert!(Gate::rzz(0, 1, 0.2).is_two_qubit());
        assert!(Gate::rzz(0, 1, 0.2).is_parameterized());
        assert!(!Gate::cnot(0, 1).is_parameterized());
    }

    #[test]
    fn test_gate_to_qasm() {
        assert_eq!(Gate::cnot(0, 1).to_qasm(), "cx q[0],q[1];");
        assert_eq!(Gate::single(SingleQubitGate::Sdg, 2).to_qasm(), "sdg q[2];");
        assert!(Gate::rx(0, 0.5).to_qasm().starts_with("rx(0.5)"));
    }

    #[test]
    fn test_gate_validate() {
        assert!(Gate::cnot(0, 1).validate(2).is_ok());
        assert!(matches!(
            Gate::cnot(1, 1).validate(2),
            Err(ZenoError::InvalidTarget { .. })
        ));
        assert!(Gate::rx(2, 0.1).validate(2).is_err());
        assert!(matches!(
            Gate::rx(0, f64::NAN).validate(1),
            Err(ZenoError::InvalidAngle(_))
        ));
    }

    #[test]
    fn test_gate_inverse_operator() {
        let tol = Tolerance::default();
        let gates = vec![
            Gate::single(SingleQubitGate::Sdg, 0),
            Gate::single(SingleQubitGate::SqrtY, 0),
            Gate::rx(0, 0.8),
            Gate::rzz(0, 1, -0.3),
            Gate::cnot(0, 1),
        ];
        for g in gates {
            let inv = g.inverse().unwrap();
            let prod = g.operator().matmul(&inv.operator()).unwrap();
            assert!(prod.approx_eq(&Operator::identity(g.qubits().len()), tol));
        }
        assert!(Gate::single(SingleQubitGate::T, 0).inverse().is_none());
    }
}
