//! Layered circuit structure for ZENO
//!
//! Gantree: L1_Circuit → Circuit
//!
//! A circuit is an ordered list of layers. Gates inside one layer act on
//! pairwise disjoint qubits, so their order is irrelevant; the order of the
//! layers is the time evolution.

use crate::constants::limits::MAX_UNITARY_QUBITS;
use crate::error::{ZenoError, ZenoResult};
use crate::gate::Gate;
use crate::operator::{embed, Operator};
use crate::topology::Topology;
use crate::types::{Angle, QubitId};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Layer
// ============================================================================

/// Set of gates with disjoint targets
/// Gantree: Layer // parallel gates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    gates: Vec<Gate>,
}

impl Layer {
    /// Create an empty layer
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from gates, failing with `InvalidTarget` on overlapping targets
    pub fn from_gates(gates: impl IntoIterator<Item = Gate>) -> ZenoResult<Self> {
        let mut layer = Self::new();
        for gate in gates {
            layer.push(gate)?;
        }
        Ok(layer)
    }

    /// True if `gate` shares no qubit with the layer
    pub fn accepts(&self, gate: &Gate) -> bool {
        let used = self.qubits();
        gate.qubits().iter().all(|q| !used.contains(q))
    }

    /// Add a gate, failing with `InvalidTarget` if a qubit is already used
    pub fn push(&mut self, gate: Gate) -> ZenoResult<()> {
        let used = self.qubits();
        let qs = gate.qubits();
        if let Some(&q) = qs.iter().find(|q| used.contains(q)) {
            return Err(ZenoError::repeated_target(q));
        }
        if qs.len() == 2 && qs[0] == qs[1] {
            return Err(ZenoError::repeated_target(qs[0]));
        }
        self.gates.push(gate);
        Ok(())
    }

    /// Gates in insertion order
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Qubits touched by the layer
    pub fn qubits(&self) -> BTreeSet<QubitId> {
        self.gates.iter().flat_map(|g| g.qubits()).collect()
    }

    /// Number of gates
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check if layer is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Layer undoing this one
    pub fn inverse(&self) -> ZenoResult<Self> {
        let gates = self
            .gates
            .iter()
            .map(|g| {
                g.inverse().ok_or_else(|| {
                    ZenoError::InvalidGateParameter(format!("'{}' has no inverse kind", g.name()))
                })
            })
            .collect::<ZenoResult<Vec<_>>>()?;
        Ok(Self { gates })
    }
}

// ============================================================================
// Circuit
// ============================================================================

/// Layered quantum circuit
/// Gantree: Circuit // layers + global phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits
    num_qubits: usize,

    /// Layers in time order
    layers: Vec<Layer>,

    /// Global phase in radians (tracked, not simulated)
    global_phase: Angle,

    /// Optional circuit name
    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            layers: Vec::new(),
            global_phase: 0.0,
            name: None,
        }
    }

    /// Create a circuit with a name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(num_qubits)
        }
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Append a layer after validating its gates against the register
    /// Gantree: push_layer(&mut, Layer) -> Result // append layer
    pub fn push_layer(&mut self, layer: Layer) -> ZenoResult<()> {
        for gate in layer.gates() {
            gate.validate(self.num_qubits)?;
        }
        if !layer.is_empty() {
            self.layers.push(layer);
        }
        Ok(())
    }

    /// Append a gate to the last layer, opening a new one on a clash
    /// Gantree: add_gate(&mut, Gate) -> Result // append gate
    pub fn add_gate(&mut self, gate: Gate) -> ZenoResult<()> {
        gate.validate(self.num_qubits)?;
        match self.layers.last_mut() {
            Some(last) if last.accepts(&gate) => last.push(gate),
            _ => {
                let mut layer = Layer::new();
                layer.push(gate)?;
                self.layers.push(layer);
                Ok(())
            }
        }
    }

    /// Force the next gate into a fresh layer
    pub fn close_layer(&mut self) {
        if self.layers.last().map_or(false, |l| !l.is_empty()) {
            self.layers.push(Layer::new());
        }
    }

    /// Add to the global phase
    pub fn add_global_phase(&mut self, phase: Angle) {
        self.global_phase += phase;
    }

    /// Append every layer of `other`
    pub fn compose(&mut self, other: &Circuit) -> ZenoResult<()> {
        if other.num_qubits != self.num_qubits {
            return Err(ZenoError::DimensionMismatch {
                expected: self.num_qubits,
                found: other.num_qubits,
            });
        }
        self.drop_trailing_empty();
        self.layers.extend(other.layers.iter().cloned());
        self.global_phase += other.global_phase;
        Ok(())
    }

    /// Circuit implementing the inverse unitary
    pub fn inverse(&self) -> ZenoResult<Self> {
        let layers = self
            .layers
            .iter()
            .rev()
            .map(Layer::inverse)
            .collect::<ZenoResult<Vec<_>>>()?;
        Ok(Self {
            num_qubits: self.num_qubits,
            layers,
            global_phase: -self.global_phase,
            name: self.name.as_ref().map(|n| format!("{}_dg", n)),
        })
    }

    fn drop_trailing_empty(&mut self) {
        while self.layers.last().map_or(false, Layer::is_empty) {
            self.layers.pop();
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Non-empty layers in time order
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| !l.is_empty())
    }

    /// All gates in time order
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.layers.iter().flat_map(|l| l.gates().iter())
    }

    /// Global phase in radians
    pub fn global_phase(&self) -> Angle {
        self.global_phase
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set circuit name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if circuit has no gates
    pub fn is_empty(&self) -> bool {
        self.gates().next().is_none()
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Number of non-empty layers
    /// Gantree: depth(&self) -> usize // layer count
    pub fn depth(&self) -> usize {
        self.layers().count()
    }

    /// Get total gate count
    pub fn gate_count(&self) -> usize {
        self.gates().count()
    }

    /// Count single-qubit gates
    pub fn count_1q(&self) -> usize {
        self.gates().filter(|g| g.is_single_qubit()).count()
    }

    /// Count two-qubit gates
    pub fn count_2q(&self) -> usize {
        self.gates().filter(|g| g.is_two_qubit()).count()
    }

    /// Qubits used anywhere in the circuit
    pub fn used_qubits(&self) -> BTreeSet<QubitId> {
        self.gates().flat_map(|g| g.qubits()).collect()
    }

    /// Get two-qubit gate pairs (for topology validation)
    pub fn two_qubit_pairs(&self) -> Vec<(QubitId, QubitId)> {
        self.gates()
            .filter_map(|g| match g {
                Gate::Two {
                    control, target, ..
                } => Some((*control, *target)),
                Gate::Single { .. } => None,
            })
            .collect()
    }

    /// Full unitary including the global phase (small registers only)
    /// Gantree: unitary(&self) -> Result<Operator> // dense product
    pub fn unitary(&self) -> ZenoResult<Operator> {
        if self.num_qubits > MAX_UNITARY_QUBITS {
            return Err(ZenoError::QubitLimitExceeded {
                qubits: self.num_qubits,
                max: MAX_UNITARY_QUBITS,
                representation: "unitary".into(),
            });
        }
        let mut total = Operator::identity(self.num_qubits);
        for gate in self.gates() {
            let full = embed(&gate.operator(), &gate.qubits(), self.num_qubits)?;
            total = full.matmul(&total)?;
        }
        Ok(total.scale(Complex64::from_polar(1.0, self.global_phase)))
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate circuit against a topology
    pub fn validate(&self, topology: &Topology) -> ZenoResult<()> {
        topology.validate_circuit(self)
    }

    // ========================================================================
    // QASM Conversion
    // ========================================================================

    /// Convert to OpenQASM 2.0 string, one barrier between layers
    pub fn to_qasm(&self) -> String {
        let mut lines = vec![
            "OPENQASM 2.0;".to_string(),
            "include \"qelib1.inc\";".to_string(),
            String::new(),
            format!("qreg q[{}];", self.num_qubits),
        ];
        if self.global_phase != 0.0 {
            lines.push(format!("// global phase: {}", self.global_phase));
        }
        lines.push(String::new());

        for (i, layer) in self.layers().enumerate() {
            if i > 0 {
                lines.push("barrier q;".to_string());
            }
            lines.extend(layer.gates().iter().map(Gate::to_qasm));
        }

        lines.join("\n")
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("circuit");
        write!(
            f,
            "Circuit({}: {} qubits, depth {}, {} gates [{} 1Q, {} 2Q])",
            name,
            self.num_qubits,
            self.depth(),
            self.gate_count(),
            self.count_1q(),
            self.count_2q()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::SingleQubitGate;
    use crate::operator::Tolerance;

    #[test]
    fn test_layer_rejects_overlap() {
        let mut layer = Layer::new();
        layer.push(Gate::cnot(0, 1)).unwrap();
        assert!(matches!(
            layer.push(Gate::rx(1, 0.2)),
            Err(ZenoError::InvalidTarget { qubit: 1, .. })
        ));
        layer.push(Gate::rx(2, 0.2)).unwrap();
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn test_add_gate_opens_new_layer() {
        let mut c = Circuit::new(3);
        c.add_gate(Gate::rx(0, 0.1)).unwrap();
        c.add_gate(Gate::rx(1, 0.1)).unwrap();
        c.add_gate(Gate::cnot(0, 1)).unwrap();
        assert_eq!(c.depth(), 2);
        assert_eq!(c.count_1q(), 2);
        assert_eq!(c.count_2q(), 1);
    }

    #[test]
    fn test_add_gate_out_of_range() {
        let mut c = Circuit::new(2);
        assert!(matches!(
            c.add_gate(Gate::cnot(0, 2)),
            Err(ZenoError::InvalidTarget { qubit: 2, .. })
        ));
    }

    #[test]
    fn test_close_layer() {
        let mut c = Circuit::new(2);
        c.add_gate(Gate::rx(0, 0.1)).unwrap();
        c.close_layer();
        c.add_gate(Gate::rx(1, 0.1)).unwrap();
        assert_eq!(c.depth(), 2);
    }

    #[test]
    fn test_inverse_unitary() {
        let mut c = Circuit::new(2);
        c.add_gate(Gate::single(SingleQubitGate::SqrtY, 1)).unwrap();
        c.add_gate(Gate::cnot(0, 1)).unwrap();
        c.add_gate(Gate::rzz(0, 1, 0.4)).unwrap();
        c.add_global_phase(0.3);

        let mut round = c.clone();
        round.compose(&c.inverse().unwrap()).unwrap();
        let u = round.unitary().unwrap();
        assert!(u.approx_eq(&Operator::identity(2), Tolerance::default()));
    }

    #[test]
    fn test_double_cnot_identity() {
        let mut c = Circuit::new(2);
        c.add_gate(Gate::cnot(0, 1)).unwrap();
        c.add_gate(Gate::cnot(0, 1)).unwrap();
        assert_eq!(c.depth(), 2);
        assert!(c
            .unitary()
            .unwrap()
            .approx_eq(&Operator::identity(2), Tolerance::default()));
    }

    #[test]
    fn test_compose_mismatch() {
        let mut a = Circuit::new(2);
        let b = Circuit::new(3);
        assert!(matches!(
            a.compose(&b),
            Err(ZenoError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_to_qasm() {
        let mut c = Circuit::new(2);
        c.add_gate(Gate::rx(0, 0.5)).unwrap();
        c.add_gate(Gate::cnot(0, 1)).unwrap();
        let qasm = c.to_qasm();
        assert!(qasm.contains("qreg q[2];"));
        assert!(qasm.contains("barrier q;"));
        assert!(qasm.contains("cx q[0],q[1];"));
    }

    #[test]
    fn test_two_qubit_pairs() {
        let mut c = Circuit::new(3);
        c.add_gate(Gate::cnot(0, 1)).unwrap();
        c.add_gate(Gate::rzz(1, 2, 0.1)).unwrap();
        assert_eq!(c.two_qubit_pairs(), vec![(0, 1), (1, 2)]);
    }
}
