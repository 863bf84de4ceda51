//! Circuit builders for ZENO
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! A fluent builder for hand-made circuits and the Trotterized
//! transverse-field Ising circuit
//! `U(dt) ≈ ∏_{(i,j)} RZZ_ij(θ_J) · ∏_i RX_i(θ_h)` with `θ_J = −J·dt`
//! and `θ_h = −2h·dt`.

use crate::circuit::{Circuit, Layer};
use crate::constants::ising;
use crate::error::{ZenoError, ZenoResult};
use crate::gate::{Gate, SingleQubitGate, TwoQubitGate};
use crate::operator::Tolerance;
use crate::topology::{Edge, Topology, TopologyPreset};
use crate::types::{Angle, QubitId};
use serde::{Deserialize, Serialize};

// ============================================================================
// CircuitBuilder
// ============================================================================

/// Fluent circuit builder (consuming self pattern)
/// Gantree: CircuitBuilder // builder
///
/// Gates are appended to the open layer until one clashes with it. The
/// first invalid gate is remembered and reported by `build`.
pub struct CircuitBuilder {
    circuit: Circuit,
    error: Option<ZenoError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a new circuit builder
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits),
            error: None,
        }
    }

    /// Create with circuit name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            circuit: Circuit::with_name(num_qubits, name),
            error: None,
        }
    }

    /// Append any gate
    pub fn gate(mut self, gate: Gate) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.circuit.add_gate(gate) {
                self.error = Some(e);
            }
        }
        self
    }

    fn single(self, kind: SingleQubitGate, qubit: QubitId) -> Self {
        self.gate(Gate::single(kind, qubit))
    }

    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================

    /// Add identity gate
    pub fn id(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::I, qubit)
    }

    /// Add Pauli-X gate
    pub fn x(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::X, qubit)
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::Y, qubit)
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::Z, qubit)
    }

    /// Add Hadamard gate
    pub fn h(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::H, qubit)
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::S, qubit)
    }

    /// Add S-dagger gate
    pub fn sdg(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::Sdg, qubit)
    }

    /// Add T gate
    pub fn t(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::T, qubit)
    }

    /// Add √Y gate
    pub fn sy(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::SqrtY, qubit)
    }

    /// Add √Y† gate
    pub fn sydg(self, qubit: QubitId) -> Self {
        self.single(SingleQubitGate::SqrtYdg, qubit)
    }

    /// Add Rx rotation
    pub fn rx(self, qubit: QubitId, angle: Angle) -> Self {
        self.single(SingleQubitGate::Rx(angle), qubit)
    }

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    pub fn cnot(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::two(TwoQubitGate::Cnot, control, target))
    }

    /// Alias for cnot
    pub fn cx(self, control: QubitId, target: QubitId) -> Self {
        self.cnot(control, target)
    }

    /// Add RZZ rotation
    pub fn rzz(self, a: QubitId, b: QubitId, angle: Angle) -> Self {
        self.gate(Gate::two(TwoQubitGate::Rzz(angle), a, b))
    }

    // ========================================================================
    // Layer Helpers
    // ========================================================================

    /// Close the open layer
    pub fn layer(mut self) -> Self {
        self.circuit.close_layer();
        self
    }

    /// RX(θ) on every qubit as one layer
    pub fn rx_layer(self, angle: Angle) -> Self {
        let n = self.circuit.num_qubits();
        (0..n).fold(self.layer(), |b, q| b.rx(q, angle)).layer()
    }

    /// Add to the global phase
    pub fn global_phase(mut self, phase: Angle) -> Self {
        self.circuit.add_global_phase(phase);
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Finish, reporting the first invalid gate
    pub fn build(self) -> ZenoResult<Circuit> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.circuit),
        }
    }

    /// Finish and check every two-qubit gate against a topology
    pub fn build_validated(self, topology: &Topology) -> ZenoResult<Circuit> {
        let circuit = self.build()?;
        topology.validate_circuit(&circuit)?;
        Ok(circuit)
    }

    /// Get reference to current circuit
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits()
    }
}

// ============================================================================
// Ising Parameters
// ============================================================================

/// Physical parameters of the Trotterized Ising evolution
/// Gantree: IsingParams // J, h, dt, steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsingParams {
    /// ZZ coupling strength
    pub j: f64,
    /// Transverse field
    pub h: f64,
    /// Trotter time step
    pub dt: f64,
    /// Number of Trotter steps
    pub steps: usize,
}

impl Default for IsingParams {
    fn default() -> Self {
        Self {
            j: ising::DEFAULT_J,
            h: ising::DEFAULT_H,
            dt: ising::DEFAULT_DT,
            steps: ising::DEFAULT_STEPS,
        }
    }
}

impl IsingParams {
    /// Create with explicit values
    pub fn new(j: f64, h: f64, dt: f64, steps: usize) -> Self {
        Self { j, h, dt, steps }
    }

    /// Coupling angle θ_J = −J·dt
    pub fn theta_j(&self) -> Angle {
        -self.j * self.dt
    }

    /// Field angle θ_h = −2h·dt
    pub fn theta_h(&self) -> Angle {
        -2.0 * self.h * self.dt
    }

    /// Gate angles for the circuit
    pub fn angles(&self) -> TrotterAngles {
        TrotterAngles {
            theta_j: self.theta_j(),
            theta_h: self.theta_h(),
            steps: self.steps,
        }
    }

    /// Check every value is finite
    pub fn validate(&self) -> ZenoResult<()> {
        for v in [self.j, self.h, self.dt] {
            if !v.is_finite() {
                return Err(ZenoError::InvalidAngle(v));
            }
        }
        Ok(())
    }
}

/// Gate angles of one Trotter step
/// Gantree: TrotterAngles // θ_J, θ_h, steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrotterAngles {
    /// RZZ angle
    pub theta_j: Angle,
    /// RX angle
    pub theta_h: Angle,
    /// Number of Trotter steps
    pub steps: usize,
}

impl TrotterAngles {
    /// Explicit angles
    pub fn new(theta_j: Angle, theta_h: Angle, steps: usize) -> Self {
        Self {
            theta_j,
            theta_h,
            steps,
        }
    }

    /// Benchmark point θ_J = −π/2, θ_h = 0
    pub fn benchmark(steps: usize) -> Self {
        Self::new(ising::BENCHMARK_THETA_J, ising::BENCHMARK_THETA_H, steps)
    }

    /// True when RZZ(θ_J) takes the CNOT fast path
    pub fn uses_fast_path(&self, tol: Tolerance) -> bool {
        (self.theta_j - ising::BENCHMARK_THETA_J).abs() <= tol.epsilon
    }

    fn validate(&self) -> ZenoResult<()> {
        for v in [self.theta_j, self.theta_h] {
            if !v.is_finite() {
                return Err(ZenoError::InvalidAngle(v));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Trotter Circuit
// ============================================================================

/// Options for Trotter circuit construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrotterConfig {
    /// Tolerance for recognizing θ_J = −π/2
    pub tolerance: Tolerance,
    /// Decompose RZZ(−π/2) into CNOT and single-qubit gates
    pub fast_path: bool,
}

impl Default for TrotterConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            fast_path: true,
        }
    }
}

/// Build the Trotter circuit from physical parameters
/// Gantree: build_trotter_circuit(topology, params) -> Circuit // main entry
pub fn build_trotter_circuit(topology: &Topology, params: &IsingParams) -> ZenoResult<Circuit> {
    params.validate()?;
    build_trotter_circuit_with(topology, &params.angles(), &TrotterConfig::default())
}

/// Build the Trotter circuit for a named preset
///
/// Fails with `TopologyMismatch` if the preset does not describe
/// `num_qubits` qubits.
pub fn build_trotter_circuit_for_preset(
    preset: TopologyPreset,
    num_qubits: usize,
    params: &IsingParams,
) -> ZenoResult<Circuit> {
    let topology = Topology::from_preset(preset, num_qubits)?;
    build_trotter_circuit(&topology, params)
}

/// Build the Trotter circuit from explicit angles
///
/// Each step emits one group of RZZ layers per edge colour, then one RX
/// layer over every qubit. Edges that share a qubit never share a layer.
pub fn build_trotter_circuit_with(
    topology: &Topology,
    angles: &TrotterAngles,
    config: &TrotterConfig,
) -> ZenoResult<Circuit> {
    angles.validate()?;
    let n = topology.num_qubits();
    let mut circuit = Circuit::with_name(
        n,
        format!(
            "ising_{}_{}steps",
            topology.name().unwrap_or("custom"),
            angles.steps
        ),
    );
    let matchings = topology.edge_coloring();
    let fast = config.fast_path && angles.uses_fast_path(config.tolerance);

    for _ in 0..angles.steps {
        for matching in &matchings {
            if fast {
                push_fast_rzz(&mut circuit, matching)?;
            } else {
                circuit.push_layer(Layer::from_gates(
                    matching
                        .iter()
                        .map(|&(a, b)| Gate::rzz(a, b, angles.theta_j)),
                )?)?;
            }
        }
        circuit.push_layer(Layer::from_gates(
            (0..n).map(|q| Gate::rx(q, angles.theta_h)),
        )?)?;
    }

    Ok(circuit)
}

/// RZZ(−π/2) on a matching as four layers
///
/// `RZZ(−π/2) = e^{iπ/4} · √Y†_b · CX_ab · √Y_b · (S†_a ⊗ S†_b)`
fn push_fast_rzz(circuit: &mut Circuit, matching: &[Edge]) -> ZenoResult<()> {
    let sdg = matching.iter().flat_map(|&(a, b)| {
        [
            Gate::single(SingleQubitGate::Sdg, a),
            Gate::single(SingleQubitGate::Sdg, b),
        ]
    });
    circuit.push_layer(Layer::from_gates(sdg)?)?;
    circuit.push_layer(Layer::from_gates(
        matching
            .iter()
            .map(|&(_, b)| Gate::single(SingleQubitGate::SqrtY, b)),
    )?)?;
    circuit.push_layer(Layer::from_gates(
        matching.iter().map(|&(a, b)| Gate::cnot(a, b)),
    )?)?;
    circuit.push_layer(Layer::from_gates(
        matching
            .iter()
            .map(|&(_, b)| Gate::single(SingleQubitGate::SqrtYdg, b)),
    )?)?;
    circuit.add_global_phase(ising::RZZ_FAST_PATH_PHASE * matching.len() as f64);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
