//! Circuit generators for benchmarking
//!
//! Gantree: L6_Benchmark → Generators
//!
//! Random layered circuits alternate two kinds of layer. Even layers
//! (starting with layer 0) shuffle the register and apply CNOTs from the
//! first half of the shuffled qubits onto the second half. Odd layers put a
//! gate drawn uniformly from the gate set on every qubit.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use zeno_core::builder::CircuitBuilder;
use zeno_core::circuit::Circuit;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::gate::{Gate, SingleQubitGate};

/// Gate set of the random single-qubit layers
pub const DEFAULT_GATE_SET: [SingleQubitGate; 4] = [
    SingleQubitGate::I,
    SingleQubitGate::H,
    SingleQubitGate::S,
    SingleQubitGate::T,
];

/// Circuit generator for benchmarks
/// Gantree: CircuitGenerator // seeded random layered circuits
#[derive(Debug, Clone)]
pub struct CircuitGenerator {
    /// Random seed
    seed: Option<u64>,

    /// Gates drawn on single-qubit layers
    gate_set: Vec<SingleQubitGate>,
}

impl Default for CircuitGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitGenerator {
    /// Create unseeded generator
    pub fn new() -> Self {
        Self {
            seed: None,
            gate_set: DEFAULT_GATE_SET.to_vec(),
        }
    }

    /// Create generator with seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new()
        }
    }

    /// Replace the single-qubit gate set
    pub fn with_gate_set(mut self, gates: Vec<SingleQubitGate>) -> ZenoResult<Self> {
        if gates.is_empty() {
            return Err(ZenoError::InvalidConfig("gate set is empty".to_string()));
        }
        self.gate_set = gates;
        Ok(self)
    }

    /// Gate set in use
    pub fn gate_set(&self) -> &[SingleQubitGate] {
        &self.gate_set
    }

    /// Independent stream for circuit `index`
    fn rng(&self, index: u64) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(index)),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    // ========================================================================
    // Random Circuits
    // ========================================================================

    /// Random layered circuit of `depth` layers
    /// Gantree: layered(n, d) -> Result<Circuit>
    pub fn layered(&self, num_qubits: usize, depth: usize) -> ZenoResult<Circuit> {
        self.layered_indexed(num_qubits, depth, 0)
    }

    /// Circuit `index` of a seeded family
    pub fn layered_indexed(&self, num_qubits: usize, depth: usize, index: u64) -> ZenoResult<Circuit> {
        let mut rng = self.rng(index);
        self.layered_with_rng(num_qubits, depth, &mut rng)
    }

    /// Random layered circuit from a caller-provided stream
    pub fn layered_with_rng<R: Rng + ?Sized>(
        &self,
        num_qubits: usize,
        depth: usize,
        rng: &mut R,
    ) -> ZenoResult<Circuit> {
        if num_qubits == 0 {
            return Err(ZenoError::EmptyCircuit);
        }
        let mut circuit =
            Circuit::with_name(num_qubits, format!("random_layered_{}x{}", num_qubits, depth));
        let mut order: Vec<usize> = (0..num_qubits).collect();

        for layer in 0..depth {
            if layer % 2 == 0 {
                order.shuffle(rng);
                let (controls, targets) = order.split_at(num_qubits / 2);
                for (&c, &t) in controls.iter().zip(targets) {
                    circuit.add_gate(Gate::cnot(c, t))?;
                }
            } else {
                for q in 0..num_qubits {
                    let kind = self.gate_set[rng.gen_range(0..self.gate_set.len())];
                    circuit.add_gate(Gate::single(kind, q))?;
                }
            }
            circuit.close_layer();
        }
        Ok(circuit)
    }

    /// `count` circuits of one seeded family
    pub fn batch(&self, num_qubits: usize, depth: usize, count: usize) -> ZenoResult<Vec<Circuit>> {
        (0..count as u64)
            .map(|i| self.layered_indexed(num_qubits, depth, i))
            .collect()
    }

    // ========================================================================
    // Standard Circuits
    // ========================================================================

    /// GHZ preparation: H on qubit 0, then a CNOT chain
    pub fn ghz(&self, num_qubits: usize) -> ZenoResult<Circuit> {
        (1..num_qubits)
            .fold(CircuitBuilder::new(num_qubits).h(0), |b, q| b.cnot(q - 1, q))
            .build()
    }
}

// ============================================================================
// Tests
// ============================================================================
