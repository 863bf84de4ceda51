//! Sparse Pauli-Lindblad noise model
//!
//! Gantree: L2_Noise → NoiseModel
//!
//! A model is a list of generator terms `(P, λ, scope)`. Applied at gain `g`
//! the channel for one layer is `∏ exp(λ·g·(PρP − ρ))`, each factor being a
//! Pauli channel with flip probability `p = (1 − e^{−2λg}) / 2`.
//!
//! Terms come in three scopes:
//! - `Layer`: global qubit indices, applied once after every layer
//! - `OneQubitGates`: local index 0, applied after each single-qubit gate
//! - `TwoQubitGates`: local indices 0/1, applied after each two-qubit gate
//!   (local 0 is the control, local 1 the target)

use crate::channel::{ChannelTarget, PauliChannel};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use zeno_core::circuit::{Circuit, Layer};
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::pauli::{Pauli, PauliString};
use zeno_core::topology::Topology;

// ============================================================================
// NoiseScope
// ============================================================================

/// Where a generator term is applied
/// Gantree: NoiseScope // Layer | OneQubitGates | TwoQubitGates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseScope {
    /// Once per layer on global indices
    Layer,
    /// After every single-qubit gate, gate-local indices
    OneQubitGates,
    /// After every two-qubit gate, gate-local indices
    TwoQubitGates,
}

impl NoiseScope {
    /// Gate arity the scope attaches to (`None` for layer scope)
    pub fn arity(&self) -> Option<usize> {
        match self {
            NoiseScope::Layer => None,
            NoiseScope::OneQubitGates => Some(1),
            NoiseScope::TwoQubitGates => Some(2),
        }
    }
}

impl fmt::Display for NoiseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseScope::Layer => write!(f, "layer"),
            NoiseScope::OneQubitGates => write!(f, "1q"),
            NoiseScope::TwoQubitGates => write!(f, "2q"),
        }
    }
}

// ============================================================================
// NoiseTerm
// ============================================================================

/// One Pauli-Lindblad generator
/// Gantree: NoiseTerm // (P, λ, scope)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseTerm {
    /// Application scope
    pub scope: NoiseScope,
    /// Generator Pauli string
    pub pauli: PauliString,
    /// Rate λ ≥ 0
    pub rate: f64,
}

// ============================================================================
// Approximation
// ============================================================================

/// How generator rates become flip probabilities
/// Gantree: Approximation // Exact | FirstOrder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approximation {
    /// `p = (1 − e^{−2x}) / 2`
    #[default]
    Exact,
    /// `p = x`, clamped to ½; per-term probability error is at most `x²`
    FirstOrder,
}

impl Approximation {
    /// Flip probability for a scaled rate `x = λ·g`
    pub fn probability(&self, x: f64) -> f64 {
        match self {
            Approximation::Exact => 0.5 * (1.0 - (-2.0 * x).exp()),
            Approximation::FirstOrder => x.min(0.5),
        }
    }
}

// ============================================================================
// NoiseModel
// ============================================================================

/// Sparse Pauli-Lindblad noise model
/// Gantree: NoiseModel // Σ λ_k (P_k·P_k − ·)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    terms: Vec<NoiseTerm>,
    #[serde(default)]
    approximation: Approximation,
}

impl NoiseModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Empty (noiseless) model
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a generator term
    /// Gantree: add_term(scope, pauli, rate) -> Result<()> // validated
    ///
    /// Fails with `InvalidRate` for negative or non-finite rates,
    /// `InvalidPauli` for the identity, and `InvalidTarget` when a gate-scope
    /// string does not fit the gate arity.
    pub fn add_term(&mut self, scope: NoiseScope, pauli: PauliString, rate: f64) -> ZenoResult<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ZenoError::InvalidRate(rate));
        }
        if pauli.is_identity() {
            return Err(ZenoError::InvalidPauli(
                "identity generator has no effect".to_string(),
            ));
        }
        if let Some(arity) = scope.arity() {
            pauli.validate_for(arity)?;
        }
        self.terms.push(NoiseTerm { scope, pauli, rate });
        Ok(())
    }

    /// Builder form of [`add_term`](Self::add_term)
    pub fn with_term(mut self, scope: NoiseScope, pauli: PauliString, rate: f64) -> ZenoResult<Self> {
        self.add_term(scope, pauli, rate)?;
        Ok(self)
    }

    /// Set the rate-to-probability conversion
    pub fn with_approximation(mut self, approximation: Approximation) -> Self {
        self.approximation = approximation;
        self
    }

    /// Depolarizing noise after every gate
    /// Gantree: depolarizing(e1, e2) -> Result<Self> // gate-local
    ///
    /// `ε₁` acts after single-qubit gates, `ε₂` after two-qubit gates, with
    /// the convention `ρ → (1 − ε) ρ + ε I/2^k`. The Lindblad form spreads
    /// `−ln(1 − ε) / 4^k` over every non-identity Pauli on the gate.
    pub fn depolarizing(epsilon_1q: f64, epsilon_2q: f64) -> ZenoResult<Self> {
        let mut model = Self::new();
        for (scope, epsilon, qubits) in [
            (NoiseScope::OneQubitGates, epsilon_1q, &[0usize][..]),
            (NoiseScope::TwoQubitGates, epsilon_2q, &[0usize, 1][..]),
        ] {
            if !(0.0..1.0).contains(&epsilon) {
                return Err(ZenoError::InvalidProbability(epsilon));
            }
            if epsilon == 0.0 {
                continue;
            }
            let rate = -(1.0 - epsilon).ln() / 4f64.powi(qubits.len() as i32);
            for pauli in PauliString::all_on(qubits) {
                model.add_term(scope, pauli, rate)?;
            }
        }
        Ok(model)
    }

    /// Same single-qubit rates on every qubit, once per layer
    pub fn uniform_layer(num_qubits: usize, rates: &[(Pauli, f64)]) -> ZenoResult<Self> {
        let mut model = Self::new();
        for q in 0..num_qubits {
            for &(pauli, rate) in rates {
                model.add_term(NoiseScope::Layer, PauliString::single(q, pauli), rate)?;
            }
        }
        Ok(model)
    }

    /// Nearest-neighbour sparse model on a topology
    /// Gantree: sparse_lindblad(topology, r1, r2) -> Result<Self> // weight ≤ 2
    ///
    /// Weight-one X/Y/Z terms on every qubit at `rate_1q` and the nine
    /// weight-two strings on every coupled pair at `rate_2q`, all layer scope.
    pub fn sparse_lindblad(topology: &Topology, rate_1q: f64, rate_2q: f64) -> ZenoResult<Self> {
        let mut model = Self::uniform_layer(
            topology.num_qubits(),
            &[(Pauli::X, rate_1q), (Pauli::Y, rate_1q), (Pauli::Z, rate_1q)],
        )?;
        for &(a, b) in topology.edges() {
            for pa in Pauli::NON_IDENTITY {
                for pb in Pauli::NON_IDENTITY {
                    let pauli = PauliString::from_sparse(&[(a, pa), (b, pb)])?;
                    model.add_term(NoiseScope::Layer, pauli, rate_2q)?;
                }
            }
        }
        Ok(model)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Generator terms in insertion order
    pub fn terms(&self) -> &[NoiseTerm] {
        &self.terms
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if the model has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True if every rate is zero
    pub fn is_noiseless(&self) -> bool {
        self.terms.iter().all(|t| t.rate == 0.0)
    }

    /// Rate-to-probability conversion
    pub fn approximation(&self) -> Approximation {
        self.approximation
    }

    /// Sum of all rates
    pub fn total_rate(&self) -> f64 {
        self.terms.iter().map(|t| t.rate).sum()
    }

    /// Pauli string → λ, summing identical strings across scopes
    /// Gantree: rates() -> BTreeMap<PauliString, f64>
    pub fn rates(&self) -> BTreeMap<PauliString, f64> {
        let mut map = BTreeMap::new();
        for t in &self.terms {
            *map.entry(t.pauli.clone()).or_insert(0.0) += t.rate;
        }
        map
    }

    /// Rates restricted to one scope
    pub fn rate_map(&self, scope: NoiseScope) -> BTreeMap<PauliString, f64> {
        let mut map = BTreeMap::new();
        for t in self.terms.iter().filter(|t| t.scope == scope) {
            *map.entry(t.pauli.clone()).or_insert(0.0) += t.rate;
        }
        map
    }

    // ========================================================================
    // Scaling
    // ========================================================================

    /// New model with every rate multiplied by `gain`
    /// Gantree: scale(gain) -> Result<Self> // non-mutating
    pub fn scale(&self, gain: f64) -> ZenoResult<Self> {
        check_gain(gain)?;
        let terms = self
            .terms
            .iter()
            .map(|t| NoiseTerm {
                rate: t.rate * gain,
                ..t.clone()
            })
            .collect();
        Ok(Self {
            terms,
            approximation: self.approximation,
        })
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Fail with `InvalidTarget` if a layer-scope term leaves the register
    pub fn validate_for(&self, num_qubits: usize) -> ZenoResult<()> {
        for t in &self.terms {
            match t.scope.arity() {
                None => t.pauli.validate_for(num_qubits)?,
                Some(arity) => t.pauli.validate_for(arity)?,
            }
        }
        Ok(())
    }

    // ========================================================================
    // Channels
    // ========================================================================

    /// Generators acting after `layer`, on global indices
    /// Gantree: layer_generators(layer) -> Vec<(P, λ)> // remapped
    pub fn layer_generators(&self, layer: &Layer) -> ZenoResult<Vec<(PauliString, f64)>> {
        let mut out = Vec::new();
        for gate in layer.gates() {
            let qubits = gate.qubits();
            for t in &self.terms {
                if t.scope.arity() == Some(qubits.len()) {
                    out.push((t.pauli.remap(&qubits)?, t.rate));
                }
            }
        }
        for t in self.terms.iter().filter(|t| t.scope == NoiseScope::Layer) {
            out.push((t.pauli.clone(), t.rate));
        }
        Ok(out)
    }

    /// Pauli channels for one layer at `gain`, skipping zero-rate terms
    pub fn channels_for_layer(&self, layer: &Layer, gain: f64) -> ZenoResult<Vec<PauliChannel>> {
        check_gain(gain)?;
        self.layer_generators(layer)?
            .into_iter()
            .filter(|(_, rate)| *rate > 0.0)
            .map(|(pauli, rate)| PauliChannel::new(pauli, self.approximation.probability(rate * gain)))
            .collect()
    }

    /// Apply the channel for `layer` scaled by `gain`
    /// Gantree: apply(state, layer, gain, rng) -> Result<()> // after unitaries
    pub fn apply<S: ChannelTarget + ?Sized>(
        &self,
        state: &mut S,
        layer: &Layer,
        gain: f64,
        rng: &mut ChaCha8Rng,
    ) -> ZenoResult<()> {
        let n = state.num_qubits();
        for channel in self.channels_for_layer(layer, gain)? {
            channel.pauli.validate_for(n)?;
            state.apply_pauli_channel(&channel, rng)?;
        }
        Ok(())
    }

    /// Total probability error of the first-order map for one layer
    /// Gantree: first_order_error_bound(layer, gain) -> f64 // Σ (λg)²
    ///
    /// Zero under `Exact`. Under `FirstOrder` each term differs from the exact
    /// probability by at most `(λg)²`; the bound sums these.
    pub fn first_order_error_bound(&self, layer: &Layer, gain: f64) -> ZenoResult<f64> {
        if self.approximation == Approximation::Exact {
            return Ok(0.0);
        }
        Ok(self
            .layer_generators(layer)?
            .iter()
            .map(|(_, rate)| (rate * gain).powi(2))
            .sum())
    }

    /// First-order error bound summed over a circuit
    pub fn circuit_error_bound(&self, circuit: &Circuit, gain: f64) -> ZenoResult<f64> {
        circuit
            .layers()
            .map(|layer| self.first_order_error_bound(layer, gain))
            .sum()
    }

    /// Sum of generator rates acting after `layer` (unscaled)
    pub fn layer_rate(&self, layer: &Layer) -> ZenoResult<f64> {
        Ok(self.layer_generators(layer)?.iter().map(|(_, r)| r).sum())
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "NoiseModel({} terms, {:?}, Σλ = {:.4e})",
            self.terms.len(),
            self.approximation,
            self.total_rate()
        )?;
        for t in &self.terms {
            writeln!(f, "  [{}] {} : {:.4e}", t.scope, t.pauli, t.rate)?;
        }
        Ok(())
    }
}

fn check_gain(gain: f64) -> ZenoResult<()> {
    if !gain.is_finite() || gain < 1.0 {
        return Err(ZenoError::InvalidGain(gain));
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
    use zeno_core::gate::Gate;

    /// Records every channel it receives
    struct Recorder {
        n: usize,
        seen: Vec<PauliChannel>,
    }

    impl ChannelTarget for Recorder {
        fn num_qubits(&self) -> usize {
            self.n
        }

        fn apply_pauli_channel(
            &mut self,
            channel: &PauliChannel,
            _rng: &mut ChaCha8Rng,
        ) -> ZenoResult<()> {
            self.seen.push(channel.clone());
            Ok(())
        }
    }

    fn z(q: usize) -> PauliString {
        PauliString::single(q, Pauli::Z)
    }

    #[test]
    fn test_add_term_validation() {
        let mut m = NoiseModel::new();
        assert!(matches!(
            m.add_term(NoiseScope::Layer, z(0), -0.1),
            Err(ZenoError::InvalidRate(_))
        ));
        assert!(matches!(
            m.add_term(NoiseScope::Layer, z(0), f64::NAN),
            Err(ZenoError::InvalidRate(_))
        ));
        assert!(matches!(
            m.add_term(NoiseScope::Layer, PauliString::identity(), 0.1),
            Err(ZenoError::InvalidPauli(_))
        ));
        assert!(matches!(
            m.add_term(NoiseScope::OneQubitGates, z(1), 0.1),
            Err(ZenoError::InvalidTarget { qubit: 1, .. })
        ));
        assert!(m.add_term(NoiseScope::TwoQubitGates, z(1), 0.1).is_ok());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_scale_does_not_mutate() {
        let m = NoiseModel::new()
            .with_term(NoiseScope::Layer, z(0), 0.01)
            .unwrap();
        let scaled = m.scale(3.0).unwrap();
        assert_relative_eq!(m.rates()[&z(0)], 0.01);
        assert_relative_eq!(scaled.rates()[&z(0)], 0.03);
        assert!(matches!(m.scale(0.5), Err(ZenoError::InvalidGain(_))));
        assert!(m.scale(f64::INFINITY).is_err());
    }

    #[test]
    fn test_rates_merge_scopes() {
        let m = NoiseModel::new()
            .with_term(NoiseScope::Layer, z(0), 0.01)
            .unwrap()
            .with_term(NoiseScope::OneQubitGates, z(0), 0.02)
            .unwrap();
        assert_relative_eq!(m.rates()[&z(0)], 0.03);
        assert_relative_eq!(m.rate_map(NoiseScope::Layer)[&z(0)], 0.01);
        assert!(m.rate_map(NoiseScope::TwoQubitGates).is_empty());
    }

    #[test]
    fn test_exact_probability() {
        let p = Approximation::Exact.probability(0.1);
        assert_relative_eq!(p, 0.5 * (1.0 - (-0.2f64).exp()), epsilon = 1e-15);
        assert_relative_eq!(Approximation::FirstOrder.probability(0.1), 0.1);
        assert_relative_eq!(Approximation::FirstOrder.probability(0.9), 0.5);
        assert!(Approximation::Exact.probability(100.0) <= 0.5);
    }

    #[test]
    fn test_depolarizing_rates() {
        let eps = 0.01;
        let m = NoiseModel::depolarizing(eps, eps).unwrap();
        assert_eq!(m.rate_map(NoiseScope::OneQubitGates).len(), 3);
        assert_eq!(m.rate_map(NoiseScope::TwoQubitGates).len(), 15);

        // Z fidelity after one gate: X and Y channels each contribute 1 − 2p
        let lambda = m.rate_map(NoiseScope::OneQubitGates)[&PauliString::single(0, Pauli::X)];
        let p = Approximation::Exact.probability(lambda);
        assert_relative_eq!((1.0 - 2.0 * p).powi(2), 1.0 - eps, epsilon = 1e-12);

        assert!(NoiseModel::depolarizing(1.0, 0.0).is_err());
        assert!(NoiseModel::depolarizing(0.0, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_sparse_lindblad_counts() {
        let topo = Topology::linear(3);
        let m = NoiseModel::sparse_lindblad(&topo, 1e-3, 2e-3).unwrap();
        assert_eq!(m.len(), 3 * 3 + 2 * 9);
        assert!(m.validate_for(3).is_ok());
        assert!(matches!(
            m.validate_for(2),
            Err(ZenoError::InvalidTarget { qubit: 2, .. })
        ));
    }

    #[test]
    fn test_gate_local_remap() {
        // "ZX" = X on local 0 (control), Z on local 1 (target)
        let m = NoiseModel::new()
            .with_term(
                NoiseScope::TwoQubitGates,
                PauliString::from_label("ZX").unwrap(),
                0.05,
            )
            .unwrap();
        let layer = Layer::from_gates([Gate::cnot(2, 0)]).unwrap();
        let gens = m.layer_generators(&layer).unwrap();
        assert_eq!(gens.len(), 1);
        assert_eq!(gens[0].0.get(2), Pauli::X);
        assert_eq!(gens[0].0.get(0), Pauli::Z);
    }

    #[test]
    fn test_apply_emits_channels() {
        let m = NoiseModel::depolarizing(0.02, 0.0).unwrap();
        let layer = Layer::from_gates([Gate::rx(0, 0.1), Gate::rx(1, 0.1)]).unwrap();
        let mut rec = Recorder {
            n: 2,
            seen: Vec::new(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        m.apply(&mut rec, &layer, 2.0, &mut rng).unwrap();
        assert_eq!(rec.seen.len(), 6);
        let lambda = -(0.98f64).ln() / 4.0;
        assert_relative_eq!(
            rec.seen[0].probability,
            Approximation::Exact.probability(2.0 * lambda),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_apply_rejects_out_of_register() {
        let m = NoiseModel::new()
            .with_term(NoiseScope::Layer, z(5), 0.01)
            .unwrap();
        let layer = Layer::from_gates([Gate::rx(0, 0.1)]).unwrap();
        let mut rec = Recorder {
            n: 2,
            seen: Vec::new(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            m.apply(&mut rec, &layer, 1.0, &mut rng),
            Err(ZenoError::InvalidTarget { qubit: 5, .. })
        ));
    }

    #[test]
    fn test_first_order_bound() {
        let layer = Layer::from_gates([Gate::rx(0, 0.1)]).unwrap();
        let exact = NoiseModel::uniform_layer(1, &[(Pauli::X, 0.01), (Pauli::Z, 0.02)]).unwrap();
        assert_eq!(exact.first_order_error_bound(&layer, 1.0).unwrap(), 0.0);

        let approx = exact.clone().with_approximation(Approximation::FirstOrder);
        let bound = approx.first_order_error_bound(&layer, 2.0).unwrap();
        assert_relative_eq!(bound, 0.02f64.powi(2) + 0.04f64.powi(2), epsilon = 1e-15);

        // per-term deviation stays within the bound
        for x in [0.02, 0.04] {
            let dev = Approximation::FirstOrder.probability(x) - Approximation::Exact.probability(x);
            assert!(dev.abs() <= x * x);
        }
    }
}
