//! Experiment configuration
//!
//! Gantree: L5_Integration → ExperimentConfig
//!
//! Single serde document describing one ZNE experiment: register, coupling
//! graph, Ising evolution, noise, gain schedule, observable and executor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use zeno_backend::{Executor, ExecutorConfig};
use zeno_core::builder::{build_trotter_circuit_with, IsingParams, TrotterConfig};
use zeno_core::circuit::Circuit;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::observable::{Observable, PauliSum, Projector};
use zeno_core::pauli::PauliString;
use zeno_core::topology::{Edge, Topology, TopologyPreset};
use zeno_mitigation::{FitModel, ZneConfig};
use zeno_noise::{Approximation, NoiseModel, NoiseScope};

// ============================================================================
// Topology
// ============================================================================

/// Coupling graph selection
/// Gantree: TopologySpec // preset | explicit edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologySpec {
    /// Named preset
    Preset(TopologyPreset),
    /// Explicit undirected edge list
    Edges(Vec<Edge>),
}

impl TopologySpec {
    /// Build the coupling graph for `num_qubits`
    pub fn build(&self, num_qubits: usize) -> ZenoResult<Topology> {
        match self {
            TopologySpec::Preset(preset) => Topology::from_preset(*preset, num_qubits),
            TopologySpec::Edges(edges) => Topology::from_edges(num_qubits, edges),
        }
    }
}

// ============================================================================
// Noise
// ============================================================================

/// One generator written with a Pauli label (qubit 0 rightmost)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseTermSpec {
    /// Application scope
    pub scope: NoiseScope,
    /// Pauli label, e.g. `"XZ"`
    pub pauli: String,
    /// Lindblad rate λ ≥ 0
    pub rate: f64,
}

/// Noise selection
/// Gantree: NoiseSpec // none | terms | depolarizing | sparse_lindblad
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseSpec {
    /// Noiseless
    #[default]
    None,
    /// Explicit generator list
    Terms {
        /// Generators
        terms: Vec<NoiseTermSpec>,
        /// Rate-to-probability conversion
        #[serde(default)]
        approximation: Approximation,
    },
    /// Gate-local depolarizing channels
    Depolarizing {
        /// One-qubit gate error
        epsilon_1q: f64,
        /// Two-qubit gate error
        epsilon_2q: f64,
    },
    /// Weight-1 and nearest-neighbour weight-2 generators on the topology
    SparseLindblad {
        /// Rate of each weight-1 generator
        rate_1q: f64,
        /// Rate of each weight-2 generator
        rate_2q: f64,
    },
}

impl NoiseSpec {
    /// Build the noise model on `topology`
    pub fn build(&self, topology: &Topology) -> ZenoResult<NoiseModel> {
        match self {
            NoiseSpec::None => Ok(NoiseModel::new()),
            NoiseSpec::Terms {
                terms,
                approximation,
            } => {
                let mut model = NoiseModel::new().with_approximation(*approximation);
                for term in terms {
                    model.add_term(term.scope, PauliString::from_label(&term.pauli)?, term.rate)?;
                }
                Ok(model)
            }
            NoiseSpec::Depolarizing {
                epsilon_1q,
                epsilon_2q,
            } => NoiseModel::depolarizing(*epsilon_1q, *epsilon_2q),
            NoiseSpec::SparseLindblad { rate_1q, rate_2q } => {
                NoiseModel::sparse_lindblad(topology, *rate_1q, *rate_2q)
            }
        }
    }

    /// True for the noiseless selection
    pub fn is_none(&self) -> bool {
        matches!(self, NoiseSpec::None)
    }
}

// ============================================================================
// Observable
// ============================================================================

/// Weighted Pauli label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTermSpec {
    /// Real coefficient
    #[serde(default = "unit")]
    pub coefficient: f64,
    /// Pauli label (qubit 0 rightmost)
    pub label: String,
}

fn unit() -> f64 {
    1.0
}

/// Observable selection
/// Gantree: ObservableSpec // pauli | projector | median_projector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservableSpec {
    /// Σ c_k P_k
    Pauli {
        /// Terms
        terms: Vec<PauliTermSpec>,
    },
    /// Projector onto listed bitstrings (qubit 0 rightmost)
    Projector {
        /// Basis states
        bitstrings: Vec<String>,
    },
    /// Projector onto noiseless outputs with probability ≥ median
    MedianProjector,
}

impl Default for ObservableSpec {
    fn default() -> Self {
        Self::z(0)
    }
}

impl ObservableSpec {
    /// Single-qubit Z
    pub fn z(qubit: usize) -> Self {
        let mut label = vec!['I'; qubit + 1];
        label[0] = 'Z';
        ObservableSpec::Pauli {
            terms: vec![PauliTermSpec {
                coefficient: 1.0,
                label: label.into_iter().collect(),
            }],
        }
    }

    /// Build the observable; the median projector runs the noiseless circuit
    pub fn build(&self, circuit: &Circuit, executor: &Executor) -> ZenoResult<Observable> {
        match self {
            ObservableSpec::Pauli { terms } => {
                if terms.is_empty() {
                    return Err(ZenoError::InvalidConfig(
                        "observable needs at least one Pauli term".to_string(),
                    ));
                }
                let mut sum = PauliSum::new();
                for term in terms {
                    sum = sum.with_term(term.coefficient, PauliString::from_label(&term.label)?);
                }
                Ok(Observable::Pauli(sum))
            }
            ObservableSpec::Projector { bitstrings } => {
                let labels: Vec<&str> = bitstrings.iter().map(String::as_str).collect();
                Ok(Projector::from_bitstrings(circuit.num_qubits(), &labels)?.into())
            }
            ObservableSpec::MedianProjector => Ok(executor.median_projector(circuit)?.into()),
        }
    }
}

// ============================================================================
// ExperimentConfig
// ============================================================================

/// Complete experiment description
/// Gantree: ExperimentConfig // serde JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Experiment name
    #[serde(default)]
    pub name: String,

    /// Register width
    pub num_qubits: usize,

    /// Coupling graph
    pub topology: TopologySpec,

    /// Ising evolution parameters
    #[serde(default)]
    pub ising: IsingParams,

    /// Trotter construction options
    #[serde(default)]
    pub trotter: TrotterConfig,

    /// Noise
    #[serde(default)]
    pub noise: NoiseSpec,

    /// Gain schedule and fit model
    #[serde(default)]
    pub zne: ZneConfig,

    /// Observable
    #[serde(default)]
    pub observable: ObservableSpec,

    /// Executor settings
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Also run the noiseless circuit and report the improvement ratio
    #[serde(default)]
    pub compute_ideal: bool,
}

impl ExperimentConfig {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Open chain of `n` qubits with default Ising parameters and no noise
    pub fn ising_chain(n: usize) -> Self {
        Self {
            name: format!("ising_chain_{}", n),
            num_qubits: n,
            topology: TopologySpec::Preset(TopologyPreset::Line(n)),
            ising: IsingParams::default(),
            trotter: TrotterConfig::default(),
            noise: NoiseSpec::None,
            zne: ZneConfig::default(),
            observable: ObservableSpec::default(),
            executor: ExecutorConfig::default(),
            compute_ideal: false,
        }
    }

    /// 7-qubit heavy-hex cell
    pub fn heavy_hex_7() -> Self {
        Self {
            name: "heavy_hex_7".to_string(),
            topology: TopologySpec::Preset(TopologyPreset::HeavyHex7),
            ..Self::ising_chain(7)
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set Ising parameters
    pub fn with_ising(mut self, ising: IsingParams) -> Self {
        self.ising = ising;
        self
    }

    /// Set noise
    pub fn with_noise(mut self, noise: NoiseSpec) -> Self {
        self.noise = noise;
        self
    }

    /// Set gain schedule
    pub fn with_gains(mut self, gains: Vec<f64>) -> Self {
        self.zne.gains = gains;
        self
    }

    /// Set fit model
    pub fn with_model(mut self, model: FitModel) -> Self {
        self.zne.model = model;
        self
    }

    /// Set observable
    pub fn with_observable(mut self, observable: ObservableSpec) -> Self {
        self.observable = observable;
        self
    }

    /// Set executor settings
    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }

    /// Set executor seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.executor.seed = Some(seed);
        self
    }

    /// Request the noiseless reference run
    pub fn with_ideal(mut self, compute_ideal: bool) -> Self {
        self.compute_ideal = compute_ideal;
        self
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Coupling graph
    pub fn build_topology(&self) -> ZenoResult<Topology> {
        self.topology.build(self.num_qubits)
    }

    /// Trotter circuit on `topology`
    pub fn build_circuit(&self, topology: &Topology) -> ZenoResult<Circuit> {
        self.ising.validate()?;
        build_trotter_circuit_with(topology, &self.ising.angles(), &self.trotter)
    }

    /// Noise model on `topology`
    pub fn build_noise(&self, topology: &Topology) -> ZenoResult<NoiseModel> {
        self.noise.build(topology)
    }

    /// Executor
    pub fn build_executor(&self) -> ZenoResult<Executor> {
        Executor::new(self.executor.clone())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate register, schedule and executor settings
    pub fn validate(&self) -> ZenoResult<()> {
        if self.num_qubits == 0 {
            return Err(ZenoError::InvalidConfig("num_qubits must be > 0".to_string()));
        }
        self.ising.validate()?;
        self.zne.validate()?;
        self.executor.validate()?;
        Ok(())
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> ZenoResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON
    pub fn to_json(&self) -> ZenoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> ZenoResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Write as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> ZenoResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::ising_chain(4)
    }
}

impl fmt::Display for ExperimentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExperimentConfig({}, {}Q, steps={}, gains={:?}, model={})",
            self.name, self.num_qubits, self.ising.steps, self.zne.gains, self.zne.model
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExperimentConfig::default();
        assert_eq!(config.num_qubits, 4);
        assert!(config.validate().is_ok());
        assert!(config.noise.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ExperimentConfig::heavy_hex_7()
            .with_noise(NoiseSpec::SparseLindblad {
                rate_1q: 1e-3,
                rate_2q: 2e-3,
            })
            .with_model(FitModel::Polynomial(2))
            .with_seed(42);
        let json = config.to_json().unwrap();
        let back = ExperimentConfig::from_json(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_minimal_json() {
        let json = r#"{
            "num_qubits": 3,
            "topology": { "edges": [[0, 1], [1, 2]] },
            "noise": {
                "kind": "terms",
                "terms": [
                    { "scope": "layer", "pauli": "X", "rate": 0.01 },
                    { "scope": "two_qubit_gates", "pauli": "ZZ", "rate": 0.002 }
                ]
            },
            "observable": { "kind": "pauli", "terms": [{ "label": "ZIZ" }] }
        }"#;
        let config = ExperimentConfig::from_json(json).unwrap();
        let topo = config.build_topology().unwrap();
        assert_eq!(topo.num_edges(), 2);
        let noise = config.build_noise(&topo).unwrap();
        assert_eq!(noise.len(), 2);
        assert_eq!(config.zne.gains, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            ExperimentConfig::ising_chain(3).with_gains(vec![2.0, 1.0]).validate(),
            Err(ZenoError::InvalidGain(_))
        ));
        let mut empty = ExperimentConfig::default();
        empty.num_qubits = 0;
        assert!(matches!(empty.validate(), Err(ZenoError::InvalidConfig(_))));
        assert!(matches!(
            ExperimentConfig::from_json("{ not json"),
            Err(ZenoError::JsonError(_))
        ));
        assert!(matches!(
            ExperimentConfig::load("/nonexistent/zeno.json"),
            Err(ZenoError::FileError(_))
        ));
    }

    #[test]
    fn test_preset_size_mismatch() {
        let mut config = ExperimentConfig::heavy_hex_7();
        config.num_qubits = 5;
        assert!(config.build_topology().is_err());
    }

    #[test]
    fn test_observable_specs() {
        let config = ExperimentConfig::ising_chain(2);
        let topo = config.build_topology().unwrap();
        let circuit = config.build_circuit(&topo).unwrap();
        let exec = config.build_executor().unwrap();

        let z1 = ObservableSpec::z(1).build(&circuit, &exec).unwrap();
        assert_eq!(z1, Observable::z(1));

        let proj = ObservableSpec::Projector {
            bitstrings: vec!["00".to_string(), "11".to_string()],
        };
        assert!(matches!(proj.build(&circuit, &exec).unwrap(), Observable::Projector(_)));
        assert!(ObservableSpec::MedianProjector.build(&circuit, &exec).is_ok());
        assert!(ObservableSpec::Pauli { terms: vec![] }.build(&circuit, &exec).is_err());
    }
}
