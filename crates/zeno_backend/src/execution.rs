//! Backend execution types and traits
//!
//! Gantree: L3_Backend → BackendTrait
//!
//! Defines the interface for expectation-value backends and the record
//! each run produces.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use zeno_core::circuit::Circuit;
use zeno_core::error::ZenoResult;
use zeno_core::observable::Observable;
use zeno_noise::NoiseModel;

/// How a run was simulated
/// Gantree: ExecutionMethod // StateVector | DensityMatrix | Trajectories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMethod {
    /// Noiseless pure-state evolution
    StateVector,
    /// Exact noisy evolution
    DensityMatrix,
    /// Averaged Monte Carlo state-vector trajectories
    Trajectories,
}

impl ExecutionMethod {
    /// True if repeated runs give identical values regardless of seed
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, ExecutionMethod::Trajectories)
    }
}

impl fmt::Display for ExecutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMethod::StateVector => write!(f, "statevector"),
            ExecutionMethod::DensityMatrix => write!(f, "density_matrix"),
            ExecutionMethod::Trajectories => write!(f, "trajectories"),
        }
    }
}

/// Result of one expectation-value run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Expectation value of the observable
    pub expectation: f64,

    /// Standard error of the estimate (0 for deterministic methods)
    pub std_error: f64,

    /// Noise gain used
    pub gain: f64,

    /// Simulation method
    pub method: ExecutionMethod,

    /// Trajectory count (1 for deterministic methods)
    pub shots: usize,

    /// Number of renormalization corrections applied
    pub renormalizations: usize,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Register width
    pub num_qubits: usize,

    /// Circuit depth (non-empty layers)
    pub depth: usize,

    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,

    /// Seed used (if any)
    pub seed: Option<u64>,

    /// Additional info
    pub extra: HashMap<String, String>,
}

impl ExecutionResult {
    /// Deterministic result with zero standard error
    pub fn exact(expectation: f64, gain: f64, method: ExecutionMethod, backend: &str) -> Self {
        Self {
            expectation,
            std_error: 0.0,
            gain,
            method,
            shots: 1,
            renormalizations: 0,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                ..Default::default()
            },
        }
    }

    /// Result averaged over `samples`
    ///
    /// Standard error is the sample standard deviation over `√shots`.
    pub fn from_samples(samples: &[f64], gain: f64, backend: &str) -> Self {
        let shots = samples.len();
        let mean = if shots == 0 {
            0.0
        } else {
            samples.iter().sum::<f64>() / shots as f64
        };
        let std_error = if shots > 1 {
            let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (shots - 1) as f64;
            (var / shots as f64).sqrt()
        } else {
            0.0
        };
        Self {
            expectation: mean,
            std_error,
            gain,
            method: ExecutionMethod::Trajectories,
            shots,
            renormalizations: 0,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                ..Default::default()
            },
        }
    }

    /// `[value − z·σ, value + z·σ]`
    pub fn interval(&self, z: f64) -> (f64, f64) {
        (
            self.expectation - z * self.std_error,
            self.expectation + z * self.std_error,
        )
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(gain={:.3}, value={:.6} ± {:.2e}, method={}, shots={})",
            self.gain, self.expectation, self.std_error, self.method, self.shots
        )
    }
}

/// Expectation-value backend
/// Gantree: BackendTrait // backend interface
pub trait Backend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Largest register the backend accepts, noiseless or noisy
    fn max_qubits(&self, noisy: bool) -> usize;

    /// Run a circuit at one gain
    /// Gantree: execute(circuit, noise, gain, observable) -> Result<ExecutionResult>
    fn execute(
        &self,
        circuit: &Circuit,
        noise: Option<&NoiseModel>,
        gain: f64,
        observable: &Observable,
    ) -> ZenoResult<ExecutionResult>;

    /// Run a circuit at several gains
    fn execute_batch(
        &self,
        circuit: &Circuit,
        noise: Option<&NoiseModel>,
        gains: &[f64],
        observable: &Observable,
    ) -> ZenoResult<Vec<ExecutionResult>> {
        gains
            .iter()
            .map(|&g| self.execute(circuit, noise, g, observable))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
