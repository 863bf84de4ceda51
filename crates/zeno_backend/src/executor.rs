//! Circuit executor
//!
//! Gantree: L3_Backend → Executor
//!
//! Evolves a freshly reset register layer by layer. After each layer's
//! unitaries the noise channel (scaled by gain) is applied, normalization is
//! checked and the timeout is enforced. The final state is read out against
//! the observable. The circuit's global phase does not affect expectations
//! and is ignored.

use crate::density::DensityMatrix;
use crate::execution::{Backend, ExecutionMethod, ExecutionResult};
use crate::state::RegisterState;
use crate::statevector::StateVector;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use zeno_core::circuit::Circuit;
use zeno_core::constants::limits::{MAX_DENSITY_QUBITS, MAX_STATEVECTOR_QUBITS};
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::observable::{Observable, Projector};
use zeno_core::operator::Tolerance;
use zeno_noise::NoiseModel;

// ============================================================================
// Configuration
// ============================================================================

/// Noisy-evolution strategy
/// Gantree: NoisyMethod // Exact | Trajectories{shots}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoisyMethod {
    /// Density matrix with exact channels
    #[default]
    Exact,
    /// Average of `shots` sampled state-vector trajectories
    Trajectories {
        /// Trajectory count; variance falls as `1/shots`
        shots: usize,
    },
}

/// Executor configuration
/// Gantree: ExecutorConfig // immutable run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Strategy used when a noise model is present
    pub noisy_method: NoisyMethod,

    /// Normalization drift tolerated before renormalizing
    pub tolerance: Tolerance,

    /// Base seed; each gain derives its own stream. Unseeded runs draw a
    /// fresh base seed and report it in the result metadata.
    pub seed: Option<u64>,

    /// State-vector width limit
    pub max_statevector_qubits: usize,

    /// Density-matrix width limit
    pub max_density_qubits: usize,

    /// Wall-clock limit per run in milliseconds
    pub timeout_ms: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            noisy_method: NoisyMethod::Exact,
            tolerance: Tolerance::default(),
            seed: None,
            max_statevector_qubits: MAX_STATEVECTOR_QUBITS,
            max_density_qubits: MAX_DENSITY_QUBITS,
            timeout_ms: None,
        }
    }
}

impl ExecutorConfig {
    /// Exact density-matrix configuration
    pub fn exact() -> Self {
        Self::default()
    }

    /// Trajectory configuration
    pub fn trajectories(shots: usize) -> Self {
        Self {
            noisy_method: NoisyMethod::Trajectories { shots },
            ..Default::default()
        }
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set tolerance
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set density-matrix limit (clamped to the hard limit)
    pub fn with_max_density_qubits(mut self, max: usize) -> Self {
        self.max_density_qubits = max.min(MAX_DENSITY_QUBITS);
        self
    }

    /// Set state-vector limit (clamped to the hard limit)
    pub fn with_max_statevector_qubits(mut self, max: usize) -> Self {
        self.max_statevector_qubits = max.min(MAX_STATEVECTOR_QUBITS);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ZenoResult<()> {
        if let NoisyMethod::Trajectories { shots: 0 } = self.noisy_method {
            return Err(ZenoError::InvalidConfig(
                "trajectory mode needs at least one shot".to_string(),
            ));
        }
        if !self.tolerance.epsilon.is_finite() || self.tolerance.epsilon <= 0.0 {
            return Err(ZenoError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance.epsilon
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Layer-by-layer simulator
/// Gantree: Executor // run(circuit, noise?, gain, observable)
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    /// Create executor with configuration
    pub fn new(config: ExecutorConfig) -> ZenoResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Expectation value only
    /// Gantree: run(circuit, noise, gain, observable) -> Result<f64>
    pub fn run(
        &self,
        circuit: &Circuit,
        noise: Option<&NoiseModel>,
        gain: f64,
        observable: &Observable,
    ) -> ZenoResult<f64> {
        Ok(self.execute(circuit, noise, gain, observable)?.expectation)
    }

    /// Method chosen for a run
    /// Gantree: select_method(noise) -> ExecutionMethod // once per run
    pub fn select_method(&self, noise: Option<&NoiseModel>) -> ExecutionMethod {
        match noise {
            Some(model) if !model.is_noiseless() => match self.config.noisy_method {
                NoisyMethod::Exact => ExecutionMethod::DensityMatrix,
                NoisyMethod::Trajectories { .. } => ExecutionMethod::Trajectories,
            },
            _ => ExecutionMethod::StateVector,
        }
    }

    /// Basis-state probabilities of the noiseless final state
    /// Gantree: ideal_probabilities(circuit) -> Result<Vec<f64>>
    pub fn ideal_probabilities(&self, circuit: &Circuit) -> ZenoResult<Vec<f64>> {
        let n = circuit.num_qubits();
        if n == 0 {
            return Err(ZenoError::EmptyCircuit);
        }
        self.check_width(n, ExecutionMethod::StateVector)?;
        let mut state = StateVector::new(n)?;
        let mut rng = Self::rng_for(self.base_seed(), 1.0);
        self.evolve(&mut state, circuit, None, 1.0, &mut rng, Instant::now())?;
        Ok(state.probabilities())
    }

    /// Projector onto the noiseless heavy outputs (probability ≥ median)
    pub fn median_projector(&self, circuit: &Circuit) -> ZenoResult<Projector> {
        Projector::above_median(&self.ideal_probabilities(circuit)?)
    }

    /// Configured seed, or a fresh one per run
    fn base_seed(&self) -> u64 {
        self.config.seed.unwrap_or_else(rand::random)
    }

    /// RNG stream for one gain
    fn rng_for(base_seed: u64, gain: f64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(base_seed ^ gain.to_bits().rotate_left(17))
    }

    fn check_width(&self, num_qubits: usize, method: ExecutionMethod) -> ZenoResult<()> {
        let (max, representation) = match method {
            ExecutionMethod::DensityMatrix => (self.config.max_density_qubits, "density_matrix"),
            _ => (self.config.max_statevector_qubits, "statevector"),
        };
        if num_qubits > max {
            return Err(ZenoError::QubitLimitExceeded {
                qubits: num_qubits,
                max,
                representation: representation.to_string(),
            });
        }
        Ok(())
    }

    /// Evolve `state` through the circuit; returns renormalization count
    fn evolve<S: RegisterState>(
        &self,
        state: &mut S,
        circuit: &Circuit,
        noise: Option<&NoiseModel>,
        gain: f64,
        rng: &mut ChaCha8Rng,
        started: Instant,
    ) -> ZenoResult<usize> {
        let mut renormalizations = 0;
        for (i, layer) in circuit.layers().enumerate() {
            state.apply_layer(layer)?;
            if let Some(model) = noise {
                model.apply(state, layer, gain, rng)?;
            }
            if state.check_normalization(self.config.tolerance.epsilon) {
                renormalizations += 1;
            }
            if let Some(limit_ms) = self.config.timeout_ms {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                if elapsed_ms >= limit_ms {
                    log::warn!("run timed out after layer {} ({} ms)", i, elapsed_ms);
                    return Err(ZenoError::Timeout {
                        elapsed_ms,
                        limit_ms,
                    });
                }
            }
        }
        Ok(renormalizations)
    }
}

impl Backend for Executor {
    fn name(&self) -> &str {
        "zeno_executor"
    }

    fn max_qubits(&self, noisy: bool) -> usize {
        match (noisy, self.config.noisy_method) {
            (true, NoisyMethod::Exact) => self.config.max_density_qubits,
            _ => self.config.max_statevector_qubits,
        }
    }

    /// Gantree: execute(circuit, noise, gain, observable) -> Result<ExecutionResult>
    fn execute(
        &self,
        circuit: &Circuit,
        noise: Option<&NoiseModel>,
        gain: f64,
        observable: &Observable,
    ) -> ZenoResult<ExecutionResult> {
        let started = Instant::now();
        let n = circuit.num_qubits();
        if n == 0 {
            return Err(ZenoError::EmptyCircuit);
        }
        if !gain.is_finite() || gain < 1.0 {
            return Err(ZenoError::InvalidGain(gain));
        }
        observable.validate_for(n)?;
        if let Some(model) = noise {
            model.validate_for(n)?;
        }

        let method = self.select_method(noise);
        self.check_width(n, method)?;
        log::debug!(
            "executing {} qubits, depth {}, gain {:.3} via {}",
            n,
            circuit.depth(),
            gain,
            method
        );

        let seed = self.base_seed();
        let mut rng = Self::rng_for(seed, gain);
        let mut result = match method {
            ExecutionMethod::StateVector => {
                let mut state = StateVector::new(n)?;
                let renorm = self.evolve(&mut state, circuit, None, gain, &mut rng, started)?;
                let mut r = ExecutionResult::exact(state.expectation(observable)?, gain, method, self.name());
                r.renormalizations = renorm;
                r
            }
            ExecutionMethod::DensityMatrix => {
                let mut state = DensityMatrix::new(n)?;
                let renorm = self.evolve(&mut state, circuit, noise, gain, &mut rng, started)?;
                let mut r = ExecutionResult::exact(state.expectation(observable)?, gain, method, self.name());
                r.renormalizations = renorm;
                r
            }
            ExecutionMethod::Trajectories => {
                let shots = match self.config.noisy_method {
                    NoisyMethod::Trajectories { shots } => shots,
                    NoisyMethod::Exact => 1,
                };
                let mut samples = Vec::with_capacity(shots);
                let mut renorm = 0;
                let mut state = StateVector::new(n)?;
                for _ in 0..shots {
                    state.reset(n)?;
                    renorm += self.evolve(&mut state, circuit, noise, gain, &mut rng, started)?;
                    samples.push(state.expectation(observable)?);
                }
                let mut r = ExecutionResult::from_samples(&samples, gain, self.name());
                r.renormalizations = renorm;
                r
            }
        };

        result.metadata.num_qubits = n;
        result.metadata.depth = circuit.depth();
        result.metadata.seed = Some(seed);
        result.metadata.execution_time_ms = Some(started.elapsed().as_millis() as u64);
        if let Some(model) = noise {
            result
                .metadata
                .extra
                .insert("noise_terms".to_string(), model.len().to_string());
        }
        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================
