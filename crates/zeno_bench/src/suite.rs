//! δ₀ study over random layered circuits
//!
//! Gantree: L6_Benchmark → DeltaStudy
//!
//! For each random circuit the observable is the projector onto basis
//! states whose ideal probability is at least the median. δ₀ is the
//! distance between its noisy and ideal expectation under depolarizing
//! noise of strength ε on every gate. Optionally each circuit is also
//! mitigated with ZNE.

use crate::generators::CircuitGenerator;
use crate::reporter::{create_bins, Bin, Histogram};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use zeno_backend::{Backend, Executor, ExecutorConfig};
use zeno_core::constants::bench;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::observable::Observable;
use zeno_mitigation::{ZneConfig, ZneRunner};
use zeno_noise::{depolarizing_pec_overhead, NoiseModel};

// ============================================================================
// Configuration
// ============================================================================

/// Histogram layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    /// Lower edge of the first bin
    pub lower: f64,
    /// Bin width
    pub width: f64,
    /// Number of bins
    pub count: usize,
}

impl Default for BinSpec {
    fn default() -> Self {
        Self {
            lower: 0.0,
            width: bench::DEFAULT_BIN_WIDTH,
            count: bench::DEFAULT_BIN_COUNT,
        }
    }
}

impl BinSpec {
    /// Build the bins
    pub fn bins(&self) -> ZenoResult<Vec<Bin>> {
        create_bins(self.lower, self.width, self.count)
    }
}

/// Study configuration
/// Gantree: StudyConfig // n, d, ε, circuits, seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Register width
    pub num_qubits: usize,

    /// Layers per circuit
    pub depth: usize,

    /// Depolarizing error on every one- and two-qubit gate
    pub epsilon: f64,

    /// Number of random circuits
    pub circuits: usize,

    /// Base seed; circuit `i` uses `seed + i`
    pub seed: u64,

    /// Executor settings for the noisy runs
    pub executor: ExecutorConfig,

    /// δ₀ histogram layout
    pub bins: BinSpec,

    /// Optional ZNE pass per circuit
    pub mitigation: Option<ZneConfig>,

    /// Run circuits concurrently
    pub parallel: bool,
}

impl Default for StudyConfig {
    /// Random-circuit defaults: 20 qubits, depth 6, ε = 0.01, 500 circuits,
    /// sampled with 4000 trajectories per run
    fn default() -> Self {
        Self {
            num_qubits: bench::DEFAULT_QUBITS,
            depth: bench::DEFAULT_DEPTH,
            epsilon: bench::DEFAULT_EPSILON,
            circuits: bench::DEFAULT_CIRCUITS,
            seed: 42,
            executor: ExecutorConfig::trajectories(bench::DEFAULT_SAMPLES),
            bins: BinSpec::default(),
            mitigation: None,
            parallel: true,
        }
    }
}

impl StudyConfig {
    /// Small exact study suitable for density-matrix simulation
    pub fn small(num_qubits: usize, depth: usize, circuits: usize) -> Self {
        Self {
            num_qubits,
            depth,
            circuits,
            executor: ExecutorConfig::exact(),
            ..Default::default()
        }
    }

    /// Set ε
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set executor settings
    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }

    /// Set histogram layout
    pub fn with_bins(mut self, bins: BinSpec) -> Self {
        self.bins = bins;
        self
    }

    /// Mitigate every circuit with ZNE
    pub fn with_mitigation(mut self, zne: ZneConfig) -> Self {
        self.mitigation = Some(zne);
        self
    }

    /// Enable or disable concurrent circuits
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ZenoResult<()> {
        if self.num_qubits == 0 {
            return Err(ZenoError::EmptyCircuit);
        }
        if self.circuits == 0 {
            return Err(ZenoError::InvalidConfig("circuits must be > 0".to_string()));
        }
        if !(0.0..1.0).contains(&self.epsilon) {
            return Err(ZenoError::InvalidProbability(self.epsilon));
        }
        self.executor.validate()?;
        self.bins.bins()?;
        if let Some(zne) = &self.mitigation {
            zne.validate()?;
        }
        Ok(())
    }
}

impl fmt::Display for StudyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StudyConfig({}Q, depth={}, ε={}, circuits={}, seed={})",
            self.num_qubits, self.depth, self.epsilon, self.circuits, self.seed
        )
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one random circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitOutcome {
    /// Circuit index within the seeded family
    pub index: usize,
    /// Ideal projector expectation
    pub ideal: f64,
    /// Noisy projector expectation
    pub noisy: f64,
    /// `|noisy − ideal|`
    pub delta_zero: f64,
    /// Standard error of the noisy value
    pub std_error: f64,
    /// ZNE estimate, when mitigation is enabled
    pub mitigated: Option<f64>,
}

impl CircuitOutcome {
    /// `|mitigated − ideal|`
    pub fn mitigated_delta(&self) -> Option<f64> {
        self.mitigated.map(|m| (m - self.ideal).abs())
    }
}

/// Outcome of the whole study
/// Gantree: StudyResult // outcomes + histogram + γ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyResult {
    /// Configuration used
    pub config: StudyConfig,
    /// Per-circuit outcomes in index order
    pub outcomes: Vec<CircuitOutcome>,
    /// δ₀ histogram
    pub histogram: Histogram,
    /// Closed-form PEC overhead for the study shape
    pub pec_overhead: f64,
    /// Wall-clock time
    pub total_time_ms: u64,
}

impl StudyResult {
    /// δ₀ values in index order
    pub fn deltas(&self) -> Vec<f64> {
        self.outcomes.iter().map(|o| o.delta_zero).collect()
    }

    /// Mean δ₀
    pub fn mean_delta(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.outcomes.iter().map(|o| o.delta_zero).sum::<f64>() / self.outcomes.len() as f64
    }

    /// Largest δ₀
    pub fn max_delta(&self) -> f64 {
        self.outcomes.iter().map(|o| o.delta_zero).fold(0.0, f64::max)
    }

    /// Mean `|mitigated − ideal|` over mitigated circuits
    pub fn mean_mitigated_delta(&self) -> Option<f64> {
        let deltas: Vec<f64> = self.outcomes.iter().filter_map(|o| o.mitigated_delta()).collect();
        if deltas.is_empty() {
            None
        } else {
            Some(deltas.iter().sum::<f64>() / deltas.len() as f64)
        }
    }
}

// ============================================================================
// DeltaStudy
// ============================================================================

/// Random-circuit δ₀ study
/// Gantree: DeltaStudy // run() -> StudyResult
pub struct DeltaStudy {
    config: StudyConfig,
    generator: CircuitGenerator,
    noise: NoiseModel,
}

impl DeltaStudy {
    /// Validate configuration and create study
    pub fn new(config: StudyConfig) -> ZenoResult<Self> {
        config.validate()?;
        let noise = NoiseModel::depolarizing(config.epsilon, config.epsilon)?;
        let generator = CircuitGenerator::with_seed(config.seed);
        Ok(Self {
            config,
            generator,
            noise,
        })
    }

    /// Use a custom circuit generator
    pub fn with_generator(mut self, generator: CircuitGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Configuration
    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Evaluate circuit `index`
    /// Gantree: circuit_pass(index) -> Result<CircuitOutcome>
    pub fn circuit_pass(&self, index: usize) -> ZenoResult<CircuitOutcome> {
        let c = &self.config;
        let circuit = self
            .generator
            .layered_indexed(c.num_qubits, c.depth, index as u64)?;
        let executor = Executor::new(
            c.executor
                .clone()
                .with_seed(c.seed.wrapping_add(index as u64)),
        )?;

        let observable: Observable = executor.median_projector(&circuit)?.into();
        let ideal = executor.run(&circuit, None, 1.0, &observable)?;
        let noisy = executor.execute(&circuit, Some(&self.noise), 1.0, &observable)?;

        let mitigated = match &c.mitigation {
            Some(zne) => {
                let runner = ZneRunner::new(executor, zne.clone().with_parallel(false))?;
                Some(runner.extrapolate(&circuit, &self.noise, &observable)?.estimate)
            }
            None => None,
        };

        let delta_zero = (noisy.expectation - ideal).abs();
        log::debug!("circuit {}: ideal {:.6}, δ₀ {:.6}", index, ideal, delta_zero);
        Ok(CircuitOutcome {
            index,
            ideal,
            noisy: noisy.expectation,
            delta_zero,
            std_error: noisy.std_error,
            mitigated,
        })
    }

    /// Run every circuit and bin the δ₀ values
    pub fn run(&self) -> ZenoResult<StudyResult> {
        let started = Instant::now();
        log::info!("starting δ₀ study: {}", self.config);

        let outcomes: Vec<CircuitOutcome> = if self.config.parallel {
            (0..self.config.circuits)
                .into_par_iter()
                .map(|i| self.circuit_pass(i))
                .collect::<ZenoResult<_>>()?
        } else {
            (0..self.config.circuits)
                .map(|i| self.circuit_pass(i))
                .collect::<ZenoResult<_>>()?
        };

        let histogram = Histogram::from_values(
            self.config.bins.bins()?,
            outcomes.iter().map(|o| o.delta_zero),
        );
        let pec_overhead =
            depolarizing_pec_overhead(self.config.num_qubits, self.config.depth, self.config.epsilon)?;
        let result = StudyResult {
            config: self.config.clone(),
            outcomes,
            histogram,
            pec_overhead,
            total_time_ms: started.elapsed().as_millis() as u64,
        };
        log::info!(
            "δ₀ study done: mean {:.6}, max {:.6}",
            result.mean_delta(),
            result.max_delta()
        );
        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use zeno_core::gate::SingleQubitGate;

    #[test]
    fn test_default_config() {
        let config = StudyConfig::default();
        assert_eq!(config.num_qubits, 20);
        assert_eq!(config.circuits, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(StudyConfig::small(3, 2, 0).validate().is_err());
        assert!(StudyConfig::small(3, 2, 1).with_epsilon(1.0).validate().is_err());
        assert!(StudyConfig::small(0, 2, 1).validate().is_err());
    }

    /// Product-state circuits whose heavy set is not the whole register
    fn rx_study(config: StudyConfig) -> DeltaStudy {
        let generator = CircuitGenerator::with_seed(config.seed)
            .with_gate_set(vec![SingleQubitGate::Rx(0.8)])
            .unwrap();
        DeltaStudy::new(config).unwrap().with_generator(generator)
    }

    #[test]
    fn test_circuit_pass() {
        let study = rx_study(StudyConfig::small(3, 2, 1).with_epsilon(0.02));
        let outcome = study.circuit_pass(0).unwrap();
        // heavy outputs are the weight-0 and weight-1 states: cos⁶ + 3cos⁴sin²
        let (c2, s2) = (0.4f64.cos().powi(2), 0.4f64.sin().powi(2));
        assert_relative_eq!(outcome.ideal, c2.powi(3) + 3.0 * c2 * c2 * s2, epsilon = 1e-10);
        assert!(outcome.noisy < outcome.ideal);
        assert_relative_eq!(outcome.delta_zero, outcome.ideal - outcome.noisy);
        assert_eq!(outcome.std_error, 0.0);
    }

    #[test]
    fn test_noiseless_study_has_zero_delta() {
        let result = DeltaStudy::new(StudyConfig::small(3, 4, 3).with_epsilon(0.0))
            .unwrap()
            .run()
            .unwrap();
        assert!(result.max_delta() < 1e-12);
        assert_eq!(result.histogram.counts[0], 3);
        assert_eq!(result.pec_overhead, 1.0);
    }

    #[test]
    fn test_study_is_reproducible() {
        let config = StudyConfig::small(3, 4, 4).with_epsilon(0.01).with_seed(7);
        let a = DeltaStudy::new(config.clone()).unwrap().run().unwrap();
        let b = DeltaStudy::new(config.with_parallel(false)).unwrap().run().unwrap();
        assert_eq!(a.outcomes, b.outcomes);
        assert_eq!(a.histogram.total(), 4);
    }

    #[test]
    fn test_mitigation_reduces_delta() {
        let config = StudyConfig::small(3, 2, 2)
            .with_epsilon(0.01)
            .with_mitigation(ZneConfig::richardson(2).unwrap());
        let result = rx_study(config).run().unwrap();
        let mitigated = result.mean_mitigated_delta().unwrap();
        assert!(mitigated < result.mean_delta());
    }
}
