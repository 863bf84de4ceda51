//! Zero-noise extrapolation driver
//!
//! Gantree: L4_Mitigation → ZneRunner
//!
//! Runs a circuit at each requested noise gain, fits the chosen model and
//! reports the value at zero noise.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeno_backend::{Backend, ExecutionResult, Executor};
use zeno_core::circuit::Circuit;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::observable::Observable;
use zeno_noise::NoiseModel;

use crate::extrapolation::{ExtrapolationSample, Extrapolator, FitModel, FitResult};

// ============================================================================
// ZneConfig
// ============================================================================

/// Extrapolation sweep configuration
/// Gantree: ZneConfig // gains, model, parallel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZneConfig {
    /// Noise gains, strictly increasing, all ≥ 1
    pub gains: Vec<f64>,

    /// Regression model
    #[serde(default)]
    pub model: FitModel,

    /// Run gains concurrently
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for ZneConfig {
    fn default() -> Self {
        Self {
            gains: vec![1.0, 2.0, 3.0],
            model: FitModel::Linear,
            parallel: true,
        }
    }
}

impl ZneConfig {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a validated configuration
    pub fn new(gains: Vec<f64>, model: FitModel) -> ZenoResult<Self> {
        let config = Self {
            gains,
            model,
            parallel: true,
        };
        config.validate()?;
        Ok(config)
    }

    /// Linear fit over `gains`
    pub fn linear(gains: Vec<f64>) -> ZenoResult<Self> {
        Self::new(gains, FitModel::Linear)
    }

    /// Richardson-style polynomial fit on gains `1, 2, …, degree + 1`
    pub fn richardson(degree: usize) -> ZenoResult<Self> {
        let gains = (1..=degree + 1).map(|g| g as f64).collect();
        Self::new(gains, FitModel::Polynomial(degree))
    }

    /// Exponential fit over `gains`
    pub fn exponential(gains: Vec<f64>) -> ZenoResult<Self> {
        Self::new(gains, FitModel::Exponential)
    }

    /// Set model
    pub fn with_model(mut self, model: FitModel) -> Self {
        self.model = model;
        self
    }

    /// Set gains
    pub fn with_gains(mut self, gains: Vec<f64>) -> Self {
        self.gains = gains;
        self
    }

    /// Enable or disable concurrent gain runs
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate gains against the model
    pub fn validate(&self) -> ZenoResult<()> {
        for (i, &g) in self.gains.iter().enumerate() {
            if !g.is_finite() || g < 1.0 {
                return Err(ZenoError::InvalidGain(g));
            }
            if i > 0 && g <= self.gains[i - 1] {
                return Err(ZenoError::InvalidGain(g));
            }
        }
        let required = self.model.num_parameters();
        if self.gains.len() < required {
            return Err(ZenoError::InsufficientSamples {
                required,
                found: self.gains.len(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// ZneResult
// ============================================================================

/// Outcome of a gain sweep and fit
/// Gantree: ZneResult // samples + fit + estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZneResult {
    /// One sample per gain, in gain order
    pub samples: Vec<ExtrapolationSample>,

    /// Regression result
    pub fit: FitResult,

    /// Zero-noise estimate
    pub estimate: f64,

    /// Value measured at the smallest gain
    pub unmitigated: f64,

    /// Noiseless reference, when known
    pub ideal: Option<f64>,

    /// `|unmitigated − ideal| / |estimate − ideal|`
    pub improvement_ratio: Option<f64>,
}

impl ZneResult {
    /// Build from samples and fit
    pub fn new(samples: Vec<ExtrapolationSample>, fit: FitResult) -> Self {
        let unmitigated = samples.first().map(|s| s.expectation).unwrap_or(0.0);
        Self {
            estimate: fit.estimate,
            samples,
            fit,
            unmitigated,
            ideal: None,
            improvement_ratio: None,
        }
    }

    /// Attach the noiseless reference value
    pub fn with_ideal(mut self, ideal: f64) -> Self {
        let raw = (self.unmitigated - ideal).abs();
        let mitigated = (self.estimate - ideal).abs();
        self.ideal = Some(ideal);
        self.improvement_ratio = Some(if mitigated > 0.0 {
            raw / mitigated
        } else {
            f64::INFINITY
        });
        self
    }

    /// `|estimate − ideal|`
    pub fn absolute_error(&self) -> Option<f64> {
        self.ideal.map(|ideal| (self.estimate - ideal).abs())
    }

    /// `|unmitigated − ideal|`
    pub fn unmitigated_error(&self) -> Option<f64> {
        self.ideal.map(|ideal| (self.unmitigated - ideal).abs())
    }

    /// True if extrapolation moved the value closer to the reference
    pub fn improved(&self) -> Option<bool> {
        self.improvement_ratio.map(|r| r > 1.0)
    }
}

impl fmt::Display for ZneResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ZNE[{}]: {:.6} (unmitigated {:.6}",
            self.fit.model, self.estimate, self.unmitigated
        )?;
        if let (Some(ideal), Some(ratio)) = (self.ideal, self.improvement_ratio) {
            write!(f, ", ideal {:.6}, improvement {:.2}x", ideal, ratio)?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// ZneRunner
// ============================================================================

/// Gain sweep driver over any backend
/// Gantree: ZneRunner // extrapolate(circuit, noise, observable)
#[derive(Debug, Clone)]
pub struct ZneRunner<B: Backend = Executor> {
    backend: B,
    config: ZneConfig,
}

impl ZneRunner<Executor> {
    /// Runner over the default exact executor
    pub fn with_default_backend(config: ZneConfig) -> ZenoResult<Self> {
        Self::new(Executor::default(), config)
    }
}

impl<B: Backend> ZneRunner<B> {
    /// Create runner
    pub fn new(backend: B, config: ZneConfig) -> ZenoResult<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Configuration
    pub fn config(&self) -> &ZneConfig {
        &self.config
    }

    /// Measure every configured gain
    /// Gantree: sample(circuit, noise, observable) -> Vec<ExtrapolationSample>
    pub fn sample(
        &self,
        circuit: &Circuit,
        noise: &NoiseModel,
        observable: &Observable,
    ) -> ZenoResult<Vec<ExtrapolationSample>> {
        let run = |&gain: &f64| -> ZenoResult<ExecutionResult> {
            let result = self.backend.execute(circuit, Some(noise), gain, observable)?;
            log::debug!(
                "gain {:.3}: {:.6} ± {:.2e} via {}",
                gain,
                result.expectation,
                result.std_error,
                result.method
            );
            Ok(result)
        };

        let results: Vec<ExecutionResult> = if self.config.parallel {
            self.config.gains.par_iter().map(run).collect::<ZenoResult<_>>()?
        } else {
            self.config.gains.iter().map(run).collect::<ZenoResult<_>>()?
        };

        Ok(results
            .into_iter()
            .map(|r| ExtrapolationSample::new(r.gain, r.expectation, r.std_error))
            .collect())
    }

    /// Run the sweep and extrapolate to zero noise
    /// Gantree: extrapolate(circuit, noise, observable) -> Result<ZneResult>
    pub fn extrapolate(
        &self,
        circuit: &Circuit,
        noise: &NoiseModel,
        observable: &Observable,
    ) -> ZenoResult<ZneResult> {
        let samples = self.sample(circuit, noise, observable)?;
        let fit = Extrapolator::new(self.config.model).fit(&samples)?;
        log::info!(
            "{} extrapolation over {} gains: {:.6} (R² = {:.4})",
            fit.model,
            samples.len(),
            fit.estimate,
            fit.r_squared
        );
        Ok(ZneResult::new(samples, fit))
    }

    /// Extrapolate and compare against the noiseless run of the same backend
    pub fn extrapolate_with_reference(
        &self,
        circuit: &Circuit,
        noise: &NoiseModel,
        observable: &Observable,
    ) -> ZenoResult<ZneResult> {
        let ideal = self.backend.execute(circuit, None, 1.0, observable)?;
        Ok(self
            .extrapolate(circuit, noise, observable)?
            .with_ideal(ideal.expectation))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use zeno_backend::ExecutorConfig;
    use zeno_core::builder::CircuitBuilder;
    use zeno_core::pauli::Pauli;

    /// Two X layers under layer bit-flip noise: ⟨Z0⟩(g) = e^{-4λg}
    fn bit_flip_setup(rate: f64) -> (Circuit, NoiseModel) {
        let circuit = CircuitBuilder::new(1).x(0).x(0).build().unwrap();
        let noise = NoiseModel::uniform_layer(1, &[(Pauli::X, rate)]).unwrap();
        (circuit, noise)
    }

    #[test]
    fn test_config_validation() {
        assert!(ZneConfig::default().validate().is_ok());
        assert!(matches!(
            ZneConfig::linear(vec![0.5, 1.0]),
            Err(ZenoError::InvalidGain(_))
        ));
        assert!(matches!(
            ZneConfig::linear(vec![1.0, 3.0, 2.0]),
            Err(ZenoError::InvalidGain(_))
        ));
        assert!(matches!(
            ZneConfig::linear(vec![1.0, f64::NAN]),
            Err(ZenoError::InvalidGain(_))
        ));
        assert!(matches!(
            ZneConfig::new(vec![1.0, 2.0], FitModel::Polynomial(2)),
            Err(ZenoError::InsufficientSamples { required: 3, found: 2 })
        ));
        assert_eq!(ZneConfig::richardson(2).unwrap().gains, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_exponential_recovers_ideal() {
        let (circuit, noise) = bit_flip_setup(0.05);
        let runner = ZneRunner::with_default_backend(
            ZneConfig::exponential(vec![1.0, 2.0, 3.0]).unwrap(),
        )
        .unwrap();
        let result = runner
            .extrapolate_with_reference(&circuit, &noise, &Observable::z(0))
            .unwrap();
        assert_relative_eq!(result.ideal.unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.estimate, 1.0, epsilon = 1e-9);
        assert_relative_eq!(result.unmitigated, (-0.2f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_linear_improves_on_unmitigated() {
        let (circuit, noise) = bit_flip_setup(0.05);
        let runner = ZneRunner::with_default_backend(ZneConfig::default()).unwrap();
        let result = runner
            .extrapolate_with_reference(&circuit, &noise, &Observable::z(0))
            .unwrap();
        assert!(result.improved().unwrap());
        assert!(result.absolute_error().unwrap() < result.unmitigated_error().unwrap());
        assert_eq!(result.samples.len(), 3);
        assert!(result.to_string().contains("improvement"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (circuit, noise) = bit_flip_setup(0.02);
        let config = ZneConfig::richardson(2).unwrap();
        let par = ZneRunner::with_default_backend(config.clone())
            .unwrap()
            .extrapolate(&circuit, &noise, &Observable::z(0))
            .unwrap();
        let seq = ZneRunner::with_default_backend(config.with_parallel(false))
            .unwrap()
            .extrapolate(&circuit, &noise, &Observable::z(0))
            .unwrap();
        assert_eq!(par.samples, seq.samples);
        assert_relative_eq!(par.estimate, seq.estimate);
    }

    #[test]
    fn test_noiseless_sweep_is_flat() {
        let (circuit, _) = bit_flip_setup(0.0);
        let runner = ZneRunner::with_default_backend(ZneConfig::default()).unwrap();
        let result = runner
            .extrapolate(&circuit, &NoiseModel::new(), &Observable::z(0))
            .unwrap();
        assert_relative_eq!(result.estimate, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.unmitigated, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trajectory_samples_carry_errors() {
        let (circuit, noise) = bit_flip_setup(0.05);
        let backend = Executor::new(ExecutorConfig::trajectories(400).with_seed(11)).unwrap();
        let runner = ZneRunner::new(backend, ZneConfig::default()).unwrap();
        let samples = runner.sample(&circuit, &noise, &Observable::z(0)).unwrap();
        assert!(samples.iter().all(|s| s.std_error > 0.0));
        assert_eq!(
            samples.iter().map(|s| s.gain).collect::<Vec<_>>(),
            vec![1.0, 2.0, 3.0]
        );
    }
}
