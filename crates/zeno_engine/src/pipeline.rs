//! Staged experiment execution
//!
//! Gantree: L5_Integration → Pipeline
//!
//! build_circuit() → build_noise() → build_observable() → extrapolate() →
//! report(). Each stage runs the ones before it when they have not run yet.

use crate::config::ExperimentConfig;
use crate::report::{CircuitSummary, ExperimentReport};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use zeno_backend::Executor;
use zeno_core::circuit::Circuit;
use zeno_core::error::{ZenoError, ZenoResult};
use zeno_core::observable::Observable;
use zeno_core::topology::Topology;
use zeno_mitigation::{ZneResult, ZneRunner};
use zeno_noise::{pec_sampling_overhead, NoiseModel};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Nothing built
    Initial,
    /// Topology and circuit built
    CircuitBuilt,
    /// Noise model built
    NoiseBuilt,
    /// Observable resolved
    ObservableBuilt,
    /// Gain sweep fitted
    Extrapolated,
}

/// Intermediate results
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Current stage
    pub stage: PipelineStage,

    /// Configuration
    pub config: ExperimentConfig,

    /// Coupling graph
    pub topology: Option<Topology>,

    /// Trotter circuit
    pub circuit: Option<Circuit>,

    /// Noise model
    pub noise: Option<NoiseModel>,

    /// Observable
    pub observable: Option<Observable>,

    /// ZNE outcome
    pub zne: Option<ZneResult>,
}

impl PipelineState {
    /// Fresh state
    pub fn new(config: ExperimentConfig) -> Self {
        Self {
            stage: PipelineStage::Initial,
            config,
            topology: None,
            circuit: None,
            noise: None,
            observable: None,
            zne: None,
        }
    }

    /// Check if extrapolation finished
    pub fn is_extrapolated(&self) -> bool {
        self.zne.is_some()
    }
}

/// Experiment pipeline
/// Gantree: Pipeline // staged run
pub struct Pipeline {
    state: PipelineState,
    executor: Executor,
    started: Instant,
}

fn missing(what: &str) -> ZenoError {
    ZenoError::InternalError(format!("pipeline stage produced no {}", what))
}

impl Pipeline {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Validate configuration and create pipeline
    pub fn new(config: ExperimentConfig) -> ZenoResult<Self> {
        config.validate()?;
        let executor = config.build_executor()?;
        Ok(Self {
            state: PipelineState::new(config),
            executor,
            started: Instant::now(),
        })
    }

    // ========================================================================
    // Stage Accessors
    // ========================================================================

    /// Current stage
    pub fn stage(&self) -> PipelineStage {
        self.state.stage
    }

    /// Current state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Configuration
    pub fn config(&self) -> &ExperimentConfig {
        &self.state.config
    }

    /// Executor
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    fn advance(&mut self, stage: PipelineStage) {
        if stage > self.state.stage {
            self.state.stage = stage;
        }
    }

    // ========================================================================
    // Pipeline Stages
    // ========================================================================

    /// Stage 1: coupling graph and Trotter circuit
    pub fn build_circuit(&mut self) -> ZenoResult<&Circuit> {
        let topology = self.state.config.build_topology()?;
        let circuit = self.state.config.build_circuit(&topology)?;
        log::info!(
            "built circuit: {} qubits, depth {}, {} two-qubit gates",
            circuit.num_qubits(),
            circuit.depth(),
            circuit.count_2q()
        );
        if !topology.is_fully_connected() {
            log::warn!(
                "coupling graph {} is disconnected; components evolve independently",
                topology.name().unwrap_or("custom")
            );
        }
        self.state.topology = Some(topology);
        self.advance(PipelineStage::CircuitBuilt);
        Ok(self.state.circuit.insert(circuit))
    }

    /// Stage 2: noise model
    pub fn build_noise(&mut self) -> ZenoResult<&NoiseModel> {
        if self.state.topology.is_none() {
            self.build_circuit()?;
        }
        let topology = self.state.topology.as_ref().ok_or_else(|| missing("topology"))?;
        let noise = self.state.config.build_noise(topology)?;
        noise.validate_for(self.state.config.num_qubits)?;
        log::info!(
            "built noise model: {} terms, total rate {:.3e}",
            noise.len(),
            noise.total_rate()
        );
        self.advance(PipelineStage::NoiseBuilt);
        Ok(self.state.noise.insert(noise))
    }

    /// Stage 3: observable
    pub fn build_observable(&mut self) -> ZenoResult<&Observable> {
        if self.state.circuit.is_none() {
            self.build_circuit()?;
        }
        let circuit = self.state.circuit.as_ref().ok_or_else(|| missing("circuit"))?;
        let observable = self.state.config.observable.build(circuit, &self.executor)?;
        observable.validate_for(circuit.num_qubits())?;
        log::info!("observable: {}", observable);
        self.advance(PipelineStage::ObservableBuilt);
        Ok(self.state.observable.insert(observable))
    }

    /// Stage 4: gain sweep and fit
    pub fn extrapolate(&mut self) -> ZenoResult<&ZneResult> {
        if self.state.circuit.is_none() {
            self.build_circuit()?;
        }
        if self.state.noise.is_none() {
            self.build_noise()?;
        }
        if self.state.observable.is_none() {
            self.build_observable()?;
        }
        let circuit = self.state.circuit.as_ref().ok_or_else(|| missing("circuit"))?;
        let noise = self.state.noise.as_ref().ok_or_else(|| missing("noise model"))?;
        let observable = self.state.observable.as_ref().ok_or_else(|| missing("observable"))?;

        log::info!(
            "sweeping gains {:?} via {}",
            self.state.config.zne.gains,
            self.executor.select_method(Some(noise))
        );
        let runner = ZneRunner::new(self.executor.clone(), self.state.config.zne.clone())?;
        let result = if self.state.config.compute_ideal {
            runner.extrapolate_with_reference(circuit, noise, observable)?
        } else {
            runner.extrapolate(circuit, noise, observable)?
        };
        log::info!("{}", result);
        self.advance(PipelineStage::Extrapolated);
        Ok(self.state.zne.insert(result))
    }

    /// Stage 5: report
    pub fn report(&mut self) -> ZenoResult<ExperimentReport> {
        if self.state.zne.is_none() {
            self.extrapolate()?;
        }
        let topology = self.state.topology.as_ref().ok_or_else(|| missing("topology"))?;
        let circuit = self.state.circuit.as_ref().ok_or_else(|| missing("circuit"))?;
        let noise = self.state.noise.as_ref().ok_or_else(|| missing("noise model"))?;
        let zne = self.state.zne.clone().ok_or_else(|| missing("extrapolation"))?;

        let summary = CircuitSummary::new(circuit, topology);
        let pec_overhead = pec_sampling_overhead(noise, circuit, 1.0)?;
        Ok(ExperimentReport::new(
            self.state.config.name.clone(),
            summary,
            self.executor.select_method(Some(noise)),
            zne,
            pec_overhead,
            self.started.elapsed().as_millis() as u64,
        ))
    }

    /// Run every stage
    pub fn run(&mut self) -> ZenoResult<ExperimentReport> {
        self.build_circuit()?;
        self.build_noise()?;
        self.build_observable()?;
        self.extrapolate()?;
        self.report()
    }
}

/// One-shot helper: validate, run all stages, report
pub fn run_experiment(config: ExperimentConfig) -> ZenoResult<ExperimentReport> {
    Pipeline::new(config)?.run()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoiseSpec, ObservableSpec};
    use zeno_backend::ExecutionMethod;
    use zeno_core::builder::IsingParams;

    fn noisy_chain() -> ExperimentConfig {
        ExperimentConfig::ising_chain(3)
            .with_ising(IsingParams::new(1.0, 0.5, 0.1, 2))
            .with_noise(NoiseSpec::SparseLindblad {
                rate_1q: 2e-3,
                rate_2q: 2e-3,
            })
            .with_observable(ObservableSpec::z(1))
            .with_ideal(true)
    }

    #[test]
    fn test_stages_advance() {
        let mut pipeline = Pipeline::new(noisy_chain()).unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Initial);
        pipeline.build_circuit().unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::CircuitBuilt);
        pipeline.build_noise().unwrap();
        pipeline.build_observable().unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::ObservableBuilt);
        pipeline.extrapolate().unwrap();
        assert!(pipeline.state().is_extrapolated());
    }

    #[test]
    fn test_report_builds_missing_stages() {
        let mut pipeline = Pipeline::new(noisy_chain()).unwrap();
        let report = pipeline.report().unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Extrapolated);
        assert_eq!(report.samples.len(), 3);
        assert_eq!(report.method, ExecutionMethod::DensityMatrix);
        assert!(report.pec_overhead > 1.0);
        assert!(report.improvement_ratio.unwrap() > 1.0);
        assert_eq!(report.circuit.coupling_diameter, 2);
        assert!(report.circuit.connected);
    }

    #[test]
    fn test_noiseless_run() {
        let report = run_experiment(ExperimentConfig::ising_chain(2).with_ideal(true)).unwrap();
        assert_eq!(report.method, ExecutionMethod::StateVector);
        assert!((report.estimate - report.ideal.unwrap()).abs() < 1e-10);
        assert_eq!(report.pec_overhead, 1.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExperimentConfig::ising_chain(3).with_gains(vec![0.5, 1.0]);
        assert!(matches!(Pipeline::new(config), Err(ZenoError::InvalidGain(_))));
    }
}
