//! Experiment report
//!
//! Gantree: L5_Integration → ExperimentReport

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use zeno_backend::ExecutionMethod;
use zeno_core::circuit::Circuit;
use zeno_core::error::ZenoResult;
use zeno_core::topology::Topology;
use zeno_mitigation::{ExtrapolationSample, FitResult, ZneResult};

/// Circuit summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSummary {
    /// Register width
    pub num_qubits: usize,
    /// Non-empty layers
    pub depth: usize,
    /// One-qubit gate count
    pub count_1q: usize,
    /// Two-qubit gate count
    pub count_2q: usize,
    /// Longest shortest coupling path
    pub coupling_diameter: usize,
    /// Every qubit reachable over couplings
    pub connected: bool,
}

impl CircuitSummary {
    /// Summarize a circuit and the graph it was built on
    pub fn new(circuit: &Circuit, topology: &Topology) -> Self {
        Self {
            num_qubits: circuit.num_qubits(),
            depth: circuit.depth(),
            count_1q: circuit.count_1q(),
            count_2q: circuit.count_2q(),
            coupling_diameter: topology.diameter(),
            connected: topology.is_fully_connected(),
        }
    }
}

/// Serializable outcome of one experiment
/// Gantree: ExperimentReport // samples + estimate + diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Experiment name
    pub name: String,

    /// Circuit summary
    pub circuit: CircuitSummary,

    /// Simulation method used for the noisy runs
    pub method: ExecutionMethod,

    /// Per-gain samples
    pub samples: Vec<ExtrapolationSample>,

    /// Zero-noise estimate
    pub estimate: f64,

    /// Value at the smallest gain
    pub unmitigated: f64,

    /// Fit diagnostics
    pub fit: FitResult,

    /// Noiseless value, when computed
    pub ideal: Option<f64>,

    /// `|unmitigated − ideal| / |estimate − ideal|`
    pub improvement_ratio: Option<f64>,

    /// PEC sampling overhead γ of the noise model at gain 1
    pub pec_overhead: f64,

    /// Wall-clock time of the whole pipeline
    pub total_time_ms: u64,
}

impl ExperimentReport {
    /// Assemble from a ZNE result
    pub fn new(
        name: impl Into<String>,
        circuit: CircuitSummary,
        method: ExecutionMethod,
        zne: ZneResult,
        pec_overhead: f64,
        total_time_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            circuit,
            method,
            estimate: zne.estimate,
            unmitigated: zne.unmitigated,
            ideal: zne.ideal,
            improvement_ratio: zne.improvement_ratio,
            samples: zne.samples,
            fit: zne.fit,
            pec_overhead,
            total_time_ms,
        }
    }

    /// `|estimate − ideal|`
    pub fn absolute_error(&self) -> Option<f64> {
        self.ideal.map(|ideal| (self.estimate - ideal).abs())
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> ZenoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty JSON
    pub fn to_json(&self) -> ZenoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ZenoResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Write as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> ZenoResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Markdown summary table
    pub fn to_markdown(&self) -> String {
        let mut md = format!("## {}\n\n", self.name);
        md.push_str(&format!(
            "{} qubits, depth {}, {} two-qubit gates, method `{}`\n\n",
            self.circuit.num_qubits, self.circuit.depth, self.circuit.count_2q, self.method
        ));
        if !self.circuit.connected {
            md.push_str("coupling graph is disconnected\n\n");
        }
        md.push_str("| gain | value | std error |\n|------|-------|-----------|\n");
        for s in &self.samples {
            md.push_str(&format!(
                "| {:.3} | {:.6} | {:.2e} |\n",
                s.gain, s.expectation, s.std_error
            ));
        }
        md.push_str(&format!("\n{}\n", self.fit));
        if let (Some(ideal), Some(ratio)) = (self.ideal, self.improvement_ratio) {
            md.push_str(&format!("\nideal {:.6}, improvement {:.2}x\n", ideal, ratio));
        }
        md
    }
}

impl fmt::Display for ExperimentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: estimate {:.6} (unmitigated {:.6}) over {} gains",
            self.name,
            self.estimate,
            self.unmitigated,
            self.samples.len()
        )?;
        if let Some(ratio) = self.improvement_ratio {
            write!(f, ", improvement {:.2}x", ratio)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use zeno_mitigation::{Extrapolator, FitModel};

    fn sample_report() -> ExperimentReport {
        let samples = vec![
            ExtrapolationSample::exact(1.0, 0.9),
            ExtrapolationSample::exact(2.0, 0.8),
            ExtrapolationSample::exact(3.0, 0.7),
        ];
        let fit = Extrapolator::new(FitModel::Linear).fit(&samples).unwrap();
        let zne = ZneResult::new(samples, fit).with_ideal(1.0);
        ExperimentReport::new(
            "unit",
            CircuitSummary {
                num_qubits: 2,
                depth: 3,
                count_1q: 2,
                count_2q: 1,
                coupling_diameter: 1,
                connected: true,
            },
            ExecutionMethod::DensityMatrix,
            zne,
            1.05,
            3,
        )
    }

    #[test]
    fn test_report_fields() {
        let report = sample_report();
        assert!((report.estimate - 1.0).abs() < 1e-12);
        assert!(report.absolute_error().unwrap() < 1e-12);
        assert!((report.unmitigated - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_report_json_roundtrip() {
        let mut report = sample_report();
        // perfect fit gives an infinite ratio, which JSON cannot carry
        report.improvement_ratio = Some(12.5);
        let back = ExperimentReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(report, back);
    }

    #[test]
    fn test_markdown() {
        let md = sample_report().to_markdown();
        assert!(md.contains("## unit"));
        assert!(md.contains("| 2.000 | 0.800000 |"));
        assert!(md.contains("linear fit"));
        assert!(!md.contains("disconnected"));
    }

    #[test]
    fn test_summary_from_topology() {
        let topology = Topology::from_edges(4, &[(0, 1), (2, 3)]).unwrap();
        let circuit = zeno_core::builder::CircuitBuilder::new(4)
            .cnot(0, 1)
            .cnot(2, 3)
            .build()
            .unwrap();
        let summary = CircuitSummary::new(&circuit, &topology);
        assert_eq!(summary.count_2q, 2);
        assert_eq!(summary.coupling_diameter, 1);
        assert!(!summary.connected);

        let mut report = sample_report();
        report.circuit = summary;
        assert!(report.to_markdown().contains("coupling graph is disconnected"));
    }
}
