//! # ZENO Bench
//!
//! Random-circuit studies of the unmitigated error δ₀.
//!
//! ## Gantree Architecture
//!
//! ```text
//! L6_Benchmark // δ₀ study (done)
//!     Generators // seeded random layered circuits (done)
//!         layered(n, d) // CNOT layer, gate-set layer, alternating
//!         ghz(n)
//!     DeltaStudy // per-circuit ideal vs noisy median projector (done)
//!         circuit_pass(index)
//!         run() // rayon over circuits
//!     Reporter // bins, histogram, markdown / json / csv (done)
//!         create_bins(lower, width, count)
//!         find_bin(value, bins)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zeno_bench::prelude::*;
//!
//! let study = DeltaStudy::new(StudyConfig::small(3, 4, 4).with_epsilon(0.01)).unwrap();
//! let result = study.run().unwrap();
//! assert_eq!(result.outcomes.len(), 4);
//!
//! let report = Reporter::to_markdown(&result);
//! println!("{}", report);
//! ```
//!
//! ## Binning
//!
//! ```rust
//! use zeno_bench::prelude::*;
//!
//! let bins = create_bins(0.0, 0.05, 40).unwrap();
//! assert_eq!(find_bin(0.07, &bins), Some(1));
//! assert_eq!(find_bin(2.5, &bins), None);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Circuit generators (Gantree: L6_Benchmark → Generators)
pub mod generators;

/// δ₀ study (Gantree: L6_Benchmark → DeltaStudy)
pub mod suite;

/// Binning and reporting (Gantree: L6_Benchmark → Reporter)
pub mod reporter;

// ============================================================================
// Re-exports
// ============================================================================

pub use generators::{CircuitGenerator, DEFAULT_GATE_SET};
pub use reporter::{create_bins, find_bin, Bin, Histogram, ReportFormat, Reporter};
pub use suite::{BinSpec, CircuitOutcome, DeltaStudy, StudyConfig, StudyResult};

// ============================================================================
// Prelude
// ============================================================================

// Convenient imports below
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zeno_bench::prelude::*;
    //! ```

    pub use crate::generators::CircuitGenerator;
    pub use crate::reporter::{create_bins, find_bin, Bin, Histogram, ReportFormat, Reporter};
    pub use crate::suite::{BinSpec, CircuitOutcome, DeltaStudy, StudyConfig, StudyResult};
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use zeno_backend::ExecutorConfig;

    fn small_result() -> StudyResult {
        DeltaStudy::new(StudyConfig::small(3, 4, 5).with_epsilon(0.02).with_seed(11))
            .unwrap()
            .run()
            .unwrap()
    }

    #[test]
    fn test_study_histogram_counts_every_circuit() {
        let result = small_result();
        assert_eq!(result.outcomes.len(), 5);
        assert_eq!(result.histogram.total(), 5);
        assert_eq!(result.histogram.outside, 0);
        for o in &result.outcomes {
            assert!(o.delta_zero >= 0.0);
            assert!(o.ideal >= 0.5 - 1e-12);
        }
        assert!(result.pec_overhead > 1.0);
    }

    #[test]
    fn test_reporter_formats() {
        let result = small_result();

        let md = Reporter::report(&result, ReportFormat::Markdown).unwrap();
        assert!(md.contains("# δ₀ Study"));
        assert!(md.contains("| bin | count | fraction |"));

        let json = Reporter::report(&result, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcomes"].as_array().unwrap().len(), 5);

        let csv = Reporter::report(&result, ReportFormat::Csv).unwrap();
        assert!(csv.starts_with("index,ideal,noisy"));
        assert_eq!(csv.lines().count(), 6);
    }

    #[test]
    fn test_trajectory_study_is_reproducible() {
        let config = StudyConfig::small(4, 2, 3)
            .with_epsilon(0.05)
            .with_executor(ExecutorConfig::trajectories(200));
        let a = DeltaStudy::new(config.clone()).unwrap().run().unwrap();
        let b = DeltaStudy::new(config).unwrap().run().unwrap();
        assert_eq!(a.deltas(), b.deltas());
        assert!(a.outcomes.iter().all(|o| o.std_error >= 0.0));
    }
}
