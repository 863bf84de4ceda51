//! Constants for ZENO
//!
//! Gantree: L0_Foundation → Constants
//!
//! Numerical tolerances, register limits, Ising/benchmark defaults and
//! statistical thresholds.

// ============================================================================
// Numerics Constants
// Gantree: numerics // tolerances
// ============================================================================

pub mod numerics {
    //! Floating-point tolerances

    /// Default tolerance for unitarity, normalization and angle checks
    /// Gantree: DEFAULT_TOLERANCE: f64 = 1e-9
    pub const DEFAULT_TOLERANCE: f64 = 1e-9;

    /// Tolerance for norm/trace drift before renormalizing
    pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;
}

// ============================================================================
// Register Limits
// Gantree: limits // dense representation limits
// ============================================================================

pub mod limits {
    //! Dense simulation limits

    /// Largest register held as a state vector (2^24 amplitudes = 256 MiB)
    /// Gantree: MAX_STATEVECTOR_QUBITS: usize = 24
    pub const MAX_STATEVECTOR_QUBITS: usize = 24;

    /// Largest register held as a density matrix (4^12 entries = 256 MiB)
    /// Gantree: MAX_DENSITY_QUBITS: usize = 12
    pub const MAX_DENSITY_QUBITS: usize = 12;

    /// Largest register for which `Circuit::unitary` is built
    pub const MAX_UNITARY_QUBITS: usize = 10;
}

// ============================================================================
// Ising Constants
// Gantree: ising // Trotter defaults
// ============================================================================

pub mod ising {
    //! Transverse-field Ising defaults

    use std::f64::consts::FRAC_PI_2;

    /// Default coupling J
    pub const DEFAULT_J: f64 = 1.0;

    /// Default transverse field h
    pub const DEFAULT_H: f64 = 0.0;

    /// Default Trotter step
    pub const DEFAULT_DT: f64 = 0.1;

    /// Default number of Trotter steps
    pub const DEFAULT_STEPS: usize = 1;

    /// Benchmark coupling angle (Clifford point)
    /// Gantree: BENCHMARK_THETA_J: f64 = -π/2
    pub const BENCHMARK_THETA_J: f64 = -FRAC_PI_2;

    /// Benchmark transverse angle
    pub const BENCHMARK_THETA_H: f64 = 0.0;

    /// Global phase contributed by one decomposed RZZ(-π/2)
    pub const RZZ_FAST_PATH_PHASE: f64 = std::f64::consts::FRAC_PI_4;
}

// ============================================================================
// Benchmark Constants
// Gantree: bench // random-circuit study defaults
// ============================================================================

pub mod bench {
    //! Random-circuit δ₀ study defaults

    /// Default register width
    pub const DEFAULT_QUBITS: usize = 20;

    /// Default number of layers
    pub const DEFAULT_DEPTH: usize = 6;

    /// Default depolarizing error per gate
    pub const DEFAULT_EPSILON: f64 = 0.01;

    /// Default number of random circuits
    pub const DEFAULT_CIRCUITS: usize = 500;

    /// Default PEC sample budget
    pub const DEFAULT_SAMPLES: usize = 4000;

    /// Default histogram bin width
    pub const DEFAULT_BIN_WIDTH: f64 = 0.05;

    /// Default histogram bin count
    pub const DEFAULT_BIN_COUNT: usize = 40;
}

// ============================================================================
// Statistics Constants
// Gantree: stats // confidence intervals
// ============================================================================

pub mod stats {
    //! Critical values for two-sided 95% confidence intervals

    /// Z critical value for 95% confidence
    /// Gantree: Z_CRIT_95: f64 = 1.960
    pub const Z_CRIT_95: f64 = 1.960;

    /// Student t critical values (two-sided, 95%) for 1..=30 degrees of freedom
    pub const T_CRIT_95: [f64; 30] = [
        12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179,
        2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064,
        2.060, 2.056, 2.052, 2.048, 2.045, 2.042,
    ];

    /// t critical value for the given degrees of freedom
    ///
    /// Returns `None` for zero degrees of freedom; falls back to the normal
    /// value past the table.
    pub fn t_critical_95(dof: usize) -> Option<f64> {
        match dof {
            0 => None,
            d if d <= T_CRIT_95.len() => Some(T_CRIT_95[d - 1]),
            _ => Some(Z_CRIT_95),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_critical() {
        assert_eq!(stats::t_critical_95(0), None);
        assert!((stats::t_critical_95(1).unwrap() - 12.706).abs() < 1e-10);
        assert!((stats::t_critical_95(30).unwrap() - 2.042).abs() < 1e-10);
        assert!((stats::t_critical_95(500).unwrap() - stats::Z_CRIT_95).abs() < 1e-10);
    }

    #[test]
    fn test_t_critical_decreasing() {
        for w in stats::T_CRIT_95.windows(2) {
            assert!(w[0] > w[1]);
        }
    }

    #[test]
    fn test_limits_ordering() {
        assert!(limits::MAX_DENSITY_QUBITS < limits::MAX_STATEVECTOR_QUBITS);
    }
}
