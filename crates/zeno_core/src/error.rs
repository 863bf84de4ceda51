//! Error types for ZENO
//!
//! Gantree: L0_Foundation → Errors
//!
//! A single error enum shared by every ZENO crate. Validation happens at
//! construction time; numerical drift during simulation is corrected and
//! logged rather than reported here.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for ZENO
/// Gantree: ZenoError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZenoError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Qubit index out of range or repeated within one operation
    /// Gantree: InvalidTarget{qubit,detail} // range or overlap
    #[error("Invalid target qubit {qubit}: {detail}")]
    InvalidTarget { qubit: usize, detail: String },

    /// Operator dimension does not match the number of targets
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Probability value out of range [0, 1]
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Gain factor below 1 or not finite
    #[error("Invalid gain {0}: must be finite and >= 1")]
    InvalidGain(f64),

    /// Negative or non-finite Lindblad rate
    #[error("Invalid rate {0}: must be finite and >= 0")]
    InvalidRate(f64),

    /// Invalid angle
    #[error("Invalid angle {0}: must be finite")]
    InvalidAngle(f64),

    /// Invalid Pauli label
    #[error("Invalid Pauli string '{0}': expected characters I, X, Y, Z")]
    InvalidPauli(String),

    /// Invalid bitstring format
    #[error("Invalid bitstring '{0}': must contain only '0' and '1'")]
    InvalidBitstring(String),

    /// Invalid gate name or parameter list
    #[error("Invalid gate parameter: {0}")]
    InvalidGateParameter(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Topology Errors
    // ========================================================================
    /// Self-loop in a coupling list
    #[error("Invalid coupling ({0}, {1}): qubits must be different")]
    InvalidCoupling(usize, usize),

    /// Same undirected edge listed twice
    #[error("Duplicate coupling ({0}, {1})")]
    DuplicateCoupling(usize, usize),

    /// Preset qubit count differs from the requested register size
    /// Gantree: TopologyMismatch{preset,expected,found} // preset size
    #[error("Topology '{preset}' expects {expected} qubits, found {found}")]
    TopologyMismatch {
        preset: String,
        expected: usize,
        found: usize,
    },

    /// Two-qubit gate on an uncoupled pair
    #[error("Topology violation: qubits {q1} and {q2} are not connected")]
    TopologyViolation { q1: usize, q2: usize },

    /// No path between two qubits
    #[error("No path found between qubits {0} and {1}")]
    PathNotFound(usize, usize),

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Empty circuit where one is required
    #[error("Circuit is empty")]
    EmptyCircuit,

    /// Register too large for a dense representation
    #[error("Register of {qubits} qubits exceeds the {representation} limit of {max}")]
    QubitLimitExceeded {
        qubits: usize,
        max: usize,
        representation: String,
    },

    /// Run exceeded its time budget
    #[error("Execution timed out after {elapsed_ms} ms (limit {limit_ms} ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    // ========================================================================
    // Extrapolation Errors
    // ========================================================================
    /// Fewer distinct gains than fit parameters
    /// Gantree: InsufficientSamples{required,found} // fit size
    #[error("Insufficient samples: fit needs {required} distinct gains, found {found}")]
    InsufficientSamples { required: usize, found: usize },

    /// Fit could not be computed
    #[error("Fit failed: {0}")]
    FitFailed(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// File I/O error
    #[error("File error: {0}")]
    FileError(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for ZENO operations
/// Gantree: ZenoResult<T> // type alias
pub type ZenoResult<T> = Result<T, ZenoError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for ZenoError {
    fn from(err: serde_json::Error) -> Self {
        ZenoError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for ZenoError {
    fn from(err: std::io::Error) -> Self {
        ZenoError::FileError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl ZenoError {
    /// Target outside a register of `num_qubits` qubits
    pub fn invalid_target(qubit: usize, num_qubits: usize) -> Self {
        ZenoError::InvalidTarget {
            qubit,
            detail: format!("register has {} qubits", num_qubits),
        }
    }

    /// Target listed twice within one gate or layer
    pub fn repeated_target(qubit: usize) -> Self {
        ZenoError::InvalidTarget {
            qubit,
            detail: "qubit targeted more than once".to_string(),
        }
    }

    /// Check if error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ZenoError::InvalidTarget { .. }
                | ZenoError::DimensionMismatch { .. }
                | ZenoError::InvalidProbability(_)
                | ZenoError::InvalidGain(_)
                | ZenoError::InvalidRate(_)
                | ZenoError::InvalidAngle(_)
                | ZenoError::InvalidPauli(_)
                | ZenoError::InvalidBitstring(_)
                | ZenoError::InvalidGateParameter(_)
                | ZenoError::InvalidConfig(_)
        )
    }

    /// Check if error is a topology error
    pub fn is_topology_error(&self) -> bool {
        matches!(
            self,
            ZenoError::InvalidCoupling(..)
                | ZenoError::DuplicateCoupling(..)
                | ZenoError::TopologyMismatch { .. }
                | ZenoError::TopologyViolation { .. }
                | ZenoError::PathNotFound(..)
        )
    }

    /// Check if error happened while running or fitting
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            ZenoError::EmptyCircuit
                | ZenoError::QubitLimitExceeded { .. }
                | ZenoError::Timeout { .. }
                | ZenoError::InsufficientSamples { .. }
                | ZenoError::FitFailed(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
