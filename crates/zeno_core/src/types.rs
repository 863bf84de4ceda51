//! Core types for ZENO
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Type aliases and validated wrappers shared by every crate.

use crate::error::{ZenoError, ZenoResult};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed, qubit `q` is bit `q` of a basis index)
/// Gantree: QubitId // pub type QubitId = usize
pub type QubitId = usize;

/// Rotation angle in radians
/// Gantree: Angle // pub type Angle = f64
pub type Angle = f64;

/// Complex amplitude
pub type Amplitude = Complex64;

// ============================================================================
// Probability (Validated Wrapper)
// ============================================================================

/// Probability value in range [0, 1]
/// Gantree: Probability // range-checked wrapper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probability(f64);

impl Probability {
    /// Create a new Probability with validation
    pub fn new(value: f64) -> ZenoResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ZenoError::InvalidProbability(value));
        }
        Ok(Self(value))
    }

    /// Clamp an arbitrary finite value into [0, 1]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the probability value
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Get the complement (1 - p)
    #[inline]
    pub fn complement(&self) -> f64 {
        1.0 - self.0
    }

    /// Zero probability
    pub const ZERO: Self = Self(0.0);

    /// Certainty (p = 1)
    pub const ONE: Self = Self(1.0);

    /// Half probability
    pub const HALF: Self = Self(0.5);
}

impl Default for Probability {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl TryFrom<f64> for Probability {
    type Error = ZenoError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// Bitstring
// ============================================================================

/// Computational basis label.
///
/// Stored little-endian (`bit(q)` is qubit `q`) and printed with qubit
/// `N-1` leftmost, so `"01"` means qubit 0 is set.
/// Gantree: Bitstring // basis label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    /// Create from a little-endian bit vector
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Parse a printed label (qubit `N-1` leftmost)
    /// Gantree: parse(s) -> Self // parse
    pub fn parse(s: &str) -> ZenoResult<Self> {
        let bits: Result<Vec<bool>, _> = s
            .chars()
            .rev()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(ZenoError::InvalidBitstring(s.to_string())),
            })
            .collect();
        Ok(Self { bits: bits? })
    }

    /// Build from a basis-state index
    pub fn from_index(index: usize, num_qubits: usize) -> Self {
        Self {
            bits: (0..num_qubits).map(|q| (index >> q) & 1 == 1).collect(),
        }
    }

    /// Create zero bitstring of given length
    pub fn zeros(n: usize) -> Self {
        Self {
            bits: vec![false; n],
        }
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Hamming weight
    pub fn popcount(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Bit of qubit `q`
    pub fn get(&self, q: QubitId) -> Option<bool> {
        self.bits.get(q).copied()
    }

    /// Basis-state index
    pub fn to_index(&self) -> usize {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(q, _)| 1usize << q)
            .sum()
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.bits.iter().rev() {
            write!(f, "{}", if b { '1' } else { '0' })?;
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

    #[test]
    fn test_probability_valid() {
        assert!(Probability::new(0.0).is_ok());
        assert!(Probability::new(0.5).is_ok());
        assert!(Probability::new(1.0).is_ok());
    }

    #[test]
    fn test_probability_invalid() {
        assert!(Probability::new(-0.1).is_err());
        assert!(Probability::new(1.1).is_err());
    }

    #[test]
    fn test_probability_clamped() {
        assert_eq!(Probability::clamped(1.7).value(), 1.0);
        assert_eq!(Probability::clamped(-0.2).value(), 0.0);
        assert_eq!(Probability::clamped(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_bitstring_little_endian() {
        let bs = Bitstring::parse("01").unwrap();
        assert_eq!(bs.get(0), Some(true));
        assert_eq!(bs.get(1), Some(false));
        assert_eq!(bs.to_index(), 1);
        assert_eq!(bs.to_string(), "01");
    }

    #[test]
    fn test_bitstring_index_roundtrip() {
        let bs = Bitstring::from_index(6, 4);
        assert_eq!(bs.to_string(), "0110");
        assert_eq!(bs.to_index(), 6);
        assert_eq!(bs.popcount(), 2);
    }

    #[test]
    fn test_bitstring_invalid() {
        assert!(Bitstring::parse("01a").is_err());
    }
}
