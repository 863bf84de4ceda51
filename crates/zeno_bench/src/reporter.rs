//! Binning and report rendering
//!
//! Gantree: L6_Benchmark → Reporter
//!
//! Bins are half-open intervals `[lower, upper)` of equal width; adjacent
//! bins share their boundary.

use crate::suite::StudyResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeno_core::error::{ZenoError, ZenoResult};

// ============================================================================
// Bins
// ============================================================================

/// Half-open interval `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    /// Inclusive lower edge
    pub lower: f64,
    /// Exclusive upper edge
    pub upper: f64,
}

impl Bin {
    /// True if `lower ≤ value < upper`
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value < self.upper
    }

    /// Interval midpoint
    pub fn center(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3})", self.lower, self.upper)
    }
}

/// `count` equal-width bins partitioning `[lower, lower + width·count)`
/// Gantree: create_bins(lower, width, count) -> Result<Vec<Bin>>
pub fn create_bins(lower: f64, width: f64, count: usize) -> ZenoResult<Vec<Bin>> {
    if !lower.is_finite() {
        return Err(ZenoError::InvalidConfig(format!("bin origin {} is not finite", lower)));
    }
    if !width.is_finite() || width <= 0.0 {
        return Err(ZenoError::InvalidConfig(format!(
            "bin width must be positive, got {}",
            width
        )));
    }
    let edge = |i: usize| lower + i as f64 * width;
    Ok((0..count)
        .map(|i| Bin {
            lower: edge(i),
            upper: edge(i + 1),
        })
        .collect())
}

/// Index of the first bin containing `value`
/// Gantree: find_bin(value, bins) -> Option<usize>
pub fn find_bin(value: f64, bins: &[Bin]) -> Option<usize> {
    bins.iter().position(|b| b.contains(value))
}

// ============================================================================
// Histogram
// ============================================================================

/// Counts per bin plus values that fell outside every bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bins
    pub bins: Vec<Bin>,
    /// Count per bin
    pub counts: Vec<usize>,
    /// Values outside all bins
    pub outside: usize,
}

impl Histogram {
    /// Empty histogram over `bins`
    pub fn new(bins: Vec<Bin>) -> Self {
        let counts = vec![0; bins.len()];
        Self {
            bins,
            counts,
            outside: 0,
        }
    }

    /// Histogram of `values`
    pub fn from_values(bins: Vec<Bin>, values: impl IntoIterator<Item = f64>) -> Self {
        let mut hist = Self::new(bins);
        for v in values {
            hist.add(v);
        }
        hist
    }

    /// Count one value; returns its bin
    pub fn add(&mut self, value: f64) -> Option<usize> {
        let idx = find_bin(value, &self.bins);
        match idx {
            Some(i) => self.counts[i] += 1,
            None => self.outside += 1,
        }
        idx
    }

    /// Values counted, including outside ones
    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.outside
    }

    /// Fraction of all values in bin `i`
    pub fn fraction(&self, i: usize) -> f64 {
        match (self.counts.get(i), self.total()) {
            (Some(&c), total) if total > 0 => c as f64 / total as f64,
            _ => 0.0,
        }
    }

    /// Bin with the most values
    pub fn mode(&self) -> Option<Bin> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .max_by_key(|(i, &c)| (c, std::cmp::Reverse(*i)))
            .map(|(i, _)| self.bins[i])
    }
}

// ============================================================================
// Reporter
// ============================================================================

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Markdown summary and histogram
    Markdown,
    /// JSON document
    Json,
    /// One CSV row per circuit
    Csv,
}

/// Study reporter
/// Gantree: Reporter // markdown / json / csv
pub struct Reporter;

impl Reporter {
    /// Render in the requested format
    pub fn report(result: &StudyResult, format: ReportFormat) -> ZenoResult<String> {
        match format {
            ReportFormat::Markdown => Ok(Self::to_markdown(result)),
            ReportFormat::Json => Self::to_json(result),
            ReportFormat::Csv => Ok(Self::to_csv(result)),
        }
    }

    /// Markdown summary with the δ₀ histogram
    pub fn to_markdown(result: &StudyResult) -> String {
        let c = &result.config;
        let mut out = String::from("# δ₀ Study\n\n");
        out.push_str(&format!(
            "- **Circuits**: {} ({} qubits, depth {})\n",
            result.outcomes.len(),
            c.num_qubits,
            c.depth
        ));
        out.push_str(&format!("- **Depolarizing ε**: {}\n", c.epsilon));
        out.push_str(&format!("- **PEC overhead γ**: {:.6}\n", result.pec_overhead));
        out.push_str(&format!("- **Mean δ₀**: {:.6}\n", result.mean_delta()));
        out.push_str(&format!("- **Max δ₀**: {:.6}\n", result.max_delta()));
        if let Some(m) = result.mean_mitigated_delta() {
            out.push_str(&format!("- **Mean δ after ZNE**: {:.6}\n", m));
        }
        out.push_str(&format!("- **Time**: {:.2}s\n\n", result.total_time_ms as f64 / 1000.0));

        out.push_str("| bin | count | fraction |\n|-----|-------|----------|\n");
        let hist = &result.histogram;
        for (i, bin) in hist.bins.iter().enumerate() {
            if hist.counts[i] > 0 {
                out.push_str(&format!(
                    "| {} | {} | {:.3} |\n",
                    bin,
                    hist.counts[i],
                    hist.fraction(i)
                ));
            }
        }
        if hist.outside > 0 {
            out.push_str(&format!("| outside | {} | - |\n", hist.outside));
        }
        out
    }

    /// JSON document of the whole result
    pub fn to_json(result: &StudyResult) -> ZenoResult<String> {
        Ok(serde_json::to_string_pretty(result)?)
    }

    /// CSV with one row per circuit
    pub fn to_csv(result: &StudyResult) -> String {
        let mut out = String::from("index,ideal,noisy,delta_zero,std_error,mitigated,bin\n");
        for o in &result.outcomes {
            let mitigated = o.mitigated.map(|m| m.to_string()).unwrap_or_default();
            let bin = find_bin(o.delta_zero, &result.histogram.bins)
                .map(|b| b.to_string())
                .unwrap_or_default();
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                o.index, o.ideal, o.noisy, o.delta_zero, o.std_error, mitigated, bin
            ));
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
