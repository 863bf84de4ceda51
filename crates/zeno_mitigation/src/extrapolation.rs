//! Regression models for zero-noise extrapolation
//!
//! Gantree: L4_Mitigation → Extrapolator
//!
//! Fits `expectation(gain) ≈ f(gain)` by ordinary least squares and reports
//! `f(0)` together with fit diagnostics. Normal equations are solved by
//! Gaussian elimination with partial pivoting.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeno_core::constants::stats::t_critical_95;
use zeno_core::error::{ZenoError, ZenoResult};

/// Distinct-gain resolution
const GAIN_RESOLUTION: f64 = 1e-12;

/// Smallest pivot accepted during elimination
const PIVOT_EPSILON: f64 = 1e-14;

// ============================================================================
// FitModel
// ============================================================================

/// Regression model
/// Gantree: FitModel // Linear | Polynomial(d) | Exponential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitModel {
    /// `a + b·g`
    #[default]
    Linear,
    /// `Σ_k c_k g^k` up to the given degree
    Polynomial(usize),
    /// `a·e^{b·g}`, fitted in log space
    Exponential,
}

impl FitModel {
    /// Number of free parameters
    pub fn num_parameters(&self) -> usize {
        match self {
            FitModel::Linear | FitModel::Exponential => 2,
            FitModel::Polynomial(d) => d + 1,
        }
    }

    /// Polynomial degree used by the least-squares core
    fn degree(&self) -> usize {
        match self {
            FitModel::Linear | FitModel::Exponential => 1,
            FitModel::Polynomial(d) => *d,
        }
    }

    /// Model name
    pub fn name(&self) -> String {
        match self {
            FitModel::Linear => "linear".to_string(),
            FitModel::Polynomial(d) => format!("polynomial({})", d),
            FitModel::Exponential => "exponential".to_string(),
        }
    }
}

impl fmt::Display for FitModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// ExtrapolationSample
// ============================================================================

/// One measured point of the gain sweep
/// Gantree: ExtrapolationSample // (gain, value, σ)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolationSample {
    /// Noise gain ≥ 1
    pub gain: f64,
    /// Measured expectation value
    pub expectation: f64,
    /// Standard error of the measurement
    pub std_error: f64,
}

impl ExtrapolationSample {
    /// Create a sample
    pub fn new(gain: f64, expectation: f64, std_error: f64) -> Self {
        Self {
            gain,
            expectation,
            std_error,
        }
    }

    /// Sample with zero standard error
    pub fn exact(gain: f64, expectation: f64) -> Self {
        Self::new(gain, expectation, 0.0)
    }
}

// ============================================================================
// FitResult
// ============================================================================

/// Fitted model with diagnostics
/// Gantree: FitResult // estimate + quality metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Model fitted
    pub model: FitModel,

    /// Coefficients: ascending powers for polynomials, `[a, b]` for exponential
    pub coefficients: Vec<f64>,

    /// Zero-noise estimate `f(0)`
    pub estimate: f64,

    /// `y_i − f(g_i)` per sample
    pub residuals: Vec<f64>,

    /// Euclidean norm of the residuals
    pub residual_norm: f64,

    /// Coefficient of determination
    pub r_squared: f64,

    /// Samples minus parameters
    pub degrees_of_freedom: usize,

    /// Standard error of the estimate (`None` for an exact interpolation)
    pub standard_error: Option<f64>,

    /// Two-sided 95% Student-t interval around the estimate
    pub confidence_interval: Option<(f64, f64)>,
}

impl FitResult {
    /// Evaluate the fitted curve
    pub fn evaluate(&self, gain: f64) -> f64 {
        evaluate(self.model, &self.coefficients, gain)
    }

    /// Width of the confidence interval
    pub fn interval_width(&self) -> Option<f64> {
        self.confidence_interval.map(|(lo, hi)| hi - lo)
    }

    /// True if the fit interpolates the samples exactly (no residual freedom)
    pub fn is_interpolation(&self) -> bool {
        self.degrees_of_freedom == 0
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fit: f(0) = {:.6}, ‖r‖ = {:.3e}, R² = {:.4}",
            self.model, self.estimate, self.residual_norm, self.r_squared
        )?;
        if let Some((lo, hi)) = self.confidence_interval {
            write!(f, ", 95% CI [{:.6}, {:.6}]", lo, hi)?;
        }
        Ok(())
    }
}

fn evaluate(model: FitModel, coefficients: &[f64], gain: f64) -> f64 {
    match model {
        FitModel::Exponential => coefficients[0] * (coefficients[1] * gain).exp(),
        _ => coefficients.iter().rev().fold(0.0, |acc, c| acc * gain + c),
    }
}

// ============================================================================
// Extrapolator
// ============================================================================

/// Least-squares extrapolator
/// Gantree: Extrapolator // fit(samples) -> FitResult
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extrapolator {
    model: FitModel,
}

impl Extrapolator {
    /// Create extrapolator for a model
    pub fn new(model: FitModel) -> Self {
        Self { model }
    }

    /// Model used
    pub fn model(&self) -> FitModel {
        self.model
    }

    /// Fit `(gain, value)` pairs and return `f(0)`
    pub fn extrapolate(&self, points: &[(f64, f64)]) -> ZenoResult<f64> {
        let samples: Vec<_> = points
            .iter()
            .map(|&(g, y)| ExtrapolationSample::exact(g, y))
            .collect();
        Ok(self.fit(&samples)?.estimate)
    }

    /// Fit samples
    /// Gantree: fit(samples) -> Result<FitResult> // OLS + diagnostics
    pub fn fit(&self, samples: &[ExtrapolationSample]) -> ZenoResult<FitResult> {
        for s in samples {
            if !s.gain.is_finite() {
                return Err(ZenoError::InvalidGain(s.gain));
            }
            if !s.expectation.is_finite() {
                return Err(ZenoError::FitFailed(format!(
                    "non-finite expectation at gain {}",
                    s.gain
                )));
            }
        }
        let required = self.model.num_parameters();
        let distinct = count_distinct(samples.iter().map(|s| s.gain));
        if distinct < required {
            return Err(ZenoError::InsufficientSamples {
                required,
                found: distinct,
            });
        }

        let gains: Vec<f64> = samples.iter().map(|s| s.gain).collect();
        let values: Vec<f64> = samples.iter().map(|s| s.expectation).collect();

        match self.model {
            FitModel::Exponential => self.fit_exponential(&gains, &values),
            _ => {
                let ls = least_squares(&gains, &values, self.model.degree())?;
                let residuals = residuals_of(self.model, &ls.coefficients, &gains, &values);
                let t = t_critical_95(ls.dof);
                let ci = match (ls.intercept_se, t) {
                    (Some(se), Some(t)) => Some((ls.coefficients[0] - t * se, ls.coefficients[0] + t * se)),
                    _ => None,
                };
                Ok(build_result(
                    self.model,
                    ls.coefficients.clone(),
                    ls.coefficients[0],
                    residuals,
                    &values,
                    ls.dof,
                    ls.intercept_se,
                    ci,
                ))
            }
        }
    }

    fn fit_exponential(&self, gains: &[f64], values: &[f64]) -> ZenoResult<FitResult> {
        let sign = values[0].signum();
        if values.iter().any(|&y| y == 0.0 || y.signum() != sign) {
            return Err(ZenoError::FitFailed(
                "exponential fit needs non-zero samples of one sign".to_string(),
            ));
        }
        let logs: Vec<f64> = values.iter().map(|y| y.abs().ln()).collect();
        let ls = least_squares(gains, &logs, 1)?;
        let a = sign * ls.coefficients[0].exp();
        let b = ls.coefficients[1];
        let coefficients = vec![a, b];
        let residuals = residuals_of(FitModel::Exponential, &coefficients, gains, values);

        // delta method: σ(a) = |a| σ(ln|a|)
        let se = ls.intercept_se.map(|s| a.abs() * s);
        let ci = match (ls.intercept_se, t_critical_95(ls.dof)) {
            (Some(s), Some(t)) => {
                let lo = sign * (ls.coefficients[0] - t * s).exp();
                let hi = sign * (ls.coefficients[0] + t * s).exp();
                Some((lo.min(hi), lo.max(hi)))
            }
            _ => None,
        };
        Ok(build_result(
            FitModel::Exponential,
            coefficients,
            a,
            residuals,
            values,
            ls.dof,
            se,
            ci,
        ))
    }
}

// ============================================================================
// Least Squares
// ============================================================================

struct LeastSquares {
    coefficients: Vec<f64>,
    dof: usize,
    intercept_se: Option<f64>,
}

/// Polynomial least squares through the normal equations
fn least_squares(x: &[f64], y: &[f64], degree: usize) -> ZenoResult<LeastSquares> {
    let d = degree + 1;
    let mut ata = vec![vec![0.0; d]; d];
    let mut aty = vec![0.0; d];
    for (&xi, &yi) in x.iter().zip(y) {
        let powers: Vec<f64> = (0..d).map(|k| xi.powi(k as i32)).collect();
        for i in 0..d {
            for j in 0..d {
                ata[i][j] += powers[i] * powers[j];
            }
            aty[i] += powers[i] * yi;
        }
    }

    let coefficients = solve(ata.clone(), aty)?;
    let dof = x.len().saturating_sub(d);
    let intercept_se = if dof == 0 {
        None
    } else {
        let rss: f64 = x
            .iter()
            .zip(y)
            .map(|(&xi, &yi)| {
                let fit = coefficients.iter().rev().fold(0.0, |acc, c| acc * xi + c);
                (yi - fit).powi(2)
            })
            .sum();
        let sigma2 = rss / dof as f64;
        let mut e0 = vec![0.0; d];
        e0[0] = 1.0;
        let inv_col = solve(ata, e0)?;
        Some((sigma2 * inv_col[0]).max(0.0).sqrt())
    };

    Ok(LeastSquares {
        coefficients,
        dof,
        intercept_se,
    })
}

/// Solve `a·x = b` by Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> ZenoResult<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |m, v| m.max(v.abs()))
        .max(1.0);

    for i in 0..n {
        let pivot = (i..n)
            .max_by(|&p, &q| a[p][i].abs().total_cmp(&a[q][i].abs()))
            .unwrap_or(i);
        a.swap(i, pivot);
        b.swap(i, pivot);
        if a[i][i].abs() < PIVOT_EPSILON * scale {
            return Err(ZenoError::FitFailed(
                "normal equations are singular".to_string(),
            ));
        }
        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
            b[k] -= factor * b[i];
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| a[i][j] * x[j]).sum();
        x[i] = (b[i] - tail) / a[i][i];
    }
    Ok(x)
}

fn residuals_of(model: FitModel, coefficients: &[f64], x: &[f64], y: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| yi - evaluate(model, coefficients, xi))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    model: FitModel,
    coefficients: Vec<f64>,
    estimate: f64,
    residuals: Vec<f64>,
    values: &[f64],
    dof: usize,
    standard_error: Option<f64>,
    confidence_interval: Option<(f64, f64)>,
) -> FitResult {
    let rss: f64 = residuals.iter().map(|r| r * r).sum();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let tss: f64 = values.iter().map(|y| (y - mean).powi(2)).sum();
    let r_squared = if tss > 0.0 {
        1.0 - rss / tss
    } else if rss <= f64::EPSILON {
        1.0
    } else {
        0.0
    };
    FitResult {
        model,
        coefficients,
        estimate,
        residual_norm: rss.sqrt(),
        residuals,
        r_squared,
        degrees_of_freedom: dof,
        standard_error,
        confidence_interval,
    }
}

fn count_distinct(gains: impl Iterator<Item = f64>) -> usize {
    let mut sorted: Vec<f64> = gains.collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup_by(|a, b| (*a - *b).abs() <= GAIN_RESOLUTION);
    sorted.len()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn samples(f: impl Fn(f64) -> f64, gains: &[f64]) -> Vec<ExtrapolationSample> {
        gains.iter().map(|&g| ExtrapolationSample::exact(g, f(g))).collect()
    }

    #[test]
    fn test_linear_recovers_line() {
        let fit = Extrapolator::new(FitModel::Linear)
            .fit(&samples(|g| 0.8 - 0.1 * g, &[1.0, 2.0, 3.0]))
            .unwrap();
        assert_relative_eq!(fit.estimate, 0.8, epsilon = 1e-12);
        assert_relative_eq!(fit.coefficients[1], -0.1, epsilon = 1e-12);
        assert!(fit.residual_norm < 1e-12);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
        assert_eq!(fit.degrees_of_freedom, 1);
    }

    #[test]
    fn test_constant_samples_give_common_value() {
        let fit = Extrapolator::new(FitModel::Linear)
            .fit(&samples(|_| 0.42, &[1.0, 1.5, 2.0, 3.0]))
            .unwrap();
        assert_relative_eq!(fit.estimate, 0.42, epsilon = 1e-12);
        assert_relative_eq!(fit.r_squared, 1.0);
        let (lo, hi) = fit.confidence_interval.unwrap();
        assert!((hi - lo).abs() < 1e-9);
    }

    #[test]
    fn test_quadratic_recovers_curve() {
        let f = |g: f64| 1.0 - 0.1 * g + 0.01 * g * g;
        let fit = Extrapolator::new(FitModel::Polynomial(2))
            .fit(&samples(f, &[1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        assert_relative_eq!(fit.estimate, 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.evaluate(2.5), f(2.5), epsilon = 1e-10);
    }

    #[test]
    fn test_exponential_recovers_decay() {
        let fit = Extrapolator::new(FitModel::Exponential)
            .fit(&samples(|g| 0.9 * (-0.2 * g).exp(), &[1.0, 2.0, 3.0]))
            .unwrap();
        assert_relative_eq!(fit.estimate, 0.9, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], -0.2, epsilon = 1e-10);

        let neg = Extrapolator::new(FitModel::Exponential)
            .fit(&samples(|g| -0.5 * (-0.1 * g).exp(), &[1.0, 2.0, 3.0]))
            .unwrap();
        assert_relative_eq!(neg.estimate, -0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_exponential_rejects_sign_change() {
        let data = [
            ExtrapolationSample::exact(1.0, 0.1),
            ExtrapolationSample::exact(2.0, -0.1),
        ];
        assert!(matches!(
            Extrapolator::new(FitModel::Exponential).fit(&data),
            Err(ZenoError::FitFailed(_))
        ));
    }

    #[test]
    fn test_insufficient_samples() {
        let quad = Extrapolator::new(FitModel::Polynomial(2));
        assert!(matches!(
            quad.fit(&samples(|g| g, &[1.0, 2.0])),
            Err(ZenoError::InsufficientSamples { required: 3, found: 2 })
        ));
        // repeated gains do not count twice
        assert!(matches!(
            quad.fit(&samples(|g| g, &[1.0, 1.0, 2.0])),
            Err(ZenoError::InsufficientSamples { required: 3, found: 2 })
        ));
        assert!(Extrapolator::new(FitModel::Linear).fit(&[]).is_err());
    }

    #[test]
    fn test_interpolation_has_no_interval() {
        let fit = Extrapolator::new(FitModel::Linear)
            .fit(&samples(|g| 1.0 - 0.2 * g, &[1.0, 2.0]))
            .unwrap();
        assert!(fit.is_interpolation());
        assert!(fit.standard_error.is_none());
        assert!(fit.confidence_interval.is_none());
    }

    #[test]
    fn test_noisy_fit_interval() {
        let data = [
            ExtrapolationSample::exact(1.0, 0.905),
            ExtrapolationSample::exact(2.0, 0.795),
            ExtrapolationSample::exact(3.0, 0.705),
            ExtrapolationSample::exact(4.0, 0.595),
        ];
        let fit = Extrapolator::new(FitModel::Linear).fit(&data).unwrap();
        let (lo, hi) = fit.confidence_interval.unwrap();
        assert!(lo < fit.estimate && fit.estimate < hi);
        assert!(fit.standard_error.unwrap() > 0.0);
        assert!(fit.r_squared > 0.99 && fit.r_squared < 1.0);
        assert_relative_eq!(fit.estimate, 1.0, epsilon = 0.02);
    }

    #[test]
    fn test_extrapolate_pairs() {
        let est = Extrapolator::default()
            .extrapolate(&[(1.0, 0.5), (3.0, 0.3)])
            .unwrap();
        assert_relative_eq!(est, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_model_serde_names() {
        assert_eq!(serde_json::to_string(&FitModel::Linear).unwrap(), "\"linear\"");
        assert_eq!(
            serde_json::to_string(&FitModel::Polynomial(2)).unwrap(),
            "{\"polynomial\":2}"
        );
        assert_eq!(FitModel::Polynomial(3).num_parameters(), 4);
    }
}
