//! Probabilistic-error-cancellation sampling overhead
//!
//! Gantree: L2_Noise → Overhead
//!
//! The overhead γ multiplies the variance of a quasi-probability estimator:
//! reaching precision δ costs roughly `(γ/δ)²` samples.

use crate::noise_model::NoiseModel;
use zeno_core::circuit::{Circuit, Layer};
use zeno_core::error::{ZenoError, ZenoResult};

/// Closed-form overhead for a layered depolarizing circuit
/// Gantree: depolarizing_pec_overhead(n, d, ε) -> γ // half 1Q, quarter CNOT
///
/// Assumes `n·d/2` single-qubit gates and `n·d/4` CNOTs, each followed by
/// depolarizing noise of strength `ε`:
/// `γ = ((1 + ε/2)/(1 − ε))^{nd/2} · ((1 + 7ε/8)/(1 − ε))^{nd/4}`.
pub fn depolarizing_pec_overhead(num_qubits: usize, depth: usize, epsilon: f64) -> ZenoResult<f64> {
    if !(0.0..1.0).contains(&epsilon) {
        return Err(ZenoError::InvalidProbability(epsilon));
    }
    let gates = (num_qubits * depth) as f64;
    let denom = 1.0 - epsilon;
    let single = ((1.0 + epsilon / 2.0) / denom).powf(gates / 2.0);
    let cnot = ((1.0 + 7.0 * epsilon / 8.0) / denom).powf(gates / 4.0);
    Ok(single * cnot)
}

/// Overhead `exp(2g Σλ)` of inverting the channel after one layer
pub fn layer_overhead(model: &NoiseModel, layer: &Layer, gain: f64) -> ZenoResult<f64> {
    let scaled = model.scale(gain)?;
    Ok((2.0 * scaled.layer_rate(layer)?).exp())
}

/// Product of layer overheads over a circuit
/// Gantree: pec_sampling_overhead(model, circuit, gain) -> γ
pub fn pec_sampling_overhead(model: &NoiseModel, circuit: &Circuit, gain: f64) -> ZenoResult<f64> {
    let scaled = model.scale(gain)?;
    let mut exponent = 0.0;
    for layer in circuit.layers() {
        exponent += 2.0 * scaled.layer_rate(layer)?;
    }
    Ok(exponent.exp())
}

/// Samples needed to reach standard error `precision` at overhead `gamma`
pub fn pec_sample_cost(gamma: f64, precision: f64) -> ZenoResult<usize> {
    if !precision.is_finite() || precision <= 0.0 {
        return Err(ZenoError::InvalidConfig(format!(
            "precision must be positive, got {}",
            precision
        )));
    }
    if !gamma.is_finite() || gamma < 1.0 {
        return Err(ZenoError::InvalidConfig(format!(
            "overhead must be at least 1, got {}",
            gamma
        )));
    }
    Ok((gamma / precision).powi(2).ceil() as usize)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use zeno_core::builder::CircuitBuilder;

    #[test]
    fn test_depolarizing_overhead_reference() {
        // n = 20, d = 6, ε = 0.01
        let gamma = depolarizing_pec_overhead(20, 6, 0.01).unwrap();
        assert_relative_eq!(gamma, 4.328153187916725, epsilon = 1e-9);
        assert_relative_eq!(depolarizing_pec_overhead(20, 6, 0.0).unwrap(), 1.0);
        assert!(depolarizing_pec_overhead(4, 4, 1.0).is_err());
    }

    #[test]
    fn test_overhead_grows_with_depth() {
        let a = depolarizing_pec_overhead(4, 2, 0.02).unwrap();
        let b = depolarizing_pec_overhead(4, 4, 0.02).unwrap();
        assert_relative_eq!(b, a * a, epsilon = 1e-12);
    }

    #[test]
    fn test_model_overhead() {
        let model = NoiseModel::depolarizing(0.01, 0.0).unwrap();
        let circuit = CircuitBuilder::new(2).h(0).h(1).layer().h(0).build().unwrap();
        let lambda = -(0.99f64).ln() / 4.0;

        let gamma = pec_sampling_overhead(&model, &circuit, 1.0).unwrap();
        assert_relative_eq!(gamma, (2.0 * 3.0 * lambda * 3.0).exp(), epsilon = 1e-12);

        let first = circuit.layers().next().unwrap();
        let g2 = layer_overhead(&model, first, 2.0).unwrap();
        assert_relative_eq!(g2, (2.0 * 2.0 * 3.0 * lambda * 2.0).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_sample_cost() {
        assert_eq!(pec_sample_cost(2.0, 0.1).unwrap(), 400);
        assert!(pec_sample_cost(0.5, 0.1).is_err());
        assert!(pec_sample_cost(2.0, 0.0).is_err());
    }
}
