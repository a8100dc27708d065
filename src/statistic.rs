//! Spectral statistic engine and theoretical convergence bound.
//!
//! The statistic is the sequential correlation of unfolded spacings,
//!   S_N = M⁻¹ Σ_{k=1}^{M} γ̃_k γ̃_{k+1},   M = #gaps − 1,
//! whose GUE limit is the adjacent spacing product constant C_GUE. The
//! certified convergence rate is
//!   |S_N − C_GUE| ≤ A/√N + B·ln N / N
//! for the empirical constants A and B below.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::sequence::ZeroSequence;

/// GUE adjacent spacing product constant.
pub const C_GUE: f64 = 0.60338;

/// Convergence constant in the A/√N term.
pub const A_CONSTANT: f64 = 2.5;

/// Finite-size correction constant in the B·ln N/N term.
pub const B_CONSTANT: f64 = 3.0;

/// Normalized gap means below this are treated as degenerate.
const GAP_MEAN_FLOOR: f64 = 1e-12;

/// A computed value of S_N together with its sample sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingStatistic {
    /// The statistic value.
    pub value: f64,
    /// Number of adjacent-product terms averaged.
    pub terms: usize,
    /// Number of gaps the statistic was computed over.
    pub gap_count: usize,
}

/// Compute S_N from a zero sequence.
///
/// Unfolds the spacings (globally, or by a local sliding window when
/// `window` is given), then averages the adjacent products. Pure and
/// deterministic; invariant under a global positive rescaling of the
/// ordinates since the unfolding divides any common factor out.
pub fn compute_statistic(
    zeros: &ZeroSequence,
    window: Option<usize>,
) -> Result<SpacingStatistic, PipelineError> {
    let gaps = zeros.normalized_gaps(window)?;
    statistic_from_normalized(&gaps)
}

/// S_N over a slice of gaps, re-normalized to unit mean first.
///
/// Used wherever the statistic must be recomputed on derived gap data:
/// bootstrap resamples and spectral reconstructions.
pub fn statistic_from_gaps(gaps: &[f64]) -> Result<SpacingStatistic, PipelineError> {
    if gaps.is_empty() {
        return Err(PipelineError::InvalidInput("empty gap sequence".into()));
    }
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean < GAP_MEAN_FLOOR {
        return Err(PipelineError::DegenerateInput {
            index: 0,
            mean,
            floor: GAP_MEAN_FLOOR,
        });
    }
    let normalized: Vec<f64> = gaps.iter().map(|g| g / mean).collect();
    statistic_from_normalized(&normalized)
}

/// S_N over gaps already normalized to unit mean.
fn statistic_from_normalized(gaps: &[f64]) -> Result<SpacingStatistic, PipelineError> {
    if gaps.len() < 3 {
        return Err(PipelineError::InvalidInput(format!(
            "need at least 3 normalized gaps for S_N, got {}",
            gaps.len()
        )));
    }
    let products = adjacent_products(gaps);
    let value = products.iter().sum::<f64>() / products.len() as f64;
    Ok(SpacingStatistic {
        value,
        terms: products.len(),
        gap_count: gaps.len(),
    })
}

/// The individual product terms γ̃_k γ̃_{k+1} that S_N averages.
///
/// The subset selector decides over these.
pub fn adjacent_products(gaps: &[f64]) -> Vec<f64> {
    gaps.windows(2).map(|w| w[0] * w[1]).collect()
}

/// Theoretical convergence bound A/√N + B·ln N/N.
///
/// Returns +∞ for N < 3, where the statistic is undefined.
pub fn convergence_bound(n: usize, a: f64, b: f64) -> f64 {
    if n < 3 {
        return f64::INFINITY;
    }
    let nf = n as f64;
    a / nf.sqrt() + b * nf.ln() / nf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{synthetic_sequence, SyntheticKind};

    #[test]
    fn test_statistic_deterministic() {
        let seq = synthetic_sequence(SyntheticKind::GueLike, 200, 5).unwrap();
        let a = compute_statistic(&seq, None).unwrap();
        let b = compute_statistic(&seq, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_statistic_rescaling_invariant() {
        let seq = synthetic_sequence(SyntheticKind::GueLike, 300, 9).unwrap();
        // Power-of-two scale keeps the arithmetic exact.
        let scaled: Vec<f64> = seq.ordinates().iter().map(|t| t * 4.0).collect();
        let scaled_seq = ZeroSequence::new(scaled).unwrap();

        let s = compute_statistic(&seq, None).unwrap();
        let s_scaled = compute_statistic(&scaled_seq, None).unwrap();
        assert!(
            (s.value - s_scaled.value).abs() < 1e-12,
            "S_N changed under rescaling: {} vs {}",
            s.value,
            s_scaled.value
        );
    }

    #[test]
    fn test_statistic_needs_three_gaps() {
        let seq = ZeroSequence::new(vec![1.0, 2.0, 3.0]).unwrap();
        let err = compute_statistic(&seq, None).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));

        let seq = ZeroSequence::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(compute_statistic(&seq, None).is_ok());
    }

    #[test]
    fn test_uniform_ladder_statistic_is_one() {
        let seq = synthetic_sequence(SyntheticKind::Deterministic, 100, 0).unwrap();
        let s = compute_statistic(&seq, None).unwrap();
        assert!((s.value - 1.0).abs() < 1e-12);
        assert_eq!(s.gap_count, 99);
        assert_eq!(s.terms, 98);
    }

    #[test]
    fn test_convergence_bound_values() {
        // N = 1000: 2.5/√1000 + 3·ln 1000/1000 ≈ 0.0998.
        let b = convergence_bound(1000, A_CONSTANT, B_CONSTANT);
        assert!((b - 0.09978).abs() < 1e-4, "bound(1000) = {}", b);
        assert!(convergence_bound(2, A_CONSTANT, B_CONSTANT).is_infinite());
        // Bound decreases with N.
        assert!(
            convergence_bound(10_000, A_CONSTANT, B_CONSTANT) < b,
            "bound should shrink as N grows"
        );
    }

    #[test]
    fn test_statistic_from_gaps_renormalizes() {
        // Scaled copies of the same gaps give the same statistic.
        let gaps = vec![1.2, 0.8, 1.1, 0.9, 1.0];
        let scaled: Vec<f64> = gaps.iter().map(|g| g * 2.0).collect();
        let a = statistic_from_gaps(&gaps).unwrap();
        let b = statistic_from_gaps(&scaled).unwrap();
        assert!((a.value - b.value).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_gap_mean_rejected() {
        let gaps = vec![1e-15, 1e-15, 1e-15, 1e-15];
        let err = statistic_from_gaps(&gaps).unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateInput { .. }));
    }
}
